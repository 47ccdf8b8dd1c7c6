//! `Validation<T>`: a value, or a non-empty ordered list of business errors.
//!
//! There are two ways to combine validations and they must not be confused:
//!
//! - **Sequential** ([`Validation::bind`]): the next step depends on the previous
//!   value, so the first failure stops the chain.
//! - **Accumulating** ([`Validation::zip`], [`Validation::zip_with`],
//!   [`Validation::combine3`], `collect()`): the inputs are independent, so every
//!   failure is reported, concatenated left to right.

use std::fmt;

use serde::Serialize;

use crate::error::Error;
use crate::optional::Optional;

/// Non-empty, ordered sequence of errors.
///
/// There is no way to build an empty `Errors`; every constructor takes at least one
/// [`Error`]. Order of occurrence is kept and duplicates are not removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Errors(Vec<Error>);

impl Errors {
    pub fn one(error: Error) -> Self {
        Self(vec![error])
    }

    /// Concatenate, keeping `self` first.
    pub fn append(mut self, other: Errors) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn push(&mut self, error: Error) {
        self.0.push(error);
    }

    pub fn first(&self) -> &Error {
        &self.0[0]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, error: &Error) -> bool {
        self.0.contains(error)
    }

    pub fn codes(&self) -> Vec<&str> {
        self.0.iter().map(Error::code).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Error] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Error> {
        self.0
    }
}

impl From<Error> for Errors {
    fn from(error: Error) -> Self {
        Self::one(error)
    }
}

impl IntoIterator for Errors {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, error) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            fmt::Display::fmt(error, f)?;
        }
        Ok(())
    }
}

/// Either a valid value or the accumulated reasons it is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation<T> {
    Valid(T),
    Invalid(Errors),
}

impl<T> Validation<T> {
    pub fn valid(value: T) -> Self {
        Self::Valid(value)
    }

    pub fn invalid(error: Error) -> Self {
        Self::Invalid(Errors::one(error))
    }

    pub fn invalid_all(errors: Errors) -> Self {
        Self::Invalid(errors)
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn is_invalid(&self) -> bool {
        !self.is_valid()
    }

    /// Total extraction: `on_invalid` receives every accumulated error.
    pub fn fold<R>(self, on_invalid: impl FnOnce(Errors) -> R, on_valid: impl FnOnce(T) -> R) -> R {
        match self {
            Self::Valid(value) => on_valid(value),
            Self::Invalid(errors) => on_invalid(errors),
        }
    }

    pub fn map<R>(self, f: impl FnOnce(T) -> R) -> Validation<R> {
        match self {
            Self::Valid(value) => Validation::Valid(f(value)),
            Self::Invalid(errors) => Validation::Invalid(errors),
        }
    }

    /// Sequential composition: an `Invalid` left side is returned as-is and `f`
    /// never runs.
    pub fn bind<R>(self, f: impl FnOnce(T) -> Validation<R>) -> Validation<R> {
        match self {
            Self::Valid(value) => f(value),
            Self::Invalid(errors) => Validation::Invalid(errors),
        }
    }

    /// Run a side effect on the valid value, returning `self` unchanged.
    pub fn inspect(self, f: impl FnOnce(&T)) -> Self {
        if let Self::Valid(value) = &self {
            f(value);
        }
        self
    }

    /// Accumulating pairwise combination.
    ///
    /// When both sides are invalid, the result carries `self`'s errors followed by
    /// `other`'s.
    pub fn zip<U>(self, other: Validation<U>) -> Validation<(T, U)> {
        match (self, other) {
            (Self::Valid(a), Validation::Valid(b)) => Validation::Valid((a, b)),
            (Self::Invalid(left), Validation::Invalid(right)) => Validation::Invalid(left.append(right)),
            (Self::Invalid(errors), Validation::Valid(_)) => Validation::Invalid(errors),
            (Self::Valid(_), Validation::Invalid(errors)) => Validation::Invalid(errors),
        }
    }

    pub fn zip_with<U, R>(self, other: Validation<U>, f: impl FnOnce(T, U) -> R) -> Validation<R> {
        self.zip(other).map(|(a, b)| f(a, b))
    }

    /// Combine three independent validations, collecting all errors in argument order.
    pub fn combine3<A, B, C>(
        a: Validation<A>,
        b: Validation<B>,
        c: Validation<C>,
        f: impl FnOnce(A, B, C) -> T,
    ) -> Validation<T> {
        a.zip(b).zip(c).map(|((a, b), c)| f(a, b, c))
    }

    /// Drops the error detail.
    pub fn to_optional(self) -> Optional<T> {
        self.fold(|_| Optional::empty(), Optional::present)
    }

    pub fn errors(&self) -> Optional<&Errors> {
        match self {
            Self::Valid(_) => Optional::empty(),
            Self::Invalid(errors) => Optional::present(errors),
        }
    }

    pub fn into_result(self) -> Result<T, Errors> {
        self.fold(Err, Ok)
    }
}

impl<T> From<Result<T, Error>> for Validation<T> {
    fn from(value: Result<T, Error>) -> Self {
        match value {
            Ok(v) => Self::valid(v),
            Err(e) => Self::invalid(e),
        }
    }
}

impl<T> From<Error> for Validation<T> {
    fn from(error: Error) -> Self {
        Self::invalid(error)
    }
}

/// Accumulating traversal: every invalid item contributes its errors, in order.
impl<T> FromIterator<Validation<T>> for Validation<Vec<T>> {
    fn from_iter<I: IntoIterator<Item = Validation<T>>>(iter: I) -> Self {
        let mut values = Vec::new();
        let mut failed: Option<Errors> = None;

        for item in iter {
            match item {
                Validation::Valid(v) if failed.is_none() => values.push(v),
                Validation::Valid(_) => {}
                Validation::Invalid(errors) => {
                    failed = Some(match failed.take() {
                        Some(acc) => acc.append(errors),
                        None => errors,
                    });
                }
            }
        }

        match failed {
            Some(errors) => Validation::Invalid(errors),
            None => Validation::Valid(values),
        }
    }
}
