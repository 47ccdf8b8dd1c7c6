//! `Optional<T>`: zero or one value, with a total `fold` as the only extraction.
//!
//! `Optional` is used where absence carries no diagnostic content ("no account
//! with this id yet"). When the caller needs to know *why* something is missing,
//! convert to a [`Validation`] with [`Optional::to_validation`].
//!
//! ```ignore
//! let rate = cache
//!     .lookup(&pair)
//!     .or_else_with(|| fetch_remote(&pair)) // only runs on a miss
//!     .get_or_else(Rate::ONE);
//! ```

use crate::error::Error;
use crate::validation::Validation;

/// Presence or absence of a value.
///
/// The representation is a tagged union, so a "present but empty" value cannot be
/// built: converting from `Option::None` always yields the canonical empty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Optional<T>(Option<T>);

impl<T> Optional<T> {
    /// The canonical empty value.
    pub const fn empty() -> Self {
        Self(None)
    }

    pub const fn present(value: T) -> Self {
        Self(Some(value))
    }

    pub const fn is_present(&self) -> bool {
        self.0.is_some()
    }

    pub const fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Total extraction: `on_empty` for the empty case, `on_present` otherwise.
    pub fn fold<R>(self, on_empty: impl FnOnce() -> R, on_present: impl FnOnce(T) -> R) -> R {
        match self.0 {
            Some(value) => on_present(value),
            None => on_empty(),
        }
    }

    pub fn as_ref(&self) -> Optional<&T> {
        Optional(self.0.as_ref())
    }

    pub fn map<R>(self, f: impl FnOnce(T) -> R) -> Optional<R> {
        Optional(self.0.map(f))
    }

    /// Monadic chaining; short-circuits on the first empty.
    pub fn bind<R>(self, f: impl FnOnce(T) -> Optional<R>) -> Optional<R> {
        match self.0 {
            Some(value) => f(value),
            None => Optional::empty(),
        }
    }

    /// Keeps the value only when `predicate` holds.
    pub fn filter(self, predicate: impl FnOnce(&T) -> bool) -> Self {
        Self(self.0.filter(predicate))
    }

    /// Left-biased choice with an already computed fallback.
    pub fn or_else(self, fallback: Optional<T>) -> Self {
        if self.is_present() { self } else { fallback }
    }

    /// Left-biased choice; `fallback` runs only when `self` is empty.
    pub fn or_else_with(self, fallback: impl FnOnce() -> Optional<T>) -> Self {
        if self.is_present() { self } else { fallback() }
    }

    pub fn get_or_else(self, default: T) -> T {
        self.0.unwrap_or(default)
    }

    /// Like [`get_or_else`](Self::get_or_else) but `default` runs only when empty.
    pub fn get_or_else_with(self, default: impl FnOnce() -> T) -> T {
        self.0.unwrap_or_else(default)
    }

    /// Promote to a `Validation`, using `error` for the empty case.
    pub fn to_validation(self, error: Error) -> Validation<T> {
        self.fold(|| Validation::invalid(error), Validation::valid)
    }

    pub fn to_validation_with(self, error: impl FnOnce() -> Error) -> Validation<T> {
        self.fold(|| Validation::invalid(error()), Validation::valid)
    }

    pub fn iter(&self) -> std::option::Iter<'_, T> {
        self.0.iter()
    }

    pub fn into_option(self) -> Option<T> {
        self.0
    }
}

impl<T> Optional<Optional<T>> {
    pub fn flatten(self) -> Optional<T> {
        self.bind(|inner| inner)
    }
}

impl<T> Default for Optional<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<Option<T>> for Optional<T> {
    fn from(value: Option<T>) -> Self {
        Self(value)
    }
}

impl<T> From<Optional<T>> for Option<T> {
    fn from(value: Optional<T>) -> Self {
        value.0
    }
}

impl<T> IntoIterator for Optional<T> {
    type Item = T;
    type IntoIter = std::option::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Optional<T> {
    type Item = &'a T;
    type IntoIter = std::option::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
