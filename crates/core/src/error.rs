//! Error model.
//!
//! Two kinds of failure live here and they are never mixed:
//!
//! - [`Error`]: an expected, named business-rule violation. These travel inside
//!   [`Validation::Invalid`](crate::Validation) and are part of normal control flow.
//! - [`HistoryError`]: a fatal replay failure. An event history that cannot be
//!   replayed means corrupted data or a missing case in the state machine, so it is
//!   surfaced as an `Err` and never folded into a business result.

use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use thiserror::Error;

use crate::value_object::ValueObject;

/// A named business-rule violation.
///
/// Equality and hashing use the `code` only; the message is diagnostic text.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{code}: {message}")]
pub struct Error {
    code: Cow<'static, str>,
    message: Cow<'static, str>,
}

impl Error {
    pub fn new(code: impl Into<Cow<'static, str>>, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Stable identifier (e.g. `"AccountNotActive"`).
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Error {}

impl Hash for Error {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl ValueObject for Error {}

/// Fatal failure while reconstructing state from an event history.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// The first event of a non-empty history is not a creation event.
    #[error("malformed history: first event is not a creation event ({0})")]
    MissingCreationEvent(String),

    /// A stored event carries a tag the state machine cannot apply.
    #[error("unhandled event type: {0}")]
    UnhandledEvent(String),

    /// A stored event payload could not be decoded into its variant.
    #[error("corrupt event payload for {event_type}: {reason}")]
    CorruptPayload { event_type: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_ignores_message() {
        let a = Error::new("InsufficientBalance", "not enough funds");
        let b = Error::new("InsufficientBalance", "balance too low for transfer");
        assert_eq!(a, b);
        assert_ne!(a, Error::new("AccountNotActive", "not enough funds"));
    }

    #[test]
    fn hashing_follows_code() {
        let mut set = HashSet::new();
        set.insert(Error::new("InvalidAmount", "one"));
        set.insert(Error::new("InvalidAmount", "two"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = Error::new("TransferDateIsPast", "transfer date cannot be in the past");
        assert_eq!(err.to_string(), "TransferDateIsPast: transfer date cannot be in the past");
    }

    #[test]
    fn serializes_code_and_message() {
        let err = Error::new("InvalidBic", "bic is malformed");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "InvalidBic");
        assert_eq!(json["message"], "bic is malformed");
    }
}
