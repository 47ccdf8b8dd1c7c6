//! `boc-core`: functional building blocks for the domain layer.
//!
//! This crate contains **pure** primitives only (no IO, no logging, no storage):
//! the [`Optional`] and [`Validation`] containers, the business [`Error`] value,
//! the [`Transition`] / [`Aggregate`] abstractions and the generic replay routine.

pub mod aggregate;
pub mod error;
pub mod id;
pub mod optional;
pub mod validation;
pub mod value_object;

pub use aggregate::{Aggregate, ExpectedVersion, Transition, hydrate, replay};
pub use error::{Error, HistoryError};
pub use id::AggregateId;
pub use optional::Optional;
pub use validation::{Errors, Validation};
pub use value_object::ValueObject;
