//! Event-sourced aggregate semantics (pure, deterministic).
//!
//! - **Decision logic**: a [`Transition`] validates a command against a state and
//!   yields the event together with the state that results from applying it.
//! - **State mutation**: [`Aggregate::apply`] evolves state from one event.
//! - **Reconstruction**: [`hydrate`] folds an ordered history into current state.
//!
//! Nothing here performs IO. Persisting and publishing events is the caller's job.

use std::borrow::Borrow;
use std::fmt::Debug;

use crate::error::HistoryError;
use crate::optional::Optional;
use crate::validation::Validation;

/// Unit of command handling: `state -> Validation<(event, new_state)>`.
///
/// Implemented for every `Fn(&S) -> Validation<(E, S)>`, so command handlers are
/// usually closures that capture their command.
pub trait Transition<S, E> {
    fn run(&self, state: &S) -> Validation<(E, S)>;
}

impl<S, E, F> Transition<S, E> for F
where
    F: Fn(&S) -> Validation<(E, S)>,
{
    fn run(&self, state: &S) -> Validation<(E, S)> {
        self(state)
    }
}

/// State that is evolved exclusively by events.
pub trait Aggregate: Sized {
    type Event: Debug;

    /// Initial state from the first event of a history.
    ///
    /// Returns `None` when the event is not a creation event.
    fn create(event: &Self::Event) -> Option<Self>;

    /// Evolve state from a single event. Must be deterministic and total.
    fn apply(self, event: &Self::Event) -> Self;
}

/// Rebuild state from an ordered history (oldest first).
///
/// - empty history: `Ok(Optional::empty())`
/// - creation event first: `Ok(Optional::present(state))`
/// - anything else first: `Err(HistoryError::MissingCreationEvent)`
pub fn hydrate<A, I>(history: I) -> Result<Optional<A>, HistoryError>
where
    A: Aggregate,
    I: IntoIterator,
    I::Item: Borrow<A::Event>,
{
    let mut events = history.into_iter();

    let Some(first) = events.next() else {
        return Ok(Optional::empty());
    };

    let first: &A::Event = first.borrow();
    let initial = A::create(first)
        .ok_or_else(|| HistoryError::MissingCreationEvent(format!("{first:?}")))?;

    Ok(Optional::present(replay(initial, events)))
}

/// Apply further events on top of an existing state.
pub fn replay<A, I>(state: A, events: I) -> A
where
    A: Aggregate,
    I: IntoIterator,
    I::Item: Borrow<A::Event>,
{
    events
        .into_iter()
        .fold(state, |acc, event| acc.apply(event.borrow()))
}

/// Optimistic concurrency expectation for an event stream append.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// Require the stream to be at an exact version (0 = stream must not exist).
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }
}
