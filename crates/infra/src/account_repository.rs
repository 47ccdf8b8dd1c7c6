//! Account persistence: decoding stored events and hydrating account state.
//!
//! The repository is where raw stream data meets the closed `AccountEvent` sum
//! type. A tag the state machine does not know, or a payload that does not decode,
//! is a fatal [`HistoryError`], never a business rejection.

use thiserror::Error;
use uuid::Uuid;

use boc_accounts::{AccountEvent, AccountId, AccountState};
use boc_core::{ExpectedVersion, HistoryError, Optional, hydrate};
use boc_events::Event;

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Store(#[from] EventStoreError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Hydrated account plus the stream version it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedAccount {
    pub state: Optional<AccountState>,
    /// Sequence number of the last event; 0 for an empty stream.
    pub version: u64,
}

/// Decode one stored event by its tag.
pub fn decode_event(stored: &StoredEvent) -> Result<AccountEvent, HistoryError> {
    if !AccountEvent::EVENT_TYPES.contains(&stored.event_type.as_str()) {
        return Err(HistoryError::UnhandledEvent(stored.event_type.clone()));
    }

    let event: AccountEvent =
        serde_json::from_value(stored.payload.clone()).map_err(|e| HistoryError::CorruptPayload {
            event_type: stored.event_type.clone(),
            reason: e.to_string(),
        })?;

    if event.event_type() != stored.event_type {
        return Err(HistoryError::CorruptPayload {
            event_type: stored.event_type.clone(),
            reason: format!("payload decodes as {}", event.event_type()),
        });
    }

    Ok(event)
}

#[derive(Debug)]
pub struct AccountRepository<S> {
    store: S,
    aggregate_type: String,
}

impl<S> AccountRepository<S> {
    pub fn new(store: S, aggregate_type: impl Into<String>) -> Self {
        Self {
            store,
            aggregate_type: aggregate_type.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }
}

impl<S> AccountRepository<S>
where
    S: EventStore,
{
    /// Load and replay the account's stream.
    pub fn load(&self, account_id: AccountId) -> Result<LoadedAccount, RepositoryError> {
        let stream = self.store.load_stream(account_id.0)?;
        validate_loaded_stream(account_id, &stream)?;

        let version = stream.last().map(StoredEvent::stream_version).unwrap_or(0);
        let events = stream.iter().map(decode_event).collect::<Result<Vec<_>, _>>()?;
        let state = hydrate::<AccountState, _>(events)?;

        Ok(LoadedAccount { state, version })
    }

    /// Append a single event, expecting the stream to be at `expected`.
    pub fn append(
        &self,
        account_id: AccountId,
        event: &AccountEvent,
        expected: ExpectedVersion,
    ) -> Result<StoredEvent, EventStoreError> {
        let uncommitted =
            UncommittedEvent::from_typed(account_id.0, self.aggregate_type.clone(), Uuid::now_v7(), event)?;

        self.store
            .append(vec![uncommitted], expected)?
            .into_iter()
            .next()
            .ok_or_else(|| EventStoreError::InvalidAppend("store committed no events".to_string()))
    }
}

fn validate_loaded_stream(account_id: AccountId, stream: &[StoredEvent]) -> Result<(), EventStoreError> {
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.aggregate_id != account_id.0 {
            return Err(EventStoreError::CorruptStream(format!(
                "loaded stream contains wrong aggregate_id at index {idx}"
            )));
        }
        if e.sequence_number <= last {
            return Err(EventStoreError::CorruptStream(format!(
                "non-monotonic sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            )));
        }
        last = e.sequence_number;
    }
    Ok(())
}
