use std::collections::HashMap;
use std::sync::RwLock;

use boc_core::{AggregateId, ExpectedVersion};

use super::r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

/// Event store backed by a `HashMap` of streams behind an `RwLock`.
///
/// For tests and single-process runs; nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<AggregateId, Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn stream_count(&self) -> usize {
        self.streams.read().map(|streams| streams.len()).unwrap_or(0)
    }
}

/// The stream a batch targets; every event must agree on it.
fn batch_target(events: &[UncommittedEvent]) -> Result<Option<(AggregateId, &str)>, EventStoreError> {
    let Some(first) = events.first() else {
        return Ok(None);
    };

    if let Some(idx) = events.iter().position(|e| e.aggregate_id != first.aggregate_id) {
        return Err(EventStoreError::InvalidAppend(format!(
            "batch mixes aggregate ids (index {idx})"
        )));
    }
    if let Some(idx) = events.iter().position(|e| e.aggregate_type != first.aggregate_type) {
        return Err(EventStoreError::AggregateTypeMismatch(format!(
            "batch mixes aggregate types (index {idx})"
        )));
    }

    Ok(Some((first.aggregate_id, first.aggregate_type.as_str())))
}

impl EventStore for InMemoryEventStore {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let Some((aggregate_id, aggregate_type)) = batch_target(&events)? else {
            return Ok(vec![]);
        };
        let aggregate_type = aggregate_type.to_string();

        let mut streams = self.streams.write().map_err(|_| EventStoreError::LockPoisoned)?;

        let existing = streams.get(&aggregate_id).map(Vec::as_slice).unwrap_or_default();
        let current = existing.last().map(StoredEvent::stream_version).unwrap_or(0);

        if !expected_version.matches(current) {
            return Err(EventStoreError::Concurrency(format!(
                "expected {expected_version:?}, found {current}"
            )));
        }

        if let Some(first) = existing.first().filter(|e| e.aggregate_type != aggregate_type) {
            return Err(EventStoreError::AggregateTypeMismatch(format!(
                "stream holds '{}', append used '{aggregate_type}'",
                first.aggregate_type
            )));
        }

        let committed: Vec<StoredEvent> = events
            .into_iter()
            .zip(current + 1..)
            .map(|(event, seq)| event.commit(seq))
            .collect();
        // Streams only come into existence on a successful commit.
        streams
            .entry(aggregate_id)
            .or_default()
            .extend(committed.iter().cloned());

        Ok(committed)
    }

    fn load_stream(&self, aggregate_id: AggregateId) -> Result<Vec<StoredEvent>, EventStoreError> {
        let streams = self.streams.read().map_err(|_| EventStoreError::LockPoisoned)?;

        Ok(streams.get(&aggregate_id).cloned().unwrap_or_default())
    }
}
