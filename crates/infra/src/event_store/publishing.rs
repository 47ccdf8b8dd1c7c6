use serde_json::Value as JsonValue;

use boc_core::{AggregateId, ExpectedVersion};
use boc_events::{EventBus, EventEnvelope, Subscription};

use super::r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

/// Store decorator that hands every committed event to a bus.
///
/// Publication starts only once the inner append returned, so a subscriber never
/// sees an event the store does not have. If publishing fails the events stay
/// stored and the error is reported as [`EventStoreError::Publish`].
#[derive(Debug)]
pub struct PublishingEventStore<S, B> {
    inner: S,
    bus: B,
}

impl<S, B> PublishingEventStore<S, B> {
    pub fn new(inner: S, bus: B) -> Self {
        Self { inner, bus }
    }

    pub fn subscribe(&self) -> Subscription<EventEnvelope<JsonValue>>
    where
        B: EventBus<EventEnvelope<JsonValue>>,
    {
        self.bus.subscribe()
    }
}

impl<S, B> EventStore for PublishingEventStore<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let committed = self.inner.append(events, expected_version)?;

        committed
            .iter()
            .try_for_each(|stored| self.bus.publish(stored.to_envelope()))
            .map_err(|err| EventStoreError::Publish(format!("{err:?}")))?;

        Ok(committed)
    }

    fn load_stream(&self, aggregate_id: AggregateId) -> Result<Vec<StoredEvent>, EventStoreError> {
        self.inner.load_stream(aggregate_id)
    }
}
