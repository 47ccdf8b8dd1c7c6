use serde::{Deserialize, Serialize};
use uuid::Uuid;

use boc_core::AggregateId;

/// Where a committed event sits: which stream, and at which position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamPosition {
    pub aggregate_id: AggregateId,
    pub aggregate_type: String,
    /// 1-based, gap-free within the stream.
    pub sequence_number: u64,
}

/// A committed event as delivered to subscribers.
///
/// `event_type` is the stable tag a consumer needs to decode `payload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    #[serde(flatten)]
    position: StreamPosition,
    event_type: String,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        event_type: impl Into<String>,
        payload: E,
    ) -> Self {
        let position = StreamPosition {
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            sequence_number,
        };
        Self {
            event_id,
            position,
            event_type: event_type.into(),
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn position(&self) -> &StreamPosition {
        &self.position
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.position.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.position.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.position.sequence_number
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }

    /// Decode or transform the payload, keeping the metadata.
    pub fn try_map_payload<R, Err>(self, f: impl FnOnce(E) -> Result<R, Err>) -> Result<EventEnvelope<R>, Err> {
        Ok(EventEnvelope {
            event_id: self.event_id,
            position: self.position,
            event_type: self.event_type,
            payload: f(self.payload)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_map_payload_keeps_metadata() {
        let id = AggregateId::new();
        let envelope = EventEnvelope::new(Uuid::nil(), id, "bank.account", 3, "bank.account.frozen", "7");

        let mapped = envelope.clone().try_map_payload(|p| p.parse::<i32>()).unwrap();
        assert_eq!(mapped.payload(), &7);
        assert_eq!(mapped.position(), envelope.position());
        assert_eq!(mapped.event_type(), "bank.account.frozen");

        assert!(envelope.try_map_payload(|_| "x".parse::<i32>()).is_err());
    }
}
