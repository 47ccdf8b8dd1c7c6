use chrono::{DateTime, Utc};

/// A fact recorded in an aggregate stream.
///
/// The tag returned by `event_type` is persisted next to the serialized payload and
/// selects the variant when the stream is replayed, so it must never change once
/// events carrying it have been stored. Bump `version` when the payload shape changes.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    /// Business time, as carried by the command that produced the event.
    fn occurred_at(&self) -> DateTime<Utc>;
}
