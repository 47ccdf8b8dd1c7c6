//! Append-only event storage.

pub mod in_memory;
pub mod publishing;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use publishing::PublishingEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
