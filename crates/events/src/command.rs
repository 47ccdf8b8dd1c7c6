use boc_core::AggregateId;

/// A request to change one aggregate.
///
/// Unlike events, commands are never stored and may be refused. The target id
/// picks the stream to hydrate and the per-aggregate lock to take.
pub trait Command: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn target_aggregate_id(&self) -> AggregateId;
}
