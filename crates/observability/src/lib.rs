//! Process-wide tracing setup shared by services and tests.

/// Subscriber construction (filters, output format).
pub mod tracing;

pub use self::tracing::{LogFormat, init_with};

/// Initialize JSON logging filtered by `RUST_LOG` (default `info`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    self::tracing::init();
}
