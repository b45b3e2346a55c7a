//! Process-wide logging setup shared by the binary and tests.

/// Install the global subscriber.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filter, formatting).
pub mod tracing;
