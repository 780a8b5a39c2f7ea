//! Progress reporting for dataset loading.
//!
//! The loader only knows how many rows it has read so far, never the total,
//! so implementations are expected to render a spinner-style indicator.

use std::sync::Arc;

/// Receives progress updates from long-running loads.
///
/// Implementations must be `Send + Sync` so a single callback can be shared
/// behind an `Arc`.
pub trait ProgressCallback: Send + Sync {
    /// Advance progress by `delta` rows.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// A [`ProgressCallback`] that discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
