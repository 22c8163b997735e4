//! Per-county progress reporting.
//!
//! The aggregator reports through [`ProgressCallback`] and never draws
//! anything itself. The CLI supplies an `indicatif` bar; tests pass
//! [`NullProgress`].

/// Sink for per-county progress updates.
pub trait ProgressCallback: Send + Sync {
    /// Number of counties about to be processed.
    fn set_total(&self, total: u64);

    /// `delta` more counties are done.
    fn inc(&self, delta: u64);

    /// Label of the county currently being processed.
    fn set_message(&self, msg: String);

    /// All counties are done.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
