//! Append-only activity ledger.

mod recorder;

pub use recorder::{LogRecorder, DEFAULT_LOG_CAPACITY};
