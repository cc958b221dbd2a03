//! Best-effort replication of log entries to an external store.

mod handle;

pub use handle::{LogMirror, MemoryMirror, MirrorHandle};
