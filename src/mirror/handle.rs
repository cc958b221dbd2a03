//! Fire-and-forget mirroring of log entries to an external durable store.
//!
//! The mirror is a one-way collaborator: writes are sent over a bounded
//! channel to a worker thread and the caller never blocks, never retries,
//! and never observes failure. A full or disconnected channel drops the
//! entry. There is no acknowledgement contract and no cancellation; once an
//! entry is handed to the worker it either lands or silently doesn't.

use crate::error::{Result, StoreError};
use crate::types::AppLog;
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Default in-flight buffer before entries are dropped.
const DEFAULT_BUFFER_SIZE: usize = 256;

/// An external durable store for log entries, keyed by timestamp.
///
/// Implementations must tolerate duplicate writes; the registry offers no
/// delivery guarantee either way.
pub trait LogMirror: Send + 'static {
    fn write_log(&self, entry: &AppLog) -> Result<()>;
}

/// Handle to a mirror worker thread.
///
/// Dropping the handle closes the channel; the worker drains whatever is
/// already buffered and exits.
pub struct MirrorHandle {
    sender: Option<Sender<AppLog>>,
    worker: Option<JoinHandle<()>>,
}

impl MirrorHandle {
    /// Spawn a worker draining writes into `mirror`.
    pub fn spawn<M: LogMirror>(mirror: M) -> Self {
        Self::spawn_with_buffer(mirror, DEFAULT_BUFFER_SIZE)
    }

    /// Spawn with a custom buffer size (small buffers are useful in tests).
    pub fn spawn_with_buffer<M: LogMirror>(mirror: M, buffer_size: usize) -> Self {
        let (sender, receiver) = bounded::<AppLog>(buffer_size);
        let worker = thread::spawn(move || {
            for entry in receiver {
                if let Err(e) = mirror.write_log(&entry) {
                    // Best-effort only; the failure is visible nowhere but
                    // the trace output.
                    tracing::warn!(log_id = %entry.id, error = %e, "mirror write failed");
                }
            }
        });
        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Queue an entry for mirroring. Never blocks; a full or closed channel
    /// drops the entry.
    pub fn send(&self, entry: AppLog) {
        let Some(sender) = &self.sender else { return };
        match sender.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!("mirror buffer full, dropping log entry");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!("mirror worker gone, dropping log entry");
            }
        }
    }
}

impl Drop for MirrorHandle {
    fn drop(&mut self) {
        // Closing the channel is the shutdown signal.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// In-memory mirror collecting entries behind a lock. Used in tests and as a
/// stand-in when no remote store is configured.
#[derive(Clone, Default)]
pub struct MemoryMirror {
    entries: Arc<Mutex<Vec<AppLog>>>,
    fail_writes: bool,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mirror whose writes always fail, for exercising the swallow path.
    pub fn failing() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            fail_writes: true,
        }
    }

    pub fn entries(&self) -> Vec<AppLog> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl LogMirror for MemoryMirror {
    fn write_log(&self, entry: &AppLog) -> Result<()> {
        if self.fail_writes {
            return Err(StoreError::MirrorWrite("simulated failure".into()));
        }
        self.entries.lock().push(entry.clone());
        Ok(())
    }
}
