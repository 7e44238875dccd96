//! Background execution with a concurrency limit of one.

use crate::error::JobError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use tracing::debug;

/// Runs units of work on a background thread, one at a time.
#[derive(Clone, Default)]
pub struct JobRunner {
    busy: Arc<AtomicBool>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Starts `work` unless another unit is still running.
    pub fn submit<T, F>(&self, label: &str, work: F) -> Result<JobHandle<T>, JobError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(JobError::Busy);
        }

        let (tx, rx) = mpsc::sync_channel(1);
        let guard = BusyGuard(self.busy.clone());
        let spawned = thread::Builder::new()
            .name(format!("page-voice-{label}"))
            .spawn(move || {
                let out = work();
                // Clear the flag before signalling so a waiter can resubmit.
                drop(guard);
                let _ = tx.send(out);
            });

        match spawned {
            Ok(_) => {
                debug!("submitted {label}");
                Ok(JobHandle { rx })
            }
            // The closure (and its guard) was dropped, so the flag is clear.
            Err(_) => Err(JobError::WorkerLost),
        }
    }
}

struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One-shot completion signal for a submitted unit.
pub struct JobHandle<T> {
    rx: Receiver<T>,
}

impl<T> JobHandle<T> {
    /// Blocks until the unit finishes.
    pub fn wait(self) -> Result<T, JobError> {
        self.rx.recv().map_err(|_| JobError::WorkerLost)
    }

    /// `Ok(None)` while the unit is still running.
    pub fn try_wait(&self) -> Result<Option<T>, JobError> {
        match self.rx.try_recv() {
            Ok(v) => Ok(Some(v)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(JobError::WorkerLost),
        }
    }
}
