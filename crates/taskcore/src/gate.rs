use std::sync::{Arc, Condvar, Mutex};
use tokio::sync::Semaphore;

/// Counting semaphore bounding simultaneous task bodies.
///
/// The flavor must match the call mode: a `Suspending` gate for
/// `Task::run`, a `Blocking` gate for `Task::run_blocking`. A mismatch
/// is a configuration error raised before the body runs.
#[derive(Clone, Debug)]
pub enum Gate {
    Suspending(Arc<Semaphore>),
    Blocking(Arc<SyncSemaphore>),
}

impl Gate {
    /// Gate for tasks running on the cooperative scheduler.
    pub fn suspending(permits: usize) -> Self {
        Gate::Suspending(Arc::new(Semaphore::new(permits)))
    }

    /// Gate for tasks running on plain threads.
    pub fn blocking(permits: usize) -> Self {
        Gate::Blocking(Arc::new(SyncSemaphore::new(permits)))
    }
}

/// Blocking counting semaphore. The standard library has no counting
/// flavor, so this is the usual mutex-and-condvar construction.
#[derive(Debug)]
pub struct SyncSemaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl SyncSemaphore {
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    /// Block the calling thread until a permit is free.
    pub fn acquire(self: &Arc<Self>) -> SyncPermit {
        let mut permits = self.permits.lock().unwrap_or_else(|e| e.into_inner());
        while *permits == 0 {
            permits = self
                .available
                .wait(permits)
                .unwrap_or_else(|e| e.into_inner());
        }
        *permits -= 1;
        SyncPermit {
            semaphore: Arc::clone(self),
        }
    }

    fn release(&self) {
        let mut permits = self.permits.lock().unwrap_or_else(|e| e.into_inner());
        *permits += 1;
        self.available.notify_one();
    }
}

/// Permit held while a blocking task body runs; releases on drop.
#[derive(Debug)]
pub struct SyncPermit {
    semaphore: Arc<SyncSemaphore>,
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}
