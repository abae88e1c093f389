//! Worker scheduler (C6): hosts long-running polling workers as plain OS
//! threads, each with its own cancellation flag and tick interval. No
//! cooperative single-threaded event loop — a worker blocks only on its
//! tick timer and on HAL I/O, same as the fan-control loop this is
//! generalized from, just promoted from a single `AtomicBool` + async
//! task to one thread per worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::constants::timing::WORKER_JOIN_TIMEOUT;

/// One long-running polling task. `on_work` runs once per tick; errors are
/// logged and never propagate past the tick boundary — a single bad
/// reading must not take the worker down.
pub trait Worker: Send {
    /// Human-readable name, used only for logging.
    fn name(&self) -> &str;

    /// Called once before the first tick.
    fn on_start(&mut self) {}

    /// Called once per tick until the cancellation flag is set.
    fn on_work(&mut self);

    /// Called once after the loop exits, regardless of cause.
    fn on_exit(&mut self) {}
}

/// Cooperative cancellation flag shared between the scheduler and a
/// worker's thread.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

struct RunningWorker {
    name: String,
    cancel: CancelFlag,
    handle: JoinHandle<()>,
}

/// Owns the set of started workers and their join handles. Workers are
/// started once device identity and the HAL are ready and stopped as a
/// batch at shutdown.
#[derive(Default)]
pub struct WorkerScheduler {
    workers: Vec<RunningWorker>,
}

impl WorkerScheduler {
    pub fn new() -> Self {
        Self { workers: Vec::new() }
    }

    /// Spawns `worker` on its own thread, ticking every `interval` until
    /// cancelled.
    pub fn spawn(&mut self, mut worker: Box<dyn Worker>, interval: Duration) {
        let cancel = CancelFlag::new();
        let cancel_clone = cancel.clone();
        let name = worker.name().to_string();
        let thread_name = name.clone();

        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                worker.on_start();
                while !cancel_clone.is_cancelled() {
                    worker.on_work();
                    thread::sleep(interval);
                }
                worker.on_exit();
            })
            .expect("failed to spawn worker thread");

        info!(worker = %name, "worker started");
        self.workers.push(RunningWorker { name, cancel, handle });
    }

    /// Signals every worker to stop, then joins each with a 10 s deadline.
    /// A worker that fails to exit in time is abandoned — shutdown still
    /// proceeds.
    pub fn shutdown(self) {
        for w in &self.workers {
            w.cancel.cancel();
        }
        for w in self.workers {
            let name = w.name.clone();
            let joined = join_with_timeout(w.handle, WORKER_JOIN_TIMEOUT);
            match joined {
                Ok(()) => debug!(worker = %name, "worker joined cleanly"),
                Err(()) => warn!(worker = %name, "worker did not exit within deadline, abandoning"),
            }
        }
    }
}

/// `JoinHandle::join` has no built-in timeout; poll `is_finished` instead.
fn join_with_timeout(handle: JoinHandle<()>, timeout: Duration) -> Result<(), ()> {
    let step = Duration::from_millis(50);
    let mut waited = Duration::ZERO;
    while !handle.is_finished() && waited < timeout {
        thread::sleep(step);
        waited += step;
    }
    if handle.is_finished() {
        if let Err(e) = handle.join() {
            error!(?e, "worker thread panicked");
        }
        Ok(())
    } else {
        Err(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct CountingWorker {
        counter: Arc<AtomicU32>,
    }

    impl Worker for CountingWorker {
        fn name(&self) -> &str {
            "counting"
        }
        fn on_work(&mut self) {
            self.counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn worker_ticks_until_cancelled() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut scheduler = WorkerScheduler::new();
        scheduler.spawn(Box::new(CountingWorker { counter: counter.clone() }), Duration::from_millis(5));
        thread::sleep(Duration::from_millis(60));
        scheduler.shutdown();
        assert!(counter.load(Ordering::SeqCst) >= 2);
    }
}
