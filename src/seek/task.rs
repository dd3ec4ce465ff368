//! Fixed-period cancellable worker: the scheduling primitive behind
//! the position poll and the wheel flush.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A repeating task on its own thread.
///
/// The closure runs once per `period` until the task is cancelled.
/// Cancelling joins the worker, so no tick can still be running, or
/// ever run again, once `cancel` returns.
pub struct RepeatingTask {
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl RepeatingTask {
    pub fn spawn(name: &str, period: Duration, mut tick: impl FnMut() + Send + 'static) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_for_worker = stop.clone();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while !stop_for_worker.load(Ordering::Relaxed) {
                    tick();
                    thread::sleep(period);
                }
            })
            .expect("failed to spawn worker thread");

        Self {
            stop,
            join: Some(join),
        }
    }

    /// Stop the task and wait for any in-flight tick to finish.
    pub fn cancel(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
