//! Buffered scroll-wheel seek input.

use std::sync::{Arc, Mutex};

/// Raw wheel units that equal one second of seek. A single notch is
/// typically around 40 raw units, so one notch scrubs a couple of
/// seconds.
pub const WHEEL_UNITS_PER_SECOND: f64 = 20.0;

/// Convert a raw wheel delta pair into whole seconds of seek.
pub fn wheel_seconds(delta_x: f64, delta_y: f64) -> i64 {
    ((delta_x + delta_y) / WHEEL_UNITS_PER_SECOND).floor() as i64
}

/// Accumulator of unflushed wheel-seek seconds.
///
/// Cloned handles share one buffer. Exactly two writers exist: the
/// wheel handler adds, the flush cycle drains. A drain empties the
/// buffer to zero in one step, so input arriving after the drain
/// belongs to the next flush and nothing is lost or applied twice.
#[derive(Clone, Default)]
pub struct SeekBuffer {
    queued: Arc<Mutex<i64>>,
}

impl SeekBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue whole seconds of pending seek, either sign.
    pub fn add(&self, secs: i64) {
        *self.queued.lock().unwrap() += secs;
    }

    /// Take the whole accumulated value, leaving zero.
    pub fn drain(&self) -> i64 {
        std::mem::take(&mut *self.queued.lock().unwrap())
    }

    pub fn is_empty(&self) -> bool {
        *self.queued.lock().unwrap() == 0
    }
}
