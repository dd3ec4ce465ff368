use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::engine::{AudioEngine, EngineHandle, EngineState, LoadToken};

use super::buffer::SeekBuffer;
use super::task::RepeatingTask;

/// Display-frame cadence for position polling.
const POLL_PERIOD: Duration = Duration::from_millis(16);

/// Wall-clock period between wheel-buffer flushes. Raw wheel events
/// fire far more often than this with tiny deltas; batching keeps the
/// engine from being flooded with per-event seeks and avoids reading
/// its position on every wheel tick.
const FLUSH_PERIOD: Duration = Duration::from_millis(100);

/// Progress pair published to the display. `None` means unknown: no
/// engine attached, or the engine has not resolved the value yet.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ProgressSnapshot {
    pub position: Option<f64>,
    pub duration: Option<f64>,
}

pub(super) type SharedSnapshot = Arc<Mutex<ProgressSnapshot>>;

/// One attached engine and the activities running against it.
struct Attachment {
    engine: EngineHandle,
    poll: RepeatingTask,
    flush: RepeatingTask,
    load_token: Option<LoadToken>,
    /// Cleared on detach so a load handler the engine has already
    /// pulled out of its registry still cannot write into a torn-down
    /// attachment.
    alive: Arc<AtomicBool>,
}

/// The seek reconciliation loop.
///
/// While an engine is attached, three independent activities run
/// against it, each holding its own clone of the handle: a
/// frame-cadence position poll, a one-shot duration resolution, and a
/// fixed-interval flush of buffered wheel input. Detaching cancels all
/// three before they can observe a stale handle.
pub struct SeekLoop {
    snapshot: SharedSnapshot,
    buffer: SeekBuffer,
    attachment: Option<Attachment>,
}

impl SeekLoop {
    pub fn new() -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(ProgressSnapshot::default())),
            buffer: SeekBuffer::new(),
            attachment: None,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        *self.snapshot.lock().unwrap()
    }

    /// Whether the seek control is live. Detached means an indeterminate
    /// position and no interaction.
    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Start the three activities against `engine`, tearing down any
    /// previous attachment first.
    pub fn attach(&mut self, engine: EngineHandle) {
        self.detach();

        let alive = Arc::new(AtomicBool::new(true));
        let load_token = resolve_duration(&engine, &self.snapshot, &alive);

        let poll = {
            let engine = engine.clone();
            let snapshot = self.snapshot.clone();
            RepeatingTask::spawn("seek-poll", POLL_PERIOD, move || {
                poll_position(engine.as_ref(), &snapshot);
            })
        };

        let flush = {
            let engine = engine.clone();
            let buffer = self.buffer.clone();
            RepeatingTask::spawn("seek-flush", FLUSH_PERIOD, move || {
                flush_wheel(engine.as_ref(), &buffer);
            })
        };

        self.attachment = Some(Attachment {
            engine,
            poll,
            flush,
            load_token,
            alive,
        });
    }

    /// Cancel all three activities and forget the engine. The snapshot
    /// reverts to unknown and stays there until the next attach; the
    /// wheel buffer keeps whatever is queued for that next attachment.
    pub fn detach(&mut self) {
        if let Some(att) = self.attachment.take() {
            att.alive.store(false, Ordering::SeqCst);
            att.poll.cancel();
            att.flush.cancel();
            if let Some(token) = att.load_token {
                att.engine.off_load(token);
            }
        }
        *self.snapshot.lock().unwrap() = ProgressSnapshot::default();
    }

    /// Direct scrub: an immediate absolute seek that bypasses the wheel
    /// buffer. Rejected while detached.
    pub fn seek_to(&self, secs: f64) {
        if let Some(att) = &self.attachment {
            att.engine.seek_to(secs);
        }
    }

    /// Queue wheel input, in whole seconds, for the next flush.
    /// Rejected while detached.
    pub fn queue_wheel(&self, secs: i64) {
        if self.attachment.is_some() {
            self.buffer.add(secs);
        }
    }
}

impl Default for SeekLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SeekLoop {
    fn drop(&mut self) {
        self.detach();
    }
}

/// One position-poll tick: publish the engine's current position, or
/// unknown when it has none.
pub(super) fn poll_position(engine: &dyn AudioEngine, snapshot: &SharedSnapshot) {
    let position = engine.position();
    snapshot.lock().unwrap().position = position;
}

/// One flush tick: apply the whole buffered delta on top of the
/// engine's current position.
///
/// The buffer is drained only once the position is known; with an
/// unknown position the queued delta simply waits for a later cycle.
/// Draining happens before the seek command, so wheel input arriving
/// mid-flush lands in the next cycle rather than being lost.
pub(super) fn flush_wheel(engine: &dyn AudioEngine, buffer: &SeekBuffer) {
    if buffer.is_empty() {
        return;
    }

    let Some(position) = engine.position() else {
        return;
    };

    let queued = buffer.drain();
    if queued != 0 {
        engine.seek_to(position + queued as f64);
    }
}

/// Resolve the duration into the snapshot: immediately when the engine
/// is past loading, otherwise via a one-shot load subscription whose
/// token is returned so an early detach can drop it.
pub(super) fn resolve_duration(
    engine: &EngineHandle,
    snapshot: &SharedSnapshot,
    alive: &Arc<AtomicBool>,
) -> Option<LoadToken> {
    if engine.state() == EngineState::Loading {
        let engine_for_load = engine.clone();
        let snapshot = snapshot.clone();
        let alive = alive.clone();
        let token = engine.once_load(Box::new(move || {
            if alive.load(Ordering::SeqCst) {
                snapshot.lock().unwrap().duration = engine_for_load.duration();
            }
        }));
        Some(token)
    } else {
        snapshot.lock().unwrap().duration = engine.duration();
        None
    }
}
