use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::engine::{AudioEngine, EngineHandle, EngineState, LoadHandler, LoadToken};

use super::monitor::{SharedSnapshot, flush_wheel, poll_position, resolve_duration};
use super::*;

/// Scripted engine that records every call made against it.
#[derive(Default)]
struct FakeInner {
    position: Option<f64>,
    duration: Option<f64>,
    loading: bool,
    seeks: Vec<f64>,
    listeners: Vec<(u64, LoadHandler)>,
    next_token: u64,
}

#[derive(Default)]
struct FakeEngine {
    inner: Mutex<FakeInner>,
    calls: AtomicUsize,
}

impl FakeEngine {
    fn ready(position: Option<f64>, duration: Option<f64>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(FakeInner {
                position,
                duration,
                ..FakeInner::default()
            }),
            calls: AtomicUsize::new(0),
        })
    }

    fn loading() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(FakeInner {
                loading: true,
                ..FakeInner::default()
            }),
            calls: AtomicUsize::new(0),
        })
    }

    fn set_duration(&self, duration: Option<f64>) {
        self.inner.lock().unwrap().duration = duration;
    }

    fn finish_loading(&self) {
        let fired = {
            let mut inner = self.inner.lock().unwrap();
            inner.loading = false;
            std::mem::take(&mut inner.listeners)
        };
        for (_, f) in fired {
            f();
        }
    }

    fn seeks(&self) -> Vec<f64> {
        self.inner.lock().unwrap().seeks.clone()
    }

    fn pending_listeners(&self) -> usize {
        self.inner.lock().unwrap().listeners.len()
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AudioEngine for FakeEngine {
    fn position(&self) -> Option<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.lock().unwrap().position
    }

    fn seek_to(&self, secs: f64) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock().unwrap();
        inner.seeks.push(secs);
        inner.position = Some(secs);
    }

    fn duration(&self) -> Option<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.lock().unwrap().duration
    }

    fn state(&self) -> EngineState {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.lock().unwrap().loading {
            EngineState::Loading
        } else {
            EngineState::Ready
        }
    }

    fn once_load(&self, handler: LoadHandler) -> LoadToken {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock().unwrap();
        let token = LoadToken(inner.next_token);
        inner.next_token += 1;

        if inner.loading {
            inner.listeners.push((token.0, handler));
        } else {
            drop(inner);
            handler();
        }
        token
    }

    fn off_load(&self, token: LoadToken) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .lock()
            .unwrap()
            .listeners
            .retain(|(id, _)| *id != token.0);
    }
}

fn new_snapshot() -> SharedSnapshot {
    Arc::new(Mutex::new(ProgressSnapshot::default()))
}

#[test]
fn wheel_seconds_floors_raw_units() {
    assert_eq!(wheel_seconds(0.0, 40.0), 2);
    assert_eq!(wheel_seconds(0.0, 39.0), 1);
    assert_eq!(wheel_seconds(0.0, 19.0), 0);
    assert_eq!(wheel_seconds(10.0, 30.0), 2);
    // Negative deltas floor toward minus infinity.
    assert_eq!(wheel_seconds(0.0, -30.0), -2);
    assert_eq!(wheel_seconds(0.0, -40.0), -2);
}

#[test]
fn buffer_accumulates_and_drains_to_zero() {
    let buffer = SeekBuffer::new();
    for _ in 0..5 {
        buffer.add(wheel_seconds(0.0, 40.0));
    }

    assert!(!buffer.is_empty());
    assert_eq!(buffer.drain(), 10);
    assert!(buffer.is_empty());
    assert_eq!(buffer.drain(), 0);
}

#[test]
fn flush_applies_one_seek_on_top_of_current_position_and_resets() {
    let engine = FakeEngine::ready(Some(5.0), Some(100.0));
    let buffer = SeekBuffer::new();
    buffer.add(10);

    flush_wheel(engine.as_ref(), &buffer);
    assert_eq!(engine.seeks(), vec![15.0]);
    assert!(buffer.is_empty());

    // A second cycle with an empty buffer issues nothing.
    flush_wheel(engine.as_ref(), &buffer);
    assert_eq!(engine.seeks(), vec![15.0]);
}

#[test]
fn flush_with_empty_buffer_never_touches_the_engine() {
    let engine = FakeEngine::ready(Some(5.0), Some(100.0));
    let buffer = SeekBuffer::new();

    flush_wheel(engine.as_ref(), &buffer);
    assert_eq!(engine.call_count(), 0);
}

#[test]
fn flush_keeps_buffer_while_position_is_unknown() {
    let engine = FakeEngine::ready(None, None);
    let buffer = SeekBuffer::new();
    buffer.add(3);

    flush_wheel(engine.as_ref(), &buffer);
    assert!(engine.seeks().is_empty());
    assert_eq!(buffer.drain(), 3);
}

#[test]
fn poll_publishes_position_or_unknown() {
    let snapshot = new_snapshot();

    let engine = FakeEngine::ready(Some(42.5), None);
    poll_position(engine.as_ref(), &snapshot);
    assert_eq!(snapshot.lock().unwrap().position, Some(42.5));

    let engine = FakeEngine::ready(None, None);
    poll_position(engine.as_ref(), &snapshot);
    assert_eq!(snapshot.lock().unwrap().position, None);
}

#[test]
fn duration_resolves_immediately_when_engine_is_ready() {
    let engine = FakeEngine::ready(Some(0.0), Some(120.0));
    let snapshot = new_snapshot();
    let alive = Arc::new(AtomicBool::new(true));

    let token = resolve_duration(&(engine.clone() as EngineHandle), &snapshot, &alive);
    assert!(token.is_none());
    assert_eq!(snapshot.lock().unwrap().duration, Some(120.0));
}

#[test]
fn duration_resolves_through_the_one_shot_load_event() {
    let engine = FakeEngine::loading();
    let snapshot = new_snapshot();
    let alive = Arc::new(AtomicBool::new(true));

    let token = resolve_duration(&(engine.clone() as EngineHandle), &snapshot, &alive);
    assert!(token.is_some());
    assert_eq!(snapshot.lock().unwrap().duration, None);

    engine.set_duration(Some(90.0));
    engine.finish_loading();
    assert_eq!(snapshot.lock().unwrap().duration, Some(90.0));
    assert_eq!(engine.pending_listeners(), 0);
}

#[test]
fn a_load_handler_caught_mid_teardown_cannot_write_into_the_snapshot() {
    let engine = FakeEngine::loading();
    let snapshot = new_snapshot();
    let alive = Arc::new(AtomicBool::new(true));

    resolve_duration(&(engine.clone() as EngineHandle), &snapshot, &alive);

    // Teardown flips the flag before the engine gets to fire.
    alive.store(false, Ordering::SeqCst);
    engine.set_duration(Some(90.0));
    engine.finish_loading();
    assert_eq!(snapshot.lock().unwrap().duration, None);
}

#[test]
fn detach_before_load_fires_drops_the_subscription() {
    let engine = FakeEngine::loading();
    let mut seek = SeekLoop::new();

    seek.attach(engine.clone());
    assert_eq!(engine.pending_listeners(), 1);

    seek.detach();
    assert_eq!(engine.pending_listeners(), 0);

    // Late load completion finds nobody to call.
    engine.set_duration(Some(90.0));
    engine.finish_loading();
    assert_eq!(seek.snapshot().duration, None);
}

#[test]
fn attach_publishes_progress_and_detach_stops_all_engine_calls() {
    let engine = FakeEngine::ready(Some(42.0), Some(100.0));
    let mut seek = SeekLoop::new();

    seek.attach(engine.clone());
    thread::sleep(Duration::from_millis(80));
    let snapshot = seek.snapshot();
    assert_eq!(snapshot.position, Some(42.0));
    assert_eq!(snapshot.duration, Some(100.0));
    assert!(seek.is_attached());

    seek.detach();
    assert_eq!(seek.snapshot(), ProgressSnapshot::default());
    assert!(!seek.is_attached());

    // No activity may reach the engine after detach has returned.
    let calls_at_detach = engine.call_count();
    thread::sleep(Duration::from_millis(250));
    assert_eq!(engine.call_count(), calls_at_detach);
}

#[test]
fn queued_wheel_input_is_flushed_as_a_single_seek() {
    let engine = FakeEngine::ready(Some(30.0), Some(100.0));
    let mut seek = SeekLoop::new();

    seek.attach(engine.clone());
    for _ in 0..5 {
        seek.queue_wheel(wheel_seconds(0.0, 40.0));
    }

    // Five notches of 2s land as one combined move to 40, however the
    // flush cycles happen to line up with the input.
    thread::sleep(Duration::from_millis(250));
    assert_eq!(engine.seeks().last(), Some(&40.0));
    assert!(seek.snapshot().position == Some(40.0));

    seek.detach();
}

#[test]
fn wheel_and_scrub_input_are_rejected_while_detached() {
    let seek = SeekLoop::new();
    seek.queue_wheel(5);
    seek.seek_to(10.0);

    // Nothing was buffered: a later attachment sees no stale input.
    let engine = FakeEngine::ready(Some(0.0), Some(100.0));
    let mut seek = seek;
    seek.attach(engine.clone());
    thread::sleep(Duration::from_millis(250));
    assert!(engine.seeks().is_empty());

    seek.detach();
}

#[test]
fn direct_scrub_bypasses_the_buffer() {
    let engine = FakeEngine::ready(Some(7.0), Some(100.0));
    let mut seek = SeekLoop::new();

    seek.attach(engine.clone());
    seek.seek_to(33.0);
    assert!(engine.seeks().contains(&33.0));

    seek.detach();
}

#[test]
fn repeating_task_ticks_until_cancelled() {
    let count = Arc::new(AtomicUsize::new(0));
    let count_for_task = count.clone();

    let task = RepeatingTask::spawn("test-tick", Duration::from_millis(10), move || {
        count_for_task.fetch_add(1, Ordering::SeqCst);
    });

    thread::sleep(Duration::from_millis(80));
    assert!(count.load(Ordering::SeqCst) >= 2);

    task.cancel();
    let after_cancel = count.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(80));
    assert_eq!(count.load(Ordering::SeqCst), after_cancel);
}
