use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rodio::OutputStreamBuilder;

use crate::library::TrackRef;

use super::sink::open_sink_at;
use super::types::{AudioEngine, EngineState, LoadHandler, LoadToken};

enum EngineCmd {
    Play,
    Pause,
    SeekTo(f64),
    Quit,
}

/// Engine state shared between the playback thread and the trait
/// surface.
struct Shared {
    state: EngineState,
    duration: Option<f64>,
    /// Whether a sink exists to drive; false while loading and after a
    /// failed load.
    playable: bool,
    /// Elapsed time accumulated across pause and seek boundaries.
    accumulated: Duration,
    /// Set while the clock is advancing; `None` while paused.
    started_at: Option<Instant>,
    listeners: Vec<(u64, LoadHandler)>,
    next_token: u64,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: EngineState::Loading,
            duration: None,
            playable: false,
            accumulated: Duration::ZERO,
            started_at: None,
            listeners: Vec::new(),
            next_token: 0,
        }
    }

    fn position_secs(&self) -> Option<f64> {
        if !self.playable {
            return None;
        }
        let elapsed = self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed());
        Some(elapsed.as_secs_f64())
    }

    fn freeze_clock(&mut self) {
        if let Some(st) = self.started_at.take() {
            self.accumulated += st.elapsed();
        }
    }
}

/// One loaded track, played on its own thread in the background.
///
/// The thread decodes the file, resolves the duration, flips the state
/// to `Ready` and then serves play/pause/seek commands until quit.
/// Loading a different track means constructing a new engine.
pub struct RodioEngine {
    tx: Sender<EngineCmd>,
    shared: Arc<Mutex<Shared>>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl RodioEngine {
    /// Spawn the playback thread for `track`. Playback begins as soon
    /// as the sink is ready when `start_playing` is set, otherwise the
    /// engine waits, paused at position zero.
    pub fn load(track: TrackRef, start_playing: bool) -> Arc<Self> {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let shared = Arc::new(Mutex::new(Shared::new()));

        let shared_for_thread = shared.clone();
        let join = thread::spawn(move || {
            run_playback_thread(track, rx, shared_for_thread, start_playing);
        });

        Arc::new(Self {
            tx,
            shared,
            join: Mutex::new(Some(join)),
        })
    }

    pub fn play(&self) {
        let _ = self.tx.send(EngineCmd::Play);
    }

    pub fn pause(&self) {
        let _ = self.tx.send(EngineCmd::Pause);
    }
}

impl AudioEngine for RodioEngine {
    fn position(&self) -> Option<f64> {
        self.shared.lock().unwrap().position_secs()
    }

    fn seek_to(&self, secs: f64) {
        let _ = self.tx.send(EngineCmd::SeekTo(secs));
    }

    fn duration(&self) -> Option<f64> {
        self.shared.lock().unwrap().duration
    }

    fn state(&self) -> EngineState {
        self.shared.lock().unwrap().state
    }

    fn once_load(&self, handler: LoadHandler) -> LoadToken {
        let mut s = self.shared.lock().unwrap();
        let token = LoadToken(s.next_token);
        s.next_token += 1;

        if s.state == EngineState::Loading {
            s.listeners.push((token.0, handler));
        } else {
            // Already past loading: fire right away, outside the lock.
            drop(s);
            handler();
        }
        token
    }

    fn off_load(&self, token: LoadToken) {
        self.shared
            .lock()
            .unwrap()
            .listeners
            .retain(|(id, _)| *id != token.0);
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        let _ = self.tx.send(EngineCmd::Quit);
        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

/// Flip the shared state to `Ready` and return the listeners to fire.
/// Handlers must be invoked by the caller, outside the lock, so they
/// are free to call back into the engine.
fn finish_load(
    shared: &Arc<Mutex<Shared>>,
    duration: Option<f64>,
    playable: bool,
    playing: bool,
) -> Vec<(u64, LoadHandler)> {
    let mut s = shared.lock().unwrap();
    s.state = EngineState::Ready;
    s.duration = duration;
    s.playable = playable;
    s.accumulated = Duration::ZERO;
    s.started_at = if playable && playing {
        Some(Instant::now())
    } else {
        None
    };
    std::mem::take(&mut s.listeners)
}

fn run_playback_thread(
    track: TrackRef,
    rx: Receiver<EngineCmd>,
    shared: Arc<Mutex<Shared>>,
    start_playing: bool,
) {
    // A failed load still resolves to Ready: the position and duration
    // just stay unknown and every command becomes a no-op.
    let Ok(stream) = OutputStreamBuilder::open_default_stream() else {
        for (_, f) in finish_load(&shared, None, false, false) {
            f();
        }
        return;
    };
    // rodio logs to stderr when OutputStream is dropped. That's useful in
    // debugging, but noisy for a TUI app.
    let mut stream = stream;
    stream.log_on_drop(false);

    let (mut sink, decoded_total) = match open_sink_at(&stream, &track, Duration::ZERO) {
        Ok(v) => v,
        Err(_) => {
            for (_, f) in finish_load(&shared, None, false, false) {
                f();
            }
            return;
        }
    };

    // Tag metadata first, decoder estimate as the fallback.
    let duration = track.duration.or(decoded_total).map(|d| d.as_secs_f64());

    let mut paused = !start_playing;
    if start_playing {
        sink.play();
    }

    for (_, f) in finish_load(&shared, duration, true, start_playing) {
        f();
    }

    loop {
        match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(EngineCmd::Play) => {
                if paused {
                    sink.play();
                    paused = false;
                    if let Ok(mut s) = shared.lock() {
                        s.started_at = Some(Instant::now());
                    }
                }
            }
            Ok(EngineCmd::Pause) => {
                if !paused {
                    sink.pause();
                    paused = true;
                    if let Ok(mut s) = shared.lock() {
                        s.freeze_clock();
                    }
                }
            }
            Ok(EngineCmd::SeekTo(secs)) => {
                let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
                let at = Duration::from_secs_f64(secs);

                // Scrubbing rebuilds the sink and skips into the file;
                // `skip_duration` works for the common formats.
                sink.stop();
                match open_sink_at(&stream, &track, at) {
                    Ok((new_sink, _)) => {
                        if !paused {
                            new_sink.play();
                        }
                        sink = new_sink;
                        if let Ok(mut s) = shared.lock() {
                            s.accumulated = at;
                            s.started_at = if paused { None } else { Some(Instant::now()) };
                        }
                    }
                    Err(_) => {
                        if let Ok(mut s) = shared.lock() {
                            s.playable = false;
                            s.started_at = None;
                        }
                        break;
                    }
                }
            }
            Ok(EngineCmd::Quit) => {
                sink.stop();
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                // Track ran out: stop the clock where it ended.
                if !paused && sink.empty() {
                    paused = true;
                    if let Ok(mut s) = shared.lock() {
                        s.freeze_clock();
                    }
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
