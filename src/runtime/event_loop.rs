use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};

use crate::config;
use crate::engine::RodioEngine;
use crate::library::{TrackRef, same_track};
use crate::player::{PlaybackState, Player};
use crate::seek::{SeekLoop, wheel_seconds};
use crate::ui::{self, Pane, ViewModel};

use super::bindings::apply_core_binding;

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Which pane has the cursor.
    pub pane: Pane,
    pub library_selected: usize,
    pub queue_selected: usize,
    /// Identity of the track the engine currently has loaded.
    loaded: Option<TrackRef>,
    engine: Option<Arc<RodioEngine>>,
    /// Playback intent last forwarded to the engine.
    applied: PlaybackState,
    /// Screen area of the seek gauge from the last draw, for mouse
    /// hit-testing.
    seek_area: Rect,
}

impl EventLoopState {
    pub fn new() -> Self {
        Self {
            pane: Pane::Library,
            library_selected: 0,
            queue_selected: 0,
            loaded: None,
            engine: None,
            applied: PlaybackState::Stopped,
            seek_area: Rect::default(),
        }
    }
}

/// Main terminal event loop: reconciles the engine with the control
/// core, draws the UI and dispatches key and mouse input. Returns
/// `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    library: &[TrackRef],
    player: &mut Player,
    seek: &mut SeekLoop,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        reconcile_engine(player, seek, state);
        clamp_selection(player, library, state);

        let view = ViewModel {
            header: settings.ui.header_text.as_str(),
            library,
            queue: player.queue(),
            current: player.current_track(),
            state: player.state(),
            repeating: player.repeating,
            can_skip_backward: player.can_skip_backward(),
            can_skip_forward: player.can_skip_forward(),
            progress: seek.snapshot(),
            seek_enabled: seek.is_attached(),
            pane: state.pane,
            library_selected: state.library_selected,
            queue_selected: state.queue_selected,
        };
        let mut seek_area = state.seek_area;
        terminal.draw(|f| {
            seek_area = ui::draw(f, &view);
        })?;
        state.seek_area = seek_area;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if apply_core_binding(&key, player) {
                        continue;
                    }
                    if handle_chrome_key(key, library, player, state) {
                        break;
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse_event(mouse, settings, seek, state);
                }
                _ => {}
            }
        }
    }

    // Shutdown order matters: stop the seek activities before the
    // engine handle they captured goes away.
    seek.detach();
    state.engine = None;
    Ok(())
}

/// Keep the engine in step with the control core.
///
/// A changed current-track identity swaps in a fresh engine and
/// re-attaches the seek loop to the new handle; a changed play/pause
/// intent is forwarded to the engine already loaded.
fn reconcile_engine(player: &Player, seek: &mut SeekLoop, state: &mut EventLoopState) {
    let current = player.current_track().cloned();

    let track_changed = match (&state.loaded, &current) {
        (None, None) => false,
        (Some(a), Some(b)) => !same_track(a, b),
        _ => true,
    };

    if track_changed {
        seek.detach();
        state.engine = None;

        if let Some(track) = current.clone() {
            let engine = RodioEngine::load(track, player.state() == PlaybackState::Playing);
            seek.attach(engine.clone());
            state.engine = Some(engine);
        }

        state.loaded = current;
        state.applied = player.state();
        return;
    }

    if player.state() != state.applied {
        if let Some(engine) = &state.engine {
            match player.state() {
                PlaybackState::Playing => engine.play(),
                PlaybackState::Paused => engine.pause(),
                PlaybackState::Stopped => {}
            }
        }
        state.applied = player.state();
    }
}

fn clamp_selection(player: &Player, library: &[TrackRef], state: &mut EventLoopState) {
    if state.library_selected >= library.len() {
        state.library_selected = library.len().saturating_sub(1);
    }
    if state.queue_selected >= player.queue().len() {
        state.queue_selected = player.queue().len().saturating_sub(1);
    }
}

/// Shell-level keys outside the three core bindings. Returns `true`
/// when shutdown was requested.
fn handle_chrome_key(
    key: KeyEvent,
    library: &[TrackRef],
    player: &mut Player,
    state: &mut EventLoopState,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab => {
            state.pane = match state.pane {
                Pane::Library => Pane::Queue,
                Pane::Queue => Pane::Library,
            };
        }
        KeyCode::Char('j') | KeyCode::Down => move_selection(player, library, state, 1),
        KeyCode::Char('k') | KeyCode::Up => move_selection(player, library, state, -1),
        KeyCode::Enter => match state.pane {
            Pane::Library => {
                if let Some(track) = library.get(state.library_selected) {
                    player.start_new_queue(library.to_vec(), Some(track.clone()));
                }
            }
            Pane::Queue => {
                if let Some(track) = player.queue().get(state.queue_selected).cloned() {
                    player.jump_to_track(track);
                }
            }
        },
        KeyCode::Char('a') => {
            if state.pane == Pane::Library {
                if let Some(track) = library.get(state.library_selected) {
                    player.add_to_queue(track.clone());
                }
            }
        }
        KeyCode::Char('u') => {
            if state.pane == Pane::Library {
                if let Some(track) = library.get(state.library_selected) {
                    player.add_to_up_next(track.clone());
                }
            }
        }
        KeyCode::Char('x') => {
            if state.pane == Pane::Queue {
                if let Some(track) = player.queue().get(state.queue_selected).cloned() {
                    player.remove_from_queue(&track);
                }
            }
        }
        KeyCode::Char('r') => {
            player.repeating = !player.repeating;
        }
        _ => {}
    }

    false
}

fn move_selection(player: &Player, library: &[TrackRef], state: &mut EventLoopState, delta: i64) {
    let (len, selected) = match state.pane {
        Pane::Library => (library.len(), &mut state.library_selected),
        Pane::Queue => (player.queue().len(), &mut state.queue_selected),
    };
    if len == 0 {
        return;
    }
    *selected = (*selected as i64 + delta).rem_euclid(len as i64) as usize;
}

/// Mouse input over the seek gauge: wheel notches queue buffered
/// seconds for the flush cycle, a left click scrubs straight to the
/// clicked fraction of the track.
fn handle_mouse_event(
    mouse: MouseEvent,
    settings: &config::Settings,
    seek: &SeekLoop,
    state: &EventLoopState,
) {
    let over_seek = hit_test(state.seek_area, mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollDown | MouseEventKind::ScrollRight if over_seek => {
            seek.queue_wheel(wheel_seconds(0.0, settings.controls.wheel_notch_units));
        }
        MouseEventKind::ScrollUp | MouseEventKind::ScrollLeft if over_seek => {
            seek.queue_wheel(wheel_seconds(0.0, -settings.controls.wheel_notch_units));
        }
        MouseEventKind::Down(MouseButton::Left) if over_seek => {
            if let Some(duration) = seek.snapshot().duration {
                // Exclude the border columns from the clickable span.
                let area = state.seek_area;
                let inner_x = area.x.saturating_add(1);
                let inner_w = area.width.saturating_sub(2).max(1);
                let offset = mouse.column.saturating_sub(inner_x).min(inner_w - 1);
                let fraction = f64::from(offset) / f64::from(inner_w);
                seek.seek_to(fraction * duration);
            }
        }
        _ => {}
    }
}

fn hit_test(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}
