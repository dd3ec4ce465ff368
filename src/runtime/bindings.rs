//! Core keyboard bindings: the three player-control keys.

use crossterm::event::{KeyCode, KeyEvent};

use crate::player::Player;

/// Apply one of the core control keys to `player`.
///
/// Returns `true` when the key was consumed: space toggles play/pause
/// (a no-op while stopped), the arrow keys skip one track with
/// repeat-aware wrapping. Every other key is left to the shell chrome.
pub fn apply_core_binding(key: &KeyEvent, player: &mut Player) -> bool {
    match key.code {
        KeyCode::Char(' ') => {
            player.toggle_playback();
            true
        }
        KeyCode::Right => {
            player.skip_forward();
            true
        }
        KeyCode::Left => {
            player.skip_backward();
            true
        }
        _ => false,
    }
}
