//! Playback state machine.

/// The playback state of the player.
///
/// `Stopped` is the idle state: no active track and no meaningful
/// playback position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::Stopped
    }
}

impl PlaybackState {
    /// The play/pause toggle transition, total over all three states:
    /// `Paused -> Playing`, `Playing -> Paused`, and `Stopped` stays
    /// `Stopped` (there is nothing to toggle without an active track).
    pub fn toggled(self) -> Self {
        match self {
            Self::Paused => Self::Playing,
            Self::Playing => Self::Paused,
            Self::Stopped => Self::Stopped,
        }
    }
}
