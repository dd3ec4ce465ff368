//! Navigation commands over the queue store, the state machine and the
//! repeat policy.

use crate::library::{TrackRef, same_track};

use super::queue::QueueStore;
use super::state::PlaybackState;

/// First identity-match position of `track` in `queue`, or `None` when
/// absent.
pub fn current_index(track: &TrackRef, queue: &[TrackRef]) -> Option<usize> {
    queue.iter().position(|t| same_track(t, track))
}

/// The player core.
///
/// Owns the queue store and the state machine; `repeating` is the
/// externally-sourced repeat policy and only decides whether skips wrap
/// at the queue boundaries.
pub struct Player {
    store: QueueStore,
    state: PlaybackState,
    pub repeating: bool,
}

impl Player {
    pub fn new(repeating: bool) -> Self {
        Self {
            store: QueueStore::new(),
            state: PlaybackState::Stopped,
            repeating,
        }
    }

    pub fn queue(&self) -> &[TrackRef] {
        self.store.queue()
    }

    pub fn current_track(&self) -> Option<&TrackRef> {
        self.store.current()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Apply the play/pause toggle transition.
    pub fn toggle_playback(&mut self) {
        self.state = self.state.toggled();
    }

    /// Append to the end of the queue.
    pub fn add_to_queue(&mut self, track: TrackRef) {
        self.store.update_queue(|q| q.push(track));
    }

    /// Insert right after the current track, or at the head when the
    /// current track does not resolve to a queue position.
    pub fn add_to_up_next(&mut self, track: TrackRef) {
        let at = self
            .store
            .current()
            .and_then(|cur| current_index(cur, self.store.queue()))
            .map_or(0, |i| i + 1);
        self.store.update_queue(|q| q.insert(at, track));
    }

    /// Remove every queue entry that is identity-equal to `track`.
    pub fn remove_from_queue(&mut self, track: &TrackRef) {
        self.store.update_queue(|q| q.retain(|t| !same_track(t, track)));
    }

    /// Make `track` current and force `Playing`. Whether `track` is a
    /// queue member is the caller's responsibility.
    pub fn jump_to_track(&mut self, track: TrackRef) {
        self.store.set_current(Some(track));
        self.state = PlaybackState::Playing;
    }

    /// Replace the queue and start playing from `start`.
    ///
    /// An omitted `start` falls back to the first element of the new
    /// queue; an explicitly supplied non-member resolves to no track.
    /// The queue itself is always replaced, but the pointer and state
    /// only change when a start track resolves.
    pub fn start_new_queue(&mut self, tracks: Vec<TrackRef>, start: Option<TrackRef>) {
        let resolved = match start {
            Some(t) if current_index(&t, &tracks).is_some() => Some(t),
            Some(_) => None,
            None => tracks.first().cloned(),
        };

        self.store.set_queue(tracks);

        if let Some(track) = resolved {
            self.store.set_current(Some(track));
            self.state = PlaybackState::Playing;
        }
    }

    /// Move the pointer one track back.
    ///
    /// A current track without a queue position counts as the head.
    /// Stepping past the head wraps to the tail only when repeating;
    /// otherwise nothing changes. The state machine is never touched.
    pub fn skip_backward(&mut self) {
        let queue = self.store.queue();
        if queue.is_empty() {
            return;
        }

        let pos = self
            .store
            .current()
            .and_then(|cur| current_index(cur, queue))
            .unwrap_or(0);

        let prev = if pos == 0 {
            if !self.repeating {
                return;
            }
            queue.len() - 1
        } else {
            pos - 1
        };

        let track = queue[prev].clone();
        self.store.set_current(Some(track));
    }

    /// Move the pointer one track forward.
    ///
    /// A current track without a queue position resolves to the head.
    /// Stepping past the tail wraps to the head only when repeating;
    /// otherwise nothing changes. The state machine is never touched.
    pub fn skip_forward(&mut self) {
        let queue = self.store.queue();
        if queue.is_empty() {
            return;
        }

        let next = match self
            .store
            .current()
            .and_then(|cur| current_index(cur, queue))
        {
            None => 0,
            Some(pos) if pos + 1 >= queue.len() => {
                if !self.repeating {
                    return;
                }
                0
            }
            Some(pos) => pos + 1,
        };

        let track = queue[next].clone();
        self.store.set_current(Some(track));
    }

    /// Whether a backward skip would move: always under repeat, else
    /// only when the current track sits past the head.
    pub fn can_skip_backward(&self) -> bool {
        if self.repeating {
            return true;
        }

        self.store
            .current()
            .and_then(|cur| current_index(cur, self.store.queue()))
            .is_some_and(|i| i > 0)
    }

    /// Whether a forward skip would move: always under repeat, else
    /// only when the current track sits before the tail.
    pub fn can_skip_forward(&self) -> bool {
        if self.repeating {
            return true;
        }

        let queue = self.store.queue();
        self.store
            .current()
            .and_then(|cur| current_index(cur, queue))
            .is_some_and(|i| i + 1 < queue.len())
    }
}
