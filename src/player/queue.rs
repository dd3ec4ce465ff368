//! Track queue store: the ordered playback list plus the current-track
//! pointer.

use crate::library::TrackRef;

/// Plain state container for the playback list and the current-track
/// pointer.
///
/// Replacing the queue never fixes up the pointer, so the current track
/// may transiently reference a track that is no longer a member; the
/// commands layer reconciles where it matters. No ordering or
/// uniqueness is enforced, and one handle may appear more than once.
#[derive(Default)]
pub struct QueueStore {
    queue: Vec<TrackRef>,
    current: Option<TrackRef>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self) -> &[TrackRef] {
        &self.queue
    }

    pub fn current(&self) -> Option<&TrackRef> {
        self.current.as_ref()
    }

    /// Replace the whole queue, leaving the current pointer as-is.
    pub fn set_queue(&mut self, queue: Vec<TrackRef>) {
        self.queue = queue;
    }

    pub fn set_current(&mut self, track: Option<TrackRef>) {
        self.current = track;
    }

    /// Mutate the queue in place.
    pub fn update_queue(&mut self, f: impl FnOnce(&mut Vec<TrackRef>)) {
        f(&mut self.queue);
    }
}
