use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
    pub display: String,
}

/// Shared handle to a track.
///
/// Queues and the current-track pointer compare handles by identity,
/// never by field values: scanning the same file twice yields two
/// distinct tracks, and one handle may appear several times in a queue.
pub type TrackRef = Arc<Track>;

/// Identity comparison between track handles.
pub fn same_track(a: &TrackRef, b: &TrackRef) -> bool {
    Arc::ptr_eq(a, b)
}
