use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::{Track, TrackRef};

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

struct TagInfo {
    title: String,
    artist: Option<String>,
    album: Option<String>,
    duration: Option<Duration>,
}

/// Read tag metadata for an audio file; unreadable tags fall back to
/// the file stem as the title.
fn read_tags(path: &Path) -> TagInfo {
    let mut info = TagInfo {
        title: path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string(),
        artist: None,
        album: None,
        duration: None,
    };

    if let Ok(tagged) = lofty::read_from_path(path) {
        info.duration = Some(tagged.properties().duration());

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            if let Some(v) = tag.title() {
                if !v.trim().is_empty() {
                    info.title = v.to_string();
                }
            }
            info.artist = tag
                .artist()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
            info.album = tag
                .album()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
        }
    }

    info
}

fn make_display(title: &str, artist: Option<&str>) -> String {
    match artist {
        Some(a) if !a.trim().is_empty() => format!("{} - {}", a.trim(), title),
        _ => title.to_string(),
    }
}

pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<TrackRef> {
    let mut tracks: Vec<TrackRef> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.is_file()
            && (settings.include_hidden || !is_hidden(path))
            && is_audio_file(path, settings)
        {
            let tags = read_tags(path);
            let display = make_display(&tags.title, tags.artist.as_deref());

            tracks.push(Arc::new(Track {
                path: path.to_path_buf(),
                title: tags.title,
                artist: tags.artist,
                album: tags.album,
                duration: tags.duration,
                display,
            }));
        }
    }

    tracks.sort_by(|a, b| a.display.to_lowercase().cmp(&b.display.to_lowercase()));
    tracks
}
