//! Decode helper: build a paused `rodio` sink positioned inside a
//! track.

use std::fs::File;
use std::io::BufReader;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use crate::library::Track;

/// Open and decode `track`, returning a paused sink positioned at
/// `start_at` together with the decoder's own duration estimate.
pub(super) fn open_sink_at(
    handle: &OutputStream,
    track: &Track,
    start_at: Duration,
) -> std::io::Result<(Sink, Option<Duration>)> {
    let file = File::open(&track.path)?;

    let source = Decoder::new(BufReader::new(file)).map_err(std::io::Error::other)?;
    let total = source.total_duration();

    let sink = Sink::connect_new(handle.mixer());
    // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
    sink.append(source.skip_duration(start_at));
    sink.pause();
    Ok((sink, total))
}
