//! UI rendering helpers for the terminal user interface.
//!
//! Everything here is presentational glue over the control core's
//! derived values; the interesting state lives in `player` and `seek`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph},
};

use crate::library::{TrackRef, same_track};
use crate::player::PlaybackState;
use crate::seek::ProgressSnapshot;

/// Which pane currently has the cursor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Pane {
    Library,
    Queue,
}

/// Everything the renderer needs for one frame.
pub struct ViewModel<'a> {
    pub header: &'a str,
    pub library: &'a [TrackRef],
    pub queue: &'a [TrackRef],
    pub current: Option<&'a TrackRef>,
    pub state: PlaybackState,
    pub repeating: bool,
    pub can_skip_backward: bool,
    pub can_skip_forward: bool,
    pub progress: ProgressSnapshot,
    pub seek_enabled: bool,
    pub pane: Pane,
    pub library_selected: usize,
    pub queue_selected: usize,
}

const CONTROLS_TEXT: &str = "[j/k] up/down | [tab] pane | [enter] play | [a] queue | [u] up next \
     | [x] remove | [space] play/pause | [left/right] prev/next | [r] repeat | [q] quit";

/// Format whole seconds as `MM:SS`.
fn format_mmss(secs: f64) -> String {
    let secs = secs.max(0.0) as u64;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Build the `elapsed / total` gauge label; unknown values render as a
/// placeholder.
fn seek_label(progress: ProgressSnapshot) -> String {
    let elapsed = progress.position.map_or("--:--".to_string(), format_mmss);
    let total = progress.duration.map_or("--:--".to_string(), format_mmss);
    format!("{} / {}", elapsed, total)
}

/// Gauge fill as a 0..=1 ratio. Without both values the bar collapses
/// to its empty, degenerate range.
fn seek_ratio(progress: ProgressSnapshot) -> f64 {
    match (progress.position, progress.duration) {
        (Some(pos), Some(dur)) if dur > 0.0 => (pos / dur).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

fn play_marker(view: &ViewModel, track: &TrackRef) -> &'static str {
    let is_current = view.current.is_some_and(|cur| same_track(cur, track));
    if !is_current {
        return "  ";
    }
    match view.state {
        PlaybackState::Playing => "> ",
        PlaybackState::Paused => "|| ",
        PlaybackState::Stopped => "  ",
    }
}

fn render_track_pane(
    frame: &mut Frame,
    area: Rect,
    view: &ViewModel,
    tracks: &[TrackRef],
    title: &str,
    active: bool,
    selected: usize,
) {
    let items: Vec<ListItem> = tracks
        .iter()
        .map(|t| ListItem::new(format!("{}{}", play_marker(view, t), t.display)))
        .collect();

    let border_style = if active {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title.to_string()),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if active && !tracks.is_empty() {
        state.select(Some(selected.min(tracks.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

/// Render the entire UI. Returns the seek gauge's screen area so the
/// event loop can hit-test wheel and click input against it.
pub fn draw(frame: &mut Frame, view: &ViewModel) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(view.header)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" adagio ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Library | queue panes
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_track_pane(
        frame,
        panes[0],
        view,
        view.library,
        " library ",
        view.pane == Pane::Library,
        view.library_selected,
    );
    render_track_pane(
        frame,
        panes[1],
        view,
        view.queue,
        " queue ",
        view.pane == Pane::Queue,
        view.queue_selected,
    );

    // Seek gauge
    let seek_title = {
        let mut parts: Vec<String> = Vec::new();
        if let Some(track) = view.current {
            parts.push(track.display.clone());
        }
        let state_text = match view.state {
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
            PlaybackState::Stopped => "Stopped",
        };
        let back = if view.can_skip_backward { "<<" } else { "--" };
        let forward = if view.can_skip_forward { ">>" } else { "--" };
        parts.push(format!("{} {} {}", back, state_text, forward));
        if view.repeating {
            parts.push("Repeat: ON".to_string());
        }
        if !view.seek_enabled {
            parts.push("no engine".to_string());
        }
        format!(" {} ", parts.join(" | "))
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(seek_title))
        .ratio(seek_ratio(view.progress))
        .label(seek_label(view.progress));
    frame.render_widget(gauge, chunks[2]);

    // Footer
    let footer = Paragraph::new(CONTROLS_TEXT).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" controls ")
            .padding(Padding {
                left: 1,
                right: 0,
                top: 0,
                bottom: 0,
            }),
    );
    frame.render_widget(footer, chunks[3]);

    chunks[2]
}
