//! The engine capability surface and its small types.
//!
//! The control core talks to an engine exclusively through
//! [`AudioEngine`]; decoding, buffering and output are the engine's own
//! business behind it.

use std::sync::Arc;

/// Load state reported by an engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineState {
    /// The backing media is still being opened; position and duration
    /// are not yet meaningful.
    Loading,
    /// Loading finished (successfully or not); duration is as known as
    /// it will ever be.
    Ready,
}

/// Token for a pending load subscription; pass it back to
/// [`AudioEngine::off_load`] to drop the subscription before it fires.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LoadToken(pub(crate) u64);

/// One-shot load-completion handler.
pub type LoadHandler = Box<dyn FnOnce() + Send>;

pub trait AudioEngine: Send + Sync {
    /// Current playback position in seconds, or `None` while unknown.
    fn position(&self) -> Option<f64>;

    /// Command an absolute seek.
    fn seek_to(&self, secs: f64);

    /// Total duration in seconds, or `None` while unknown.
    fn duration(&self) -> Option<f64>;

    fn state(&self) -> EngineState;

    /// Subscribe a one-shot handler for load completion. An engine that
    /// is already past loading fires the handler immediately.
    fn once_load(&self, handler: LoadHandler) -> LoadToken;

    /// Drop a pending load subscription. Harmless after the handler
    /// has already fired.
    fn off_load(&self, token: LoadToken);
}

/// Shared handle to one attached engine.
pub type EngineHandle = Arc<dyn AudioEngine>;
