//! Seek reconciliation: merges continuous position polling from the
//! audio engine with buffered scroll-wheel input, and exposes progress
//! to the display.

mod buffer;
mod monitor;
mod task;

pub use buffer::*;
pub use monitor::*;
pub use task::*;

#[cfg(test)]
mod tests;
