//! Encoding sinks.
//!
//! Sinks consume assembled frames in increasing index order.

/// `ffmpeg`-based MP4 output via the system binary.
pub mod ffmpeg;
/// PNG frame sequences.
pub mod png;
/// Sink trait and the in-memory sink.
pub mod sink;
/// Fan-out to two sinks.
pub mod tee;
