//! Per-photo orchestration.
//!
//! Collaborators run once to produce the layered scene and its flow; the result is frozen in a
//! [`context::StaticScene`] that every frame reads. [`frame::render_frame`] is a pure function
//! of that context and a frame index, and [`video::render_video`] drives it over a camera path
//! into a [`crate::encode::sink::FrameSink`].

pub mod collaborators;
pub mod context;
pub mod flo;
pub mod frame;
pub mod photo;
pub mod video;
