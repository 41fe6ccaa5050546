//! Point-cloud rasterization into output frames.

/// Compositing policies.
pub mod blend;
/// Rendered frame buffers.
pub mod frame;
/// The point splatting rasterizer.
pub mod rasterize;
