//! Layered scene representation and its lift to a 3D point cloud.

/// Point-cloud construction.
pub mod builder;
/// Depth map preparation.
pub mod depth;
/// Layers of a decomposed photo.
pub mod layers;
/// Static and flowed point sets.
pub mod points;
