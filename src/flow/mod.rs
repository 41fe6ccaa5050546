//! Scene motion: the flow field, its time integration, and the warp of the point cloud.

/// Dense velocity field.
pub mod field;
/// Euler integration over discrete steps.
pub mod integrate;
/// Binary morphology on validity masks.
pub mod morph;
/// Point-cloud warping per integration pass.
pub mod warp;
