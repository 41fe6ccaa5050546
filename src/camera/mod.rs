//! Camera model and trajectories.

/// Easing curves.
pub mod ease;
/// Pinhole intrinsics.
pub mod intrinsics;
/// Named camera trajectories.
pub mod path;
/// Rigid transforms.
pub mod pose;
