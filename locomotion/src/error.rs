//! Configuration errors.
//!
//! Only construction can fail. Missing ground, missing steps and unusable step
//! normals are ordinary per-tick outcomes and never surface here.

use thiserror::Error;

/// Reasons a [`ControllerConfig`](crate::config::ControllerConfig) is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("cast margin must be positive, got {0}")]
    NonPositiveMargin(f32),

    #[error("cast margin {margin} must be smaller than the ground distance {ground_distance}")]
    MarginNotBelowGroundDistance { margin: f32, ground_distance: f32 },

    #[error("ground dot threshold must lie in [0, 1], got {0}")]
    GroundDotOutOfRange(f32),

    #[error("step height must be positive when set, got {0}")]
    NonPositiveStepHeight(f32),

    #[error("capsule needs a positive radius and a non-negative half height (radius {radius}, half height {half_height})")]
    DegenerateCapsule { radius: f32, half_height: f32 },

    #[error("gravity must have a non-zero, finite magnitude")]
    ZeroGravity,
}
