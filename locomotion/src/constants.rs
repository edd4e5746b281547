/*!
Ground-probe defaults and tolerances.

These constants centralize the parameters used by the shape-cast primitive, the
ground probe and the reference kinematic integrator. Keeping them together makes
tuning easier.

Notes
- Distances are in meters, time in seconds.
- Favor practical world-space tolerances over machine epsilon for robust behavior.
- Per-body customization goes through `ControllerConfig`; these are its defaults.
*/

/// How far below the capsule to search for ground (meters).
/// Small values keep the controller from snapping through gaps.
pub const DEFAULT_GROUND_DISTANCE: f32 = 0.05;

/// Vertical clearance probed when stepping over obstacles (meters).
pub const DEFAULT_STEP_HEIGHT: f32 = 0.3;

/// Skin distance added to every cast and subtracted from every hit (meters).
/// Must stay strictly below the ground distance.
pub const DEFAULT_CAST_MARGIN: f32 = 0.01;

/// Minimum cosine between a surface normal and "up" for the surface to count as ground.
/// 0.5 accepts slopes up to 60 degrees.
pub const DEFAULT_GROUND_DOT: f32 = 0.5;

/// Gravity magnitude in meters per second squared (positive value).
pub const GRAVITY_MPS2: f32 = 9.81;

/// Separation kept from surfaces by the kinematic integrator (meters).
pub const DEFAULT_SKIN: f32 = 0.005;

/// Maximum number of slide iterations per kinematic step.
/// Higher values help with tight corners at the cost of more queries.
pub const DEFAULT_MAX_ITERATIONS: u32 = 4;

/// Minimum squared movement threshold to consider a step meaningful (m^2).
/// Movements below this are treated as zero to avoid tiny oscillations.
pub const MIN_MOVE_SQ: f32 = 1.0e-8;

/// Practical small length for normalization guards (meters).
pub const DIST_EPS: f32 = 1.0e-6;
