/*!
Core data types and math aliases shared by the locomotion modules.

This module intentionally contains no algorithms. It defines the data exchanged
between:
- the collision backend (capsule sweeps and rays against the world)
- the shape-cast primitive (chained sweeps)
- the ground probe (classification of this tick's contact)
- the velocity frame (decomposition relative to the ground)
*/

use nalgebra as na;
use serde::{Deserialize, Serialize};

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Point3 = na::Point3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;
pub type UnitVec3 = na::Unit<na::Vector3<f32>>;

/// Capsule collider owned by the controlled body.
///
/// `half_height` is the half-length of the cylinder section along the local `+Y` axis,
/// so the total capsule height is `2 * half_height + 2 * radius`. `center` offsets the
/// capsule from the body origin in local space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapsuleShape {
    pub center: Vec3,
    pub half_height: f32,
    pub radius: f32,
}

impl CapsuleShape {
    #[inline]
    pub fn new(half_height: f32, radius: f32) -> Self {
        Self {
            center: Vec3::zeros(),
            half_height,
            radius,
        }
    }

    #[inline]
    pub fn with_center(mut self, center: Vec3) -> Self {
        self.center = center;
        self
    }

    /// Total height from the bottom of the lower cap to the top of the upper cap.
    #[inline]
    pub fn total_height(&self) -> f32 {
        2.0 * (self.half_height + self.radius)
    }

    /// World-space centers of the bottom and top spherical caps.
    ///
    /// These are the segment endpoints used as sweep start points.
    #[inline]
    pub fn endpoints(&self, position: &Point3, rotation: &Quat) -> (Point3, Point3) {
        let axis = Vec3::y() * self.half_height;
        let bottom = position + rotation * (self.center - axis);
        let top = position + rotation * (self.center + axis);
        (bottom, top)
    }
}

/// A capsule sweep request handed to the collision backend.
#[derive(Clone, Copy, Debug)]
pub struct CapsuleSweep {
    /// World-space center of the bottom cap at the start of the sweep.
    pub a: Point3,
    /// World-space center of the top cap at the start of the sweep.
    pub b: Point3,
    pub radius: f32,
    pub direction: UnitVec3,
    pub max_distance: f32,
}

/// Nearest surface found by a sweep or a ray.
///
/// `B` is the backend's handle for a body that can move (a carrier). Static geometry
/// reports `body: None`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceHit<B> {
    /// World-space contact point on the surface.
    pub point: Point3,
    /// Outward unit normal of the surface at `point`.
    pub normal: UnitVec3,
    /// Distance travelled along the query direction before contact.
    pub distance: f32,
    /// Moving body the surface is attached to, if any.
    pub body: Option<B>,
}

/// Body state read once at the start of ground evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodySnapshot {
    pub position: Point3,
    pub rotation: Quat,
    pub velocity: Vec3,
}

impl BodySnapshot {
    #[inline]
    pub fn new(position: Point3, rotation: Quat, velocity: Vec3) -> Self {
        Self {
            position,
            rotation,
            velocity,
        }
    }

    #[inline]
    pub fn at_rest(position: Point3) -> Self {
        Self::new(position, Quat::identity(), Vec3::zeros())
    }
}
