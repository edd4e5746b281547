//! Velocity decomposition relative to the ground.
//!
//! A [`VelocityFrame`] splits a world velocity into a part along the ground and a part
//! along the ground axis, both measured relative to the carrier body under the feet.
//! Movement code sets the two parts independently: walking writes the tangential part,
//! jumping writes the normal part.

use crate::{
    config::ProjectionMode,
    types::{UnitVec3, Vec3},
};

/// Ground axis and carrier motion for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityFrame {
    /// Axis the velocity is split against: the contact normal, or "up".
    pub axis: UnitVec3,
    /// Velocity of the carrier at the contact point (zero without a carrier).
    pub carrier_velocity: Vec3,
}

impl VelocityFrame {
    #[inline]
    pub fn new(axis: UnitVec3, carrier_velocity: Vec3) -> Self {
        Self {
            axis,
            carrier_velocity,
        }
    }

    /// Pick the split axis for `mode`.
    #[inline]
    pub fn for_mode(
        mode: ProjectionMode,
        normal: UnitVec3,
        up: UnitVec3,
        carrier_velocity: Vec3,
    ) -> Self {
        let axis = match mode {
            ProjectionMode::GroundNormal => normal,
            ProjectionMode::WorldHorizontal => up,
        };
        Self::new(axis, carrier_velocity)
    }

    /// Component of `v` in the plane perpendicular to the axis.
    #[inline]
    pub fn ground_project(&self, v: &Vec3) -> Vec3 {
        v - self.normal_project(v)
    }

    /// Component of `v` along the axis.
    #[inline]
    pub fn normal_project(&self, v: &Vec3) -> Vec3 {
        self.axis.into_inner() * self.axis.dot(v)
    }

    /// Body velocity along the ground, relative to the carrier.
    #[inline]
    pub fn tangential(&self, velocity: &Vec3) -> Vec3 {
        self.ground_project(velocity) - self.ground_project(&self.carrier_velocity)
    }

    /// `velocity` with its tangential part replaced so that [`Self::tangential`] returns
    /// `target`. The normal part is untouched.
    #[inline]
    pub fn with_tangential(&self, velocity: &Vec3, target: &Vec3) -> Vec3 {
        let target = self.ground_project(target);
        self.normal_project(velocity) + target + self.ground_project(&self.carrier_velocity)
    }

    /// Body velocity along the axis, relative to the carrier.
    #[inline]
    pub fn normal(&self, velocity: &Vec3) -> Vec3 {
        self.normal_project(velocity) - self.normal_project(&self.carrier_velocity)
    }

    /// `velocity` with its normal part replaced so that [`Self::normal`] returns `target`.
    /// The tangential part is untouched.
    #[inline]
    pub fn with_normal(&self, velocity: &Vec3, target: &Vec3) -> Vec3 {
        let target = self.normal_project(target);
        target + self.normal_project(&self.carrier_velocity) + self.ground_project(velocity)
    }

    /// Velocity a grounded body keeps: its own tangential motion plus whatever the
    /// carrier does along the axis.
    #[inline]
    pub fn grounded(&self, velocity: &Vec3) -> Vec3 {
        self.ground_project(velocity) + self.normal_project(&self.carrier_velocity)
    }
}

/// Launch speed that reaches `height` against gravity of magnitude `gravity`.
#[inline]
pub fn jump_speed(height: f32, gravity: f32) -> f32 {
    (2.0 * height.max(0.0) * gravity.max(0.0)).sqrt()
}
