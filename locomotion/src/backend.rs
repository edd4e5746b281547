//! Physics backend abstraction.
//!
//! The ground probe never talks to a physics engine directly. It needs two things
//! from the outside world, expressed as the traits below:
//!
//! - [`CollisionWorld`]: capsule sweeps and rays against the collision geometry, plus
//!   sampling of the point velocity of a moving body that a surface belongs to.
//! - [`BodyControl`]: read and correct the controlled rigid body.
//!
//! [`RapierQueryWorld`](crate::rapier_world::RapierQueryWorld) implements the first on
//! top of Rapier, [`KinematicBody`](crate::kinematic::KinematicBody) the second.

use crate::{
    layers::LayerMask,
    types::{BodySnapshot, CapsuleSweep, Point3, Quat, SurfaceHit, UnitVec3, Vec3},
};

/// Read-only scene queries against the collision world.
pub trait CollisionWorld {
    /// Handle of a body that can carry the character (a moving platform, a ship deck).
    type Body: Copy + PartialEq + std::fmt::Debug;

    /// Sweep a capsule and return the nearest surface it would touch.
    ///
    /// The reported `distance` is measured along `sweep.direction` from the start pose.
    /// A capsule that already overlaps geometry reports a hit at distance `0`.
    fn sweep_capsule(&self, sweep: &CapsuleSweep, mask: LayerMask)
    -> Option<SurfaceHit<Self::Body>>;

    /// Cast a ray and return the nearest surface it hits.
    fn raycast(
        &self,
        origin: Point3,
        direction: UnitVec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<SurfaceHit<Self::Body>>;

    /// Velocity of `body` at a world-space point, including its rotation.
    fn point_velocity(&self, body: Self::Body, point: &Point3) -> Vec3;
}

/// The integrator side of the controlled rigid body.
pub trait BodyControl {
    fn position(&self) -> Point3;

    fn rotation(&self) -> Quat;

    fn velocity(&self) -> Vec3;

    /// Replace the linear velocity instantly.
    fn set_velocity(&mut self, velocity: Vec3);

    /// Kinematic position correction. Must not change the velocity.
    fn move_position_by(&mut self, delta: Vec3);

    /// Everything the ground probe reads, captured in one go.
    fn snapshot(&self) -> BodySnapshot {
        BodySnapshot::new(self.position(), self.rotation(), self.velocity())
    }
}
