use log::trace;

use crate::{
    backend::{BodyControl, CollisionWorld},
    constants::{DEFAULT_MAX_ITERATIONS, DEFAULT_SKIN, MIN_MOVE_SQ},
    layers::LayerMask,
    types::{CapsuleShape, CapsuleSweep, Point3, Quat, UnitVec3, Vec3},
};

/// Minimal rigid body integrator for a capsule.
///
/// Stands in for a physics solver: position is advanced by `velocity * dt` with a
/// sweep-and-slide against the collision world, so the body never tunnels into
/// geometry. Position corrections from the controller go through
/// [`BodyControl::move_position_by`] untouched.
#[derive(Clone, Copy, Debug)]
pub struct KinematicBody {
    pub position: Point3,
    pub rotation: Quat,
    pub velocity: Vec3,
    pub capsule: CapsuleShape,
    /// Separation kept from surfaces after a blocked move (meters).
    pub skin: f32,
    /// Max slide iterations per step (for corners).
    pub max_iterations: u32,
}

/// Outcome of one [`KinematicBody::integrate`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IntegrateResult {
    /// Number of surfaces hit while sliding.
    pub hits: u32,
    /// Motion left over when the iteration budget ran out.
    pub remaining: Vec3,
}

impl KinematicBody {
    pub fn new(position: Point3, capsule: CapsuleShape) -> Self {
        Self {
            position,
            rotation: Quat::identity(),
            velocity: Vec3::zeros(),
            capsule,
            skin: DEFAULT_SKIN,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Advance by `velocity * dt`, sliding along whatever blocks the way.
    ///
    /// Algorithm:
    /// - Sweep the capsule along the remaining motion.
    /// - On hit, move to just before the contact (minus `skin`), drop the part of the
    ///   leftover motion and of the velocity that points into the surface.
    /// - Iterate to handle corners until `max_iterations` or the remaining motion is
    ///   negligible.
    pub fn integrate<W: CollisionWorld>(
        &mut self,
        world: &W,
        mask: LayerMask,
        dt: f32,
    ) -> IntegrateResult {
        let mut remaining = self.velocity * dt.max(0.0);
        let mut hits = 0;

        for _ in 0..self.max_iterations {
            if remaining.norm_squared() <= MIN_MOVE_SQ {
                remaining = Vec3::zeros();
                break;
            }

            let len = remaining.norm();
            let dir = UnitVec3::new_unchecked(remaining / len);
            let (a, b) = self.capsule.endpoints(&self.position, &self.rotation);
            let sweep = CapsuleSweep {
                a,
                b,
                radius: self.capsule.radius,
                direction: dir,
                max_distance: len,
            };

            let Some(hit) = world.sweep_capsule(&sweep, mask) else {
                self.position += remaining;
                remaining = Vec3::zeros();
                break;
            };
            let n = hit.normal.into_inner();
            // Already touching and moving away: nothing blocks this direction.
            if hit.distance <= 0.0 && dir.dot(&n) >= 0.0 {
                self.position += remaining;
                remaining = Vec3::zeros();
                break;
            }
            hits += 1;

            let travel = hit.distance.clamp(0.0, len);
            self.position += dir.into_inner() * (travel - self.skin).max(0.0);

            // Slide: only the component into the surface is removed.
            let leftover = dir.into_inner() * (len - travel);
            remaining = leftover - n * leftover.dot(&n).min(0.0);
            let into = self.velocity.dot(&n);
            if into < 0.0 {
                self.velocity -= n * into;
            }
            trace!(
                "integrate hit at {travel:.4} normal {:?}, sliding {:?}",
                n, remaining
            );
        }

        IntegrateResult { hits, remaining }
    }
}

impl BodyControl for KinematicBody {
    #[inline]
    fn position(&self) -> Point3 {
        self.position
    }

    #[inline]
    fn rotation(&self) -> Quat {
        self.rotation
    }

    #[inline]
    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    #[inline]
    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    #[inline]
    fn move_position_by(&mut self, delta: Vec3) {
        self.position += delta;
    }
}
