//! Chained capsule casts.
//!
//! A [`CapsuleCaster`] sweeps the body's capsule from its current pose plus an
//! accumulated offset. Each cast advances the offset by the distance the capsule could
//! actually travel, so a sequence like "up, forward, down" simulates one swept step
//! climb with three straight sweeps.

use log::trace;

use crate::{
    backend::CollisionWorld,
    constants::DIST_EPS,
    layers::LayerMask,
    types::{CapsuleShape, CapsuleSweep, Point3, Quat, SurfaceHit, UnitVec3, Vec3},
};

/// Casts the controlled capsule against a collision world.
pub struct CapsuleCaster<'a, W: CollisionWorld> {
    world: &'a W,
    capsule: CapsuleShape,
    position: Point3,
    rotation: Quat,
    margin: f32,
    mask: LayerMask,
}

impl<'a, W: CollisionWorld> CapsuleCaster<'a, W> {
    pub fn new(
        world: &'a W,
        capsule: CapsuleShape,
        position: Point3,
        rotation: Quat,
        margin: f32,
        mask: LayerMask,
    ) -> Self {
        Self {
            world,
            capsule,
            position,
            rotation,
            margin,
            mask,
        }
    }

    #[inline]
    pub fn world(&self) -> &'a W {
        self.world
    }

    #[inline]
    pub fn mask(&self) -> LayerMask {
        self.mask
    }

    #[inline]
    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Cast by `displacement` starting from `position + offset`.
    ///
    /// A zero displacement has no direction: nothing is swept and `offset` is left as is.
    /// Use [`cast_along`](Self::cast_along) with a zero distance for a margin-only cast.
    pub fn cast(&self, offset: &mut Vec3, displacement: Vec3) -> Option<SurfaceHit<W::Body>> {
        let distance = displacement.norm();
        if distance <= DIST_EPS {
            return None;
        }
        let direction = UnitVec3::new_unchecked(displacement / distance);
        self.cast_along(offset, direction, distance)
    }

    /// Cast `distance` along `direction` starting from `position + offset`.
    ///
    /// The sweep covers `distance + margin`. On a hit the capsule stops `margin` short of
    /// the surface, which is slightly negative when it started closer than that. On a
    /// miss it travels the full `distance`. Either way `offset` advances by the achieved
    /// displacement.
    pub fn cast_along(
        &self,
        offset: &mut Vec3,
        direction: UnitVec3,
        distance: f32,
    ) -> Option<SurfaceHit<W::Body>> {
        let distance = distance.max(0.0);
        let (a, b) = self.capsule.endpoints(&self.position, &self.rotation);

        let sweep = CapsuleSweep {
            a: a + *offset,
            b: b + *offset,
            radius: self.capsule.radius,
            direction,
            max_distance: distance + self.margin,
        };
        let hit = self.world.sweep_capsule(&sweep, self.mask);

        let achieved = match &hit {
            Some(hit) => hit.distance - self.margin,
            None => distance,
        };
        trace!(
            "cast dir={:?} dist={distance:.4} hit={} achieved={achieved:.4}",
            direction.into_inner(),
            hit.is_some()
        );

        *offset += direction.into_inner() * achieved;
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PlaneWorld, flat_floor};
    use approx::assert_relative_eq;

    const MARGIN: f32 = 0.01;

    fn caster<'a>(world: &'a PlaneWorld, position: Point3) -> CapsuleCaster<'a, PlaneWorld> {
        CapsuleCaster::new(
            world,
            CapsuleShape::new(0.5, 0.5),
            position,
            Quat::identity(),
            MARGIN,
            LayerMask::all(),
        )
    }

    #[test]
    fn hit_stops_margin_short_of_surface() {
        // Capsule bottom at y = 1.0 + 0.0 (center 2.0, half height 0.5, radius 0.5).
        let world = flat_floor();
        let caster = caster(&world, Point3::new(0.0, 2.0, 0.0));

        let mut offset = Vec3::zeros();
        let hit = caster.cast(&mut offset, Vec3::new(0.0, -5.0, 0.0));

        let hit = hit.expect("floor should be hit");
        assert_relative_eq!(hit.distance, 1.0, epsilon = 1.0e-5);
        assert_relative_eq!(offset, Vec3::new(0.0, -1.0 + MARGIN, 0.0), epsilon = 1.0e-5);
    }

    #[test]
    fn miss_travels_full_displacement() {
        let world = flat_floor();
        let caster = caster(&world, Point3::new(0.0, 2.0, 0.0));

        let mut offset = Vec3::zeros();
        assert!(caster.cast(&mut offset, Vec3::new(0.0, -0.5, 0.0)).is_none());
        assert_relative_eq!(offset, Vec3::new(0.0, -0.5, 0.0), epsilon = 1.0e-6);
    }

    #[test]
    fn chained_casts_start_where_the_previous_stopped() {
        let world = flat_floor();
        let caster = caster(&world, Point3::new(0.0, 1.0 + 0.2, 0.0));

        let mut offset = Vec3::zeros();
        assert!(caster.cast(&mut offset, Vec3::new(0.0, 0.3, 0.0)).is_none());
        assert!(caster.cast(&mut offset, Vec3::new(0.4, 0.0, 0.0)).is_none());
        let hit = caster.cast(&mut offset, Vec3::new(0.0, -0.6, 0.0));

        // Started 0.2 above the floor, went up 0.3: the floor is 0.5 below.
        assert_relative_eq!(hit.unwrap().distance, 0.5, epsilon = 1.0e-5);
        assert_relative_eq!(offset, Vec3::new(0.4, -0.2 + MARGIN, 0.0), epsilon = 1.0e-5);
    }

    #[test]
    fn hit_at_exactly_margin_does_not_move() {
        let world = flat_floor();
        let caster = caster(&world, Point3::new(0.0, 1.0 + MARGIN, 0.0));

        let mut offset = Vec3::zeros();
        let hit = caster.cast(&mut offset, Vec3::new(0.0, -0.05, 0.0));
        assert!(hit.is_some());
        assert_relative_eq!(offset, Vec3::zeros(), epsilon = 1.0e-5);
    }

    #[test]
    fn zero_distance_along_a_direction_still_casts_the_margin() {
        let world = flat_floor();
        let caster = caster(&world, Point3::new(0.0, 1.0 + 0.5 * MARGIN, 0.0));

        let mut offset = Vec3::zeros();
        let hit = caster.cast_along(&mut offset, -Vec3::y_axis(), 0.0);
        assert!(hit.is_some());
        // Closer than the margin: the capsule backs out to the skin.
        assert_relative_eq!(offset.y, 0.5 * MARGIN, epsilon = 1.0e-5);

        let far = caster_at_height(&world, 1.0 + 2.0 * MARGIN);
        let mut offset = Vec3::zeros();
        assert!(far.cast_along(&mut offset, -Vec3::y_axis(), 0.0).is_none());
        assert_relative_eq!(offset, Vec3::zeros());
    }

    #[test]
    fn zero_displacement_is_a_no_op() {
        let world = flat_floor();
        let caster = caster(&world, Point3::new(0.0, 1.0 + 0.5 * MARGIN, 0.0));

        let mut offset = Vec3::new(0.1, 0.0, 0.3);
        assert!(caster.cast(&mut offset, Vec3::zeros()).is_none());
        assert_eq!(offset, Vec3::new(0.1, 0.0, 0.3));

        // Same pose, margin-only cast along a direction: the floor is within reach.
        let mut offset = Vec3::zeros();
        assert!(caster.cast_along(&mut offset, -Vec3::y_axis(), 0.0).is_some());
    }

    fn caster_at_height(world: &PlaneWorld, y: f32) -> CapsuleCaster<'_, PlaneWorld> {
        caster(world, Point3::new(0.0, y, 0.0))
    }
}
