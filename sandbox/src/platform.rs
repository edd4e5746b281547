use locomotion::{
    RapierQueryWorld,
    rapier_world::rapier3d::prelude::ColliderHandle,
    types::{Iso, Quat, Vec3},
};
use nalgebra::Translation3;

/// Carrier that oscillates around its start pose.
///
/// At time `t` the offset is `sin(t * frequency)` times `translation`, and the
/// rotation is the same fraction of `rotation` (a scaled axis, radians) applied on
/// top of the start rotation.
#[derive(Clone, Copy, Debug)]
pub struct OscillatingPlatform {
    pub handle: ColliderHandle,
    pub start: Iso,
    pub translation: Vec3,
    pub rotation: Vec3,
    pub frequency: f32,
}

impl OscillatingPlatform {
    pub fn pose_at(&self, t: f32) -> Iso {
        let s = (t * self.frequency).sin();
        let translation = Translation3::from(self.start.translation.vector + self.translation * s);
        let rotation = Quat::from_scaled_axis(self.rotation * s) * self.start.rotation;
        Iso::from_parts(translation, rotation)
    }

    /// Linear velocity of the platform origin at time `t`.
    pub fn linvel_at(&self, t: f32) -> Vec3 {
        self.translation * self.rate(t)
    }

    /// World-space angular velocity at time `t`.
    pub fn angvel_at(&self, t: f32) -> Vec3 {
        self.rotation * self.rate(t)
    }

    /// Re-pose the carrier in `world` for time `t`.
    pub fn drive(&self, world: &mut RapierQueryWorld, t: f32) {
        world.move_carrier(self.handle, self.pose_at(t), self.linvel_at(t), self.angvel_at(t));
    }

    #[inline]
    fn rate(&self, t: f32) -> f32 {
        self.frequency * (t * self.frequency).cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use locomotion::{ColliderShapeDef, WorldStaticDef, rapier_world::rapier3d::prelude::Vector};

    fn platform(world: &mut RapierQueryWorld) -> OscillatingPlatform {
        let def = WorldStaticDef::new(
            0,
            Vector::new(0.0, 1.0, 0.0),
            ColliderShapeDef::Cuboid {
                half_extents: Vector::new(2.0, 0.1, 2.0),
            },
        );
        OscillatingPlatform {
            handle: world.add_carrier(&def),
            start: def.pose(),
            translation: Vec3::new(3.0, 0.0, 0.0),
            rotation: Vec3::new(0.0, 0.5, 0.0),
            frequency: 1.5,
        }
    }

    #[test]
    fn starts_at_its_start_pose() {
        let mut world = RapierQueryWorld::build([]);
        let platform = platform(&mut world);

        let pose = platform.pose_at(0.0);
        assert_relative_eq!(pose.translation.vector, Vec3::new(0.0, 1.0, 0.0), epsilon = 1.0e-6);
        assert_relative_eq!(pose.rotation.angle(), 0.0, epsilon = 1.0e-6);
    }

    #[test]
    fn velocities_match_the_pose_derivative() {
        let mut world = RapierQueryWorld::build([]);
        let platform = platform(&mut world);
        let (t, h) = (0.7, 1.0e-3);

        let before = platform.pose_at(t - h);
        let after = platform.pose_at(t + h);

        let linvel = (after.translation.vector - before.translation.vector) / (2.0 * h);
        assert_relative_eq!(linvel, platform.linvel_at(t), epsilon = 1.0e-2);

        let angvel = (after.rotation * before.rotation.inverse()).scaled_axis() / (2.0 * h);
        assert_relative_eq!(angvel, platform.angvel_at(t), epsilon = 1.0e-2);
    }

    #[test]
    fn drive_moves_the_carrier_in_the_world() {
        let mut world = RapierQueryWorld::build([]);
        let platform = platform(&mut world);

        let t = std::f32::consts::FRAC_PI_2 / platform.frequency;
        platform.drive(&mut world, t);

        let motion = world.carrier(platform.handle).expect("registered carrier");
        assert_relative_eq!(motion.pivot.coords, Vec3::new(3.0, 1.0, 0.0), epsilon = 1.0e-5);
        assert_relative_eq!(motion.linvel, Vec3::zeros(), epsilon = 1.0e-5);
    }
}
