//! Player-style movement on top of the controller.
//!
//! Reads a [`WalkInput`] every tick and turns it into tangential and normal velocity
//! through the controller's tick hooks. Jumps are forgiving in both directions:
//! coyote time allows a jump shortly after walking off an edge, the jump buffer keeps
//! a press alive for a short while before landing.

use locomotion::{
    BodyControl, CollisionWorld, TickContext, TickHooks, jump_speed, types::Vec3,
};
use log::debug;

/// Input sampled by the host before the tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WalkInput {
    /// Desired horizontal direction, at most unit length.
    pub direction: Vec3,
    /// Jump pressed this tick.
    pub jump: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalkerSettings {
    pub ground_speed: f32,
    pub air_speed: f32,
    pub ground_acceleration: f32,
    pub air_acceleration: f32,
    pub coyote_time: f32,
    pub jump_buffer: f32,
    pub jump_height: f32,
}

impl Default for WalkerSettings {
    fn default() -> Self {
        Self {
            ground_speed: 2.0,
            air_speed: 2.0,
            ground_acceleration: 20.0,
            air_acceleration: 10.0,
            coyote_time: 0.2,
            jump_buffer: 0.2,
            jump_height: 2.0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Walker {
    pub settings: WalkerSettings,
    pub input: WalkInput,
    coyote: f32,
    buffer: f32,
    jumps: u32,
}

impl Walker {
    pub fn new(settings: WalkerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    #[inline]
    pub fn jumps(&self) -> u32 {
        self.jumps
    }

    fn try_jump<W: CollisionWorld, C: BodyControl>(&mut self, ctx: &mut TickContext<'_, W, C>) {
        if ctx.last_grounded() {
            self.coyote = self.settings.coyote_time;
        } else {
            self.coyote -= ctx.dt();
        }

        if self.input.jump {
            self.buffer = self.settings.jump_buffer;
        } else {
            self.buffer -= ctx.dt();
        }

        if self.coyote > 0.0 && self.buffer > 0.0 {
            let gravity = ctx.gravity_vector();
            let up = ctx.up().into_inner();
            ctx.set_normal_velocity(up * jump_speed(self.settings.jump_height, gravity.norm()));
            ctx.leave_ground();
            // Consume both windows so one press is one jump.
            self.coyote = 0.0;
            self.buffer = 0.0;
            self.jumps += 1;
            debug!("jump #{}", self.jumps);
        }
    }
}

impl<W: CollisionWorld, C: BodyControl> TickHooks<W, C> for Walker {
    fn before_update(&mut self, ctx: &mut TickContext<'_, W, C>) {
        self.try_jump(ctx);

        let grounded = ctx.last_grounded();
        let (speed, acceleration) = if grounded {
            (self.settings.ground_speed, self.settings.ground_acceleration)
        } else {
            (self.settings.air_speed, self.settings.air_acceleration)
        };

        let target = ctx.frame().ground_project(&self.input.direction) * speed;
        let current = ctx.tangential_velocity();
        let next = move_towards(current, target, acceleration * ctx.dt());
        ctx.set_tangential_velocity(next);
    }
}

/// Move `current` toward `target` by at most `max_delta`.
pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let delta = target - current;
    let distance = delta.norm();
    if distance <= max_delta || distance <= f32::EPSILON {
        target
    } else {
        current + delta * (max_delta / distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use locomotion::{
        CapsuleShape, ColliderShapeDef, Controller, ControllerConfig, KinematicBody,
        RapierQueryWorld, Transition, WorldStaticDef,
        rapier_world::rapier3d::prelude::{ColliderHandle, Vector},
        types::Point3,
    };

    const DT: f32 = 1.0 / 50.0;
    const REST_HEIGHT: f32 = 0.5 + 0.3 + locomotion::DEFAULT_CAST_MARGIN;

    fn floor(half_x: f32) -> RapierQueryWorld {
        RapierQueryWorld::build([WorldStaticDef::new(
            0,
            Vector::new(0.0, -0.5, 0.0),
            ColliderShapeDef::Cuboid {
                half_extents: Vector::new(half_x, 0.5, 10.0),
            },
        )])
    }

    struct Rig {
        world: RapierQueryWorld,
        controller: Controller<ColliderHandle>,
        body: KinematicBody,
        walker: Walker,
    }

    impl Rig {
        fn on(world: RapierQueryWorld, x: f32) -> Self {
            let capsule = CapsuleShape::new(0.5, 0.3);
            Self {
                world,
                controller: Controller::new(ControllerConfig::new(capsule)).unwrap(),
                body: KinematicBody::new(Point3::new(x, REST_HEIGHT, 0.0), capsule),
                walker: Walker::default(),
            }
        }

        fn tick(&mut self) -> Option<Transition> {
            let t = self
                .controller
                .tick(&self.world, &mut self.body, DT, &mut self.walker);
            let mask = self.controller.config().cast.layer_mask;
            self.body.integrate(&self.world, mask, DT);
            t
        }
    }

    #[test]
    fn move_towards_clamps_the_step() {
        let v = move_towards(Vec3::zeros(), Vec3::new(3.0, 0.0, 4.0), 1.0);
        assert_relative_eq!(v, Vec3::new(0.6, 0.0, 0.8), epsilon = 1.0e-6);
        assert_relative_eq!(
            move_towards(Vec3::x(), Vec3::new(1.1, 0.0, 0.0), 1.0),
            Vec3::new(1.1, 0.0, 0.0)
        );
    }

    #[test]
    fn walking_accelerates_to_ground_speed() {
        let mut rig = Rig::on(floor(20.0), 0.0);
        rig.walker.input.direction = Vec3::x();

        for _ in 0..50 {
            rig.tick();
        }

        assert!(rig.controller.last_grounded());
        assert_relative_eq!(rig.body.velocity, Vec3::new(2.0, 0.0, 0.0), epsilon = 1.0e-3);
    }

    #[test]
    fn jump_reaches_its_height_once_per_press() {
        let mut rig = Rig::on(floor(20.0), 0.0);
        rig.tick();

        rig.walker.input.jump = true;
        rig.tick();
        rig.walker.input.jump = false;

        let mut apex = rig.body.position.y;
        for _ in 0..150 {
            rig.tick();
            apex = apex.max(rig.body.position.y);
        }

        assert_eq!(rig.walker.jumps(), 1);
        assert_relative_eq!(apex, REST_HEIGHT + 2.0, epsilon = 0.1);
        assert!(rig.controller.last_grounded());
    }

    #[test]
    fn coyote_time_allows_a_late_jump() {
        // Floor ends at x = 1; walking off it at 2 m/s.
        let mut rig = Rig::on(floor(1.0), 0.0);
        rig.walker.input.direction = Vec3::x();

        let mut left_at = None;
        for tick in 0..100 {
            if rig.tick() == Some(Transition::Ungrounded) {
                left_at = Some(tick);
                break;
            }
        }
        assert!(left_at.is_some(), "never left the floor");

        // A couple of ticks after leaving the edge, well inside 0.2 s.
        rig.tick();
        rig.walker.input.jump = true;
        rig.tick();
        assert_eq!(rig.walker.jumps(), 1);
        assert!(rig.body.velocity.y > 0.0);
    }

    #[test]
    fn jump_buffer_fires_on_landing() {
        let mut rig = Rig::on(floor(20.0), 0.0);
        rig.body.position.y = REST_HEIGHT + 0.15;

        // Pressed while still falling.
        rig.walker.input.jump = true;
        rig.tick();
        rig.walker.input.jump = false;
        assert_eq!(rig.walker.jumps(), 0);

        for _ in 0..9 {
            rig.tick();
        }
        // Landed around tick 8; the buffered press fired on the next tick.
        assert_eq!(rig.walker.jumps(), 1);
    }
}
