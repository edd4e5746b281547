//! Per-tick driver.
//!
//! [`Controller`] owns one body's ground probe, its cross-tick memory and its
//! listeners. The host calls [`Controller::tick`] once per fixed physics step, after
//! input has been read and before the physics solver integrates:
//!
//! 1. `BeforeTick` listeners, then [`TickHooks::before_update`]. Hooks see last tick's
//!    ground state and may set velocities or request leaving the ground.
//! 2. Ground evaluation.
//! 3. The correction is applied to the body: a position snap plus grounded velocity,
//!    or gravity.
//! 4. `BecameGrounded` / `BecameUngrounded` on a transition.
//! 5. `AfterTick` listeners, then [`TickHooks::after_update`] with the new state.

use log::trace;

use crate::{
    backend::{BodyControl, CollisionWorld},
    config::ControllerConfig,
    error::ConfigError,
    events::{Channel, EventSink, Transition},
    ground::{Correction, GroundProbe},
    state::{GroundState, ProbeMemory},
    types::{Quat, UnitVec3, Vec3},
    velocity::VelocityFrame,
};

/// Movement code that runs inside a tick.
///
/// Both methods default to doing nothing. `()` implements the trait for hosts without
/// hooks.
pub trait TickHooks<W: CollisionWorld, C: BodyControl> {
    fn before_update(&mut self, _ctx: &mut TickContext<'_, W, C>) {}

    fn after_update(&mut self, _ctx: &mut TickContext<'_, W, C>) {}
}

impl<W: CollisionWorld, C: BodyControl> TickHooks<W, C> for () {}

/// View of the controller and its body handed to [`TickHooks`].
pub struct TickContext<'a, W: CollisionWorld, C> {
    probe: &'a GroundProbe,
    memory: &'a mut ProbeMemory<W::Body>,
    world: &'a W,
    body: &'a mut C,
    dt: f32,
}

impl<'a, W: CollisionWorld, C: BodyControl> TickContext<'a, W, C> {
    #[inline]
    pub fn dt(&self) -> f32 {
        self.dt
    }

    #[inline]
    pub fn ground(&self) -> &GroundState<W::Body> {
        &self.memory.ground
    }

    #[inline]
    pub fn last_grounded(&self) -> bool {
        self.memory.last_grounded()
    }

    /// Skip ground snapping on the next evaluation.
    #[inline]
    pub fn leave_ground(&mut self) {
        self.memory.request_leave_ground();
    }

    pub fn up(&self) -> UnitVec3 {
        self.probe.config().gravity.up(&self.body.rotation())
    }

    pub fn gravity_vector(&self) -> Vec3 {
        self.probe.config().gravity.vector(&self.body.rotation())
    }

    pub fn frame(&self) -> VelocityFrame {
        self.probe.frame(self.world, &self.memory.ground, self.up())
    }

    pub fn tangential_velocity(&self) -> Vec3 {
        self.frame().tangential(&self.body.velocity())
    }

    pub fn set_tangential_velocity(&mut self, target: Vec3) {
        let velocity = self.frame().with_tangential(&self.body.velocity(), &target);
        self.body.set_velocity(velocity);
    }

    pub fn normal_velocity(&self) -> Vec3 {
        self.frame().normal(&self.body.velocity())
    }

    pub fn set_normal_velocity(&mut self, target: Vec3) {
        let velocity = self.frame().with_normal(&self.body.velocity(), &target);
        self.body.set_velocity(velocity);
    }

    #[inline]
    pub fn body(&self) -> &C {
        &*self.body
    }

    #[inline]
    pub fn body_mut(&mut self) -> &mut C {
        &mut *self.body
    }
}

/// Ground-locomotion controller of one capsule body.
#[derive(Debug)]
pub struct Controller<B> {
    probe: GroundProbe,
    memory: ProbeMemory<B>,
    events: EventSink,
    /// Memory still holds the "up" of an unrotated body.
    unseeded: bool,
}

impl<B: Copy + PartialEq + std::fmt::Debug> Controller<B> {
    pub fn new(config: ControllerConfig) -> Result<Self, ConfigError> {
        let probe = GroundProbe::new(config)?;
        let up = config.gravity.up(&Quat::identity());
        Ok(Self {
            probe,
            memory: ProbeMemory::new(up),
            events: EventSink::new(),
            unseeded: true,
        })
    }

    #[inline]
    pub fn config(&self) -> &ControllerConfig {
        self.probe.config()
    }

    #[inline]
    pub fn probe(&self) -> &GroundProbe {
        &self.probe
    }

    #[inline]
    pub fn memory(&self) -> &ProbeMemory<B> {
        &self.memory
    }

    /// Ground state of the most recent tick.
    #[inline]
    pub fn ground(&self) -> &GroundState<B> {
        &self.memory.ground
    }

    #[inline]
    pub fn last_grounded(&self) -> bool {
        self.memory.last_grounded()
    }

    /// Skip ground snapping on the next tick, e.g. when jumping.
    #[inline]
    pub fn leave_ground(&mut self) {
        self.memory.request_leave_ground();
    }

    #[inline]
    pub fn events_mut(&mut self) -> &mut EventSink {
        &mut self.events
    }

    pub fn subscribe(&mut self, channel: Channel, listener: impl FnMut() + Send + 'static) {
        self.events.subscribe(channel, listener);
    }

    pub fn up(&self, rotation: &Quat) -> UnitVec3 {
        self.config().gravity.up(rotation)
    }

    pub fn gravity_vector(&self, rotation: &Quat) -> Vec3 {
        self.config().gravity.vector(rotation)
    }

    /// Velocity frame of the most recent ground state.
    pub fn frame<W>(&self, world: &W, rotation: &Quat) -> VelocityFrame
    where
        W: CollisionWorld<Body = B>,
    {
        self.probe.frame(world, &self.memory.ground, self.up(rotation))
    }

    pub fn tangential_velocity<W, C>(&self, world: &W, body: &C) -> Vec3
    where
        W: CollisionWorld<Body = B>,
        C: BodyControl,
    {
        self.frame(world, &body.rotation()).tangential(&body.velocity())
    }

    pub fn set_tangential_velocity<W, C>(&self, world: &W, body: &mut C, target: Vec3)
    where
        W: CollisionWorld<Body = B>,
        C: BodyControl,
    {
        let frame = self.frame(world, &body.rotation());
        body.set_velocity(frame.with_tangential(&body.velocity(), &target));
    }

    pub fn normal_velocity<W, C>(&self, world: &W, body: &C) -> Vec3
    where
        W: CollisionWorld<Body = B>,
        C: BodyControl,
    {
        self.frame(world, &body.rotation()).normal(&body.velocity())
    }

    pub fn set_normal_velocity<W, C>(&self, world: &W, body: &mut C, target: Vec3)
    where
        W: CollisionWorld<Body = B>,
        C: BodyControl,
    {
        let frame = self.frame(world, &body.rotation());
        body.set_velocity(frame.with_normal(&body.velocity(), &target));
    }

    /// Run one fixed step. Returns the transition, if one happened.
    pub fn tick<W, C, H>(
        &mut self,
        world: &W,
        body: &mut C,
        dt: f32,
        hooks: &mut H,
    ) -> Option<Transition>
    where
        W: CollisionWorld<Body = B>,
        C: BodyControl,
        H: TickHooks<W, C> + ?Sized,
    {
        if self.unseeded {
            self.memory.ground.normal = self.up(&body.rotation());
            self.unseeded = false;
        }

        self.events.emit(Channel::BeforeTick);
        hooks.before_update(&mut TickContext {
            probe: &self.probe,
            memory: &mut self.memory,
            world,
            body: &mut *body,
            dt,
        });

        let eval = self.probe.evaluate(&self.memory, world, &body.snapshot(), dt);
        match eval.correction {
            Correction::Snap { offset, velocity } => {
                body.move_position_by(offset);
                body.set_velocity(velocity);
            }
            Correction::Gravity { velocity } => body.set_velocity(velocity),
        }
        trace!("tick correction {:?}", eval.correction);
        self.memory = eval.memory;

        if let Some(transition) = eval.transition {
            self.events.emit(transition.channel());
        }

        self.events.emit(Channel::AfterTick);
        hooks.after_update(&mut TickContext {
            probe: &self.probe,
            memory: &mut self.memory,
            world,
            body,
            dt,
        });

        eval.transition
    }
}
