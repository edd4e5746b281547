/*!
Ground and step classification.

Every tick the probe runs the same cast sequence from scratch:

1. a direct sweep straight down by the ground distance,
2. a step sweep: up by the step clearance, forward by this tick's predicted travel,
   down by twice the clearance, followed by a straight ray onto the landing point to
   get a clean surface normal (a swept capsule's normal at a step edge is unreliable),
3. arbitration between the two,
4. the final grounded decision and its consequence: a position snap by the step offset
   when grounded, gravity when airborne.

[`GroundProbe::evaluate`] is pure. It reads a [`BodySnapshot`] and the previous
[`ProbeMemory`], and returns what to do as an [`Evaluation`]; applying it is the
caller's job (see [`Controller`](crate::controller::Controller)).
*/

use log::{debug, trace};

use crate::{
    backend::CollisionWorld,
    cast::CapsuleCaster,
    config::ControllerConfig,
    constants::DIST_EPS,
    error::ConfigError,
    events::Transition,
    state::{GroundState, ProbeMemory},
    types::{BodySnapshot, Point3, SurfaceHit, UnitVec3, Vec3},
    velocity::VelocityFrame,
};

/// What the body has to do this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Correction {
    /// Grounded: move by `offset` (kinematically) and take `velocity`.
    Snap { offset: Vec3, velocity: Vec3 },
    /// Airborne: take `velocity`, which has this tick's gravity integrated.
    Gravity { velocity: Vec3 },
}

/// Output of one [`GroundProbe::evaluate`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation<B> {
    pub ground: GroundState<B>,
    /// Memory to pass into the next evaluation.
    pub memory: ProbeMemory<B>,
    pub transition: Option<Transition>,
    pub correction: Correction,
}

/// A step landing that passed the normal check.
#[derive(Clone, Copy, Debug)]
struct StepHit<B> {
    surface: SurfaceHit<B>,
    offset: Vec3,
}

/// Ground and step classifier for one capsule body.
#[derive(Clone, Copy, Debug)]
pub struct GroundProbe {
    config: ControllerConfig,
}

impl GroundProbe {
    pub fn new(config: ControllerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Velocity frame for a ground state, sampling the carrier at the contact point.
    pub fn frame<W: CollisionWorld>(
        &self,
        world: &W,
        ground: &GroundState<W::Body>,
        up: UnitVec3,
    ) -> VelocityFrame {
        let carrier_velocity = ground
            .carrier
            .map(|body| world.point_velocity(body, &ground.contact_point))
            .unwrap_or_else(Vec3::zeros);
        VelocityFrame::for_mode(self.config.projection, ground.normal, up, carrier_velocity)
    }

    /// Classify this tick's ground contact.
    pub fn evaluate<W: CollisionWorld>(
        &self,
        memory: &ProbeMemory<W::Body>,
        world: &W,
        body: &BodySnapshot,
        dt: f32,
    ) -> Evaluation<W::Body> {
        let dt = dt.max(0.0);
        let cast = &self.config.cast;
        let up = self.config.gravity.up(&body.rotation);
        let caster = CapsuleCaster::new(
            world,
            self.config.capsule,
            body.position,
            body.rotation,
            cast.cast_margin,
            cast.layer_mask,
        );

        // Last tick's axis drives the step prediction; the carrier plays no part there.
        let previous = VelocityFrame::for_mode(
            self.config.projection,
            memory.ground.normal,
            up,
            Vec3::zeros(),
        );

        let direct = self.ground_cast(&caster, up);
        let step = self.step_cast(&caster, &previous, body, up, dt);

        let mut ground = GroundState::airborne(up);
        if let Some(hit) = &direct {
            ground.normal = hit.normal;
            ground.contact_point = hit.point;
            ground.carrier = hit.body;
        }

        let can_ground = direct.is_some();
        let falling = self.is_falling(&body.velocity, up);
        if let Some(step) = &step {
            if can_ground && (memory.last_grounded() || falling) {
                ground.normal = step.surface.normal;
                ground.contact_point = step.surface.point;
                ground.carrier = step.surface.body;
            }
            ground.step_offset = step.offset;
        }

        let grounded = !memory.leave_ground && can_ground && self.is_ground(&ground.normal, up);
        if !grounded {
            ground = GroundState::airborne(up);
        }
        ground.is_grounded = grounded;

        let correction = if grounded {
            let frame = self.frame(world, &ground, up);
            Correction::Snap {
                offset: ground.step_offset,
                velocity: frame.grounded(&body.velocity),
            }
        } else {
            let gravity = self.config.gravity.vector(&body.rotation);
            Correction::Gravity {
                velocity: body.velocity + gravity * dt,
            }
        };

        let transition = Transition::between(memory.last_grounded(), grounded);
        if let Some(transition) = transition {
            debug!(
                "{transition:?} at {:?} (normal {:?}, carrier {:?})",
                body.position.coords,
                ground.normal.into_inner(),
                ground.carrier
            );
        }
        trace!(
            "ground direct={} step={} falling={falling} leave={} grounded={grounded}",
            direct.is_some(),
            step.is_some(),
            memory.leave_ground
        );

        Evaluation {
            ground,
            memory: ProbeMemory {
                ground,
                leave_ground: false,
            },
            transition,
            correction,
        }
    }

    fn ground_cast<W: CollisionWorld>(
        &self,
        caster: &CapsuleCaster<'_, W>,
        up: UnitVec3,
    ) -> Option<SurfaceHit<W::Body>> {
        let mut offset = Vec3::zeros();
        caster.cast_along(&mut offset, -up, self.config.cast.ground_distance)
    }

    /// Up, forward, down; then a straight ray for the landing normal.
    fn step_cast<W: CollisionWorld>(
        &self,
        caster: &CapsuleCaster<'_, W>,
        previous: &VelocityFrame,
        body: &BodySnapshot,
        up: UnitVec3,
        dt: f32,
    ) -> Option<StepHit<W::Body>> {
        let clearance = self.config.cast.step_clearance();
        let travel = previous.ground_project(&body.velocity) * dt;

        let mut offset = Vec3::zeros();
        caster.cast_along(&mut offset, up, clearance);
        caster.cast(&mut offset, travel);
        let landing = caster.cast_along(&mut offset, -up, 2.0 * clearance)?;

        // Nudge the ray toward the capsule axis so a hit on an edge samples the face the
        // capsule actually rests over.
        let swept_center = body.position + offset;
        let toward_body = project_on_plane(&(swept_center - landing.point), up)
            .try_normalize(DIST_EPS)
            .map_or_else(Vec3::zeros, |dir| dir * caster.margin());
        let origin: Point3 = landing.point + toward_body + up.into_inner() * clearance;

        let surface = caster
            .world()
            .raycast(origin, -up, 2.0 * clearance, caster.mask())?;
        if !self.is_ground(&surface.normal, up) {
            trace!("step rejected: normal {:?}", surface.normal.into_inner());
            return None;
        }

        Some(StepHit {
            surface,
            offset: previous.normal_project(&offset),
        })
    }

    /// Velocity points more sideways or down than a walkable surface normal would.
    ///
    /// A body at rest counts as falling.
    #[inline]
    fn is_falling(&self, velocity: &Vec3, up: UnitVec3) -> bool {
        let rise = velocity
            .try_normalize(DIST_EPS)
            .map_or(0.0, |dir| dir.dot(&up.into_inner()));
        rise < self.config.cast.ground_dot
    }

    #[inline]
    fn is_ground(&self, normal: &UnitVec3, up: UnitVec3) -> bool {
        normal.into_inner().dot(&up.into_inner()) > self.config.cast.ground_dot
    }
}

#[inline]
fn project_on_plane(v: &Vec3, normal: UnitVec3) -> Vec3 {
    v - normal.into_inner() * normal.dot(v)
}
