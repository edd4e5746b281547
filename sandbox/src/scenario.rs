//! Scripted scenes for the headless sandbox.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use anyhow::ensure;
use clap::ValueEnum;
use locomotion::{
    Channel, ColliderShapeDef, Controller, ControllerConfig, KinematicBody, RapierQueryWorld,
    WorldStaticDef,
    rapier_world::rapier3d::prelude::{ColliderHandle, Vector},
    types::{Point3, Quat, Vec3},
};
use log::{debug, info};

use crate::{
    platform::OscillatingPlatform,
    walker::{WalkInput, Walker, WalkerSettings},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Walk over a floor with two ledges, jumping once on the way.
    Steps,
    /// Stand on an oscillating, rotating platform.
    Platform,
    /// Walk up a walkable ramp into a wall that is too steep to stand on.
    Slope,
}

/// Summary of one run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    pub ticks: u32,
    pub grounded_ticks: u32,
    pub grounded_events: usize,
    pub ungrounded_events: usize,
    pub jumps: u32,
    pub final_position: Vec3,
    pub max_height: f32,
    /// Largest angle between "up" and the ground normal over grounded ticks.
    pub steepest_ground_degrees: f32,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ticks:           {}", self.ticks)?;
        writeln!(f, "grounded ticks:  {}", self.grounded_ticks)?;
        writeln!(
            f,
            "transitions:     {} grounded / {} ungrounded",
            self.grounded_events, self.ungrounded_events
        )?;
        writeln!(f, "jumps:           {}", self.jumps)?;
        writeln!(
            f,
            "final position:  ({:.3}, {:.3}, {:.3})",
            self.final_position.x, self.final_position.y, self.final_position.z
        )?;
        writeln!(f, "max height:      {:.3}", self.max_height)?;
        write!(f, "steepest ground: {:.1} deg", self.steepest_ground_degrees)
    }
}

/// Scene contents: the world, an optional moving platform and the spawn point.
struct Scene {
    world: RapierQueryWorld,
    platform: Option<OscillatingPlatform>,
    spawn: Point3,
    direction: Vec3,
    jump_at: Option<u32>,
}

fn slab(id: u32, center_x: f32, half_x: f32, top: f32) -> WorldStaticDef {
    WorldStaticDef::new(
        id,
        Vector::new(center_x, top - 0.5, 0.0),
        ColliderShapeDef::Cuboid {
            half_extents: Vector::new(half_x, 0.5, 10.0),
        },
    )
}

fn tilted_slab(id: u32, center: Vector<f32>, half_length: f32, degrees: f32) -> WorldStaticDef {
    WorldStaticDef::new(
        id,
        center,
        ColliderShapeDef::Cuboid {
            half_extents: Vector::new(half_length, 0.1, 10.0),
        },
    )
    .with_rotation(Quat::from_axis_angle(&Vec3::z_axis(), degrees.to_radians()))
}

impl Scene {
    fn build(scenario: Scenario, rest_height: f32) -> Self {
        match scenario {
            Scenario::Steps => Scene {
                world: RapierQueryWorld::build([
                    slab(0, 0.0, 20.0, 0.0),
                    slab(1, 12.0, 9.0, 0.2),
                    slab(2, 15.0, 6.0, 0.45),
                ]),
                platform: None,
                spawn: Point3::new(0.0, rest_height, 0.0),
                direction: Vec3::x(),
                jump_at: Some(60),
            },
            Scenario::Platform => {
                let mut world = RapierQueryWorld::build([slab(0, 0.0, 20.0, -5.0)]);
                let def = WorldStaticDef::new(
                    1,
                    Vector::new(0.0, 0.0, 0.0),
                    ColliderShapeDef::Cuboid {
                        half_extents: Vector::new(2.5, 0.1, 2.5),
                    },
                );
                let platform = OscillatingPlatform {
                    handle: world.add_carrier(&def),
                    start: def.pose(),
                    translation: Vec3::new(3.0, 0.5, 0.0),
                    rotation: Vec3::new(0.0, 0.6, 0.0),
                    frequency: 1.0,
                };
                Scene {
                    world,
                    platform: Some(platform),
                    spawn: Point3::new(1.0, 0.1 + rest_height, 0.0),
                    direction: Vec3::zeros(),
                    jump_at: None,
                }
            }
            Scenario::Slope => Scene {
                world: RapierQueryWorld::build([
                    slab(0, 0.0, 20.0, 0.0),
                    // 25 degree ramp starting near x = 3.
                    tilted_slab(1, Vector::new(5.7, 1.2, 0.0), 3.0, 25.0),
                    // 75 degree wall behind it.
                    tilted_slab(2, Vector::new(9.5, 2.5, 0.0), 3.0, 75.0),
                ]),
                platform: None,
                spawn: Point3::new(0.0, rest_height, 0.0),
                direction: Vec3::x(),
                jump_at: None,
            },
        }
    }
}

fn counter(controller: &mut Controller<ColliderHandle>, channel: Channel) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    controller.subscribe(channel, move || {
        c.fetch_add(1, Ordering::Relaxed);
    });
    count
}

/// Run `scenario` for `ticks` fixed steps at `hz`.
pub fn run(
    scenario: Scenario,
    config: ControllerConfig,
    hz: f32,
    ticks: u32,
) -> anyhow::Result<Report> {
    ensure!(hz.is_finite() && hz > 0.0, "tick rate must be positive, got {hz}");
    let dt = 1.0 / hz;

    let mut controller = Controller::new(config)?;
    let grounded = counter(&mut controller, Channel::BecameGrounded);
    let ungrounded = counter(&mut controller, Channel::BecameUngrounded);

    let capsule = config.capsule;
    let rest_height =
        capsule.half_height + capsule.radius + config.cast.cast_margin - capsule.center.y;
    let Scene {
        mut world,
        platform,
        spawn,
        direction,
        jump_at,
    } = Scene::build(scenario, rest_height);
    let mut body = KinematicBody::new(spawn, capsule);
    let mut walker = Walker::new(WalkerSettings::default());
    info!("running {scenario:?} for {ticks} ticks at {hz} Hz");

    let mut report = Report {
        max_height: body.position.y,
        ..Report::default()
    };
    let mask = config.cast.layer_mask;
    for tick in 0..ticks {
        let t = tick as f32 * dt;
        if let Some(platform) = &platform {
            platform.drive(&mut world, t);
        }

        walker.input = WalkInput {
            direction,
            jump: jump_at == Some(tick),
        };
        if let Some(transition) = controller.tick(&world, &mut body, dt, &mut walker) {
            debug!("tick {tick}: {transition:?} at {:?}", body.position.coords);
        }
        body.integrate(&world, mask, dt);

        if controller.last_grounded() {
            report.grounded_ticks += 1;
            let up = controller.up(&body.rotation).into_inner();
            let tilt = controller.ground().normal.into_inner().dot(&up).clamp(-1.0, 1.0);
            report.steepest_ground_degrees = report.steepest_ground_degrees.max(tilt.acos().to_degrees());
        }
        report.max_height = report.max_height.max(body.position.y);
    }

    report.ticks = ticks;
    report.grounded_events = grounded.load(Ordering::Relaxed);
    report.ungrounded_events = ungrounded.load(Ordering::Relaxed);
    report.jumps = walker.jumps();
    report.final_position = body.position.coords;
    Ok(report)
}
