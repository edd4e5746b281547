pub mod backend;
pub mod cast;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod events;
pub mod ground;
pub mod kinematic;
pub mod layers;
pub mod rapier_world;
pub mod state;
pub mod types;
pub mod velocity;

#[cfg(test)]
mod testing;

pub use backend::{BodyControl, CollisionWorld};
pub use cast::CapsuleCaster;
pub use config::{CastConfig, ControllerConfig, GravityMode, ProjectionMode};
pub use constants::{
    DEFAULT_CAST_MARGIN, DEFAULT_GROUND_DISTANCE, DEFAULT_GROUND_DOT, DEFAULT_STEP_HEIGHT,
    GRAVITY_MPS2,
};
pub use controller::{Controller, TickContext, TickHooks};
pub use error::ConfigError;
pub use events::{Channel, EventSink, Transition};
pub use ground::{Correction, Evaluation, GroundProbe};
pub use kinematic::{IntegrateResult, KinematicBody};
pub use layers::{CollisionLayer, LayerMask};
pub use rapier_world::{
    CarrierMotion, ColliderShapeDef, RapierQueryWorld, WorldStaticDef, collider_from_def,
};
pub use state::{GroundState, ProbeMemory};
pub use types::{BodySnapshot, CapsuleShape, CapsuleSweep, SurfaceHit};
pub use velocity::{VelocityFrame, jump_speed};
