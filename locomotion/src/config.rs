//! Controller configuration.
//!
//! Everything here is set once at construction and read-only afterwards. Invalid
//! combinations are rejected by [`ControllerConfig::validate`], which
//! [`GroundProbe::new`](crate::ground::GroundProbe::new) calls, so a running probe
//! never has to second-guess its own parameters.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        DEFAULT_CAST_MARGIN, DEFAULT_GROUND_DISTANCE, DEFAULT_GROUND_DOT, DEFAULT_STEP_HEIGHT,
        GRAVITY_MPS2,
    },
    error::ConfigError,
    layers::LayerMask,
    types::{CapsuleShape, Quat, UnitVec3, Vec3},
};

/// Parameters of the shape-cast sequence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CastConfig {
    /// Layers considered by every cast.
    pub layer_mask: LayerMask,
    /// Distance to cast below the capsule for ground.
    pub ground_distance: f32,
    /// Clearance probed by the step cast.
    ///
    /// `None` folds step clearance into `ground_distance`: the probe then only climbs
    /// discontinuities shorter than the ground search depth.
    pub step_height: Option<f32>,
    /// Skin added to every cast and subtracted from every hit.
    pub cast_margin: f32,
    /// Minimum dot product between a surface normal and "up" for the surface to be ground.
    pub ground_dot: f32,
}

impl Default for CastConfig {
    fn default() -> Self {
        Self {
            layer_mask: LayerMask::all(),
            ground_distance: DEFAULT_GROUND_DISTANCE,
            step_height: Some(DEFAULT_STEP_HEIGHT),
            cast_margin: DEFAULT_CAST_MARGIN,
            ground_dot: DEFAULT_GROUND_DOT,
        }
    }
}

impl CastConfig {
    /// Height used by the up and down phases of the step cast.
    #[inline]
    pub fn step_clearance(&self) -> f32 {
        self.step_height.unwrap_or(self.ground_distance)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cast_margin > 0.0) {
            return Err(ConfigError::NonPositiveMargin(self.cast_margin));
        }
        if !(self.cast_margin < self.ground_distance) {
            return Err(ConfigError::MarginNotBelowGroundDistance {
                margin: self.cast_margin,
                ground_distance: self.ground_distance,
            });
        }
        if !(0.0..=1.0).contains(&self.ground_dot) {
            return Err(ConfigError::GroundDotOutOfRange(self.ground_dot));
        }
        if let Some(step) = self.step_height {
            if !(step > 0.0) {
                return Err(ConfigError::NonPositiveStepHeight(step));
            }
        }
        Ok(())
    }
}

/// Where gravity comes from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GravityMode {
    /// A fixed world-space acceleration.
    World { vector: Vec3 },
    /// `magnitude` along the body's local down axis (`-(rotation * +Y)`).
    ///
    /// Lets a body stand on walls or planet surfaces by rotating it.
    BodyLocal { magnitude: f32 },
}

impl Default for GravityMode {
    fn default() -> Self {
        GravityMode::World {
            vector: Vec3::new(0.0, -GRAVITY_MPS2, 0.0),
        }
    }
}

impl GravityMode {
    /// Gravity acceleration for a body with the given orientation.
    #[inline]
    pub fn vector(&self, rotation: &Quat) -> Vec3 {
        match *self {
            GravityMode::World { vector } => vector,
            GravityMode::BodyLocal { magnitude } => -(rotation * Vec3::y()) * magnitude,
        }
    }

    /// Unit "up": the negated gravity direction.
    ///
    /// Falls back to the body's local up if gravity has no direction, which a validated
    /// configuration never produces.
    #[inline]
    pub fn up(&self, rotation: &Quat) -> UnitVec3 {
        UnitVec3::try_new(-self.vector(rotation), f32::EPSILON)
            .unwrap_or_else(|| rotation * Vec3::y_axis())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let magnitude = match *self {
            GravityMode::World { vector } => vector.norm(),
            GravityMode::BodyLocal { magnitude } => magnitude,
        };
        if magnitude.is_finite() && magnitude > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::ZeroGravity)
        }
    }
}

/// Axis used to split velocity into "along the ground" and "into the ground".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    /// Project against the contact normal. Correct on slopes and tilted platforms.
    #[default]
    GroundNormal,
    /// Project against "up" regardless of the contact. Only exact on flat ground.
    WorldHorizontal,
}

/// Full configuration of one controlled body.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub capsule: CapsuleShape,
    #[serde(default)]
    pub cast: CastConfig,
    #[serde(default)]
    pub gravity: GravityMode,
    #[serde(default)]
    pub projection: ProjectionMode,
}

impl ControllerConfig {
    pub fn new(capsule: CapsuleShape) -> Self {
        Self {
            capsule,
            cast: CastConfig::default(),
            gravity: GravityMode::default(),
            projection: ProjectionMode::default(),
        }
    }

    pub fn with_cast(mut self, cast: CastConfig) -> Self {
        self.cast = cast;
        self
    }

    pub fn with_gravity(mut self, gravity: GravityMode) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_projection(mut self, projection: ProjectionMode) -> Self {
        self.projection = projection;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let result = self
            .validate_capsule()
            .and_then(|_| self.cast.validate())
            .and_then(|_| self.gravity.validate());
        if let Err(err) = &result {
            warn!("rejecting controller config: {err}");
        }
        result
    }

    fn validate_capsule(&self) -> Result<(), ConfigError> {
        let CapsuleShape {
            radius,
            half_height,
            ..
        } = self.capsule;
        if radius > 0.0 && half_height >= 0.0 && radius.is_finite() && half_height.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::DegenerateCapsule {
                radius,
                half_height,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn capsule() -> CapsuleShape {
        CapsuleShape::new(0.5, 0.3)
    }

    #[test]
    fn defaults_are_valid() {
        assert_eq!(ControllerConfig::new(capsule()).validate(), Ok(()));
    }

    #[rstest]
    #[case(0.0, ConfigError::NonPositiveMargin(0.0))]
    #[case(-0.01, ConfigError::NonPositiveMargin(-0.01))]
    #[case(0.05, ConfigError::MarginNotBelowGroundDistance { margin: 0.05, ground_distance: 0.05 })]
    #[case(0.2, ConfigError::MarginNotBelowGroundDistance { margin: 0.2, ground_distance: 0.05 })]
    fn margin_must_be_positive_and_below_ground_distance(
        #[case] margin: f32,
        #[case] expected: ConfigError,
    ) {
        let cast = CastConfig {
            cast_margin: margin,
            ..CastConfig::default()
        };
        assert_eq!(
            ControllerConfig::new(capsule()).with_cast(cast).validate(),
            Err(expected)
        );
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.5)]
    #[case(f32::NAN)]
    fn ground_dot_outside_unit_range_is_rejected(#[case] dot: f32) {
        let cast = CastConfig {
            ground_dot: dot,
            ..CastConfig::default()
        };
        assert!(matches!(
            cast.validate(),
            Err(ConfigError::GroundDotOutOfRange(_))
        ));
    }

    #[test]
    fn ground_dot_bounds_are_inclusive() {
        for dot in [0.0, 1.0] {
            let cast = CastConfig {
                ground_dot: dot,
                ..CastConfig::default()
            };
            assert_eq!(cast.validate(), Ok(()));
        }
    }

    #[test]
    fn degenerate_capsule_is_rejected() {
        let config = ControllerConfig::new(CapsuleShape::new(0.5, 0.0));
        assert_eq!(
            config.validate(),
            Err(ConfigError::DegenerateCapsule {
                radius: 0.0,
                half_height: 0.5
            })
        );
        // A sphere (zero half height) is a valid capsule.
        assert_eq!(
            ControllerConfig::new(CapsuleShape::new(0.0, 0.5)).validate(),
            Ok(())
        );
    }

    #[test]
    fn zero_gravity_is_rejected() {
        let world = ControllerConfig::new(capsule()).with_gravity(GravityMode::World {
            vector: Vec3::zeros(),
        });
        assert_eq!(world.validate(), Err(ConfigError::ZeroGravity));

        let local = ControllerConfig::new(capsule())
            .with_gravity(GravityMode::BodyLocal { magnitude: 0.0 });
        assert_eq!(local.validate(), Err(ConfigError::ZeroGravity));
    }

    #[test]
    fn non_positive_step_height_is_rejected() {
        let cast = CastConfig {
            step_height: Some(0.0),
            ..CastConfig::default()
        };
        assert_eq!(cast.validate(), Err(ConfigError::NonPositiveStepHeight(0.0)));
    }

    #[test]
    fn folded_step_height_uses_ground_distance() {
        let cast = CastConfig {
            step_height: None,
            ..CastConfig::default()
        };
        assert_relative_eq!(cast.step_clearance(), DEFAULT_GROUND_DISTANCE);
        assert_relative_eq!(CastConfig::default().step_clearance(), DEFAULT_STEP_HEIGHT);
    }

    #[test]
    fn body_local_gravity_follows_orientation() {
        let gravity = GravityMode::BodyLocal { magnitude: 9.81 };
        let tilted = Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::FRAC_PI_2);

        let g = gravity.vector(&tilted);
        assert_relative_eq!(g, Vec3::new(0.0, 0.0, -9.81), epsilon = 1.0e-5);
        assert_relative_eq!(
            gravity.up(&tilted).into_inner(),
            Vec3::new(0.0, 0.0, 1.0),
            epsilon = 1.0e-5
        );
    }

    #[test]
    fn config_loads_from_json_with_defaults() {
        let json = r#"{
            "capsule": { "center": [0.0, 0.0, 0.0], "half_height": 0.5, "radius": 0.3 },
            "cast": { "ground_distance": 0.1, "step_height": null },
            "gravity": { "mode": "body_local", "magnitude": 20.0 },
            "projection": "world_horizontal"
        }"#;

        let config: ControllerConfig = serde_json::from_str(json).unwrap();
        assert_relative_eq!(config.cast.ground_distance, 0.1);
        assert_eq!(config.cast.step_height, None);
        assert_relative_eq!(config.cast.cast_margin, DEFAULT_CAST_MARGIN);
        assert_eq!(config.gravity, GravityMode::BodyLocal { magnitude: 20.0 });
        assert_eq!(config.projection, ProjectionMode::WorldHorizontal);
        assert_eq!(config.validate(), Ok(()));
    }
}
