//! Rapier-based collision world for the ground probe.
//!
//! Builds an in-memory, query-only Rapier scene (no dynamics) from schema-agnostic
//! collider definitions and answers the probe's sweeps and rays through a borrowed
//! `QueryPipeline`.
//!
//! Design goals
//! - Deterministic: given the same inputs (sorted by `id`), build identical in-memory sets.
//! - Query-focused: colliders are parentless; there is no rigid-body simulation here.
//! - Static geometry never moves. Carriers (moving platforms) are re-posed by the host
//!   every tick through [`RapierQueryWorld::move_carrier`], together with the velocity
//!   the probe samples for carrier compensation.

// Re-export Rapier so hosts can build definitions without depending on `rapier3d`
// directly.
pub use rapier3d;

use std::collections::HashMap;

use log::{debug, warn};
use rapier3d::na::{Translation3, UnitQuaternion};
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::parry::shape::Capsule;
use rapier3d::prelude::*;

use crate::{
    backend::CollisionWorld,
    constants::DIST_EPS,
    layers::LayerMask,
    types::{CapsuleSweep, Iso, Point3, SurfaceHit, UnitVec3, Vec3},
};

/// Canonical, schema-agnostic definition of a world collider.
///
/// Conventions
/// - Units are meters.
/// - Rotation is a unit quaternion.
/// - For planes, the normal is pose-derived: `normal = rotation * +Y`, and
///   `dist = dot(normal, translation) + offset_along_normal`.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u32,
    /// World-space translation.
    pub translation: Vector<f32>,
    /// World-space rotation (unit quaternion).
    pub rotation: UnitQuaternion<f32>,
    /// Collider shape parameters.
    pub shape: ColliderShapeDef,
    /// Collision layer membership bits, matched against a cast's [`LayerMask`].
    pub layers: u32,
}

impl WorldStaticDef {
    pub fn new(id: u32, translation: Vector<f32>, shape: ColliderShapeDef) -> Self {
        Self {
            id,
            translation,
            rotation: UnitQuaternion::identity(),
            shape,
            layers: 1,
        }
    }

    pub fn with_rotation(mut self, rotation: UnitQuaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn on_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }

    #[inline]
    pub fn pose(&self) -> Iso {
        Isometry::from_parts(Translation3::from(self.translation), self.rotation)
    }
}

/// Supported collider shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space), offset along its pose-derived normal.
    Plane {
        /// Offset along the plane normal (meters).
        offset_along_normal: f32,
    },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vector<f32> },

    /// Sphere/ball (meters).
    Sphere { radius: f32 },

    /// Y-aligned capsule (meters).
    CapsuleY { radius: f32, half_height: f32 },

    /// Y-aligned cylinder (meters).
    CylinderY { radius: f32, half_height: f32 },

    /// Rounded cuboid (meters).
    ///
    /// `border_radius` rounds all edges/corners.
    RoundCuboid {
        half_extents: Vector<f32>,
        border_radius: f32,
    },
}

/// Build a Rapier collider from a [`WorldStaticDef`].
///
/// The collider is parentless: its pose is the definition's pose. Layer membership is
/// stored in `user_data`.
pub fn collider_from_def(def: &WorldStaticDef) -> Collider {
    let mut collider = match &def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => {
            // n ⋅ x = dist, with n = R * +Y and dist = n ⋅ t + offset.
            let n = def.rotation * Vector::y();
            let dist = n.dot(&def.translation) + *offset_along_normal;
            let unit_n = UnitVector::new_normalize(n);

            // The half-space lives in collider space, so place it at `unit_n * dist`
            // with identity rotation rather than the definition's pose.
            let mut collider = ColliderBuilder::new(SharedShape::new(HalfSpace::new(unit_n))).build();
            collider.set_position(Isometry::translation(
                unit_n.x * dist,
                unit_n.y * dist,
                unit_n.z * dist,
            ));
            collider.user_data = u128::from(def.layers);
            return collider;
        }

        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).build()
        }

        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius).build(),

        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius).build(),

        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius).build(),

        ColliderShapeDef::RoundCuboid {
            half_extents,
            border_radius,
        } => ColliderBuilder::round_cuboid(
            half_extents.x,
            half_extents.y,
            half_extents.z,
            *border_radius,
        )
        .build(),
    };
    collider.set_position(def.pose());
    collider.user_data = u128::from(def.layers);
    collider
}

/// Motion of a carrier collider during the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarrierMotion {
    pub linvel: Vec3,
    pub angvel: Vec3,
    /// Rotation pivot: the collider's origin.
    pub pivot: Point3,
}

impl CarrierMotion {
    fn at_rest(pivot: Point3) -> Self {
        Self {
            linvel: Vec3::zeros(),
            angvel: Vec3::zeros(),
            pivot,
        }
    }

    /// Rigid-body velocity of the point `p`: `v + ω × (p - pivot)`.
    #[inline]
    pub fn point_velocity(&self, p: &Point3) -> Vec3 {
        self.linvel + self.angvel.cross(&(p - self.pivot))
    }
}

/// In-memory Rapier structures needed for scene queries.
///
/// This stores:
/// - `ColliderSet` with every static and carrier collider (no parents).
/// - `NarrowPhase` and `BroadPhaseBvh` used to create a borrowed `QueryPipeline`.
/// - The current motion of each carrier.
pub struct RapierQueryWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    carriers: HashMap<ColliderHandle, CarrierMotion>,
    modified: Vec<ColliderHandle>,
    params: IntegrationParameters,
}

impl RapierQueryWorld {
    /// Build a query world from a list of static collider definitions.
    ///
    /// Determinism
    /// - The input is sorted by `id` before insertion.
    /// - Any NaN/invalid values should be filtered/validated by the caller.
    pub fn build(statics: impl IntoIterator<Item = WorldStaticDef>) -> Self {
        let mut defs: Vec<_> = statics.into_iter().collect();
        defs.sort_by_key(|d| d.id);

        let mut world = Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            carriers: HashMap::new(),
            modified: Vec::new(),
            params: IntegrationParameters::default(),
        };
        for def in &defs {
            let handle = world.colliders.insert(collider_from_def(def));
            world.modified.push(handle);
        }
        world.refresh();
        debug!("built query world with {} colliders", defs.len());
        world
    }

    /// Insert a collider whose pose and velocity are driven by the host.
    pub fn add_carrier(&mut self, def: &WorldStaticDef) -> ColliderHandle {
        let handle = self.colliders.insert(collider_from_def(def));
        self.carriers
            .insert(handle, CarrierMotion::at_rest(Point3::from(def.translation)));
        self.modified.push(handle);
        self.refresh();
        handle
    }

    /// Re-pose a carrier and record its velocity for this tick.
    ///
    /// Returns `false` for a handle that is not a carrier of this world.
    pub fn move_carrier(
        &mut self,
        handle: ColliderHandle,
        pose: Iso,
        linvel: Vec3,
        angvel: Vec3,
    ) -> bool {
        let (Some(collider), Some(motion)) =
            (self.colliders.get_mut(handle), self.carriers.get_mut(&handle))
        else {
            warn!("move_carrier on unknown carrier {handle:?}");
            return false;
        };
        collider.set_position(pose);
        *motion = CarrierMotion {
            linvel,
            angvel,
            pivot: Point3::from(pose.translation.vector),
        };
        self.modified.push(handle);
        self.refresh();
        true
    }

    #[inline]
    pub fn carrier(&self, handle: ColliderHandle) -> Option<&CarrierMotion> {
        self.carriers.get(&handle)
    }

    #[inline]
    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    /// Create a borrowed `QueryPipeline` view suitable for scene queries.
    ///
    /// The returned pipeline borrows `self`, so it should be used within the scope
    /// of the borrow.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    /// Bring the broad-phase BVH up to date with modified collider poses.
    fn refresh(&mut self) {
        if self.modified.is_empty() {
            return;
        }
        let mut events = Vec::new();
        self.broad_phase.update(
            &self.params,
            &self.colliders,
            &self.bodies,
            &self.modified,
            &[],
            &mut events,
        );
        self.modified.clear();
    }

    /// Run `f` against a pipeline that only sees colliders accepted by `mask`.
    fn with_pipeline<R>(&self, mask: LayerMask, f: impl FnOnce(&QueryPipeline<'_>) -> R) -> R {
        let accepts = |_: ColliderHandle, co: &Collider| mask.accepts(co.user_data as u32);
        let pipeline = self.query_pipeline(QueryFilter::default().predicate(&accepts));
        f(&pipeline)
    }

    #[inline]
    fn carrier_of(&self, handle: ColliderHandle) -> Option<ColliderHandle> {
        self.carriers.contains_key(&handle).then_some(handle)
    }
}

impl CollisionWorld for RapierQueryWorld {
    type Body = ColliderHandle;

    fn sweep_capsule(
        &self,
        sweep: &CapsuleSweep,
        mask: LayerMask,
    ) -> Option<SurfaceHit<ColliderHandle>> {
        // Express the capsule segment around its midpoint so the shape pose is a pure
        // translation.
        let mid = Point3::from((sweep.a.coords + sweep.b.coords) * 0.5);
        let shape = Capsule::new(
            Point3::from(sweep.a - mid),
            Point3::from(sweep.b - mid),
            sweep.radius,
        );
        let pose = Isometry::translation(mid.x, mid.y, mid.z);
        let options = ShapeCastOptions {
            max_time_of_impact: sweep.max_distance,
            target_distance: 0.0,
            stop_at_penetration: true,
            compute_impact_geometry_on_penetration: true,
        };

        let (handle, hit) = self.with_pipeline(mask, |pipeline| {
            pipeline.cast_shape(&pose, &sweep.direction.into_inner(), &shape, options)
        })?;

        // Degenerate penetration geometry: fall back to facing the sweep.
        let normal = UnitVec3::try_new(hit.normal1.into_inner(), DIST_EPS)
            .filter(|n| n.iter().all(|c| c.is_finite()))
            .unwrap_or(-sweep.direction);

        Some(SurfaceHit {
            point: hit.witness1,
            normal,
            distance: hit.time_of_impact,
            body: self.carrier_of(handle),
        })
    }

    fn raycast(
        &self,
        origin: Point3,
        direction: UnitVec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<SurfaceHit<ColliderHandle>> {
        let ray = Ray::new(origin, direction.into_inner());
        let (handle, hit) = self.with_pipeline(mask, |pipeline| {
            pipeline.cast_ray_and_get_normal(&ray, max_distance, true)
        })?;

        // A ray starting inside a solid reports no usable normal.
        let normal = UnitVec3::try_new(hit.normal, DIST_EPS)?;
        Some(SurfaceHit {
            point: ray.point_at(hit.time_of_impact),
            normal,
            distance: hit.time_of_impact,
            body: self.carrier_of(handle),
        })
    }

    fn point_velocity(&self, body: ColliderHandle, point: &Point3) -> Vec3 {
        self.carriers
            .get(&body)
            .map_or_else(Vec3::zeros, |motion| motion.point_velocity(point))
    }
}
