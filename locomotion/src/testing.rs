//! Analytic collision world for unit tests.
//!
//! Infinite planes only, so every sweep and ray has an exact closed-form answer.
//! A plane may be attached to a carrier moving at a constant linear velocity.

use crate::{
    backend::{BodyControl, CollisionWorld},
    layers::LayerMask,
    types::{CapsuleSweep, Point3, Quat, SurfaceHit, UnitVec3, Vec3},
};

/// Carrier handle used by [`PlaneWorld`].
pub type CarrierId = u32;

#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub normal: UnitVec3,
    /// Plane offset along the normal: `normal ⋅ x = dist`.
    pub dist: f32,
    pub layers: u32,
    pub carrier: Option<(CarrierId, Vec3)>,
}

impl Plane {
    pub fn through(point: Point3, normal: Vec3) -> Self {
        let normal = UnitVec3::new_normalize(normal);
        Self {
            normal,
            dist: normal.dot(&point.coords),
            layers: 1,
            carrier: None,
        }
    }

    pub fn on_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }

    pub fn carried_by(mut self, id: CarrierId, velocity: Vec3) -> Self {
        self.carrier = Some((id, velocity));
        self
    }

    fn signed_distance(&self, p: &Point3) -> f32 {
        self.normal.dot(&p.coords) - self.dist
    }
}

#[derive(Clone, Debug, Default)]
pub struct PlaneWorld {
    pub planes: Vec<Plane>,
}

impl PlaneWorld {
    pub fn new(planes: Vec<Plane>) -> Self {
        Self { planes }
    }

    /// Move every plane of a carrier by its velocity.
    pub fn advance(&mut self, dt: f32) {
        for plane in &mut self.planes {
            if let Some((_, velocity)) = plane.carrier {
                plane.dist += plane.normal.dot(&(velocity * dt));
            }
        }
    }
}

/// Horizontal floor through the origin.
pub fn flat_floor() -> PlaneWorld {
    PlaneWorld::new(vec![Plane::through(Point3::origin(), Vec3::y())])
}

/// Floor through the origin tilted `degrees` around +Z.
pub fn slope(degrees: f32) -> PlaneWorld {
    let angle = degrees.to_radians();
    let normal = Vec3::new(-angle.sin(), angle.cos(), 0.0);
    PlaneWorld::new(vec![Plane::through(Point3::origin(), normal)])
}

impl CollisionWorld for PlaneWorld {
    type Body = CarrierId;

    fn sweep_capsule(&self, sweep: &CapsuleSweep, mask: LayerMask) -> Option<SurfaceHit<CarrierId>> {
        let mut best: Option<SurfaceHit<CarrierId>> = None;
        for plane in self.planes.iter().filter(|p| mask.accepts(p.layers)) {
            let (sa, sb) = (plane.signed_distance(&sweep.a), plane.signed_distance(&sweep.b));
            let (closest, gap) = if sa <= sb { (sweep.a, sa) } else { (sweep.b, sb) };
            let gap = gap - sweep.radius;
            let approach = -plane.normal.dot(&sweep.direction.into_inner());

            let distance = if gap <= 0.0 {
                0.0
            } else if approach > 0.0 && gap / approach <= sweep.max_distance {
                gap / approach
            } else {
                continue;
            };

            if best.as_ref().map_or(true, |b| distance < b.distance) {
                let point = closest + sweep.direction.into_inner() * distance
                    - plane.normal.into_inner() * sweep.radius;
                best = Some(SurfaceHit {
                    point,
                    normal: plane.normal,
                    distance,
                    body: plane.carrier.map(|(id, _)| id),
                });
            }
        }
        best
    }

    fn raycast(
        &self,
        origin: Point3,
        direction: UnitVec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<SurfaceHit<CarrierId>> {
        let mut best: Option<SurfaceHit<CarrierId>> = None;
        for plane in self.planes.iter().filter(|p| mask.accepts(p.layers)) {
            let height = plane.signed_distance(&origin);
            let approach = -plane.normal.dot(&direction.into_inner());
            if height < 0.0 || approach <= 0.0 {
                continue;
            }
            let distance = height / approach;
            if distance > max_distance {
                continue;
            }
            if best.as_ref().map_or(true, |b| distance < b.distance) {
                best = Some(SurfaceHit {
                    point: origin + direction.into_inner() * distance,
                    normal: plane.normal,
                    distance,
                    body: plane.carrier.map(|(id, _)| id),
                });
            }
        }
        best
    }

    fn point_velocity(&self, body: CarrierId, _point: &Point3) -> Vec3 {
        self.planes
            .iter()
            .find_map(|p| p.carrier.filter(|(id, _)| *id == body).map(|(_, v)| v))
            .unwrap_or_else(Vec3::zeros)
    }
}

/// Body that records corrections without any collision response.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TestBody {
    pub position: Point3,
    pub rotation: Quat,
    pub velocity: Vec3,
}

impl TestBody {
    pub fn at(position: Point3) -> Self {
        Self {
            position,
            rotation: Quat::identity(),
            velocity: Vec3::zeros(),
        }
    }

    pub fn moving(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }
}

impl BodyControl for TestBody {
    fn position(&self) -> Point3 {
        self.position
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn move_position_by(&mut self, delta: Vec3) {
        self.position += delta;
    }
}
