//! Ray picking against the scene graph.
//!
//! A ray is cast from the camera through an NDC pointer position and tested
//! against every entity's shape in that entity's local space, so rotation and
//! non-uniform scale are honoured. Hits come back nearest first.

use crate::render::camera::PerspectiveCamera;
use crate::scene::{Entity, EntityId, SceneGraph, Shape};
use glam::{Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Ray from the camera position through `ndc`. Positions outside
    /// `[-1, 1]` still produce a well-formed ray.
    pub fn from_ndc(ndc: Vec2, camera: &PerspectiveCamera) -> Self {
        let origin = camera.position;
        let through = camera.unproject(ndc.extend(0.5));
        let direction = (through - origin).try_normalize().unwrap_or(Vec3::NEG_Z);
        Self { origin, direction }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub entity: EntityId,
    pub point: Vec3,
    pub distance: f32,
}

/// Stateless picking over a scene snapshot.
pub struct PickingService;

impl PickingService {
    pub fn pick(ndc: Vec2, camera: &PerspectiveCamera, scene: &SceneGraph) -> Vec<PickHit> {
        Self::cast(&Ray::from_ndc(ndc, camera), scene)
    }

    pub fn cast(ray: &Ray, scene: &SceneGraph) -> Vec<PickHit> {
        let mut hits: Vec<PickHit> = scene
            .entities()
            .iter()
            .filter_map(|entity| intersect_entity(ray, entity))
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        log::trace!("pick: {} hits", hits.len());
        hits
    }
}

fn intersect_entity(ray: &Ray, entity: &Entity) -> Option<PickHit> {
    let world = entity.transform.matrix();
    if world.determinant().abs() <= f32::EPSILON {
        return None;
    }
    let to_local = world.inverse();
    let local_origin = to_local.transform_point3(ray.origin);
    let local_dir = to_local.transform_vector3(ray.direction);

    let t_local = match entity.renderable.shape {
        Shape::Box { size } => ray_box(local_origin, local_dir, size * 0.5)?,
        Shape::Sphere { radius } => ray_sphere(local_origin, local_dir, radius)?,
    };
    let point = world.transform_point3(local_origin + local_dir * t_local);
    let distance = (point - ray.origin).length();
    Some(PickHit {
        entity: entity.id(),
        point,
        distance,
    })
}

/// Slab test against an origin-centered box. Returns the entry parameter, or
/// the exit parameter when the ray starts inside.
fn ray_box(origin: Vec3, dir: Vec3, half: Vec3) -> Option<f32> {
    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;

    for i in 0..3 {
        if dir[i].abs() < 1e-8 {
            if origin[i] < -half[i] || origin[i] > half[i] {
                return None;
            }
        } else {
            let inv_d = 1.0 / dir[i];
            let mut t1 = (-half[i] - origin[i]) * inv_d;
            let mut t2 = (half[i] - origin[i]) * inv_d;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            tmin = tmin.max(t1);
            tmax = tmax.min(t2);
            if tmin > tmax {
                return None;
            }
        }
    }

    if tmax < 0.0 {
        None
    } else if tmin >= 0.0 {
        Some(tmin)
    } else {
        Some(tmax)
    }
}

fn ray_sphere(origin: Vec3, dir: Vec3, radius: f32) -> Option<f32> {
    let a = dir.length_squared();
    if a <= f32::EPSILON {
        return None;
    }
    let b = 2.0 * origin.dot(dir);
    let c = origin.length_squared() - radius * radius;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let near = (-b - sqrt_disc) / (2.0 * a);
    let far = (-b + sqrt_disc) / (2.0 * a);
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        Some(far)
    } else {
        None
    }
}
