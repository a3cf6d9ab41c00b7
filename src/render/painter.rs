//! CPU scene painter.
//!
//! Entities are split into world-space quads, back faces are culled, each
//! quad is flat-shaded from the scene lights and the survivors are sorted
//! far to near and emitted as egui shapes. Light helper wireframes are drawn
//! on top. The output is tessellated and presented by the surface renderer.

use crate::render::camera::PerspectiveCamera;
use crate::render::light_helpers::helper_glyphs;
use crate::scene::{Color, Entity, Light, LightKind, Material, SceneGraph, Shape};
use egui::epaint::ClippedShape;
use egui::{Color32, Pos2, Rect, Shape as EguiShape, Stroke};
use glam::{Mat4, Vec3};
use std::f32::consts::{PI, TAU};

/// Longest world-space edge of a box tile; large faces are split so depth
/// sorting stays local.
const TILE_EDGE: f32 = 1.0;
const MAX_TILES_PER_AXIS: usize = 16;
const SPHERE_SLICES: usize = 16;
const SPHERE_STACKS: usize = 10;

#[derive(Debug, Clone, Copy)]
struct Quad {
    corners: [Vec3; 4],
    normal: Vec3,
    center: Vec3,
}

struct PaintedFace {
    depth: f32,
    points: Vec<Pos2>,
    fill: Color32,
}

#[derive(Debug, Clone)]
pub struct ScenePainter {
    pub helper_stroke: f32,
}

impl Default for ScenePainter {
    fn default() -> Self {
        Self { helper_stroke: 1.5 }
    }
}

impl ScenePainter {
    /// Shapes for one frame, in draw order, laid out over `viewport` (points).
    pub fn paint(&self, scene: &SceneGraph, camera: &PerspectiveCamera, viewport: Rect) -> Vec<EguiShape> {
        let mut faces = Vec::new();
        for entity in scene.entities() {
            if !entity.renderable.material.visible {
                continue;
            }
            for quad in entity_quads(entity) {
                if (camera.position - quad.center).dot(quad.normal) <= 0.0 {
                    continue;
                }
                let Some(points) = project_all(camera, &quad.corners, viewport) else {
                    continue;
                };
                let color = shade(&entity.renderable.material, quad.center, quad.normal, scene.lights());
                faces.push(PaintedFace {
                    depth: camera.view_depth(quad.center),
                    points,
                    fill: to_color32(color),
                });
            }
        }
        faces.sort_by(|a, b| b.depth.total_cmp(&a.depth));

        let mut shapes: Vec<EguiShape> = faces
            .into_iter()
            .map(|face| EguiShape::convex_polygon(face.points, face.fill, Stroke::NONE))
            .collect();

        for glyph in helper_glyphs(scene.lights()) {
            let stroke = Stroke::new(self.helper_stroke, to_color32(glyph.tint));
            for segment in glyph.segments {
                if let Some(points) = project_all(camera, &[segment.from, segment.to], viewport) {
                    shapes.push(EguiShape::line_segment([points[0], points[1]], stroke));
                }
            }
        }
        shapes
    }

    pub fn paint_clipped(
        &self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        viewport: Rect,
    ) -> Vec<ClippedShape> {
        self.paint(scene, camera, viewport)
            .into_iter()
            .map(|shape| ClippedShape {
                clip_rect: viewport,
                shape,
            })
            .collect()
    }
}

fn to_color32(color: Color) -> Color32 {
    let [r, g, b] = color.to_bytes();
    Color32::from_rgb(r, g, b)
}

fn ndc_to_screen(ndc: Vec3, viewport: Rect) -> Pos2 {
    Pos2::new(
        viewport.left() + (ndc.x + 1.0) * 0.5 * viewport.width(),
        viewport.top() + (1.0 - ndc.y) * 0.5 * viewport.height(),
    )
}

/// `None` when any point falls outside the depth range.
fn project_all(camera: &PerspectiveCamera, points: &[Vec3], viewport: Rect) -> Option<Vec<Pos2>> {
    points
        .iter()
        .map(|&point| {
            let ndc = camera.project(point)?;
            (-1.0..=1.0)
                .contains(&ndc.z)
                .then(|| ndc_to_screen(ndc, viewport))
        })
        .collect()
}

fn entity_quads(entity: &Entity) -> Vec<Quad> {
    let world = entity.transform.matrix();
    match entity.renderable.shape {
        Shape::Box { size } => box_quads(size, &world),
        Shape::Sphere { radius } => sphere_quads(radius, &world),
    }
}

fn tiles_along(world: &Mat4, local_edge: Vec3) -> usize {
    let length = world.transform_vector3(local_edge).length();
    ((length / TILE_EDGE).ceil() as usize).clamp(1, MAX_TILES_PER_AXIS)
}

fn box_quads(size: Vec3, world: &Mat4) -> Vec<Quad> {
    let half = size * 0.5;
    let mut quads = Vec::new();
    for axis in 0..3 {
        let ua = (axis + 1) % 3;
        let va = (axis + 2) % 3;
        let nu = tiles_along(world, Vec3::AXES[ua] * size[ua]);
        let nv = tiles_along(world, Vec3::AXES[va] * size[va]);
        for sign in [-1.0f32, 1.0] {
            let normal = world
                .transform_vector3(Vec3::AXES[axis] * sign)
                .normalize_or_zero();
            let local = |u: f32, v: f32| {
                let mut p = Vec3::ZERO;
                p[axis] = sign * half[axis];
                p[ua] = -half[ua] + size[ua] * u;
                p[va] = -half[va] + size[va] * v;
                world.transform_point3(p)
            };
            for i in 0..nu {
                for j in 0..nv {
                    let (u0, u1) = (i as f32 / nu as f32, (i + 1) as f32 / nu as f32);
                    let (v0, v1) = (j as f32 / nv as f32, (j + 1) as f32 / nv as f32);
                    let corners = [local(u0, v0), local(u1, v0), local(u1, v1), local(u0, v1)];
                    quads.push(Quad {
                        corners,
                        normal,
                        center: corners.iter().copied().sum::<Vec3>() * 0.25,
                    });
                }
            }
        }
    }
    quads
}

fn sphere_quads(radius: f32, world: &Mat4) -> Vec<Quad> {
    let origin = world.transform_point3(Vec3::ZERO);
    let point = |slice: usize, stack: usize| {
        let theta = slice as f32 / SPHERE_SLICES as f32 * TAU;
        let phi = stack as f32 / SPHERE_STACKS as f32 * PI;
        let local = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()) * radius;
        world.transform_point3(local)
    };
    let mut quads = Vec::with_capacity(SPHERE_SLICES * SPHERE_STACKS);
    for stack in 0..SPHERE_STACKS {
        for slice in 0..SPHERE_SLICES {
            let corners = [
                point(slice, stack),
                point(slice + 1, stack),
                point(slice + 1, stack + 1),
                point(slice, stack + 1),
            ];
            let center = corners.iter().copied().sum::<Vec3>() * 0.25;
            quads.push(Quad {
                corners,
                normal: (center - origin).normalize_or_zero(),
                center,
            });
        }
    }
    quads
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x >= edge0 { 1.0 } else { 0.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn falloff(distance: f32, range: f32, decay: f32) -> f32 {
    if range <= 0.0 || decay <= 0.0 {
        return 1.0;
    }
    (1.0 - distance / range).clamp(0.0, 1.0).powf(decay)
}

/// Flat Lambert shading: ambient plus diffuse from every visible light,
/// then emissive.
fn shade(material: &Material, point: Vec3, normal: Vec3, lights: &[Light]) -> Color {
    let mut lit = Vec3::ZERO;
    for light in lights.iter().filter(|light| light.visible) {
        let radiance = light.color.to_vec3() * light.intensity;
        match light.kind {
            LightKind::Ambient => lit += radiance,
            LightKind::Directional => {
                lit += radiance * normal.dot(-light.direction()).max(0.0);
            }
            LightKind::Spot {
                angle,
                distance,
                penumbra,
                decay,
            } => {
                let to_light = light.position - point;
                let d = to_light.length();
                if d <= f32::EPSILON {
                    continue;
                }
                let l = to_light / d;
                let cone = smoothstep(
                    angle.cos(),
                    (angle * (1.0 - penumbra)).cos(),
                    (-l).dot(light.direction()),
                );
                lit += radiance * normal.dot(l).max(0.0) * cone * falloff(d, distance, decay);
            }
            LightKind::Point { distance, decay } => {
                let to_light = light.position - point;
                let d = to_light.length();
                if d <= f32::EPSILON {
                    continue;
                }
                lit += radiance * normal.dot(to_light / d).max(0.0) * falloff(d, distance, decay);
            }
        }
    }
    let rgb = (material.color.to_vec3() * lit + material.emissive.to_vec3()).clamp(Vec3::ZERO, Vec3::ONE);
    Color::rgb(rgb.x, rgb.y, rgb.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{setup, NewEntity};
    use egui::vec2;

    fn camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(45.0, 1.0, 1.0, 1000.0);
        camera.position = Vec3::new(0.0, 0.0, 16.0);
        camera
    }

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(800.0, 800.0))
    }

    fn polygons(shapes: &[EguiShape]) -> usize {
        shapes
            .iter()
            .filter(|shape| matches!(shape, EguiShape::Path(_)))
            .count()
    }

    #[test]
    fn only_front_face_of_a_facing_cube_is_painted() {
        let mut scene = SceneGraph::new();
        scene
            .insert(NewEntity::new("cube", Shape::cube(1.0), Color::WHITE))
            .unwrap();
        let shapes = ScenePainter::default().paint(&scene, &camera(), viewport());
        assert_eq!(polygons(&shapes), 1);
    }

    #[test]
    fn hidden_entities_are_skipped() {
        let mut scene = SceneGraph::new();
        setup::populate(&mut scene).unwrap();
        let painter = ScenePainter::default();
        let before = painter.paint(&scene, &camera(), viewport()).len();
        assert!(before > 0);
        let id = scene.find_entity("BOX2").map(Entity::id).unwrap();
        scene.entity_mut(id).unwrap().renderable.material.visible = false;
        let after = painter.paint(&scene, &camera(), viewport()).len();
        assert!(after < before);
    }

    #[test]
    fn ambient_and_emissive_add_up() {
        let mut scene = SceneGraph::new();
        scene.add_light(Light::ambient("al", Color::WHITE, 0.5));
        let mut material = Material::phong(Color::rgb(1.0, 0.0, 0.0));
        let color = shade(&material, Vec3::ZERO, Vec3::Y, scene.lights());
        assert!((color.r - 0.5).abs() < 1e-6);
        assert_eq!(color.g, 0.0);

        material.emissive = Color::rgb(0.0, 0.25, 0.0);
        let color = shade(&material, Vec3::ZERO, Vec3::Y, scene.lights());
        assert!((color.g - 0.25).abs() < 1e-6);
    }

    #[test]
    fn spot_light_only_reaches_inside_its_cone() {
        let mut scene = SceneGraph::new();
        let mut spot = Light::spot("spot", Color::WHITE, 1.0, Vec3::new(0.0, 4.0, 0.0), 0.0, PI / 8.0);
        spot.target = Vec3::ZERO;
        scene.add_light(spot);
        let material = Material::phong(Color::WHITE);
        let under = shade(&material, Vec3::ZERO, Vec3::Y, scene.lights());
        let aside = shade(&material, Vec3::new(4.0, 0.0, 0.0), Vec3::Y, scene.lights());
        assert!(under.r > 0.9);
        assert_eq!(aside.r, 0.0);
    }

    #[test]
    fn large_faces_are_tiled() {
        let world = Mat4::from_scale(Vec3::new(8.0, 0.5, 8.0));
        let quads = box_quads(Vec3::ONE, &world);
        // top and bottom 8x8, four sides 8x1
        assert_eq!(quads.len(), 2 * 64 + 4 * 8);
    }
}
