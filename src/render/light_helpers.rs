use crate::scene::{Color, Light, LightHelper, LightKind};
use glam::Vec3;
use std::f32::consts::TAU;

const CONE_RAYS: usize = 8;
const RIM_SEGMENTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HelperSegment {
    pub from: Vec3,
    pub to: Vec3,
}

/// World-space wireframe for one light's helper.
#[derive(Debug, Clone)]
pub struct HelperGlyph {
    pub tint: Color,
    pub segments: Vec<HelperSegment>,
}

/// Wireframes for every light whose helper is visible.
pub fn helper_glyphs(lights: &[Light]) -> Vec<HelperGlyph> {
    lights.iter().filter_map(helper_glyph).collect()
}

pub fn helper_glyph(light: &Light) -> Option<HelperGlyph> {
    let helper = light.helper.as_ref().filter(|helper| helper.visible)?;
    let segments = match light.kind {
        LightKind::Ambient => return None,
        LightKind::Directional => plane_and_line(helper),
        LightKind::Spot { .. } => cone(helper),
        LightKind::Point { .. } => octahedron(helper.origin, helper.radius),
    };
    Some(HelperGlyph {
        tint: light_kind_tint(&light.kind, light.color),
        segments,
    })
}

fn light_kind_tint(kind: &LightKind, color: Color) -> Color {
    let base = match kind {
        LightKind::Ambient => return color,
        LightKind::Directional => [1.0, 0.92, 0.50],
        LightKind::Spot { .. } => [0.95, 0.65, 0.40],
        LightKind::Point { .. } => [0.45, 0.90, 1.0],
    };
    // Lean toward the light's own color so edited colors show up on the glyph.
    Color::rgb(
        (base[0] + color.r) * 0.5,
        (base[1] + color.g) * 0.5,
        (base[2] + color.b) * 0.5,
    )
}

fn segment(from: Vec3, to: Vec3) -> HelperSegment {
    HelperSegment { from, to }
}

fn ring(center: Vec3, axis: Vec3, radius: f32, count: usize) -> Vec<Vec3> {
    let (u, v) = axis.any_orthonormal_pair();
    (0..count)
        .map(|i| {
            let t = (i as f32 / count as f32) * TAU;
            center + (u * t.cos() + v * t.sin()) * radius
        })
        .collect()
}

fn closed_loop(points: &[Vec3], out: &mut Vec<HelperSegment>) {
    for (i, &point) in points.iter().enumerate() {
        out.push(segment(point, points[(i + 1) % points.len()]));
    }
}

fn plane_and_line(helper: &LightHelper) -> Vec<HelperSegment> {
    let (u, v) = helper.direction.any_orthonormal_pair();
    let half = helper.size * 0.5;
    let corners = [
        helper.origin + (u + v) * half,
        helper.origin + (u - v) * half,
        helper.origin - (u + v) * half,
        helper.origin + (v - u) * half,
    ];
    let mut out = Vec::with_capacity(5);
    closed_loop(&corners, &mut out);
    out.push(segment(
        helper.origin,
        helper.origin + helper.direction * helper.length,
    ));
    out
}

fn cone(helper: &LightHelper) -> Vec<HelperSegment> {
    let base = helper.origin + helper.direction * helper.length;
    let rim = ring(base, helper.direction, helper.radius, RIM_SEGMENTS);
    let mut out = Vec::with_capacity(RIM_SEGMENTS + CONE_RAYS);
    closed_loop(&rim, &mut out);
    let stride = RIM_SEGMENTS / CONE_RAYS;
    for point in rim.iter().step_by(stride) {
        out.push(segment(helper.origin, *point));
    }
    out
}

fn octahedron(center: Vec3, radius: f32) -> Vec<HelperSegment> {
    let tips = [
        Vec3::Y,
        Vec3::NEG_Y,
        Vec3::X,
        Vec3::NEG_X,
        Vec3::Z,
        Vec3::NEG_Z,
    ]
    .map(|axis| center + axis * radius);
    let equator = [tips[2], tips[4], tips[3], tips[5]];
    let mut out = Vec::with_capacity(12);
    closed_loop(&equator, &mut out);
    for point in equator {
        out.push(segment(tips[0], point));
        out.push(segment(tips[1], point));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneGraph;
    use std::f32::consts::PI;

    #[test]
    fn spot_cone_reaches_the_rim() {
        let mut scene = SceneGraph::new();
        let id = scene.add_light(Light::spot(
            "spot",
            Color::WHITE,
            1.0,
            Vec3::new(0.0, 2.0, 2.0),
            8.0,
            PI / 8.0,
        ));
        let glyph = helper_glyph(scene.light(id).unwrap()).unwrap();
        let slant = (8.0f32.powi(2) + (8.0 * (PI / 8.0).tan()).powi(2)).sqrt();
        let rays: Vec<_> = glyph
            .segments
            .iter()
            .filter(|s| s.from == Vec3::new(0.0, 2.0, 2.0))
            .collect();
        assert_eq!(rays.len(), CONE_RAYS);
        for ray in rays {
            assert!(((ray.to - ray.from).length() - slant).abs() < 1e-3);
        }
    }

    #[test]
    fn point_glyph_is_a_closed_octahedron() {
        let mut scene = SceneGraph::new();
        let id = scene.add_light(Light::point("pl", Color::WHITE, 1.0, Vec3::ONE, 8.0, 2.0));
        let glyph = helper_glyph(scene.light(id).unwrap()).unwrap();
        assert_eq!(glyph.segments.len(), 12);
        for s in &glyph.segments {
            assert!(((s.from - Vec3::ONE).length() - 0.5).abs() < 1e-5);
            assert!(((s.to - Vec3::ONE).length() - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn hidden_and_ambient_lights_have_no_glyph() {
        let mut scene = SceneGraph::new();
        scene.add_light(Light::ambient("al", Color::WHITE, 0.5));
        let dl = scene.add_light(Light::directional("dl", Color::WHITE, 0.5, Vec3::new(0.0, 2.0, 2.0)));
        assert_eq!(helper_glyphs(scene.lights()).len(), 1);
        if let Some(light) = scene.light_mut(dl) {
            light.set_visible(false);
        }
        assert!(helper_glyphs(scene.lights()).is_empty());
    }
}
