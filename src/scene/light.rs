use super::Color;
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightId(pub(crate) u32);

impl std::fmt::Display for LightId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "light#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Ambient,
    Directional,
    Spot {
        /// Half-angle of the cone in radians.
        angle: f32,
        distance: f32,
        penumbra: f32,
        decay: f32,
    },
    Point {
        distance: f32,
        decay: f32,
    },
}

/// Debug glyph that visualizes where a light sits and where it points.
///
/// The geometry is derived from the light; call [`Light::refresh_helper`]
/// after moving or reshaping the light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightHelper {
    pub visible: bool,
    pub size: f32,
    pub origin: Vec3,
    pub direction: Vec3,
    pub length: f32,
    pub radius: f32,
}

impl LightHelper {
    fn new(size: f32) -> Self {
        Self {
            visible: true,
            size,
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Y,
            length: 0.0,
            radius: size,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Light {
    pub(crate) id: LightId,
    pub name: String,
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
    pub visible: bool,
    pub cast_shadow: bool,
    pub position: Vec3,
    pub target: Vec3,
    pub helper: Option<LightHelper>,
}

const DIRECTIONAL_HELPER_SIZE: f32 = 3.0;
const POINT_HELPER_SIZE: f32 = 0.5;
// Cone length used when a spot light has unlimited range.
const SPOT_UNBOUNDED_LENGTH: f32 = 1000.0;

impl Light {
    fn base(name: &str, kind: LightKind, color: Color, intensity: f32) -> Self {
        Self {
            id: LightId(u32::MAX),
            name: name.to_string(),
            kind,
            color,
            intensity,
            visible: true,
            cast_shadow: false,
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            helper: None,
        }
    }

    pub fn ambient(name: &str, color: Color, intensity: f32) -> Self {
        Self::base(name, LightKind::Ambient, color, intensity)
    }

    pub fn directional(name: &str, color: Color, intensity: f32, position: Vec3) -> Self {
        Self {
            position,
            helper: Some(LightHelper::new(DIRECTIONAL_HELPER_SIZE)),
            ..Self::base(name, LightKind::Directional, color, intensity)
        }
    }

    pub fn spot(
        name: &str,
        color: Color,
        intensity: f32,
        position: Vec3,
        distance: f32,
        angle: f32,
    ) -> Self {
        let kind = LightKind::Spot {
            angle,
            distance,
            penumbra: 0.0,
            decay: 2.0,
        };
        Self {
            position,
            helper: Some(LightHelper::new(1.0)),
            ..Self::base(name, kind, color, intensity)
        }
    }

    pub fn point(
        name: &str,
        color: Color,
        intensity: f32,
        position: Vec3,
        distance: f32,
        decay: f32,
    ) -> Self {
        Self {
            position,
            helper: Some(LightHelper::new(POINT_HELPER_SIZE)),
            ..Self::base(name, LightKind::Point { distance, decay }, color, intensity)
        }
    }

    pub fn id(&self) -> LightId {
        self.id
    }

    /// Toggles the light together with its helper glyph.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if let Some(helper) = &mut self.helper {
            helper.visible = visible;
        }
    }

    pub fn set_spot_angle(&mut self, value: f32) {
        if let LightKind::Spot { angle, .. } = &mut self.kind {
            *angle = value;
            self.refresh_helper();
        }
    }

    pub fn direction(&self) -> Vec3 {
        let dir = self.target - self.position;
        if dir.length_squared() <= 1e-10 {
            Vec3::NEG_Y
        } else {
            dir.normalize()
        }
    }

    pub fn refresh_helper(&mut self) {
        let direction = self.direction();
        let span = (self.target - self.position).length();
        let kind = self.kind;
        let position = self.position;
        let Some(helper) = &mut self.helper else {
            return;
        };
        helper.origin = position;
        match kind {
            LightKind::Ambient => {}
            LightKind::Directional => {
                helper.direction = direction;
                helper.length = span;
                helper.radius = helper.size * 0.5;
            }
            LightKind::Spot {
                angle, distance, ..
            } => {
                let length = if distance > 0.0 {
                    distance
                } else {
                    SPOT_UNBOUNDED_LENGTH
                };
                helper.direction = direction;
                helper.length = length;
                helper.radius = length * angle.tan();
            }
            LightKind::Point { .. } => {
                helper.direction = Vec3::ZERO;
                helper.length = 0.0;
                helper.radius = helper.size;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn spot_helper_tracks_position_and_cone() {
        let mut light = Light::spot("spot", Color::WHITE, 1.0, Vec3::new(0.0, 2.0, 2.0), 8.0, PI / 8.0);
        light.refresh_helper();
        let helper = light.helper.unwrap();
        assert_eq!(helper.origin, Vec3::new(0.0, 2.0, 2.0));
        assert!((helper.length - 8.0).abs() < 1e-6);
        assert!((helper.radius - 8.0 * (PI / 8.0).tan()).abs() < 1e-5);
        assert!((helper.direction - Vec3::new(0.0, -2.0, -2.0).normalize()).length() < 1e-6);

        light.position = Vec3::new(1.0, 2.0, 1.0);
        light.set_spot_angle(PI / 4.0);
        let helper = light.helper.unwrap();
        assert_eq!(helper.origin, Vec3::new(1.0, 2.0, 1.0));
        assert!((helper.radius - 8.0).abs() < 1e-4);
    }

    #[test]
    fn visibility_toggles_helper_too() {
        let mut light = Light::point("pl", Color::WHITE, 1.0, Vec3::ONE, 8.0, 2.0);
        light.set_visible(false);
        assert!(!light.visible);
        assert!(!light.helper.unwrap().visible);
    }

    #[test]
    fn ambient_has_no_helper() {
        let mut light = Light::ambient("al", Color::WHITE, 0.5);
        light.refresh_helper();
        assert!(light.helper.is_none());
        light.set_spot_angle(1.0);
        assert_eq!(light.kind, LightKind::Ambient);
    }
}
