//! Declarative control table and the write path from control changes into
//! the scene.

use crate::render::OrbitControls;
use crate::scene::setup::SceneLights;
use crate::scene::{Color, ColorParseError, EntityId, LightId, LightKind, SceneGraph};
use std::f32::consts::{FRAC_PI_2, PI};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingGroup {
    AmbientLight,
    DirectionalLight,
    SpotLight,
    OrbitControls,
    PointLight,
}

impl BindingGroup {
    pub fn title(self) -> &'static str {
        match self {
            Self::AmbientLight => "Ambient Light",
            Self::DirectionalLight => "Directional Light",
            Self::SpotLight => "Spot Light",
            Self::OrbitControls => "Orbit Controls",
            Self::PointLight => "Point Light",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Visible,
    Intensity,
    Color,
    PositionX,
    PositionY,
    PositionZ,
    CastShadow,
    SpotAngle,
    OrbitEnabled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlKind {
    Checkbox,
    Slider { min: f32, max: f32, step: f32 },
    Color,
}

impl ControlKind {
    /// Clamp to the slider range and snap to its step; other kinds pass through.
    pub fn constrain(&self, value: f32) -> f32 {
        match *self {
            Self::Slider { min, max, step } => {
                let clamped = value.clamp(min, max);
                if step > 0.0 {
                    (min + ((clamped - min) / step).round() * step).clamp(min, max)
                } else {
                    clamped
                }
            }
            _ => value,
        }
    }

    fn accepts(&self, value: &ControlValue) -> bool {
        matches!(
            (self, value),
            (Self::Checkbox, ControlValue::Bool(_))
                | (Self::Slider { .. }, ControlValue::Number(_))
                | (Self::Color, ControlValue::Hex(_))
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindingSpec {
    pub label: &'static str,
    pub field: Field,
    pub kind: ControlKind,
}

const fn checkbox(label: &'static str, field: Field) -> BindingSpec {
    BindingSpec {
        label,
        field,
        kind: ControlKind::Checkbox,
    }
}

const fn slider(label: &'static str, field: Field, min: f32, max: f32, step: f32) -> BindingSpec {
    BindingSpec {
        label,
        field,
        kind: ControlKind::Slider { min, max, step },
    }
}

const fn color(label: &'static str) -> BindingSpec {
    BindingSpec {
        label,
        field: Field::Color,
        kind: ControlKind::Color,
    }
}

const AMBIENT_BINDINGS: &[BindingSpec] = &[
    checkbox("visible", Field::Visible),
    slider("intensity", Field::Intensity, 0.0, 1.0, 0.1),
    color("color"),
];

const DIRECTIONAL_BINDINGS: &[BindingSpec] = &[
    checkbox("visible", Field::Visible),
    slider("intensity", Field::Intensity, 0.0, 1.0, 0.25),
    slider("position y", Field::PositionY, 1.0, 4.0, 0.5),
    checkbox("cast shadow", Field::CastShadow),
    color("color"),
];

const SPOT_BINDINGS: &[BindingSpec] = &[
    checkbox("visible", Field::Visible),
    slider("intensity", Field::Intensity, 0.0, 4.0, 0.5),
    slider("angle", Field::SpotAngle, PI / 16.0, FRAC_PI_2, PI / 16.0),
    checkbox("cast shadow", Field::CastShadow),
];

const ORBIT_BINDINGS: &[BindingSpec] = &[checkbox("enabled", Field::OrbitEnabled)];

const POINT_BINDINGS: &[BindingSpec] = &[
    checkbox("visible", Field::Visible),
    slider("intensity", Field::Intensity, 0.0, 2.0, 0.25),
    slider("position x", Field::PositionX, -2.0, 4.0, 0.5),
    slider("position y", Field::PositionY, -2.0, 4.0, 0.5),
    slider("position z", Field::PositionZ, -2.0, 4.0, 0.5),
    checkbox("cast shadow", Field::CastShadow),
    color("color"),
];

/// Panel layout, in display order.
pub const BINDING_TABLE: &[(BindingGroup, &[BindingSpec])] = &[
    (BindingGroup::AmbientLight, AMBIENT_BINDINGS),
    (BindingGroup::DirectionalLight, DIRECTIONAL_BINDINGS),
    (BindingGroup::SpotLight, SPOT_BINDINGS),
    (BindingGroup::OrbitControls, ORBIT_BINDINGS),
    (BindingGroup::PointLight, POINT_BINDINGS),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingTarget {
    Light(LightId),
    Orbit,
}

impl BindingTarget {
    pub fn for_group(group: BindingGroup, lights: &SceneLights) -> Self {
        match group {
            BindingGroup::AmbientLight => Self::Light(lights.ambient),
            BindingGroup::DirectionalLight => Self::Light(lights.directional),
            BindingGroup::SpotLight => Self::Light(lights.spot),
            BindingGroup::PointLight => Self::Light(lights.point),
            BindingGroup::OrbitControls => Self::Orbit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlValue {
    Bool(bool),
    Number(f32),
    /// `#rrggbb`
    Hex(String),
}

/// One bound control. Holds its own value; the scene is read only once, when
/// the panel is built.
#[derive(Debug, Clone)]
pub struct Control {
    pub spec: BindingSpec,
    pub target: BindingTarget,
    value: ControlValue,
}

impl Control {
    pub fn new(spec: BindingSpec, target: BindingTarget, value: ControlValue) -> Self {
        Self {
            spec,
            target,
            value,
        }
    }

    pub fn value(&self) -> &ControlValue {
        &self.value
    }

    /// Store a new value and produce the matching change event.
    pub fn change(&mut self, value: ControlValue) -> Option<ControlChange> {
        if !self.spec.kind.accepts(&value) {
            log::warn!("panel: {:?} rejected {:?}", self.spec.field, value);
            return None;
        }
        let value = match value {
            ControlValue::Number(n) => ControlValue::Number(self.spec.kind.constrain(n)),
            other => other,
        };
        self.value = value.clone();
        Some(ControlChange {
            target: self.target,
            field: self.spec.field,
            value,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlChange {
    pub target: BindingTarget,
    pub field: Field,
    pub value: ControlValue,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BindingError {
    #[error("{0} is not in the scene")]
    MissingLight(LightId),
    #[error("{field:?} cannot take {value:?}")]
    ValueMismatch { field: Field, value: ControlValue },
    #[error(transparent)]
    Color(#[from] ColorParseError),
}

/// Read a control's starting value from the scene.
pub fn initial_value(
    spec: &BindingSpec,
    target: BindingTarget,
    scene: &SceneGraph,
    orbit: &OrbitControls,
) -> Result<ControlValue, BindingError> {
    let light = match target {
        BindingTarget::Orbit => {
            return match spec.field {
                Field::OrbitEnabled => Ok(ControlValue::Bool(orbit.enabled)),
                field => Err(BindingError::ValueMismatch {
                    field,
                    value: ControlValue::Bool(orbit.enabled),
                }),
            };
        }
        BindingTarget::Light(id) => scene.light(id).ok_or(BindingError::MissingLight(id))?,
    };
    let value = match spec.field {
        Field::Visible => ControlValue::Bool(light.visible),
        Field::CastShadow => ControlValue::Bool(light.cast_shadow),
        Field::Intensity => ControlValue::Number(light.intensity),
        Field::PositionX => ControlValue::Number(light.position.x),
        Field::PositionY => ControlValue::Number(light.position.y),
        Field::PositionZ => ControlValue::Number(light.position.z),
        Field::SpotAngle => match light.kind {
            LightKind::Spot { angle, .. } => ControlValue::Number(angle),
            _ => ControlValue::Number(0.0),
        },
        Field::Color => ControlValue::Hex(light.color.to_hex()),
        Field::OrbitEnabled => ControlValue::Bool(orbit.enabled),
    };
    Ok(value)
}

/// Write a change straight into the bound field.
pub fn apply(
    change: &ControlChange,
    scene: &mut SceneGraph,
    orbit: &mut OrbitControls,
) -> Result<(), BindingError> {
    let mismatch = || BindingError::ValueMismatch {
        field: change.field,
        value: change.value.clone(),
    };
    let id = match change.target {
        BindingTarget::Orbit => {
            return match (change.field, &change.value) {
                (Field::OrbitEnabled, ControlValue::Bool(enabled)) => {
                    orbit.enabled = *enabled;
                    log::debug!("panel: orbit enabled = {}", enabled);
                    Ok(())
                }
                _ => Err(mismatch()),
            };
        }
        BindingTarget::Light(id) => id,
    };

    let light = scene.light_mut(id).ok_or(BindingError::MissingLight(id))?;
    let mut moved = false;
    match (change.field, &change.value) {
        (Field::Visible, ControlValue::Bool(visible)) => light.set_visible(*visible),
        (Field::CastShadow, ControlValue::Bool(cast)) => light.cast_shadow = *cast,
        (Field::Intensity, ControlValue::Number(value)) => light.intensity = *value,
        (Field::SpotAngle, ControlValue::Number(value)) => light.set_spot_angle(*value),
        (Field::Color, ControlValue::Hex(hex)) => light.color = Color::from_hex(hex)?,
        (Field::PositionX, ControlValue::Number(value)) => {
            light.position.x = *value;
            moved = true;
        }
        (Field::PositionY, ControlValue::Number(value)) => {
            light.position.y = *value;
            moved = true;
        }
        (Field::PositionZ, ControlValue::Number(value)) => {
            light.position.z = *value;
            moved = true;
        }
        _ => return Err(mismatch()),
    }
    log::debug!("panel: {} {:?} = {:?}", light.name, change.field, change.value);

    if moved {
        light.refresh_helper();
        let position = light.position;
        let proxies: Vec<EntityId> = scene
            .entities()
            .iter()
            .filter(|entity| entity.bound_light() == Some(id))
            .map(|entity| entity.id())
            .collect();
        for proxy in proxies {
            if let Some(entity) = scene.entity_mut(proxy) {
                entity.transform.position = position;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::setup;
    use glam::Vec3;

    fn fixture() -> (SceneGraph, SceneLights, OrbitControls) {
        let mut scene = SceneGraph::new();
        let handles = setup::populate(&mut scene).unwrap();
        (scene, handles.lights, OrbitControls::new(Vec3::ZERO))
    }

    fn change(target: BindingTarget, field: Field, value: ControlValue) -> ControlChange {
        ControlChange {
            target,
            field,
            value,
        }
    }

    #[test]
    fn table_lists_every_group_once() {
        let groups: Vec<_> = BINDING_TABLE.iter().map(|(group, _)| *group).collect();
        assert_eq!(
            groups,
            vec![
                BindingGroup::AmbientLight,
                BindingGroup::DirectionalLight,
                BindingGroup::SpotLight,
                BindingGroup::OrbitControls,
                BindingGroup::PointLight,
            ]
        );
        let total: usize = BINDING_TABLE.iter().map(|(_, specs)| specs.len()).sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn sliders_clamp_and_snap() {
        let kind = ControlKind::Slider {
            min: 0.0,
            max: 1.0,
            step: 0.25,
        };
        assert_eq!(kind.constrain(0.3), 0.25);
        assert_eq!(kind.constrain(7.0), 1.0);
        assert_eq!(kind.constrain(-1.0), 0.0);
        assert_eq!(ControlKind::Checkbox.constrain(7.0), 7.0);
    }

    #[test]
    fn intensity_and_color_are_written_immediately() {
        let (mut scene, lights, mut orbit) = fixture();
        let target = BindingTarget::Light(lights.ambient);
        apply(&change(target, Field::Intensity, ControlValue::Number(0.8)), &mut scene, &mut orbit).unwrap();
        apply(
            &change(target, Field::Color, ControlValue::Hex("#ff8000".into())),
            &mut scene,
            &mut orbit,
        )
        .unwrap();
        let ambient = scene.light(lights.ambient).unwrap();
        assert_eq!(ambient.intensity, 0.8);
        assert_eq!(ambient.color.to_bytes(), [255, 128, 0]);
    }

    #[test]
    fn malformed_color_leaves_light_untouched() {
        let (mut scene, lights, mut orbit) = fixture();
        let target = BindingTarget::Light(lights.point);
        let result = apply(
            &change(target, Field::Color, ControlValue::Hex("red".into())),
            &mut scene,
            &mut orbit,
        );
        assert!(matches!(result, Err(BindingError::Color(_))));
        assert_eq!(scene.light(lights.point).unwrap().color, Color::WHITE);
    }

    #[test]
    fn visible_toggles_light_and_helper() {
        let (mut scene, lights, mut orbit) = fixture();
        let target = BindingTarget::Light(lights.spot);
        apply(&change(target, Field::Visible, ControlValue::Bool(false)), &mut scene, &mut orbit).unwrap();
        let spot = scene.light(lights.spot).unwrap();
        assert!(!spot.visible);
        assert!(!spot.helper.unwrap().visible);
    }

    #[test]
    fn position_and_angle_refresh_the_helper() {
        let (mut scene, lights, mut orbit) = fixture();
        let point = BindingTarget::Light(lights.point);
        apply(&change(point, Field::PositionX, ControlValue::Number(-1.5)), &mut scene, &mut orbit).unwrap();
        let light = scene.light(lights.point).unwrap();
        assert_eq!(light.position, Vec3::new(-1.5, 2.0, 2.0));
        assert_eq!(light.helper.unwrap().origin, light.position);

        let spot = BindingTarget::Light(lights.spot);
        apply(&change(spot, Field::SpotAngle, ControlValue::Number(PI / 4.0)), &mut scene, &mut orbit).unwrap();
        let helper = scene.light(lights.spot).unwrap().helper.unwrap();
        assert!((helper.radius - 8.0).abs() < 1e-4);
    }

    #[test]
    fn orbit_toggle_and_mismatches() {
        let (mut scene, lights, mut orbit) = fixture();
        apply(
            &change(BindingTarget::Orbit, Field::OrbitEnabled, ControlValue::Bool(false)),
            &mut scene,
            &mut orbit,
        )
        .unwrap();
        assert!(!orbit.enabled);

        let wrong = change(BindingTarget::Light(lights.ambient), Field::Intensity, ControlValue::Bool(true));
        assert!(matches!(
            apply(&wrong, &mut scene, &mut orbit),
            Err(BindingError::ValueMismatch { .. })
        ));
    }

    #[test]
    fn initial_values_come_from_the_scene() {
        let (scene, lights, orbit) = fixture();
        let spec = &SPOT_BINDINGS[2];
        let value = initial_value(spec, BindingTarget::Light(lights.spot), &scene, &orbit).unwrap();
        assert_eq!(value, ControlValue::Number(PI / 8.0));
        let value = initial_value(&DIRECTIONAL_BINDINGS[4], BindingTarget::Light(lights.directional), &scene, &orbit)
            .unwrap();
        assert_eq!(value, ControlValue::Hex("#ffffff".into()));
    }
}
