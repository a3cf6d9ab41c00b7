pub mod bindings;

pub use bindings::{
    apply, BindingError, BindingGroup, BindingTarget, Control, ControlChange, ControlKind,
    ControlValue, Field, BINDING_TABLE,
};

use crate::app::timing::FrameStats;
use crate::render::OrbitControls;
use crate::scene::setup::SceneLights;
use crate::scene::{Color, SceneGraph};

pub struct ControlGroup {
    pub group: BindingGroup,
    pub controls: Vec<Control>,
}

/// Live parameter panel built from [`BINDING_TABLE`].
pub struct ParameterPanel {
    groups: Vec<ControlGroup>,
}

impl ParameterPanel {
    pub fn build(
        scene: &SceneGraph,
        lights: &SceneLights,
        orbit: &OrbitControls,
    ) -> Result<Self, BindingError> {
        let mut groups = Vec::with_capacity(BINDING_TABLE.len());
        for (group, specs) in BINDING_TABLE {
            let target = BindingTarget::for_group(*group, lights);
            let controls = specs
                .iter()
                .map(|spec| {
                    let value = bindings::initial_value(spec, target, scene, orbit)?;
                    Ok(Control::new(*spec, target, value))
                })
                .collect::<Result<Vec<_>, BindingError>>()?;
            groups.push(ControlGroup {
                group: *group,
                controls,
            });
        }
        let panel = Self { groups };
        log::info!("panel: built {} controls", panel.control_count());
        Ok(panel)
    }

    pub fn groups(&self) -> &[ControlGroup] {
        &self.groups
    }

    pub fn control_count(&self) -> usize {
        self.groups.iter().map(|group| group.controls.len()).sum()
    }

    pub fn is_torn_down(&self) -> bool {
        self.groups.is_empty()
    }

    /// Raise a change on the control bound to `field` in `group`.
    pub fn change(
        &mut self,
        group: BindingGroup,
        field: Field,
        value: ControlValue,
    ) -> Option<ControlChange> {
        self.groups
            .iter_mut()
            .find(|g| g.group == group)?
            .controls
            .iter_mut()
            .find(|control| control.spec.field == field)?
            .change(value)
    }

    /// Destroy every control. The panel draws nothing afterwards.
    pub fn teardown(&mut self) {
        let count = self.control_count();
        self.groups.clear();
        if count > 0 {
            log::info!("panel: destroyed {} controls", count);
        }
    }

    pub fn show(&mut self, ctx: &egui::Context) -> Vec<ControlChange> {
        let mut changes = Vec::new();
        if self.is_torn_down() {
            return changes;
        }
        egui::Window::new("Controls")
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-8.0, 8.0))
            .resizable(false)
            .default_width(240.0)
            .show(ctx, |ui| {
                for group in &mut self.groups {
                    egui::CollapsingHeader::new(group.group.title())
                        .default_open(true)
                        .show(ui, |ui| {
                            for control in &mut group.controls {
                                if let Some(change) = control_widget(ui, control) {
                                    changes.push(change);
                                }
                            }
                        });
                }
            });
        changes
    }
}

fn control_widget(ui: &mut egui::Ui, control: &mut Control) -> Option<ControlChange> {
    let label = control.spec.label;
    match (control.spec.kind, control.value().clone()) {
        (ControlKind::Checkbox, ControlValue::Bool(mut checked)) => {
            if ui.checkbox(&mut checked, label).changed() {
                return control.change(ControlValue::Bool(checked));
            }
        }
        (ControlKind::Slider { min, max, step }, ControlValue::Number(mut value)) => {
            let slider = egui::Slider::new(&mut value, min..=max)
                .step_by(step as f64)
                .text(label);
            if ui.add(slider).changed() {
                return control.change(ControlValue::Number(value));
            }
        }
        (ControlKind::Color, ControlValue::Hex(hex)) => {
            let mut rgb = Color::from_hex(&hex).map(Color::to_bytes).unwrap_or([0, 0, 0]);
            let response = ui
                .horizontal(|ui| {
                    let response = ui.color_edit_button_srgb(&mut rgb);
                    ui.label(label);
                    response
                })
                .inner;
            if response.changed() {
                let [r, g, b] = rgb;
                return control.change(ControlValue::Hex(format!("#{r:02x}{g:02x}{b:02x}")));
            }
        }
        (kind, value) => {
            log::warn!("panel: {} holds {:?} for {:?}", label, value, kind);
        }
    }
    None
}

/// Frame-rate readout in the top-left corner.
pub fn stats_overlay(ctx: &egui::Context, stats: &FrameStats) {
    egui::Area::new(egui::Id::new("stats_overlay"))
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(8.0, 8.0))
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.monospace(format!("{:5.1} fps", stats.fps()));
                ui.monospace(format!("{:5.2} ms", stats.frame_ms()));
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::setup;
    use glam::Vec3;
    use std::f32::consts::FRAC_PI_2;

    fn fixture() -> (SceneGraph, SceneLights, OrbitControls) {
        let mut scene = SceneGraph::new();
        let handles = setup::populate(&mut scene).unwrap();
        (scene, handles.lights, OrbitControls::new(Vec3::ZERO))
    }

    #[test]
    fn builds_one_control_per_binding() {
        let (scene, lights, orbit) = fixture();
        let panel = ParameterPanel::build(&scene, &lights, &orbit).unwrap();
        assert_eq!(panel.groups().len(), 5);
        assert_eq!(panel.control_count(), 20);
        let spot = &panel.groups()[2];
        assert_eq!(spot.group, BindingGroup::SpotLight);
        assert!(spot
            .controls
            .iter()
            .all(|control| control.target == BindingTarget::Light(lights.spot)));
    }

    #[test]
    fn change_events_flow_into_the_scene() {
        let (mut scene, lights, mut orbit) = fixture();
        let mut panel = ParameterPanel::build(&scene, &lights, &orbit).unwrap();

        let change = panel
            .change(BindingGroup::SpotLight, Field::SpotAngle, ControlValue::Number(10.0))
            .unwrap();
        assert!(matches!(change.value, ControlValue::Number(angle) if (angle - FRAC_PI_2).abs() < 1e-5));
        apply(&change, &mut scene, &mut orbit).unwrap();

        let change = panel
            .change(BindingGroup::DirectionalLight, Field::PositionY, ControlValue::Number(3.5))
            .unwrap();
        apply(&change, &mut scene, &mut orbit).unwrap();

        let spot = scene.light(lights.spot).unwrap();
        assert!(matches!(
            spot.kind,
            crate::scene::LightKind::Spot { angle, .. } if (angle - FRAC_PI_2).abs() < 1e-5
        ));
        assert_eq!(scene.light(lights.directional).unwrap().position.y, 3.5);
    }

    #[test]
    fn controls_keep_their_own_values() {
        let (mut scene, lights, orbit) = fixture();
        let mut panel = ParameterPanel::build(&scene, &lights, &orbit).unwrap();
        scene.light_mut(lights.ambient).unwrap().intensity = 0.9;
        let control = &panel.groups()[0].controls[1];
        assert_eq!(control.value(), &ControlValue::Number(0.5));

        panel.change(BindingGroup::AmbientLight, Field::Intensity, ControlValue::Number(0.2));
        assert_eq!(panel.groups()[0].controls[1].value(), &ControlValue::Number(0.2));
    }

    #[test]
    fn wrong_value_kind_is_rejected() {
        let (scene, lights, orbit) = fixture();
        let mut panel = ParameterPanel::build(&scene, &lights, &orbit).unwrap();
        assert!(panel
            .change(BindingGroup::AmbientLight, Field::Visible, ControlValue::Number(1.0))
            .is_none());
        assert!(panel
            .change(BindingGroup::SpotLight, Field::Color, ControlValue::Hex("#ffffff".into()))
            .is_none());
    }

    #[test]
    fn teardown_destroys_controls_and_rebuild_does_not_duplicate() {
        let (scene, lights, orbit) = fixture();
        let mut panel = ParameterPanel::build(&scene, &lights, &orbit).unwrap();
        panel.teardown();
        assert!(panel.is_torn_down());
        assert_eq!(panel.control_count(), 0);
        assert!(panel
            .change(BindingGroup::OrbitControls, Field::OrbitEnabled, ControlValue::Bool(false))
            .is_none());

        let panel = ParameterPanel::build(&scene, &lights, &orbit).unwrap();
        assert_eq!(panel.control_count(), 20);
    }
}
