//! The sandbox's starting scene: a ground slab, three colored boxes and the
//! four lights the parameter panel binds to.

use super::{Capabilities, Color, EntityId, Light, LightId, NewEntity, SceneError, SceneGraph, Shape};
use glam::Vec3;
use std::f32::consts::PI;

pub const GROUND_NAME: &str = "GROUND";
pub const SPOTLIGHT_PROXY_NAME: &str = "SPOTLIGHT-PROXY";

/// Lights of the starting scene, one per panel binding group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneLights {
    pub ambient: LightId,
    pub directional: LightId,
    pub spot: LightId,
    pub point: LightId,
}

#[derive(Debug, Clone)]
pub struct DefaultScene {
    pub ground: EntityId,
    pub boxes: [EntityId; 3],
    pub spot_proxy: EntityId,
    pub lights: SceneLights,
}

pub fn populate(scene: &mut SceneGraph) -> Result<DefaultScene, SceneError> {
    let ground = scene.insert(
        NewEntity::new(GROUND_NAME, Shape::Box { size: Vec3::new(8.0, 0.5, 8.0) }, Color::from_hex_u32(0xfafafa))
            .at(Vec3::new(0.0, -2.0, 0.0))
            .with(Capabilities::GROUND_PLANE)
            .shadows(false, true),
    )?;

    let box_specs = [
        ("BOX1", 0xff0000, -2.0),
        ("BOX2", 0x00ff00, 0.0),
        ("BOX3", 0x0000ff, 2.0),
    ];
    let mut boxes = Vec::with_capacity(box_specs.len());
    for (name, color, x) in box_specs {
        boxes.push(scene.insert(
            NewEntity::new(name, Shape::cube(1.0), Color::from_hex_u32(color))
                .at(Vec3::new(x, 0.0, 0.0))
                .with(Capabilities::DRAGGABLE)
                .shadows(true, false),
        )?);
    }

    let ambient = scene.add_light(Light::ambient("ambient light", Color::WHITE, 0.5));

    let mut directional = Light::directional("directional light", Color::WHITE, 0.5, Vec3::new(0.0, 2.0, 2.0));
    directional.cast_shadow = true;
    let directional = scene.add_light(directional);

    let spot_position = Vec3::new(0.0, 2.0, 2.0);
    let spot = scene.add_light(Light::spot(
        "spot light",
        Color::from_hex_u32(0x00ff00),
        1.0,
        spot_position,
        8.0,
        PI / 8.0,
    ));
    let spot_proxy = scene.insert(
        NewEntity::new(SPOTLIGHT_PROXY_NAME, Shape::cube(1.0), Color::WHITE)
            .at(spot_position)
            .with(Capabilities::DRAGGABLE)
            .proxy_for(spot),
    )?;

    let point = scene.add_light(Light::point(
        "point light",
        Color::WHITE,
        1.0,
        Vec3::new(2.0, 2.0, 2.0),
        8.0,
        2.0,
    ));

    log::info!(
        "scene: {} entities, {} lights",
        scene.entities().len(),
        scene.lights().len()
    );

    Ok(DefaultScene {
        ground,
        boxes: [boxes[0], boxes[1], boxes[2]],
        spot_proxy,
        lights: SceneLights {
            ambient,
            directional,
            spot,
            point,
        },
    })
}
