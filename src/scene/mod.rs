pub mod light;
pub mod setup;

pub use light::{Light, LightHelper, LightId, LightKind};

use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3};

bitflags! {
    /// Behavioral tags checked by the interaction layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        const DRAGGABLE = 1 << 0;
        const GROUND_PLANE = 1 << 1;
        const LIGHT_PROXY = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),
    #[error("expected 6 hex digits, got {0:?}")]
    BadLength(String),
    #[error("invalid hex digits in {0:?}")]
    InvalidDigit(String),
}

/// sRGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex_u32(hex: u32) -> Self {
        Self::from_bytes([
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        ])
    }

    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::rgb(
            bytes[0] as f32 / 255.0,
            bytes[1] as f32 / 255.0,
            bytes[2] as f32 / 255.0,
        )
    }

    /// Parse a `#rrggbb` string as produced by the panel's color controls.
    pub fn from_hex(text: &str) -> Result<Self, ColorParseError> {
        let digits = text
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(text.to_string()))?;
        if digits.len() != 6 {
            return Err(ColorParseError::BadLength(text.to_string()));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorParseError::InvalidDigit(text.to_string()));
        }
        let value = u32::from_str_radix(digits, 16)
            .map_err(|_| ColorParseError::InvalidDigit(text.to_string()))?;
        Ok(Self::from_hex_u32(value))
    }

    pub fn to_bytes(self) -> [u8; 3] {
        let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_bytes();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Geometry in entity-local space, centered on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Full edge lengths along x, y, z.
    Box { size: Vec3 },
    Sphere { radius: f32 },
}

impl Shape {
    pub fn cube(edge: f32) -> Self {
        Self::Box {
            size: Vec3::splat(edge),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Color,
    pub emissive: Color,
    pub visible: bool,
}

impl Material {
    pub fn phong(color: Color) -> Self {
        Self {
            color,
            emissive: Color::BLACK,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderable {
    pub shape: Shape,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    pub name: String,
    pub transform: Transform,
    pub renderable: Renderable,
    capabilities: Capabilities,
    light: Option<LightId>,
}

impl Entity {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn has(&self, capability: Capabilities) -> bool {
        self.capabilities.contains(capability)
    }

    /// Light this entity stands in for, if it is a proxy.
    pub fn bound_light(&self) -> Option<LightId> {
        self.light
    }
}

/// Everything needed to insert an entity; the graph assigns the id.
#[derive(Debug, Clone)]
pub struct NewEntity {
    pub name: String,
    pub transform: Transform,
    pub renderable: Renderable,
    pub capabilities: Capabilities,
    pub light: Option<LightId>,
}

impl NewEntity {
    pub fn new(name: impl Into<String>, shape: Shape, color: Color) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            renderable: Renderable {
                shape,
                material: Material::phong(color),
                cast_shadow: false,
                receive_shadow: false,
            },
            capabilities: Capabilities::empty(),
            light: None,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn scaled(mut self, scale: Vec3) -> Self {
        self.transform.scale = scale;
        self
    }

    pub fn with(mut self, capabilities: Capabilities) -> Self {
        self.capabilities |= capabilities;
        self
    }

    pub fn shadows(mut self, cast: bool, receive: bool) -> Self {
        self.renderable.cast_shadow = cast;
        self.renderable.receive_shadow = receive;
        self
    }

    pub fn proxy_for(mut self, light: LightId) -> Self {
        self.capabilities |= Capabilities::LIGHT_PROXY;
        self.light = Some(light);
        self
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("entity '{0}' cannot be both draggable and a ground plane")]
    DraggableGround(String),
    #[error("light proxy '{0}' is not bound to a light")]
    UnboundProxy(String),
    #[error("light proxy '{name}' refers to unknown light {light}")]
    UnknownLight { name: String, light: LightId },
}

/// Owns every entity and light of the sandbox.
#[derive(Debug, Default)]
pub struct SceneGraph {
    entities: Vec<Entity>,
    lights: Vec<Light>,
    next_entity: u32,
    next_light: u32,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, new: NewEntity) -> Result<EntityId, SceneError> {
        let caps = new.capabilities;
        if caps.contains(Capabilities::DRAGGABLE | Capabilities::GROUND_PLANE) {
            return Err(SceneError::DraggableGround(new.name));
        }
        if caps.contains(Capabilities::LIGHT_PROXY) {
            let Some(light) = new.light else {
                return Err(SceneError::UnboundProxy(new.name));
            };
            if self.light(light).is_none() {
                return Err(SceneError::UnknownLight {
                    name: new.name,
                    light,
                });
            }
        }

        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        log::debug!("scene: inserted entity {} '{}' {:?}", id, new.name, caps);
        self.entities.push(Entity {
            id,
            name: new.name,
            transform: new.transform,
            renderable: new.renderable,
            capabilities: caps,
            light: new.light,
        });
        Ok(id)
    }

    pub fn add_light(&mut self, mut light: Light) -> LightId {
        let id = LightId(self.next_light);
        self.next_light += 1;
        light.id = id;
        light.refresh_helper();
        self.lights.push(light);
        id
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn find_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.name == name)
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.iter().find(|light| light.id == id)
    }

    pub fn light_mut(&mut self, id: LightId) -> Option<&mut Light> {
        self.lights.iter_mut().find(|light| light.id == id)
    }

    /// Full teardown; ids are never reused.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.lights.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse_and_format() {
        let color = Color::from_hex("#ff8000").unwrap();
        assert_eq!(color.to_bytes(), [255, 128, 0]);
        assert_eq!(color.to_hex(), "#ff8000");
        assert_eq!(Color::from_hex_u32(0x00ff00).to_hex(), "#00ff00");
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(matches!(
            Color::from_hex("ff8000"),
            Err(ColorParseError::MissingHash(_))
        ));
        assert!(matches!(
            Color::from_hex("#fff"),
            Err(ColorParseError::BadLength(_))
        ));
        assert!(matches!(
            Color::from_hex("#gg0000"),
            Err(ColorParseError::InvalidDigit(_))
        ));
        assert!(matches!(
            Color::from_hex("#+fffff"),
            Err(ColorParseError::InvalidDigit(_))
        ));
    }

    #[test]
    fn ground_cannot_be_draggable() {
        let mut scene = SceneGraph::new();
        let result = scene.insert(
            NewEntity::new("floor", Shape::cube(1.0), Color::WHITE)
                .with(Capabilities::GROUND_PLANE | Capabilities::DRAGGABLE),
        );
        assert_eq!(result, Err(SceneError::DraggableGround("floor".to_string())));
        assert!(scene.entities().is_empty());
    }

    #[test]
    fn proxy_requires_existing_light() {
        let mut scene = SceneGraph::new();
        let mut orphan = NewEntity::new("proxy", Shape::cube(1.0), Color::WHITE);
        orphan.capabilities = Capabilities::LIGHT_PROXY;
        assert!(matches!(
            scene.insert(orphan),
            Err(SceneError::UnboundProxy(_))
        ));

        let light = scene.add_light(Light::point("pl", Color::WHITE, 1.0, Vec3::ONE, 8.0, 2.0));
        let id = scene
            .insert(NewEntity::new("proxy", Shape::cube(1.0), Color::WHITE).proxy_for(light))
            .unwrap();
        let entity = scene.entity(id).unwrap();
        assert!(entity.has(Capabilities::LIGHT_PROXY));
        assert_eq!(entity.bound_light(), Some(light));
    }

    #[test]
    fn ids_are_unique_and_lookups_resolve() {
        let mut scene = SceneGraph::new();
        let a = scene
            .insert(NewEntity::new("a", Shape::cube(1.0), Color::WHITE))
            .unwrap();
        let b = scene
            .insert(NewEntity::new("b", Shape::Sphere { radius: 1.0 }, Color::WHITE).at(Vec3::X))
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(scene.find_entity("b").map(Entity::id), Some(b));
        assert_eq!(scene.entity(b).unwrap().transform.position, Vec3::X);
        scene.clear();
        assert!(scene.entity(a).is_none());
    }
}
