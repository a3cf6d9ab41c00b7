use crate::render::camera::PerspectiveCamera;
use crate::render::pick::PickingService;
use crate::scene::{Capabilities, Color, EntityId, LightId, SceneGraph};
use glam::{Vec2, Vec3};

/// When the emissive drag marker is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightPolicy {
    /// Marker stays on for the whole drag.
    #[default]
    Persist,
    /// Marker is cleared by the first drag update that moves the entity.
    ClearOnDrag,
}

/// `#aaaaaa`
pub const DEFAULT_HIGHLIGHT: Color = Color::rgb(0.666_666_7, 0.666_666_7, 0.666_666_7);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging(EntityId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragUpdate {
    Idle,
    /// No ground plane under the pointer this frame.
    NoGround,
    Moved { entity: EntityId, position: Vec3 },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DragError {
    #[error("dragged entity {0} no longer exists")]
    MissingEntity(EntityId),
    #[error("light proxy {0} has no bound light")]
    UnboundProxy(EntityId),
    #[error("light proxy {entity} is bound to missing {light}")]
    MissingLight { entity: EntityId, light: LightId },
}

/// Pointer-driven drag session over the scene graph.
///
/// The controller never owns entities; it tracks the dragged one by id and
/// the last pointer position in NDC.
#[derive(Debug)]
pub struct DragController {
    state: DragState,
    pointer: Vec2,
    policy: HighlightPolicy,
    highlight: Color,
}

impl DragController {
    pub fn new(policy: HighlightPolicy, highlight: Color) -> Self {
        Self {
            state: DragState::Idle,
            pointer: Vec2::ZERO,
            policy,
            highlight,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn dragged(&self) -> Option<EntityId> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging(id) => Some(id),
        }
    }

    /// Pick-start. Returns the entity that became dragged, if any.
    pub fn pointer_down(
        &mut self,
        ndc: Vec2,
        scene: &mut SceneGraph,
        camera: &PerspectiveCamera,
    ) -> Option<EntityId> {
        if let DragState::Dragging(current) = self.state {
            log::debug!("drag: pick-start ignored, {} is already dragged", current);
            return None;
        }
        self.pointer = ndc;

        let hits = PickingService::pick(ndc, camera, scene);
        let nearest = hits.first()?;
        let entity = scene.entity_mut(nearest.entity)?;
        if !entity.has(Capabilities::DRAGGABLE) || entity.has(Capabilities::GROUND_PLANE) {
            log::debug!("drag: nearest hit '{}' is not draggable", entity.name);
            return None;
        }

        entity.renderable.material.emissive = self.highlight;
        log::info!("drag: start '{}' {}", entity.name, entity.id());
        self.state = DragState::Dragging(entity.id());
        Some(entity.id())
    }

    pub fn pointer_move(&mut self, ndc: Vec2) {
        self.pointer = ndc;
    }

    /// Pick-end. Returns the entity that was released, if any.
    pub fn pointer_up(&mut self, scene: &mut SceneGraph) -> Option<EntityId> {
        let DragState::Dragging(id) = self.state else {
            return None;
        };
        self.state = DragState::Idle;
        if let Some(entity) = scene.entity_mut(id) {
            entity.renderable.material.emissive = Color::BLACK;
            log::info!(
                "drag: drop '{}' at ({:.2}, {:.2}, {:.2})",
                entity.name,
                entity.transform.position.x,
                entity.transform.position.y,
                entity.transform.position.z
            );
        }
        Some(id)
    }

    /// End any session without a pointer release, e.g. when the view goes
    /// away mid-drag. The entity stays where it was last moved to.
    pub fn cancel(&mut self, scene: &mut SceneGraph) -> Option<EntityId> {
        let DragState::Dragging(id) = self.state else {
            return None;
        };
        self.state = DragState::Idle;
        if let Some(entity) = scene.entity_mut(id) {
            entity.renderable.material.emissive = Color::BLACK;
            log::info!("drag: cancelled '{}'", entity.name);
        }
        Some(id)
    }

    /// Per-frame step: follow the ground plane under the pointer.
    pub fn update(
        &mut self,
        scene: &mut SceneGraph,
        camera: &PerspectiveCamera,
    ) -> Result<DragUpdate, DragError> {
        let DragState::Dragging(id) = self.state else {
            return Ok(DragUpdate::Idle);
        };
        let Some(dragged) = scene.entity_mut(id) else {
            self.state = DragState::Idle;
            return Err(DragError::MissingEntity(id));
        };
        if self.policy == HighlightPolicy::ClearOnDrag {
            dragged.renderable.material.emissive = Color::BLACK;
        }

        let hits = PickingService::pick(self.pointer, camera, scene);
        let ground = hits.iter().find(|hit| {
            scene
                .entity(hit.entity)
                .is_some_and(|entity| entity.has(Capabilities::GROUND_PLANE))
        });
        let Some(ground) = ground else {
            log::trace!("drag: no ground under pointer");
            return Ok(DragUpdate::NoGround);
        };
        let target = ground.point;

        let entity = scene.entity_mut(id).ok_or(DragError::MissingEntity(id))?;
        entity.transform.position.x = target.x;
        entity.transform.position.z = target.z;
        let position = entity.transform.position;
        let proxy_light = if entity.has(Capabilities::LIGHT_PROXY) {
            Some(entity.bound_light().ok_or(DragError::UnboundProxy(id))?)
        } else {
            None
        };

        if let Some(light_id) = proxy_light {
            let light = scene.light_mut(light_id).ok_or(DragError::MissingLight {
                entity: id,
                light: light_id,
            })?;
            light.position = position;
            light.refresh_helper();
        }

        Ok(DragUpdate::Moved {
            entity: id,
            position,
        })
    }
}
