use super::context::SandboxContext;
use crate::ui::{BindingError, ParameterPanel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscription {
    Pointer,
    Resize,
}

/// Event subscriptions held by a view. Subscribing twice is a no-op.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    active: Vec<Subscription>,
}

impl ListenerRegistry {
    pub fn subscribe(&mut self, subscription: Subscription) -> bool {
        if self.active.contains(&subscription) {
            return false;
        }
        self.active.push(subscription);
        true
    }

    pub fn is_subscribed(&self, subscription: Subscription) -> bool {
        self.active.contains(&subscription)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

/// Scoped resources of one open view: event subscriptions, frame
/// scheduling and the parameter panel. Released by [`ViewSession::teardown`]
/// or on drop, whichever comes first.
pub struct ViewSession {
    listeners: ListenerRegistry,
    scheduling: bool,
    panel: Option<ParameterPanel>,
}

impl ViewSession {
    /// A drag left over from a previous view is cancelled first; its
    /// release may have arrived while nothing was subscribed.
    pub fn open(ctx: &mut SandboxContext) -> Result<Self, BindingError> {
        ctx.drag.cancel(&mut ctx.scene);
        let panel = ParameterPanel::build(&ctx.scene, &ctx.handles.lights, &ctx.orbit)?;
        let mut listeners = ListenerRegistry::default();
        listeners.subscribe(Subscription::Pointer);
        listeners.subscribe(Subscription::Resize);
        log::info!("session: opened with {} subscriptions", listeners.len());
        Ok(Self {
            listeners,
            scheduling: true,
            panel: Some(panel),
        })
    }

    pub fn listens_to(&self, subscription: Subscription) -> bool {
        self.listeners.is_subscribed(subscription)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Whether the frame tick should schedule another redraw.
    pub fn is_scheduling(&self) -> bool {
        self.scheduling
    }

    pub fn panel_mut(&mut self) -> Option<&mut ParameterPanel> {
        self.panel.as_mut()
    }

    pub fn is_open(&self) -> bool {
        self.scheduling || !self.listeners.is_empty() || self.panel.is_some()
    }

    /// Teardown that also ends the drag session, since no pointer release
    /// can reach it once the subscriptions are gone.
    pub fn close(&mut self, ctx: &mut SandboxContext) {
        ctx.drag.cancel(&mut ctx.scene);
        self.teardown();
    }

    pub fn teardown(&mut self) {
        if !self.is_open() {
            return;
        }
        self.listeners.clear();
        self.scheduling = false;
        if let Some(mut panel) = self.panel.take() {
            panel.teardown();
        }
        log::info!("session: torn down");
    }
}

impl Drop for ViewSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame::FrameLoop;
    use crate::config::SandboxConfig;
    use crate::interaction::drag::{DragState, DragUpdate};
    use crate::render::{PerspectiveCamera, RenderError, SceneRenderer, UiLayer};
    use crate::scene::{Color, EntityId, SceneGraph};
    use glam::Vec3;
    use std::time::Instant;

    #[test]
    fn teardown_releases_everything_once() {
        let mut ctx = SandboxContext::new(&SandboxConfig::default()).unwrap();
        let mut session = ViewSession::open(&mut ctx).unwrap();
        assert!(session.listens_to(Subscription::Pointer));
        assert!(session.listens_to(Subscription::Resize));
        assert!(session.is_scheduling());
        assert_eq!(session.panel_mut().map(|panel| panel.control_count()), Some(20));

        session.teardown();
        assert!(!session.is_open());
        assert_eq!(session.listener_count(), 0);
        assert!(!session.is_scheduling());
        assert!(session.panel_mut().is_none());
        session.teardown();
    }

    #[test]
    fn reopening_does_not_duplicate_resources() {
        let mut ctx = SandboxContext::new(&SandboxConfig::default()).unwrap();
        let mut session = Some(ViewSession::open(&mut ctx).unwrap());
        for _ in 0..3 {
            drop(session.take());
            session = Some(ViewSession::open(&mut ctx).unwrap());
        }
        let session = session.as_mut().unwrap();
        assert_eq!(session.listener_count(), 2);
        assert_eq!(session.panel_mut().map(|panel| panel.control_count()), Some(20));
    }

    fn start_box1_drag(ctx: &mut SandboxContext) -> EntityId {
        ctx.camera.aspect = 1.0;
        ctx.camera.update_projection();
        let box1 = ctx.handles.boxes[0];
        let ndc = ctx.camera.project(Vec3::new(-2.0, 0.0, 0.0)).unwrap().truncate();
        ctx.drag.pointer_down(ndc, &mut ctx.scene, &ctx.camera);
        let ground = ctx.camera.project(Vec3::new(3.0, -1.75, -2.0)).unwrap().truncate();
        ctx.drag.pointer_move(ground);
        ctx.drag.update(&mut ctx.scene, &ctx.camera).unwrap();
        assert_eq!(ctx.drag.dragged(), Some(box1));
        box1
    }

    #[test]
    fn close_ends_an_active_drag() {
        let mut ctx = SandboxContext::new(&SandboxConfig::default()).unwrap();
        let mut session = ViewSession::open(&mut ctx).unwrap();
        let box1 = start_box1_drag(&mut ctx);

        session.close(&mut ctx);
        assert!(!session.is_open());
        assert_eq!(ctx.drag.state(), DragState::Idle);
        assert_eq!(ctx.scene.entity(box1).unwrap().renderable.material.emissive, Color::BLACK);
    }

    #[test]
    fn reopening_after_a_dropped_session_does_not_resume_the_drag() {
        let mut ctx = SandboxContext::new(&SandboxConfig::default()).unwrap();
        let session = ViewSession::open(&mut ctx).unwrap();
        let box1 = start_box1_drag(&mut ctx);
        let dropped_at = ctx.scene.entity(box1).unwrap().transform.position;
        drop(session);

        let _session = ViewSession::open(&mut ctx).unwrap();
        assert_eq!(ctx.drag.state(), DragState::Idle);
        assert_eq!(ctx.scene.entity(box1).unwrap().renderable.material.emissive, Color::BLACK);

        let elsewhere = ctx.camera.project(Vec3::new(-1.0, -1.75, 1.0)).unwrap().truncate();
        ctx.drag.pointer_move(elsewhere);
        let mut frame = FrameLoop::default();
        let report = frame.tick(&mut ctx, &mut NullRenderer, &UiLayer::default(), Instant::now());
        assert_eq!(report.drag, Some(DragUpdate::Idle));
        assert_eq!(ctx.scene.entity(box1).unwrap().transform.position, dropped_at);
    }

    struct NullRenderer;

    impl SceneRenderer for NullRenderer {
        fn resize(&mut self, _: u32, _: u32) {}

        fn draw(&mut self, _: &SceneGraph, _: &PerspectiveCamera, _: &UiLayer) -> Result<(), RenderError> {
            Ok(())
        }
    }

    #[test]
    fn subscribing_twice_is_ignored() {
        let mut registry = ListenerRegistry::default();
        assert!(registry.subscribe(Subscription::Pointer));
        assert!(!registry.subscribe(Subscription::Pointer));
        assert_eq!(registry.len(), 1);
    }
}
