use super::context::SandboxContext;
use glam::Vec2;

/// Wheel lines to orbit dolly units.
const ZOOM_PER_LINE: f32 = 0.1;

/// Client pixel position to NDC. Zero-sized viewports are treated as 1×1.
pub fn client_to_ndc(client: Vec2, width: u32, height: u32) -> Vec2 {
    let w = width.max(1) as f32;
    let h = height.max(1) as f32;
    Vec2::new(client.x / w * 2.0 - 1.0, -(client.y / h) * 2.0 + 1.0)
}

/// Routes primary-button pointer input to the drag controller, or to the
/// orbit controls when the press did not start a drag.
#[derive(Debug, Default, Clone, Copy)]
pub struct PointerInput {
    cursor: Option<Vec2>,
    orbiting: bool,
}

impl PointerInput {
    pub fn is_orbiting(&self) -> bool {
        self.orbiting
    }

    pub fn pointer_move(&mut self, client: Vec2, size: (u32, u32), ctx: &mut SandboxContext) {
        let previous = self.cursor.replace(client);
        ctx.drag.pointer_move(client_to_ndc(client, size.0, size.1));
        if self.orbiting {
            if let Some(previous) = previous {
                let delta = client - previous;
                ctx.orbit.rotate(delta.x, delta.y, size.1 as f32);
            }
        }
    }

    pub fn pointer_down(&mut self, size: (u32, u32), ctx: &mut SandboxContext) {
        let Some(client) = self.cursor else {
            return;
        };
        let ndc = client_to_ndc(client, size.0, size.1);
        let started = ctx.drag.pointer_down(ndc, &mut ctx.scene, &ctx.camera);
        self.orbiting = started.is_none() && ctx.drag.dragged().is_none() && ctx.orbit.enabled;
    }

    pub fn pointer_up(&mut self, ctx: &mut SandboxContext) {
        self.orbiting = false;
        ctx.drag.pointer_up(&mut ctx.scene);
    }

    pub fn wheel(&mut self, lines: f32, ctx: &mut SandboxContext) {
        ctx.orbit.zoom(-lines * ZOOM_PER_LINE);
    }

    pub fn left(&mut self) {
        self.cursor = None;
        self.orbiting = false;
    }
}
