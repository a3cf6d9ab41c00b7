use super::context::SandboxContext;
use crate::interaction::drag::DragUpdate;
use crate::render::{SceneRenderer, UiLayer};
use std::time::Instant;

/// What one tick did; mostly for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub loaded: usize,
    pub drag: Option<DragUpdate>,
    pub camera_moved: bool,
    pub drawn: bool,
}

/// Per-frame driver. Failures are logged and never stop the next tick.
#[derive(Debug, Default)]
pub struct FrameLoop {
    frames: u64,
}

impl FrameLoop {
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tick(
        &mut self,
        ctx: &mut SandboxContext,
        renderer: &mut dyn SceneRenderer,
        ui: &UiLayer,
        now: Instant,
    ) -> TickReport {
        self.frames += 1;

        let loaded = ctx.assets.poll(&mut ctx.scene).len();

        let drag = match ctx.drag.update(&mut ctx.scene, &ctx.camera) {
            Ok(update) => Some(update),
            Err(err) => {
                log::error!("frame {}: drag update failed: {}", self.frames, err);
                None
            }
        };

        let camera_moved = ctx.orbit.update(&mut ctx.camera);

        ctx.stats.update(now);

        let drawn = match renderer.draw(&ctx.scene, &ctx.camera, ui) {
            Ok(()) => true,
            Err(err) => {
                log::error!("frame {}: draw failed: {}", self.frames, err);
                false
            }
        };

        TickReport {
            loaded,
            drag,
            camera_moved,
            drawn,
        }
    }
}
