pub mod camera;
pub mod light_helpers;
pub mod painter;
pub mod pick;
pub mod surface;

pub use camera::{OrbitControls, PerspectiveCamera};
pub use painter::ScenePainter;
pub use surface::SurfaceRenderer;

use crate::scene::SceneGraph;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create render surface: {0}")]
    SurfaceCreate(#[from] wgpu::CreateSurfaceError),
    #[error("no GPU adapter compatible with the window surface")]
    AdapterUnavailable,
    #[error("failed to create GPU device: {0}")]
    DeviceCreate(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported texture formats")]
    NoSurfaceFormat,
    #[error("failed to acquire frame: {0}")]
    Frame(#[from] wgpu::SurfaceError),
}

/// Tessellated egui output for one frame, drawn on top of the scene.
#[derive(Default)]
pub struct UiLayer {
    pub clipped_primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

/// Draws a scene snapshot through a camera to an output surface.
pub trait SceneRenderer {
    fn resize(&mut self, width: u32, height: u32);

    fn draw(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        ui: &UiLayer,
    ) -> Result<(), RenderError>;
}
