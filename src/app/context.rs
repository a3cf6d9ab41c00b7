use super::timing::FrameStats;
use super::AppError;
use crate::assets::{AssetManager, AssetRequest};
use crate::config::SandboxConfig;
use crate::interaction::drag::DragController;
use crate::render::{OrbitControls, PerspectiveCamera};
use crate::scene::setup::{self, DefaultScene};
use crate::scene::SceneGraph;
use glam::Vec3;

/// Everything the per-event and per-frame code mutates, passed explicitly.
pub struct SandboxContext {
    pub scene: SceneGraph,
    pub handles: DefaultScene,
    pub camera: PerspectiveCamera,
    pub orbit: OrbitControls,
    pub drag: DragController,
    pub stats: FrameStats,
    pub assets: AssetManager,
}

impl SandboxContext {
    pub fn new(config: &SandboxConfig) -> Result<Self, AppError> {
        let mut scene = SceneGraph::new();
        let handles = setup::populate(&mut scene)?;

        let camera_config = &config.camera;
        let aspect = config.window.width.max(1) as f32 / config.window.height.max(1) as f32;
        let mut camera = PerspectiveCamera::new(
            camera_config.fov_y_deg,
            aspect,
            camera_config.near,
            camera_config.far,
        );
        camera.position = Vec3::from_array(camera_config.position);
        camera.target = Vec3::from_array(camera_config.target);

        let mut orbit = OrbitControls::new(camera.target);
        orbit.enabled = config.interaction.orbit_enabled;

        let drag = DragController::new(config.interaction.highlight, config.highlight_color()?);

        let mut assets = AssetManager::new();
        for entry in &config.assets {
            if let Err(err) = assets.request(AssetRequest::from(entry)) {
                log::warn!("assets: could not queue {}: {}", entry.path.display(), err);
            }
        }

        Ok(Self {
            scene,
            handles,
            camera,
            orbit,
            drag,
            stats: FrameStats::new(),
            assets,
        })
    }
}
