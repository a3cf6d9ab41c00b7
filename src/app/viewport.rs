use crate::render::{PerspectiveCamera, SceneRenderer};

/// Keeps the camera projection and the render target in step with the
/// window size.
#[derive(Debug, Clone, Copy)]
pub struct ViewportManager {
    width: u32,
    height: u32,
}

impl ViewportManager {
    pub fn new(width: u32, height: u32, camera: &mut PerspectiveCamera) -> Self {
        let viewport = Self {
            width: width.max(1),
            height: height.max(1),
        };
        camera.aspect = viewport.aspect();
        camera.update_projection();
        viewport
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Returns `false` when the clamped size is unchanged.
    pub fn resize(
        &mut self,
        width: u32,
        height: u32,
        camera: &mut PerspectiveCamera,
        target: &mut dyn SceneRenderer,
    ) -> bool {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width, self.height) {
            return false;
        }
        self.width = width;
        self.height = height;
        camera.aspect = self.aspect();
        camera.update_projection();
        target.resize(width, height);
        log::debug!("viewport: {}x{} (aspect {:.3})", width, height, camera.aspect);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RenderError, UiLayer};
    use crate::scene::SceneGraph;

    #[derive(Default)]
    struct SizeProbe {
        resizes: Vec<(u32, u32)>,
    }

    impl SceneRenderer for SizeProbe {
        fn resize(&mut self, width: u32, height: u32) {
            self.resizes.push((width, height));
        }

        fn draw(&mut self, _: &SceneGraph, _: &PerspectiveCamera, _: &UiLayer) -> Result<(), RenderError> {
            Ok(())
        }
    }

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(45.0, 1.0, 1.0, 1000.0)
    }

    #[test]
    fn resize_sets_exact_aspect_and_target_size() {
        let mut camera = camera();
        let mut probe = SizeProbe::default();
        let mut viewport = ViewportManager::new(800, 600, &mut camera);
        let before = camera.projection_matrix();

        assert!(viewport.resize(1920, 1080, &mut camera, &mut probe));
        assert_eq!(camera.aspect, 1920.0 / 1080.0);
        assert_ne!(camera.projection_matrix(), before);
        assert_eq!(probe.resizes, vec![(1920, 1080)]);
    }

    #[test]
    fn repeated_size_is_a_no_op() {
        let mut camera = camera();
        let mut probe = SizeProbe::default();
        let mut viewport = ViewportManager::new(800, 600, &mut camera);
        assert!(!viewport.resize(800, 600, &mut camera, &mut probe));
        assert!(viewport.resize(1024, 768, &mut camera, &mut probe));
        assert!(!viewport.resize(1024, 768, &mut camera, &mut probe));
        assert_eq!(probe.resizes.len(), 1);
    }

    #[test]
    fn zero_height_is_clamped() {
        let mut camera = camera();
        let mut probe = SizeProbe::default();
        let mut viewport = ViewportManager::new(800, 600, &mut camera);
        viewport.resize(1280, 0, &mut camera, &mut probe);
        assert!(camera.aspect.is_finite());
        assert_eq!(camera.aspect, 1280.0);
        assert!(camera.projection_matrix().is_finite());
        assert_eq!(viewport.size(), (1280, 1));
    }
}
