use glam::{Mat4, Vec3, Vec4};
use std::f32::consts::{FRAC_PI_2, TAU};

/// Perspective camera with an explicitly refreshed projection matrix.
///
/// Changing `fov_y_deg`, `aspect`, `near` or `far` has no effect until
/// [`PerspectiveCamera::update_projection`] is called.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov_y_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_y_deg,
            aspect,
            near,
            far,
            position: Vec3::new(0.0, 0.0, 1.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }

    pub fn update_projection(&mut self) {
        self.projection =
            Mat4::perspective_rh_gl(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far);
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }

    /// Map an NDC point (z in `[-1, 1]`) back into world space.
    pub fn unproject(&self, ndc: Vec3) -> Vec3 {
        self.view_projection().inverse().project_point3(ndc)
    }

    /// Project a world point into NDC. `None` when it lies behind the camera.
    pub fn project(&self, world: Vec3) -> Option<Vec3> {
        let clip = self.view_projection() * Vec4::new(world.x, world.y, world.z, 1.0);
        if clip.w <= 1e-5 {
            return None;
        }
        Some(clip.truncate() / clip.w)
    }

    /// Distance in front of the camera along its viewing axis.
    pub fn view_depth(&self, world: Vec3) -> f32 {
        -self.view_matrix().transform_point3(world).z
    }
}

/// Orbits the camera around a target from accumulated pointer and wheel input.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enabled: bool,
    pub target: Vec3,
    /// Fraction of the pending motion applied per update; `1.0` disables damping.
    pub damping: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_zoom: f32,
}

const PITCH_LIMIT: f32 = FRAC_PI_2 - 1e-3;
const SETTLE_EPSILON: f32 = 1e-5;

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            enabled: true,
            target,
            damping: 0.25,
            min_distance: 2.0,
            max_distance: 200.0,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_zoom: 0.0,
        }
    }

    /// Queue a rotation from a pointer drag of `dx`, `dy` pixels on a
    /// viewport `viewport_height` pixels tall.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if !self.enabled {
            return;
        }
        let h = viewport_height.max(1.0);
        self.pending_yaw -= TAU * dx / h;
        self.pending_pitch += TAU * dy / h;
    }

    /// Queue a dolly step; positive values move away from the target.
    pub fn zoom(&mut self, delta: f32) {
        if !self.enabled {
            return;
        }
        self.pending_zoom += delta;
    }

    pub fn is_settled(&self) -> bool {
        self.pending_yaw.abs() < SETTLE_EPSILON
            && self.pending_pitch.abs() < SETTLE_EPSILON
            && self.pending_zoom.abs() < SETTLE_EPSILON
    }

    /// Apply one step of pending motion. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        if !self.enabled {
            self.pending_yaw = 0.0;
            self.pending_pitch = 0.0;
            self.pending_zoom = 0.0;
            return false;
        }
        if self.is_settled() {
            return false;
        }

        let alpha = self.damping.clamp(0.0, 1.0);
        let alpha = if alpha == 0.0 { 1.0 } else { alpha };
        let yaw_step = self.pending_yaw * alpha;
        let pitch_step = self.pending_pitch * alpha;
        let zoom_step = self.pending_zoom * alpha;
        self.pending_yaw -= yaw_step;
        self.pending_pitch -= pitch_step;
        self.pending_zoom -= zoom_step;

        let offset = camera.position - self.target;
        let radius = offset.length().max(1e-4);
        let (yaw, pitch) = offset_to_yaw_pitch(offset, radius);
        let yaw = wrap_angle(yaw + yaw_step);
        let pitch = (pitch + pitch_step).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        let radius = (radius * zoom_step.exp()).clamp(self.min_distance, self.max_distance);

        camera.position = self.target + yaw_pitch_to_offset(yaw, pitch) * radius;
        camera.target = self.target;
        if self.is_settled() {
            self.pending_yaw = 0.0;
            self.pending_pitch = 0.0;
            self.pending_zoom = 0.0;
        }
        true
    }
}

fn offset_to_yaw_pitch(offset: Vec3, radius: f32) -> (f32, f32) {
    let yaw = offset.x.atan2(offset.z);
    let pitch = (offset.y / radius).clamp(-1.0, 1.0).asin();
    (yaw, pitch)
}

fn yaw_pitch_to_offset(yaw: f32, pitch: f32) -> Vec3 {
    let cos_pitch = pitch.cos();
    Vec3::new(yaw.sin() * cos_pitch, pitch.sin(), yaw.cos() * cos_pitch)
}

fn wrap_angle(angle: f32) -> f32 {
    if angle.is_finite() {
        (angle + std::f32::consts::PI).rem_euclid(TAU) - std::f32::consts::PI
    } else {
        0.0
    }
}
