use glam::{Mat4, Vec3};

/// Discrete movement directions understood by [`Camera::process_movement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// First-person camera driven by yaw/pitch angles.
///
/// Angles and field of view are stored in degrees.  Yaw 0 looks down +X and
/// yaw -90 looks down -Z, matching the usual right-handed, Y-up convention.
/// `front`, `right` and `up` are derived from the angles and are refreshed by
/// every method that changes them.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub world_up: Vec3,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    yaw: f32,
    pitch: f32,
    // --- projection parameters --------------------------------------------
    pub fov: f32,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_yaw_pitch(Vec3::ZERO, -90.0, 0.0, 45.0, 1.0)
    }
}

impl Camera {
    pub const MAX_PITCH: f32 = 89.0;
    pub const MIN_FOV: f32 = 10.0;
    pub const MAX_FOV: f32 = 90.0;

    /// Camera at `position` with explicit yaw/pitch (degrees).
    pub fn from_yaw_pitch(position: Vec3, yaw: f32, pitch: f32, fov: f32, aspect: f32) -> Self {
        let mut camera = Self {
            position,
            world_up: Vec3::Y,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            yaw,
            pitch: pitch.clamp(-Self::MAX_PITCH, Self::MAX_PITCH),
            fov,
            aspect,
            znear: 0.1,
            zfar: 1000.0,
        };
        camera.update_vectors();
        camera
    }

    /// Camera at `position` looking towards `target`.  Yaw and pitch are
    /// recovered from the direction so later mouse input continues smoothly.
    pub fn looking_at(position: Vec3, target: Vec3, fov: f32, aspect: f32) -> Self {
        let dir = (target - position).normalize_or(Vec3::NEG_Z);
        let yaw = dir.z.atan2(dir.x).to_degrees();
        let pitch = dir.y.atan2(dir.x.hypot(dir.z)).to_degrees();
        Self::from_yaw_pitch(position, yaw, pitch, fov, aspect)
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Perspective projection with a `[0, 1]` depth range, as wgpu expects.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.znear, self.zfar)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update the aspect ratio when the viewport is resized.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn set_perspective(&mut self, fov: f32, znear: f32, zfar: f32) {
        self.fov = fov;
        self.znear = znear;
        self.zfar = zfar;
    }

    /// Moves `speed * dt` world units along the requested direction.  Up and
    /// down follow the world up axis, not the view.
    pub fn process_movement(&mut self, direction: CameraMovement, dt: f32, speed: f32) {
        let velocity = speed * dt;
        let offset = match direction {
            CameraMovement::Forward => self.front,
            CameraMovement::Backward => -self.front,
            CameraMovement::Left => -self.right,
            CameraMovement::Right => self.right,
            CameraMovement::Up => self.world_up,
            CameraMovement::Down => -self.world_up,
        };
        self.position += offset * velocity;
    }

    /// Applies a mouse offset (already oriented so positive `dy` looks up).
    /// Pitch is clamped to ±89° so the view never flips over the pole.
    pub fn process_mouse_movement(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.yaw += dx * sensitivity;
        self.pitch = (self.pitch + dy * sensitivity).clamp(-Self::MAX_PITCH, Self::MAX_PITCH);
        self.update_vectors();
    }

    /// Zooms by narrowing the field of view; clamped to 10°..90°.
    pub fn process_mouse_scroll(&mut self, dy: f32) {
        self.fov = (self.fov - dy).clamp(Self::MIN_FOV, Self::MAX_FOV);
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            pitch.cos() * yaw.cos(),
            pitch.sin(),
            pitch.cos() * yaw.sin(),
        )
        .normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_looks_down_negative_z() {
        let camera = Camera::default();
        assert!(camera.front().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!(camera.right().abs_diff_eq(Vec3::X, 1e-6));
        assert!(camera.up().abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn looking_at_recovers_direction() {
        let camera = Camera::looking_at(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 2.0, 3.0), 60.0, 1.5);
        assert!(camera.front().abs_diff_eq(Vec3::X, 1e-5));
        assert!(camera.yaw().abs() < 1e-4);
        assert!(camera.pitch().abs() < 1e-4);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::default();
        camera.process_mouse_movement(0.0, 1000.0, 1.0);
        assert_eq!(camera.pitch(), Camera::MAX_PITCH);
        camera.process_mouse_movement(0.0, -5000.0, 1.0);
        assert_eq!(camera.pitch(), -Camera::MAX_PITCH);
    }

    #[test]
    fn scroll_clamps_field_of_view() {
        let mut camera = Camera::default();
        camera.process_mouse_scroll(100.0);
        assert_eq!(camera.fov, Camera::MIN_FOV);
        camera.process_mouse_scroll(-100.0);
        assert_eq!(camera.fov, Camera::MAX_FOV);
    }

    #[test]
    fn movement_follows_front_and_world_up() {
        let mut camera = Camera::default();
        camera.process_movement(CameraMovement::Forward, 0.5, 2.0);
        assert!(camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6));
        camera.process_movement(CameraMovement::Right, 1.0, 1.0);
        assert!(camera.position.abs_diff_eq(Vec3::new(1.0, 0.0, -1.0), 1e-6));
        camera.process_movement(CameraMovement::Up, 1.0, 3.0);
        assert!(camera.position.abs_diff_eq(Vec3::new(1.0, 3.0, -1.0), 1e-6));
    }

    #[test]
    fn view_matrix_places_eye_at_origin() {
        let camera = Camera::from_yaw_pitch(Vec3::new(2.0, 1.0, -4.0), 30.0, 10.0, 45.0, 1.0);
        let eye = camera.view_matrix().transform_point3(camera.position);
        assert!(eye.abs_diff_eq(Vec3::ZERO, 1e-5));
    }
}
