//! First-person camera for the bench viewer.

use bytemuck::{Pod, Zeroable};
use engine_core::Transform;
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// FPS camera with configurable FOV and clipping planes.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera transform (position and rotation).
    pub transform: Transform,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
    /// Radians of rotation per pixel of mouse motion.
    pub sensitivity: f32,
    pitch: f32,
    yaw: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            fov_degrees: 70.0,
            near: 0.05,
            far: 200.0,
            aspect: 16.0 / 9.0,
            sensitivity: 0.002,
            pitch: 0.0,
            yaw: 0.0,
        }
    }
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        Self {
            transform: Transform::from_position(position),
            ..Default::default()
        }
    }

    /// Update aspect ratio (call on window resize).
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Mouse look. Pitch is clamped just short of straight up/down.
    pub fn process_mouse(&mut self, delta_x: f32, delta_y: f32) {
        self.set_yaw_pitch(
            self.yaw - delta_x * self.sensitivity,
            self.pitch - delta_y * self.sensitivity,
        );
    }

    /// Walk on the horizontal plane (`input.y` forward, `input.x` strafe)
    /// and fly along world Y.
    pub fn process_movement(&mut self, input: Vec2, vertical: f32, speed: f32, vertical_speed: f32, dt: f32) {
        let forward = self.transform.forward();
        let right = self.transform.right();
        let forward_flat = Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero();
        let right_flat = Vec3::new(right.x, 0.0, right.z).normalize_or_zero();

        let planar = (forward_flat * input.y + right_flat * input.x).normalize_or_zero();
        let delta = planar * speed * dt + Vec3::Y * vertical.clamp(-1.0, 1.0) * vertical_speed * dt;
        if delta != Vec3::ZERO {
            self.transform.translate(delta);
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        let eye = self.transform.position;
        Mat4::look_at_rh(eye, eye + self.transform.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn forward(&self) -> Vec3 {
        self.transform.forward()
    }

    pub fn right(&self) -> Vec3 {
        self.transform.right()
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Set yaw and pitch directly (in radians) and rebuild rotation.
    pub fn set_yaw_pitch(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
        self.transform.rotation = Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch);
    }

    /// Ray through the center of the viewport: `(origin, direction)`.
    pub fn aim_ray(&self) -> (Vec3, Vec3) {
        (self.position(), self.forward())
    }

    /// Ray through a window pixel (origin top-left), for clicking on things
    /// while the cursor is free.
    pub fn screen_ray(&self, cursor: Vec2, viewport: Vec2) -> (Vec3, Vec3) {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return self.aim_ray();
        }
        let ndc = Vec2::new(
            cursor.x / viewport.x * 2.0 - 1.0,
            1.0 - cursor.y / viewport.y * 2.0,
        );
        let inverse = self.view_projection_matrix().inverse();
        let unproject = |z: f32| {
            let p = inverse * Vec4::new(ndc.x, ndc.y, z, 1.0);
            p.truncate() / p.w
        };
        let near = unproject(0.0);
        let far = unproject(1.0);
        let direction = (far - near).normalize_or_zero();
        if direction == Vec3::ZERO {
            return self.aim_ray();
        }
        (self.position(), direction)
    }
}

/// Camera uniform data for GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 4], // w unused, padding
    /// Direction light travels, xyz normalized; w = ambient level.
    pub light: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        let light = Vec3::new(-0.4, -1.0, -0.3).normalize();
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            position: [0.0; 4],
            light: [light.x, light.y, light.z, 0.25],
        }
    }

    pub fn update(&mut self, camera: &Camera) {
        self.view_proj = camera.view_projection_matrix().to_cols_array_2d();
        let pos = camera.position();
        self.position = [pos.x, pos.y, pos.z, 1.0];
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}
