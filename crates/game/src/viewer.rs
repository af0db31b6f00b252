//! First-person fly viewer: WASD on the horizontal plane, Q/E vertical,
//! mouse look while the cursor is locked.

use crate::config::ViewerConfig;
use glam::{Vec2, Vec3};
use input::{Bindings, InputState};
use renderer::Camera;

/// Radians per pixel at a mouse sensitivity of 1.0.
const RADIANS_PER_PIXEL: f32 = 0.001;

pub struct Viewer {
    pub camera: Camera,
    move_speed: f32,
    vertical_speed: f32,
    fly_mode: bool,
}

impl Viewer {
    pub fn new(config: &ViewerConfig) -> Self {
        let mut camera = Camera::new(Vec3::from_array(config.start_position));
        camera.sensitivity = config.mouse_sensitivity.max(0.0) * RADIANS_PER_PIXEL;
        let [yaw, pitch] = config.start_look;
        camera.set_yaw_pitch(yaw.to_radians(), pitch.to_radians());
        Self {
            camera,
            move_speed: config.move_speed.max(0.0),
            vertical_speed: config.vertical_speed.max(0.0),
            fly_mode: config.fly_mode,
        }
    }

    /// Apply this frame's look and movement input.
    pub fn update(&mut self, input: &InputState, bindings: &Bindings, dt: f32) {
        if input.is_cursor_locked() {
            let delta = input.mouse_delta();
            if delta != Vec2::ZERO {
                self.camera.process_mouse(delta.x, delta.y);
            }
        }

        let planar = input.movement_input(bindings);
        let vertical = if self.fly_mode {
            input.vertical_input(bindings)
        } else {
            0.0
        };
        self.camera
            .process_movement(planar, vertical, self.move_speed, self.vertical_speed, dt);
    }

    pub fn position(&self) -> Vec3 {
        self.camera.position()
    }

    pub fn forward(&self) -> Vec3 {
        self.camera.forward()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input::{ElementState, KeyCode};

    fn viewer() -> Viewer {
        Viewer::new(&ViewerConfig {
            start_position: [0.0, 1.0, 0.0],
            start_look: [0.0, 0.0],
            ..Default::default()
        })
    }

    #[test]
    fn walks_forward_at_move_speed() {
        let mut viewer = viewer();
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        viewer.update(&input, &Bindings::default(), 0.5);
        let p = viewer.position();
        assert!((p - Vec3::new(0.0, 1.0, -2.5)).length() < 1e-4);
    }

    #[test]
    fn q_flies_up_only_in_fly_mode() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyQ, ElementState::Pressed);

        let mut flying = viewer();
        flying.update(&input, &Bindings::default(), 1.0);
        assert!((flying.position().y - 6.0).abs() < 1e-4);

        let mut grounded = Viewer::new(&ViewerConfig {
            start_position: [0.0, 1.0, 0.0],
            fly_mode: false,
            ..Default::default()
        });
        grounded.update(&input, &Bindings::default(), 1.0);
        assert!((grounded.position().y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn mouse_look_needs_locked_cursor() {
        let mut viewer = viewer();
        let mut input = InputState::new();
        input.process_mouse_motion((100.0, 0.0));
        input.begin_frame();
        viewer.update(&input, &Bindings::default(), 0.016);
        assert_eq!(viewer.camera.yaw(), 0.0);

        input.set_cursor_locked(true);
        input.process_mouse_motion((100.0, 0.0));
        input.begin_frame();
        viewer.update(&input, &Bindings::default(), 0.016);
        // 100 px * 2.0 * 0.001 rad/px, turning right
        assert!((viewer.camera.yaw() + 0.2).abs() < 1e-5);
    }

    #[test]
    fn start_look_is_in_degrees() {
        let viewer = Viewer::new(&ViewerConfig::default());
        assert!((viewer.camera.pitch() - (-20f32).to_radians()).abs() < 1e-5);
    }
}
