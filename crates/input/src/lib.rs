//! Input handling for keyboard and mouse.

use glam::Vec2;
use std::collections::HashSet;
use std::hash::Hash;

/// Held / pressed-this-frame / released-this-frame tracking for one kind of button.
#[derive(Debug)]
struct ButtonSet<T> {
    held: HashSet<T>,
    pressed: HashSet<T>,
    released: HashSet<T>,
}

impl<T> Default for ButtonSet<T> {
    fn default() -> Self {
        Self {
            held: HashSet::new(),
            pressed: HashSet::new(),
            released: HashSet::new(),
        }
    }
}

impl<T: Copy + Eq + Hash> ButtonSet<T> {
    fn begin_frame(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }

    fn process(&mut self, button: T, state: ElementState) {
        match state {
            ElementState::Pressed => {
                // Key repeat arrives as extra Pressed events
                if self.held.insert(button) {
                    self.pressed.insert(button);
                }
            }
            ElementState::Released => {
                self.held.remove(&button);
                self.released.insert(button);
            }
        }
    }

    /// Forget everything held, e.g. when the window loses focus.
    fn release_all(&mut self) {
        self.released.extend(self.held.drain());
    }
}

/// Key and button assignments for the bench.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bindings {
    pub forward: KeyCode,
    pub back: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
    pub fly_up: KeyCode,
    pub fly_down: KeyCode,
    /// Grab on press, drop on release.
    pub grab: MouseButton,
    pub zoom_in: KeyCode,
    pub zoom_out: KeyCode,
    pub toggle_cursor: KeyCode,
    pub toggle_objects: KeyCode,
    /// Start/stop shortcut, same as clicking the live panel button.
    pub toggle_run: KeyCode,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            forward: KeyCode::KeyW,
            back: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
            fly_up: KeyCode::KeyQ,
            fly_down: KeyCode::KeyE,
            grab: MouseButton::Left,
            zoom_in: KeyCode::KeyR,
            zoom_out: KeyCode::KeyF,
            toggle_cursor: KeyCode::Escape,
            toggle_objects: KeyCode::KeyT,
            toggle_run: KeyCode::Space,
        }
    }
}

/// Manages input state for the current frame.
#[derive(Debug, Default)]
pub struct InputState {
    keys: ButtonSet<KeyCode>,
    mouse: ButtonSet<MouseButton>,

    /// Mouse position in window coordinates.
    mouse_position: Vec2,
    /// Mouse movement delta this frame.
    mouse_delta: Vec2,
    /// Accumulated mouse delta (for when cursor is locked).
    accumulated_delta: Vec2,

    /// Whether the cursor is captured/locked.
    cursor_locked: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame state. Call at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.keys.begin_frame();
        self.mouse.begin_frame();
        self.mouse_delta = self.accumulated_delta;
        self.accumulated_delta = Vec2::ZERO;
    }

    /// Process a keyboard event.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        self.keys.process(key, state);
    }

    /// Process a mouse button event.
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        self.mouse.process(button, state);
    }

    /// Process mouse movement.
    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        self.accumulated_delta.x += delta.0 as f32;
        self.accumulated_delta.y += delta.1 as f32;
    }

    /// Process cursor position update.
    pub fn process_cursor_position(&mut self, position: (f64, f64)) {
        self.mouse_position = Vec2::new(position.0 as f32, position.1 as f32);
    }

    /// Window lost focus: treat every held key and button as released.
    pub fn focus_lost(&mut self) {
        log::debug!("Focus lost, releasing held input");
        self.keys.release_all();
        self.mouse.release_all();
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys.held.contains(&key)
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys.pressed.contains(&key)
    }

    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys.released.contains(&key)
    }

    pub fn is_mouse_held(&self, button: MouseButton) -> bool {
        self.mouse.held.contains(&button)
    }

    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse.pressed.contains(&button)
    }

    pub fn is_mouse_released(&self, button: MouseButton) -> bool {
        self.mouse.released.contains(&button)
    }

    /// Get the mouse position in window coordinates.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Get the mouse movement delta for this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Check if the cursor is locked.
    pub fn is_cursor_locked(&self) -> bool {
        self.cursor_locked
    }

    /// Set cursor lock state.
    pub fn set_cursor_locked(&mut self, locked: bool) {
        self.cursor_locked = locked;
    }

    /// Planar movement as a normalized vector: x = strafe, y = forward.
    pub fn movement_input(&self, bindings: &Bindings) -> Vec2 {
        let mut movement = Vec2::ZERO;

        if self.is_key_held(bindings.forward) {
            movement.y += 1.0;
        }
        if self.is_key_held(bindings.back) {
            movement.y -= 1.0;
        }
        if self.is_key_held(bindings.left) {
            movement.x -= 1.0;
        }
        if self.is_key_held(bindings.right) {
            movement.x += 1.0;
        }

        movement.normalize_or_zero()
    }

    /// Vertical fly input: +1 up, -1 down, 0 when both or neither are held.
    pub fn vertical_input(&self, bindings: &Bindings) -> f32 {
        let mut v = 0.0;
        if self.is_key_held(bindings.fly_up) {
            v += 1.0;
        }
        if self.is_key_held(bindings.fly_down) {
            v -= 1.0;
        }
        v
    }
}

// Re-export for convenience
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_is_reported_for_one_frame() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyT, ElementState::Pressed);
        assert!(input.is_key_pressed(KeyCode::KeyT));
        assert!(input.is_key_held(KeyCode::KeyT));

        input.begin_frame();
        assert!(!input.is_key_pressed(KeyCode::KeyT));
        assert!(input.is_key_held(KeyCode::KeyT));
    }

    #[test]
    fn key_repeat_does_not_press_again() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyR, ElementState::Pressed);
        input.begin_frame();
        input.process_keyboard(KeyCode::KeyR, ElementState::Pressed);
        assert!(!input.is_key_pressed(KeyCode::KeyR));
    }

    #[test]
    fn click_within_one_frame_reports_both_edges() {
        let mut input = InputState::new();
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        input.process_mouse_button(MouseButton::Left, ElementState::Released);
        assert!(input.is_mouse_pressed(MouseButton::Left));
        assert!(input.is_mouse_released(MouseButton::Left));
        assert!(!input.is_mouse_held(MouseButton::Left));
    }

    #[test]
    fn focus_loss_releases_held_buttons() {
        let mut input = InputState::new();
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        input.begin_frame();
        input.focus_lost();
        assert!(input.is_mouse_released(MouseButton::Left));
        assert!(!input.is_mouse_held(MouseButton::Left));
    }

    #[test]
    fn diagonal_movement_is_normalized() {
        let bindings = Bindings::default();
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        input.process_keyboard(KeyCode::KeyD, ElementState::Pressed);
        let m = input.movement_input(&bindings);
        assert!((m.length() - 1.0).abs() < 1e-6);
        assert!(m.x > 0.0 && m.y > 0.0);
    }

    #[test]
    fn opposing_fly_keys_cancel() {
        let bindings = Bindings::default();
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyE, ElementState::Pressed);
        assert_eq!(input.vertical_input(&bindings), -1.0);
        input.process_keyboard(KeyCode::KeyQ, ElementState::Pressed);
        assert_eq!(input.vertical_input(&bindings), 0.0);
    }

    #[test]
    fn mouse_motion_accumulates_until_frame_start() {
        let mut input = InputState::new();
        input.process_mouse_motion((3.0, -1.0));
        input.process_mouse_motion((2.0, 1.0));
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::new(5.0, 0.0));
        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }
}
