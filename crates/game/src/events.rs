//! Window and device event handling for GameState.

use winit::event::{DeviceEvent, WindowEvent};
use winit::window::CursorGrabMode;

impl crate::GameState {
    /// Handle a window event. Returns true if the app should exit.
    pub(crate) fn handle_window_event(&mut self, event: WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested => {
                self.running = false;
                true
            }
            WindowEvent::Resized(size) => {
                self.renderer.resize(size);
                self.viewer.camera.set_aspect(size.width, size.height);
                false
            }
            WindowEvent::Focused(false) => {
                self.input.focus_lost();
                self.set_cursor_locked(false);
                false
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let winit::keyboard::PhysicalKey::Code(key) = event.physical_key {
                    self.input.process_keyboard(key, event.state);

                    if event.state.is_pressed() && !event.repeat {
                        if key == self.bindings.toggle_cursor {
                            let locked = self.input.is_cursor_locked();
                            self.set_cursor_locked(!locked);
                        } else if key == self.bindings.toggle_objects {
                            self.toggle.toggle(&mut self.world);
                            log::info!(
                                "Housing {}",
                                if self.toggle.is_hidden() { "hidden" } else { "shown" }
                            );
                        } else if key == self.bindings.toggle_run {
                            self.panel.toggle_run(&mut self.gearbox);
                        }
                    }
                }
                false
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input.process_mouse_button(button, state);
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.process_cursor_position((position.x, position.y));
                false
            }
            WindowEvent::RedrawRequested => {
                self.update();
                if let Err(e) = self.render() {
                    log::error!("Render error: {}", e);
                }
                self.renderer.window.request_redraw();
                false
            }
            _ => false,
        }
    }

    /// Handle raw device events. Motion feeds mouse look while locked and
    /// knob drags while the cursor is free.
    pub(crate) fn handle_device_event(&mut self, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.input.process_mouse_motion(delta);
        }
    }

    /// Capture or free the cursor. A free cursor is needed to click the panel.
    pub(crate) fn set_cursor_locked(&mut self, locked: bool) {
        let window = &self.renderer.window;
        if locked {
            let _ = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            window.set_cursor_visible(false);
        } else {
            let _ = window.set_cursor_grab(CursorGrabMode::None);
            window.set_cursor_visible(true);
        }
        self.input.set_cursor_locked(locked);
        log::debug!("Cursor {}", if locked { "locked" } else { "free" });
    }
}
