//! Screen-space overlay: crosshair, gauge bars and the parts-seated strip.

use renderer::OverlayBuilder;

use crate::GameState;

const GAUGE_WIDTH: f32 = 220.0;
const GAUGE_HEIGHT: f32 = 10.0;
const MARGIN: f32 = 16.0;
const PIP_SIZE: f32 = 12.0;

/// Build the overlay for a `sw` x `sh` pixel window.
pub fn build(state: &GameState, sw: f32, sh: f32) -> OverlayBuilder {
    let mut ob = OverlayBuilder::new(sw, sh);

    if state.input.is_cursor_locked() {
        let color = if state.controller.is_holding() {
            [1.0, 0.85, 0.3, 0.9]
        } else {
            [1.0, 1.0, 1.0, 0.8]
        };
        ob.add_crosshair(8.0, 2.0, color);
    }

    // Bottom-left: RPM above torque, filled in the color of their band
    let x = MARGIN;
    let torque_y = sh - MARGIN - GAUGE_HEIGHT;
    let rpm_y = torque_y - GAUGE_HEIGHT - 8.0;

    let rpm = &state.telemetry.rpm;
    ob.add_gauge(
        x,
        rpm_y,
        GAUGE_WIDTH,
        GAUGE_HEIGHT,
        rpm.marker_fraction(),
        Some(rpm.marker_fraction()),
        opaque(rpm.zone().color()),
    );

    let torque = &state.telemetry.torque;
    ob.add_gauge(
        x,
        torque_y,
        GAUGE_WIDTH,
        GAUGE_HEIGHT,
        torque.marker_fraction(),
        None,
        opaque(torque.zone().color()),
    );

    // Bottom-right: one pip per loose part, green once seated in a zone
    let held = state.controller.held_entity();
    let count = state.scene.grabbables.len() as f32;
    let mut px = sw - MARGIN - count * (PIP_SIZE + 6.0);
    for &entity in &state.scene.grabbables {
        let seated = state
            .zones
            .iter()
            .any(|(_, zone)| zone.committed() == Some(entity));
        let color = if seated {
            [0.1, 0.9, 0.2, 0.9]
        } else if held == Some(entity) {
            [1.0, 0.85, 0.3, 0.9]
        } else {
            [0.4, 0.4, 0.4, 0.7]
        };
        ob.add_rect(px, sh - MARGIN - PIP_SIZE, PIP_SIZE, PIP_SIZE, color);
        px += PIP_SIZE + 6.0;
    }

    ob
}

fn opaque(rgb: [f32; 3]) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], 0.9]
}
