//! Per-frame bench update: viewer, manipulation, panel clicks, the fixed
//! physics steps and the machine model.

use glam::{Vec2, Vec3};
use interaction::{AimRay, ManipulationInput};
use physics::{CollisionGroup, QueryMask};

use crate::panel::PanelControl;
use crate::scene;
use crate::{GameState, BEACON_SOUND};

/// Seconds between window title refreshes.
const TITLE_INTERVAL: f32 = 0.25;

/// Run one frame. Called from `GameState::update()`.
pub fn frame(state: &mut GameState, dt: f32) {
    let locked = state.input.is_cursor_locked();

    state.viewer.update(&state.input, &state.bindings, dt);

    // Manipulation runs only with the cursor captured; unlocking drops
    // whatever is held before any fixed step below.
    let (origin, direction) = state.viewer.camera.aim_ray();
    let aim = AimRay::new(origin, direction);
    let manipulation = ManipulationInput {
        grab_pressed: locked && state.input.is_mouse_pressed(state.bindings.grab),
        release_pressed: state.input.is_mouse_released(state.bindings.grab),
        zoom_in: state.input.is_key_held(state.bindings.zoom_in),
        zoom_out: state.input.is_key_held(state.bindings.zoom_out),
        aim_enabled: locked,
    };
    state.controller.update(
        &manipulation,
        &aim,
        dt,
        &state.world,
        &mut state.physics,
        &mut state.zones,
    );

    if !locked {
        handle_panel_mouse(state);
    }

    let step = state.time.fixed_timestep_seconds();
    while state.time.should_fixed_update() {
        state
            .controller
            .fixed_update(&aim, step, &mut state.physics, &mut state.zones);
        state.physics.step();
        state.zones.sync_volumes(&state.physics, &state.world);
    }

    state.gearbox.update(dt);
    state.panel.update(dt, &state.gearbox, locked);
    state
        .telemetry
        .update(&state.gearbox, state.time.elapsed_seconds());
    scene::animate(
        &mut state.world,
        &state.gearbox,
        &state.panel,
        &state.telemetry,
        &state.zones,
    );

    state.beacon_loop.follow(
        state.gearbox.is_running(),
        state.audio.as_mut(),
        BEACON_SOUND,
        state.scene.beacon_position,
        state.config.telemetry.beacon_volume,
    );
    if let Some(audio) = state.audio.as_mut() {
        audio.update_listener(state.viewer.position(), state.viewer.forward(), Vec3::Y);
    }

    state.title_timer -= dt;
    if state.title_timer <= 0.0 {
        state.title_timer = TITLE_INTERVAL;
        let title = format!(
            "Gearbench | {} | {:.0} fps",
            state.telemetry.summary(state.gearbox.is_reverse()),
            state.time.fps()
        );
        state.renderer.window.set_title(&title);
    }

    state.input.begin_frame();
}

/// Cursor clicks and drags on the control panel.
fn handle_panel_mouse(state: &mut GameState) {
    let button = state.bindings.grab;

    if state.input.is_mouse_pressed(button) {
        if let Some(control) = control_under_cursor(state) {
            state.panel.press(control, &mut state.gearbox);
        }
    }

    let delta_x = state.input.mouse_delta().x;
    if delta_x != 0.0 && state.panel.knob.is_dragging() {
        state.panel.drag(delta_x, &mut state.gearbox);
    }

    if state.input.is_mouse_released(button) {
        state.panel.release();
    }
}

/// Panel control hit by a ray through the cursor, if any.
fn control_under_cursor(state: &GameState) -> Option<PanelControl> {
    let (width, height) = state.renderer.dimensions();
    let viewport = Vec2::new(width as f32, height as f32);
    let (origin, direction) = state
        .viewer
        .camera
        .screen_ray(state.input.mouse_position(), viewport);

    let hit = state.physics.raycast(
        origin,
        direction,
        state.config.panel.max_click_distance,
        QueryMask::new(CollisionGroup::mask(&[CollisionGroup::Panel])),
    )?;
    let entity = state.physics.collider_entity(hit.collider)?;
    let control = state.world.get::<&PanelControl>(entity).ok().map(|c| *c);
    if control.is_none() {
        log::debug!("Click hit {:?} with no panel control", entity);
    }
    control
}
