//! Control panel: start/stop buttons, reset button, speed knob and
//! direction switch.
//!
//! Controls are plain state machines. The scene resolves a cursor click to a
//! [`PanelControl`] and the renderer reads plunger offsets, lamp states and
//! lever/knob angles back out.

use crate::config::{KnobConfig, PanelConfig, SwitchConfig};
use crate::gearbox::GearboxDrive;
use engine_core::{remap_clamped, smooth_rotation_towards, smooth_scalar};
use glam::Quat;

/// Emissive strength of a lit lamp.
pub const LAMP_INTENSITY: f32 = 3.5;

/// ECS component marking a clickable panel collider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelControl {
    Start,
    Stop,
    Reset,
    Knob,
    Switch,
}

/// Latching start/stop pair. The plunger of the active state stays down.
#[derive(Debug, Clone)]
pub struct StartStopButtons {
    armed: bool,
    running: bool,
    press_depth: f32,
    press_speed: f32,
    start_offset: f32,
    stop_offset: f32,
}

impl StartStopButtons {
    pub fn new(config: &PanelConfig, running: bool) -> Self {
        Self {
            armed: !config.start_inactive_until_start_click || running,
            running,
            press_depth: config.press_depth,
            press_speed: config.press_speed,
            start_offset: 0.0,
            stop_offset: 0.0,
        }
    }

    pub fn click_start(&mut self, gearbox: &mut GearboxDrive) {
        if !self.armed {
            log::debug!("Start/stop buttons armed");
        }
        self.armed = true;
        self.running = true;
        gearbox.start();
    }

    /// Ignored until the first start click. Returns whether it took effect.
    pub fn click_stop(&mut self, gearbox: &mut GearboxDrive) -> bool {
        if !self.armed {
            return false;
        }
        self.running = false;
        gearbox.stop();
        true
    }

    /// Force a state from outside (reset button). Arms the buttons.
    pub fn set_running(&mut self, running: bool, gearbox: &mut GearboxDrive) {
        self.armed = true;
        self.running = running;
        gearbox.set_running(running);
    }

    /// Follow the gearbox and animate the plungers.
    pub fn update(&mut self, dt: f32, gearbox_running: bool) {
        self.running = gearbox_running;
        let (start_target, stop_target) = match (self.armed, self.running) {
            (false, _) => (0.0, 0.0),
            (true, true) => (self.press_depth, 0.0),
            (true, false) => (0.0, self.press_depth),
        };
        self.start_offset = smooth_scalar(self.start_offset, start_target, self.press_speed, dt);
        self.stop_offset = smooth_scalar(self.stop_offset, stop_target, self.press_speed, dt);
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn start_lit(&self) -> bool {
        self.armed && self.running
    }

    pub fn stop_lit(&self) -> bool {
        self.armed && !self.running
    }

    /// How far each plunger is pushed in, in meters.
    pub fn plunger_offsets(&self) -> (f32, f32) {
        (self.start_offset, self.stop_offset)
    }
}

/// Momentary reset: stops everything and zeroes the speed.
#[derive(Debug, Clone)]
pub struct ResetButton {
    flash_seconds: f32,
    flash_remaining: f32,
    press_depth: f32,
    press_speed: f32,
    offset: f32,
}

impl ResetButton {
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            flash_seconds: config.reset_flash_seconds.max(0.0),
            flash_remaining: 0.0,
            press_depth: config.press_depth,
            press_speed: config.press_speed,
            offset: 0.0,
        }
    }

    pub fn click(&mut self, buttons: &mut StartStopButtons, gearbox: &mut GearboxDrive) {
        log::info!("Reset pressed");
        buttons.set_running(false, gearbox);
        gearbox.stop();
        gearbox.set_screw_rpm(0.0);
        self.flash_remaining = self.flash_seconds;
    }

    pub fn update(&mut self, dt: f32) {
        self.flash_remaining = (self.flash_remaining - dt.max(0.0)).max(0.0);
        let target = if self.is_flashing() { self.press_depth } else { 0.0 };
        self.offset = smooth_scalar(self.offset, target, self.press_speed, dt);
    }

    pub fn is_flashing(&self) -> bool {
        self.flash_remaining > 0.0
    }

    pub fn plunger_offset(&self) -> f32 {
        self.offset
    }
}

/// Rotary speed set point, dragged horizontally with the cursor.
#[derive(Debug, Clone)]
pub struct SpeedKnob {
    config: KnobConfig,
    angle: f32,
    dragging: bool,
    enabled: bool,
}

impl SpeedKnob {
    pub fn new(config: &KnobConfig, rpm: f32) -> Self {
        let mut knob = Self {
            config: config.clone(),
            angle: config.min_angle,
            dragging: false,
            enabled: false,
        };
        knob.sync_from_rpm(rpm);
        knob
    }

    /// Point the knob at `rpm` without touching the gearbox.
    pub fn sync_from_rpm(&mut self, rpm: f32) {
        let c = &self.config;
        self.angle = remap_clamped(rpm, c.min_rpm, c.max_rpm, c.min_angle, c.max_angle);
    }

    /// Mouse-down on the knob. Returns whether a drag started.
    pub fn begin_drag(&mut self) -> bool {
        self.dragging = self.enabled;
        self.dragging
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Turn by a horizontal cursor motion and push the new speed into the gearbox.
    pub fn drag(&mut self, delta_x: f32, gearbox: &mut GearboxDrive) {
        if !self.dragging {
            return;
        }
        let c = &self.config;
        let (lo, hi) = (c.min_angle.min(c.max_angle), c.min_angle.max(c.max_angle));
        self.angle = (self.angle + delta_x * c.rotate_sensitivity).clamp(lo, hi);
        gearbox.set_screw_rpm(self.rpm());
    }

    /// Enable only while running (if configured) and while the cursor is free.
    pub fn update(&mut self, gearbox_running: bool, cursor_locked: bool) {
        let enabled = (!self.config.only_when_running || gearbox_running) && !cursor_locked;
        if !enabled && self.dragging {
            self.dragging = false;
        }
        self.enabled = enabled;
    }

    pub fn rpm(&self) -> f32 {
        let c = &self.config;
        remap_clamped(self.angle, c.min_angle, c.max_angle, c.min_rpm, c.max_rpm)
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}

/// Forward/reverse toggle lever.
#[derive(Debug, Clone)]
pub struct DirectionSwitch {
    config: SwitchConfig,
    reverse: bool,
    lever: Quat,
}

impl DirectionSwitch {
    pub fn new(config: &SwitchConfig, reverse: bool) -> Self {
        let mut switch = Self {
            config: config.clone(),
            reverse,
            lever: Quat::IDENTITY,
        };
        switch.lever = switch.target_rotation();
        switch
    }

    pub fn click(&mut self, gearbox: &mut GearboxDrive) {
        gearbox.toggle_reverse();
        self.reverse = gearbox.is_reverse();
    }

    pub fn update(&mut self, dt: f32, reverse: bool) {
        self.reverse = reverse;
        let target = self.target_rotation();
        self.lever = smooth_rotation_towards(self.lever, target, self.config.lever_lerp_speed, dt);
    }

    fn target_rotation(&self) -> Quat {
        let degrees = if self.reverse {
            self.config.reverse_angle
        } else {
            self.config.forward_angle
        };
        Quat::from_rotation_x(degrees.to_radians())
    }

    /// Lever tilt about the switch's local X axis.
    pub fn lever_rotation(&self) -> Quat {
        self.lever
    }

    pub fn forward_lit(&self) -> bool {
        !self.reverse
    }

    pub fn reverse_lit(&self) -> bool {
        self.reverse
    }
}

/// Every control on the panel.
#[derive(Debug, Clone)]
pub struct ControlPanel {
    pub buttons: StartStopButtons,
    pub reset: ResetButton,
    pub knob: SpeedKnob,
    pub switch: DirectionSwitch,
}

impl ControlPanel {
    pub fn new(config: &PanelConfig, gearbox: &GearboxDrive) -> Self {
        Self {
            buttons: StartStopButtons::new(config, gearbox.is_running()),
            reset: ResetButton::new(config),
            knob: SpeedKnob::new(&config.knob, gearbox.screw_rpm()),
            switch: DirectionSwitch::new(&config.switch, gearbox.is_reverse()),
        }
    }

    /// Mouse-down on `control`.
    pub fn press(&mut self, control: PanelControl, gearbox: &mut GearboxDrive) {
        log::debug!("Panel press: {:?}", control);
        match control {
            PanelControl::Start => self.buttons.click_start(gearbox),
            PanelControl::Stop => {
                if !self.buttons.click_stop(gearbox) {
                    log::debug!("Stop ignored, buttons not armed yet");
                }
            }
            PanelControl::Reset => {
                self.reset.click(&mut self.buttons, gearbox);
                self.knob.sync_from_rpm(gearbox.screw_rpm());
            }
            PanelControl::Knob => {
                self.knob.begin_drag();
            }
            PanelControl::Switch => self.switch.click(gearbox),
        }
    }

    /// Keyboard start/stop: acts like clicking whichever button is live.
    pub fn toggle_run(&mut self, gearbox: &mut GearboxDrive) {
        let control = if gearbox.is_running() && self.buttons.is_armed() {
            PanelControl::Stop
        } else {
            PanelControl::Start
        };
        self.press(control, gearbox);
    }

    /// Mouse-up anywhere.
    pub fn release(&mut self) {
        self.knob.end_drag();
    }

    pub fn drag(&mut self, delta_x: f32, gearbox: &mut GearboxDrive) {
        self.knob.drag(delta_x, gearbox);
    }

    pub fn update(&mut self, dt: f32, gearbox: &GearboxDrive, cursor_locked: bool) {
        self.buttons.update(dt, gearbox.is_running());
        self.reset.update(dt);
        self.knob.update(gearbox.is_running(), cursor_locked);
        self.switch.update(dt, gearbox.is_reverse());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GearboxConfig;

    fn setup() -> (ControlPanel, GearboxDrive) {
        let gearbox = GearboxDrive::new(&GearboxConfig::default());
        let panel = ControlPanel::new(&PanelConfig::default(), &gearbox);
        (panel, gearbox)
    }

    #[test]
    fn stop_is_ignored_until_first_start() {
        let (mut panel, mut gearbox) = setup();
        assert!(!panel.buttons.is_armed());
        panel.press(PanelControl::Stop, &mut gearbox);
        assert!(!panel.buttons.is_armed());
        assert!(!panel.buttons.stop_lit());

        panel.press(PanelControl::Start, &mut gearbox);
        assert!(gearbox.is_running());
        assert!(panel.buttons.is_armed());

        panel.press(PanelControl::Stop, &mut gearbox);
        assert!(!gearbox.is_running());
    }

    #[test]
    fn lamps_follow_running_state_once_armed() {
        let (mut panel, mut gearbox) = setup();
        panel.update(0.016, &gearbox, false);
        assert!(!panel.buttons.start_lit() && !panel.buttons.stop_lit());

        panel.press(PanelControl::Start, &mut gearbox);
        panel.update(0.016, &gearbox, false);
        assert!(panel.buttons.start_lit());
        assert!(!panel.buttons.stop_lit());

        panel.press(PanelControl::Stop, &mut gearbox);
        panel.update(0.016, &gearbox, false);
        assert!(panel.buttons.stop_lit());
    }

    #[test]
    fn active_plunger_settles_at_press_depth() {
        let (mut panel, mut gearbox) = setup();
        panel.press(PanelControl::Start, &mut gearbox);
        for _ in 0..120 {
            panel.update(1.0 / 60.0, &gearbox, false);
        }
        let (start, stop) = panel.buttons.plunger_offsets();
        assert!((start - 0.010).abs() < 1e-4);
        assert!(stop.abs() < 1e-4);
    }

    #[test]
    fn reset_stops_and_zeroes_speed() {
        let (mut panel, mut gearbox) = setup();
        panel.press(PanelControl::Start, &mut gearbox);
        panel.press(PanelControl::Reset, &mut gearbox);
        assert!(!gearbox.is_running());
        assert_eq!(gearbox.screw_rpm(), 0.0);
        assert!(panel.reset.is_flashing());
        assert!((panel.knob.angle() - -135.0).abs() < 1e-4);

        panel.update(0.3, &gearbox, false);
        assert!(!panel.reset.is_flashing());
    }

    #[test]
    fn run_shortcut_alternates_start_and_stop() {
        let (mut panel, mut gearbox) = setup();
        panel.toggle_run(&mut gearbox);
        assert!(gearbox.is_running());
        assert!(panel.buttons.is_armed());
        panel.toggle_run(&mut gearbox);
        assert!(!gearbox.is_running());
    }

    #[test]
    fn reset_arms_the_buttons() {
        let (mut panel, mut gearbox) = setup();
        panel.press(PanelControl::Reset, &mut gearbox);
        panel.update(0.016, &gearbox, false);
        assert!(panel.buttons.is_armed());
        assert!(panel.buttons.stop_lit());
    }

    #[test]
    fn knob_only_turns_while_running_and_unlocked() {
        let (mut panel, mut gearbox) = setup();
        panel.update(0.016, &gearbox, false);
        panel.press(PanelControl::Knob, &mut gearbox);
        assert!(!panel.knob.is_dragging());

        panel.press(PanelControl::Start, &mut gearbox);
        panel.update(0.016, &gearbox, false);
        panel.press(PanelControl::Knob, &mut gearbox);
        assert!(panel.knob.is_dragging());

        panel.update(0.016, &gearbox, true);
        assert!(!panel.knob.is_dragging());
        assert!(!panel.knob.is_enabled());
    }

    #[test]
    fn knob_drag_maps_angle_to_rpm() {
        let (mut panel, mut gearbox) = setup();
        panel.press(PanelControl::Start, &mut gearbox);
        panel.update(0.016, &gearbox, false);
        // 60 rpm sits at -135 + 270 * 0.06 = -118.8 degrees
        assert!((panel.knob.angle() - -118.8).abs() < 1e-3);

        panel.press(PanelControl::Knob, &mut gearbox);
        // 4 px * 0.25 deg/px = 1 degree
        panel.drag(4.0, &mut gearbox);
        let expected = (-117.8 + 135.0) / 270.0 * 1000.0;
        assert!((gearbox.screw_rpm() - expected).abs() < 1e-2);

        panel.drag(10_000.0, &mut gearbox);
        assert_eq!(panel.knob.angle(), 135.0);
        assert!((gearbox.screw_rpm() - 1000.0).abs() < 1e-3);

        panel.release();
        panel.drag(-10_000.0, &mut gearbox);
        assert!((gearbox.screw_rpm() - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn switch_toggles_direction_and_leds() {
        let (mut panel, mut gearbox) = setup();
        assert!(panel.switch.forward_lit());
        panel.press(PanelControl::Switch, &mut gearbox);
        assert!(gearbox.is_reverse());
        assert!(panel.switch.reverse_lit());
        assert!(!panel.switch.forward_lit());

        for _ in 0..120 {
            panel.update(1.0 / 60.0, &gearbox, false);
        }
        let target = Quat::from_rotation_x(25f32.to_radians());
        assert!(panel.switch.lever_rotation().angle_between(target) < 1e-3);
    }
}
