//! Motorised gearbox: a lead screw driving two meshed spur gears.

use crate::config::GearboxConfig;
use glam::Quat;

/// Degrees per second for one revolution per minute.
const DEG_PER_SEC_PER_RPM: f32 = 6.0;

/// Drive state and accumulated part angles (degrees about each part's local Y).
#[derive(Debug, Clone)]
pub struct GearboxDrive {
    running: bool,
    screw_rpm: f32,
    reverse: bool,
    ratio_screw_to_gear1: f32,
    ratio_gear1_to_gear2: f32,
    screw_angle: f32,
    gear1_angle: f32,
    gear2_angle: f32,
}

impl GearboxDrive {
    pub fn new(config: &GearboxConfig) -> Self {
        Self {
            running: config.start_running,
            screw_rpm: config.screw_rpm.max(0.0),
            reverse: config.reverse,
            ratio_screw_to_gear1: config.ratio_screw_to_gear1,
            ratio_gear1_to_gear2: config.ratio_gear1_to_gear2,
            screw_angle: 0.0,
            gear1_angle: 0.0,
            gear2_angle: 0.0,
        }
    }

    /// Advance the part angles by `dt` seconds. Does nothing while stopped.
    pub fn update(&mut self, dt: f32) {
        if !self.running || dt <= 0.0 {
            return;
        }
        let direction = if self.reverse { -1.0 } else { 1.0 };
        let d_screw = self.screw_rpm * DEG_PER_SEC_PER_RPM * direction * dt;
        let d_gear1 = d_screw * self.ratio_screw_to_gear1.abs();
        // Meshed spur gears counter-rotate.
        let d_gear2 = -d_gear1 * self.ratio_gear1_to_gear2.abs();

        self.screw_angle = wrap_degrees(self.screw_angle + d_screw);
        self.gear1_angle = wrap_degrees(self.gear1_angle + d_gear1);
        self.gear2_angle = wrap_degrees(self.gear2_angle + d_gear2);
    }

    pub fn start(&mut self) {
        self.set_running(true);
    }

    pub fn stop(&mut self) {
        self.set_running(false);
    }

    pub fn set_running(&mut self, running: bool) {
        if running != self.running {
            log::info!("Gearbox {}", if running { "started" } else { "stopped" });
        }
        self.running = running;
    }

    /// Negative speeds are clamped to zero.
    pub fn set_screw_rpm(&mut self, rpm: f32) {
        self.screw_rpm = rpm.max(0.0);
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        if reverse != self.reverse {
            log::debug!("Gearbox direction: {}", if reverse { "reverse" } else { "forward" });
        }
        self.reverse = reverse;
    }

    pub fn toggle_reverse(&mut self) {
        self.set_reverse(!self.reverse);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub fn screw_rpm(&self) -> f32 {
        self.screw_rpm
    }

    pub fn screw_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.screw_angle.to_radians())
    }

    pub fn gear1_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.gear1_angle.to_radians())
    }

    pub fn gear2_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.gear2_angle.to_radians())
    }

    pub fn angles(&self) -> (f32, f32, f32) {
        (self.screw_angle, self.gear1_angle, self.gear2_angle)
    }
}

fn wrap_degrees(angle: f32) -> f32 {
    angle.rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_drive() -> GearboxDrive {
        GearboxDrive::new(&GearboxConfig {
            start_running: true,
            ..Default::default()
        })
    }

    #[test]
    fn defaults_are_stopped_at_sixty_rpm() {
        let drive = GearboxDrive::new(&GearboxConfig::default());
        assert!(!drive.is_running());
        assert!(!drive.is_reverse());
        assert_eq!(drive.screw_rpm(), 60.0);
    }

    #[test]
    fn stopped_drive_does_not_turn() {
        let mut drive = GearboxDrive::new(&GearboxConfig::default());
        drive.update(1.0);
        assert_eq!(drive.angles(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn sixty_rpm_is_a_quarter_turn_in_a_quarter_second() {
        let mut drive = running_drive();
        drive.update(0.25);
        let (screw, gear1, gear2) = drive.angles();
        assert!((screw - 90.0).abs() < 1e-3);
        assert!((gear1 - 90.0).abs() < 1e-3);
        // -90 wrapped
        assert!((gear2 - 270.0).abs() < 1e-3);
    }

    #[test]
    fn reverse_flips_every_part() {
        let mut drive = running_drive();
        drive.set_reverse(true);
        drive.update(0.25);
        let (screw, gear1, gear2) = drive.angles();
        assert!((screw - 270.0).abs() < 1e-3);
        assert!((gear1 - 270.0).abs() < 1e-3);
        assert!((gear2 - 90.0).abs() < 1e-3);
    }

    #[test]
    fn ratios_scale_by_magnitude() {
        let mut drive = GearboxDrive::new(&GearboxConfig {
            start_running: true,
            ratio_screw_to_gear1: -0.5,
            ratio_gear1_to_gear2: 2.0,
            ..Default::default()
        });
        drive.update(0.1);
        let (screw, gear1, gear2) = drive.angles();
        assert!((screw - 36.0).abs() < 1e-3);
        assert!((gear1 - 18.0).abs() < 1e-3);
        assert!((gear2 - (360.0 - 36.0)).abs() < 1e-3);
    }

    #[test]
    fn negative_rpm_clamps_to_zero() {
        let mut drive = running_drive();
        drive.set_screw_rpm(-50.0);
        assert_eq!(drive.screw_rpm(), 0.0);
        drive.update(1.0);
        assert_eq!(drive.angles().0, 0.0);
    }

    #[test]
    fn toggles_flip_state() {
        let mut drive = GearboxDrive::new(&GearboxConfig::default());
        drive.start();
        assert!(drive.is_running());
        drive.toggle_reverse();
        assert!(drive.is_reverse());
        drive.stop();
        assert!(!drive.is_running());
    }
}
