//! Readouts driven by the gearbox: RPM gauge, torque gauge and the warning beacon.

use crate::config::TelemetryConfig;
use crate::gearbox::GearboxDrive;
use std::f32::consts::TAU;

/// Width of the RPM bar on the display panel, in meters.
pub const RPM_BAR_WIDTH: f32 = 0.18;
/// Width of the output torque bar, in meters.
pub const TORQUE_BAR_WIDTH: f32 = 0.22;
/// Emission multiplier of the lit beacon lens.
pub const BEACON_EMISSION: f32 = 2.0;

/// Traffic-light band of a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadoutZone {
    Green,
    Yellow,
    Red,
}

impl ReadoutZone {
    pub fn color(self) -> [f32; 3] {
        match self {
            Self::Green => [0.10, 0.90, 0.20],
            Self::Yellow => [0.95, 0.85, 0.10],
            Self::Red => [0.95, 0.15, 0.15],
        }
    }
}

/// Holds readouts at zero after the very first start until the operator
/// actually moves the set point.
#[derive(Debug, Clone, Default)]
struct FirstStartGate {
    enabled: bool,
    threshold: f32,
    ever_started: bool,
    waiting: bool,
    set_point: f32,
}

impl FirstStartGate {
    fn new(enabled: bool, threshold: f32) -> Self {
        Self {
            enabled,
            threshold,
            ..Default::default()
        }
    }

    /// Returns whether the live value may be shown.
    fn observe(&mut self, running: bool, rpm: f32) -> bool {
        if !running {
            self.waiting = false;
            return false;
        }
        if self.enabled && !self.ever_started {
            self.waiting = true;
            self.set_point = rpm;
        }
        self.ever_started = true;
        if self.waiting {
            if (rpm - self.set_point).abs() > self.threshold {
                self.waiting = false;
            } else {
                return false;
            }
        }
        true
    }
}

fn inverse_lerp_clamped(value: f32, min: f32, max: f32) -> f32 {
    if (max - min).abs() <= f32::EPSILON {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Screw speed readout.
#[derive(Debug, Clone)]
pub struct RpmDisplay {
    gate: FirstStartGate,
    min: f32,
    green_max: f32,
    yellow_max: f32,
    max: f32,
    value: f32,
}

impl RpmDisplay {
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            gate: FirstStartGate::new(config.zero_until_knob_moves, config.knob_change_threshold),
            min: config.rpm_min,
            green_max: config.rpm_green_max,
            yellow_max: config.rpm_yellow_max,
            max: config.rpm_max,
            value: 0.0,
        }
    }

    pub fn update(&mut self, running: bool, rpm: f32) {
        self.value = if self.gate.observe(running, rpm) {
            rpm.clamp(self.min, self.max.max(self.min))
        } else {
            0.0
        };
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn zone(&self) -> ReadoutZone {
        if self.value < self.green_max {
            ReadoutZone::Green
        } else if self.value < self.yellow_max {
            ReadoutZone::Yellow
        } else {
            ReadoutZone::Red
        }
    }

    /// Position of the marker along the bar, 0 at the left end.
    pub fn marker_fraction(&self) -> f32 {
        inverse_lerp_clamped(self.value, self.min, self.max)
    }

    /// Marker offset from the bar center for a bar of `width`.
    pub fn marker_offset(&self, width: f32) -> f32 {
        (self.marker_fraction() - 0.5) * width
    }
}

/// Input and output torque derived from screw speed (constant-power model).
#[derive(Debug, Clone)]
pub struct TorqueDisplay {
    gate: FirstStartGate,
    input_factor: f32,
    gear_ratio: f32,
    green_max: f32,
    yellow_max: f32,
    input: f32,
    output: f32,
}

impl TorqueDisplay {
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            gate: FirstStartGate::new(config.zero_until_knob_moves, config.knob_change_threshold),
            input_factor: config.torque_input_factor,
            gear_ratio: config.torque_gear_ratio,
            green_max: config.torque_green_max,
            yellow_max: config.torque_yellow_max,
            input: 0.0,
            output: 0.0,
        }
    }

    pub fn update(&mut self, running: bool, rpm: f32) {
        let shown = self.gate.observe(running, rpm);
        self.input = if shown && rpm > 0.01 {
            self.input_factor / rpm
        } else {
            0.0
        };
        self.output = self.input * self.gear_ratio;
    }

    pub fn input(&self) -> f32 {
        self.input
    }

    pub fn output(&self) -> f32 {
        self.output
    }

    pub fn zone(&self) -> ReadoutZone {
        if self.output <= self.green_max {
            ReadoutZone::Green
        } else if self.output <= self.yellow_max {
            ReadoutZone::Yellow
        } else {
            ReadoutZone::Red
        }
    }

    /// Top of the bar scale. Leaves headroom above the yellow band.
    pub fn scale_max(&self) -> f32 {
        (self.yellow_max * 1.25).max(1.0)
    }

    pub fn marker_fraction(&self) -> f32 {
        inverse_lerp_clamped(self.output, 0.0, self.scale_max())
    }

    pub fn marker_offset(&self, width: f32) -> f32 {
        (self.marker_fraction() - 0.5) * width
    }
}

/// Blinking warning light, dark while the machine is stopped.
#[derive(Debug, Clone)]
pub struct Beacon {
    hz: f32,
    lit: bool,
}

impl Beacon {
    pub fn new(hz: f32) -> Self {
        Self { hz, lit: false }
    }

    pub fn update(&mut self, running: bool, elapsed_seconds: f32) {
        self.lit = running && (elapsed_seconds * TAU * self.hz).sin() > 0.0;
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

/// All readouts, refreshed once per frame.
#[derive(Debug, Clone)]
pub struct Telemetry {
    pub rpm: RpmDisplay,
    pub torque: TorqueDisplay,
    pub beacon: Beacon,
}

impl Telemetry {
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            rpm: RpmDisplay::new(config),
            torque: TorqueDisplay::new(config),
            beacon: Beacon::new(config.beacon_hz),
        }
    }

    pub fn update(&mut self, gearbox: &GearboxDrive, elapsed_seconds: f32) {
        let running = gearbox.is_running();
        let rpm = gearbox.screw_rpm();
        self.rpm.update(running, rpm);
        self.torque.update(running, rpm);
        self.beacon.update(running, elapsed_seconds);
    }

    /// One-line summary for the window title.
    pub fn summary(&self, reverse: bool) -> String {
        format!(
            "{:.0} RPM {} | torque in {:.0} / out {:.0} Nm",
            self.rpm.value(),
            if reverse { "REV" } else { "FWD" },
            self.torque.input(),
            self.torque.output(),
        )
    }
}
