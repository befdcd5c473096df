//! Hobby-servo driver for manual track switches.
//!
//! An SG90-class servo bolted to the switch throw bar. The servo sees a
//! 50 Hz frame; pulse width maps linearly onto the angle range.
//!
//! ```text
//!   frame  = 1 / 50 Hz          = 20 ms
//!   100°   → 0.4 ms pulse (2 % duty)   Turn
//!   180°   → 2.4 ms pulse (12 % duty)  Straight
//! ```

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::ports::PulseLine;
use crate::error::LineError;

use super::SwitchAction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoSettings {
    /// Angle commanded by the shortest pulse.
    pub min_angle: f32,
    /// Angle commanded by the longest pulse.
    pub max_angle: f32,
    pub min_pulse_us: u32,
    pub max_pulse_us: u32,
    /// Frame period in microseconds (20 000 = 50 Hz).
    pub frame_us: u32,
    pub turn_angle: f32,
    pub straight_angle: f32,
    /// Angle to drive at construction; `None` leaves the servo limp.
    pub initial_angle: Option<f32>,
}

impl Default for ServoSettings {
    fn default() -> Self {
        Self {
            min_angle: 100.0,
            max_angle: 180.0,
            min_pulse_us: 400,
            max_pulse_us: 2400,
            frame_us: 20_000,
            turn_angle: 100.0,
            straight_angle: 180.0,
            initial_angle: None,
        }
    }
}

impl ServoSettings {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.min_angle.is_nan() || self.max_angle.is_nan() || self.min_angle >= self.max_angle {
            return Err("servo min_angle must be below max_angle");
        }
        if self.min_pulse_us == 0 || self.min_pulse_us >= self.max_pulse_us {
            return Err("servo min_pulse_us must be non-zero and below max_pulse_us");
        }
        if self.max_pulse_us >= self.frame_us {
            return Err("servo max_pulse_us must fit inside frame_us");
        }
        let range = self.min_angle..=self.max_angle;
        if !range.contains(&self.turn_angle) || !range.contains(&self.straight_angle) {
            return Err("servo turn/straight angles must lie within min..max angle");
        }
        if let Some(a) = self.initial_angle {
            if !range.contains(&a) {
                return Err("servo initial_angle must lie within min..max angle");
            }
        }
        Ok(())
    }

    pub fn angle_for(&self, action: SwitchAction) -> f32 {
        match action {
            SwitchAction::Turn => self.turn_angle,
            SwitchAction::Straight => self.straight_angle,
        }
    }

    /// Pulse width for `angle`, clamped to the configured range.
    pub fn pulse_for(&self, angle: f32) -> Duration {
        let angle = angle.clamp(self.min_angle, self.max_angle);
        let fraction = (angle - self.min_angle) / (self.max_angle - self.min_angle);
        let span = (self.max_pulse_us - self.min_pulse_us) as f32;
        let us = self.min_pulse_us as f32 + fraction * span;
        Duration::from_micros(us.round() as u64)
    }

    pub fn frame(&self) -> Duration {
        Duration::from_micros(u64::from(self.frame_us))
    }
}

pub struct ServoSwitch {
    line: Box<dyn PulseLine>,
    settings: ServoSettings,
    angle: Option<f32>,
}

impl ServoSwitch {
    pub fn new(line: Box<dyn PulseLine>, settings: ServoSettings) -> Result<Self, LineError> {
        let mut servo = Self {
            line,
            settings,
            angle: None,
        };
        if let Some(angle) = servo.settings.initial_angle {
            servo.set_angle(angle)?;
        }
        Ok(servo)
    }

    /// Move to the angle for `action`, returning the commanded angle.
    pub fn drive(&mut self, action: SwitchAction) -> Result<f32, LineError> {
        let angle = self.settings.angle_for(action);
        self.set_angle(angle)?;
        Ok(angle)
    }

    fn set_angle(&mut self, angle: f32) -> Result<(), LineError> {
        let width = self.settings.pulse_for(angle);
        self.line.set_pulse(self.settings.frame(), width)?;
        self.angle = Some(angle);
        Ok(())
    }

    pub fn angle(&self) -> Option<f32> {
        self.angle
    }

    pub fn close(&mut self) -> Result<(), LineError> {
        self.angle = None;
        self.line.stop()
    }
}
