//! Twin-relay driver for remote (solenoid) track switches.
//!
//! A Lionel remote switch has two coils. Closing the yellow/green pair
//! throws it straight, closing the black/red pair throws it to the turn.
//! Each coil hangs off an active-low relay board channel.
//!
//! Only one coil is ever pulsed per action, for `blink_ms`, then both are
//! left released so the coils never sit energised.

use embedded_hal::delay::DelayNs;
use serde::{Deserialize, Serialize};

use crate::app::ports::OutputLine;
use crate::error::LineError;

use super::SwitchAction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    /// How long one coil is energised per action.
    pub blink_ms: u32,
    /// Relay boards sold for the Pi close on a LOW input.
    pub active_low: bool,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            blink_ms: 250,
            active_low: true,
        }
    }
}

impl RelaySettings {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(1..=5000).contains(&self.blink_ms) {
            return Err("relay blink_ms must be 1-5000");
        }
        Ok(())
    }

    /// Line level that leaves a relay open.
    pub fn released_level_high(&self) -> bool {
        self.active_low
    }
}

/// Which coil pair a throw uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoilPair {
    YellowGreen,
    BlackRed,
}

impl CoilPair {
    pub fn for_action(action: SwitchAction) -> Self {
        match action {
            SwitchAction::Straight => Self::YellowGreen,
            SwitchAction::Turn => Self::BlackRed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::YellowGreen => "yg",
            Self::BlackRed => "br",
        }
    }
}

pub struct RelaySwitch {
    yellow_green: OutputLine,
    black_red: OutputLine,
    settings: RelaySettings,
}

impl RelaySwitch {
    /// Takes the yellow/green line first, then black/red. Both are
    /// released before returning.
    pub fn new(
        yellow_green: OutputLine,
        black_red: OutputLine,
        settings: RelaySettings,
    ) -> Result<Self, LineError> {
        let mut relay = Self {
            yellow_green,
            black_red,
            settings,
        };
        relay.release_all()?;
        Ok(relay)
    }

    /// Pulse the coil for `action` once.
    pub fn drive<D>(&mut self, action: SwitchAction, delay: &mut D) -> Result<CoilPair, LineError>
    where
        D: DelayNs + ?Sized,
    {
        let pair = CoilPair::for_action(action);
        let active_low = self.settings.active_low;
        let blink_ms = self.settings.blink_ms;
        let line = match pair {
            CoilPair::YellowGreen => &mut self.yellow_green,
            CoilPair::BlackRed => &mut self.black_red,
        };

        let pulsed = set_energised(line, active_low, false)
            .and_then(|()| set_energised(line, active_low, true))
            .map(|()| delay.delay_ms(blink_ms));
        let released = set_energised(line, active_low, false);

        pulsed.and(released).map(|()| pair)
    }

    pub fn release_all(&mut self) -> Result<(), LineError> {
        let a = set_energised(&mut self.yellow_green, self.settings.active_low, false);
        let b = set_energised(&mut self.black_red, self.settings.active_low, false);
        a.and(b)
    }

    pub fn close(&mut self) -> Result<(), LineError> {
        self.release_all()
    }
}

fn set_energised(line: &mut OutputLine, active_low: bool, on: bool) -> Result<(), LineError> {
    if on != active_low {
        line.set_high()
    } else {
        line.set_low()
    }
}
