//! Track-switch drivers.
//!
//! [`Device`] wraps one physical switch: its kind, the pins it holds, the
//! last state it was commanded to, and the servo or relay driver doing
//! the work.

pub mod relay;
pub mod servo;

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::ports::GpioPort;
use crate::error::{LineError, SwitchError};
use crate::pins::PinSet;

pub use relay::{CoilPair, RelaySettings};
pub use servo::ServoSettings;

use relay::RelaySwitch;
use servo::ServoSwitch;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchAction {
    Straight,
    Turn,
}

impl SwitchAction {
    /// State a freshly toggled switch is driven to.
    pub const ON: Self = Self::Straight;
    pub const OFF: Self = Self::Turn;

    /// Case-insensitive parse of `straight` / `turn`.
    pub fn parse(text: &str) -> Result<Self, SwitchError> {
        match text.trim().to_ascii_lowercase().as_str() {
            "straight" => Ok(Self::Straight),
            "turn" => Ok(Self::Turn),
            _ => Err(SwitchError::UnknownAction(text.to_string())),
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Straight => Self::Turn,
            Self::Turn => Self::Straight,
        }
    }

    /// The opposite of `current`; unknown state toggles to [`Self::ON`].
    pub fn toggle_from(current: Option<Self>) -> Self {
        current.map_or(Self::ON, Self::toggled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Straight => "Straight",
            Self::Turn => "Turn",
        }
    }
}

impl fmt::Display for SwitchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Device kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Manual switch thrown by a hobby servo.
    Servo,
    /// Remote switch thrown by two relays.
    Relay,
}

impl DeviceKind {
    /// Every name accepted by [`DeviceKind::parse`], in listing order.
    pub const TYPE_NAMES: [&'static str; 4] =
        ["relay", "servo", "Relay Train Switch", "Servo Train Switch"];

    pub fn parse(text: &str) -> Result<Self, SwitchError> {
        match text.trim().to_ascii_lowercase().as_str() {
            "servo" | "servo train switch" => Ok(Self::Servo),
            "relay" | "relay train switch" => Ok(Self::Relay),
            _ => Err(SwitchError::UnknownKind(text.to_string())),
        }
    }

    pub fn required_pins(self) -> usize {
        match self {
            Self::Servo => 1,
            Self::Relay => 2,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Servo => "Servo Train Switch",
            Self::Relay => "Relay Train Switch",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Settings shared by every device the yard builds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchSettings {
    pub servo: ServoSettings,
    pub relay: RelaySettings,
}

impl SwitchSettings {
    pub fn validate(&self) -> Result<(), &'static str> {
        self.servo.validate()?;
        self.relay.validate()
    }
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

/// What the hardware was told to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Throw {
    Angle(f32),
    Coil(CoilPair),
}

impl fmt::Display for Throw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Angle(a) => write!(f, "{a:.0}°"),
            Self::Coil(pair) => f.write_str(pair.label()),
        }
    }
}

/// Result of [`Device::action`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionOutcome {
    /// Already in the requested state; no pin was written.
    Skipped,
    Thrown(Throw),
}

enum Driver {
    Servo(ServoSwitch),
    Relay(RelaySwitch),
}

pub struct Device {
    kind: DeviceKind,
    pins: PinSet,
    state: Option<SwitchAction>,
    driver: Driver,
}

impl Device {
    /// Claim the pins and build the driver for `kind`.
    pub fn open(
        kind: DeviceKind,
        pins: PinSet,
        gpio: &mut dyn GpioPort,
        settings: &SwitchSettings,
    ) -> Result<Self, SwitchError> {
        let expected = kind.required_pins();
        if pins.len() != expected {
            return Err(SwitchError::WrongPinCount {
                kind,
                expected,
                found: pins.len(),
            });
        }

        let driver = match kind {
            DeviceKind::Servo => {
                let line = gpio.claim_pulse(pins.first())?;
                Driver::Servo(ServoSwitch::new(line, settings.servo.clone())?)
            }
            DeviceKind::Relay => {
                let released = settings.relay.released_level_high();
                let p = pins.as_slice();
                let yellow_green = gpio.claim_output(p[0], released)?;
                let black_red = gpio.claim_output(p[1], released)?;
                Driver::Relay(RelaySwitch::new(
                    yellow_green,
                    black_red,
                    settings.relay.clone(),
                )?)
            }
        };

        Ok(Self {
            kind,
            pins,
            state: None,
            driver,
        })
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn pins(&self) -> &PinSet {
        &self.pins
    }

    pub fn state(&self) -> Option<SwitchAction> {
        self.state
    }

    /// Overwrite the remembered state without touching hardware.
    pub fn set_state(&mut self, state: Option<SwitchAction>) {
        self.state = state;
    }

    /// Throw the switch unless it is already in `action`.
    ///
    /// On a hardware error the remembered state is left as it was.
    pub fn action<D>(&mut self, action: SwitchAction, delay: &mut D) -> Result<ActionOutcome, SwitchError>
    where
        D: DelayNs + ?Sized,
    {
        if self.state == Some(action) {
            return Ok(ActionOutcome::Skipped);
        }

        let throw = match &mut self.driver {
            Driver::Servo(servo) => Throw::Angle(servo.drive(action)?),
            Driver::Relay(relay) => Throw::Coil(relay.drive(action, delay)?),
        };
        self.state = Some(action);
        Ok(ActionOutcome::Thrown(throw))
    }

    /// Park the hardware and release the pins.
    pub fn close(mut self) -> Result<(), LineError> {
        let result = match &mut self.driver {
            Driver::Servo(servo) => servo.close(),
            Driver::Relay(relay) => relay.close(),
        };
        if let Err(e) = &result {
            warn!("{} @ {}: close failed: {}", self.kind, self.pins, e);
        }
        result
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("kind", &self.kind)
            .field("pins", &self.pins)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ Pin : {}", self.kind, self.pins)
    }
}
