//! Unified error types for the switch yard.
//!
//! A single [`YardError`] that every subsystem converts into, keeping the
//! HTTP layer's error mapping uniform. Leaf errors stay small and cheap to
//! clone so they can be stored in events and rendered on pages.

use core::fmt;

use crate::app::ports::LayoutError;
use crate::drivers::DeviceKind;

// ---------------------------------------------------------------------------
// Top-level yard error
// ---------------------------------------------------------------------------

/// Every fallible registry operation funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YardError {
    /// A pin list could not be parsed or names a non-GPIO header pin.
    Pin(PinError),
    /// A switch could not be built or commanded.
    Switch(SwitchError),
    /// A saved layout could not be read, written or validated.
    Layout(LayoutError),
    /// The pin is assignable but already used by another device.
    PinUnavailable(u8),
    /// No device is registered under this pin key.
    NoSuchDevice(String),
    /// A 1-based or 0-based device position fell outside the registry.
    IndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for YardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin(e) => write!(f, "pins: {e}"),
            Self::Switch(e) => write!(f, "switch: {e}"),
            Self::Layout(e) => write!(f, "layout: {e}"),
            Self::PinUnavailable(pin) => write!(f, "pin {pin} is not available"),
            Self::NoSuchDevice(key) => write!(f, "no device on pins {key}"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "device position {index} out of range (have {len})")
            }
        }
    }
}

impl std::error::Error for YardError {}

// ---------------------------------------------------------------------------
// Pin errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinError {
    /// No pin numbers were given.
    Empty,
    /// A token was not a pin number.
    Malformed(String),
    /// The header pin exists but carries power, ground or the ID EEPROM.
    NotAssignable(u8),
    /// The same pin was listed twice.
    Duplicate(u8),
    /// More pins than any device uses.
    TooMany(usize),
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no pins given"),
            Self::Malformed(tok) => write!(f, "'{tok}' is not a pin number"),
            Self::NotAssignable(pin) => write!(f, "header pin {pin} is not a GPIO line"),
            Self::Duplicate(pin) => write!(f, "pins cannot be the same (pin {pin} repeated)"),
            Self::TooMany(n) => write!(f, "{n} pins given, at most 2 supported"),
        }
    }
}

impl std::error::Error for PinError {}

impl From<PinError> for YardError {
    fn from(e: PinError) -> Self {
        Self::Pin(e)
    }
}

// ---------------------------------------------------------------------------
// GPIO line errors
// ---------------------------------------------------------------------------

/// Failure reported by a [`GpioPort`](crate::app::ports::GpioPort) backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    /// The line is already claimed by another output.
    Busy(u8),
    /// The backend rejected the pin (unknown BCM line, permissions).
    Unavailable(u8),
    /// The write itself failed.
    Io(String),
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy(pin) => write!(f, "pin {pin} already claimed"),
            Self::Unavailable(pin) => write!(f, "pin {pin} unavailable"),
            Self::Io(msg) => write!(f, "GPIO I/O: {msg}"),
        }
    }
}

impl std::error::Error for LineError {}

impl embedded_hal::digital::Error for LineError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

// ---------------------------------------------------------------------------
// Switch errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchError {
    /// Device type string did not name a known switch.
    UnknownKind(String),
    /// Action string was neither Straight nor Turn.
    UnknownAction(String),
    /// Pin count does not fit the device kind.
    WrongPinCount {
        kind: DeviceKind,
        expected: usize,
        found: usize,
    },
    /// The GPIO backend failed.
    Line(LineError),
}

impl fmt::Display for SwitchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind(k) => write!(f, "unknown device type '{k}'"),
            Self::UnknownAction(a) => write!(f, "invalid command '{a}', expected Straight or Turn"),
            Self::WrongPinCount {
                kind,
                expected,
                found,
            } => write!(f, "{kind} needs {expected} pin(s), found {found}"),
            Self::Line(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SwitchError {}

impl From<LineError> for SwitchError {
    fn from(e: LineError) -> Self {
        Self::Line(e)
    }
}

impl From<SwitchError> for YardError {
    fn from(e: SwitchError) -> Self {
        Self::Switch(e)
    }
}

impl From<LineError> for YardError {
    fn from(e: LineError) -> Self {
        Self::Switch(SwitchError::Line(e))
    }
}

impl From<LayoutError> for YardError {
    fn from(e: LayoutError) -> Self {
        Self::Layout(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, YardError>;
