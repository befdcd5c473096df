//! Port traits: the hexagonal boundary between the switch yard and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ SwitchYard (domain)
//! ```
//!
//! Driven adapters (GPIO backends, layout storage, event sinks) implement
//! these traits. The [`SwitchYard`](super::service::SwitchYard) owns them
//! as trait objects so the HTTP layer can share one registry.

use core::fmt;
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::error::LineError;

use super::layout::Layout;

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain → header pins)
// ───────────────────────────────────────────────────────────────

/// A claimed digital output. Dropping it releases the line.
pub type OutputLine = Box<dyn OutputPin<Error = LineError> + Send>;

/// A claimed output driven with a repeating pulse (servo signal).
pub trait PulseLine: Send {
    /// Emit a `width` high pulse every `period`.
    fn set_pulse(&mut self, period: Duration, width: Duration) -> Result<(), LineError>;

    /// Stop pulsing and hold the line low.
    fn stop(&mut self) -> Result<(), LineError>;
}

/// Hands out header pins as typed lines. Pins are BOARD numbers.
///
/// The port doubles as the delay source for timed actions (relay blink)
/// so the simulation backend can skip real sleeps.
pub trait GpioPort: DelayNs + Send {
    /// Claim `board` as a digital output, initially at `initial_high`.
    fn claim_output(&mut self, board: u8, initial_high: bool) -> Result<OutputLine, LineError>;

    /// Claim `board` for pulse output. No pulse runs until commanded.
    fn claim_pulse(&mut self, board: u8) -> Result<Box<dyn PulseLine>, LineError>;

    /// Short backend name for logs and the status page.
    fn backend(&self) -> &'static str;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The yard emits structured [`YardEvent`](super::events::YardEvent)s
/// through this port.
pub trait EventSink: Send {
    fn emit(&mut self, event: &super::events::YardEvent);
}

// ───────────────────────────────────────────────────────────────
// Layout store port (driven adapter: domain ↔ saved layouts)
// ───────────────────────────────────────────────────────────────

/// Named, persistent snapshots of the registry.
///
/// Names reaching a store have already passed
/// [`validate_name`](super::layout::validate_name).
pub trait LayoutStore: Send {
    fn save(&mut self, name: &str, layout: &Layout) -> Result<(), LayoutError>;

    /// Returns [`LayoutError::NotFound`] when nothing is stored under `name`.
    fn load(&self, name: &str) -> Result<Layout, LayoutError>;

    /// Returns `Ok(false)` if the layout did not exist.
    fn delete(&mut self, name: &str) -> Result<bool, LayoutError>;

    /// Stored layout names, sorted.
    fn list(&self) -> Result<Vec<String>, LayoutError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`LayoutStore`] operations and layout validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Name is empty, too long, or has characters outside `[A-Za-z0-9_-]`.
    InvalidName(String),
    NotFound(String),
    /// Stored layout failed to decode or describes an impossible registry.
    Corrupted(String),
    /// Generic I/O error from the storage backend.
    Io(String),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid layout name '{}'", name),
            Self::NotFound(name) => write!(f, "layout '{}' not found", name),
            Self::Corrupted(msg) => write!(f, "layout corrupted: {}", msg),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for LayoutError {}
