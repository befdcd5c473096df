//! Inbound commands to the switch yard.
//!
//! These represent changes requested by the outside world (HTML forms,
//! the REST API, the Rail Yard mobile app) that the
//! [`SwitchYard`](super::service::SwitchYard) interprets and acts upon.

use crate::drivers::{DeviceKind, SwitchAction};
use crate::error::YardError;
use crate::pins::PinSet;

/// Direction for single-step reordering from the config page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }
}

/// Commands that adapters can send into the registry.
#[derive(Debug, Clone)]
pub enum YardCommand {
    /// Register a new switch on free pins.
    Add { pins: PinSet, kind: DeviceKind },

    /// Close a switch and return its pins to the pool.
    Remove(PinSet),

    /// Drive a switch to a specific state.
    Act { pins: PinSet, action: SwitchAction },

    /// Flip a switch between Straight and Turn.
    Toggle(PinSet),

    /// Flip the switch at a 1-based position.
    ToggleIndex(usize),

    /// Forget the state of the switch at a 1-based position.
    ResetIndex(usize),

    /// Swap a switch with its neighbour.
    Nudge { pins: PinSet, direction: Direction },

    /// Move the switch at 0-based `start` to drop position `finish`.
    Move { start: usize, finish: usize },

    SaveLayout(String),

    LoadLayout(String),

    DeleteLayout(String),
}

/// Convenience for handlers that already hold parsed parts.
pub type CommandResult = Result<(), YardError>;
