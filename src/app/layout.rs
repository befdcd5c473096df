//! Saved registry layouts.
//!
//! A layout is the ordered device list with each device's last known
//! state. Loading one never moves hardware: the stored state is simply
//! trusted until the next command.

use serde::{Deserialize, Serialize};

use crate::drivers::{DeviceKind, SwitchAction};
use crate::error::PinError;
use crate::pins::PinSet;

use super::ports::LayoutError;

/// Layout written by `/save/` and read by `/load/` and autoload.
pub const DEFAULT_LAYOUT: &str = "default";

const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    pub kind: DeviceKind,
    pub pins: PinSet,
    #[serde(default)]
    pub state: Option<SwitchAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub devices: Vec<LayoutEntry>,
}

impl Layout {
    /// Check the layout could be registered as a whole: pin counts fit
    /// each kind and no pin is used twice.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut used: Vec<u8> = Vec::new();
        for entry in &self.devices {
            let expected = entry.kind.required_pins();
            if entry.pins.len() != expected {
                return Err(LayoutError::Corrupted(format!(
                    "{} on pins {} needs {} pin(s)",
                    entry.kind, entry.pins, expected
                )));
            }
            for &pin in entry.pins.as_slice() {
                if used.contains(&pin) {
                    return Err(LayoutError::Corrupted(
                        PinError::Duplicate(pin).to_string(),
                    ));
                }
                used.push(pin);
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, LayoutError> {
        serde_json::to_string_pretty(self).map_err(|e| LayoutError::Corrupted(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, LayoutError> {
        let layout: Self =
            serde_json::from_str(text).map_err(|e| LayoutError::Corrupted(e.to_string()))?;
        layout.validate()?;
        Ok(layout)
    }
}

/// Trim and check a user-supplied layout name.
pub fn validate_name(name: &str) -> Result<&str, LayoutError> {
    let name = name.trim();
    let ok = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(name)
    } else {
        Err(LayoutError::InvalidName(name.to_string()))
    }
}
