//! 40-pin header map for the Raspberry Pi.
//!
//! Single source of truth for pin numbering. Users and saved layouts talk
//! in physical BOARD numbers (the number printed next to the header pin);
//! the GPIO backends want BCM line numbers. Everything converts through
//! here.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PinError;

/// Most pins any device occupies (the two-relay remote switch).
pub const MAX_DEVICE_PINS: usize = 2;

// ---------------------------------------------------------------------------
// Header layout
// ---------------------------------------------------------------------------

/// What a physical header pin carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinFunction {
    Power3v3,
    Power5v,
    Ground,
    /// HAT ID EEPROM bus, never assignable.
    IdEeprom(&'static str),
    /// General purpose line with its BCM number and optional alt label.
    Gpio { bcm: u8, alt: Option<&'static str> },
}

impl fmt::Display for PinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Power3v3 => write!(f, "3V3"),
            Self::Power5v => write!(f, "5V"),
            Self::Ground => write!(f, "GND"),
            Self::IdEeprom(name) => write!(f, "{name}"),
            Self::Gpio { bcm, alt: None } => write!(f, "GPIO{bcm}"),
            Self::Gpio { bcm, alt: Some(a) } => write!(f, "GPIO{bcm} ({a})"),
        }
    }
}

const fn gpio(bcm: u8) -> PinFunction {
    PinFunction::Gpio { bcm, alt: None }
}

const fn gpio_alt(bcm: u8, alt: &'static str) -> PinFunction {
    PinFunction::Gpio {
        bcm,
        alt: Some(alt),
    }
}

/// Header functions indexed by `board pin - 1`.
const HEADER: [PinFunction; 40] = [
    PinFunction::Power3v3,      // 1
    PinFunction::Power5v,       // 2
    gpio_alt(2, "SDA"),         // 3
    PinFunction::Power5v,       // 4
    gpio_alt(3, "SCL"),         // 5
    PinFunction::Ground,        // 6
    gpio(4),                    // 7
    gpio_alt(14, "TXD"),        // 8
    PinFunction::Ground,        // 9
    gpio_alt(15, "RXD"),        // 10
    gpio(17),                   // 11
    gpio(18),                   // 12
    gpio(27),                   // 13
    PinFunction::Ground,        // 14
    gpio(22),                   // 15
    gpio(23),                   // 16
    PinFunction::Power3v3,      // 17
    gpio(24),                   // 18
    gpio_alt(10, "MOSI"),       // 19
    PinFunction::Ground,        // 20
    gpio_alt(9, "MISO"),        // 21
    gpio(25),                   // 22
    gpio_alt(11, "SCLK"),       // 23
    gpio_alt(8, "CE0"),         // 24
    PinFunction::Ground,        // 25
    gpio_alt(7, "CE1"),         // 26
    PinFunction::IdEeprom("ID_SD"), // 27
    PinFunction::IdEeprom("ID_SC"), // 28
    gpio(5),                    // 29
    PinFunction::Ground,        // 30
    gpio(6),                    // 31
    gpio(12),                   // 32
    gpio(13),                   // 33
    PinFunction::Ground,        // 34
    gpio(19),                   // 35
    gpio(16),                   // 36
    gpio(26),                   // 37
    gpio(20),                   // 38
    PinFunction::Ground,        // 39
    gpio(21),                   // 40
];

/// Every header pin wired to a GPIO line, ascending.
pub const ASSIGNABLE_PINS: [u8; 26] = [
    3, 5, 7, 8, 10, 11, 12, 13, 15, 16, 18, 19, 21, 22, 23, 24, 26, 29, 31, 32, 33, 35, 36, 37,
    38, 40,
];

/// Function of a board pin, `None` outside 1..=40.
pub fn function(board: u8) -> Option<PinFunction> {
    let idx = usize::from(board).checked_sub(1)?;
    HEADER.get(idx).copied()
}

/// BCM line number behind a board pin, if it is a GPIO line.
pub fn board_to_bcm(board: u8) -> Option<u8> {
    match function(board)? {
        PinFunction::Gpio { bcm, .. } => Some(bcm),
        _ => None,
    }
}

pub fn is_assignable(board: u8) -> bool {
    board_to_bcm(board).is_some()
}

// ---------------------------------------------------------------------------
// Pinout view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    /// Power, ground or EEPROM.
    Fixed,
    Free,
    Used,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSlot {
    pub board: u8,
    pub function: PinFunction,
    pub status: SlotStatus,
}

/// One physical row of the header: odd pin on the left, even on the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinoutRow {
    pub left: HeaderSlot,
    pub right: HeaderSlot,
}

/// Lay out the header marking which GPIO pins are still in `pool`.
pub fn pinout(pool: &[u8]) -> Vec<PinoutRow> {
    let slot = |board: u8| {
        let function = HEADER[usize::from(board) - 1];
        let status = match function {
            PinFunction::Gpio { .. } if pool.contains(&board) => SlotStatus::Free,
            PinFunction::Gpio { .. } => SlotStatus::Used,
            _ => SlotStatus::Fixed,
        };
        HeaderSlot {
            board,
            function,
            status,
        }
    };

    (0..20u8)
        .map(|row| PinoutRow {
            left: slot(row * 2 + 1),
            right: slot(row * 2 + 2),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// PinSet
// ---------------------------------------------------------------------------

/// The ordered board pins one device occupies; doubles as its registry key.
///
/// Always non-empty, at most [`MAX_DEVICE_PINS`] long, every pin assignable
/// and distinct. The text form is comma separated (`"11"`, `"16,18"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct PinSet(heapless::Vec<u8, MAX_DEVICE_PINS>);

impl PinSet {
    pub fn new(pins: &[u8]) -> Result<Self, PinError> {
        if pins.is_empty() {
            return Err(PinError::Empty);
        }
        if pins.len() > MAX_DEVICE_PINS {
            return Err(PinError::TooMany(pins.len()));
        }
        let mut set = heapless::Vec::new();
        for &pin in pins {
            if !is_assignable(pin) {
                return Err(PinError::NotAssignable(pin));
            }
            if set.contains(&pin) {
                return Err(PinError::Duplicate(pin));
            }
            // Length checked above.
            let _ = set.push(pin);
        }
        Ok(Self(set))
    }

    /// Parse `"16,18"`, `"16, 18"` or `"(16, 18)"`.
    pub fn parse(text: &str) -> Result<Self, PinError> {
        let inner = text
            .trim()
            .trim_start_matches(['(', '['])
            .trim_end_matches([')', ']']);
        let mut pins = Vec::new();
        for tok in inner.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let pin = tok
                .parse::<u8>()
                .map_err(|_| PinError::Malformed(tok.to_string()))?;
            pins.push(pin);
        }
        Self::new(&pins)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> u8 {
        self.0[0]
    }

    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PinSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pin) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{pin}")?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<u8>> for PinSet {
    type Error = PinError;

    fn try_from(pins: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(&pins)
    }
}

impl From<PinSet> for Vec<u8> {
    fn from(set: PinSet) -> Self {
        set.0.to_vec()
    }
}

impl core::str::FromStr for PinSet {
    type Err = PinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
