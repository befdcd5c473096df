//! Simulated GPIO backend.
//!
//! Implements [`GpioPort`] entirely in memory. Used on hosts without a
//! header (and by every test): levels, pulses, claims and delays are
//! recorded on a shared [`SimBoard`] that callers can inspect after the
//! port has been moved into the registry. Delays are recorded, not slept.

use core::time::Duration;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use log::debug;

use crate::app::ports::{GpioPort, OutputLine, PulseLine};
use crate::error::LineError;
use crate::pins;

/// One recorded interaction with the simulated header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimWrite {
    Level { pin: u8, high: bool },
    Pulse { pin: u8, period: Duration, width: Duration },
    Stop { pin: u8 },
    Delay(Duration),
}

#[derive(Debug, Default)]
struct SimState {
    claimed: BTreeSet<u8>,
    levels: BTreeMap<u8, bool>,
    pulses: BTreeMap<u8, (Duration, Duration)>,
    failing: BTreeSet<u8>,
    history: Vec<SimWrite>,
}

/// Shared view of the simulated header.
#[derive(Debug, Clone, Default)]
pub struct SimBoard(Arc<Mutex<SimState>>);

impl SimBoard {
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current level of a claimed output.
    pub fn level(&self, pin: u8) -> Option<bool> {
        self.lock().levels.get(&pin).copied()
    }

    /// Running `(period, width)` on a pulse line.
    pub fn pulse(&self, pin: u8) -> Option<(Duration, Duration)> {
        self.lock().pulses.get(&pin).copied()
    }

    pub fn is_claimed(&self, pin: u8) -> bool {
        self.lock().claimed.contains(&pin)
    }

    pub fn history(&self) -> Vec<SimWrite> {
        self.lock().history.clone()
    }

    pub fn clear_history(&self) {
        self.lock().history.clear();
    }

    /// Make every later claim of or write to `pin` fail.
    pub fn fail_pin(&self, pin: u8) {
        self.lock().failing.insert(pin);
    }

    pub fn heal_pin(&self, pin: u8) {
        self.lock().failing.remove(&pin);
    }

    fn claim(&self, pin: u8) -> Result<(), LineError> {
        let mut s = self.lock();
        if !pins::is_assignable(pin) || s.failing.contains(&pin) {
            return Err(LineError::Unavailable(pin));
        }
        if !s.claimed.insert(pin) {
            return Err(LineError::Busy(pin));
        }
        Ok(())
    }

    fn release(&self, pin: u8) {
        let mut s = self.lock();
        s.claimed.remove(&pin);
        s.levels.remove(&pin);
        s.pulses.remove(&pin);
    }

    fn write(&self, pin: u8, event: SimWrite) -> Result<(), LineError> {
        let mut s = self.lock();
        if s.failing.contains(&pin) {
            return Err(LineError::Io(format!("simulated fault on pin {pin}")));
        }
        match &event {
            SimWrite::Level { high, .. } => {
                s.levels.insert(pin, *high);
            }
            SimWrite::Pulse { period, width, .. } => {
                s.pulses.insert(pin, (*period, *width));
            }
            SimWrite::Stop { .. } => {
                s.pulses.remove(&pin);
                s.levels.insert(pin, false);
            }
            SimWrite::Delay(_) => {}
        }
        debug!("sim gpio: {:?}", event);
        s.history.push(event);
        Ok(())
    }

    fn record_delay(&self, d: Duration) {
        self.lock().history.push(SimWrite::Delay(d));
    }
}

// ── GpioPort ──────────────────────────────────────────────────

pub struct SimGpio {
    board: SimBoard,
}

impl SimGpio {
    pub fn new() -> Self {
        Self {
            board: SimBoard::default(),
        }
    }

    /// Handle for inspecting the header after the port is moved away.
    pub fn board(&self) -> SimBoard {
        self.board.clone()
    }
}

impl Default for SimGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayNs for SimGpio {
    fn delay_ns(&mut self, ns: u32) {
        self.board.record_delay(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        self.board.record_delay(Duration::from_micros(u64::from(us)));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.board.record_delay(Duration::from_millis(u64::from(ms)));
    }
}

impl GpioPort for SimGpio {
    fn claim_output(&mut self, board: u8, initial_high: bool) -> Result<OutputLine, LineError> {
        self.board.claim(board)?;
        let mut line = SimOutput {
            pin: board,
            board: self.board.clone(),
        };
        let init = if initial_high {
            line.set_high()
        } else {
            line.set_low()
        };
        init?;
        Ok(Box::new(line))
    }

    fn claim_pulse(&mut self, board: u8) -> Result<Box<dyn PulseLine>, LineError> {
        self.board.claim(board)?;
        Ok(Box::new(SimPulse {
            pin: board,
            board: self.board.clone(),
        }))
    }

    fn backend(&self) -> &'static str {
        "simulated"
    }
}

// ── Lines ─────────────────────────────────────────────────────

struct SimOutput {
    pin: u8,
    board: SimBoard,
}

impl ErrorType for SimOutput {
    type Error = LineError;
}

impl OutputPin for SimOutput {
    fn set_low(&mut self) -> Result<(), LineError> {
        self.board.write(self.pin, SimWrite::Level {
            pin: self.pin,
            high: false,
        })
    }

    fn set_high(&mut self) -> Result<(), LineError> {
        self.board.write(self.pin, SimWrite::Level {
            pin: self.pin,
            high: true,
        })
    }
}

impl Drop for SimOutput {
    fn drop(&mut self) {
        self.board.release(self.pin);
    }
}

struct SimPulse {
    pin: u8,
    board: SimBoard,
}

impl PulseLine for SimPulse {
    fn set_pulse(&mut self, period: Duration, width: Duration) -> Result<(), LineError> {
        self.board.write(self.pin, SimWrite::Pulse {
            pin: self.pin,
            period,
            width,
        })
    }

    fn stop(&mut self) -> Result<(), LineError> {
        self.board.write(self.pin, SimWrite::Stop { pin: self.pin })
    }
}

impl Drop for SimPulse {
    fn drop(&mut self) {
        self.board.release(self.pin);
    }
}
