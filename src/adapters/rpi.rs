//! Raspberry Pi GPIO backend (`rpi` feature).
//!
//! Drives the real header through `rppal`. Board numbers are translated
//! to BCM lines via [`pins::board_to_bcm`]. Servo pulses use rppal's
//! software PWM, which is accurate enough for hobby servos at 50 Hz.
//! Pins are reset to their previous mode when a line is dropped.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use log::info;
use rppal::gpio::{self, Gpio};

use crate::app::ports::{GpioPort, OutputLine, PulseLine};
use crate::error::LineError;
use crate::pins;

pub struct RpiGpio {
    gpio: Gpio,
}

impl RpiGpio {
    /// Open `/dev/gpiomem`.
    pub fn new() -> Result<Self, LineError> {
        let gpio = Gpio::new().map_err(|e| LineError::Io(e.to_string()))?;
        info!("RpiGpio: header opened");
        Ok(Self { gpio })
    }

    fn pin(&self, board: u8) -> Result<gpio::Pin, LineError> {
        let bcm = pins::board_to_bcm(board).ok_or(LineError::Unavailable(board))?;
        self.gpio.get(bcm).map_err(|e| map_err(board, e))
    }
}

fn map_err(board: u8, e: gpio::Error) -> LineError {
    match e {
        gpio::Error::PinUsed(_) => LineError::Busy(board),
        gpio::Error::PinNotAvailable(_) => LineError::Unavailable(board),
        other => LineError::Io(other.to_string()),
    }
}

impl DelayNs for RpiGpio {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

impl GpioPort for RpiGpio {
    fn claim_output(&mut self, board: u8, initial_high: bool) -> Result<OutputLine, LineError> {
        let pin = self.pin(board)?;
        let pin = if initial_high {
            pin.into_output_high()
        } else {
            pin.into_output_low()
        };
        Ok(Box::new(RpiOutput { pin }))
    }

    fn claim_pulse(&mut self, board: u8) -> Result<Box<dyn PulseLine>, LineError> {
        let pin = self.pin(board)?.into_output_low();
        Ok(Box::new(RpiPulse { board, pin }))
    }

    fn backend(&self) -> &'static str {
        "rppal"
    }
}

struct RpiOutput {
    pin: gpio::OutputPin,
}

impl ErrorType for RpiOutput {
    type Error = LineError;
}

impl OutputPin for RpiOutput {
    fn set_low(&mut self) -> Result<(), LineError> {
        self.pin.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), LineError> {
        self.pin.set_high();
        Ok(())
    }
}

struct RpiPulse {
    board: u8,
    pin: gpio::OutputPin,
}

impl PulseLine for RpiPulse {
    fn set_pulse(&mut self, period: Duration, width: Duration) -> Result<(), LineError> {
        self.pin
            .set_pwm(period, width)
            .map_err(|e| map_err(self.board, e))
    }

    fn stop(&mut self) -> Result<(), LineError> {
        self.pin.clear_pwm().map_err(|e| map_err(self.board, e))?;
        self.pin.set_low();
        Ok(())
    }
}
