//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements   | Connects to                  |
//! |----------------|--------------|------------------------------|
//! | `rpi`          | GpioPort     | Pi header via rppal          |
//! | `sim`          | GpioPort     | In-memory simulated header   |
//! | `layout_files` | LayoutStore  | JSON files / in-memory map   |
//! | `log_sink`     | EventSink    | Server log                   |
//! | `log_file`     | (none)       | Log file setup and read-back |

pub mod layout_files;
pub mod log_file;
pub mod log_sink;
#[cfg(feature = "rpi")]
pub mod rpi;
pub mod sim;

use crate::app::ports::GpioPort;
use crate::error::LineError;

/// The GPIO backend this build drives.
#[cfg(feature = "rpi")]
pub fn default_gpio() -> Result<Box<dyn GpioPort>, LineError> {
    Ok(Box::new(rpi::RpiGpio::new()?))
}

/// The GPIO backend this build drives.
#[cfg(not(feature = "rpi"))]
pub fn default_gpio() -> Result<Box<dyn GpioPort>, LineError> {
    log::warn!("built without the `rpi` feature, using simulated GPIO");
    Ok(Box::new(sim::SimGpio::new()))
}
