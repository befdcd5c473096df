//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured yard events to the
//! server log, which is what the `/log/` page shows.

use log::{info, warn};

use crate::app::events::YardEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`YardEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

fn state_label(state: Option<crate::drivers::SwitchAction>) -> &'static str {
    state.map_or("unknown", |s| s.as_str())
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &YardEvent) {
        match event {
            YardEvent::Started { backend } => {
                info!("START  | gpio={}", backend);
            }
            YardEvent::DeviceAdded { kind, pins } => {
                info!("ADD    | {} @ Pin : {}", kind, pins);
            }
            YardEvent::DeviceRemoved { kind, pins } => {
                info!("REMOVE | {} @ Pin : {}", kind, pins);
            }
            YardEvent::Switched {
                kind,
                pins,
                from,
                to,
                throw,
            } => {
                info!(
                    "SWITCH | {} @ Pin : {} | initial state={} | action={} | update={}",
                    kind,
                    pins,
                    state_label(*from),
                    to,
                    throw
                );
            }
            YardEvent::Skipped { kind, pins, action } => {
                info!(
                    "SWITCH | {} @ Pin : {} | action={} | update=skipped",
                    kind, pins, action
                );
            }
            YardEvent::SwitchFailed {
                kind,
                pins,
                action,
                error,
            } => {
                warn!(
                    "SWITCH | {} @ Pin : {} | action={} | failed: {}",
                    kind, pins, action, error
                );
            }
            YardEvent::StateReset { pins } => {
                info!("RESET  | Pin : {}", pins);
            }
            YardEvent::Reordered { order } => {
                info!("ORDER  | {:?}", order);
            }
            YardEvent::LayoutSaved { name, devices } => {
                info!("LAYOUT | saved '{}' ({} devices)", name, devices);
            }
            YardEvent::LayoutLoaded { name, devices } => {
                info!("LAYOUT | loaded '{}' ({} devices)", name, devices);
            }
            YardEvent::LayoutDeleted { name } => {
                info!("LAYOUT | deleted '{}'", name);
            }
            YardEvent::Closed { devices } => {
                info!("CLOSE  | {} device(s) closed", devices);
            }
        }
    }
}
