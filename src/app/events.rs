//! Outbound yard events and read-side views.
//!
//! The [`SwitchYard`](super::service::SwitchYard) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them; today that is the server log.

use serde::Serialize;

use crate::drivers::{DeviceKind, SwitchAction, Throw};
use crate::error::SwitchError;
use crate::pins::PinSet;

/// Structured events emitted by the registry.
#[derive(Debug, Clone)]
pub enum YardEvent {
    /// The registry came up on the named GPIO backend.
    Started { backend: &'static str },

    DeviceAdded { kind: DeviceKind, pins: PinSet },

    DeviceRemoved { kind: DeviceKind, pins: PinSet },

    /// Hardware was driven to a new state.
    Switched {
        kind: DeviceKind,
        pins: PinSet,
        from: Option<SwitchAction>,
        to: SwitchAction,
        throw: Throw,
    },

    /// The requested state matched the remembered one.
    Skipped {
        kind: DeviceKind,
        pins: PinSet,
        action: SwitchAction,
    },

    SwitchFailed {
        kind: DeviceKind,
        pins: PinSet,
        action: SwitchAction,
        error: SwitchError,
    },

    /// Remembered state was cleared without touching hardware.
    StateReset { pins: PinSet },

    /// Device order changed; carries the new key order.
    Reordered { order: Vec<String> },

    LayoutSaved { name: String, devices: usize },

    LayoutLoaded { name: String, devices: usize },

    LayoutDeleted { name: String },

    /// Every device was closed (shutdown or layout swap).
    Closed { devices: usize },
}

/// JSON/HTML view of one registered device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceView {
    /// Registry key, e.g. `"16,18"`.
    pub key: String,
    pub pin: Vec<u8>,
    pub state: Option<SwitchAction>,
    pub name: &'static str,
    pub kind: DeviceKind,
}
