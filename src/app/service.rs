//! Switch yard service: the hexagonal core.
//!
//! [`SwitchYard`] owns the ordered device registry and the pin pool. It
//! exposes a hardware-agnostic API; every pin write flows through the
//! injected [`GpioPort`], layouts through the [`LayoutStore`], and
//! notifications through the [`EventSink`].
//!
//! ```text
//!   GpioPort ◀── ┌──────────────────────┐ ──▶ EventSink
//!                │      SwitchYard      │
//! LayoutStore ◀─▶│ devices · pin pool   │
//!                └──────────────────────┘
//! ```
//!
//! Invariant: a pin is in the pool iff no registered device holds it.

use std::collections::BTreeSet;

use log::{info, warn};

use crate::drivers::{ActionOutcome, Device, DeviceKind, SwitchAction, SwitchSettings};
use crate::error::{Result, YardError};
use crate::pins::{ASSIGNABLE_PINS, PinSet};

use super::commands::{CommandResult, Direction, YardCommand};
use super::events::{DeviceView, YardEvent};
use super::layout::{Layout, LayoutEntry, validate_name};
use super::ports::{EventSink, GpioPort, LayoutStore};

// ───────────────────────────────────────────────────────────────
// SwitchYard
// ───────────────────────────────────────────────────────────────

pub struct SwitchYard {
    devices: Vec<Device>,
    pool: BTreeSet<u8>,
    gpio: Box<dyn GpioPort>,
    store: Box<dyn LayoutStore>,
    sink: Box<dyn EventSink>,
    settings: SwitchSettings,
}

impl SwitchYard {
    /// Build an empty registry with every assignable pin free.
    pub fn new(
        gpio: Box<dyn GpioPort>,
        store: Box<dyn LayoutStore>,
        sink: Box<dyn EventSink>,
        settings: SwitchSettings,
    ) -> Self {
        let mut yard = Self {
            devices: Vec::new(),
            pool: ASSIGNABLE_PINS.iter().copied().collect(),
            gpio,
            store,
            sink,
            settings,
        };
        let backend = yard.gpio.backend();
        yard.sink.emit(&YardEvent::Started { backend });
        info!("SwitchYard started on {} GPIO", backend);
        yard
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply an external command.
    pub fn handle_command(&mut self, cmd: YardCommand) -> CommandResult {
        match cmd {
            YardCommand::Add { pins, kind } => self.add(pins, kind),
            YardCommand::Remove(pins) => self.remove(&pins).map(|_| ()),
            YardCommand::Act { pins, action } => self.act(&pins, action).map(|_| ()),
            YardCommand::Toggle(pins) => self.toggle(&pins).map(|_| ()),
            YardCommand::ToggleIndex(n) => self.toggle_index(n).map(|_| ()),
            YardCommand::ResetIndex(n) => self.reset_index(n),
            YardCommand::Nudge { pins, direction } => self.nudge(&pins, direction),
            YardCommand::Move { start, finish } => self.move_device(start, finish),
            YardCommand::SaveLayout(name) => self.save_layout(&name).map(|_| ()),
            YardCommand::LoadLayout(name) => self.load_layout(&name).map(|_| ()),
            YardCommand::DeleteLayout(name) => self.delete_layout(&name).map(|_| ()),
        }
    }

    // ── Registry mutation ─────────────────────────────────────

    /// Register a switch of `kind` on `pins`.
    ///
    /// Every pin must still be in the pool; the pool is only updated once
    /// the hardware is claimed.
    pub fn add(&mut self, pins: PinSet, kind: DeviceKind) -> Result<()> {
        if let Some(&taken) = pins.as_slice().iter().find(|p| !self.pool.contains(p)) {
            return Err(YardError::PinUnavailable(taken));
        }

        let device = Device::open(kind, pins.clone(), self.gpio.as_mut(), &self.settings)
            .inspect_err(|e| warn!("{} @ {}: construction failed: {}", kind, pins, e))?;

        for pin in pins.as_slice() {
            self.pool.remove(pin);
        }
        info!("{} is started", device);
        self.devices.push(device);
        self.sink.emit(&YardEvent::DeviceAdded { kind, pins });
        Ok(())
    }

    /// Close and unregister the device on `pins`. Returns `false` if no
    /// such device existed.
    pub fn remove(&mut self, pins: &PinSet) -> Result<bool> {
        let Some(idx) = self.position(pins) else {
            return Ok(false);
        };
        let device = self.devices.remove(idx);
        let kind = device.kind();
        let pins = device.pins().clone();
        // Pins are released on drop even if parking the hardware failed.
        let _ = device.close();
        self.pool.extend(pins.as_slice().iter().copied());
        info!("{} @ Pin : {} is closed", kind, pins);
        self.sink.emit(&YardEvent::DeviceRemoved { kind, pins });
        Ok(true)
    }

    /// Drive the device on `pins` to `action`.
    pub fn act(&mut self, pins: &PinSet, action: SwitchAction) -> Result<ActionOutcome> {
        let idx = self.require(pins)?;
        self.act_at(idx, action)
    }

    /// Flip the device on `pins`.
    pub fn toggle(&mut self, pins: &PinSet) -> Result<ActionOutcome> {
        let idx = self.require(pins)?;
        let next = SwitchAction::toggle_from(self.devices[idx].state());
        self.act_at(idx, next)
    }

    /// Flip the device at 1-based position `n`.
    pub fn toggle_index(&mut self, n: usize) -> Result<ActionOutcome> {
        let idx = self.one_based(n)?;
        let next = SwitchAction::toggle_from(self.devices[idx].state());
        self.act_at(idx, next)
    }

    /// Forget the state of the device at 1-based position `n`.
    pub fn reset_index(&mut self, n: usize) -> Result<()> {
        let idx = self.one_based(n)?;
        let device = &mut self.devices[idx];
        device.set_state(None);
        let pins = device.pins().clone();
        self.sink.emit(&YardEvent::StateReset { pins });
        Ok(())
    }

    /// Swap the device on `pins` with its neighbour. No-op at either end.
    pub fn nudge(&mut self, pins: &PinSet, direction: Direction) -> Result<()> {
        let idx = self.require(pins)?;
        let other = match direction {
            Direction::Up if idx > 0 => idx - 1,
            Direction::Down if idx + 1 < self.devices.len() => idx + 1,
            _ => return Ok(()),
        };
        self.devices.swap(idx, other);
        self.emit_order();
        Ok(())
    }

    /// Move the device at 0-based `start` to drop slot `finish`.
    ///
    /// `finish` is a drop slot in `0..=len` as reported by a drag-and-drop
    /// list: dropping below the original position lands one slot earlier
    /// once the device has been lifted out.
    pub fn move_device(&mut self, start: usize, finish: usize) -> Result<()> {
        let len = self.devices.len();
        if start >= len {
            return Err(YardError::IndexOutOfRange { index: start, len });
        }
        if finish > len {
            return Err(YardError::IndexOutOfRange { index: finish, len });
        }

        let mut target = finish;
        if target != 0 && target != len && start < target {
            target -= 1;
        }
        let device = self.devices.remove(start);
        let target = target.min(self.devices.len());
        self.devices.insert(target, device);
        self.emit_order();
        Ok(())
    }

    // ── Layouts ───────────────────────────────────────────────

    /// Persist the current registry. Returns the number of devices saved.
    pub fn save_layout(&mut self, name: &str) -> Result<usize> {
        let name = validate_name(name)?;
        let layout = self.layout();
        self.store.save(name, &layout)?;
        let devices = layout.devices.len();
        info!("saved {} device(s) as layout '{}'", devices, name);
        self.sink.emit(&YardEvent::LayoutSaved {
            name: name.to_string(),
            devices,
        });
        Ok(devices)
    }

    /// Replace the registry with a stored layout.
    ///
    /// The layout is fully validated before any current device is closed.
    /// If a device then fails to claim its pins the rest are still built
    /// and the first failure is returned.
    pub fn load_layout(&mut self, name: &str) -> Result<usize> {
        let name = validate_name(name)?;
        let layout = self.store.load(name)?;
        layout.validate()?;

        self.close_all();

        let mut first_err = None;
        for LayoutEntry { kind, pins, state } in layout.devices {
            match Device::open(kind, pins.clone(), self.gpio.as_mut(), &self.settings) {
                Ok(mut device) => {
                    device.set_state(state);
                    self.devices.push(device);
                }
                Err(e) => {
                    warn!("layout '{}': {} @ {} failed: {}", name, kind, pins, e);
                    if first_err.is_none() {
                        first_err = Some(YardError::Switch(e));
                    }
                }
            }
        }
        self.recompute_pool();

        let devices = self.devices.len();
        info!("loaded layout '{}' with {} device(s)", name, devices);
        self.sink.emit(&YardEvent::LayoutLoaded {
            name: name.to_string(),
            devices,
        });
        match first_err {
            Some(e) => Err(e),
            None => Ok(devices),
        }
    }

    /// Delete a stored layout. Returns `false` if it did not exist.
    pub fn delete_layout(&mut self, name: &str) -> Result<bool> {
        let name = validate_name(name)?;
        let existed = self.store.delete(name)?;
        if existed {
            self.sink.emit(&YardEvent::LayoutDeleted {
                name: name.to_string(),
            });
        }
        Ok(existed)
    }

    pub fn list_layouts(&self) -> Result<Vec<String>> {
        Ok(self.store.list()?)
    }

    /// Close every device. The registry is empty afterwards.
    pub fn shutdown(&mut self) -> usize {
        let closed = self.close_all();
        info!("SwitchYard shut down, {} device(s) closed", closed);
        closed
    }

    // ── Queries ───────────────────────────────────────────────

    /// Ordered views of every device.
    pub fn snapshot(&self) -> Vec<DeviceView> {
        self.devices.iter().map(view).collect()
    }

    pub fn device(&self, pins: &PinSet) -> Option<DeviceView> {
        self.position(pins).map(|idx| view(&self.devices[idx]))
    }

    /// Free pins, ascending.
    pub fn pool(&self) -> Vec<u8> {
        self.pool.iter().copied().collect()
    }

    pub fn device_types(&self) -> Vec<&'static str> {
        DeviceKind::TYPE_NAMES.to_vec()
    }

    /// Registry keys in display order.
    pub fn order(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.pins().key()).collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn backend(&self) -> &'static str {
        self.gpio.backend()
    }

    pub fn layout(&self) -> Layout {
        Layout {
            devices: self
                .devices
                .iter()
                .map(|d| LayoutEntry {
                    kind: d.kind(),
                    pins: d.pins().clone(),
                    state: d.state(),
                })
                .collect(),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn position(&self, pins: &PinSet) -> Option<usize> {
        self.devices.iter().position(|d| d.pins() == pins)
    }

    fn require(&self, pins: &PinSet) -> Result<usize> {
        self.position(pins)
            .ok_or_else(|| YardError::NoSuchDevice(pins.key()))
    }

    fn one_based(&self, n: usize) -> Result<usize> {
        let len = self.devices.len();
        if n == 0 || n > len {
            return Err(YardError::IndexOutOfRange { index: n, len });
        }
        Ok(n - 1)
    }

    fn act_at(&mut self, idx: usize, action: SwitchAction) -> Result<ActionOutcome> {
        let device = &mut self.devices[idx];
        let from = device.state();
        let kind = device.kind();
        let pins = device.pins().clone();

        match device.action(action, &mut *self.gpio) {
            Ok(ActionOutcome::Skipped) => {
                self.sink.emit(&YardEvent::Skipped { kind, pins, action });
                Ok(ActionOutcome::Skipped)
            }
            Ok(ActionOutcome::Thrown(throw)) => {
                self.sink.emit(&YardEvent::Switched {
                    kind,
                    pins,
                    from,
                    to: action,
                    throw,
                });
                Ok(ActionOutcome::Thrown(throw))
            }
            Err(error) => {
                self.sink.emit(&YardEvent::SwitchFailed {
                    kind,
                    pins,
                    action,
                    error: error.clone(),
                });
                Err(YardError::Switch(error))
            }
        }
    }

    fn close_all(&mut self) -> usize {
        let closed = self.devices.len();
        for device in self.devices.drain(..) {
            let _ = device.close();
        }
        self.recompute_pool();
        if closed > 0 {
            self.sink.emit(&YardEvent::Closed { devices: closed });
        }
        closed
    }

    fn recompute_pool(&mut self) {
        self.pool = ASSIGNABLE_PINS.iter().copied().collect();
        for device in &self.devices {
            for pin in device.pins().as_slice() {
                self.pool.remove(pin);
            }
        }
    }

    fn emit_order(&mut self) {
        let order = self.order();
        info!("new order: {:?}", order);
        self.sink.emit(&YardEvent::Reordered { order });
    }
}

fn view(device: &Device) -> DeviceView {
    DeviceView {
        key: device.pins().key(),
        pin: device.pins().as_slice().to_vec(),
        state: device.state(),
        name: device.kind().display_name(),
        kind: device.kind(),
    }
}
