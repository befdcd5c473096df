//! Application core: registry logic, zero direct I/O.
//!
//! This module contains the rules for the switch yard: which pins are free,
//! which device sits where in the list, what state each switch was last
//! thrown to, and how layouts are saved and restored. All interaction with
//! hardware and disk happens through the **port traits** in [`ports`].

pub mod commands;
pub mod events;
pub mod layout;
pub mod ports;
pub mod service;
