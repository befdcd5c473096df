//! Railyard: web-controlled Lionel track switches.
//!
//! Exposes the registry, drivers and HTTP router for integration testing.
//! Real GPIO access is behind the `rpi` feature; everything else runs on
//! any host against the simulated header.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod http;
pub mod pins;
