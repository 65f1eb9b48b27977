//! Probe Common Library
//!
//! Shared safety data layer for the probe firing controller workspace:
//! the voltage codec, the percent lookup table, probe profiles and the
//! global probe table, status/fault/alarm types, and configuration
//! loading.
//!
//! # Module Structure
//!
//! - [`consts`] - System-wide numeric limits and defaults
//! - [`codec`] - Voltage ↔ digital code conversion with clamping
//! - [`lut`] - 128-entry percent-indexed voltage table
//! - [`profile`] - Probe profiles and the 4-slot global table
//! - [`status`] - State codes, fault codes, alarms, status word
//! - [`config`] - TOML configuration loading

pub mod codec;
pub mod config;
pub mod consts;
pub mod lut;
pub mod profile;
pub mod status;
