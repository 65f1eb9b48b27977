//! System-wide constants for the probe workspace.
//!
//! Single source of truth for all numeric limits and default values.
//! Imported by all crates — no duplication permitted.

/// Lower bound of the device analog output range [V].
pub const V_MIN: f64 = -5.0;

/// Upper bound of the device analog output range [V].
pub const V_MAX: f64 = 5.0;

/// Full-scale digital code of the 12-bit DAC grid.
pub const DIGITAL_MAX: u16 = 4095;

/// Number of entries in the percent lookup table.
pub const LUT_SIZE: usize = 128;

/// Minimum number of individually range-valid entries for a LUT
/// to be considered valid (25% of `LUT_SIZE`).
pub const LUT_MIN_VALID_ENTRIES: usize = 32;

/// Number of selectable probe profile slots.
pub const PROBE_TABLE_SIZE: usize = 4;

/// Maximum length of a probe profile name.
pub const PROBE_NAME_MAX: usize = 16;

/// Default controller tick rate (1 kHz).
pub const TICK_RATE_HZ_DEFAULT: u32 = 1000;

/// Tick rate bounds for config validation.
pub const TICK_RATE_HZ_MIN: u32 = 1;
pub const TICK_RATE_HZ_MAX: u32 = 100_000;

/// Default bounded wait for a trigger while armed [ticks].
pub const ARMING_TIMEOUT_TICKS_DEFAULT: u32 = 10_000;

/// Default status logging interval [ticks].
pub const STATUS_LOG_INTERVAL_DEFAULT: u32 = 1000;
