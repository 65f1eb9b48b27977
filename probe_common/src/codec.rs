//! Voltage codec: real voltage ↔ 12-bit DAC code.
//!
//! The encode path is the last line of defense before a value reaches
//! the output port, so out-of-range inputs are silently clamped rather
//! than rejected. No function in this module can fail.

use crate::consts::{DIGITAL_MAX, V_MAX, V_MIN};

/// Force a voltage into the device analog range.
///
/// NaN is treated as the minimum (a NaN must never propagate into the
/// linear mapping).
#[inline]
pub fn clamp_voltage(volts: f64) -> f64 {
    if volts.is_nan() {
        return V_MIN;
    }
    volts.clamp(V_MIN, V_MAX)
}

/// True iff `volts` lies within the device analog range.
#[inline]
pub fn is_safe_voltage(volts: f64) -> bool {
    volts >= V_MIN && volts <= V_MAX
}

/// True iff `raw` lies on the digital grid.
#[inline]
pub const fn is_safe_digital(raw: u16) -> bool {
    raw <= DIGITAL_MAX
}

/// Encode a voltage as a digital code.
///
/// The input is clamped to `[V_MIN, V_MAX]` first, then mapped
/// linearly onto `0..=DIGITAL_MAX` and rounded to the nearest grid
/// point. Always returns an in-range code.
#[inline]
pub fn encode(volts: f64) -> u16 {
    let v = clamp_voltage(volts);
    let scaled = (v - V_MIN) * DIGITAL_MAX as f64 / (V_MAX - V_MIN);
    // Rounding keeps the result inside 0..=DIGITAL_MAX for clamped input.
    scaled.round() as u16
}

/// Decode a digital code back to a voltage.
///
/// Defensively clamps the input to the digital grid and the result to
/// the analog range. Algebraic inverse of [`encode`] up to grid
/// quantization.
#[inline]
pub fn decode(raw: u16) -> f64 {
    let d = if raw > DIGITAL_MAX { DIGITAL_MAX } else { raw };
    let v = V_MIN + d as f64 * (V_MAX - V_MIN) / DIGITAL_MAX as f64;
    clamp_voltage(v)
}

/// One digital step expressed in volts.
#[inline]
pub fn digital_step() -> f64 {
    (V_MAX - V_MIN) / DIGITAL_MAX as f64
}
