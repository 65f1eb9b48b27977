//! Percent lookup table: 0–100% intensity index → digital voltage.
//!
//! A fixed 128-entry table generated once from two endpoint voltages
//! (linear or log-like curve) and treated as immutable afterwards.
//! Lookups are bounds-checked and fall back to the safe zero code.

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::consts::{LUT_MIN_VALID_ENTRIES, LUT_SIZE};

/// Percent scaling denominator: `index = pct * LUT_SIZE / 100`.
const PCT_FULL_SCALE: usize = 100;

/// Curve shape used to generate a [`PercentLut`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LutCurve {
    /// Linear interpolation between the endpoints.
    #[default]
    Linear,
    /// Log-like compression: fine resolution near the base voltage.
    Log,
}

/// Fixed-size percentage-indexed voltage table.
///
/// Entry 0 holds the base (minimum) code by construction. The `valid`
/// flag plus the per-entry digital-range check gate any use of the
/// table for output scaling.
#[derive(Debug, Clone)]
pub struct PercentLut {
    entries: [u16; LUT_SIZE],
    /// Logical size; always `LUT_SIZE` for generated tables.
    len: u8,
    valid: bool,
}

impl Default for PercentLut {
    fn default() -> Self {
        Self {
            entries: [0; LUT_SIZE],
            len: LUT_SIZE as u8,
            valid: false,
        }
    }
}

impl PercentLut {
    /// Generate a table by linear interpolation between two endpoint
    /// voltages. Every entry passes through the voltage codec, so the
    /// result is on-grid regardless of the endpoints supplied.
    pub fn linear(base_voltage: f64, max_voltage: f64) -> Self {
        let mut entries = [0u16; LUT_SIZE];
        let span = max_voltage - base_voltage;
        for (i, slot) in entries.iter_mut().enumerate() {
            let frac = i as f64 / (LUT_SIZE - 1) as f64;
            *slot = codec::encode(base_voltage + span * frac);
        }
        Self {
            entries,
            len: LUT_SIZE as u8,
            valid: true,
        }
    }

    /// Generate a table with a log-like curve between two endpoint
    /// voltages: `frac' = ln(1 + 9·frac) / ln(10)`, which compresses
    /// the upper range and spreads resolution near the base voltage.
    pub fn log_curve(base_voltage: f64, max_voltage: f64) -> Self {
        let mut entries = [0u16; LUT_SIZE];
        let span = max_voltage - base_voltage;
        for (i, slot) in entries.iter_mut().enumerate() {
            let frac = i as f64 / (LUT_SIZE - 1) as f64;
            let shaped = (1.0 + 9.0 * frac).ln() / 10.0_f64.ln();
            *slot = codec::encode(base_voltage + span * shaped);
        }
        Self {
            entries,
            len: LUT_SIZE as u8,
            valid: true,
        }
    }

    /// Generate from a [`LutCurve`] selector.
    pub fn generate(curve: LutCurve, base_voltage: f64, max_voltage: f64) -> Self {
        match curve {
            LutCurve::Linear => Self::linear(base_voltage, max_voltage),
            LutCurve::Log => Self::log_curve(base_voltage, max_voltage),
        }
    }

    /// Wrap raw codes (e.g. host-written) in a table record.
    ///
    /// The validity flag is taken at face value; [`Self::is_valid`]
    /// still applies the per-entry range check on top.
    pub fn from_raw(entries: [u16; LUT_SIZE], valid: bool) -> Self {
        Self {
            entries,
            len: LUT_SIZE as u8,
            valid,
        }
    }

    /// Bounds-checked lookup. Out-of-range indices return the safe
    /// zero code instead of indexing the array.
    #[inline]
    pub fn lookup_safe(&self, index: usize) -> u16 {
        if index < self.len as usize {
            self.entries[index]
        } else {
            0
        }
    }

    /// Logical table size.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True iff the validity flag is set and at least a quarter of the
    /// entries individually pass the digital-range check.
    pub fn is_valid(&self) -> bool {
        if !self.valid {
            return false;
        }
        let in_range = self
            .entries
            .iter()
            .filter(|&&e| codec::is_safe_digital(e))
            .count();
        in_range >= LUT_MIN_VALID_ENTRIES
    }
}

/// Scale a percentage (0–100) to a table index.
///
/// `index = pct * 128 / 100`, clamped to the table. The integer
/// truncation here is intentional and NOT an exact inverse of
/// [`index_to_percentage`] at the boundaries.
#[inline]
pub fn percentage_to_index(pct: u8) -> usize {
    let idx = pct as usize * LUT_SIZE / PCT_FULL_SCALE;
    if idx >= LUT_SIZE { LUT_SIZE - 1 } else { idx }
}

/// Scale a table index back to a percentage (0–100), truncating.
#[inline]
pub fn index_to_percentage(index: usize) -> u32 {
    (index * PCT_FULL_SCALE / LUT_SIZE) as u32
}
