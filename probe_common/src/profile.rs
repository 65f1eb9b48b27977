//! Probe profiles and the global probe table.
//!
//! A profile carries the safety bounds for one probe: trigger voltage,
//! intensity band, fire-duration band, cooldown band, and rate limit.
//! The controller reads the selected profile every tick and never
//! mutates it. A structurally invalid profile must never be allowed to
//! drive output; every read path falls back to the safe default.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::consts::{PROBE_NAME_MAX, PROBE_TABLE_SIZE};

/// Bounded profile name.
pub type ProbeName = String<PROBE_NAME_MAX>;

/// Configuration for a single probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeProfile {
    /// Human-readable name (e.g. "NEEDLE_A").
    pub name: ProbeName,
    /// Nominal trigger voltage [V].
    pub trigger_voltage: f64,
    /// Lower bound of the intensity band [V].
    pub intensity_min: f64,
    /// Upper bound of the intensity band [V].
    pub intensity_max: f64,
    /// Minimum fire duration [ticks].
    pub fire_duration_min: u32,
    /// Maximum fire duration [ticks].
    pub fire_duration_max: u32,
    /// Minimum cooldown [ticks].
    pub cooldown_min: u32,
    /// Maximum cooldown [ticks].
    pub cooldown_max: u32,
    /// Whether the per-probe safety interlock is honored.
    #[serde(default = "default_safety_enabled")]
    pub safety_enabled: bool,
    /// Minimum spacing between consecutive firings [ticks].
    /// Zero disables rate limiting.
    #[serde(default)]
    pub max_fire_rate: u32,
}

fn default_safety_enabled() -> bool {
    true
}

impl Default for ProbeProfile {
    fn default() -> Self {
        Self::safe_default()
    }
}

impl ProbeProfile {
    /// The all-zero fallback profile.
    ///
    /// Fails [`Self::is_valid`] by construction and cannot produce
    /// nonzero output even if it somehow reached the output stage.
    pub fn safe_default() -> Self {
        Self {
            name: ProbeName::new(),
            trigger_voltage: 0.0,
            intensity_min: 0.0,
            intensity_max: 0.0,
            fire_duration_min: 0,
            fire_duration_max: 0,
            cooldown_min: 0,
            cooldown_max: 0,
            safety_enabled: true,
            max_fire_rate: 0,
        }
    }

    /// Self-consistency check.
    ///
    /// All three min/max bands must be strictly ordered, and the
    /// profile must not be the all-zero unconfigured pattern (trigger
    /// voltage zero with both intensity endpoints zero).
    pub fn is_valid(&self) -> bool {
        if self.intensity_min >= self.intensity_max {
            return false;
        }
        if self.fire_duration_min >= self.fire_duration_max {
            return false;
        }
        if self.cooldown_min >= self.cooldown_max {
            return false;
        }
        // Unconfigured slot: no trigger level and no intensity band.
        if self.trigger_voltage == 0.0 && self.intensity_min == 0.0 && self.intensity_max == 0.0 {
            return false;
        }
        true
    }
}

/// Fixed-capacity ordered collection of probe profiles.
///
/// Populated once at startup, read-only thereafter from the
/// controller's perspective.
#[derive(Debug, Clone, Default)]
pub struct ProbeTable {
    profiles: [ProbeProfile; PROBE_TABLE_SIZE],
}

impl ProbeTable {
    pub fn new(profiles: [ProbeProfile; PROBE_TABLE_SIZE]) -> Self {
        Self { profiles }
    }

    /// Number of slots (fixed).
    #[inline]
    pub const fn capacity(&self) -> usize {
        PROBE_TABLE_SIZE
    }

    /// Safe accessor: returns the entry only if the index is in range
    /// AND the entry passes its own validity check; otherwise the safe
    /// default. An invalid entry is never propagated.
    pub fn get_safe(&self, index: usize) -> ProbeProfile {
        match self.profiles.get(index) {
            Some(p) if p.is_valid() => p.clone(),
            _ => ProbeProfile::safe_default(),
        }
    }

    /// Borrow a slot without the validity fallback (diagnostics only).
    pub fn get_raw(&self, index: usize) -> Option<&ProbeProfile> {
        self.profiles.get(index)
    }

    /// Linear scan by name. Returns the slot index, or `None` if no
    /// slot carries the name.
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.profiles.iter().position(|p| p.name.as_str() == name)
    }

    /// Aggregate validity: at least one entry must be independently
    /// valid for the table to be usable.
    pub fn is_valid(&self) -> bool {
        self.profiles.iter().any(ProbeProfile::is_valid)
    }

    /// Replace one slot (initialization only).
    ///
    /// An out-of-range index is a config-plumbing bug; it trips the
    /// debug assertion and is a no-op in release builds.
    pub fn set(&mut self, index: usize, profile: ProbeProfile) {
        debug_assert!(index < PROBE_TABLE_SIZE, "slot {index} out of range");
        if let Some(slot) = self.profiles.get_mut(index) {
            *slot = profile;
        }
    }
}
