//! TOML configuration for the probe firing controller.
//!
//! Loaded once at startup and immutable afterwards. Numeric parameters
//! are bounds-checked by `validate()`; optional fields carry serde
//! defaults so older config files keep deserializing.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::consts::{
    ARMING_TIMEOUT_TICKS_DEFAULT, PROBE_NAME_MAX, PROBE_TABLE_SIZE, STATUS_LOG_INTERVAL_DEFAULT,
    TICK_RATE_HZ_DEFAULT, TICK_RATE_HZ_MAX, TICK_RATE_HZ_MIN,
};
use crate::lut::{LutCurve, PercentLut};
use crate::profile::{ProbeName, ProbeProfile, ProbeTable};

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config validation failed: {0}")]
    Validation(String),
}

// ─── Controller Section ─────────────────────────────────────────────

/// Controller timing parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Tick rate [Hz] (default: 1000 = 1 kHz).
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,

    /// Bounded wait for a trigger while armed [ticks].
    #[serde(default = "default_arming_timeout")]
    pub arming_timeout_ticks: u32,

    /// Status logging interval [ticks].
    #[serde(default = "default_status_log_interval")]
    pub status_log_interval: u32,
}

fn default_tick_rate_hz() -> u32 {
    TICK_RATE_HZ_DEFAULT
}
fn default_arming_timeout() -> u32 {
    ARMING_TIMEOUT_TICKS_DEFAULT
}
fn default_status_log_interval() -> u32 {
    STATUS_LOG_INTERVAL_DEFAULT
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: TICK_RATE_HZ_DEFAULT,
            arming_timeout_ticks: ARMING_TIMEOUT_TICKS_DEFAULT,
            status_log_interval: STATUS_LOG_INTERVAL_DEFAULT,
        }
    }
}

impl ControllerConfig {
    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_rate_hz < TICK_RATE_HZ_MIN || self.tick_rate_hz > TICK_RATE_HZ_MAX {
            return Err(format!(
                "tick_rate_hz {} out of range [{}, {}]",
                self.tick_rate_hz, TICK_RATE_HZ_MIN, TICK_RATE_HZ_MAX
            ));
        }
        if self.arming_timeout_ticks == 0 {
            return Err("arming_timeout_ticks must be nonzero".to_string());
        }
        if self.status_log_interval == 0 {
            return Err("status_log_interval must be nonzero".to_string());
        }
        Ok(())
    }
}

// ─── LUT Section ────────────────────────────────────────────────────

/// Percent lookup table generation parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LutConfig {
    /// Voltage at 0% intensity [V].
    #[serde(default)]
    pub base_voltage: f64,
    /// Voltage at 100% intensity [V].
    #[serde(default = "default_lut_max")]
    pub max_voltage: f64,
    /// Curve shape (default: linear).
    #[serde(default)]
    pub curve: LutCurve,
}

fn default_lut_max() -> f64 {
    crate::consts::V_MAX
}

impl Default for LutConfig {
    fn default() -> Self {
        Self {
            base_voltage: 0.0,
            max_voltage: crate::consts::V_MAX,
            curve: LutCurve::Linear,
        }
    }
}

impl LutConfig {
    /// Generate the runtime table.
    pub fn build_lut(&self) -> PercentLut {
        PercentLut::generate(self.curve, self.base_voltage, self.max_voltage)
    }
}

// ─── Profile Section ────────────────────────────────────────────────

/// Serde mirror of [`ProbeProfile`] with an unbounded name, so a TOML
/// typo produces a clean validation error instead of a parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub name: String,
    pub trigger_voltage: f64,
    pub intensity_min: f64,
    pub intensity_max: f64,
    pub fire_duration_min: u32,
    pub fire_duration_max: u32,
    pub cooldown_min: u32,
    pub cooldown_max: u32,
    #[serde(default = "default_safety_enabled")]
    pub safety_enabled: bool,
    #[serde(default)]
    pub max_fire_rate: u32,
}

fn default_safety_enabled() -> bool {
    true
}

impl ProfileConfig {
    fn to_profile(&self) -> Result<ProbeProfile, String> {
        let name = ProbeName::try_from(self.name.as_str())
            .map_err(|_| format!("profile name '{}' exceeds {PROBE_NAME_MAX} bytes", self.name))?;
        Ok(ProbeProfile {
            name,
            trigger_voltage: self.trigger_voltage,
            intensity_min: self.intensity_min,
            intensity_max: self.intensity_max,
            fire_duration_min: self.fire_duration_min,
            fire_duration_max: self.fire_duration_max,
            cooldown_min: self.cooldown_min,
            cooldown_max: self.cooldown_max,
            safety_enabled: self.safety_enabled,
            max_fire_rate: self.max_fire_rate,
        })
    }
}

// ─── Top-Level Config ───────────────────────────────────────────────

/// Top-level configuration: controller timing, LUT generation, and the
/// probe profile table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeSystemConfig {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub lut: LutConfig,
    #[serde(default, rename = "profile")]
    pub profiles: Vec<ProfileConfig>,
}

impl ProbeSystemConfig {
    /// Parse from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-field validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.controller.validate().map_err(ConfigError::Validation)?;
        if self.profiles.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[profile]] entry is required".to_string(),
            ));
        }
        for p in &self.profiles {
            if p.name.len() > PROBE_NAME_MAX {
                return Err(ConfigError::Validation(format!(
                    "profile name '{}' exceeds {PROBE_NAME_MAX} bytes",
                    p.name
                )));
            }
        }
        Ok(())
    }

    /// Build the runtime probe table from the first
    /// [`PROBE_TABLE_SIZE`] profile entries. Unconfigured slots keep
    /// the safe default; surplus entries are ignored with a warning.
    pub fn build_table(&self) -> Result<ProbeTable, ConfigError> {
        if self.profiles.len() > PROBE_TABLE_SIZE {
            warn!(
                "config declares {} profiles; only the first {} are used",
                self.profiles.len(),
                PROBE_TABLE_SIZE
            );
        }
        let mut table = ProbeTable::default();
        for (i, p) in self.profiles.iter().take(PROBE_TABLE_SIZE).enumerate() {
            let profile = p.to_profile().map_err(ConfigError::Validation)?;
            if !profile.is_valid() {
                warn!("profile '{}' (slot {i}) fails self-consistency", p.name);
            }
            table.set(i, profile);
        }
        if !table.is_valid() {
            return Err(ConfigError::Validation(
                "probe table has no valid profile".to_string(),
            ));
        }
        Ok(table)
    }
}

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<ProbeSystemConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    ProbeSystemConfig::from_toml(&content)
}
