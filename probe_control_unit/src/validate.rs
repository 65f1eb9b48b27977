//! Per-tick validation and clamping.
//!
//! Runs every tick regardless of controller state. Two failure
//! classes come out of here:
//!
//! - **Clamped-but-continuing**: a requested duration, cooldown, or
//!   intensity outside the profile band is clamped into range and the
//!   matching alarm bit is set. Never fault-worthy.
//! - **Structural**: the selected slot is out of range, the profile
//!   fails self-consistency, or (with the safety interlock enabled)
//!   the profile programs voltages the device cannot produce. These
//!   force `HardFault`.

use probe_common::codec;
use probe_common::lut;
use probe_common::profile::{ProbeProfile, ProbeTable};
use probe_common::status::{AlarmFlags, FaultCode};

use crate::controller::TickInputs;

/// Outcome of one tick's validation pass.
#[derive(Debug, Clone)]
pub struct ValidatedParams {
    /// Snapshot of the selected profile (safe default on any fault).
    pub profile: ProbeProfile,
    /// Fire duration clamped into the profile band [ticks].
    pub fire_ticks: u32,
    /// Cooldown clamped into the profile band [ticks].
    pub cooldown_ticks: u32,
    /// LUT index derived from the clamped intensity percent.
    pub lut_index: usize,
    /// Alarm bits raised by clamping.
    pub alarms: AlarmFlags,
    /// Structural fault, if any.
    pub fault: Option<FaultCode>,
}

impl ValidatedParams {
    fn faulted(code: FaultCode) -> Self {
        Self {
            profile: ProbeProfile::safe_default(),
            fire_ticks: 0,
            cooldown_ticks: 0,
            lut_index: 0,
            alarms: AlarmFlags::empty(),
            fault: Some(code),
        }
    }
}

/// Validate the selected profile and clamp the requested runtime
/// parameters against it.
pub fn validate_tick(table: &ProbeTable, inputs: &TickInputs) -> ValidatedParams {
    let index = inputs.profile_select as usize;
    if index >= table.capacity() {
        return ValidatedParams::faulted(FaultCode::InvalidProbeSel);
    }

    // get_safe substitutes the safe default for an invalid slot, and
    // the safe default never validates, so this catches both.
    let profile = table.get_safe(index);
    if !profile.is_valid() {
        return ValidatedParams::faulted(FaultCode::ParamValidation);
    }

    let mut alarms = AlarmFlags::empty();

    // With the interlock enabled, a profile programming voltages the
    // device cannot produce is structural, not clampable.
    if profile.safety_enabled {
        if !codec::is_safe_voltage(profile.trigger_voltage) {
            return ValidatedParams::faulted(FaultCode::VoltageOutOfRange);
        }
        if !codec::is_safe_voltage(profile.intensity_min)
            || !codec::is_safe_voltage(profile.intensity_max)
        {
            return ValidatedParams::faulted(FaultCode::SafetyFault);
        }
    } else if !codec::is_safe_voltage(profile.trigger_voltage) {
        // Interlock bypassed: the codec will clamp at the output
        // stage; record that the request was not honored as-is.
        alarms.insert(AlarmFlags::TRIGGER_CLAMPED);
    }

    let fire_ticks = clamp_with_alarm(
        inputs.requested_fire_ticks,
        profile.fire_duration_min,
        profile.fire_duration_max,
        AlarmFlags::FIRE_DURATION_CLAMPED,
        &mut alarms,
    );
    let cooldown_ticks = clamp_with_alarm(
        inputs.requested_cooldown_ticks,
        profile.cooldown_min,
        profile.cooldown_max,
        AlarmFlags::COOLDOWN_CLAMPED,
        &mut alarms,
    );

    let pct = if inputs.intensity_percent > 100 {
        alarms.insert(AlarmFlags::INTENSITY_INDEX_CLAMPED);
        100
    } else {
        inputs.intensity_percent
    };
    let lut_index = lut::percentage_to_index(pct);

    ValidatedParams {
        profile,
        fire_ticks,
        cooldown_ticks,
        lut_index,
        alarms,
        fault: None,
    }
}

/// Clamp the intensity code from the LUT into the profile's encoded
/// intensity band. Sets the alarm bit when the clamp bites.
pub fn clamp_intensity(raw: u16, profile: &ProbeProfile, alarms: &mut AlarmFlags) -> u16 {
    let lo = codec::encode(profile.intensity_min);
    let hi = codec::encode(profile.intensity_max);
    if raw < lo {
        alarms.insert(AlarmFlags::INTENSITY_CLAMPED);
        lo
    } else if raw > hi {
        alarms.insert(AlarmFlags::INTENSITY_CLAMPED);
        hi
    } else {
        raw
    }
}

fn clamp_with_alarm(
    requested: u32,
    min: u32,
    max: u32,
    flag: AlarmFlags,
    alarms: &mut AlarmFlags,
) -> u32 {
    if requested < min {
        alarms.insert(flag);
        min
    } else if requested > max {
        alarms.insert(flag);
        max
    } else {
        requested
    }
}
