//! Controller state codes, fault codes, alarm flags, and the packed
//! 32-bit status word.
//!
//! The status word is the controller's only externally visible failure
//! channel. The bit layout is stable; unused bits are fixed at zero.
//! `decode` is the structural inverse of `encode` for the fields the
//! word carries — the fault code is deliberately NOT in the word and
//! must be read from the controller accessor.

use bitflags::bitflags;
use static_assertions::const_assert;

// ─── Firing State ───────────────────────────────────────────────────

/// Closed set of controller states.
///
/// The hard-fault code is `0xF` so a faulted status word is
/// recognizable at a glance in the 4-bit state field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FiringState {
    /// Initial state; all outputs and timers zero.
    Reset = 0,
    /// Profile validated, waiting for start.
    Ready = 1,
    /// Quiescent operating state.
    Idle = 2,
    /// Watching for a trigger edge, bounded by the arming timeout.
    Armed = 3,
    /// Output driven; fire countdown running.
    Firing = 4,
    /// Output forced safe; cooldown countdown running.
    Cooling = 5,
    /// Terminal except for external reset.
    HardFault = 15,
}

impl FiringState {
    /// Convert from the raw 4-bit code. Returns `None` for codes
    /// outside the closed set.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Reset),
            1 => Some(Self::Ready),
            2 => Some(Self::Idle),
            3 => Some(Self::Armed),
            4 => Some(Self::Firing),
            5 => Some(Self::Cooling),
            15 => Some(Self::HardFault),
            _ => None,
        }
    }

    /// True for states in which the output stage may be driven.
    #[inline]
    pub const fn output_allowed(&self) -> bool {
        matches!(self, Self::Firing)
    }
}

impl Default for FiringState {
    fn default() -> Self {
        Self::Reset
    }
}

// ─── Fault Code ─────────────────────────────────────────────────────

/// 8-bit fault/error code published alongside the status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault.
    None = 0,
    /// Selected profile index out of range.
    InvalidProbeSel = 1,
    /// Profile trigger voltage outside the analog range.
    VoltageOutOfRange = 2,
    /// Fire countdown failed to terminate.
    FiringTimeout = 3,
    /// Cooldown countdown failed to terminate.
    CoolingTimeout = 4,
    /// Selected profile failed self-consistency.
    ParamValidation = 5,
    /// Safety interlock violation.
    SafetyFault = 6,
    /// Armed without a trigger beyond the bounded window.
    TriggerTimeout = 7,
    /// Unrecognized internal state (defensive default arm).
    UnknownState = 8,
}

impl FaultCode {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::InvalidProbeSel),
            2 => Some(Self::VoltageOutOfRange),
            3 => Some(Self::FiringTimeout),
            4 => Some(Self::CoolingTimeout),
            5 => Some(Self::ParamValidation),
            6 => Some(Self::SafetyFault),
            7 => Some(Self::TriggerTimeout),
            8 => Some(Self::UnknownState),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_fault(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Default for FaultCode {
    fn default() -> Self {
        Self::None
    }
}

// ─── Alarm Flags ────────────────────────────────────────────────────

bitflags! {
    /// 8-bit alarm register, one bit per validation-failure category.
    ///
    /// Alarms are advisory: a set bit means a requested value had to
    /// be clamped, never that the operation stopped.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AlarmFlags: u8 {
        /// Requested fire duration clamped to the profile band.
        const FIRE_DURATION_CLAMPED   = 0x01;
        /// Requested cooldown clamped to the profile band.
        const COOLDOWN_CLAMPED        = 0x02;
        /// Intensity percent above 100 clamped.
        const INTENSITY_INDEX_CLAMPED = 0x04;
        /// LUT intensity value clamped to the profile band.
        const INTENSITY_CLAMPED       = 0x08;
        /// Trigger voltage clamped to the analog range.
        const TRIGGER_CLAMPED         = 0x10;
        /// Trigger ignored: refire spacing below `max_fire_rate`.
        const RATE_LIMITED            = 0x20;
    }
}

impl Default for AlarmFlags {
    fn default() -> Self {
        Self::empty()
    }
}

// ─── Status Word ────────────────────────────────────────────────────

/// Bit layout of the 32-bit status word.
pub mod layout {
    /// Fault bit.
    pub const FAULT_BIT: u32 = 1 << 31;
    /// Alarm bit.
    pub const ALARM_BIT: u32 = 1 << 30;
    /// Selected profile index, 2 bits.
    pub const PROFILE_SHIFT: u32 = 28;
    pub const PROFILE_MASK: u32 = 0x3;
    /// Current state code, 4 bits.
    pub const STATE_SHIFT: u32 = 24;
    pub const STATE_MASK: u32 = 0xF;
    /// Fire countdown, truncated to 8 bits.
    pub const FIRE_SHIFT: u32 = 16;
    /// Cooldown countdown, truncated to 8 bits.
    pub const COOL_SHIFT: u32 = 8;
    pub const COUNTER_MASK: u32 = 0xFF;
    /// Caller-supplied auxiliary status bits.
    pub const AUX_MASK: u32 = 0xFF;
}

// The 2-bit profile field must cover every table slot.
const_assert!(crate::consts::PROBE_TABLE_SIZE <= (layout::PROFILE_MASK as usize) + 1);
// HardFault (0xF) must fit the 4-bit state field.
const_assert!(15u32 <= layout::STATE_MASK);

/// Decoded view of the fields carried by the status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusView {
    pub fault: bool,
    pub alarm: bool,
    /// Selected profile index (0..=3).
    pub profile_index: u8,
    /// Raw 4-bit state code; `None` from `decode` means a code outside
    /// the closed set was carried (itself a fault condition).
    pub state: Option<FiringState>,
    /// Fire countdown, saturated to 8 bits.
    pub fire_countdown: u8,
    /// Cooldown countdown, saturated to 8 bits.
    pub cooldown_countdown: u8,
    /// Auxiliary status bits supplied by the host layer.
    pub aux: u8,
}

/// Pack controller state into the 32-bit status word.
///
/// Counters wider than 8 bits saturate rather than wrap so a long
/// countdown never reads as nearly-done.
pub fn encode(
    state: FiringState,
    fault: bool,
    alarm: bool,
    profile_index: u8,
    fire_countdown: u32,
    cooldown_countdown: u32,
    aux: u8,
) -> u32 {
    use layout::*;

    let mut word = 0u32;
    if fault {
        word |= FAULT_BIT;
    }
    if alarm {
        word |= ALARM_BIT;
    }
    word |= (profile_index as u32 & PROFILE_MASK) << PROFILE_SHIFT;
    word |= (state as u32 & STATE_MASK) << STATE_SHIFT;
    word |= saturate_u8(fire_countdown) << FIRE_SHIFT;
    word |= saturate_u8(cooldown_countdown) << COOL_SHIFT;
    word |= aux as u32 & AUX_MASK;
    word
}

/// Structural inverse of [`encode`] for the fields the word carries.
pub fn decode(word: u32) -> StatusView {
    use layout::*;

    StatusView {
        fault: word & FAULT_BIT != 0,
        alarm: word & ALARM_BIT != 0,
        profile_index: ((word >> PROFILE_SHIFT) & PROFILE_MASK) as u8,
        state: FiringState::from_u8(((word >> STATE_SHIFT) & STATE_MASK) as u8),
        fire_countdown: ((word >> FIRE_SHIFT) & COUNTER_MASK) as u8,
        cooldown_countdown: ((word >> COOL_SHIFT) & COUNTER_MASK) as u8,
        aux: (word & AUX_MASK) as u8,
    }
}

#[inline]
fn saturate_u8(v: u32) -> u32 {
    if v > 0xFF { 0xFF } else { v }
}
