//! The probe firing state machine.
//!
//! One [`FiringController::step`] call per clock tick: sample inputs,
//! validate and clamp against the selected profile, render the output
//! registers from the current state, then advance the state machine.
//! Normal transitions become observable on the following tick;
//! structural faults take effect immediately so an invalid profile can
//! never drive the output port, even transiently.
//!
//! No error is ever returned to a caller. The only failure channel is
//! the fault bit plus fault code in the status word; once in
//! `HardFault` the sole recovery path is the external reset input.

use probe_common::codec;
use probe_common::config::ControllerConfig;
use probe_common::lut::PercentLut;
use probe_common::profile::{ProbeProfile, ProbeTable};
use probe_common::status::{self, AlarmFlags, FaultCode, FiringState};
use tracing::warn;

use crate::validate::{ValidatedParams, clamp_intensity, validate_tick};

/// Control and configuration inputs sampled once per tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInputs {
    /// Master enable; gates the exit from `Reset`.
    pub enable: bool,
    /// Arm request; level-sensitive.
    pub arm: bool,
    /// Start request; moves `Ready` → `Idle`.
    pub start: bool,
    /// Fire trigger; edge-sensitive (rising edge across ticks).
    pub trigger: bool,
    /// External reset; overrides everything when asserted.
    pub reset: bool,
    /// Selected probe table slot.
    pub profile_select: u8,
    /// Requested fire duration [ticks]; clamped to the profile band.
    pub requested_fire_ticks: u32,
    /// Requested cooldown [ticks]; clamped to the profile band.
    pub requested_cooldown_ticks: u32,
    /// Requested intensity, 0–100%.
    pub intensity_percent: u8,
    /// Auxiliary status bits passed through into the status word.
    pub aux_status: u8,
}

/// Output registers produced once per tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickOutputs {
    /// Trigger voltage output [DAC code]; zero outside `Firing`.
    pub trigger_out: u16,
    /// Intensity voltage output [DAC code]; zero outside `Firing`.
    pub intensity_out: u16,
    /// Output stage gate; true only in `Firing`.
    pub output_enabled: bool,
    /// Echo of the selected profile slot.
    pub profile_echo: u8,
    /// Packed 32-bit status word.
    pub status_word: u32,
    /// 8-bit alarm register.
    pub alarms: AlarmFlags,
    /// 8-bit fault code (not carried in the status word).
    pub fault_code: FaultCode,
}

/// The firing controller.
///
/// Owns the runtime state exclusively; the profile table and LUT are
/// immutable configuration. Single-threaded by design — if embedded in
/// a multi-threaded program the step call must be externally
/// serialized.
#[derive(Debug, Clone)]
pub struct FiringController {
    table: ProbeTable,
    lut: PercentLut,
    arming_timeout_ticks: u32,

    state: FiringState,
    fire_countdown: u32,
    cooldown_countdown: u32,
    arming_ticks: u32,
    /// Ticks since the last shot started; saturating.
    ticks_since_fire: u32,
    prev_trigger: bool,
    params_valid: bool,
    alarms: AlarmFlags,
    fault: FaultCode,
    /// Snapshot of the selected profile from the latest tick.
    active_profile: ProbeProfile,
}

impl FiringController {
    pub fn new(table: ProbeTable, lut: PercentLut, config: &ControllerConfig) -> Self {
        Self {
            table,
            lut,
            arming_timeout_ticks: config.arming_timeout_ticks,
            state: FiringState::Reset,
            fire_countdown: 0,
            cooldown_countdown: 0,
            arming_ticks: 0,
            ticks_since_fire: u32::MAX,
            prev_trigger: false,
            params_valid: false,
            alarms: AlarmFlags::empty(),
            fault: FaultCode::None,
            active_profile: ProbeProfile::safe_default(),
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> FiringState {
        self.state
    }

    /// Latest fault code. This is the accessor for the field the
    /// status word does not carry.
    #[inline]
    pub const fn fault_code(&self) -> FaultCode {
        self.fault
    }

    /// Whether the latest tick's parameters validated cleanly.
    #[inline]
    pub const fn params_valid(&self) -> bool {
        self.params_valid
    }

    /// Remaining fire countdown [ticks].
    #[inline]
    pub const fn fire_countdown(&self) -> u32 {
        self.fire_countdown
    }

    /// Remaining cooldown countdown [ticks].
    #[inline]
    pub const fn cooldown_countdown(&self) -> u32 {
        self.cooldown_countdown
    }

    /// Apply a raw state code from a host register write.
    ///
    /// Codes outside the closed set force `HardFault` with the
    /// `UnknownState` code (defensive default arm).
    pub fn apply_state_code(&mut self, code: u8) {
        match FiringState::from_u8(code) {
            Some(state) => self.state = state,
            None => self.enter_hard_fault(FaultCode::UnknownState),
        }
    }

    /// Execute one clock tick.
    pub fn step(&mut self, inputs: &TickInputs) -> TickOutputs {
        // Reset is sampled first and unconditionally overrides the
        // computed next state.
        if inputs.reset {
            self.reinit();
            self.prev_trigger = inputs.trigger;
            return self.render(inputs, 0);
        }

        let v = validate_tick(&self.table, inputs);
        let rising = inputs.trigger && !self.prev_trigger;
        self.prev_trigger = inputs.trigger;
        self.ticks_since_fire = self.ticks_since_fire.saturating_add(1);
        self.alarms = v.alarms;
        self.params_valid = v.fault.is_none();
        self.active_profile = v.profile.clone();

        // Structural invalidity faults immediately from any operating
        // state. In Reset it only blocks the exit to Ready.
        if let Some(code) = v.fault {
            if !matches!(self.state, FiringState::Reset | FiringState::HardFault) {
                self.enter_hard_fault(code);
            }
        }

        // Refire spacing below the profile's rate limit swallows the
        // trigger; advisory only.
        let rate_blocked = rising
            && self.state == FiringState::Armed
            && v.profile.max_fire_rate > 0
            && self.ticks_since_fire < v.profile.max_fire_rate;
        if rate_blocked {
            self.alarms.insert(AlarmFlags::RATE_LIMITED);
        }

        let outputs = self.render(inputs, v.lut_index);
        self.advance(inputs, &v, rising, rate_blocked);
        outputs
    }

    /// Build this tick's output registers from the current state.
    fn render(&mut self, inputs: &TickInputs, lut_index: usize) -> TickOutputs {
        let firing = self.state.output_allowed();
        let (trigger_out, intensity_out) = if firing {
            // Both clamps are unconditional: encode clamps the trigger
            // level to the analog range, and the LUT value is clamped
            // to the profile's encoded intensity band.
            let trigger = codec::encode(self.active_profile.trigger_voltage);
            let raw = self.lut.lookup_safe(lut_index);
            let intensity = clamp_intensity(raw, &self.active_profile, &mut self.alarms);
            (trigger, intensity)
        } else {
            (0, 0)
        };

        let fault = self.state == FiringState::HardFault;
        let status_word = status::encode(
            self.state,
            fault,
            !self.alarms.is_empty(),
            inputs.profile_select,
            self.fire_countdown,
            self.cooldown_countdown,
            inputs.aux_status,
        );

        TickOutputs {
            trigger_out,
            intensity_out,
            output_enabled: firing,
            profile_echo: inputs.profile_select,
            status_word,
            alarms: self.alarms,
            fault_code: self.fault,
        }
    }

    /// Compute the next state. Called after `render`, so normal
    /// transitions become observable on the following tick.
    fn advance(
        &mut self,
        inputs: &TickInputs,
        v: &ValidatedParams,
        rising: bool,
        rate_blocked: bool,
    ) {
        use FiringState::*;

        match self.state {
            Reset => {
                if inputs.enable && v.fault.is_none() {
                    self.state = Ready;
                }
            }
            Ready => {
                if inputs.start {
                    self.state = Idle;
                }
            }
            Idle => {
                if inputs.arm {
                    self.arming_ticks = 0;
                    self.state = Armed;
                }
            }
            Armed => {
                if !inputs.arm {
                    self.arming_ticks = 0;
                    self.state = Idle;
                } else if rising && !rate_blocked {
                    self.arming_ticks = 0;
                    // A degenerate zero-tick request still produces one
                    // tick of output; the countdown must be nonzero.
                    self.fire_countdown = v.fire_ticks.max(1);
                    self.ticks_since_fire = 0;
                    self.state = Firing;
                } else {
                    self.arming_ticks += 1;
                    if self.arming_ticks >= self.arming_timeout_ticks {
                        self.enter_hard_fault(FaultCode::TriggerTimeout);
                    }
                }
            }
            Firing => {
                if self.fire_countdown == 0 {
                    // The countdown is loaded nonzero on entry; zero
                    // here means it never terminated the transition.
                    self.enter_hard_fault(FaultCode::FiringTimeout);
                } else {
                    self.fire_countdown -= 1;
                    if self.fire_countdown == 0 {
                        self.cooldown_countdown = v.cooldown_ticks.max(1);
                        self.state = Cooling;
                    }
                }
            }
            Cooling => {
                if self.cooldown_countdown == 0 {
                    self.enter_hard_fault(FaultCode::CoolingTimeout);
                } else {
                    self.cooldown_countdown -= 1;
                    if self.cooldown_countdown == 0 {
                        // Table-driven generation: re-arm after cooldown.
                        self.arming_ticks = 0;
                        self.state = Armed;
                    }
                }
            }
            // Terminal; only the external reset input recovers.
            HardFault => {}
        }
    }

    fn enter_hard_fault(&mut self, code: FaultCode) {
        warn!(?code, from = ?self.state, "entering hard fault");
        self.state = FiringState::HardFault;
        if self.fault == FaultCode::None {
            self.fault = code;
        }
        self.fire_countdown = 0;
        self.cooldown_countdown = 0;
        self.arming_ticks = 0;
    }

    /// Reinitialize all runtime state (external reset).
    fn reinit(&mut self) {
        self.state = FiringState::Reset;
        self.fire_countdown = 0;
        self.cooldown_countdown = 0;
        self.arming_ticks = 0;
        self.ticks_since_fire = u32::MAX;
        self.params_valid = false;
        self.alarms = AlarmFlags::empty();
        self.fault = FaultCode::None;
        self.active_profile = ProbeProfile::safe_default();
    }
}
