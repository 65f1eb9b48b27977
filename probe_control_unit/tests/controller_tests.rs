//! End-to-end controller tests: full state machine walks through the
//! public API, the way a host register layer drives the unit.

use probe_common::config::ControllerConfig;
use probe_common::lut::PercentLut;
use probe_common::profile::{ProbeName, ProbeProfile, ProbeTable};
use probe_common::status::{self, AlarmFlags, FaultCode, FiringState, layout};
use probe_control_unit::controller::{FiringController, TickInputs};

fn needle() -> ProbeProfile {
    ProbeProfile {
        name: ProbeName::try_from("NEEDLE_A").unwrap(),
        trigger_voltage: 1.2,
        intensity_min: 0.1,
        intensity_max: 3.0,
        fire_duration_min: 50,
        fire_duration_max: 500,
        cooldown_min: 100,
        cooldown_max: 2000,
        safety_enabled: true,
        max_fire_rate: 0,
    }
}

fn controller_with(profile: ProbeProfile) -> FiringController {
    let mut table = ProbeTable::default();
    table.set(0, profile);
    FiringController::new(
        table,
        PercentLut::linear(0.0, 3.0),
        &ControllerConfig::default(),
    )
}

fn running_inputs() -> TickInputs {
    TickInputs {
        enable: true,
        start: true,
        arm: true,
        requested_fire_ticks: 100,
        requested_cooldown_ticks: 150,
        intensity_percent: 50,
        ..TickInputs::default()
    }
}

/// Step until the controller reports `Armed`.
fn arm(ctrl: &mut FiringController) {
    let inputs = running_inputs();
    for _ in 0..4 {
        ctrl.step(&inputs);
        if ctrl.state() == FiringState::Armed {
            return;
        }
    }
    panic!("controller failed to arm, stuck in {:?}", ctrl.state());
}

#[test]
fn short_fire_request_runs_for_profile_minimum() {
    // fire_duration_min=50: a 20-tick request clamps up to 50 with the
    // alarm bit raised.
    let mut ctrl = controller_with(needle());
    arm(&mut ctrl);

    let mut inputs = running_inputs();
    inputs.requested_fire_ticks = 20;
    inputs.trigger = true;
    let outputs = ctrl.step(&inputs);
    assert!(outputs.alarms.contains(AlarmFlags::FIRE_DURATION_CLAMPED));
    assert_eq!(ctrl.state(), FiringState::Firing);
    inputs.trigger = false;

    let mut firing_ticks = 0;
    while ctrl.state() == FiringState::Firing {
        let outputs = ctrl.step(&inputs);
        assert!(outputs.output_enabled);
        firing_ticks += 1;
        assert!(firing_ticks < 1000, "stuck in Firing");
    }
    assert_eq!(firing_ticks, 50);
}

#[test]
fn all_invalid_table_serves_safe_defaults() {
    let table = ProbeTable::default();
    assert!(!table.is_valid());
    for i in 0..table.capacity() {
        let p = table.get_safe(i);
        assert_eq!(p.trigger_voltage, 0.0);
        assert!(!p.is_valid());
    }
    // Out of range reads get the same safe default.
    assert_eq!(table.get_safe(99).trigger_voltage, 0.0);
}

#[test]
fn single_tick_trigger_fires_on_next_tick_and_not_before() {
    let mut ctrl = controller_with(needle());
    arm(&mut ctrl);

    let mut inputs = running_inputs();
    inputs.trigger = true;
    let outputs = ctrl.step(&inputs);
    // The tick that samples the edge still renders Armed.
    assert!(!outputs.output_enabled);
    assert_eq!(outputs.trigger_out, 0);
    let view = status::decode(outputs.status_word);
    assert_eq!(view.state, Some(FiringState::Armed));

    // Trigger released after exactly one tick; firing anyway.
    inputs.trigger = false;
    let outputs = ctrl.step(&inputs);
    assert!(outputs.output_enabled);
    assert!(outputs.trigger_out > 0);
    assert!(outputs.intensity_out > 0);
    let view = status::decode(outputs.status_word);
    assert_eq!(view.state, Some(FiringState::Firing));
}

#[test]
fn profile_turning_invalid_faults_with_outputs_forced_low() {
    let mut ctrl = controller_with(needle());
    arm(&mut ctrl);

    // Fire, then mid-burn point the selector at an unconfigured slot.
    let mut inputs = running_inputs();
    inputs.trigger = true;
    ctrl.step(&inputs);
    inputs.trigger = false;
    let outputs = ctrl.step(&inputs);
    assert!(outputs.output_enabled);

    inputs.profile_select = 1;
    let outputs = ctrl.step(&inputs);
    assert_eq!(ctrl.state(), FiringState::HardFault);
    assert_eq!(ctrl.fault_code(), FaultCode::ParamValidation);
    // The faulting tick itself must already show the fault bit and
    // dead outputs.
    assert_ne!(outputs.status_word & layout::FAULT_BIT, 0);
    assert!(!outputs.output_enabled);
    assert_eq!(outputs.trigger_out, 0);
    assert_eq!(outputs.intensity_out, 0);
}

#[test]
fn reset_recovers_from_hard_fault() {
    let mut ctrl = controller_with(needle());
    arm(&mut ctrl);

    let mut inputs = running_inputs();
    inputs.profile_select = 1; // unconfigured slot → structural fault
    ctrl.step(&inputs);
    assert_eq!(ctrl.state(), FiringState::HardFault);

    // HardFault is terminal without reset.
    inputs.profile_select = 0;
    ctrl.step(&inputs);
    assert_eq!(ctrl.state(), FiringState::HardFault);

    inputs.reset = true;
    let outputs = ctrl.step(&inputs);
    assert_eq!(ctrl.state(), FiringState::Reset);
    assert_eq!(ctrl.fault_code(), FaultCode::None);
    assert_eq!(ctrl.fire_countdown(), 0);
    assert_eq!(ctrl.cooldown_countdown(), 0);
    assert_eq!(outputs.status_word & layout::FAULT_BIT, 0);

    // And the machine walks out again once reset deasserts.
    inputs.reset = false;
    ctrl.step(&inputs);
    assert_eq!(ctrl.state(), FiringState::Ready);
}

#[test]
fn full_generation_cycle_with_status_countdowns() {
    let mut profile = needle();
    profile.fire_duration_min = 2;
    profile.cooldown_min = 2;
    let mut ctrl = controller_with(profile);
    arm(&mut ctrl);

    let mut inputs = running_inputs();
    inputs.requested_fire_ticks = 3;
    inputs.requested_cooldown_ticks = 4;
    inputs.trigger = true;
    ctrl.step(&inputs);
    inputs.trigger = false;

    // First firing tick reports the freshly loaded countdown.
    let outputs = ctrl.step(&inputs);
    let view = status::decode(outputs.status_word);
    assert_eq!(view.state, Some(FiringState::Firing));
    assert_eq!(view.fire_countdown, 3);

    // Burn through the rest of the shot and the cooldown.
    for _ in 0..2 {
        ctrl.step(&inputs);
    }
    assert_eq!(ctrl.state(), FiringState::Cooling);
    let outputs = ctrl.step(&inputs);
    let view = status::decode(outputs.status_word);
    assert_eq!(view.state, Some(FiringState::Cooling));
    assert_eq!(view.cooldown_countdown, 4);

    for _ in 0..3 {
        ctrl.step(&inputs);
    }
    // Table-driven generation: re-armed, ready for the next edge.
    assert_eq!(ctrl.state(), FiringState::Armed);
    inputs.trigger = true;
    ctrl.step(&inputs);
    assert_eq!(ctrl.state(), FiringState::Firing);
}

#[test]
fn status_word_echoes_profile_and_aux() {
    let mut ctrl = controller_with(needle());
    let mut inputs = running_inputs();
    inputs.aux_status = 0xA5;
    let outputs = ctrl.step(&inputs);

    let view = status::decode(outputs.status_word);
    assert_eq!(view.profile_index, 0);
    assert_eq!(view.aux, 0xA5);
    assert_eq!(view.state, Some(FiringState::Reset));
    assert_eq!(outputs.profile_echo, 0);
}

#[test]
fn alarm_bit_tracks_clamping() {
    let mut ctrl = controller_with(needle());
    let mut inputs = running_inputs();
    inputs.requested_fire_ticks = 1; // below fire_duration_min=50
    let outputs = ctrl.step(&inputs);
    assert_ne!(outputs.status_word & layout::ALARM_BIT, 0);
    assert!(outputs.alarms.contains(AlarmFlags::FIRE_DURATION_CLAMPED));

    // Alarms self-clear once the request is back in band.
    inputs.requested_fire_ticks = 100;
    let outputs = ctrl.step(&inputs);
    assert_eq!(outputs.status_word & layout::ALARM_BIT, 0);
    assert!(outputs.alarms.is_empty());
}

#[test]
fn bypassed_interlock_clamps_instead_of_faulting() {
    let mut profile = needle();
    profile.trigger_voltage = 9.0; // outside the analog range
    profile.safety_enabled = false;
    let mut ctrl = controller_with(profile);
    arm(&mut ctrl);

    let mut inputs = running_inputs();
    inputs.trigger = true;
    ctrl.step(&inputs);
    inputs.trigger = false;
    let outputs = ctrl.step(&inputs);

    // Still firing, with the trigger level clamped to full scale.
    assert!(outputs.output_enabled);
    assert_eq!(outputs.trigger_out, probe_common::consts::DIGITAL_MAX);
    assert!(outputs.alarms.contains(AlarmFlags::TRIGGER_CLAMPED));
    assert_eq!(ctrl.fault_code(), FaultCode::None);
}

#[test]
fn interlocked_unsafe_voltage_is_structural() {
    let mut unsafe_profile = needle();
    unsafe_profile.trigger_voltage = 9.0;
    let mut table = ProbeTable::default();
    table.set(0, needle());
    table.set(1, unsafe_profile);
    let mut ctrl = FiringController::new(
        table,
        PercentLut::linear(0.0, 3.0),
        &ControllerConfig::default(),
    );
    arm(&mut ctrl);

    let mut inputs = running_inputs();
    inputs.profile_select = 1;
    ctrl.step(&inputs);
    assert_eq!(ctrl.state(), FiringState::HardFault);
    assert_eq!(ctrl.fault_code(), FaultCode::VoltageOutOfRange);
}

#[test]
fn unsafe_profile_blocks_reset_exit_without_fault() {
    let mut profile = needle();
    profile.trigger_voltage = 9.0;
    let mut ctrl = controller_with(profile);
    for _ in 0..5 {
        ctrl.step(&running_inputs());
    }
    // Reset never escalates; it just refuses to leave.
    assert_eq!(ctrl.state(), FiringState::Reset);
    assert_eq!(ctrl.fault_code(), FaultCode::None);
}

#[test]
fn armed_state_times_out_without_trigger() {
    let mut table = ProbeTable::default();
    table.set(0, needle());
    let config = ControllerConfig {
        arming_timeout_ticks: 8,
        ..ControllerConfig::default()
    };
    let mut ctrl = FiringController::new(table, PercentLut::linear(0.0, 3.0), &config);

    let inputs = running_inputs();
    for _ in 0..3 {
        ctrl.step(&inputs);
    }
    assert_eq!(ctrl.state(), FiringState::Armed);
    for _ in 0..8 {
        ctrl.step(&inputs);
    }
    assert_eq!(ctrl.state(), FiringState::HardFault);
    assert_eq!(ctrl.fault_code(), FaultCode::TriggerTimeout);
}
