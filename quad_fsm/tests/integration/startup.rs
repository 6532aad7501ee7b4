//! Integration test: startup sequence.
//!
//! Validates: reference config parses → runner enters Passive → the
//! scripted schedule walks the FSM through every state.

use quad_common::fsm::error::FsmFault;
use quad_common::fsm::state::{ControlMode, FsmStateName};
use quad_common::robot::RunningMode;

use quad_fsm::config::load_config_from_str;
use quad_fsm::cycle::CycleRunner;
use quad_fsm::state::stand_up::InitialFootSource;

const REFERENCE_TOML: &str = include_str!("../../config/fsm.toml");

fn step_until(runner: &mut CycleRunner, tick: u64) {
    while runner.tick() < tick {
        runner.step();
    }
}

#[test]
fn reference_config_parses() {
    let cfg = load_config_from_str(REFERENCE_TOML).expect("reference config");
    assert_eq!(cfg.shared.service_name, "quad-fsm");
    assert_eq!(cfg.control.controller_dt, 0.002);
    assert_eq!(cfg.control.initial_mode, ControlMode::Passive);
    assert_eq!(cfg.schedule.len(), 5);
    assert_eq!(cfg.gains.real.fl.kp, [300.0, 450.0, 450.0]);
}

#[test]
fn runner_starts_passive() {
    let cfg = load_config_from_str(REFERENCE_TOML).unwrap();
    let runner = CycleRunner::new(cfg).unwrap();
    assert_eq!(runner.fsm().state(), FsmStateName::Passive);
    assert_eq!(runner.fsm().pending(), None);
    assert!(runner.fsm().faults().is_empty());
    assert_eq!(runner.tick(), 0);
}

#[test]
fn scripted_schedule_walks_all_states() {
    let cfg = load_config_from_str(REFERENCE_TOML).unwrap();
    let mut runner = CycleRunner::new(cfg).unwrap();

    step_until(&mut runner, 250);
    assert_eq!(runner.fsm().state(), FsmStateName::Passive);
    step_until(&mut runner, 251);
    assert_eq!(runner.fsm().state(), FsmStateName::StandUp);
    assert_eq!(
        runner.fsm().states().stand_up.initial_source(),
        InitialFootSource::Sensed
    );

    step_until(&mut runner, 1001);
    assert_eq!(runner.fsm().state(), FsmStateName::BalanceStand);
    // Stand-up finished before the hand-off; balance holds standing height.
    for cmd in &runner.context().legs.commands {
        assert!((cmd.p_des.z + 0.25).abs() < 1e-12);
    }

    step_until(&mut runner, 2001);
    assert_eq!(runner.fsm().state(), FsmStateName::Locomotion);

    step_until(&mut runner, 3049);
    assert_eq!(runner.fsm().state(), FsmStateName::Locomotion);
    assert_eq!(runner.fsm().pending(), Some(FsmStateName::BalanceStand));
    step_until(&mut runner, 3050);
    assert_eq!(runner.fsm().state(), FsmStateName::BalanceStand);

    step_until(&mut runner, 3501);
    assert_eq!(runner.fsm().state(), FsmStateName::Passive);
    assert_eq!(runner.fsm().stats().transitions, 5);
    assert_eq!(runner.fsm().fault_count(), 0);
    assert!(!runner.fsm().faults().has_critical());
}

#[test]
fn initial_mode_is_requested_at_first_tick() {
    let cfg = load_config_from_str("[control]\ninitial_mode = \"stand_up\"\n").unwrap();
    let mut runner = CycleRunner::new(cfg).unwrap();
    assert_eq!(runner.fsm().state(), FsmStateName::Passive);
    runner.step();
    assert_eq!(runner.fsm().state(), FsmStateName::StandUp);
}

#[test]
fn hardware_without_feedback_uses_fallback() {
    let cfg = load_config_from_str(
        "[control]\nrunning_mode = \"hardware\"\ninitial_mode = \"stand_up\"\n",
    )
    .unwrap();
    let mut runner = CycleRunner::new(cfg).unwrap();
    assert_eq!(runner.context().params.running_mode, RunningMode::Hardware);
    assert!(!runner.context().legs.data_valid);

    runner.step();
    assert_eq!(runner.fsm().state(), FsmStateName::StandUp);
    assert_eq!(
        runner.fsm().states().stand_up.initial_source(),
        InitialFootSource::Fallback
    );
    assert!(runner.fsm().faults().contains(FsmFault::FALLBACK_FOOT_POSITIONS));

    runner.step();
    let fr = &runner.context().legs.commands[0];
    assert_eq!(fr.kp_cartesian[(1, 1)], 500.0);
    assert_eq!(fr.kd_cartesian[(0, 0)], 10.0);
}

#[test]
fn hardware_balance_without_feedback_never_targets_hip() {
    let cfg = load_config_from_str("[control]\nrunning_mode = \"hardware\"\n").unwrap();
    let mut runner = CycleRunner::new(cfg).unwrap();
    runner.context_mut().params.control_mode = ControlMode::BalanceStand as u8;
    runner.step();
    runner.step();

    assert_eq!(runner.fsm().state(), FsmStateName::BalanceStand);
    assert!(runner.fsm().faults().contains(FsmFault::FALLBACK_FOOT_POSITIONS));
    for cmd in &runner.context().legs.commands {
        assert!(cmd.p_des.z < 0.0, "holding the hip origin: {:?}", cmd.p_des);
    }
}

#[test]
fn hardware_stand_up_hands_height_to_balance() {
    let cfg = load_config_from_str(
        "[control]\nrunning_mode = \"hardware\"\ninitial_mode = \"stand_up\"\n",
    )
    .unwrap();
    let mut runner = CycleRunner::new(cfg).unwrap();
    step_until(&mut runner, 400);
    assert_eq!(runner.fsm().state(), FsmStateName::StandUp);

    runner.context_mut().params.control_mode = ControlMode::BalanceStand as u8;
    runner.step();
    runner.step();
    assert_eq!(runner.fsm().state(), FsmStateName::BalanceStand);
    for cmd in &runner.context().legs.commands {
        assert!((cmd.p_des.z + 0.25).abs() < 1e-12, "got {}", cmd.p_des.z);
    }
}

#[test]
fn startup_rejects_invalid_config() {
    let result = load_config_from_str("[safety]\nmax_orientation = -1.0\n");
    let err_msg = format!("{}", result.err().unwrap());
    assert!(err_msg.contains("max_orientation"), "got: {err_msg}");
}
