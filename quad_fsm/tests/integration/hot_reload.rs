//! Integration tests for gain hot reload.
//!
//! - Reload accepted only while the FSM is settled in Passive.
//! - Atomic swap with rollback on failure.
//! - Reloaded gains reach the next StandUp entry.

use quad_common::fsm::state::{ControlMode, FsmStateName};

use quad_fsm::config::{LoadedConfig, ReloadResult};
use quad_fsm::cycle::CycleRunner;

fn gains_doc(kp: f64, kd: f64) -> String {
    let mut doc = String::new();
    for table in ["sim", "real"] {
        for leg in ["fr", "fl", "hr", "hl"] {
            doc.push_str(&format!(
                "[{table}.{leg}]\nkp = [{kp:.1}, {kp:.1}, {kp:.1}]\nkd = [{kd:.1}, {kd:.1}, {kd:.1}]\n"
            ));
        }
    }
    doc
}

fn runner() -> CycleRunner {
    CycleRunner::new(LoadedConfig::default()).unwrap()
}

#[test]
fn reload_in_passive_reaches_stand_up() {
    let mut runner = runner();
    runner.step();
    assert_eq!(runner.reload_gains(&gains_doc(250.0, 4.0)), ReloadResult::Success);

    runner.context_mut().params.control_mode = ControlMode::StandUp as u8;
    runner.step();
    runner.step();
    assert_eq!(runner.fsm().state(), FsmStateName::StandUp);
    for cmd in &runner.context().legs.commands {
        assert_eq!(cmd.kp_cartesian[(2, 2)], 250.0);
        assert_eq!(cmd.kd_cartesian[(0, 0)], 4.0);
    }
}

#[test]
fn reload_denied_while_standing() {
    let mut runner = runner();
    runner.context_mut().params.control_mode = ControlMode::StandUp as u8;
    runner.step();
    assert_eq!(runner.fsm().state(), FsmStateName::StandUp);

    let before = runner.context().gains;
    let result = runner.reload_gains(&gains_doc(250.0, 4.0));
    assert!(matches!(result, ReloadResult::Denied(ref r) if r.contains("STAND_UP")));
    assert_eq!(runner.context().gains, before);
    assert_eq!(runner.config().gains, before);
}

#[test]
fn rejected_shadow_rolls_back() {
    let mut runner = runner();
    let before = runner.context().gains;

    let result = runner.reload_gains(&gains_doc(-5.0, 4.0));
    assert!(matches!(result, ReloadResult::ValidationFailed(_)));
    assert_eq!(runner.context().gains, before);

    let result = runner.reload_gains("not = [valid");
    assert!(matches!(result, ReloadResult::ValidationFailed(ref r) if r.contains("ERR_RELOAD_VALIDATION_FAILED")));
    assert_eq!(runner.config().gains, before);
}
