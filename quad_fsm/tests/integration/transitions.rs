//! Integration test: two-phase transition protocol.
//!
//! Covers immediacy, the multi-tick Locomotion → BalanceStand settle,
//! cancellation and retargeting of a pending transition, unknown requests,
//! re-entry reset and the orientation E-stop.

use quad_common::fsm::error::FsmFault;
use quad_common::fsm::state::{ControlMode, FsmStateName};
use quad_common::leg::LegCommand;

use quad_fsm::context::ControlContext;
use quad_fsm::fsm::{ControlFsm, DriverMode};
use quad_fsm::state::locomotion::settle_ticks;

fn started() -> (ControlFsm, ControlContext) {
    let mut ctx = ControlContext::default();
    ctx.legs.data_valid = true;
    for (i, data) in ctx.legs.datas.iter_mut().enumerate() {
        data.p.y = if i % 2 == 0 { -0.08 } else { 0.08 };
        data.p.z = -0.25;
    }
    let mut fsm = ControlFsm::new();
    fsm.initialize(&mut ctx);
    (fsm, ctx)
}

fn goto(fsm: &mut ControlFsm, ctx: &mut ControlContext, mode: ControlMode) {
    fsm.request_mode(ctx, mode as u8);
    fsm.run_tick(ctx);
    assert_eq!(fsm.state(), mode.target_state());
}

#[test]
fn immediate_transitions_take_one_tick() {
    let (mut fsm, mut ctx) = started();
    goto(&mut fsm, &mut ctx, ControlMode::StandUp);
    goto(&mut fsm, &mut ctx, ControlMode::BalanceStand);
    goto(&mut fsm, &mut ctx, ControlMode::Locomotion);
    goto(&mut fsm, &mut ctx, ControlMode::Passive);
    assert_eq!(fsm.stats().transitions, 4);
    assert_eq!(fsm.mode(), DriverMode::Stable);
}

#[test]
fn locomotion_settles_into_balance_stand() {
    let (mut fsm, mut ctx) = started();
    goto(&mut fsm, &mut ctx, ControlMode::Locomotion);

    let needed = settle_ticks(ctx.locomotion.settle_time, ctx.params.controller_dt);
    assert_eq!(needed, 50);

    fsm.request_mode(&mut ctx, ControlMode::BalanceStand as u8);
    let mut ticks = 0;
    let mut last_progress = 0.0;
    while fsm.state() == FsmStateName::Locomotion {
        fsm.run_tick(&mut ctx);
        ticks += 1;
        if fsm.state() == FsmStateName::Locomotion {
            let td = fsm.transition_data();
            assert!(!td.done);
            assert!(td.progress > last_progress);
            last_progress = td.progress;
        }
        assert!(ticks <= 100, "settle never finished");
    }
    assert_eq!(ticks, needed);
    assert_eq!(fsm.state(), FsmStateName::BalanceStand);
}

#[test]
fn reverting_request_cancels_pending_transition() {
    let (mut fsm, mut ctx) = started();
    goto(&mut fsm, &mut ctx, ControlMode::Locomotion);

    fsm.request_mode(&mut ctx, ControlMode::BalanceStand as u8);
    for _ in 0..10 {
        fsm.run_tick(&mut ctx);
    }
    assert_eq!(fsm.pending(), Some(FsmStateName::BalanceStand));
    assert_eq!(fsm.transition_data().ticks, 10);

    fsm.request_mode(&mut ctx, ControlMode::Locomotion as u8);
    fsm.run_tick(&mut ctx);
    assert_eq!(fsm.state(), FsmStateName::Locomotion);
    assert_eq!(fsm.pending(), None);
    assert_eq!(fsm.stats().cancelled, 1);
    assert_eq!(fsm.transition_data().ticks, 0);

    // A fresh request restarts the settle from zero.
    fsm.request_mode(&mut ctx, ControlMode::BalanceStand as u8);
    fsm.run_tick(&mut ctx);
    assert_eq!(fsm.transition_data().ticks, 1);
}

#[test]
fn changed_request_retargets_pending_transition() {
    let (mut fsm, mut ctx) = started();
    goto(&mut fsm, &mut ctx, ControlMode::Locomotion);

    fsm.request_mode(&mut ctx, ControlMode::BalanceStand as u8);
    fsm.run_tick(&mut ctx);
    fsm.run_tick(&mut ctx);
    assert_eq!(fsm.pending(), Some(FsmStateName::BalanceStand));

    fsm.request_mode(&mut ctx, ControlMode::Passive as u8);
    fsm.run_tick(&mut ctx);
    assert_eq!(fsm.state(), FsmStateName::Passive);
    assert_eq!(fsm.stats().retargeted, 1);
    assert_eq!(fsm.stats().transitions, 2);
}

#[test]
fn unknown_request_keeps_state_and_record() {
    let (mut fsm, mut ctx) = started();
    goto(&mut fsm, &mut ctx, ControlMode::StandUp);
    let before = fsm.transition_data();

    fsm.request_mode(&mut ctx, 2);
    for _ in 0..5 {
        fsm.run_tick(&mut ctx);
    }
    assert_eq!(fsm.state(), FsmStateName::StandUp);
    assert_eq!(fsm.pending(), None);
    assert_eq!(fsm.transition_data(), before);
    assert!(fsm.faults().contains(FsmFault::BAD_MODE_REQUEST));
    assert_eq!(fsm.fault_count(), 0);
}

#[test]
fn stand_up_re_entry_resets_counter() {
    let (mut fsm, mut ctx) = started();
    goto(&mut fsm, &mut ctx, ControlMode::StandUp);
    fsm.request_mode(&mut ctx, ControlMode::StandUp as u8);
    for _ in 0..100 {
        fsm.run_tick(&mut ctx);
    }
    assert_eq!(fsm.states().stand_up.iter(), 100);

    goto(&mut fsm, &mut ctx, ControlMode::Passive);
    goto(&mut fsm, &mut ctx, ControlMode::StandUp);
    assert_eq!(fsm.states().stand_up.iter(), 0);
}

#[test]
fn unsafe_orientation_estops_from_locomotion() {
    let (mut fsm, mut ctx) = started();
    goto(&mut fsm, &mut ctx, ControlMode::Locomotion);
    fsm.request_mode(&mut ctx, ControlMode::BalanceStand as u8);
    fsm.run_tick(&mut ctx);
    assert!(fsm.pending().is_some());

    ctx.estimate.rpy.y = -0.7;
    fsm.run_tick(&mut ctx);
    assert_eq!(fsm.state(), FsmStateName::Passive);
    assert!(fsm.is_estopped());
    assert_eq!(fsm.pending(), None);
    assert!(ctx.legs.commands.iter().all(LegCommand::is_limp));
    assert!(fsm.faults().has_critical());

    ctx.estimate.rpy.y = 0.0;
    fsm.request_mode(&mut ctx, ControlMode::Passive as u8);
    fsm.run_tick(&mut ctx);
    assert!(!fsm.is_estopped());
    goto(&mut fsm, &mut ctx, ControlMode::StandUp);
}

#[test]
fn stand_up_ignores_orientation() {
    let (mut fsm, mut ctx) = started();
    goto(&mut fsm, &mut ctx, ControlMode::StandUp);
    ctx.estimate.rpy.x = 1.2;
    fsm.run_tick(&mut ctx);
    assert_eq!(fsm.state(), FsmStateName::StandUp);
    assert!(!fsm.is_estopped());
}
