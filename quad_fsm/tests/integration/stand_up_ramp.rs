//! Integration test: stand-up ramp.
//!
//! Drives the StandUp state the way the driver does (`run` then
//! `check_transition` each tick) and checks the reference trajectory plus
//! continuity, monotonic convergence and clamping over random inputs.

use nalgebra::Vector3;
use proptest::prelude::*;

use quad_common::leg::Leg;
use quad_fsm::context::ControlContext;
use quad_fsm::state::FsmState;
use quad_fsm::state::stand_up::{StandUp, blend_height, stand_up_progress};

const EPS: f64 = 1e-12;

fn context_with_feet(z0: f64) -> ControlContext {
    let mut ctx = ControlContext::default();
    for leg in Leg::ALL {
        let y = match leg {
            Leg::FrontRight | Leg::HindRight => -0.08,
            Leg::FrontLeft | Leg::HindLeft => 0.08,
        };
        ctx.legs.datas[leg.index()].p = Vector3::new(0.0, y, z0);
    }
    ctx.legs.data_valid = true;
    ctx
}

/// Commanded z of every leg for `ticks` consecutive ticks.
fn trajectory(ctx: &mut ControlContext, ticks: usize) -> Vec<[f64; 4]> {
    let mut state = StandUp::new();
    state.on_enter(ctx);
    let mut out = Vec::with_capacity(ticks);
    for _ in 0..ticks {
        state.run(ctx);
        out.push(std::array::from_fn(|i| ctx.legs.commands[i].p_des.z));
        state.check_transition(ctx);
    }
    out
}

#[test]
fn reference_trajectory() {
    let mut ctx = context_with_feet(-0.05);
    let z = trajectory(&mut ctx, 400);

    for leg in 0..4 {
        assert!((z[0][leg] + 0.05).abs() < EPS, "iter 0: {}", z[0][leg]);
        assert!((z[250][leg] + 0.2).abs() < EPS, "iter 250: {}", z[250][leg]);
        for (iter, row) in z.iter().enumerate().skip(334) {
            assert!((row[leg] + 0.25).abs() < EPS, "iter {iter}: {}", row[leg]);
        }
    }

    // x/y never move.
    for leg in Leg::ALL {
        let cmd = &ctx.legs.commands[leg.index()];
        assert_eq!(cmd.p_des.x, 0.0);
        assert_eq!(cmd.p_des.y.abs(), 0.08);
    }
}

#[test]
fn progress_before_full_extension() {
    // 333 ticks is just short of 1 / (1.5 * 0.002).
    assert!(stand_up_progress(333, 1.5, 0.002) < 1.0);
    assert_eq!(stand_up_progress(334, 1.5, 0.002), 1.0);
}

#[test]
fn re_entry_restarts_ramp() {
    let mut ctx = context_with_feet(-0.05);
    let mut state = StandUp::new();
    state.on_enter(&mut ctx);
    for _ in 0..200 {
        state.run(&mut ctx);
        state.check_transition(&ctx);
    }
    state.on_enter(&mut ctx);
    state.run(&mut ctx);
    assert_eq!(state.iter(), 0);
    assert!((ctx.legs.commands[0].p_des.z + 0.05).abs() < EPS);
}

proptest! {
    #[test]
    fn progress_stays_in_unit_interval(
        iter in 0u64..1_000_000,
        ramp_rate in 0.01f64..10.0,
        dt in 0.0001f64..0.02,
    ) {
        let p = stand_up_progress(iter, ramp_rate, dt);
        prop_assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn blend_stays_between_endpoints(
        progress in 0.0f64..=1.0,
        z0 in -0.4f64..0.0,
        h in 0.05f64..0.4,
    ) {
        let z = blend_height(progress, z0, h);
        let (lo, hi) = if z0 < -h { (z0, -h) } else { (-h, z0) };
        prop_assert!(z >= lo - EPS && z <= hi + EPS);
    }

    #[test]
    fn ramp_is_continuous_and_monotonic(
        z0 in -0.2f64..-0.01,
        h in 0.21f64..0.35,
    ) {
        let mut ctx = context_with_feet(z0);
        ctx.stand_up.target_height = h;
        let z = trajectory(&mut ctx, 400);

        let max_step = 1.5 * 0.002 * (h + z0).abs() + EPS;
        for pair in z.windows(2) {
            for leg in 0..4 {
                let step = pair[1][leg] - pair[0][leg];
                prop_assert!(step <= EPS, "height went up by {step}");
                prop_assert!(step.abs() <= max_step, "jump of {step}");
            }
        }
        for leg in 0..4 {
            prop_assert!((z[399][leg] + h).abs() < 1e-9);
        }
    }
}
