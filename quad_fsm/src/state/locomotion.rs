//! Locomotion state: hosts the gait controller.
//!
//! Leaving for BalanceStand is a multi-tick settle handshake lasting
//! `locomotion.settle_time`; every other exit finalizes at once.

use quad_common::fsm::error::FsmFault;
use quad_common::fsm::safety::SafetyChecks;
use quad_common::fsm::state::FsmStateName;
use tracing::debug;

use super::host::{BodyController, HoldPosture};
use super::{FsmState, StateCore, TransitionData, TransitionError};
use crate::context::ControlContext;

const TARGETS: [FsmStateName; 3] = [
    FsmStateName::Passive,
    FsmStateName::StandUp,
    FsmStateName::BalanceStand,
];

/// Ticks needed to settle for `settle_time` at period `dt` (at least one).
#[inline]
pub fn settle_ticks(settle_time: f64, dt: f64) -> u32 {
    // Tolerance keeps exact multiples (0.1 / 0.002) from rounding up.
    let ticks = (settle_time / dt - 1e-9).ceil();
    if ticks.is_finite() && ticks >= 1.0 {
        ticks.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

pub struct Locomotion {
    core: StateCore,
    controller: Box<dyn BodyController>,
}

impl Locomotion {
    pub fn new() -> Self {
        Self::with_controller(Box::new(HoldPosture::new()))
    }

    pub fn with_controller(controller: Box<dyn BodyController>) -> Self {
        Self {
            core: StateCore::new(FsmStateName::Locomotion, SafetyChecks::ORIENTATION_AND_FORCE),
            controller,
        }
    }
}

impl Default for Locomotion {
    fn default() -> Self {
        Self::new()
    }
}

impl FsmState for Locomotion {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn on_enter(&mut self, ctx: &mut ControlContext) {
        self.core.reset();
        self.controller.reset(ctx);
    }

    fn run(&mut self, ctx: &mut ControlContext) {
        self.controller.run(ctx);
    }

    fn entry_faults(&self) -> FsmFault {
        self.controller.entry_faults()
    }

    fn check_transition(&mut self, ctx: &ControlContext) -> FsmStateName {
        self.core.select_next(&ctx.params, &TARGETS)
    }

    fn transition(&mut self, ctx: &mut ControlContext) -> Result<TransitionData, TransitionError> {
        match self.core.next_state_name {
            FsmStateName::BalanceStand => {
                let needed = settle_ticks(ctx.locomotion.settle_time, ctx.params.controller_dt);
                let td = &mut self.core.transition_data;
                td.ticks = td.ticks.saturating_add(1);
                td.progress = (f64::from(td.ticks) / f64::from(needed)).min(1.0);
                if td.ticks >= needed {
                    debug!("[LOCOMOTION] Settled after {} ticks", td.ticks);
                    return Ok(self.core.finish());
                }
                Ok(self.core.transition_data)
            }
            FsmStateName::Passive | FsmStateName::StandUp => Ok(self.core.finish()),
            FsmStateName::Locomotion => Err(self.core.unresolved()),
        }
    }
}
