//! BalanceStand state: hosts the standing body controller.

use quad_common::fsm::error::FsmFault;
use quad_common::fsm::safety::SafetyChecks;
use quad_common::fsm::state::FsmStateName;

use super::host::{BodyController, HoldPosture};
use super::{FsmState, StateCore, TransitionData, TransitionError};
use crate::context::ControlContext;

const TARGETS: [FsmStateName; 3] = [
    FsmStateName::Passive,
    FsmStateName::StandUp,
    FsmStateName::Locomotion,
];

pub struct BalanceStand {
    core: StateCore,
    controller: Box<dyn BodyController>,
}

impl BalanceStand {
    pub fn new() -> Self {
        Self::with_controller(Box::new(HoldPosture::new()))
    }

    pub fn with_controller(controller: Box<dyn BodyController>) -> Self {
        Self {
            core: StateCore::new(FsmStateName::BalanceStand, SafetyChecks::ORIENTATION_AND_FORCE),
            controller,
        }
    }
}

impl Default for BalanceStand {
    fn default() -> Self {
        Self::new()
    }
}

impl FsmState for BalanceStand {
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

    fn transition(&mut self, _ctx: &mut ControlContext) -> Result<TransitionData, TransitionError> {
        if TARGETS.contains(&self.core.next_state_name) {
            Ok(self.core.finish())
        } else {
            Err(self.core.unresolved())
        }
    }
}
