//! Passive state: no torque on any joint.

use quad_common::fsm::safety::SafetyChecks;
use quad_common::fsm::state::FsmStateName;

use super::{FsmState, StateCore, TransitionData, TransitionError};
use crate::context::ControlContext;

const TARGETS: [FsmStateName; 3] = [
    FsmStateName::StandUp,
    FsmStateName::BalanceStand,
    FsmStateName::Locomotion,
];

/// Limp legs. Entry state at startup and E-stop landing state.
#[derive(Debug, Clone)]
pub struct Passive {
    core: StateCore,
}

impl Passive {
    pub const fn new() -> Self {
        Self {
            core: StateCore::new(FsmStateName::Passive, SafetyChecks::NONE),
        }
    }
}

impl Default for Passive {
    fn default() -> Self {
        Self::new()
    }
}

impl FsmState for Passive {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn on_enter(&mut self, _ctx: &mut ControlContext) {
        self.core.reset();
    }

    fn run(&mut self, ctx: &mut ControlContext) {
        ctx.legs.zero_commands();
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
