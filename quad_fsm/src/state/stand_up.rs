//! StandUp state: ramp all four feet from their captured positions down to
//! standing height under Cartesian PD control.
//!
//! Per tick, with `p = clamp(ramp_rate * iter * dt, 0, 1)`:
//!
//! ```text
//! p_des.xy = initial.xy
//! p_des.z  = p * (-target_height) + (1 - p) * initial.z
//! ```
//!
//! Gains come from the table matching the running mode. The ramp only
//! applies to the Mini Cheetah; other robots get no setpoints from here.

use nalgebra::Vector3;
use quad_common::consts::NUM_LEGS;
use quad_common::fsm::error::FsmFault;
use quad_common::fsm::safety::SafetyChecks;
use quad_common::fsm::state::FsmStateName;
use quad_common::leg::Leg;
use quad_common::robot::RobotType;
use tracing::{error, warn};

use super::{FsmState, StateCore, TransitionData, TransitionError};
use crate::context::ControlContext;

pub use crate::context::InitialFootSource;

const TARGETS: [FsmStateName; 3] = [
    FsmStateName::Passive,
    FsmStateName::BalanceStand,
    FsmStateName::Locomotion,
];

/// Ramp progress after `iter` ticks, clamped to [0, 1].
#[inline]
pub fn stand_up_progress(iter: u64, ramp_rate: f64, dt: f64) -> f64 {
    (ramp_rate * iter as f64 * dt).clamp(0.0, 1.0)
}

/// Height blend between the captured foot height and standing height.
#[inline]
pub fn blend_height(progress: f64, initial_z: f64, target_height: f64) -> f64 {
    progress * (-target_height) + (1.0 - progress) * initial_z
}

#[derive(Debug, Clone)]
pub struct StandUp {
    core: StateCore,
    initial_foot_positions: [Vector3<f64>; NUM_LEGS],
    initial_source: InitialFootSource,
    iter: u64,
}

impl StandUp {
    pub fn new() -> Self {
        Self {
            core: StateCore::new(FsmStateName::StandUp, SafetyChecks::NONE),
            initial_foot_positions: [Vector3::zeros(); NUM_LEGS],
            initial_source: InitialFootSource::default(),
            iter: 0,
        }
    }

    /// Ticks since entry.
    #[inline]
    pub fn iter(&self) -> u64 {
        self.iter
    }

    #[inline]
    pub fn initial_source(&self) -> InitialFootSource {
        self.initial_source
    }

    #[inline]
    pub fn initial_foot_positions(&self) -> &[Vector3<f64>; NUM_LEGS] {
        &self.initial_foot_positions
    }

    fn capture_initial(&mut self, ctx: &ControlContext) {
        let (feet, source) = ctx.initial_foot_positions();
        self.initial_foot_positions = feet;
        self.initial_source = source;
        match source {
            InitialFootSource::Fallback => {
                warn!("[STAND_UP] Leg data unavailable, ramping from fallback foot positions")
            }
            InitialFootSource::Unavailable => {
                error!("[STAND_UP] Leg data unavailable and fallback disabled, legs stay limp")
            }
            InitialFootSource::Sensed | InitialFootSource::Commanded => {}
        }
    }
}

impl Default for StandUp {
    fn default() -> Self {
        Self::new()
    }
}

impl FsmState for StandUp {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn on_enter(&mut self, ctx: &mut ControlContext) {
        self.core.reset();
        self.iter = 0;
        self.capture_initial(ctx);
    }

    fn run(&mut self, ctx: &mut ControlContext) {
        if ctx.quadruped.robot_type != RobotType::MiniCheetah {
            return;
        }
        if self.initial_source == InitialFootSource::Unavailable {
            ctx.legs.zero_commands();
            return;
        }

        let progress =
            stand_up_progress(self.iter, ctx.stand_up.ramp_rate, ctx.params.controller_dt);
        let target_height = ctx.stand_up.target_height;
        let gains = *ctx.active_gains();

        for leg in Leg::ALL {
            let i = leg.index();
            let g = gains.leg(leg);
            let initial = self.initial_foot_positions[i];
            let cmd = &mut ctx.legs.commands[i];
            cmd.kp_cartesian = g.kp_matrix();
            cmd.kd_cartesian = g.kd_matrix();
            cmd.p_des.x = initial.x;
            cmd.p_des.y = initial.y;
            cmd.p_des.z = blend_height(progress, initial.z, target_height);
        }
    }

    fn check_transition(&mut self, ctx: &ControlContext) -> FsmStateName {
        self.iter = self.iter.saturating_add(1);
        self.core.select_next(&ctx.params, &TARGETS)
    }

    fn transition(&mut self, _ctx: &mut ControlContext) -> Result<TransitionData, TransitionError> {
        if TARGETS.contains(&self.core.next_state_name) {
            Ok(self.core.finish())
        } else {
            Err(self.core.unresolved())
        }
    }

    fn entry_faults(&self) -> FsmFault {
        self.initial_source.fault()
    }
}
