//! Control FSM driver.
//!
//! Owns one instance of every state and runs the tick protocol:
//!
//! ```text
//! pre-check ─► run ─► post-check ─► check_transition ─► transition ─► swap
//! ```
//!
//! Driver modes:
//!
//! - `Stable`: the active state runs; a differing request begins a transition.
//! - `Pending { candidate }`: `transition()` is driven every tick until done.
//!   The request is re-arbitrated each tick, so a pending transition is
//!   cancelled or retargeted when the request changes.
//! - `EStop`: orientation pre-check failed; Passive runs until the request
//!   returns to Passive.

use quad_common::fsm::error::FsmFault;
use quad_common::fsm::state::{ControlMode, FsmStateName};
use tracing::{debug, error, info, warn};

use crate::context::ControlContext;
use crate::safety::{clamp_force_feed_forward, clamp_p_des_foot, orientation_is_safe};
use crate::state::balance_stand::BalanceStand;
use crate::state::host::BodyController;
use crate::state::locomotion::Locomotion;
use crate::state::passive::Passive;
use crate::state::stand_up::StandUp;
use crate::state::{FsmState, TransitionData, TransitionError};

// ─── State List ─────────────────────────────────────────────────────

/// One instance of every state, built once and reused across entries.
pub struct FsmStateList {
    pub passive: Passive,
    pub stand_up: StandUp,
    pub balance_stand: BalanceStand,
    pub locomotion: Locomotion,
}

impl FsmStateList {
    pub fn new() -> Self {
        Self {
            passive: Passive::new(),
            stand_up: StandUp::new(),
            balance_stand: BalanceStand::new(),
            locomotion: Locomotion::new(),
        }
    }

    /// State list with externally supplied body controllers.
    pub fn with_controllers(
        balance: Box<dyn BodyController>,
        locomotion: Box<dyn BodyController>,
    ) -> Self {
        Self {
            passive: Passive::new(),
            stand_up: StandUp::new(),
            balance_stand: BalanceStand::with_controller(balance),
            locomotion: Locomotion::with_controller(locomotion),
        }
    }

    pub fn get(&self, name: FsmStateName) -> &dyn FsmState {
        match name {
            FsmStateName::Passive => &self.passive,
            FsmStateName::StandUp => &self.stand_up,
            FsmStateName::BalanceStand => &self.balance_stand,
            FsmStateName::Locomotion => &self.locomotion,
        }
    }

    pub fn get_mut(&mut self, name: FsmStateName) -> &mut dyn FsmState {
        match name {
            FsmStateName::Passive => &mut self.passive,
            FsmStateName::StandUp => &mut self.stand_up,
            FsmStateName::BalanceStand => &mut self.balance_stand,
            FsmStateName::Locomotion => &mut self.locomotion,
        }
    }
}

impl Default for FsmStateList {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Driver ─────────────────────────────────────────────────────────

/// Driver-level mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverMode {
    #[default]
    Stable,
    Pending {
        candidate: FsmStateName,
    },
    EStop,
}

/// Counters exposed to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FsmStats {
    /// Ticks executed.
    pub ticks: u64,
    /// Completed state swaps.
    pub transitions: u64,
    /// Pending transitions cancelled by the request reverting.
    pub cancelled: u64,
    /// Pending transitions redirected to a new candidate.
    pub retargeted: u64,
    /// E-stops triggered by the orientation pre-check.
    pub estops: u64,
    /// Ticks on which foot positions were clamped.
    pub p_des_clamps: u64,
    /// Ticks on which feed-forward forces were clamped.
    pub force_clamps: u64,
}

pub struct ControlFsm {
    states: FsmStateList,
    current: FsmStateName,
    mode: DriverMode,
    faults: FsmFault,
    fault_count: u64,
    stats: FsmStats,
    initialized: bool,
    unresolved_reported: bool,
}

impl ControlFsm {
    pub fn new() -> Self {
        Self::with_states(FsmStateList::new())
    }

    pub fn with_states(states: FsmStateList) -> Self {
        Self {
            states,
            current: FsmStateName::Passive,
            mode: DriverMode::Stable,
            faults: FsmFault::empty(),
            fault_count: 0,
            stats: FsmStats::default(),
            initialized: false,
            unresolved_reported: false,
        }
    }

    /// Enter Passive. Called once before the first tick; `run_tick` does it
    /// lazily if needed.
    pub fn initialize(&mut self, ctx: &mut ControlContext) {
        self.current = FsmStateName::Passive;
        self.mode = DriverMode::Stable;
        self.unresolved_reported = false;
        self.states.get_mut(self.current).on_enter(ctx);
        self.initialized = true;
        info!("[CONTROL FSM] Initialized in {}", self.current);
    }

    /// Set the requested control mode (raw, unknown values allowed).
    pub fn request_mode(&self, ctx: &mut ControlContext, mode: u8) {
        if ctx.params.control_mode != mode {
            debug!(
                "[CONTROL FSM] Mode request {} -> {}",
                ctx.params.control_mode, mode
            );
            ctx.params.control_mode = mode;
        }
    }

    /// Execute one control tick.
    pub fn run_tick(&mut self, ctx: &mut ControlContext) {
        if !self.initialized {
            self.initialize(ctx);
        }

        if self.mode == DriverMode::EStop
            && ctx.params.requested_mode() == Some(ControlMode::Passive)
        {
            info!("[CONTROL FSM] E-stop released");
            self.mode = DriverMode::Stable;
        }

        // Pre-check
        if self.states.get(self.current).checks().safe_orientation
            && !orientation_is_safe(&ctx.estimate, ctx.safety.max_orientation)
        {
            self.trigger_estop(ctx);
        }

        self.states.get_mut(self.current).run(ctx);

        self.post_check(ctx);

        if self.mode == DriverMode::EStop {
            self.stats.ticks += 1;
            return;
        }

        if ctx.params.requested_mode().is_none() {
            self.faults.insert(FsmFault::BAD_MODE_REQUEST);
        }

        let desired = self.states.get_mut(self.current).check_transition(ctx);
        self.arbitrate(desired);

        if let DriverMode::Pending { candidate } = self.mode {
            let result = self.states.get_mut(self.current).transition(ctx);
            self.handle_transition_result(ctx, candidate, result);
        }

        self.stats.ticks += 1;
    }

    fn arbitrate(&mut self, desired: FsmStateName) {
        match self.mode {
            DriverMode::Stable if desired != self.current => {
                info!(
                    "[CONTROL FSM] Transition requested: {} -> {}",
                    self.current, desired
                );
                self.begin(desired);
            }
            DriverMode::Pending { candidate } if desired == self.current => {
                info!(
                    "[CONTROL FSM] Transition {} -> {} cancelled",
                    self.current, candidate
                );
                self.states
                    .get_mut(self.current)
                    .core_mut()
                    .transition_data
                    .zero();
                self.mode = DriverMode::Stable;
                self.stats.cancelled += 1;
            }
            DriverMode::Pending { candidate } if desired != candidate => {
                info!(
                    "[CONTROL FSM] Transition from {} retargeted: {} -> {}",
                    self.current, candidate, desired
                );
                self.begin(desired);
                self.stats.retargeted += 1;
            }
            _ => {}
        }
    }

    fn begin(&mut self, candidate: FsmStateName) {
        self.states
            .get_mut(self.current)
            .core_mut()
            .transition_data
            .zero();
        self.mode = DriverMode::Pending { candidate };
        self.unresolved_reported = false;
    }

    fn handle_transition_result(
        &mut self,
        ctx: &mut ControlContext,
        candidate: FsmStateName,
        result: Result<TransitionData, TransitionError>,
    ) {
        match result {
            Ok(td) if td.done => self.complete(ctx, candidate),
            Ok(_) => {}
            Err(e) => {
                self.faults.insert(FsmFault::TRANSITION_UNRESOLVED);
                if !self.unresolved_reported {
                    error!("[CONTROL FSM] {e}; transition stalled");
                    self.fault_count += 1;
                    self.unresolved_reported = true;
                }
            }
        }
    }

    fn complete(&mut self, ctx: &mut ControlContext, candidate: FsmStateName) {
        let previous = self.current;
        self.states.get_mut(previous).on_exit(ctx);
        self.current = candidate;
        let next = self.states.get_mut(candidate);
        next.on_enter(ctx);
        self.faults |= next.entry_faults();
        self.mode = DriverMode::Stable;
        self.stats.transitions += 1;
        info!(
            "[CONTROL FSM] Transition from {} to {} finalized",
            previous, candidate
        );
    }

    fn trigger_estop(&mut self, ctx: &mut ControlContext) {
        error!(
            "[CONTROL FSM] Unsafe orientation in {} (roll={:.3}, pitch={:.3}), E-stop to PASSIVE",
            self.current, ctx.estimate.rpy.x, ctx.estimate.rpy.y
        );
        if let DriverMode::Pending { candidate } = self.mode {
            warn!("[CONTROL FSM] Pending transition to {candidate} abandoned");
        }
        self.states.get_mut(self.current).on_exit(ctx);
        self.current = FsmStateName::Passive;
        self.states.get_mut(self.current).on_enter(ctx);
        self.mode = DriverMode::EStop;
        self.faults.insert(FsmFault::ORIENTATION_UNSAFE);
        self.stats.estops += 1;
    }

    fn post_check(&mut self, ctx: &mut ControlContext) {
        let checks = self.states.get(self.current).checks();
        if !checks.any_post() {
            return;
        }
        if checks.p_des_foot {
            let bound = ctx.safety.max_p_des(ctx.quadruped.max_leg_length);
            if clamp_p_des_foot(&mut ctx.legs.commands, bound) {
                if !self.faults.contains(FsmFault::P_DES_CLAMPED) {
                    warn!("[CONTROL FSM] Desired foot position clamped to ±{bound:.3} m");
                }
                self.faults.insert(FsmFault::P_DES_CLAMPED);
                self.stats.p_des_clamps += 1;
            }
        }
        if checks.force_feed_forward
            && clamp_force_feed_forward(
                &mut ctx.legs.commands,
                ctx.safety.max_lateral_force,
                ctx.safety.max_vertical_force,
            )
        {
            if !self.faults.contains(FsmFault::FORCE_FF_CLAMPED) {
                warn!("[CONTROL FSM] Feed-forward force clamped");
            }
            self.faults.insert(FsmFault::FORCE_FF_CLAMPED);
            self.stats.force_clamps += 1;
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    /// Active state.
    #[inline]
    pub fn state(&self) -> FsmStateName {
        self.current
    }

    #[inline]
    pub fn mode(&self) -> DriverMode {
        self.mode
    }

    /// Candidate of the in-flight transition, if any.
    #[inline]
    pub fn pending(&self) -> Option<FsmStateName> {
        match self.mode {
            DriverMode::Pending { candidate } => Some(candidate),
            _ => None,
        }
    }

    #[inline]
    pub fn is_estopped(&self) -> bool {
        self.mode == DriverMode::EStop
    }

    /// Transition record of the active state.
    #[inline]
    pub fn transition_data(&self) -> TransitionData {
        self.states.get(self.current).core().transition_data
    }

    #[inline]
    pub fn faults(&self) -> FsmFault {
        self.faults
    }

    /// Number of transition-finalization defects seen.
    #[inline]
    pub fn fault_count(&self) -> u64 {
        self.fault_count
    }

    #[inline]
    pub fn stats(&self) -> &FsmStats {
        &self.stats
    }

    #[inline]
    pub fn states(&self) -> &FsmStateList {
        &self.states
    }

    /// Clear latched fault flags. The defect counter is kept.
    pub fn clear_faults(&mut self) {
        self.faults = FsmFault::empty();
    }
}

impl Default for ControlFsm {
    fn default() -> Self {
        Self::new()
    }
}
