//! FSM state contract and the concrete states.
//!
//! Every state implements [`FsmState`]: `on_enter`, `run`,
//! `check_transition`, `transition`, `on_exit`, plus declarative
//! [`SafetyChecks`] read by the driver. States are built once at startup
//! and reused across entries; per-entry reset happens in `on_enter`.

pub mod balance_stand;
pub mod host;
pub mod locomotion;
pub mod passive;
pub mod stand_up;

use quad_common::fsm::config::ControlParameters;
use quad_common::fsm::error::FsmFault;
use quad_common::fsm::safety::SafetyChecks;
use quad_common::fsm::state::FsmStateName;
use thiserror::Error;
use tracing::warn;

use crate::context::ControlContext;

// ─── Transition Record ──────────────────────────────────────────────

/// Outcome of an in-progress state change.
///
/// `done` is false exactly while a transition is in flight. Zeroed by the
/// driver when a transition is requested.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransitionData {
    /// Transition finished; the driver may swap states.
    pub done: bool,
    /// Normalized handshake progress [0, 1].
    pub progress: f64,
    /// Ticks spent in this transition.
    pub ticks: u32,
}

impl TransitionData {
    pub const fn new() -> Self {
        Self {
            done: false,
            progress: 0.0,
            ticks: 0,
        }
    }

    #[inline]
    pub fn zero(&mut self) {
        *self = Self::new();
    }
}

/// A pending transition that the active state cannot finalize.
///
/// Means `check_transition` proposed a target `transition` has no case for.
/// This is a contract violation, not a runtime condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("no finalization from {from} to {to}")]
    Unresolved {
        from: FsmStateName,
        to: FsmStateName,
    },
}

// ─── State Core ─────────────────────────────────────────────────────

/// Fields common to every state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateCore {
    /// Symbolic name.
    pub name: FsmStateName,
    /// Human-readable label.
    pub label: &'static str,
    /// Driver-side safety checks for this state.
    pub checks: SafetyChecks,
    /// State the driver should move toward.
    pub next_state_name: FsmStateName,
    /// Record of the current transition attempt.
    pub transition_data: TransitionData,
    /// Last unsupported raw mode reported, to log each bad request once.
    bad_request: Option<u8>,
}

impl StateCore {
    pub const fn new(name: FsmStateName, checks: SafetyChecks) -> Self {
        Self {
            name,
            label: name.label(),
            checks,
            next_state_name: name,
            transition_data: TransitionData::new(),
            bad_request: None,
        }
    }

    /// Entry reset: stay in this state, clear the transition record.
    pub fn reset(&mut self) {
        self.next_state_name = self.name;
        self.transition_data.zero();
        self.bad_request = None;
    }

    /// Map the requested control mode onto the next state.
    ///
    /// A request for this state or one of `targets` updates `next_state_name`.
    /// Anything else leaves it untouched and is reported once per raw value.
    pub fn select_next(
        &mut self,
        params: &ControlParameters,
        targets: &[FsmStateName],
    ) -> FsmStateName {
        match params.requested_mode().map(|m| m.target_state()) {
            Some(target) if target == self.name || targets.contains(&target) => {
                self.next_state_name = target;
                self.bad_request = None;
            }
            _ => {
                if self.bad_request != Some(params.control_mode) {
                    warn!(
                        "[CONTROL FSM] Bad request: cannot transition from {} to mode {}",
                        self.label, params.control_mode
                    );
                    self.bad_request = Some(params.control_mode);
                }
            }
        }
        self.next_state_name
    }

    /// Mark the transition complete and return the record.
    #[inline]
    pub fn finish(&mut self) -> TransitionData {
        self.transition_data.done = true;
        self.transition_data.progress = 1.0;
        self.transition_data
    }

    /// Error for a target with no finalization case.
    #[inline]
    pub fn unresolved(&self) -> TransitionError {
        TransitionError::Unresolved {
            from: self.name,
            to: self.next_state_name,
        }
    }
}

// ─── State Contract ─────────────────────────────────────────────────

/// Four-hook contract implemented by every FSM state.
///
/// All hooks run inside one control tick: they must not block and must
/// not allocate.
pub trait FsmState {
    fn core(&self) -> &StateCore;

    fn core_mut(&mut self) -> &mut StateCore;

    /// Reset `next_state_name`, the transition record and local counters,
    /// and re-capture initial conditions. Idempotent across re-entries.
    fn on_enter(&mut self, ctx: &mut ControlContext);

    /// Compute and write this tick's leg commands.
    fn run(&mut self, ctx: &mut ControlContext);

    /// Decide which state the driver should move toward.
    fn check_transition(&mut self, ctx: &ControlContext) -> FsmStateName;

    /// Advance the handshake toward `next_state_name`.
    fn transition(&mut self, ctx: &mut ControlContext) -> Result<TransitionData, TransitionError>;

    /// Release state-local resources.
    fn on_exit(&mut self, _ctx: &mut ControlContext) {}

    /// Faults latched while entering this state.
    fn entry_faults(&self) -> FsmFault {
        FsmFault::empty()
    }

    #[inline]
    fn name(&self) -> FsmStateName {
        self.core().name
    }

    #[inline]
    fn checks(&self) -> SafetyChecks {
        self.core().checks
    }
}
