//! Prelude module for common re-exports.
//!
//! ```rust
//! use quad_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, ConfigSection, LogLevel, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{CONTROLLER_DT_DEFAULT, NUM_LEGS};

// ─── Robot & Legs ───────────────────────────────────────────────────
pub use crate::leg::{Leg, LegCommand, LegData};
pub use crate::robot::{Quadruped, RobotType, RunningMode};

// ─── FSM ────────────────────────────────────────────────────────────
pub use crate::fsm::config::{
    ControlConfig, ControlParameters, GainTable, LegGains, LocomotionConfig, ModeRequest,
    StandUpConfig, UserParameters,
};
pub use crate::fsm::error::FsmFault;
pub use crate::fsm::safety::{SafetyChecks, SafetyLimits};
pub use crate::fsm::state::{ControlMode, FsmStateName};
