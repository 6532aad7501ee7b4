//! FSM state and control-mode enums.
//!
//! `ControlMode` is what the operator requests; `FsmStateName` is what the
//! FSM is actually running. Both use `#[repr(u8)]` and share numeric codes
//! so a mode request maps onto the state of the same value.

use serde::{Deserialize, Serialize};

/// Externally requested operating mode.
///
/// Requests travel as a raw `u8` in [`ControlParameters`](super::config::ControlParameters)
/// so an unknown value can be represented and rejected by the active state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ControlMode {
    /// No torque on any joint.
    #[default]
    Passive = 0,
    /// Ramp the legs to standing height.
    StandUp = 1,
    /// Hold the body level on four feet.
    BalanceStand = 3,
    /// Walking / trotting.
    Locomotion = 4,
}

impl ControlMode {
    /// Convert from raw `u8`. Returns `None` for unsupported values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Passive),
            1 => Some(Self::StandUp),
            3 => Some(Self::BalanceStand),
            4 => Some(Self::Locomotion),
            _ => None,
        }
    }

    /// State that serves this mode.
    #[inline]
    pub const fn target_state(self) -> FsmStateName {
        match self {
            Self::Passive => FsmStateName::Passive,
            Self::StandUp => FsmStateName::StandUp,
            Self::BalanceStand => FsmStateName::BalanceStand,
            Self::Locomotion => FsmStateName::Locomotion,
        }
    }
}

/// Symbolic name of an FSM state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum FsmStateName {
    #[default]
    Passive = 0,
    StandUp = 1,
    BalanceStand = 3,
    Locomotion = 4,
}

impl FsmStateName {
    /// All states, in construction order.
    pub const ALL: [FsmStateName; 4] = [
        Self::Passive,
        Self::StandUp,
        Self::BalanceStand,
        Self::Locomotion,
    ];

    /// Human-readable label used in logs.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passive => "PASSIVE",
            Self::StandUp => "STAND_UP",
            Self::BalanceStand => "BALANCE_STAND",
            Self::Locomotion => "LOCOMOTION",
        }
    }
}

impl std::fmt::Display for FsmStateName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
