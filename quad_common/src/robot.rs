//! Robot model handle.
//!
//! Read-only description of the robot variant the controller is driving,
//! plus the running-mode selector (simulation vs physical hardware).

use serde::{Deserialize, Serialize};

/// Robot variant. Selects which control-law variant applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RobotType {
    /// Small electric quadruped, Cartesian leg control.
    #[default]
    MiniCheetah = 0,
    /// Large quadruped.
    Cheetah3 = 1,
}

/// Where the controller's commands end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RunningMode {
    /// Commands go to a physics simulator.
    #[default]
    Simulation = 0,
    /// Commands go to the physical actuators.
    Hardware = 1,
}

/// Physical parameters of the robot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadruped {
    /// Robot variant.
    pub robot_type: RobotType,
    /// Hip-to-foot length at full extension [m].
    pub max_leg_length: f64,
}

impl Quadruped {
    pub const fn mini_cheetah() -> Self {
        Self {
            robot_type: RobotType::MiniCheetah,
            max_leg_length: 0.409,
        }
    }

    pub const fn cheetah3() -> Self {
        Self {
            robot_type: RobotType::Cheetah3,
            max_leg_length: 0.744,
        }
    }

    /// Build the parameter set for a robot type.
    pub const fn for_type(robot_type: RobotType) -> Self {
        match robot_type {
            RobotType::MiniCheetah => Self::mini_cheetah(),
            RobotType::Cheetah3 => Self::cheetah3(),
        }
    }
}

impl Default for Quadruped {
    fn default() -> Self {
        Self::mini_cheetah()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadruped_for_type() {
        assert_eq!(
            Quadruped::for_type(RobotType::Cheetah3).robot_type,
            RobotType::Cheetah3
        );
        assert!(Quadruped::default().max_leg_length > 0.0);
    }
}
