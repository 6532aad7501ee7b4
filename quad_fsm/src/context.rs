//! Shared control context handed to every state hook.
//!
//! One aggregate, passed by reference on each call and never stored by a
//! state. States read the robot model and configuration and write leg
//! commands; the driver and cycle runner own everything else.

use nalgebra::Vector3;
use quad_common::consts::NUM_LEGS;
use quad_common::fsm::config::{
    ControlParameters, GainTable, LocomotionConfig, StandUpConfig, UserParameters,
};
use quad_common::fsm::error::FsmFault;
use quad_common::fsm::safety::SafetyLimits;
use quad_common::leg::{Leg, LegCommand, LegData};
use quad_common::robot::Quadruped;

use crate::config::LoadedConfig;

/// Command and sensed-data slots for all four legs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegController {
    /// Commands written by the active state each tick.
    pub commands: [LegCommand; NUM_LEGS],
    /// Sensed leg state.
    pub datas: [LegData; NUM_LEGS],
    /// False when no sensing source has delivered data.
    pub data_valid: bool,
}

impl LegController {
    pub fn new() -> Self {
        Self {
            commands: [LegCommand::default(); NUM_LEGS],
            datas: [LegData::default(); NUM_LEGS],
            data_valid: false,
        }
    }

    /// Zero every leg command (limp legs).
    pub fn zero_commands(&mut self) {
        for cmd in self.commands.iter_mut() {
            cmd.zero();
        }
    }

    /// Sensed foot positions, or `None` if sensing is unavailable or corrupt.
    pub fn sensed_foot_positions(&self) -> Option<[Vector3<f64>; NUM_LEGS]> {
        if !self.data_valid || !self.datas.iter().all(LegData::is_finite) {
            return None;
        }
        Some(std::array::from_fn(|i| self.datas[i].p))
    }

    /// Setpoints of the previous state, or `None` if any leg is limp.
    pub fn commanded_foot_positions(&self) -> Option<[Vector3<f64>; NUM_LEGS]> {
        let active = self
            .commands
            .iter()
            .all(|cmd| !cmd.is_limp() && cmd.p_des.iter().all(|c| c.is_finite()));
        active.then(|| std::array::from_fn(|i| self.commands[i].p_des))
    }
}

/// Where a state's starting foot positions came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitialFootSource {
    /// Captured from sensed leg data on entry.
    Sensed,
    /// Setpoints the previous state was holding; sensing was unavailable.
    Commanded,
    /// Configured fallback positions; sensing was unavailable.
    Fallback,
    /// No trustworthy geometry; legs are commanded limp.
    #[default]
    Unavailable,
}

impl InitialFootSource {
    /// Fault latched when a state is entered from this source.
    pub const fn fault(self) -> FsmFault {
        match self {
            Self::Sensed => FsmFault::empty(),
            Self::Commanded | Self::Fallback => FsmFault::FALLBACK_FOOT_POSITIONS,
            Self::Unavailable => FsmFault::SENSING_UNAVAILABLE,
        }
    }
}

impl Default for LegController {
    fn default() -> Self {
        Self::new()
    }
}

/// Body orientation estimate consumed by the orientation check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateEstimate {
    /// Roll, pitch, yaw [rad].
    pub rpy: Vector3<f64>,
}

impl Default for StateEstimate {
    fn default() -> Self {
        Self {
            rpy: Vector3::zeros(),
        }
    }
}

/// Everything a state may read or write during one hook call.
#[derive(Debug, Clone)]
pub struct ControlContext {
    /// Robot variant and physical parameters.
    pub quadruped: Quadruped,
    /// Leg command/data slots.
    pub legs: LegController,
    /// Live control parameters (mode request, dt, running mode).
    pub params: ControlParameters,
    /// Cartesian gain tables.
    pub gains: UserParameters,
    /// Stand-up ramp settings.
    pub stand_up: StandUpConfig,
    /// Locomotion host settings.
    pub locomotion: LocomotionConfig,
    /// Safety envelope.
    pub safety: SafetyLimits,
    /// Body orientation estimate.
    pub estimate: StateEstimate,
}

impl ControlContext {
    /// Context with default tables for the given robot and parameters.
    pub fn new(quadruped: Quadruped, params: ControlParameters) -> Self {
        Self {
            quadruped,
            legs: LegController::new(),
            params,
            gains: UserParameters::default(),
            stand_up: StandUpConfig::default(),
            locomotion: LocomotionConfig::default(),
            safety: SafetyLimits::default(),
            estimate: StateEstimate::default(),
        }
    }

    /// Build the context from a validated configuration.
    pub fn from_config(config: &LoadedConfig) -> Self {
        Self {
            quadruped: Quadruped::for_type(config.control.robot_type),
            legs: LegController::new(),
            params: config.control.to_parameters(),
            gains: config.gains,
            stand_up: config.stand_up,
            locomotion: config.locomotion,
            safety: config.safety,
            estimate: StateEstimate::default(),
        }
    }

    /// Starting foot positions: sensed, else the configured fallback stance
    /// if allowed, else unavailable (all zero).
    pub fn initial_foot_positions(&self) -> ([Vector3<f64>; NUM_LEGS], InitialFootSource) {
        if let Some(feet) = self.legs.sensed_foot_positions() {
            (feet, InitialFootSource::Sensed)
        } else if self.stand_up.allow_fallback {
            (
                Leg::ALL.map(|leg| self.stand_up.fallback(leg)),
                InitialFootSource::Fallback,
            )
        } else {
            ([Vector3::zeros(); NUM_LEGS], InitialFootSource::Unavailable)
        }
    }

    /// Gain table for the current running mode.
    #[inline]
    pub fn active_gains(&self) -> &GainTable {
        self.gains.table(self.params.running_mode)
    }
}

impl Default for ControlContext {
    fn default() -> Self {
        Self::new(Quadruped::default(), ControlParameters::default())
    }
}
