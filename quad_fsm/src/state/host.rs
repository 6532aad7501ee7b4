//! Seam for externally supplied body controllers.
//!
//! BalanceStand and Locomotion host a [`BodyController`] and delegate their
//! `run` to it. Balance and locomotion algorithms live outside this crate;
//! [`HoldPosture`] is the built-in stand-in.

use nalgebra::Vector3;
use quad_common::consts::NUM_LEGS;
use quad_common::fsm::error::FsmFault;
use quad_common::leg::Leg;
use tracing::{error, warn};

use crate::context::{ControlContext, InitialFootSource};

/// Controller driven by a host state while it is active.
pub trait BodyController: Send {
    /// Called from the host's `on_enter`.
    fn reset(&mut self, ctx: &ControlContext);

    /// Write this tick's leg commands.
    fn run(&mut self, ctx: &mut ControlContext);

    /// Faults raised by the last `reset`, latched by the driver on entry.
    fn entry_faults(&self) -> FsmFault {
        FsmFault::empty()
    }
}

/// Holds the feet where they were on entry using the active gain table.
///
/// Without sensing, a hand-off from a state that was still commanding the
/// legs keeps its setpoints; otherwise the stand-up fallback stance is used,
/// and with the fallback disabled the legs stay limp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldPosture {
    hold: [Vector3<f64>; NUM_LEGS],
    source: InitialFootSource,
}

impl HoldPosture {
    pub fn new() -> Self {
        Self {
            hold: [Vector3::zeros(); NUM_LEGS],
            source: InitialFootSource::default(),
        }
    }

    /// Foot positions being held.
    pub fn hold_positions(&self) -> &[Vector3<f64>; NUM_LEGS] {
        &self.hold
    }

    #[inline]
    pub fn source(&self) -> InitialFootSource {
        self.source
    }
}

impl Default for HoldPosture {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyController for HoldPosture {
    fn reset(&mut self, ctx: &ControlContext) {
        let (feet, source) = match (
            ctx.legs.sensed_foot_positions(),
            ctx.legs.commanded_foot_positions(),
        ) {
            (Some(feet), _) => (feet, InitialFootSource::Sensed),
            (None, Some(feet)) => (feet, InitialFootSource::Commanded),
            (None, None) => ctx.initial_foot_positions(),
        };
        match source {
            InitialFootSource::Commanded => {
                warn!("[HOLD_POSTURE] Leg data unavailable, holding previous setpoints")
            }
            InitialFootSource::Fallback => {
                warn!("[HOLD_POSTURE] Leg data unavailable, holding fallback foot positions")
            }
            InitialFootSource::Unavailable => {
                error!("[HOLD_POSTURE] Leg data unavailable and fallback disabled, legs stay limp")
            }
            InitialFootSource::Sensed => {}
        }
        self.hold = feet;
        self.source = source;
    }

    fn run(&mut self, ctx: &mut ControlContext) {
        if self.source == InitialFootSource::Unavailable {
            ctx.legs.zero_commands();
            return;
        }
        let gains = *ctx.active_gains();
        for leg in Leg::ALL {
            let g = gains.leg(leg);
            let cmd = &mut ctx.legs.commands[leg.index()];
            cmd.kp_cartesian = g.kp_matrix();
            cmd.kd_cartesian = g.kd_matrix();
            cmd.p_des = self.hold[leg.index()];
            cmd.v_des = Vector3::zeros();
        }
    }

    fn entry_faults(&self) -> FsmFault {
        self.source.fault()
    }
}
