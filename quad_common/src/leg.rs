//! Per-leg actuator command and sensed data.
//!
//! One `LegCommand` slot per leg is written every tick by the active FSM
//! state; one `LegData` slot per leg carries the sensed leg state.

use nalgebra::{Matrix3, Vector3};

use crate::consts::NUM_LEGS;

/// Leg index. Order matches the command/data arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Leg {
    /// Front right.
    FrontRight = 0,
    /// Front left.
    FrontLeft = 1,
    /// Hind right.
    HindRight = 2,
    /// Hind left.
    HindLeft = 3,
}

impl Leg {
    /// All legs in array order.
    pub const ALL: [Leg; NUM_LEGS] = [
        Leg::FrontRight,
        Leg::FrontLeft,
        Leg::HindRight,
        Leg::HindLeft,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short label used in config tables and logs.
    pub const fn abbrev(self) -> &'static str {
        match self {
            Leg::FrontRight => "fr",
            Leg::FrontLeft => "fl",
            Leg::HindRight => "hr",
            Leg::HindLeft => "hl",
        }
    }
}

/// Command consumed by one leg's actuator interface each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegCommand {
    /// Joint feed-forward torque [Nm].
    pub tau_feed_forward: Vector3<f64>,
    /// Cartesian feed-forward force at the foot [N].
    pub force_feed_forward: Vector3<f64>,
    /// Desired joint positions [rad].
    pub q_des: Vector3<f64>,
    /// Desired joint velocities [rad/s].
    pub qd_des: Vector3<f64>,
    /// Desired foot position in the hip frame [m].
    pub p_des: Vector3<f64>,
    /// Desired foot velocity [m/s].
    pub v_des: Vector3<f64>,
    /// Cartesian stiffness.
    pub kp_cartesian: Matrix3<f64>,
    /// Cartesian damping.
    pub kd_cartesian: Matrix3<f64>,
    /// Joint stiffness.
    pub kp_joint: Matrix3<f64>,
    /// Joint damping.
    pub kd_joint: Matrix3<f64>,
}

impl LegCommand {
    /// Reset every field to zero (no torque, no stiffness).
    pub fn zero(&mut self) {
        *self = Self::default();
    }

    /// True if every gain matrix is zero, i.e. the leg is limp.
    pub fn is_limp(&self) -> bool {
        self.kp_cartesian == Matrix3::zeros()
            && self.kd_cartesian == Matrix3::zeros()
            && self.kp_joint == Matrix3::zeros()
            && self.kd_joint == Matrix3::zeros()
            && self.force_feed_forward == Vector3::zeros()
            && self.tau_feed_forward == Vector3::zeros()
    }
}

impl Default for LegCommand {
    fn default() -> Self {
        Self {
            tau_feed_forward: Vector3::zeros(),
            force_feed_forward: Vector3::zeros(),
            q_des: Vector3::zeros(),
            qd_des: Vector3::zeros(),
            p_des: Vector3::zeros(),
            v_des: Vector3::zeros(),
            kp_cartesian: Matrix3::zeros(),
            kd_cartesian: Matrix3::zeros(),
            kp_joint: Matrix3::zeros(),
            kd_joint: Matrix3::zeros(),
        }
    }
}

/// Sensed state of one leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegData {
    /// Joint positions [rad].
    pub q: Vector3<f64>,
    /// Joint velocities [rad/s].
    pub qd: Vector3<f64>,
    /// Foot position in the hip frame [m].
    pub p: Vector3<f64>,
    /// Foot velocity [m/s].
    pub v: Vector3<f64>,
}

impl LegData {
    /// True if every component is a finite number.
    pub fn is_finite(&self) -> bool {
        [self.q, self.qd, self.p, self.v]
            .iter()
            .all(|v| v.iter().all(|c| c.is_finite()))
    }
}

impl Default for LegData {
    fn default() -> Self {
        Self {
            q: Vector3::zeros(),
            qd: Vector3::zeros(),
            p: Vector3::zeros(),
            v: Vector3::zeros(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leg_indices_match_array_order() {
        for (i, leg) in Leg::ALL.iter().enumerate() {
            assert_eq!(leg.index(), i);
        }
        assert_eq!(Leg::HindLeft.abbrev(), "hl");
    }

    #[test]
    fn zero_clears_all_fields() {
        let mut cmd = LegCommand {
            p_des: Vector3::new(0.1, 0.2, -0.3),
            kp_cartesian: Matrix3::from_diagonal(&Vector3::new(500.0, 500.0, 500.0)),
            force_feed_forward: Vector3::new(0.0, 0.0, 40.0),
            ..Default::default()
        };
        assert!(!cmd.is_limp());
        cmd.zero();
        assert_eq!(cmd, LegCommand::default());
        assert!(cmd.is_limp());
    }

    #[test]
    fn leg_data_finite_check() {
        let mut data = LegData::default();
        assert!(data.is_finite());
        data.p.z = f64::NAN;
        assert!(!data.is_finite());
    }
}
