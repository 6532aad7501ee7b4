//! Configuration structures for the control FSM.
//!
//! All config types use `serde::Deserialize` for TOML loading.
//! Numeric parameters have `MIN`/`MAX` bounds checked by `validate()`.
//! Optional fields use `#[serde(default)]` for forward-compatible deserialization.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::ConfigSection;
use crate::consts::{
    CONTROLLER_DT_DEFAULT, CONTROLLER_DT_MAX, CONTROLLER_DT_MIN, FALLBACK_FOOT_POSITIONS,
    LOCOMOTION_SETTLE_TIME_DEFAULT, NUM_LEGS, STAND_UP_RAMP_RATE_DEFAULT,
    STAND_UP_TARGET_HEIGHT_DEFAULT, STAND_UP_TARGET_HEIGHT_MAX,
};
use crate::leg::Leg;
use crate::robot::{RobotType, RunningMode};

use super::state::ControlMode;

// ─── Live Control Parameters ────────────────────────────────────────

/// Live configuration read by the FSM states every tick.
///
/// Mutated only by the driver/cycle runner between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlParameters {
    /// Requested control mode, raw (see [`ControlMode::from_u8`]).
    pub control_mode: u8,
    /// Control loop period [s].
    pub controller_dt: f64,
    /// Simulation or physical hardware.
    pub running_mode: RunningMode,
}

impl ControlParameters {
    /// Decoded control mode, `None` if the raw value is unsupported.
    #[inline]
    pub const fn requested_mode(&self) -> Option<ControlMode> {
        ControlMode::from_u8(self.control_mode)
    }
}

impl Default for ControlParameters {
    fn default() -> Self {
        Self {
            control_mode: ControlMode::Passive as u8,
            controller_dt: CONTROLLER_DT_DEFAULT,
            running_mode: RunningMode::Simulation,
        }
    }
}

// ─── Control Section ────────────────────────────────────────────────

/// Controller-wide settings (TOML `[control]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlConfig {
    /// Control loop period [s] (default: 0.002).
    #[serde(default = "default_controller_dt")]
    pub controller_dt: f64,
    /// Simulation or hardware (default: simulation).
    #[serde(default)]
    pub running_mode: RunningMode,
    /// Mode requested at startup (default: passive).
    #[serde(default)]
    pub initial_mode: ControlMode,
    /// Robot variant (default: mini_cheetah).
    #[serde(default)]
    pub robot_type: RobotType,
}

fn default_controller_dt() -> f64 {
    CONTROLLER_DT_DEFAULT
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            controller_dt: CONTROLLER_DT_DEFAULT,
            running_mode: RunningMode::default(),
            initial_mode: ControlMode::default(),
            robot_type: RobotType::default(),
        }
    }
}

impl ConfigSection for ControlConfig {
    const SECTION: &'static str = "control";

    fn validate(&self) -> Result<(), String> {
        if !(self.controller_dt >= CONTROLLER_DT_MIN && self.controller_dt <= CONTROLLER_DT_MAX) {
            return Err(format!(
                "controller_dt {} out of range [{}, {}]",
                self.controller_dt, CONTROLLER_DT_MIN, CONTROLLER_DT_MAX
            ));
        }
        Ok(())
    }
}

impl ControlConfig {
    /// Initial live parameters derived from this section.
    pub fn to_parameters(&self) -> ControlParameters {
        ControlParameters {
            control_mode: self.initial_mode as u8,
            controller_dt: self.controller_dt,
            running_mode: self.running_mode,
        }
    }
}

// ─── Gain Tables ────────────────────────────────────────────────────

/// Diagonal Cartesian gains for one leg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegGains {
    /// Proportional stiffness per axis [N/m].
    pub kp: [f64; 3],
    /// Derivative damping per axis [N·s/m].
    pub kd: [f64; 3],
}

impl LegGains {
    pub const fn new(kp: [f64; 3], kd: [f64; 3]) -> Self {
        Self { kp, kd }
    }

    #[inline]
    pub fn kp_matrix(&self) -> Matrix3<f64> {
        Matrix3::from_diagonal(&Vector3::from(self.kp))
    }

    #[inline]
    pub fn kd_matrix(&self) -> Matrix3<f64> {
        Matrix3::from_diagonal(&Vector3::from(self.kd))
    }

    fn validate(&self, what: &str) -> Result<(), String> {
        if self.kp.iter().chain(self.kd.iter()).any(|g| !(*g >= 0.0) || !g.is_finite()) {
            return Err(format!("{what}: gains must be finite and non-negative"));
        }
        Ok(())
    }
}

/// Per-leg gain table for one running mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GainTable {
    pub fr: LegGains,
    pub fl: LegGains,
    pub hr: LegGains,
    pub hl: LegGains,
}

impl GainTable {
    /// Same gains on every leg.
    pub const fn uniform(gains: LegGains) -> Self {
        Self {
            fr: gains,
            fl: gains,
            hr: gains,
            hl: gains,
        }
    }

    #[inline]
    pub const fn leg(&self, leg: Leg) -> &LegGains {
        match leg {
            Leg::FrontRight => &self.fr,
            Leg::FrontLeft => &self.fl,
            Leg::HindRight => &self.hr,
            Leg::HindLeft => &self.hl,
        }
    }

    pub fn validate(&self, table: &str) -> Result<(), String> {
        for leg in Leg::ALL {
            self.leg(leg)
                .validate(&format!("gains.{table}.{}", leg.abbrev()))?;
        }
        Ok(())
    }
}

/// Cartesian gain tables for simulation and physical hardware (TOML `[gains]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserParameters {
    #[serde(default = "default_sim_gains")]
    pub sim: GainTable,
    #[serde(default = "default_real_gains")]
    pub real: GainTable,
}

fn default_sim_gains() -> GainTable {
    GainTable::uniform(LegGains::new([500.0, 500.0, 500.0], [8.0, 8.0, 8.0]))
}

fn default_real_gains() -> GainTable {
    GainTable {
        fr: LegGains::new([300.0, 500.0, 450.0], [10.0, 8.0, 8.0]),
        fl: LegGains::new([300.0, 450.0, 450.0], [10.0, 8.0, 8.0]),
        hr: LegGains::new([300.0, 250.0, 200.0], [10.0, 8.0, 8.0]),
        hl: LegGains::new([300.0, 300.0, 300.0], [10.0, 8.0, 8.0]),
    }
}

impl Default for UserParameters {
    fn default() -> Self {
        Self {
            sim: default_sim_gains(),
            real: default_real_gains(),
        }
    }
}

impl UserParameters {
    /// Gain table for the given running mode.
    #[inline]
    pub const fn table(&self, mode: RunningMode) -> &GainTable {
        match mode {
            RunningMode::Simulation => &self.sim,
            RunningMode::Hardware => &self.real,
        }
    }
}

impl ConfigSection for UserParameters {
    const SECTION: &'static str = "gains";

    fn validate(&self) -> Result<(), String> {
        self.sim.validate("sim")?;
        self.real.validate("real")
    }
}

// ─── Stand-Up ───────────────────────────────────────────────────────

/// Stand-up ramp settings (TOML `[stand_up]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StandUpConfig {
    /// Standing height below the hip [m] (default: 0.25).
    #[serde(default = "default_target_height")]
    pub target_height: f64,
    /// Ramp slope [1/s] (default: 1.5).
    #[serde(default = "default_ramp_rate")]
    pub ramp_rate: f64,
    /// Use `fallback_foot_positions` when sensed leg data is unavailable.
    #[serde(default = "default_allow_fallback")]
    pub allow_fallback: bool,
    /// Per-leg fallback foot positions (FR, FL, HR, HL) [m].
    #[serde(default = "default_fallback_feet")]
    pub fallback_foot_positions: [[f64; 3]; NUM_LEGS],
}

fn default_target_height() -> f64 {
    STAND_UP_TARGET_HEIGHT_DEFAULT
}
fn default_ramp_rate() -> f64 {
    STAND_UP_RAMP_RATE_DEFAULT
}
fn default_allow_fallback() -> bool {
    true
}
fn default_fallback_feet() -> [[f64; 3]; NUM_LEGS] {
    FALLBACK_FOOT_POSITIONS
}

impl Default for StandUpConfig {
    fn default() -> Self {
        Self {
            target_height: STAND_UP_TARGET_HEIGHT_DEFAULT,
            ramp_rate: STAND_UP_RAMP_RATE_DEFAULT,
            allow_fallback: true,
            fallback_foot_positions: FALLBACK_FOOT_POSITIONS,
        }
    }
}

impl ConfigSection for StandUpConfig {
    const SECTION: &'static str = "stand_up";

    fn validate(&self) -> Result<(), String> {
        if !(self.target_height > 0.0 && self.target_height <= STAND_UP_TARGET_HEIGHT_MAX) {
            return Err(format!(
                "target_height {} out of range (0, {}]",
                self.target_height, STAND_UP_TARGET_HEIGHT_MAX
            ));
        }
        if !(self.ramp_rate > 0.0) || !self.ramp_rate.is_finite() {
            return Err(format!("ramp_rate {} must be positive", self.ramp_rate));
        }
        for (i, p) in self.fallback_foot_positions.iter().enumerate() {
            if p.iter().any(|c| !c.is_finite()) {
                return Err(format!("fallback_foot_positions[{i}] is not finite"));
            }
            if p[2] >= 0.0 {
                return Err(format!(
                    "fallback_foot_positions[{i}] z={} must be below the hip",
                    p[2]
                ));
            }
        }
        Ok(())
    }
}

impl StandUpConfig {
    /// Fallback foot position of one leg as a vector.
    #[inline]
    pub fn fallback(&self, leg: Leg) -> Vector3<f64> {
        Vector3::from(self.fallback_foot_positions[leg.index()])
    }
}

// ─── Locomotion ─────────────────────────────────────────────────────

/// Locomotion host settings (TOML `[locomotion]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocomotionConfig {
    /// Duration of the locomotion → balance-stand settle handshake [s].
    #[serde(default = "default_settle_time")]
    pub settle_time: f64,
}

fn default_settle_time() -> f64 {
    LOCOMOTION_SETTLE_TIME_DEFAULT
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            settle_time: LOCOMOTION_SETTLE_TIME_DEFAULT,
        }
    }
}

impl ConfigSection for LocomotionConfig {
    const SECTION: &'static str = "locomotion";

    fn validate(&self) -> Result<(), String> {
        if !(self.settle_time > 0.0 && self.settle_time <= 5.0) {
            return Err(format!(
                "settle_time {} out of range (0, 5]",
                self.settle_time
            ));
        }
        Ok(())
    }
}

// ─── Mode Schedule ──────────────────────────────────────────────────

/// One scripted control-mode request (TOML `[[schedule]]`).
///
/// `mode` is raw so unsupported requests can be scripted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModeRequest {
    /// Tick at which the request is applied.
    pub at_tick: u64,
    /// Raw control mode value.
    pub mode: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_defaults_validate() {
        let cfg = ControlConfig::default();
        assert!(cfg.validate().is_ok());
        let params = cfg.to_parameters();
        assert_eq!(params.requested_mode(), Some(ControlMode::Passive));
        assert_eq!(params.controller_dt, CONTROLLER_DT_DEFAULT);
    }

    #[test]
    fn reject_controller_dt_out_of_range() {
        for dt in [0.0, 0.5, f64::NAN] {
            let cfg = ControlConfig {
                controller_dt: dt,
                ..Default::default()
            };
            assert!(cfg.validate().is_err(), "dt={dt} should be rejected");
        }
    }

    #[test]
    fn unsupported_raw_mode_decodes_to_none() {
        let params = ControlParameters {
            control_mode: 42,
            ..Default::default()
        };
        assert_eq!(params.requested_mode(), None);
    }

    #[test]
    fn gain_table_lookup_by_running_mode() {
        let user = UserParameters::default();
        assert_eq!(user.table(RunningMode::Simulation), &user.sim);
        assert_eq!(user.table(RunningMode::Hardware), &user.real);
        assert_eq!(user.real.leg(Leg::HindRight).kp, [300.0, 250.0, 200.0]);
    }

    #[test]
    fn gain_matrices_are_diagonal() {
        let g = LegGains::new([1.0, 2.0, 3.0], [4.0, 5.0, 6.0]);
        let kp = g.kp_matrix();
        assert_eq!(kp[(0, 0)], 1.0);
        assert_eq!(kp[(1, 1)], 2.0);
        assert_eq!(kp[(2, 2)], 3.0);
        assert_eq!(kp[(0, 1)], 0.0);
        assert_eq!(g.kd_matrix()[(2, 2)], 6.0);
    }

    #[test]
    fn reject_negative_gain() {
        let mut user = UserParameters::default();
        user.real.hl.kd[1] = -1.0;
        let err = user.validate().unwrap_err();
        assert!(err.contains("gains.real.hl"), "{err}");
    }

    #[test]
    fn stand_up_validation() {
        assert!(StandUpConfig::default().validate().is_ok());
        let bad_height = StandUpConfig {
            target_height: 0.0,
            ..Default::default()
        };
        assert!(bad_height.validate().is_err());
        let mut bad_fallback = StandUpConfig::default();
        bad_fallback.fallback_foot_positions[2][2] = 0.1;
        assert!(bad_fallback.validate().is_err());
    }

    #[test]
    fn stand_up_fallback_vector() {
        let cfg = StandUpConfig::default();
        let p = cfg.fallback(Leg::FrontLeft);
        assert_eq!(p, Vector3::new(0.0, 0.08, -0.05));
    }

    #[test]
    fn locomotion_validation() {
        assert!(LocomotionConfig::default().validate().is_ok());
        assert!(LocomotionConfig { settle_time: 0.0 }.validate().is_err());
    }
}
