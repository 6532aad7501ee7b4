//! Safety types for the control FSM.
//!
//! `SafetyChecks` is the declarative per-state metadata read by the driver;
//! `SafetyLimits` holds the configured envelope the checks compare against.

use serde::{Deserialize, Serialize};

use crate::config::ConfigSection;
use crate::consts::{
    MAX_LATERAL_FORCE_DEFAULT, MAX_LEG_ANGLE_DEFAULT, MAX_ORIENTATION_DEFAULT,
    MAX_VERTICAL_FORCE_DEFAULT,
};

/// Which driver-side safety checks apply while a state is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SafetyChecks {
    /// Pre-check: body must be near level before `run()`.
    pub safe_orientation: bool,
    /// Post-check: desired foot positions must stay inside the workspace.
    pub p_des_foot: bool,
    /// Post-check: feed-forward forces must stay inside the force bounds.
    pub force_feed_forward: bool,
}

impl SafetyChecks {
    /// All checks disabled.
    pub const NONE: Self = Self {
        safe_orientation: false,
        p_des_foot: false,
        force_feed_forward: false,
    };

    /// Orientation and force checks, as used by the force-controlled states.
    pub const ORIENTATION_AND_FORCE: Self = Self {
        safe_orientation: true,
        p_des_foot: false,
        force_feed_forward: true,
    };

    /// True if any post-control check is enabled.
    #[inline]
    pub const fn any_post(&self) -> bool {
        self.p_des_foot || self.force_feed_forward
    }
}

/// Safety envelope (TOML `[safety]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SafetyLimits {
    /// Roll/pitch magnitude that trips the orientation check [rad].
    #[serde(default = "default_max_orientation")]
    pub max_orientation: f64,
    /// Maximum leg swing angle bounding foot x/y [rad].
    #[serde(default = "default_max_leg_angle")]
    pub max_leg_angle: f64,
    /// Lateral feed-forward force bound [N].
    #[serde(default = "default_max_lateral_force")]
    pub max_lateral_force: f64,
    /// Vertical feed-forward force bound [N].
    #[serde(default = "default_max_vertical_force")]
    pub max_vertical_force: f64,
}

fn default_max_orientation() -> f64 {
    MAX_ORIENTATION_DEFAULT
}
fn default_max_leg_angle() -> f64 {
    MAX_LEG_ANGLE_DEFAULT
}
fn default_max_lateral_force() -> f64 {
    MAX_LATERAL_FORCE_DEFAULT
}
fn default_max_vertical_force() -> f64 {
    MAX_VERTICAL_FORCE_DEFAULT
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_orientation: MAX_ORIENTATION_DEFAULT,
            max_leg_angle: MAX_LEG_ANGLE_DEFAULT,
            max_lateral_force: MAX_LATERAL_FORCE_DEFAULT,
            max_vertical_force: MAX_VERTICAL_FORCE_DEFAULT,
        }
    }
}

impl ConfigSection for SafetyLimits {
    const SECTION: &'static str = "safety";

    fn validate(&self) -> Result<(), String> {
        if !(self.max_orientation > 0.0 && self.max_orientation < std::f64::consts::FRAC_PI_2) {
            return Err(format!(
                "max_orientation {} out of range (0, pi/2)",
                self.max_orientation
            ));
        }
        if !(self.max_leg_angle > 0.0 && self.max_leg_angle <= std::f64::consts::FRAC_PI_2) {
            return Err(format!(
                "max_leg_angle {} out of range (0, pi/2]",
                self.max_leg_angle
            ));
        }
        if !(self.max_lateral_force > 0.0) || !(self.max_vertical_force > 0.0) {
            return Err("force bounds must be positive".to_string());
        }
        Ok(())
    }
}

impl SafetyLimits {
    /// Horizontal foot-position bound for a leg of the given length [m].
    #[inline]
    pub fn max_p_des(&self, max_leg_length: f64) -> f64 {
        max_leg_length * self.max_leg_angle.sin()
    }
}
