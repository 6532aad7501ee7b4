//! System-wide constants for the quadruped workspace.
//!
//! Single source of truth for numeric limits and defaults.
//! Imported by all crates; no duplication permitted.

use static_assertions::const_assert;

/// Number of legs on the robot.
pub const NUM_LEGS: usize = 4;

/// Default control loop period [s] (500 Hz).
pub const CONTROLLER_DT_DEFAULT: f64 = 0.002;

/// Minimum accepted control loop period [s].
pub const CONTROLLER_DT_MIN: f64 = 0.0001;

/// Maximum accepted control loop period [s].
pub const CONTROLLER_DT_MAX: f64 = 0.02;

/// Nominal standing height reached by the stand-up ramp [m].
pub const STAND_UP_TARGET_HEIGHT_DEFAULT: f64 = 0.25;

/// Maximum accepted standing height [m].
pub const STAND_UP_TARGET_HEIGHT_MAX: f64 = 0.6;

/// Stand-up ramp slope [1/s]. Progress reaches 1 after `1 / rate` seconds.
pub const STAND_UP_RAMP_RATE_DEFAULT: f64 = 1.5;

/// Foot positions used when sensed leg data is unavailable (FR, FL, HR, HL).
pub const FALLBACK_FOOT_POSITIONS: [[f64; 3]; NUM_LEGS] = [
    [0.0, -0.08, -0.05],
    [0.0, 0.08, -0.05],
    [0.0, -0.08, -0.05],
    [0.0, 0.08, -0.05],
];

/// Settle time of the locomotion → balance-stand handshake [s].
pub const LOCOMOTION_SETTLE_TIME_DEFAULT: f64 = 0.1;

/// Roll/pitch magnitude at which the orientation check trips [rad].
pub const MAX_ORIENTATION_DEFAULT: f64 = 0.5;

/// Maximum leg swing angle used to bound desired foot positions [rad].
pub const MAX_LEG_ANGLE_DEFAULT: f64 = 1.0472;

/// Lateral (x/y) feed-forward force bound [N].
pub const MAX_LATERAL_FORCE_DEFAULT: f64 = 350.0;

/// Vertical (z) feed-forward force bound [N].
pub const MAX_VERTICAL_FORCE_DEFAULT: f64 = 350.0;

/// Maximum number of scripted control-mode requests.
pub const MAX_SCHEDULE_ENTRIES: usize = 32;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/quad/fsm.toml";

const_assert!(NUM_LEGS == 4);
const_assert!(MAX_SCHEDULE_ENTRIES > 0);
