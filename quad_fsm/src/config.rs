//! TOML configuration loader with validation.
//!
//! Loads [`LoadedConfig`] from one TOML file. Validates: parameter bounds
//! of every section, stand height against the robot's leg length, and the
//! scripted mode schedule (size and ordering). Gain tables can be hot
//! reloaded while the FSM is in Passive.

use std::path::Path;

use quad_common::config::{
    ConfigError as CommonConfigError, ConfigLoader, ConfigSection, SharedConfig,
};
use quad_common::consts::MAX_SCHEDULE_ENTRIES;
use quad_common::fsm::config::{
    ControlConfig, LocomotionConfig, ModeRequest, StandUpConfig, UserParameters,
};
use quad_common::fsm::safety::SafetyLimits;
use quad_common::fsm::state::FsmStateName;
use quad_common::robot::Quadruped;
use serde::Deserialize;

// ─── Error Type ─────────────────────────────────────────────────────

/// Configuration loading/validation error.
#[derive(Debug)]
pub enum ConfigError {
    /// File I/O error.
    IoError(String),
    /// TOML parse error.
    ParseError(String),
    /// Parameter validation error.
    ValidationError(String),
    /// Hot-reload denied (FSM not in PASSIVE).
    ReloadDenied(String),
    /// Hot-reload validation failed (shadow gains rejected).
    ReloadValidationFailed(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "config I/O error: {e}"),
            Self::ParseError(e) => write!(f, "config parse error: {e}"),
            Self::ValidationError(e) => write!(f, "config validation: {e}"),
            Self::ReloadDenied(reason) => write!(f, "ERR_RELOAD_DENIED: {reason}"),
            Self::ReloadValidationFailed(detail) => {
                write!(f, "ERR_RELOAD_VALIDATION_FAILED: {detail}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<CommonConfigError> for ConfigError {
    fn from(e: CommonConfigError) -> Self {
        match e {
            CommonConfigError::FileNotFound => Self::IoError("file not found".to_string()),
            CommonConfigError::ParseError(e) => Self::ParseError(e),
            CommonConfigError::ValidationError(e) => Self::ValidationError(e),
        }
    }
}

// ─── Loaded Config Bundle ───────────────────────────────────────────

/// Complete validated configuration, ready for runtime use.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadedConfig {
    pub shared: SharedConfig,
    pub control: ControlConfig,
    pub stand_up: StandUpConfig,
    pub locomotion: LocomotionConfig,
    pub safety: SafetyLimits,
    pub gains: UserParameters,
    pub schedule: Vec<ModeRequest>,
}

impl LoadedConfig {
    /// Robot parameters for the configured robot type.
    #[inline]
    pub fn quadruped(&self) -> Quadruped {
        Quadruped::for_type(self.control.robot_type)
    }
}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate the FSM configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let config = LoadedConfig::load(path).map_err(|e| match e {
        CommonConfigError::FileNotFound => {
            ConfigError::IoError(format!("failed to read {}: not found", path.display()))
        }
        other => other.into(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from a TOML string (for testing).
pub fn load_config_from_str(content: &str) -> Result<LoadedConfig, ConfigError> {
    let config = LoadedConfig::from_toml_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

// ─── Validation ─────────────────────────────────────────────────────

pub fn validate_config(config: &LoadedConfig) -> Result<(), ConfigError> {
    config.shared.check()?;
    config.control.check()?;
    config.stand_up.check()?;
    config.locomotion.check()?;
    config.safety.check()?;
    config.gains.check()?;

    let leg_length = config.quadruped().max_leg_length;
    if config.stand_up.target_height >= leg_length {
        return Err(ConfigError::ValidationError(format!(
            "stand_up: target_height {} exceeds leg length {} of {:?}",
            config.stand_up.target_height, leg_length, config.control.robot_type
        )));
    }

    validate_schedule(&config.schedule)
}

/// Check schedule size and strictly ascending ticks.
pub fn validate_schedule(schedule: &[ModeRequest]) -> Result<(), ConfigError> {
    if schedule.len() > MAX_SCHEDULE_ENTRIES {
        return Err(ConfigError::ValidationError(format!(
            "schedule has {} entries, max {}",
            schedule.len(),
            MAX_SCHEDULE_ENTRIES
        )));
    }
    for pair in schedule.windows(2) {
        if pair[1].at_tick <= pair[0].at_tick {
            return Err(ConfigError::ValidationError(format!(
                "schedule ticks not ascending: {} after {}",
                pair[1].at_tick, pair[0].at_tick
            )));
        }
    }
    Ok(())
}

// ─── Hot-Reload: Shadow Gains ───────────────────────────────────────

/// Parse and validate a shadow gain document.
///
/// The document has the shape of the `[gains]` section without the prefix
/// (`[sim.fr]`, `[real.hl]`, ...). On any failure the shadow is discarded.
pub fn parse_shadow_gains(gains_toml: &str) -> Result<UserParameters, ConfigError> {
    let shadow: UserParameters = toml::from_str(gains_toml)
        .map_err(|e| ConfigError::ReloadValidationFailed(format!("gains parse: {e}")))?;
    shadow
        .validate()
        .map_err(|e| ConfigError::ReloadValidationFailed(format!("validation: {e}")))?;
    Ok(shadow)
}

/// Gain reload outcome.
#[derive(Debug, PartialEq, Eq)]
pub enum ReloadResult {
    /// Gains swapped successfully.
    Success,
    /// Validation failed; active gains unchanged.
    ValidationFailed(String),
    /// Reload denied (not in PASSIVE, or a transition is pending).
    Denied(String),
}

/// Validate the shadow gains and swap them into `active`.
///
/// On failure `active` is unchanged.
pub fn atomic_gains_swap(active: &mut LoadedConfig, gains_toml: &str) -> ReloadResult {
    match parse_shadow_gains(gains_toml) {
        Ok(shadow) => {
            active.gains = shadow;
            ReloadResult::Success
        }
        Err(e) => ReloadResult::ValidationFailed(format!("{e}")),
    }
}

/// Reload gains if the FSM is settled in Passive.
pub fn reload_gains(
    active: &mut LoadedConfig,
    gains_toml: &str,
    state: FsmStateName,
    pending: bool,
) -> ReloadResult {
    if state != FsmStateName::Passive || pending {
        let reason = ConfigError::ReloadDenied(format!(
            "FSM in {state}{}, gains reload only in PASSIVE",
            if pending { " (transition pending)" } else { "" }
        ));
        return ReloadResult::Denied(reason.to_string());
    }
    atomic_gains_swap(active, gains_toml)
}
