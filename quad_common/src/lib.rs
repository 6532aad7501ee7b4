//! Quadruped Common Library
//!
//! This crate provides shared constants, data types and configuration loading
//! utilities for the quadruped control FSM workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - System-wide numeric limits and defaults
//! - [`config`] - Configuration loading traits and types
//! - [`robot`] - Robot model handle (type, physical parameters, running mode)
//! - [`leg`] - Per-leg actuator command and sensed data
//! - [`fsm`] - FSM enums, fault flags, safety limits and parameter tables
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use quad_common::prelude::*;
//!
//! let mut cmd = LegCommand::default();
//! cmd.p_des.z = -0.25;
//! cmd.zero();
//! assert_eq!(cmd.p_des.z, 0.0);
//! ```

pub mod config;
pub mod consts;
pub mod fsm;
pub mod leg;
pub mod prelude;
pub mod robot;
