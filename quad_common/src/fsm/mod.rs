//! Control FSM shared types.
//!
//! All types shared between the FSM driver and its supervisors live here.
//! Organized by domain: state/mode enums, fault bitflags, safety types,
//! and parameter tables.

pub mod config;
pub mod error;
pub mod safety;
pub mod state;
