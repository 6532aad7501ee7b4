//! # Quadruped Control FSM Library
//!
//! Control-mode state machine for a legged-robot real-time controller.
//! Provides the four-hook state contract, the concrete states (Passive,
//! StandUp, BalanceStand, Locomotion), the FSM driver with its two-phase
//! transition protocol and safety checks, and a fixed-period cycle runner.
//!
//! ## Tick Protocol
//!
//! 1. Safety pre-check (orientation) for states that request it.
//! 2. `run()` of the active state writes leg commands.
//! 3. Safety post-check (foot position, feed-forward force).
//! 4. `check_transition()` re-arbitrated every tick.
//! 5. While a transition is pending, `transition()` until it reports done,
//!    then `on_exit()` / swap / `on_enter()`.
//!
//! ## Zero-Allocation Tick
//!
//! All states are constructed once at startup and reused across entries.
//! The tick path performs no heap allocation and never blocks.

#![deny(clippy::disallowed_types)]

pub mod config;
pub mod context;
pub mod cycle;
pub mod fsm;
pub mod safety;
pub mod state;
