//! Flick Hunt - a turn-based coin-flicking treasure chase
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, pickups, turn machine, AI)
//! - `config`: Immutable tunables and named rule variants
//!
//! Rendering, audio and input-device plumbing are external collaborators:
//! they feed `sim::TickInput` in each frame and drain `sim::GameEvent`s out.

pub mod config;
pub mod sim;

pub use config::{Config, Rules};

/// Frame-rate constants
pub mod consts {
    /// Target simulation rate (ticks per second)
    pub const TICK_RATE: u32 = 120;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f32 = 1.0 / TICK_RATE as f32;
    /// Maximum substeps per rendered frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
}
