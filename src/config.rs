//! Game tunables and rule variants
//!
//! One immutable [`Config`] is built at startup and passed by reference into
//! every simulation function. Nothing in the core reads global state, so
//! tests can run with whatever parameters they like.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Named rule variations. The original table game went through several
/// revisions that disagreed on these; they are flags here instead of forks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    /// Treasure (and ExtraTurn item) pickups grant an extra turn only when
    /// the picking coin belongs to the side whose turn it is. The permissive
    /// variant (`false`) lets a coin shoved by momentum earn the grant too.
    pub extra_turn_requires_current_turn: bool,
    /// Give the opening shot of the next round to the side that just scored.
    /// Default hands it to the side that conceded.
    pub scorer_opens_next_round: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            extra_turn_requires_current_turn: true,
            scorer_opens_next_round: false,
        }
    }
}

/// Opponent planner tuning
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AiConfig {
    /// Deliberation delay before committing to a shot, in ticks (min, max)
    pub think_ticks: [u32; 2],
    /// How far ahead (in ticks) to project a moving target coin
    pub predict_frames: f32,
    /// Shot power = target distance / this divisor, clamped to max power
    pub power_divisor: f32,
    /// Flat power bonus when ramming the opposing coin
    pub attack_bonus: f32,
    /// Extra clearance added to coin radius when routing around an obstacle corner
    pub detour_margin: f32,
    /// Sideways displacement applied to dodge the opposing coin
    pub avoid_offset: f32,
    /// Shot line closer than opponent radius + this triggers the dodge
    pub avoid_near: f32,
    /// A dodged line must clear opponent radius + this to be accepted
    pub avoid_clear: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            think_ticks: [120, 240],
            predict_frames: 40.0,
            power_divisor: 15.0,
            attack_bonus: 2.0,
            detour_margin: 24.0,
            avoid_offset: 80.0,
            avoid_near: 8.0,
            avoid_clear: 12.0,
        }
    }
}

/// Immutable game configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // === Arena grid ===
    /// Grid rows
    pub rows: u32,
    /// Grid columns
    pub cols: u32,
    /// Cell side length in pixels
    pub cell: f32,
    /// Pixel margin around the playfield
    pub margin: f32,

    // === Physics ===
    /// Per-tick isotropic velocity damping
    pub friction: f32,
    /// Below this per-axis speed a coin snaps to rest
    pub min_speed: f32,
    /// Bounce energy retention (walls, obstacles, coin-coin)
    pub restitution: f32,
    /// Coin radius in pixels
    pub coin_radius: f32,

    // === Shots ===
    /// Launch speed ceiling
    pub max_shot_power: f32,
    /// Drag pixels per unit of launch speed
    pub drag_scale: f32,
    /// Releases slower than this are ignored
    pub min_launch_speed: f32,
    /// Press must land within coin radius + this to start a drag
    pub grab_margin: f32,
    /// Nudge forward-speed range (toward the opposing side)
    pub nudge_forward: [f32; 2],
    /// Nudge lateral-speed range
    pub nudge_lateral: [f32; 2],

    // === Pickups ===
    /// Treasure/item contact margin beyond coin radius
    pub pickup_margin: f32,
    /// Center distance at or below which the turn holder steals
    pub steal_distance: f32,

    // === Match ===
    /// Treasures spawned per round
    pub treasures_per_round: usize,
    /// Round wins needed to take the match
    pub rounds_to_win: u32,

    /// Rule variant flags
    pub rules: Rules,
    /// Opponent planner tuning
    pub ai: AiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rows: 5,
            cols: 9,
            cell: 90.0,
            margin: 40.0,

            friction: 0.985,
            min_speed: 0.35,
            restitution: 0.7,
            coin_radius: 14.0,

            max_shot_power: 16.0,
            drag_scale: 10.0,
            min_launch_speed: 0.1,
            grab_margin: 10.0,
            nudge_forward: [5.0, 7.0],
            nudge_lateral: [-2.0, 2.0],

            pickup_margin: 12.0,
            steal_distance: 33.0,

            treasures_per_round: 1,
            rounds_to_win: 2,

            rules: Rules::default(),
            ai: AiConfig::default(),
        }
    }
}

impl Config {
    /// Playfield pixel width (grid plus margins)
    pub fn width(&self) -> f32 {
        self.cols as f32 * self.cell + self.margin * 2.0
    }

    /// Playfield pixel height (grid plus margins)
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell + self.margin * 2.0
    }

    /// Load a config file, falling back to defaults on any failure
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.as_ref().display());
                    config
                }
                Err(e) => {
                    log::warn!("Bad config {}: {e}, using defaults", path.as_ref().display());
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No config at {}, using defaults", path.as_ref().display());
                Self::default()
            }
        }
    }

    /// Save the config as pretty JSON; failures are logged, not returned
    pub fn save<P: AsRef<Path>>(&self, path: P) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path.as_ref(), json) {
                    log::warn!("Failed to save config: {e}");
                } else {
                    log::info!("Config saved to {}", path.as_ref().display());
                }
            }
            Err(e) => log::warn!("Failed to serialize config: {e}"),
        }
    }
}
