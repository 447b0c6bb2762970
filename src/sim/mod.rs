//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, owned by the state
//! - No rendering, audio or platform dependencies; notable moments surface
//!   as [`GameEvent`]s for a presentation layer to pick up

pub mod ai;
pub mod arena;
pub mod coin;
pub mod collision;
pub mod geom;
pub mod state;
pub mod tick;

pub use arena::{Arena, Base, ObstacleLayout};
pub use coin::Coin;
pub use collision::resolve_coin_collision;
pub use geom::Rect;
pub use state::{GameEvent, GameState, Item, ItemKind, Side, Treasure, TurnPhase};
pub use tick::{TickInput, tick};
