//! Game state and core simulation types
//!
//! Everything that defines a match lives here: the two coins, the round's
//! treasure and items, the turn machine fields and the seeded RNG. All
//! carry-relation mutations (pickup, steal, score) go through single
//! transition functions so the coin→treasure and treasure→side references
//! can never disagree.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::Config;

use super::ai::Planner;
use super::arena::{Arena, ObstacleLayout};
use super::coin::Coin;

/// One of the two competing parties: 0 or 1
pub type Side = usize;

/// The opposing side
#[inline]
pub fn other(side: Side) -> Side {
    1 - side
}

/// HUD label for a side
pub fn side_label(side: Side) -> &'static str {
    if side == 0 { "P1" } else { "P2" }
}

/// Minimum spawn spacing between an item and a treasure, in pixels
const TREASURE_CLEARANCE: f32 = 24.0;
/// Minimum spawn spacing between two items, in pixels
const ITEM_CLEARANCE: f32 = 16.0;
/// Cap on random placement attempts per spawned entity
const MAX_SPAWN_ATTEMPTS: u32 = 100;

/// The round's objective token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasure {
    pub id: u32,
    pub row: u32,
    pub col: u32,
    /// Side currently carrying this treasure; kept in lockstep with the
    /// carrier coin's `carrying` field
    pub carried_by: Option<Side>,
}

/// One-shot pickup kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    ExtraTurn,
    Stop,
    Redirect,
}

impl ItemKind {
    pub const ALL: [ItemKind; 3] = [ItemKind::ExtraTurn, ItemKind::Stop, ItemKind::Redirect];

    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::ExtraTurn => "Extra Turn",
            ItemKind::Stop => "Stop Coin",
            ItemKind::Redirect => "Redirect",
        }
    }
}

/// A transient pickup sitting on a grid cell; consumed on contact, never
/// carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub kind: ItemKind,
    pub row: u32,
    pub col: u32,
}

/// Where the current round-turn stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Waiting for a launch from the side whose turn it is
    #[default]
    Idle,
    /// A shot is live; a switch decision is owed once everything rests
    InFlight,
    /// All coins resting: decide extra turn vs. handover
    Resolving,
}

/// Discrete notifications for the presentation layer (sounds, HUD flashes).
/// Drained with [`GameState::take_events`] once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    WallBounce { side: Side },
    ObstacleBounce { side: Side },
    TreasurePickup { side: Side, extra_turn: bool },
    Steal { by: Side },
    ItemPickup { side: Side, kind: ItemKind },
    Score { side: Side, wins: u32 },
    RoundStart { side: Side },
    MatchWon { side: Side },
}

/// Complete match state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Playfield, static within a match (obstacles swap only on reset)
    pub arena: Arena,
    /// Both coins, indexed by side
    pub coins: [Coin; 2],
    /// Live treasures (normally one per round)
    pub treasures: Vec<Treasure>,
    /// One slot per item kind, indexed by `ItemKind as usize`
    pub items: [Option<Item>; 3],

    /// Side to act
    pub turn: Side,
    /// A grant to repeat the turn, consumed at the next resolution
    pub extra_turn: bool,
    /// Turn machine phase
    pub phase: TurnPhase,
    /// Round wins per side
    pub match_wins: [u32; 2],
    pub match_over: bool,

    /// Human-readable status line, updated on every state-changing event
    pub message: String,
    /// An aim drag is in progress (defers turn resolution)
    pub dragging: bool,
    pub drag_start: Vec2,

    /// Simulation tick counter
    pub time_ticks: u64,
    /// Per-side automation; an enabled planner replaces pointer input
    pub planners: [Planner; 2],

    rng: Pcg32,
    next_id: u32,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Build a fresh match on the given layout. Side 1 is automated by
    /// default, matching the original player-vs-AI arrangement.
    pub fn new(cfg: &Config, layout: ObstacleLayout, seed: u64) -> Self {
        let arena = Arena::new(cfg, layout);
        let coins = [
            Coin::new(0, arena.coin_start(0), cfg.coin_radius),
            Coin::new(1, arena.coin_start(1), cfg.coin_radius),
        ];
        let mut state = Self {
            seed,
            arena,
            coins,
            treasures: Vec::new(),
            items: [None; 3],
            turn: 0,
            extra_turn: false,
            phase: TurnPhase::Idle,
            match_wins: [0, 0],
            match_over: false,
            message: String::new(),
            dragging: false,
            drag_start: Vec2::ZERO,
            time_ticks: 0,
            planners: [Planner::new(false), Planner::new(true)],
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
            events: Vec::new(),
        };
        state.start_round(cfg, 0);
        state.message = format!("Flip: {} starts!", side_label(state.turn));
        state
    }

    /// Enable or disable automation for a side
    pub fn set_automated(&mut self, side: Side, automated: bool) {
        self.planners[side].enabled = automated;
        self.planners[side].cancel();
    }

    pub(crate) fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    pub(crate) fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Hand the accumulated events to the presentation layer
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// True while a shot's outcome has not yet been turned into a keep-or-
    /// switch decision
    pub fn awaiting_switch(&self) -> bool {
        matches!(self.phase, TurnPhase::InFlight | TurnPhase::Resolving)
    }

    pub fn any_moving(&self) -> bool {
        self.coins.iter().any(|c| c.vel != Vec2::ZERO)
    }

    /// Current pixel position of a treasure: its cell center when free, the
    /// carrier coin when held
    pub fn treasure_pos(&self, t: &Treasure) -> Vec2 {
        match t.carried_by {
            Some(side) => self.coins[side].pos,
            None => self.arena.grid_to_px(t.row, t.col),
        }
    }

    pub fn item_pos(&self, item: &Item) -> Vec2 {
        self.arena.grid_to_px(item.row, item.col)
    }

    // --- round lifecycle ------------------------------------------------

    /// Reset round-scoped entities and give `starting` the opening turn.
    /// Obstacles are untouched; they only change on match reset.
    pub fn start_round(&mut self, cfg: &Config, starting: Side) {
        self.turn = starting;
        self.extra_turn = false;
        self.phase = TurnPhase::Idle;
        self.dragging = false;
        for p in &mut self.planners {
            p.cancel();
        }

        self.coins[0].reset(self.arena.coin_start(0));
        self.coins[1].reset(self.arena.coin_start(1));

        self.treasures.clear();
        let cells = self.arena.treasure_cells();
        for _ in 0..cfg.treasures_per_round {
            if cells.is_empty() {
                break;
            }
            let (row, col) = cells[self.rng.random_range(0..cells.len())];
            if self.treasures.iter().any(|t| t.row == row && t.col == col) {
                continue;
            }
            let id = self.next_entity_id();
            self.treasures.push(Treasure {
                id,
                row,
                col,
                carried_by: None,
            });
        }

        self.items = [None; 3];
        for kind in ItemKind::ALL {
            self.spawn_item(kind);
        }

        self.message = format!("Round start: {}'s turn", side_label(starting));
        self.push_event(GameEvent::RoundStart { side: starting });
        log::info!(
            "Round start: {} to act, match {}-{}",
            side_label(starting),
            self.match_wins[0],
            self.match_wins[1]
        );
    }

    /// Full match reset: counters, round state and (optionally) a new
    /// obstacle layout. Opening side is drawn from the RNG.
    pub fn reset(&mut self, cfg: &Config, new_layout: Option<ObstacleLayout>) {
        self.match_wins = [0, 0];
        self.match_over = false;
        if let Some(layout) = new_layout {
            self.arena.obstacles = layout.rects;
        }
        let starting = self.rng.random_range(0..2usize);
        self.start_round(cfg, starting);
        self.message = format!("Flip: {} starts!", side_label(starting));
    }

    /// Drop an item of `kind` onto a free cell, keeping clear of the
    /// treasure and the other items. Gives up quietly if the board is full.
    fn spawn_item(&mut self, kind: ItemKind) {
        let cells = self.arena.item_cells();
        if cells.is_empty() {
            return;
        }

        for _ in 0..MAX_SPAWN_ATTEMPTS {
            let (row, col) = cells[self.rng.random_range(0..cells.len())];
            let pos = self.arena.grid_to_px(row, col);

            let near_treasure = self
                .treasures
                .iter()
                .any(|t| self.treasure_pos(t).distance(pos) <= TREASURE_CLEARANCE);
            let near_item = self
                .items
                .iter()
                .flatten()
                .any(|i| self.item_pos(i).distance(pos) <= ITEM_CLEARANCE);

            if !near_treasure && !near_item {
                self.items[kind as usize] = Some(Item { kind, row, col });
                return;
            }
        }
    }

    // --- carry-relation transitions ------------------------------------

    /// A coin picks up a free treasure. Both sides of the relation mutate
    /// here and nowhere else. Returns whether an extra turn was granted.
    pub(crate) fn pick_up_treasure(&mut self, side: Side, treasure_idx: usize, cfg: &Config) -> bool {
        debug_assert!(self.coins[side].carrying.is_none());
        let t = &mut self.treasures[treasure_idx];
        debug_assert!(t.carried_by.is_none());

        t.carried_by = Some(side);
        self.coins[side].carrying = Some(t.id);

        let grant = !cfg.rules.extra_turn_requires_current_turn || side == self.turn;
        if grant {
            self.extra_turn = true;
            self.message = format!("{} picked treasure! (+extra turn)", side_label(side));
        } else {
            self.message = format!("{} picked treasure!", side_label(side));
        }
        self.push_event(GameEvent::TreasurePickup {
            side,
            extra_turn: grant,
        });
        grant
    }

    /// The current-turn coin takes the treasure off the defender. The
    /// transfer is atomic: both carrying fields and the back-reference move
    /// in one step.
    pub(crate) fn steal_treasure(&mut self) {
        let attacker = self.turn;
        let defender = other(attacker);
        let Some(id) = self.coins[defender].carrying.take() else {
            return;
        };
        if let Some(t) = self.treasures.iter_mut().find(|t| t.id == id) {
            t.carried_by = Some(attacker);
        }
        self.coins[attacker].carrying = Some(id);
        self.extra_turn = true;
        self.message = format!("{} stole! (+extra turn)", side_label(attacker));
        self.push_event(GameEvent::Steal { by: attacker });
    }

    /// A carrying coin reached its own base: bank the round, remove the
    /// treasure, and either close the match or open the next round.
    pub(crate) fn score(&mut self, side: Side, cfg: &Config) {
        let Some(id) = self.coins[side].carrying.take() else {
            return;
        };
        self.treasures.retain(|t| t.id != id);

        self.match_wins[side] += 1;
        let wins = self.match_wins[side];
        self.push_event(GameEvent::Score { side, wins });
        self.message = format!(
            "{} scored! Match {}-{}",
            side_label(side),
            self.match_wins[0],
            self.match_wins[1]
        );
        log::info!("{}", self.message);

        if wins >= cfg.rounds_to_win {
            self.match_over = true;
            self.phase = TurnPhase::Idle;
            self.message = format!("{} WINS THE MATCH!", side_label(side));
            self.push_event(GameEvent::MatchWon { side });
            log::info!("{}", self.message);
        } else {
            let starting = if cfg.rules.scorer_opens_next_round {
                side
            } else {
                other(side)
            };
            self.start_round(cfg, starting);
        }
    }
}
