//! Opponent decision procedure
//!
//! A planner stands in for a missing second player. It idles through a
//! randomized deliberation delay, then picks a target by fixed priority
//! (score > attack > treasure > fallback attack), routes around obstacles,
//! nudges its aim off the opposing coin when not attacking it, and commits
//! a distance-scaled shot. The delay is counted in simulation ticks, so a
//! pending deliberation survives pauses and dies with the turn.

use glam::Vec2;
use rand::Rng;

use crate::config::Config;

use super::arena::Arena;
use super::geom::dist_point_to_segment;
use super::state::{GameState, Side, TurnPhase, other, side_label};

/// Per-side automation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Planner {
    /// When set, this side is machine-driven and ignores pointer input
    pub enabled: bool,
    thinking: bool,
    think_until: u64,
}

impl Planner {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            thinking: false,
            think_until: 0,
        }
    }

    /// Drop any pending deliberation (turn changed, round reset)
    pub fn cancel(&mut self) {
        self.thinking = false;
        self.think_until = 0;
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking
    }
}

/// What the planner is aiming for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AimMode {
    /// Carrying: head home
    Score,
    /// Ram the opposing coin
    Attack,
    /// Chase a free treasure
    Treasure,
}

/// Drive the automated side for one tick. Self-gating: does nothing unless
/// the turn belongs to an enabled planner, the board is settled and no
/// switch decision is pending.
pub fn update(state: &mut GameState, cfg: &Config) {
    if state.match_over {
        return;
    }
    let side = state.turn;

    // stale deliberations die the moment the turn moves on
    for s in 0..2 {
        if s != side {
            state.planners[s].cancel();
        }
    }

    if !state.planners[side].enabled || state.awaiting_switch() {
        return;
    }
    if !state.coins[side].resting {
        return;
    }

    // deliberation gate
    if !state.planners[side].thinking {
        let [lo, hi] = cfg.ai.think_ticks;
        let delay = state.rng_mut().random_range(lo..=hi) as u64;
        let planner = &mut state.planners[side];
        planner.thinking = true;
        planner.think_until = state.time_ticks + delay;
        state.message = format!("{} is thinking...", side_label(side));
        return;
    }
    if state.time_ticks < state.planners[side].think_until {
        return;
    }
    state.planners[side].cancel();

    // decide and shoot
    let (target, mode) = choose_target(state, cfg, side);
    let origin = state.coins[side].pos;
    let mut target = adjust_target_for_walls(&state.arena, cfg, origin, target);
    if mode != AimMode::Attack {
        target = adjust_target_to_avoid_opponent(state, cfg, side, target);
    }

    let mut delta = target - origin;
    if delta.length() < 1.0 {
        // zero-distance target: shove off in some direction
        delta = Vec2::new(
            state.rng_mut().random_range(-1.0..1.0),
            state.rng_mut().random_range(-0.5..0.5),
        );
    }
    let dist = delta.length();

    let base_power = (dist / cfg.ai.power_divisor).min(cfg.max_shot_power);
    let power = match mode {
        AimMode::Attack => (base_power + cfg.ai.attack_bonus).min(cfg.max_shot_power),
        AimMode::Score | AimMode::Treasure => base_power,
    };

    let coin = &mut state.coins[side];
    coin.vel = delta / dist * power;
    coin.resting = false;
    state.phase = TurnPhase::InFlight;
    state.message = match mode {
        AimMode::Attack => format!("{} attacks!", side_label(side)),
        AimMode::Score => format!("{} is going to base!", side_label(side)),
        AimMode::Treasure => format!("{} goes for treasure!", side_label(side)),
    };
}

/// Target priority, first match wins:
/// carrying → own base; opponent carrying → opponent (predicted);
/// free treasure → nearest one; otherwise → opponent.
pub fn choose_target(state: &GameState, cfg: &Config, side: Side) -> (Vec2, AimMode) {
    let me = &state.coins[side];
    let opp = &state.coins[other(side)];

    if state.treasures.iter().any(|t| t.carried_by == Some(side)) {
        return (state.arena.bases[side].rect.center(), AimMode::Score);
    }

    if state
        .treasures
        .iter()
        .any(|t| t.carried_by == Some(other(side)))
    {
        let predicted = opp.pos + opp.vel * cfg.ai.predict_frames;
        return (predicted, AimMode::Attack);
    }

    let nearest_free = state
        .treasures
        .iter()
        .filter(|t| t.carried_by.is_none())
        .map(|t| state.treasure_pos(t))
        .min_by(|a, b| {
            me.pos
                .distance(*a)
                .partial_cmp(&me.pos.distance(*b))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    if let Some(pos) = nearest_free {
        return (pos, AimMode::Treasure);
    }

    (opp.pos, AimMode::Attack)
}

fn line_blocked(arena: &Arena, a: Vec2, b: Vec2) -> bool {
    arena.obstacles.iter().any(|r| r.intersects_segment(a, b))
}

/// If the straight shot is blocked, detour via a corner of the blocking
/// rectangle (inflated by coin radius plus clearance), picking the reachable
/// corner that minimizes total path length. Falls back to the original
/// target when every corner is blocked too.
pub fn adjust_target_for_walls(arena: &Arena, cfg: &Config, origin: Vec2, target: Vec2) -> Vec2 {
    if !line_blocked(arena, origin, target) {
        return target;
    }

    let Some(blocker) = arena
        .obstacles
        .iter()
        .find(|r| r.intersects_segment(origin, target))
    else {
        return target;
    };

    let inflated = blocker.inflate(cfg.coin_radius + cfg.ai.detour_margin);
    let corners = [
        Vec2::new(inflated.left(), inflated.top()),
        Vec2::new(inflated.right(), inflated.top()),
        Vec2::new(inflated.left(), inflated.bottom()),
        Vec2::new(inflated.right(), inflated.bottom()),
    ];

    corners
        .into_iter()
        .filter(|c| {
            c.x > arena.margin
                && c.x < arena.width - arena.margin
                && c.y > arena.margin
                && c.y < arena.height - arena.margin
        })
        .filter(|&c| !line_blocked(arena, origin, c) && !line_blocked(arena, c, target))
        .min_by(|a, b| {
            let da = origin.distance(*a) + a.distance(target);
            let db = origin.distance(*b) + b.distance(target);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(target)
}

/// Shift the target sideways when the shot line passes too close to the
/// opposing coin (only used outside attack mode).
pub fn adjust_target_to_avoid_opponent(
    state: &GameState,
    cfg: &Config,
    side: Side,
    target: Vec2,
) -> Vec2 {
    let origin = state.coins[side].pos;
    let opp = &state.coins[other(side)];

    if dist_point_to_segment(opp.pos, origin, target) > opp.radius + cfg.ai.avoid_near {
        return target;
    }

    let offset = cfg.ai.avoid_offset;
    let candidates = [
        target + Vec2::new(offset, 0.0),
        target - Vec2::new(offset, 0.0),
        target + Vec2::new(0.0, offset),
        target - Vec2::new(0.0, offset),
    ];
    for c in candidates {
        if dist_point_to_segment(opp.pos, origin, c) > opp.radius + cfg.ai.avoid_clear
            && !line_blocked(&state.arena, origin, c)
        {
            return c;
        }
    }
    target
}
