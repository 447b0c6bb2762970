//! Moving body: integration, friction and bounce
//!
//! The physics is an arcade approximation: displace, then damp, then clamp
//! against walls and obstacles. Obstacle containment tests the coin's center
//! point only, not the full disc. Bounces are reported as events; the coin
//! never fires side effects itself.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::Config;

use super::arena::Arena;
use super::state::{GameEvent, Side};

/// A player-controlled disc
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub side: Side,
    /// Treasure id currently carried, if any
    pub carrying: Option<u32>,
    /// Speed is below the rest threshold; the coin counts as stationary
    pub resting: bool,
}

impl Coin {
    pub fn new(side: Side, pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
            side,
            carrying: None,
            resting: true,
        }
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Put the coin back at a round-start position
    pub fn reset(&mut self, pos: Vec2) {
        self.pos = pos;
        self.vel = Vec2::ZERO;
        self.resting = true;
        self.carrying = None;
    }

    /// Advance one tick: rest check, displacement, friction, then wall and
    /// obstacle response. Friction applies after displacement; the order is
    /// part of the contract.
    pub fn step(&mut self, cfg: &Config, arena: &Arena, events: &mut Vec<GameEvent>) {
        if self.vel.x.abs() < cfg.min_speed && self.vel.y.abs() < cfg.min_speed {
            self.vel = Vec2::ZERO;
            self.resting = true;
            return;
        }

        self.resting = false;
        self.pos += self.vel;
        self.vel *= cfg.friction;

        let k = cfg.restitution;

        // Each arena edge checked independently: a corner hit bounces twice
        if self.pos.x - self.radius < arena.margin {
            self.pos.x = arena.margin + self.radius;
            self.vel.x *= -k;
            events.push(GameEvent::WallBounce { side: self.side });
        }
        if self.pos.x + self.radius > arena.width - arena.margin {
            self.pos.x = arena.width - arena.margin - self.radius;
            self.vel.x *= -k;
            events.push(GameEvent::WallBounce { side: self.side });
        }
        if self.pos.y - self.radius < arena.margin {
            self.pos.y = arena.margin + self.radius;
            self.vel.y *= -k;
            events.push(GameEvent::WallBounce { side: self.side });
        }
        if self.pos.y + self.radius > arena.height - arena.margin {
            self.pos.y = arena.height - arena.margin - self.radius;
            self.vel.y *= -k;
            events.push(GameEvent::WallBounce { side: self.side });
        }

        // Center-point obstacle test; push out along the axis of least
        // penetration. Ties fall to the first axis in left/right/top/bottom
        // order.
        for rect in &arena.obstacles {
            if rect.contains(self.pos) {
                let pen_left = (rect.left() - (self.pos.x + self.radius)).abs();
                let pen_right = (rect.right() - (self.pos.x - self.radius)).abs();
                let pen_top = (rect.top() - (self.pos.y + self.radius)).abs();
                let pen_bottom = (rect.bottom() - (self.pos.y - self.radius)).abs();
                let m = pen_left.min(pen_right).min(pen_top).min(pen_bottom);

                if m == pen_left {
                    self.pos.x = rect.left() - self.radius;
                    self.vel.x *= -k;
                } else if m == pen_right {
                    self.pos.x = rect.right() + self.radius;
                    self.vel.x *= -k;
                } else if m == pen_top {
                    self.pos.y = rect.top() - self.radius;
                    self.vel.y *= -k;
                } else {
                    self.pos.y = rect.bottom() + self.radius;
                    self.vel.y *= -k;
                }
                events.push(GameEvent::ObstacleBounce { side: self.side });
            }
        }
    }
}
