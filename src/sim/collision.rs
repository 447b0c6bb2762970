//! Coin-on-coin collision response
//!
//! Equal-mass elastic bounce with symmetric position correction. Coincident
//! centers have no defined normal and are left alone; bodies already
//! separating get the position fix but no impulse, which is what stops them
//! from sticking together.

use super::coin::Coin;

/// Separate two overlapping coins and exchange impulse along the contact
/// normal. No-op unless the discs actually overlap.
pub fn resolve_coin_collision(a: &mut Coin, b: &mut Coin, restitution: f32) {
    let delta = b.pos - a.pos;
    let dist = delta.length();
    let min_dist = a.radius + b.radius;
    if dist == 0.0 || dist >= min_dist {
        return;
    }

    let normal = delta / dist;
    let overlap = min_dist - dist;
    a.pos -= normal * overlap * 0.5;
    b.pos += normal * overlap * 0.5;

    let rel_vel = b.vel - a.vel;
    let vel_along_normal = rel_vel.dot(normal);
    if vel_along_normal > 0.0 {
        return;
    }

    // equal masses: the impulse splits evenly
    let j = -(1.0 + restitution) * vel_along_normal / 2.0;
    let impulse = normal * j;
    a.vel -= impulse;
    b.vel += impulse;
}
