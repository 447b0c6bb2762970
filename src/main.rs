//! Flick Hunt entry point
//!
//! Headless demo driver: both sides automated, one match simulated at the
//! fixed tick rate with every game event logged. A rendering front end
//! would build its own loop around the same `tick` call.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use flick_hunt::config::Config;
use flick_hunt::consts::TICK_RATE;
use flick_hunt::sim::{GameEvent, GameState, ItemKind, ObstacleLayout, TickInput, tick};

/// Hard cap on demo length (10 sim-minutes); a match normally ends well
/// before this
const MAX_TICKS: u64 = 10 * 60 * TICK_RATE as u64;

fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xF11C_84A7);
    log::info!("Flick Hunt demo match, seed {seed}");

    let cfg = Config::load_or_default("flick-hunt.json");
    let layout = ObstacleLayout::load_random("maps", &cfg, &mut Pcg32::seed_from_u64(seed));

    let mut state = GameState::new(&cfg, layout, seed);
    state.set_automated(0, true);
    state.set_automated(1, true);

    let input = TickInput::default();
    while !state.match_over && state.time_ticks < MAX_TICKS {
        tick(&mut state, &input, &cfg);
        for event in state.take_events() {
            announce(&state, event);
        }
    }

    let secs = state.time_ticks as f32 / TICK_RATE as f32;
    println!(
        "Final: {} - {} after {:.1} sim-seconds ({})",
        state.match_wins[0], state.match_wins[1], secs, state.message
    );
}

fn announce(state: &GameState, event: GameEvent) {
    match event {
        // bounces are frequent; keep them out of the default log level
        GameEvent::WallBounce { side } => log::debug!("P{} hit a wall", side + 1),
        GameEvent::ObstacleBounce { side } => log::debug!("P{} hit an obstacle", side + 1),
        GameEvent::TreasurePickup { side, extra_turn } => {
            log::info!(
                "P{} grabbed the treasure{}",
                side + 1,
                if extra_turn { " (+extra turn)" } else { "" }
            );
        }
        GameEvent::Steal { by } => log::info!("P{} stole the treasure", by + 1),
        GameEvent::ItemPickup { side, kind } => {
            let name = match kind {
                ItemKind::ExtraTurn => "an extra turn",
                ItemKind::Stop => "a full stop",
                ItemKind::Redirect => "a redirect",
            };
            log::info!("P{} picked up {name}", side + 1);
        }
        GameEvent::Score { side, wins } => log::info!("P{} scored (now {wins})", side + 1),
        GameEvent::RoundStart { side } => log::info!("New round, P{} to act", side + 1),
        GameEvent::MatchWon { side } => log::info!("P{} wins the match: {}", side + 1, state.message),
    }
}
