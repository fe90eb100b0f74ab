//! Starbreak headless runner
//!
//! Drives the simulation with a simple autopilot so a whole run can be
//! watched from the log output: useful for balance passes and for smoke
//! testing the campaign end to end without a frontend.
//!
//! Usage: `starbreak [seed] [campaign.json] [tuning.json]`

use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec2;

use starbreak::consts::SIM_DT;
use starbreak::sim::{
    Campaign, EntityKind, GameEvent, GameState, RunPhase, TickInput, Tuning, tick,
};

/// Hard stop so a stalled run cannot loop forever
const MAX_SIM_SECS: f32 = 600.0;

fn load_json_arg<T: serde::de::DeserializeOwned>(path: Option<&str>) -> Option<T> {
    let path = path?;
    match std::fs::read_to_string(path) {
        Ok(json) => match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(err) => {
                log::error!("failed to parse {path}: {err}");
                None
            }
        },
        Err(err) => {
            log::error!("failed to read {path}: {err}");
            None
        }
    }
}

/// Steer at the nearest live target (shield first, then enemies) and hold
/// the trigger. Crude, but enough to clear the default campaign.
fn autopilot(state: &GameState) -> TickInput {
    let Some(player_pos) = state.player_id().and_then(|id| state.position_of(id)) else {
        return TickInput::default();
    };

    let mut target: Option<Vec2> = None;
    let mut best = f32::MAX;
    for entity in &state.entities {
        let wanted = match &entity.kind {
            EntityKind::Shield(station) => station.shield.is_active(),
            EntityKind::Enemy(ship) => !ship.vitals.is_dead(),
            _ => false,
        };
        if !wanted {
            continue;
        }
        if let Some(pos) = state.position_of(entity.id) {
            let dist = pos.distance_squared(player_pos);
            if dist < best {
                best = dist;
                target = Some(pos);
            }
        }
    }

    // Nothing left to shoot: head for the top of the map (the exit).
    let goal = target.unwrap_or_else(|| {
        let bounds = state.world.bounds();
        Vec2::new(bounds.center().x, bounds.max.y)
    });

    TickInput {
        move_dir: (goal - player_pos).normalize_or_zero(),
        brake: false,
        shoot_pressed: false,
        shoot_held: target.is_some(),
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let seed = args
        .get(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        });
    let campaign: Campaign = load_json_arg(args.get(2).map(String::as_str)).unwrap_or_default();
    let tuning: Tuning = load_json_arg(args.get(3).map(String::as_str)).unwrap_or_default();

    log::info!("starbreak headless run, seed {seed}");
    let mut state = GameState::new(seed, campaign, tuning);

    let mut ticks = 0u64;
    while state.phase == RunPhase::Playing && state.time < MAX_SIM_SECS {
        let input = autopilot(&state);
        tick(&mut state, &input, SIM_DT);
        ticks += 1;

        for event in &state.events {
            match event {
                GameEvent::LevelCompleted { level } => {
                    log::info!("[t={:.1}] level {level} cleared", state.time);
                }
                GameEvent::ShieldDeactivated { .. } => {
                    log::info!("[t={:.1}] shield destroyed", state.time);
                }
                _ => {}
            }
        }
    }

    let outcome = match state.phase {
        RunPhase::Won => "won",
        RunPhase::Lost => "lost",
        RunPhase::Playing => "timed out",
    };
    println!(
        "run {outcome}: score {} after {:.1}s ({ticks} ticks), seed {seed}",
        state.score, state.time
    );
}
