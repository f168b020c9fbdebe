//! Critter Race entry point
//!
//! Headless native runner: plays one race on a virtual clock and prints the
//! result. Usage: `critter-race [auto|coop] [config.json]`

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use critter_race::settings::default_roster;
use critter_race::sim::{RaceLoop, RaceMode, RaceState};
use critter_race::{InputAdapter, KeyboardAdapter, RaceConfig, RaceError, Standings};

/// Host callback rate of the virtual display (Hz)
const DISPLAY_HZ: f64 = 144.0;
/// Give up after this much virtual time
const MAX_RACE_MS: f64 = 10.0 * 60.0 * 1000.0;

fn main() {
    env_logger::init();
    log::info!("Critter Race (native) starting...");

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), RaceError> {
    let mut args = std::env::args().skip(1);
    let mode = args
        .next()
        .map(|s| RaceMode::from_str(&s).ok_or_else(|| RaceError::InvalidConfig(format!("unknown mode '{s}'"))))
        .transpose()?
        .unwrap_or(RaceMode::Auto);
    let config = match args.next() {
        Some(path) => RaceConfig::load(path)?,
        None => RaceConfig::default(),
    };

    let roster = default_roster();
    let mut keyboard = KeyboardAdapter::new(roster.iter().map(|e| e.key.clone()));
    // Stand-in for the players mashing their keys in coop mode
    let mut players = Pcg32::seed_from_u64(config.seed.wrapping_add(1));

    let mut race = RaceLoop::new(RaceState::new(config, roster)?);
    race.state.start(mode);

    let frame_ms = 1000.0 / DISPLAY_HZ;
    let mut now = 0.0;
    while !race.state.is_resolved() && now < MAX_RACE_MS {
        now += frame_ms;

        if mode == RaceMode::Coop && players.random_bool(0.3) {
            let letter = if players.random_bool(0.5) { "p" } else { "b" };
            keyboard.key_up(letter);
        }
        for event in keyboard.poll_events() {
            race.handle(&event, now);
        }

        if let Some(events) = race.frame(now) {
            for event in events {
                log::debug!("{}", serde_json::to_string(&event).map_err(RaceError::Export)?);
            }
        }
    }

    if !race.state.is_resolved() {
        log::warn!("Race still open after {:.0}s of virtual time", now / 1000.0);
    }

    println!(
        "{} race finished after {} ticks ({:.1}s)",
        mode.as_str(),
        race.state.time_ticks,
        now / 1000.0
    );
    for standing in &Standings::from_state(&race.state).entries {
        println!("  {:<12} {}", standing.key, standing.label());
    }
    println!("{}", serde_json::to_string_pretty(&race.state.snapshots()).map_err(RaceError::Export)?);

    Ok(())
}
