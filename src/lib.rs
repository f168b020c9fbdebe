//! Critter Race - simulation core for a multi-critter obstacle race
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion, collisions, race state machine)
//! - `input`: Control events and adapters from raw key/tilt input
//! - `standings`: Progress tracker and finishing order
//! - `settings`: Data-driven race tuning
//! - `error`: Setup errors

pub mod error;
pub mod input;
pub mod settings;
pub mod sim;
pub mod standings;

pub use error::RaceError;
pub use input::{ControlAction, ControlEvent, InputAdapter, KeyboardAdapter, TiltAdapter};
pub use settings::{EntityConfig, RaceConfig};
pub use standings::{Standing, Standings};

/// Race configuration constants (defaults for `RaceConfig`)
pub mod consts {
    /// Target simulation rate (steps per second)
    pub const TARGET_FPS: f64 = 60.0;
    /// Milliseconds per simulation step at the target rate
    pub const SIM_DT_MS: f64 = 1000.0 / TARGET_FPS;

    /// Track dimensions
    pub const TRACK_LENGTH: f32 = 750.0;
    pub const TRACK_WIDTH: f32 = 300.0;
    /// Visual size of a critter (width, height and depth of its box)
    pub const ENTITY_SIZE: f32 = 30.0;

    /// Auto-mode advance per tick, drawn from [MIN_ADVANCE, MAX_ADVANCE)
    pub const MIN_ADVANCE: u32 = 1;
    pub const MAX_ADVANCE: u32 = 11;
    /// Maximum lateral wander per new wander target
    pub const X_NOISE_MAX: f32 = 20.0;
    /// Time behind the leader before catch-up kicks in (ms)
    pub const CATCH_UP_TIMEOUT_MS: f64 = 2000.0;

    /// Coop boost added per advance-boost event
    pub const COOP_BOOST: f32 = 6.0;
    /// Boost decay per tick
    pub const BOOST_DECAY: f32 = 1.0;
    /// Lateral step for move-left/move-right events
    pub const MOVE_STEP: f32 = 15.0;
    /// Tilt sample divisor (x += tilt / divisor)
    pub const TILT_DIVISOR: f32 = 10.0;

    /// Push-apart distance after a critter bump
    pub const PUSH_DISTANCE: f32 = 20.0;
    /// Pair-collision half extent as a fraction of entity size
    pub const PAIR_EXTENT_RATIO: f32 = 0.4;
    /// Easing is done once within this distance of the target
    pub const REACHED_EPSILON: f32 = 0.25;

    /// Jump: y = JUMP_HEIGHT * sin(JUMP_FREQUENCY * t), forward carry per second
    pub const JUMP_HEIGHT: f32 = 40.0;
    pub const JUMP_FREQUENCY: f32 = 2.0 * std::f32::consts::PI;
    pub const JUMP_CARRY: f32 = 60.0;

    /// Victory flight: dx = -FLY_DRIFT * t, dy = FLY_RISE * t + FLY_WOBBLE * sin(FLY_WOBBLE_FREQ * t)
    pub const FLY_DRIFT: f32 = 20.0;
    pub const FLY_RISE: f32 = 130.0;
    pub const FLY_WOBBLE: f32 = 5.0;
    pub const FLY_WOBBLE_FREQ: f32 = 20.0;

    /// Track layout
    pub const ROCK_COUNT: u32 = 20;
    pub const BUSH_COUNT: u32 = 20;
    /// Rocks are never placed within this distance of the finish line
    pub const GOAL_OFFSET: f32 = 100.0;
    /// Distance between track edge and obstacles/verges
    pub const VERGE_OFFSET: f32 = 16.0;
}

/// Clamp a lateral position to the track half-width
#[inline]
pub fn clamp_lateral(x: f32, half_width: f32) -> f32 {
    x.clamp(-half_width, half_width)
}
