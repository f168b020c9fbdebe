//! Motion primitives
//!
//! Pure functions from elapsed time to position offsets. Nothing here reads
//! a clock; callers pass the time since the triggering event.

use serde::{Deserialize, Serialize};

use crate::settings::RaceConfig;

/// Easing curve for lateral drift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    /// Slow, deliberate wander
    Linear,
    /// Fast snap used after a bump
    Exponential,
}

impl Easing {
    /// Curve value `elapsed_ms` after the drift started
    pub fn factor(&self, elapsed_ms: f64) -> f32 {
        let secs = (elapsed_ms.max(0.0) / 1000.0) as f32;
        match self {
            Easing::Linear => secs,
            Easing::Exponential => secs.exp2(),
        }
    }
}

/// Offset from the winning position after `t` seconds of victory flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightSample {
    pub dx: f32,
    pub dy: f32,
}

pub fn flight_trajectory(t: f32, config: &RaceConfig) -> FlightSample {
    FlightSample {
        dx: -config.fly_drift * t,
        dy: config.fly_rise * t + config.fly_wobble * (config.fly_wobble_freq * t).sin(),
    }
}

/// Jump state `t` seconds after take-off
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpSample {
    /// Cumulative forward carry since take-off
    pub dz: f32,
    /// Height above ground (negative once the arc is over)
    pub dy: f32,
}

impl JumpSample {
    pub fn landed(&self) -> bool {
        self.dy < 0.0
    }
}

pub fn jump_trajectory(t: f32, config: &RaceConfig) -> JumpSample {
    JumpSample {
        dz: config.jump_carry * t,
        dy: config.jump_height * (config.jump_frequency * t).sin(),
    }
}

/// Result of one easing step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EaseStep {
    pub value: f32,
    pub reached: bool,
}

/// Move `current` part of the way to `target`.
///
/// The fraction covered this tick is the easing factor over ten, capped at
/// the full remaining distance. Within `epsilon` the value snaps to target.
pub fn ease_toward_target(
    current: f32,
    target: f32,
    elapsed_ms: f64,
    easing: Easing,
    epsilon: f32,
) -> EaseStep {
    let fraction = (easing.factor(elapsed_ms) / 10.0).clamp(0.0, 1.0);
    let value = current + (target - current) * fraction;
    if (target - value).abs() <= epsilon {
        EaseStep {
            value: target,
            reached: true,
        }
    } else {
        EaseStep {
            value,
            reached: false,
        }
    }
}

/// Next animation frame; only moves when the critter actually went forward
#[inline]
pub fn advance_frame(frame: u32, max_frames: u32, last_z: f32, z: f32) -> u32 {
    if z < last_z && max_frames > 0 {
        (frame + 1) % max_frames
    } else {
        frame
    }
}
