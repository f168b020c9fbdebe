//! Race tuning and roster configuration
//!
//! Every numeric constant the simulation uses lives here so a race can be
//! retuned from a JSON file without recompiling.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::RaceError;
use crate::sim::BucketSize;

/// Per-critter setup (color and frame count are passed through to the renderer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Unique key (also drives keyboard mapping by first letter)
    pub key: String,
    /// Lateral start offset
    pub x_offset: f32,
    /// Animation frame count
    pub max_frames: u32,
    /// Display color, opaque to the simulation
    pub color: String,
}

impl EntityConfig {
    pub fn new(key: impl Into<String>, x_offset: f32, max_frames: u32, color: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            x_offset,
            max_frames,
            color: color.into(),
        }
    }
}

/// The two-critter roster the game ships with
pub fn default_roster() -> Vec<EntityConfig> {
    vec![
        EntityConfig::new("pikacute", -30.0, 24, "#edaa3d"),
        EntityConfig::new("bulbasuck", 30.0, 23, "#468849"),
    ]
}

/// Race tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// RNG seed for layout and auto-mode randomness
    pub seed: u64,
    /// Simulation steps per second
    pub target_fps: f64,

    // === Track ===
    pub track_length: f32,
    pub track_width: f32,
    /// Visual size of a critter
    pub entity_size: f32,
    pub rock_count: u32,
    pub bush_count: u32,
    pub goal_offset: f32,
    pub verge_offset: f32,

    // === Auto mode ===
    pub min_advance: u32,
    pub max_advance: u32,
    pub x_noise_max: f32,
    pub catch_up_timeout_ms: f64,

    // === Coop mode ===
    pub coop_boost: f32,
    pub boost_decay: f32,
    pub move_step: f32,
    pub tilt_divisor: f32,

    // === Collisions ===
    pub push_distance: f32,
    /// Pair-collision half extent (fraction of entity size)
    pub pair_extent_ratio: f32,
    pub reached_epsilon: f32,

    // === Motion curves ===
    pub jump_height: f32,
    pub jump_frequency: f32,
    pub jump_carry: f32,
    pub fly_drift: f32,
    pub fly_rise: f32,
    pub fly_wobble: f32,
    pub fly_wobble_freq: f32,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            target_fps: TARGET_FPS,

            track_length: TRACK_LENGTH,
            track_width: TRACK_WIDTH,
            entity_size: ENTITY_SIZE,
            rock_count: ROCK_COUNT,
            bush_count: BUSH_COUNT,
            goal_offset: GOAL_OFFSET,
            verge_offset: VERGE_OFFSET,

            min_advance: MIN_ADVANCE,
            max_advance: MAX_ADVANCE,
            x_noise_max: X_NOISE_MAX,
            catch_up_timeout_ms: CATCH_UP_TIMEOUT_MS,

            coop_boost: COOP_BOOST,
            boost_decay: BOOST_DECAY,
            move_step: MOVE_STEP,
            tilt_divisor: TILT_DIVISOR,

            push_distance: PUSH_DISTANCE,
            pair_extent_ratio: PAIR_EXTENT_RATIO,
            reached_epsilon: REACHED_EPSILON,

            jump_height: JUMP_HEIGHT,
            jump_frequency: JUMP_FREQUENCY,
            jump_carry: JUMP_CARRY,
            fly_drift: FLY_DRIFT,
            fly_rise: FLY_RISE,
            fly_wobble: FLY_WOBBLE,
            fly_wobble_freq: FLY_WOBBLE_FREQ,
        }
    }
}

impl RaceConfig {
    /// Parse a config from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, RaceError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RaceError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded race config from {}", path.display());
        Ok(config)
    }

    /// Half the track width (lateral clamp)
    pub fn half_width(&self) -> f32 {
        self.track_width / 2.0
    }

    /// Lateral limit for wander targets (the whole critter stays on track)
    pub fn wander_limit(&self) -> f32 {
        (self.half_width() - self.entity_size / 2.0).max(0.0)
    }

    /// Half extent of the critter-vs-critter bounding box
    pub fn pair_half_extent(&self) -> f32 {
        self.entity_size * self.pair_extent_ratio
    }

    /// Bucket granularity for obstacle proximity queries
    pub fn obstacle_bucket(&self) -> BucketSize {
        BucketSize::uniform(self.entity_size)
    }

    /// Milliseconds per simulation step
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.target_fps
    }

    /// Reject values that would make the race unrunnable
    pub fn validate(&self) -> Result<(), RaceError> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(RaceError::invalid(format!("{name} must be positive, got {v}")))
            }
        };
        let non_negative = |name: &str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(RaceError::invalid(format!("{name} must not be negative, got {v}")))
            }
        };

        positive("target_fps", self.target_fps)?;
        positive("track_length", self.track_length.into())?;
        positive("track_width", self.track_width.into())?;
        positive("entity_size", self.entity_size.into())?;
        positive("tilt_divisor", self.tilt_divisor.into())?;
        // Zero frequency never brings a jump back down
        positive("jump_frequency", self.jump_frequency.into())?;

        non_negative("goal_offset", self.goal_offset.into())?;
        non_negative("verge_offset", self.verge_offset.into())?;
        non_negative("x_noise_max", self.x_noise_max.into())?;
        non_negative("catch_up_timeout_ms", self.catch_up_timeout_ms)?;
        non_negative("coop_boost", self.coop_boost.into())?;
        non_negative("boost_decay", self.boost_decay.into())?;
        non_negative("move_step", self.move_step.into())?;
        non_negative("push_distance", self.push_distance.into())?;
        non_negative("pair_extent_ratio", self.pair_extent_ratio.into())?;
        non_negative("reached_epsilon", self.reached_epsilon.into())?;
        non_negative("jump_height", self.jump_height.into())?;
        non_negative("jump_carry", self.jump_carry.into())?;

        for (name, v) in [
            ("fly_drift", self.fly_drift),
            ("fly_rise", self.fly_rise),
            ("fly_wobble", self.fly_wobble),
            ("fly_wobble_freq", self.fly_wobble_freq),
        ] {
            if !v.is_finite() {
                return Err(RaceError::invalid(format!("{name} must be finite, got {v}")));
            }
        }

        // Catch-up sprints at max_advance, so it must move critters
        if self.max_advance == 0 {
            return Err(RaceError::invalid("max_advance must be at least 1"));
        }
        if self.max_advance < self.min_advance {
            return Err(RaceError::invalid(format!(
                "max_advance ({}) is below min_advance ({})",
                self.max_advance, self.min_advance
            )));
        }
        Ok(())
    }

    /// Check a roster against this config
    pub fn validate_roster(&self, roster: &[EntityConfig]) -> Result<(), RaceError> {
        if roster.is_empty() {
            return Err(RaceError::invalid("a race needs at least one entity"));
        }
        let mut seen = HashSet::new();
        for entity in roster {
            if entity.max_frames == 0 {
                return Err(RaceError::invalid(format!(
                    "entity '{}' has zero animation frames",
                    entity.key
                )));
            }
            if !entity.x_offset.is_finite() {
                return Err(RaceError::invalid(format!(
                    "entity '{}' has a non-finite start offset",
                    entity.key
                )));
            }
            if !seen.insert(entity.key.as_str()) {
                return Err(RaceError::invalid(format!("duplicate entity key '{}'", entity.key)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RaceConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.validate_roster(&default_roster()).is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RaceConfig::from_json(r#"{ "track_length": 500.0, "seed": 7 }"#).unwrap();
        assert_eq!(config.track_length, 500.0);
        assert_eq!(config.seed, 7);
        assert_eq!(config.track_width, TRACK_WIDTH);
    }

    #[test]
    fn test_rejects_non_positive_track() {
        let config = RaceConfig {
            track_length: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RaceError::InvalidConfig(_))));

        let result = RaceConfig::from_json(r#"{ "track_width": -5.0 }"#);
        assert!(matches!(result, Err(RaceError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_json() {
        let result = RaceConfig::from_json("{ not json");
        assert!(matches!(result, Err(RaceError::ConfigParse(_))));
    }

    #[test]
    fn test_rejects_inverted_advance_range() {
        let config = RaceConfig {
            min_advance: 5,
            max_advance: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_stalled_advance() {
        let config = RaceConfig {
            min_advance: 0,
            max_advance: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RaceError::InvalidConfig(_))));

        let config = RaceConfig {
            min_advance: 0,
            max_advance: 1,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_flat_jump() {
        for jump_frequency in [0.0, -1.0, f32::NAN] {
            let config = RaceConfig {
                jump_frequency,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(RaceError::InvalidConfig(_))),
                "jump_frequency = {jump_frequency}"
            );
        }
    }

    #[test]
    fn test_rejects_negative_or_nan_tuning() {
        let bad = [
            RaceConfig {
                push_distance: -1.0,
                ..Default::default()
            },
            RaceConfig {
                pair_extent_ratio: f32::NAN,
                ..Default::default()
            },
            RaceConfig {
                coop_boost: -6.0,
                ..Default::default()
            },
            RaceConfig {
                catch_up_timeout_ms: f64::NAN,
                ..Default::default()
            },
            RaceConfig {
                catch_up_timeout_ms: -1.0,
                ..Default::default()
            },
            RaceConfig {
                fly_rise: f32::INFINITY,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(RaceError::InvalidConfig(_))));
        }

        let result = RaceConfig::from_json(r#"{ "push_distance": -20.0 }"#);
        assert!(matches!(result, Err(RaceError::InvalidConfig(_))));
    }

    #[test]
    fn test_roster_checks() {
        let config = RaceConfig::default();
        assert!(config.validate_roster(&[]).is_err());

        let dupes = vec![
            EntityConfig::new("a", 0.0, 4, "red"),
            EntityConfig::new("a", 5.0, 4, "blue"),
        ];
        assert!(config.validate_roster(&dupes).is_err());

        let no_frames = vec![EntityConfig::new("a", 0.0, 0, "red")];
        assert!(config.validate_roster(&no_frames).is_err());
    }
}
