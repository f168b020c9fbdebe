//! Race state and core simulation types
//!
//! `RaceState` owns the track, every critter and the obstacle index. All
//! race operations go through it; there is no module-level state.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::layout::generate_obstacles;
use super::motion::Easing;
use super::spatial::ObstacleIndexCache;
use crate::error::RaceError;
use crate::settings::{EntityConfig, RaceConfig};

/// Salt separating the layout RNG stream from the race RNG stream
const LAYOUT_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// How critters are propelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceMode {
    /// Randomized autonomous advance
    Auto,
    /// Player boost drives each critter
    Coop,
}

impl RaceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RaceMode::Auto => "auto",
            RaceMode::Coop => "coop",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" | "autorace" => Some(RaceMode::Auto),
            "coop" | "co-op" => Some(RaceMode::Coop),
            _ => None,
        }
    }
}

/// Race lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RaceStatus {
    /// Critters lined up at the start
    #[default]
    NotStarted,
    /// No winner yet
    Running,
    /// Winner declared; stragglers still run to the line
    Ended,
}

/// Obstacle class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Blocking; makes critters jump
    Rock,
    /// Decoration only
    Bush,
}

impl ObstacleKind {
    pub fn is_blocking(&self) -> bool {
        matches!(self, ObstacleKind::Rock)
    }
}

/// A static obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub pos: Vec3,
}

impl Obstacle {
    pub fn new(kind: ObstacleKind, pos: Vec3) -> Self {
        Self { kind, pos }
    }
}

/// Track geometry and obstacle field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub length: f32,
    pub width: f32,
    pub obstacles: Vec<Obstacle>,
}

impl Track {
    pub fn blocking_count(&self) -> usize {
        self.obstacles.iter().filter(|o| o.kind.is_blocking()).count()
    }
}

/// Transient motion applied on top of normal advance
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MotionOverride {
    #[default]
    None,
    /// Airborne since `start_ms`; `carried` is forward carry applied so far
    Jumping { start_ms: f64, carried: f32 },
    /// Drifting laterally toward `target`
    Easing {
        target: f32,
        start_ms: f64,
        kind: Easing,
    },
}

/// Per-critter race outcome
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EntityStatus {
    #[default]
    Racing,
    /// Crossed first; flies away from `origin`
    Won { at_ms: f64, origin: Vec3 },
    /// Crossed after the winner; frozen
    Lost { at_ms: f64 },
}

/// One competitor
#[derive(Debug, Clone)]
pub struct Entity {
    pub config: EntityConfig,
    pub pos: Vec3,
    pub frame: u32,
    pub last_z: f32,
    pub motion: MotionOverride,
    pub status: EntityStatus,
    /// Coop propulsion, decays every tick
    pub boost: f32,
    /// When this critter fell behind the leader (catch-up timer)
    pub behind_since: Option<f64>,
}

impl Entity {
    pub fn new(config: EntityConfig, track_length: f32) -> Self {
        let mut entity = Self {
            config,
            pos: Vec3::ZERO,
            frame: 0,
            last_z: track_length,
            motion: MotionOverride::None,
            status: EntityStatus::Racing,
            boost: 0.0,
            behind_since: None,
        };
        entity.reset(track_length);
        entity
    }

    pub fn key(&self) -> &str {
        &self.config.key
    }

    /// Back to the start line with no pending timers
    pub fn reset(&mut self, track_length: f32) {
        self.pos = Vec3::new(self.config.x_offset, 0.0, track_length);
        self.frame = 0;
        self.last_z = track_length;
        self.motion = MotionOverride::None;
        self.status = EntityStatus::Racing;
        self.boost = 0.0;
        self.behind_since = None;
    }

    pub fn is_racing(&self) -> bool {
        matches!(self.status, EntityStatus::Racing)
    }

    pub fn is_airborne(&self) -> bool {
        matches!(self.motion, MotionOverride::Jumping { .. })
    }

    /// Take off; ignored while already airborne
    pub fn start_jump(&mut self, now: f64) -> bool {
        if self.is_airborne() {
            return false;
        }
        self.motion = MotionOverride::Jumping {
            start_ms: now,
            carried: 0.0,
        };
        true
    }

    /// Begin drifting toward `target`; airborne critters keep their jump
    pub fn drift_to(&mut self, target: f32, now: f64, kind: Easing) -> bool {
        if self.is_airborne() {
            return false;
        }
        self.motion = MotionOverride::Easing {
            target,
            start_ms: now,
            kind,
        };
        true
    }

    /// Pending lateral target, if any
    pub fn target_x(&self) -> Option<f32> {
        match self.motion {
            MotionOverride::Easing { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            key: self.config.key.clone(),
            x: self.pos.x,
            y: self.pos.y,
            z: self.pos.z,
            frame: self.frame,
            status: match self.status {
                EntityStatus::Racing => SnapshotStatus::Racing,
                EntityStatus::Won { .. } => SnapshotStatus::Won,
                EntityStatus::Lost { .. } => SnapshotStatus::Lost,
            },
        }
    }
}

/// Renderer-facing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    Racing,
    Won,
    Lost,
}

/// Plain per-tick view of one critter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub key: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub frame: u32,
    pub status: SnapshotStatus,
}

/// Things collaborators may react to (sounds, overlays, HUD text)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RaceEvent {
    Jumped { key: String },
    Collision { a: String, b: String },
    Won { key: String },
    Lost { key: String },
}

/// Complete race state
#[derive(Debug, Clone)]
pub struct RaceState {
    pub config: RaceConfig,
    pub track: Track,
    pub entities: Vec<Entity>,
    pub mode: Option<RaceMode>,
    pub status: RaceStatus,
    /// Index of the winning entity
    pub winner: Option<usize>,
    /// Entity indices in the order they crossed the line
    pub finish_order: Vec<usize>,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub obstacle_index: ObstacleIndexCache,
    pub(crate) rng: Pcg32,
}

impl RaceState {
    /// Build a race with a seeded random obstacle layout
    pub fn new(config: RaceConfig, roster: Vec<EntityConfig>) -> Result<Self, RaceError> {
        config.validate()?;
        let mut layout_rng = Pcg32::seed_from_u64(config.seed ^ LAYOUT_SALT);
        let obstacles = generate_obstacles(&config, &mut layout_rng);
        Self::with_obstacles(config, roster, obstacles)
    }

    /// Build a race on a hand-made obstacle field
    pub fn with_obstacles(
        config: RaceConfig,
        roster: Vec<EntityConfig>,
        obstacles: Vec<Obstacle>,
    ) -> Result<Self, RaceError> {
        config.validate()?;
        config.validate_roster(&roster)?;
        let obstacle_index = ObstacleIndexCache::build(&obstacles, &[config.obstacle_bucket()])?;
        let track = Track {
            length: config.track_length,
            width: config.track_width,
            obstacles,
        };
        let entities: Vec<Entity> = roster
            .into_iter()
            .map(|c| Entity::new(c, track.length))
            .collect();

        log::info!(
            "Race ready: track {}x{}, {} rocks, {} critters (seed {})",
            track.length,
            track.width,
            track.blocking_count(),
            entities.len(),
            config.seed
        );

        Ok(Self {
            rng: Pcg32::seed_from_u64(config.seed),
            config,
            track,
            entities,
            mode: None,
            status: RaceStatus::NotStarted,
            winner: None,
            finish_order: Vec::new(),
            time_ticks: 0,
            obstacle_index,
        })
    }

    /// Begin racing; no-op while a race is running
    pub fn start(&mut self, mode: RaceMode) -> bool {
        if self.status == RaceStatus::Running {
            return false;
        }
        if self.status == RaceStatus::Ended {
            // A finished race must be reset before the next one
            log::debug!("Start ignored: race already ended");
            return false;
        }
        self.mode = Some(mode);
        self.status = RaceStatus::Running;
        log::info!("Race started in {} mode", mode.as_str());
        true
    }

    /// Line everyone up again; obstacles stay where they are
    pub fn reset(&mut self) {
        let length = self.track.length;
        for entity in &mut self.entities {
            entity.reset(length);
        }
        self.mode = None;
        self.status = RaceStatus::NotStarted;
        self.winner = None;
        self.finish_order.clear();
        self.time_ticks = 0;
        log::info!("Race reset");
    }

    /// Replace the obstacle field; only allowed before a race starts.
    ///
    /// An ended race still has stragglers running, so it must be reset first.
    pub fn set_obstacles(&mut self, obstacles: Vec<Obstacle>) -> Result<(), RaceError> {
        if self.status != RaceStatus::NotStarted {
            return Err(RaceError::invalid("obstacles cannot change once a race has started"));
        }
        let index = ObstacleIndexCache::build(&obstacles, &[self.config.obstacle_bucket()])?;
        self.track.obstacles = obstacles;
        self.obstacle_index = index;
        Ok(())
    }

    /// First finisher; ignored once a winner exists
    pub fn declare_winner(&mut self, index: usize, now: f64) -> bool {
        if self.winner.is_some() {
            return false;
        }
        let Some(entity) = self.entities.get_mut(index) else {
            return false;
        };
        if !entity.is_racing() {
            return false;
        }
        entity.status = EntityStatus::Won {
            at_ms: now,
            origin: entity.pos,
        };
        entity.motion = MotionOverride::None;
        self.winner = Some(index);
        self.finish_order.push(index);
        self.status = RaceStatus::Ended;
        log::info!("{} won!", entity.config.key);
        true
    }

    /// Later finisher; needs an existing winner and a still-racing critter
    pub fn declare_loser(&mut self, index: usize, now: f64) -> bool {
        if self.winner.is_none() || self.winner == Some(index) {
            return false;
        }
        let Some(entity) = self.entities.get_mut(index) else {
            return false;
        };
        if !entity.is_racing() {
            return false;
        }
        entity.status = EntityStatus::Lost { at_ms: now };
        entity.motion = MotionOverride::None;
        self.finish_order.push(index);
        log::info!("{} finished", entity.config.key);
        true
    }

    pub fn is_running(&self) -> bool {
        self.status == RaceStatus::Running
    }

    /// Every critter has crossed the line
    pub fn is_resolved(&self) -> bool {
        self.status == RaceStatus::Ended && self.entities.iter().all(|e| !e.is_racing())
    }

    pub fn entity_index(&self, key: &str) -> Option<usize> {
        self.entities.iter().position(|e| e.config.key == key)
    }

    pub fn winner_key(&self) -> Option<&str> {
        self.winner.map(|i| self.entities[i].key())
    }

    /// Smallest z on the track (the leader's distance to the line)
    pub fn leader_z(&self) -> f32 {
        self.entities
            .iter()
            .map(|e| e.pos.z)
            .fold(f32::INFINITY, f32::min)
    }

    pub fn snapshots(&self) -> Vec<EntitySnapshot> {
        self.entities.iter().map(Entity::snapshot).collect()
    }
}
