//! Deterministic simulation module
//!
//! All race logic lives here. This module must be pure and deterministic:
//! - Time is always an explicit argument
//! - Seeded RNG only
//! - Stable iteration order (roster order)
//! - No rendering or platform dependencies

pub mod clock;
pub mod collision;
pub mod layout;
pub mod motion;
pub mod spatial;
pub mod state;
pub mod tick;

pub use clock::{FrameClock, RaceLoop};
pub use collision::{aabb_overlap, push_targets};
pub use layout::generate_obstacles;
pub use motion::{
    EaseStep, Easing, FlightSample, JumpSample, advance_frame, ease_toward_target,
    flight_trajectory, jump_trajectory,
};
pub use spatial::{BucketSize, CellKey, ObstacleIndexCache, SpatialIndex, quantize};
pub use state::{
    Entity, EntitySnapshot, EntityStatus, MotionOverride, Obstacle, ObstacleKind, RaceEvent,
    RaceMode, RaceState, RaceStatus, SnapshotStatus, Track,
};
pub use tick::{TickInput, apply_control, tick};
