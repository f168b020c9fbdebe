//! Track layout generation
//!
//! Rocks are scattered across the running surface, bushes line both verges.
//! Placement only depends on the RNG handed in, so a seed always produces
//! the same field.

use glam::Vec3;
use rand::Rng;

use super::state::{Obstacle, ObstacleKind};
use crate::settings::RaceConfig;

/// Generate rocks and bushes for a track
pub fn generate_obstacles<R: Rng>(config: &RaceConfig, rng: &mut R) -> Vec<Obstacle> {
    let mut obstacles = Vec::with_capacity((config.rock_count + config.bush_count) as usize);
    let length = config.track_length;

    // Rocks: anywhere across the surface, never on the final approach
    let max_x = (config.half_width() - config.verge_offset).max(0.0);
    if config.goal_offset < length {
        for _ in 0..config.rock_count {
            let x = if max_x > 0.0 {
                rng.random_range(-max_x..max_x)
            } else {
                0.0
            };
            let z = rng.random_range(config.goal_offset..length);
            obstacles.push(Obstacle::new(ObstacleKind::Rock, Vec3::new(x, 0.0, z)));
        }
    } else if config.rock_count > 0 {
        log::warn!(
            "Goal offset {} covers the whole track ({}), no rocks placed",
            config.goal_offset,
            length
        );
    }

    // Bushes: both verges, evenly split
    let verge_x = (config.half_width() - config.verge_offset / 2.0).max(0.0);
    let bush_span = (length - config.verge_offset * 2.0).max(0.0);
    for side in [-1.0, 1.0] {
        for _ in 0..config.bush_count {
            let z = if bush_span > 0.0 {
                config.verge_offset + rng.random_range(0.0..bush_span)
            } else {
                length / 2.0
            };
            obstacles.push(Obstacle::new(
                ObstacleKind::Bush,
                Vec3::new(side * verge_x, 0.0, z),
            ));
        }
    }

    log::info!(
        "Generated track layout: {} rocks, {} bushes",
        obstacles.iter().filter(|o| o.kind.is_blocking()).count(),
        obstacles.iter().filter(|o| !o.kind.is_blocking()).count()
    );

    obstacles
}
