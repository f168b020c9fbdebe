//! Collision detection and response
//!
//! Two checks per tick. A grounded critter that reaches a rock jumps over
//! it. Two critters whose boxes overlap get shoved apart laterally.

use glam::Vec3;

use super::motion::Easing;
use super::state::{Entity, RaceEvent, RaceState};

/// Axis-aligned overlap of two equal boxes centred on `a` and `b`
#[inline]
pub fn aabb_overlap(a: Vec3, b: Vec3, half_extent: f32) -> bool {
    let reach = 2.0 * half_extent;
    let d = (a - b).abs();
    d.x < reach && d.y < reach && d.z < reach
}

/// Lateral targets for a bumped pair: the one further left goes further left.
/// Ties push the first critter left.
#[inline]
pub fn push_targets(xa: f32, xb: f32, push_distance: f32) -> (f32, f32) {
    if xa <= xb {
        (xa - push_distance, xb + push_distance)
    } else {
        (xa + push_distance, xb - push_distance)
    }
}

/// Does this critter touch a rock right now? Airborne and finished critters never do.
pub fn touches_obstacle(state: &RaceState, entity: &Entity) -> bool {
    if !entity.is_racing() || entity.is_airborne() {
        return false;
    }
    state.obstacle_index.query(
        state.config.obstacle_bucket(),
        entity.pos,
        state.config.entity_size / 2.0,
    )
}

/// Start jumps for every critter touching a rock.
///
/// Returns, per entity, whether it hit a rock this tick (hit critters don't
/// advance on the tick they take off).
pub fn resolve_obstacle_collisions(
    state: &mut RaceState,
    now: f64,
    events: &mut Vec<RaceEvent>,
) -> Vec<bool> {
    let hits: Vec<bool> = {
        let view: &RaceState = state;
        view.entities
            .iter()
            .map(|e| touches_obstacle(view, e))
            .collect()
    };

    for (entity, &hit) in state.entities.iter_mut().zip(&hits) {
        if hit && entity.start_jump(now) {
            log::debug!("{} jumps a rock at z={:.1}", entity.key(), entity.pos.z);
            events.push(RaceEvent::Jumped {
                key: entity.key().to_string(),
            });
        }
    }

    hits
}

/// Shove apart every overlapping pair of racing critters
pub fn resolve_pair_collisions(state: &mut RaceState, now: f64, events: &mut Vec<RaceEvent>) {
    let half_extent = state.config.pair_half_extent();
    let push = state.config.push_distance;
    let n = state.entities.len();

    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (&state.entities[i], &state.entities[j]);
            if !a.is_racing() || !b.is_racing() || !aabb_overlap(a.pos, b.pos, half_extent) {
                continue;
            }

            let (target_a, target_b) = push_targets(a.pos.x, b.pos.x, push);
            log::debug!("{} bumped into {}", a.key(), b.key());
            events.push(RaceEvent::Collision {
                a: a.key().to_string(),
                b: b.key().to_string(),
            });

            state.entities[i].drift_to(target_a, now, Easing::Exponential);
            state.entities[j].drift_to(target_b, now, Easing::Exponential);
        }
    }
}
