//! Fixed timestep simulation tick
//!
//! Advances every critter by one step. Time is always passed in; nothing in
//! here reads a clock.

use rand::Rng;

use super::collision::{resolve_obstacle_collisions, resolve_pair_collisions};
use super::motion::{Easing, advance_frame, ease_toward_target, flight_trajectory, jump_trajectory};
use super::state::{EntityStatus, MotionOverride, RaceEvent, RaceMode, RaceState};
use crate::clamp_lateral;
use crate::input::{ControlAction, ControlEvent};
use crate::settings::RaceConfig;

/// Control events queued since the previous tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub events: Vec<ControlEvent>,
}

impl TickInput {
    pub fn new(events: Vec<ControlEvent>) -> Self {
        Self { events }
    }
}

/// Apply one control event between ticks.
///
/// Unknown critters, finished critters and actions that don't fit the
/// current mode are ignored.
pub fn apply_control(state: &mut RaceState, event: &ControlEvent, now: f64) {
    let Some(mode) = state.mode else {
        log::debug!("Ignoring {:?}: race not started", event);
        return;
    };
    let Some(index) = state.entity_index(&event.entity) else {
        log::debug!("Ignoring {:?}: unknown critter", event);
        return;
    };
    let config = &state.config;
    let entity = &mut state.entities[index];
    if !entity.is_racing() {
        return;
    }

    match (event.action, mode) {
        (ControlAction::Tilt(amount), _) if !amount.is_finite() => {
            log::debug!("Ignoring non-finite tilt for {}", entity.key());
        }
        (ControlAction::Tilt(amount), _) => {
            entity.pos.x = clamp_lateral(entity.pos.x + amount / config.tilt_divisor, config.half_width());
        }
        (ControlAction::AdvanceBoost, RaceMode::Coop) => {
            entity.boost += config.coop_boost;
        }
        (ControlAction::Jump, RaceMode::Coop) => {
            entity.start_jump(now);
        }
        (ControlAction::MoveLeft, RaceMode::Coop) | (ControlAction::MoveRight, RaceMode::Coop) => {
            let step = if event.action == ControlAction::MoveLeft {
                -config.move_step
            } else {
                config.move_step
            };
            let base = entity.target_x().unwrap_or(entity.pos.x);
            let target = clamp_lateral(base + step, config.wander_limit());
            entity.drift_to(target, now, Easing::Exponential);
        }
        (action, mode) => {
            log::debug!("Ignoring {:?} in {} mode", action, mode.as_str());
        }
    }
}

/// Advance the race by one fixed timestep
pub fn tick(state: &mut RaceState, input: &TickInput, now: f64) -> Vec<RaceEvent> {
    let mut events = Vec::new();

    for event in &input.events {
        apply_control(state, event, now);
    }

    // Nothing moves before the start
    let Some(mode) = state.mode else {
        return events;
    };

    state.time_ticks += 1;

    let blocked = resolve_obstacle_collisions(state, now, &mut events);
    resolve_pair_collisions(state, now, &mut events);

    let leader_z = state.leader_z();
    let mut finished = Vec::new();

    let RaceState {
        config,
        entities,
        rng,
        ..
    } = &mut *state;

    for (index, entity) in entities.iter_mut().enumerate() {
        match entity.status {
            EntityStatus::Won { at_ms, origin } => {
                let flight = flight_trajectory(seconds_since(now, at_ms), config);
                entity.pos.x = origin.x + flight.dx;
                entity.pos.y = origin.y + flight.dy;
                continue;
            }
            EntityStatus::Lost { .. } => continue,
            EntityStatus::Racing => {}
        }

        // Lateral drift or jump arc (mutually exclusive)
        match entity.motion {
            MotionOverride::Easing {
                target,
                start_ms,
                kind,
            } => {
                let step = ease_toward_target(
                    entity.pos.x,
                    target,
                    now - start_ms,
                    kind,
                    config.reached_epsilon,
                );
                entity.pos.x = step.value;
                if step.reached {
                    entity.motion = MotionOverride::None;
                }
            }
            MotionOverride::Jumping { start_ms, carried } => {
                let jump = jump_trajectory(seconds_since(now, start_ms), config);
                if jump.landed() {
                    entity.pos.y = 0.0;
                    entity.motion = MotionOverride::None;
                } else {
                    entity.pos.y = jump.dy;
                    entity.pos.z -= jump.dz - carried;
                    entity.motion = MotionOverride::Jumping {
                        start_ms,
                        carried: jump.dz,
                    };
                }
            }
            MotionOverride::None => {}
        }

        match mode {
            RaceMode::Auto => {
                if entity.motion == MotionOverride::None {
                    let target = wander_target(entity.pos.x, config, rng);
                    entity.drift_to(target, now, Easing::Linear);
                }

                let catching_up = update_catch_up(&mut entity.behind_since, entity.pos.z, leader_z, now, config);
                let advance = if catching_up {
                    config.max_advance
                } else {
                    roll_advance(config, rng)
                };
                if !blocked[index] {
                    entity.pos.z -= advance as f32;
                }
            }
            RaceMode::Coop => {
                entity.boost = (entity.boost - config.boost_decay).max(0.0);
                if !blocked[index] {
                    entity.pos.z -= entity.boost;
                }
            }
        }

        // Pushed and airborne critters may leave the lane briefly
        let free_lateral = matches!(
            entity.motion,
            MotionOverride::Jumping { .. }
                | MotionOverride::Easing {
                    kind: Easing::Exponential,
                    ..
                }
        );
        if !free_lateral {
            entity.pos.x = clamp_lateral(entity.pos.x, config.half_width());
        }
        entity.pos.z = entity.pos.z.clamp(0.0, config.track_length);

        entity.frame = advance_frame(entity.frame, entity.config.max_frames, entity.last_z, entity.pos.z);
        entity.last_z = entity.pos.z;

        if entity.pos.z <= 0.0 {
            finished.push(index);
        }
    }

    for index in finished {
        let key = state.entities[index].key().to_string();
        if state.winner.is_none() {
            if state.declare_winner(index, now) {
                events.push(RaceEvent::Won { key });
            }
        } else if state.declare_loser(index, now) {
            events.push(RaceEvent::Lost { key });
        }
    }

    events
}

#[inline]
fn seconds_since(now: f64, since: f64) -> f32 {
    ((now - since).max(0.0) / 1000.0) as f32
}

/// New lateral wander target around `x`, kept fully on the track
fn wander_target<R: Rng>(x: f32, config: &RaceConfig, rng: &mut R) -> f32 {
    let noise = if config.x_noise_max > 0.0 {
        rng.random_range(-config.x_noise_max..=config.x_noise_max)
    } else {
        0.0
    };
    clamp_lateral(x + noise, config.wander_limit())
}

/// Random per-tick advance in [min_advance, max_advance)
fn roll_advance<R: Rng>(config: &RaceConfig, rng: &mut R) -> u32 {
    if config.max_advance > config.min_advance {
        rng.random_range(config.min_advance..config.max_advance)
    } else {
        config.min_advance
    }
}

/// Track how long a critter has trailed the leader; true once it should sprint
fn update_catch_up(
    behind_since: &mut Option<f64>,
    z: f32,
    leader_z: f32,
    now: f64,
    config: &RaceConfig,
) -> bool {
    if z > leader_z {
        let since = *behind_since.get_or_insert(now);
        now - since > config.catch_up_timeout_ms
    } else {
        *behind_since = None;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT_MS;
    use crate::settings::EntityConfig;
    use crate::sim::state::{Obstacle, ObstacleKind, RaceStatus};
    use glam::Vec3;

    fn solo(config: RaceConfig) -> RaceState {
        let roster = vec![EntityConfig::new("solo", 0.0, 24, "red")];
        RaceState::with_obstacles(config, roster, Vec::new()).unwrap()
    }

    fn duo(config: RaceConfig) -> RaceState {
        let roster = vec![
            EntityConfig::new("pikacute", -30.0, 24, "#edaa3d"),
            EntityConfig::new("bulbasuck", 30.0, 23, "#468849"),
        ];
        RaceState::with_obstacles(config, roster, Vec::new()).unwrap()
    }

    #[test]
    fn test_tick_before_start_is_idle() {
        let mut state = duo(RaceConfig::default());
        let before = state.snapshots();
        let events = tick(&mut state, &TickInput::default(), 16.0);
        assert!(events.is_empty());
        assert_eq!(state.snapshots(), before);
        assert_eq!(state.time_ticks, 0);
    }

    #[test]
    fn test_auto_advance_within_range() {
        let mut state = solo(RaceConfig::default());
        state.start(RaceMode::Auto);
        let mut now = 0.0;
        for _ in 0..20 {
            let z = state.entities[0].pos.z;
            now += SIM_DT_MS;
            tick(&mut state, &TickInput::default(), now);
            let advanced = z - state.entities[0].pos.z;
            assert!(advanced >= state.config.min_advance as f32);
            assert!(advanced < state.config.max_advance as f32);
        }
    }

    #[test]
    fn test_coop_needs_boost() {
        let mut state = duo(RaceConfig::default());
        state.start(RaceMode::Coop);
        tick(&mut state, &TickInput::default(), 16.0);
        assert_eq!(state.entities[0].pos.z, state.track.length);

        let input = TickInput::new(vec![ControlEvent::new("pikacute", ControlAction::AdvanceBoost)]);
        tick(&mut state, &input, 32.0);
        let expected = state.track.length - (state.config.coop_boost - state.config.boost_decay);
        assert_eq!(state.entities[0].pos.z, expected);
        assert_eq!(state.entities[1].pos.z, state.track.length);

        // Boost runs out
        let mut now = 32.0;
        for _ in 0..100 {
            now += SIM_DT_MS;
            tick(&mut state, &TickInput::default(), now);
        }
        assert_eq!(state.entities[0].boost, 0.0);
        let parked = state.entities[0].pos.z;
        tick(&mut state, &TickInput::default(), now + SIM_DT_MS);
        assert_eq!(state.entities[0].pos.z, parked);
    }

    #[test]
    fn test_boost_ignored_in_auto_mode() {
        let mut state = duo(RaceConfig::default());
        state.start(RaceMode::Auto);
        let input = TickInput::new(vec![ControlEvent::new("pikacute", ControlAction::AdvanceBoost)]);
        tick(&mut state, &input, 16.0);
        assert_eq!(state.entities[0].boost, 0.0);
    }

    #[test]
    fn test_unknown_critter_is_ignored() {
        let mut state = duo(RaceConfig::default());
        state.start(RaceMode::Coop);
        let input = TickInput::new(vec![ControlEvent::new("mewthree", ControlAction::AdvanceBoost)]);
        tick(&mut state, &input, 16.0);
        assert!(state.entities.iter().all(|e| e.boost == 0.0));
    }

    #[test]
    fn test_coop_move_and_tilt() {
        let mut state = duo(RaceConfig::default());
        state.start(RaceMode::Coop);
        let input = TickInput::new(vec![ControlEvent::new("bulbasuck", ControlAction::MoveRight)]);
        tick(&mut state, &input, 16.0);
        assert_eq!(state.entities[1].target_x(), Some(30.0 + state.config.move_step));

        let input = TickInput::new(vec![ControlEvent::new("pikacute", ControlAction::Tilt(-50.0))]);
        tick(&mut state, &input, 32.0);
        assert_eq!(state.entities[0].pos.x, -35.0);
    }

    #[test]
    fn test_non_finite_tilt_is_ignored() {
        let mut state = duo(RaceConfig::default());
        state.start(RaceMode::Auto);
        for amount in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            apply_control(&mut state, &ControlEvent::new("pikacute", ControlAction::Tilt(amount)), 0.0);
            assert_eq!(state.entities[0].pos.x, -30.0);
        }

        let mut now = 0.0;
        for _ in 0..50 {
            now += SIM_DT_MS;
            tick(&mut state, &TickInput::default(), now);
        }
        assert!(state.entities.iter().all(|e| e.pos.x.is_finite()));
    }

    #[test]
    fn test_jump_arc_returns_to_ground() {
        let mut state = solo(RaceConfig::default());
        state.start(RaceMode::Coop);
        let input = TickInput::new(vec![ControlEvent::new("solo", ControlAction::Jump)]);
        tick(&mut state, &input, 0.0);
        assert!(state.entities[0].is_airborne());

        let mut now = 0.0;
        let mut peak: f32 = 0.0;
        for _ in 0..60 {
            now += SIM_DT_MS;
            tick(&mut state, &TickInput::default(), now);
            peak = peak.max(state.entities[0].pos.y);
        }
        assert!(peak > 0.0);
        assert_eq!(state.entities[0].pos.y, 0.0);
        assert!(!state.entities[0].is_airborne());
        // The hop carried the critter forward
        assert!(state.entities[0].pos.z < state.track.length);
    }

    #[test]
    fn test_rock_blocks_then_jumps_over() {
        let mut state = solo(RaceConfig {
            min_advance: 5,
            max_advance: 5,
            ..Default::default()
        });
        let z = state.track.length - 20.0;
        state
            .set_obstacles(vec![Obstacle::new(ObstacleKind::Rock, Vec3::new(0.0, 0.0, z))])
            .unwrap();
        state.start(RaceMode::Auto);

        let mut now = 0.0;
        let mut jumped = false;
        for _ in 0..40 {
            now += SIM_DT_MS;
            let before = state.entities[0].pos.z;
            let events = tick(&mut state, &TickInput::default(), now);
            if events.iter().any(|e| matches!(e, RaceEvent::Jumped { .. })) {
                jumped = true;
                // Take-off tick doesn't advance
                assert_eq!(state.entities[0].pos.z, before);
            }
        }
        assert!(jumped);
        assert!(state.entities[0].pos.z < z - 30.0);
    }

    #[test]
    fn test_winner_flies_and_loser_freezes() {
        let mut state = duo(RaceConfig::default());
        state.start(RaceMode::Auto);
        state.entities[0].pos.z = 1.0;
        let events = tick(&mut state, &TickInput::default(), 1000.0);
        assert!(events.contains(&RaceEvent::Won {
            key: "pikacute".to_string()
        }));
        assert_eq!(state.status, RaceStatus::Ended);

        let origin_y = state.entities[0].pos.y;
        tick(&mut state, &TickInput::default(), 1500.0);
        assert!(state.entities[0].pos.y > origin_y);

        state.entities[1].pos.z = 1.0;
        let events = tick(&mut state, &TickInput::default(), 1600.0);
        assert!(events.contains(&RaceEvent::Lost {
            key: "bulbasuck".to_string()
        }));
        let frozen = state.entities[1].snapshot();
        tick(&mut state, &TickInput::default(), 1700.0);
        assert_eq!(state.entities[1].snapshot(), frozen);
        assert!(state.is_resolved());
    }

    #[test]
    fn test_catch_up_sprints_after_timeout() {
        let mut state = duo(RaceConfig::default());
        state.start(RaceMode::Auto);
        let length = state.track.length;
        let mut now = 0.0;
        // Hold the second critter at the start past the timeout
        while now <= state.config.catch_up_timeout_ms + 100.0 {
            now += SIM_DT_MS;
            tick(&mut state, &TickInput::default(), now);
            state.entities[1].pos.z = length;
            state.entities[1].last_z = length;
        }
        assert!(state.entities[1].behind_since.is_some());

        now += SIM_DT_MS;
        tick(&mut state, &TickInput::default(), now);
        assert_eq!(length - state.entities[1].pos.z, state.config.max_advance as f32);
    }
}
