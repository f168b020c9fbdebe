//! Race standings and progress tracker
//!
//! Finishers first (in crossing order), then everyone still racing by
//! distance left to the line.

use serde::{Deserialize, Serialize};

use crate::sim::RaceState;

/// One row of the progress tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub key: String,
    /// Whole metres left to the line
    pub remaining: u32,
    /// Distance left as a fraction of the track (1.0 at the start, 0.0 at the line)
    pub ratio: f32,
    /// 1-based finishing place, once crossed
    pub place: Option<usize>,
}

impl Standing {
    pub fn finished(&self) -> bool {
        self.place.is_some()
    }

    /// Tracker caption: metres left, or "finished"
    pub fn label(&self) -> String {
        if self.finished() {
            "finished".to_string()
        } else {
            format!("{}m", self.remaining)
        }
    }
}

/// Ordered standings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Standings {
    pub entries: Vec<Standing>,
}

impl Standings {
    pub fn from_state(state: &RaceState) -> Self {
        let length = state.track.length;
        let mut entries: Vec<Standing> = state
            .entities
            .iter()
            .enumerate()
            .map(|(index, entity)| {
                let z = entity.pos.z.clamp(0.0, length);
                Standing {
                    key: entity.config.key.clone(),
                    remaining: z.floor() as u32,
                    ratio: z / length,
                    place: state
                        .finish_order
                        .iter()
                        .position(|&i| i == index)
                        .map(|p| p + 1),
                }
            })
            .collect();

        // Stable sort keeps roster order for ties
        entries.sort_by(|a, b| match (a.place, b.place) {
            (Some(pa), Some(pb)) => pa.cmp(&pb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.ratio.total_cmp(&b.ratio),
        });

        Self { entries }
    }

    /// Whoever is in front (the winner once there is one)
    pub fn leader(&self) -> Option<&Standing> {
        self.entries.first()
    }

    pub fn get(&self, key: &str) -> Option<&Standing> {
        self.entries.iter().find(|s| s.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{RaceConfig, default_roster};
    use crate::sim::RaceMode;

    fn race() -> RaceState {
        RaceState::with_obstacles(RaceConfig::default(), default_roster(), Vec::new()).unwrap()
    }

    #[test]
    fn test_orders_by_distance_left() {
        let mut state = race();
        state.entities[0].pos.z = 400.2;
        state.entities[1].pos.z = 120.9;
        let standings = Standings::from_state(&state);
        assert_eq!(standings.leader().map(|s| s.key.as_str()), Some("bulbasuck"));
        assert_eq!(standings.get("bulbasuck").map(|s| s.label()), Some("120m".to_string()));
        assert_eq!(standings.get("pikacute").map(|s| s.remaining), Some(400));
    }

    #[test]
    fn test_finishers_lead_in_crossing_order() {
        let mut state = race();
        state.start(RaceMode::Auto);
        state.entities[1].pos.z = 0.0;
        state.declare_winner(1, 10.0);
        state.entities[0].pos.z = 0.0;
        state.declare_loser(0, 20.0);

        let standings = Standings::from_state(&state);
        let keys: Vec<_> = standings.entries.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["bulbasuck", "pikacute"]);
        assert_eq!(standings.entries[0].place, Some(1));
        assert_eq!(standings.entries[1].label(), "finished");
        assert_eq!(standings.entries[1].ratio, 0.0);
    }

    #[test]
    fn test_fresh_race_is_all_at_start() {
        let standings = Standings::from_state(&race());
        assert_eq!(standings.len(), 2);
        assert!(standings.entries.iter().all(|s| s.ratio == 1.0 && !s.finished()));
    }
}
