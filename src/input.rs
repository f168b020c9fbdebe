//! Control input
//!
//! The simulation only understands `ControlEvent`s. Adapters turn raw host
//! input (key releases, accelerometer samples) into those events; the host
//! feeds them to the race between ticks.

use serde::{Deserialize, Serialize};

/// What a player asked a critter to do
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    /// Add coop boost
    AdvanceBoost,
    Jump,
    MoveLeft,
    MoveRight,
    /// Lateral nudge from device tilt (raw accelerometer x)
    Tilt(f32),
}

impl ControlAction {
    /// Parse a named action; `Tilt` carries data and has no name
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "advance" | "advance-boost" | "boost" => Some(ControlAction::AdvanceBoost),
            "jump" => Some(ControlAction::Jump),
            "left" | "move-left" => Some(ControlAction::MoveLeft),
            "right" | "move-right" => Some(ControlAction::MoveRight),
            _ => None,
        }
    }
}

/// A control action addressed to one critter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlEvent {
    pub entity: String,
    pub action: ControlAction,
}

impl ControlEvent {
    pub fn new(entity: impl Into<String>, action: ControlAction) -> Self {
        Self {
            entity: entity.into(),
            action,
        }
    }

    /// Build from untrusted strings; unknown actions yield `None`
    pub fn parse(entity: &str, action: &str) -> Option<Self> {
        ControlAction::from_str(action).map(|action| Self::new(entity, action))
    }
}

/// Source of control events, drained once per frame by the host
pub trait InputAdapter {
    fn poll_events(&mut self) -> Vec<ControlEvent>;
}

/// Keyboard mapping.
///
/// A letter key boosts every critter whose key starts with that letter.
/// Arrow keys and space steer the first critter in the roster.
#[derive(Debug, Clone, Default)]
pub struct KeyboardAdapter {
    keys: Vec<String>,
    pending: Vec<ControlEvent>,
}

impl KeyboardAdapter {
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            pending: Vec::new(),
        }
    }

    /// Handle a key release (`KeyboardEvent.key` naming)
    pub fn key_up(&mut self, key: &str) {
        let steer = match key {
            "ArrowLeft" => Some(ControlAction::MoveLeft),
            "ArrowRight" => Some(ControlAction::MoveRight),
            " " => Some(ControlAction::Jump),
            _ => None,
        };
        if let Some(action) = steer {
            if let Some(first) = self.keys.first() {
                self.pending.push(ControlEvent::new(first.clone(), action));
            }
            return;
        }

        let mut chars = key.chars();
        let (Some(letter), None) = (chars.next(), chars.next()) else {
            return;
        };
        for entity in &self.keys {
            let matches = entity
                .chars()
                .next()
                .is_some_and(|c| c.to_lowercase().eq(letter.to_lowercase()));
            if matches {
                self.pending
                    .push(ControlEvent::new(entity.clone(), ControlAction::AdvanceBoost));
            }
        }
    }
}

impl InputAdapter for KeyboardAdapter {
    fn poll_events(&mut self) -> Vec<ControlEvent> {
        std::mem::take(&mut self.pending)
    }
}

/// Device tilt: every sample nudges all critters sideways
#[derive(Debug, Clone, Default)]
pub struct TiltAdapter {
    keys: Vec<String>,
    pending: Vec<ControlEvent>,
}

impl TiltAdapter {
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            pending: Vec::new(),
        }
    }

    /// Accelerometer x including gravity
    pub fn sample(&mut self, accel_x: f32) {
        if !accel_x.is_finite() {
            return;
        }
        for key in &self.keys {
            self.pending
                .push(ControlEvent::new(key.clone(), ControlAction::Tilt(accel_x)));
        }
    }
}

impl InputAdapter for TiltAdapter {
    fn poll_events(&mut self) -> Vec<ControlEvent> {
        std::mem::take(&mut self.pending)
    }
}
