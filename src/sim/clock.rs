//! Fixed-rate step gate and race driver
//!
//! The host calls `RaceLoop::frame` from whatever callback it has (display
//! refresh, timer). The clock makes sure the race advances at most one step
//! per elapsed frame interval, so race speed doesn't depend on refresh rate.

use super::state::{RaceEvent, RaceState};
use super::tick::{TickInput, apply_control, tick};
use crate::input::ControlEvent;

/// Gate that lets one step through per elapsed frame interval
#[derive(Debug, Clone)]
pub struct FrameClock {
    interval_ms: f64,
    /// Timestamp the last step is accounted to (remainder carried forward)
    then: Option<f64>,
}

impl FrameClock {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            then: None,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// True if a step is due at `now`.
    ///
    /// The first call only primes the clock. A delta of exactly one interval
    /// counts as due, so exact-rate callbacks never lose a step to rounding.
    /// Time that didn't add up to a whole interval is carried into the next
    /// call.
    pub fn poll(&mut self, now: f64) -> bool {
        let Some(then) = self.then else {
            self.then = Some(now);
            return false;
        };
        let delta = now - then;
        if delta < 0.0 {
            // Clock went backwards; start counting again
            self.then = Some(now);
            return false;
        }
        if delta < self.interval_ms {
            return false;
        }
        self.then = Some(now - delta % self.interval_ms);
        true
    }

    pub fn reset(&mut self) {
        self.then = None;
    }
}

/// Race plus clock plus pending input
#[derive(Debug, Clone)]
pub struct RaceLoop {
    pub state: RaceState,
    clock: FrameClock,
    pending: TickInput,
}

impl RaceLoop {
    pub fn new(state: RaceState) -> Self {
        let clock = FrameClock::new(state.config.frame_interval_ms());
        Self {
            state,
            clock,
            pending: TickInput::default(),
        }
    }

    /// Queue an event for the next step
    pub fn queue(&mut self, event: ControlEvent) {
        self.pending.events.push(event);
    }

    /// Apply an event right away (between steps)
    pub fn handle(&mut self, event: &ControlEvent, now: f64) {
        apply_control(&mut self.state, event, now);
    }

    /// Host callback; returns the step's events if a step ran
    pub fn frame(&mut self, now: f64) -> Option<Vec<RaceEvent>> {
        if !self.clock.poll(now) {
            return None;
        }
        let input = std::mem::take(&mut self.pending);
        Some(tick(&mut self.state, &input, now))
    }

    /// Reset the race and drop anything still queued
    pub fn reset(&mut self) {
        self.state.reset();
        self.pending.events.clear();
        self.clock.reset();
    }
}
