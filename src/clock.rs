//! Frame clock with bounded deltas
//!
//! Converts a free-running timestamp stream into per-tick deltas, clamped so
//! a single stall (tab backgrounding, debugger pause) cannot produce a huge
//! simulated jump.

use crate::consts::{MAX_FRAME_MS, REFERENCE_FRAME_MS};

/// Tracks the last processed timestamp and hands out clamped deltas
#[derive(Debug, Default)]
pub struct Clock {
    last_ms: Option<f64>,
}

impl Clock {
    pub fn new() -> Self {
        Self { last_ms: None }
    }

    /// Delta since the previous step, clamped to [0, MAX_FRAME_MS].
    /// The very first step reports one reference frame.
    pub fn step(&mut self, now_ms: f64) -> f64 {
        let delta = match self.last_ms {
            Some(last) => (now_ms - last).clamp(0.0, MAX_FRAME_MS),
            None => REFERENCE_FRAME_MS,
        };
        self.last_ms = Some(now_ms);
        delta
    }

    /// Forget elapsed wall-clock time. Called on every transition into
    /// Running so the first post-resume delta is not inflated.
    pub fn reset(&mut self, now_ms: f64) {
        self.last_ms = Some(now_ms);
    }
}
