//! Obstacle spawning policy
//!
//! Randomized intervals with an unbiased lane coin flip. Everything draws
//! from the state's seeded RNG so runs are reproducible.

use rand::Rng;

use super::state::{GameState, Lane, Obstacle};
use crate::consts::*;

/// Whether enough time has elapsed for the next spawn
pub fn should_spawn(elapsed_ms: f64, threshold_ms: f64) -> bool {
    elapsed_ms >= threshold_ms
}

/// Draw the threshold for the next spawn, uniform over the interval bounds
pub fn draw_interval<R: Rng>(rng: &mut R) -> f64 {
    rng.random_range(SPAWN_INTERVAL_MIN_MS..SPAWN_INTERVAL_MAX_MS)
}

/// Unbiased lane pick
pub fn draw_lane<R: Rng>(rng: &mut R) -> Lane {
    if rng.random_bool(0.5) {
        Lane::Left
    } else {
        Lane::Right
    }
}

/// Per-spawn speed, bounded so a clamped tick cannot tunnel the hit window
pub fn draw_speed<R: Rng>(rng: &mut R) -> f32 {
    rng.random_range(MIN_SPEED..=MAX_SPEED)
}

/// Append one obstacle at the off-screen spawn position and redraw the
/// spawn threshold. Returns the new obstacle's id.
pub fn spawn_obstacle(state: &mut GameState) -> u32 {
    let id = state.next_obstacle_id();
    let lane = draw_lane(&mut state.rng);
    let speed = draw_speed(&mut state.rng);
    state.obstacles.push(Obstacle {
        id,
        lane,
        position: SPAWN_POSITION,
        speed,
        scored: false,
    });
    state.since_spawn_ms = 0.0;
    state.spawn_threshold_ms = draw_interval(&mut state.rng);
    id
}
