//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Bounded timestep only
//! - Seeded RNG only
//! - Stable iteration order (by obstacle ID)
//! - No audio, speech or platform dependencies

pub mod collision;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{Outcome, crossed_hit_line, evaluate, in_collision_window};
pub use state::{GameState, GameStatus, Intent, Lane, Obstacle, Snapshot};
pub use tick::{IntentOutcome, TickEvent, TickInput, apply_intent, tick};
