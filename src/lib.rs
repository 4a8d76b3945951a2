//! Echo Dodge - an audio-first lane dodging game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, movement, collision, scoring)
//! - `audio`: Spatial stereo cues driven by obstacle positions
//! - `speech`: Spoken score and status announcements
//! - `engine`: Real-time glue (clock, intents, voice sync, freeze)

pub mod audio;
pub mod clock;
pub mod engine;
pub mod settings;
pub mod sim;
pub mod speech;

pub use engine::Engine;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Reference frame duration; obstacle speeds are expressed per 60 Hz frame
    pub const REFERENCE_FRAME_MS: f64 = 1000.0 / 60.0;
    /// Upper bound on a single clock delta, so a stalled tab cannot teleport
    /// obstacles past the hit zone
    pub const MAX_FRAME_MS: f64 = 100.0;

    /// Off-screen spawn position on the travel axis
    pub const SPAWN_POSITION: f32 = -50.0;
    /// Obstacles past this point are despawned
    pub const FIELD_LENGTH: f32 = 800.0;
    /// The player's position on the travel axis
    pub const HIT_LINE: f32 = 650.0;
    /// Collision window half-width around the hit line
    pub const HIT_MARGIN: f32 = 50.0;

    /// Obstacle speed bounds (units per reference frame).
    /// MAX_SPEED * (MAX_FRAME_MS / REFERENCE_FRAME_MS) must stay below
    /// HIT_MARGIN or a fast obstacle could tunnel through the collision
    /// window in a single clamped tick.
    pub const MIN_SPEED: f32 = 4.0;
    pub const MAX_SPEED: f32 = 8.0;

    /// Spawn interval bounds (ms); the threshold is redrawn after every spawn
    pub const SPAWN_INTERVAL_MIN_MS: f64 = 1500.0;
    pub const SPAWN_INTERVAL_MAX_MS: f64 = 4000.0;

    /// Announce the score every N points
    pub const SCORE_MILESTONE: u32 = 5;

    /// Audible window on the travel axis
    pub const ACTIVATION_START: f32 = 0.0;
    pub const ACTIVATION_END: f32 = HIT_LINE + HIT_MARGIN;
    /// Distance over which a voice fades between floor and peak gain
    pub const FADE_DISTANCE: f32 = 650.0;
    /// Gain bounds for obstacle voices
    pub const GAIN_FLOOR: f32 = 0.1;
    pub const GAIN_HIGH: f32 = 0.7;

    /// Unfreeze anyway if a speech completion never arrives
    pub const SPEECH_FREEZE_TIMEOUT_MS: f64 = 4000.0;
}

/// Convert a wall-clock delta (ms) into reference-frame units
#[inline]
pub fn normalize_dt(delta_ms: f64) -> f32 {
    (delta_ms / consts::REFERENCE_FRAME_MS) as f32
}

#[cfg(test)]
mod tests {
    use super::consts::*;
    use super::normalize_dt;

    #[test]
    fn test_normalize_dt_reference_frame() {
        assert!((normalize_dt(REFERENCE_FRAME_MS) - 1.0).abs() < 1e-6);
        assert!((normalize_dt(REFERENCE_FRAME_MS * 2.0) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_max_displacement_below_margin() {
        let max_step = MAX_SPEED * normalize_dt(MAX_FRAME_MS);
        assert!(max_step < HIT_MARGIN);
    }
}
