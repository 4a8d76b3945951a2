//! Collision and scoring evaluation
//!
//! Pure functions over an obstacle's pre- and post-advance positions.
//! Both scoring and collision use crossing detection against the same tick,
//! never "position is past the line", so large clamped deltas can neither
//! skip a point nor tunnel through the hit window.

use super::state::Lane;

/// Verdict for one obstacle on one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    None,
    /// Obstacle crossed the hit line in the opposite lane
    Score,
    /// Obstacle occupies the hit window in the player's lane
    Collision,
}

/// Crossing detection: the hit line was passed during this tick (p0 < H <= p1)
pub fn crossed_hit_line(p0: f32, p1: f32, hit_line: f32) -> bool {
    p0 < hit_line && hit_line <= p1
}

/// Whether a position lies inside the symmetric window around the hit line
pub fn in_collision_window(position: f32, hit_line: f32, margin: f32) -> bool {
    hit_line - margin < position && position < hit_line + margin
}

/// Evaluate one obstacle for one tick. Collision takes precedence over
/// scoring: an obstacle that reaches the player's lane crashes, it does not
/// score. `scored` guarantees the score trigger is single-fire.
pub fn evaluate(
    lane: Lane,
    scored: bool,
    p0: f32,
    p1: f32,
    player_lane: Lane,
    hit_line: f32,
    margin: f32,
) -> Outcome {
    if lane == player_lane {
        let inside = in_collision_window(p1, hit_line, margin);
        // Full traversal in one tick; unreachable with the shipped speed
        // bounds but kept so the evaluator is safe under any tuning
        let tunneled = p0 <= hit_line - margin && p1 >= hit_line + margin;
        if inside || tunneled {
            return Outcome::Collision;
        }
    }
    if !scored && crossed_hit_line(p0, p1, hit_line) {
        return Outcome::Score;
    }
    Outcome::None
}
