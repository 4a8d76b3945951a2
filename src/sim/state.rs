//! Game state and core simulation types

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::spawn;

/// Overall game status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Waiting for the first start intent
    Idle,
    /// Active gameplay, producing ticks
    Running,
    /// Ticks suppressed until resume
    Paused,
    /// Run ended by a collision
    GameOver,
}

/// One of the two travel lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lane {
    Left,
    Right,
}

impl Lane {
    pub fn other(self) -> Self {
        match self {
            Lane::Left => Lane::Right,
            Lane::Right => Lane::Left,
        }
    }

    /// Stereo position for this lane; lanes are binary, pan never interpolates
    pub fn pan(self) -> f32 {
        match self {
            Lane::Left => -1.0,
            Lane::Right => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lane::Left => "left",
            Lane::Right => "right",
        }
    }
}

/// Normalized player intents from the input collaborator.
/// The core never sees raw device events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    SwitchLane,
    TogglePause,
    Start,
    Restart,
}

/// A car approaching the player along the travel axis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub lane: Lane,
    /// Distance along the travel axis; strictly increasing
    pub position: f32,
    /// Units per reference frame, drawn per spawn
    pub speed: f32,
    /// Set exactly once, when the obstacle first crosses the hit line
    pub scored: bool,
}

/// Read-only obstacle view for the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct ObstacleView {
    pub id: u32,
    pub lane: Lane,
    pub position: f32,
}

/// Read-only state view handed to the presentation layer once per tick
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub status: GameStatus,
    pub score: u32,
    pub player_lane: Lane,
    pub obstacles: Vec<ObstacleView>,
}

/// Complete game state (deterministic)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub status: GameStatus,
    /// Monotonic; equals the count of scored transitions this run
    pub score: u32,
    pub player_lane: Lane,
    /// Active obstacles, ordered by id (ids never repeat within a run)
    pub obstacles: Vec<Obstacle>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Wall-clock ms accumulated since the last spawn
    pub since_spawn_ms: f64,
    /// Redrawn from the spawn interval bounds after every spawn
    pub spawn_threshold_ms: f64,
    /// Highest score value already announced, to keep milestones single-fire
    pub last_announced: u32,
    pub rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// Create an idle state with the given seed
    pub fn new(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let spawn_threshold_ms = spawn::draw_interval(&mut rng);
        Self {
            seed,
            status: GameStatus::Idle,
            score: 0,
            player_lane: Lane::Left,
            obstacles: Vec::new(),
            time_ticks: 0,
            since_spawn_ms: 0.0,
            spawn_threshold_ms,
            last_announced: 0,
            rng,
            next_id: 1,
        }
    }

    /// Full reset into Running: score 0, obstacles cleared, lane Left.
    /// Obstacle ids keep counting up so a post-restart id can never collide
    /// with a voice-table entry from the previous run.
    pub fn start(&mut self) {
        self.status = GameStatus::Running;
        self.score = 0;
        self.player_lane = Lane::Left;
        self.obstacles.clear();
        self.time_ticks = 0;
        self.since_spawn_ms = 0.0;
        self.spawn_threshold_ms = spawn::draw_interval(&mut self.rng);
        self.last_announced = 0;
    }

    /// Allocate a new obstacle ID
    pub fn next_obstacle_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            score: self.score,
            player_lane: self.player_lane,
            obstacles: self
                .obstacles
                .iter()
                .map(|o| ObstacleView {
                    id: o.id,
                    lane: o.lane,
                    position: o.position,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = GameState::new(7);
        assert_eq!(state.status, GameStatus::Idle);
        assert_eq!(state.score, 0);
        assert_eq!(state.player_lane, Lane::Left);
        assert!(state.obstacles.is_empty());
        assert!(state.spawn_threshold_ms >= SPAWN_INTERVAL_MIN_MS);
        assert!(state.spawn_threshold_ms < SPAWN_INTERVAL_MAX_MS);
    }

    #[test]
    fn test_start_resets_run() {
        let mut state = GameState::new(7);
        state.score = 12;
        state.player_lane = Lane::Right;
        let id = state.next_obstacle_id();
        state.obstacles.push(Obstacle {
            id,
            lane: Lane::Left,
            position: 100.0,
            speed: 5.0,
            scored: true,
        });
        state.last_announced = 10;

        state.start();
        assert_eq!(state.status, GameStatus::Running);
        assert_eq!(state.score, 0);
        assert_eq!(state.player_lane, Lane::Left);
        assert!(state.obstacles.is_empty());
        assert_eq!(state.last_announced, 0);
    }

    #[test]
    fn test_ids_survive_restart() {
        let mut state = GameState::new(7);
        let before = state.next_obstacle_id();
        state.start();
        assert!(state.next_obstacle_id() > before);
    }

    #[test]
    fn test_lane_pan_is_hard_left_right() {
        assert_eq!(Lane::Left.pan(), -1.0);
        assert_eq!(Lane::Right.pan(), 1.0);
        assert_eq!(Lane::Left.other(), Lane::Right);
    }
}
