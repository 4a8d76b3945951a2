//! Engine: real-time glue between clock, simulation, audio and speech
//!
//! Single-threaded cooperative model: the scheduler calls `frame` once per
//! display refresh; the input collaborator calls `handle_intent` between
//! frames. Exactly one tick runs per frame, and intents are atomic state
//! transformations, so no reader ever observes a half-updated snapshot.

use crate::audio::{AudioBackend, SpatialAudio};
use crate::clock::Clock;
use crate::consts::SPEECH_FREEZE_TIMEOUT_MS;
use crate::sim::state::{GameState, GameStatus, Intent, Snapshot};
use crate::sim::tick::{IntentOutcome, TickEvent, TickInput, apply_intent, tick};
use crate::speech::{Announcer, Priority, SpeechBackend, game_over_text, milestone_text, start_text};

pub struct Engine<A: AudioBackend, S: SpeechBackend> {
    state: GameState,
    clock: Clock,
    audio: SpatialAudio<A>,
    announcer: Announcer<S>,
    /// While Some, the world is frozen for an in-flight announcement; the
    /// value is the wall-clock deadline for the defensive unfreeze
    freeze_deadline: Option<f64>,
    /// Narrate lane switches and pause chatter, not just score and crash
    verbose_narration: bool,
    /// Cleared by `shutdown`; a dead engine ignores stray frames
    alive: bool,
}

impl<A: AudioBackend, S: SpeechBackend> Engine<A, S> {
    pub fn new(seed: u64, audio_backend: A, speech_backend: S) -> Self {
        log::info!("Engine created with seed {seed}");
        Self {
            state: GameState::new(seed),
            clock: Clock::new(),
            audio: SpatialAudio::new(audio_backend),
            announcer: Announcer::new(speech_backend),
            freeze_deadline: None,
            verbose_narration: true,
            alive: true,
        }
    }

    pub fn set_verbose_narration(&mut self, verbose: bool) {
        self.verbose_narration = verbose;
    }

    /// Apply one normalized intent between frames
    pub fn handle_intent(&mut self, intent: Intent, now_ms: f64) {
        if !self.alive {
            return;
        }
        match apply_intent(&mut self.state, intent) {
            IntentOutcome::Started => {
                // Full reset: prior voices, pending narration and any
                // outstanding freeze all go away
                self.audio.release_all();
                self.announcer.cancel_all();
                self.freeze_deadline = None;
                self.clock.reset(now_ms);
                log::info!("Run started (seed {})", self.state.seed);
                self.announcer.say(start_text(), Priority::High);
            }
            IntentOutcome::LaneSwitched(lane) => {
                if self.verbose_narration {
                    self.announcer.say(lane.as_str(), Priority::Low);
                }
            }
            IntentOutcome::Paused => {
                // Hold the hum silent while the world is stopped; voices are
                // rebuilt from the obstacle set on resume
                self.audio.release_all();
                if self.verbose_narration {
                    self.announcer.say("Paused", Priority::Low);
                }
            }
            IntentOutcome::Resumed => {
                self.clock.reset(now_ms);
                if self.verbose_narration {
                    self.announcer.say("Resumed", Priority::Low);
                }
            }
            IntentOutcome::Ignored => {}
        }
    }

    /// One scheduler callback: one clock step, one tick, one voice sync
    pub fn frame(&mut self, now_ms: f64) {
        if !self.alive {
            return;
        }
        let delta_ms = self.clock.step(now_ms);
        let frozen = self.update_freeze(now_ms);

        let events = tick(&mut self.state, &TickInput { frozen }, delta_ms);
        for event in &events {
            match event {
                TickEvent::Milestone { score } => {
                    // At most one freeze outstanding; and never freeze on an
                    // announcement the backend rejected
                    if self.freeze_deadline.is_none()
                        && self.announcer.say(&milestone_text(*score), Priority::High)
                    {
                        self.freeze_deadline = Some(now_ms + SPEECH_FREEZE_TIMEOUT_MS);
                    }
                }
                TickEvent::GameOver { score } => {
                    // World is over: silence it and report; no freeze, the
                    // sim is already inert in GameOver
                    self.audio.release_all();
                    self.freeze_deadline = None;
                    self.announcer.say(&game_over_text(*score), Priority::High);
                    log::info!("Game over with score {score}");
                }
                _ => {}
            }
        }

        if self.state.status == GameStatus::Running {
            self.audio.sync(&self.state.obstacles);
        }
    }

    /// Resolve the outstanding freeze, if any. Unfreezes on completion or,
    /// defensively, when the deadline passes without one (a dead speech
    /// subsystem must not hang the simulation).
    fn update_freeze(&mut self, now_ms: f64) -> bool {
        let completed = self.announcer.poll_completed();
        let Some(deadline) = self.freeze_deadline else {
            return false;
        };
        if completed {
            self.freeze_deadline = None;
            return false;
        }
        if now_ms >= deadline {
            log::warn!("Speech completion never arrived; unfreezing");
            self.freeze_deadline = None;
            return false;
        }
        true
    }

    /// Read-only view for the presentation layer
    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    pub fn status(&self) -> GameStatus {
        self.state.status
    }

    pub fn live_voices(&self) -> usize {
        self.audio.live_voices()
    }

    pub fn audio_backend_mut(&mut self) -> &mut A {
        self.audio.backend_mut()
    }

    /// Teardown: release every voice, cancel pending narration, and make
    /// stray frames and intents no-ops
    pub fn shutdown(&mut self) {
        if !self.alive {
            return;
        }
        self.audio.release_all();
        self.announcer.cancel_all();
        self.alive = false;
        log::info!("Engine shut down");
    }
}
