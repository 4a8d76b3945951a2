//! Announcer: spoken score and status narration
//!
//! A narrow interrupt channel over the platform speech synthesizer. High
//! priority cancels whatever is in flight (collision report); Low is
//! best-effort (lane names, pause chatter). Completion is polled by the
//! engine once per frame to drive the simulation freeze.

/// Narration priority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Cancel any in-flight utterance and speak immediately
    High,
    /// Best-effort
    Low,
}

/// Platform speech synthesizer.
///
/// `speak` returns whether the utterance was accepted; an unavailable
/// synthesizer rejects everything and the game simply plays unnarrated.
pub trait SpeechBackend {
    fn speak(&mut self, text: &str, cancel_previous: bool) -> bool;
    fn cancel_all(&mut self);
    /// Edge-triggered: true once after an accepted utterance finishes
    fn take_completed(&mut self) -> bool;
}

/// Announcement channel with completion tracking
pub struct Announcer<S: SpeechBackend> {
    backend: S,
    pending: bool,
}

impl<S: SpeechBackend> Announcer<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            pending: false,
        }
    }

    /// Speak; returns false when the backend rejected the utterance, so the
    /// caller knows not to wait for a completion that will never come
    pub fn say(&mut self, text: &str, priority: Priority) -> bool {
        let accepted = self
            .backend
            .speak(text, matches!(priority, Priority::High));
        if accepted {
            self.pending = true;
        }
        accepted
    }

    /// True exactly once when the most recent accepted utterance finishes
    pub fn poll_completed(&mut self) -> bool {
        if self.pending && self.backend.take_completed() {
            self.pending = false;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Cancel everything in flight (teardown, restart)
    pub fn cancel_all(&mut self) {
        self.backend.cancel_all();
        self.pending = false;
    }
}

// Announcement texts, kept in one place so they stay consistent

pub fn milestone_text(score: u32) -> String {
    format!("Score {score}")
}

pub fn game_over_text(score: u32) -> String {
    format!("Crash! Game over. Final score {score}.")
}

pub fn start_text() -> &'static str {
    "Go! Arrow keys to switch lanes."
}

#[cfg(target_arch = "wasm32")]
pub use web::WebSpeechBackend;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::Cell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::Closure;
    use web_sys::{SpeechSynthesis, SpeechSynthesisUtterance};

    use super::SpeechBackend;

    /// Web Speech implementation. A missing synthesizer (no window, no
    /// speechSynthesis) rejects all utterances.
    pub struct WebSpeechBackend {
        synth: Option<SpeechSynthesis>,
        /// Set by the utterance end callback, drained by `take_completed`
        done: Rc<Cell<bool>>,
        rate: f32,
        volume: f32,
    }

    impl WebSpeechBackend {
        pub fn new() -> Self {
            let synth = web_sys::window().and_then(|w| w.speech_synthesis().ok());
            if synth.is_none() {
                log::warn!("Speech synthesis unavailable - narration disabled");
            }
            Self {
                synth,
                done: Rc::new(Cell::new(false)),
                rate: 1.2,
                volume: 1.0,
            }
        }

        pub fn set_rate(&mut self, rate: f32) {
            self.rate = rate.clamp(0.5, 2.0);
        }

        pub fn set_volume(&mut self, volume: f32) {
            self.volume = volume.clamp(0.0, 1.0);
        }
    }

    impl Default for WebSpeechBackend {
        fn default() -> Self {
            Self::new()
        }
    }

    impl SpeechBackend for WebSpeechBackend {
        fn speak(&mut self, text: &str, cancel_previous: bool) -> bool {
            let Some(synth) = &self.synth else {
                return false;
            };
            if cancel_previous {
                synth.cancel();
            }

            let Ok(utterance) = SpeechSynthesisUtterance::new_with_text(text) else {
                return false;
            };
            utterance.set_rate(self.rate);
            utterance.set_volume(self.volume);

            // A cancelled utterance may never fire `end`; the engine's
            // freeze timeout covers that path
            self.done.set(false);
            let done = self.done.clone();
            let on_end = Closure::<dyn FnMut(_)>::new(
                move |_event: web_sys::SpeechSynthesisEvent| {
                    done.set(true);
                },
            );
            utterance.set_onend(Some(on_end.as_ref().unchecked_ref()));
            on_end.forget();

            synth.speak(&utterance);
            true
        }

        fn cancel_all(&mut self) {
            if let Some(synth) = &self.synth {
                synth.cancel();
            }
            self.done.set(false);
        }

        fn take_completed(&mut self) -> bool {
            self.done.replace(false)
        }
    }
}
