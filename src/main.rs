//! Echo Dodge entry point
//!
//! Handles platform-specific initialization: browser wiring of keyboard and
//! touch to the four game intents, the requestAnimationFrame loop, and a
//! minimal text HUD. The engine itself never sees a raw device event.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{KeyboardEvent, TouchEvent};

    use echo_dodge::audio::WebAudioBackend;
    use echo_dodge::sim::{GameStatus, Intent, Lane};
    use echo_dodge::speech::WebSpeechBackend;
    use echo_dodge::{Engine, Settings};

    type WebEngine = Engine<WebAudioBackend, WebSpeechBackend>;

    struct App {
        engine: WebEngine,
        settings: Settings,
        /// Cleared on teardown so the frame loop stops re-arming itself
        active: bool,
    }

    impl App {
        /// Current timestamp on the same timeline requestAnimationFrame uses
        fn now_ms() -> f64 {
            web_sys::window()
                .and_then(|w| w.performance())
                .map(|p| p.now())
                .unwrap_or(0.0)
        }

        fn intent(&mut self, intent: Intent) {
            self.engine.handle_intent(intent, Self::now_ms());
        }

        /// Left/right key presses are positional; the engine only takes a
        /// symbolic switch, so only forward it when the lane would change
        fn steer(&mut self, target: Lane) {
            if self.engine.snapshot().player_lane != target {
                self.intent(Intent::SwitchLane);
            }
        }

        /// Space/Enter/tap while not running
        fn start_or_restart(&mut self) {
            match self.engine.status() {
                GameStatus::Idle => {
                    self.engine.audio_backend_mut().resume();
                    self.intent(Intent::Start);
                }
                GameStatus::GameOver => self.intent(Intent::Restart),
                _ => {}
            }
        }

        /// Update HUD text in the DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let snapshot = self.engine.snapshot();

            if let Some(el) = document.get_element_by_id("hud-score") {
                el.set_text_content(Some(&snapshot.score.to_string()));
            }
            if let Some(el) = document.get_element_by_id("hud-status") {
                let text = match snapshot.status {
                    GameStatus::Idle => "Press Space to start",
                    GameStatus::Running => "Running",
                    GameStatus::Paused => "Paused",
                    GameStatus::GameOver => "Game over - Space to restart",
                };
                el.set_text_content(Some(text));
            }
        }

        fn teardown(&mut self) {
            self.engine.shutdown();
            self.engine.audio_backend_mut().close();
            self.active = false;
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Echo Dodge starting...");

        let settings = Settings::load();

        let mut audio = WebAudioBackend::new();
        audio.set_master_volume(settings.master_volume);
        // Best-effort asset load; decode failure leaves the procedural hum
        match fetch_engine_clip().await {
            Some(bytes) => {
                if audio.decode_clip(&bytes).await.is_err() {
                    log::warn!("Engine clip failed to decode - using oscillator hum");
                }
            }
            None => log::info!("No engine clip bundled - using oscillator hum"),
        }

        let mut speech = WebSpeechBackend::new();
        speech.set_rate(settings.speech_rate);
        speech.set_volume(settings.speech_volume);

        let seed = js_sys::Date::now() as u64;
        let mut engine = Engine::new(seed, audio, speech);
        engine.set_verbose_narration(settings.verbose_narration);
        log::info!("Game initialized with seed: {seed}");

        let app = Rc::new(RefCell::new(App {
            engine,
            settings,
            active: true,
        }));

        setup_keyboard(app.clone());
        setup_touch(app.clone());
        setup_auto_pause(app.clone());
        setup_teardown(app.clone());

        request_animation_frame(app);

        log::info!("Echo Dodge running!");
    }

    /// Fetch the looping engine sound, if the deployment bundles one
    async fn fetch_engine_clip() -> Option<Vec<u8>> {
        let window = web_sys::window()?;
        let response = wasm_bindgen_futures::JsFuture::from(
            window.fetch_with_str("assets/engine-loop.ogg"),
        )
        .await
        .ok()?;
        let response: web_sys::Response = response.dyn_into().ok()?;
        if !response.ok() {
            return None;
        }
        let buffer = wasm_bindgen_futures::JsFuture::from(response.array_buffer().ok()?)
            .await
            .ok()?;
        Some(js_sys::Uint8Array::new(&buffer).to_vec())
    }

    fn setup_keyboard(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let mut app = app.borrow_mut();
            match event.key().as_str() {
                "ArrowLeft" | "a" | "A" => app.steer(Lane::Left),
                "ArrowRight" | "d" | "D" => app.steer(Lane::Right),
                " " | "Enter" => app.start_or_restart(),
                "Escape" | "p" | "P" => app.intent(Intent::TogglePause),
                _ => {}
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_touch(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let width = window.inner_width().ok().and_then(|w| w.as_f64()).unwrap_or(0.0);
        let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
            event.prevent_default();
            let mut app = app.borrow_mut();
            if app.engine.status() != GameStatus::Running {
                app.start_or_restart();
                return;
            }
            if let Some(touch) = event.touches().get(0) {
                let lane = if (touch.client_x() as f64) < width / 2.0 {
                    Lane::Left
                } else {
                    Lane::Right
                };
                app.steer(lane);
            }
        });
        let _ = window
            .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_auto_pause(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Visibility change (tab switch, minimize)
        {
            let app = app.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut app = app.borrow_mut();
                    if app.settings.auto_pause && app.engine.status() == GameStatus::Running {
                        app.intent(Intent::TogglePause);
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut app = app.borrow_mut();
                if app.settings.auto_pause && app.engine.status() == GameStatus::Running {
                    app.intent(Intent::TogglePause);
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Release voices and cancel narration when the page goes away
    fn setup_teardown(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().teardown();
        });
        let _ =
            window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();
            if !a.active {
                return;
            }
            a.engine.frame(time);
            a.update_hud();
        }
        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Echo Dodge (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    headless_demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Drive a short silent run to prove the loop end to end
#[cfg(not(target_arch = "wasm32"))]
fn headless_demo() {
    use echo_dodge::audio::NullAudioBackend;
    use echo_dodge::sim::Intent;
    use echo_dodge::speech::SpeechBackend;
    use echo_dodge::Engine;

    struct NoSpeech;
    impl SpeechBackend for NoSpeech {
        fn speak(&mut self, text: &str, _cancel_previous: bool) -> bool {
            log::info!("[announcer] {text}");
            false
        }
        fn cancel_all(&mut self) {}
        fn take_completed(&mut self) -> bool {
            false
        }
    }

    let mut engine = Engine::new(0xD0D6E, NullAudioBackend, NoSpeech);
    engine.handle_intent(Intent::Start, 0.0);

    // Ten simulated seconds at 60 Hz, dodging nothing
    let mut now = 0.0;
    for _ in 0..600 {
        now += 1000.0 / 60.0;
        engine.frame(now);
    }

    let snapshot = engine.snapshot();
    println!(
        "10s headless run: status {:?}, score {}, {} obstacles live",
        snapshot.status,
        snapshot.score,
        snapshot.obstacles.len()
    );
    engine.shutdown();
}
