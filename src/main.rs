//! Moloch Blaster entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent};

    use moloch_blaster::highscores::{
        DigestSigner, HighScores, LocalScoreService, ScoreService, SubmissionSlot,
    };
    use moloch_blaster::platform::clock::PerformanceClock;
    use moloch_blaster::platform::{
        Binding, Clock, EntitlementGate, InputState, ManualGate, PausableClock,
    };
    use moloch_blaster::renderer::RenderState;
    use moloch_blaster::sim::{GameEvent, GamePhase, SessionState, tick};
    use moloch_blaster::{Field, Settings};

    /// Wallet address used for local submissions until one is connected
    const LOCAL_ADDRESS: &str = "local-player";

    /// Game instance holding all state
    struct Game {
        state: SessionState,
        settings: Settings,
        render_state: Option<RenderState>,
        clock: PausableClock<PerformanceClock>,
        input: InputState,
        gate: ManualGate,
        high_scores: HighScores,
        scores: Rc<RefCell<LocalScoreService<DigestSigner>>>,
        submission: SubmissionSlot,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            let settings = Settings::load();
            let mut state = SessionState::new(seed);
            settings.apply_to(&mut state);
            Self {
                state,
                settings,
                render_state: None,
                clock: PausableClock::new(PerformanceClock),
                input: InputState::new(),
                gate: ManualGate::new(),
                high_scores: HighScores::load(),
                scores: Rc::new(RefCell::new(LocalScoreService::new(DigestSigner::from_seed(seed)))),
                submission: SubmissionSlot::new(),
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Run one simulation tick at the current game time
        fn update(&mut self, time: f64) {
            if self.clock.is_paused() {
                return;
            }
            let now = self.clock.now_ms();
            let input = self.input.snapshot(now);

            if self.state.phase == GamePhase::Idle && input.start && !self.state.entitled {
                self.state.entitled = self.gate.try_consume();
                if self.state.entitled {
                    self.settings.apply_to(&mut self.state);
                }
            }

            let was_playing = self.state.is_playing();
            tick(&mut self.state, &input, now);
            if was_playing && !self.state.is_playing() {
                // Nothing held may leak into the next level or run
                self.input.release_all();
            }

            for event in self.state.drain_events() {
                self.on_event(event);
            }
            if let Some(result) = self.submission.take() {
                match result {
                    Ok(reward) => log::info!(
                        "reward ready: {} tokens (nonce {})",
                        reward.amount,
                        reward.nonce
                    ),
                    Err(e) => log::warn!("score not rewarded: {e}"),
                }
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        fn on_event(&mut self, event: GameEvent) {
            match event {
                GameEvent::GameOver { score } => {
                    if let Some(rank) =
                        self.high_scores
                            .add_score(score, self.state.level, js_sys::Date::now())
                    {
                        log::info!("New high score #{rank}: {score}");
                        self.high_scores.save();
                    }
                    self.submit_score(score);
                }
                other => log::debug!("event: {other:?}"),
            }
        }

        /// Fire-and-forget; the result lands in `submission` on a later frame
        fn submit_score(&mut self, score: u64) {
            if !self.submission.begin() {
                log::warn!("submission already in flight, skipping");
                return;
            }
            let slot = self.submission.clone();
            let scores = self.scores.clone();
            let now = self.clock.now_ms();
            wasm_bindgen_futures::spawn_local(async move {
                let result = scores.borrow_mut().submit_score(LOCAL_ADDRESS, score, now);
                slot.complete(result);
            });
        }

        fn pause(&mut self, why: &str) {
            if !self.clock.is_paused() {
                self.clock.pause();
                self.input.release_all();
                log::info!("Paused ({why})");
            }
        }

        fn resume(&mut self) {
            self.input.release_all();
            self.clock.resume();
        }

        /// Render the current frame
        fn render(&mut self) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render_session(&self.state, &self.settings) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let set_text = |selector: &str, text: &str| {
                if let Some(el) = document.query_selector(selector).ok().flatten() {
                    el.set_text_content(Some(text));
                }
            };
            let show = |id: &str, visible: bool| {
                if let Some(el) = document.get_element_by_id(id) {
                    let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
                }
            };

            let now = self.state.now;
            let tuning = &self.state.tuning.player;
            set_text("#hud-score .hud-value", &self.state.score.to_string());
            set_text("#hud-level .hud-value", &self.state.level.to_string());
            set_text("#hud-fps .hud-value", &self.fps.to_string());
            set_text(
                "#hud-kills .hud-value",
                &format!("{}/{}", self.state.player.kill_count, tuning.energy_threshold),
            );
            set_text(
                "#hud-autofire .hud-value",
                if self.state.auto_fire { "ON" } else { "OFF" },
            );

            let energy_left = self.state.player.energy_remaining_ms(now, tuning);
            show("hud-energized", self.state.player.is_energized());
            set_text(
                "#hud-energized .hud-value",
                &format!("{:.1}s", energy_left as f64 / 1000.0),
            );
            show("hud-plasma", self.state.player.is_plasma());
            show("hud", self.settings.show_hud);

            show("start-prompt", self.state.phase == GamePhase::Idle);
            let countdown = self.state.intro_countdown(now);
            show("level-intro", countdown.is_some());
            if let Some(secs) = countdown {
                set_text("#level-intro .level", &self.state.level.to_string());
                set_text("#level-intro .countdown", &secs.to_string());
                set_text("#level-intro .glyph", &self.state.level_ctx.glyph.to_string());
            }
            show(
                "level-complete",
                matches!(self.state.phase, GamePhase::LevelComplete { .. }),
            );
            show("pause-menu", self.clock.is_paused());

            let over = self.state.phase == GamePhase::GameOver;
            show("game-over", over);
            if over {
                set_text("#final-score", &self.state.score.to_string());
                set_text("#final-level", &self.state.level.to_string());
                show("submitting", self.submission.is_pending());
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Moloch Blaster starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        log::info!("Game initialized with seed: {}", seed);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        match RenderState::new(surface, &adapter, width, height, Field::default()).await {
            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
            // The simulation still runs; only drawing is lost
            Err(e) => log::error!("No GPU device, running without rendering: {e}"),
        }

        setup_input_handlers(game.clone());
        setup_start_button(game.clone());
        setup_pause_menu(game.clone());
        setup_auto_pause(game.clone());

        request_animation_frame(game);

        log::info!("Moloch Blaster running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let Some(binding) = Binding::from_key_name(&event.key()) else {
                    return;
                };
                // Keep space and arrows from scrolling the page
                event.prevent_default();
                let mut g = game.borrow_mut();
                if event.repeat() && !matches!(binding, Binding::Hold(_)) {
                    return;
                }
                let now = g.clock.now_ms();
                g.input.press(binding, now);
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(binding) = Binding::from_key_name(&event.key()) {
                    event.prevent_default();
                    game.borrow_mut().input.release(binding);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }

    /// The start button stands in for the entitlement flow: clicking it
    /// grants one run and starts it
    fn setup_start_button(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("start-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                g.gate.grant();
                let now = g.clock.now_ms();
                g.input.press(Binding::Start, now);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_pause_menu(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("resume-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow_mut().resume();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().pause("tab hidden");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().pause("window blur");
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().input.release_all();
            });
            let _ = window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(target_arch = "wasm32")]
fn main() {}

/// Frames the headless demo runs before giving up
#[cfg(not(target_arch = "wasm32"))]
const DEMO_FRAMES: u32 = 60 * 60 * 3;
#[cfg(not(target_arch = "wasm32"))]
const FRAME_MS: u64 = 16;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use moloch_blaster::highscores::{DigestSigner, LocalScoreService, ScoreService};
    use moloch_blaster::platform::{AlwaysOpen, Binding, Clock, EntitlementGate, InputState, ManualClock};
    use moloch_blaster::sim::{GameEvent, GamePhase, SessionState, tick};
    use moloch_blaster::{HighScores, Settings};

    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    log::info!("Moloch Blaster (native) starting headless demo, seed {seed}");
    log::info!("Run with `trunk serve` for the web version");

    let settings = Settings::load();
    let mut state = SessionState::new(seed);
    settings.apply_to(&mut state);

    let clock = ManualClock::new(0);
    let mut gate = AlwaysOpen;
    let mut input = InputState::new();
    input.press(Binding::Autopilot, 0);
    let mut high_scores = HighScores::load();
    let mut scores = LocalScoreService::new(DigestSigner::from_seed(seed));

    let mut final_score = None;
    for _ in 0..DEMO_FRAMES {
        clock.advance(FRAME_MS);
        let now = clock.now_ms();
        let snapshot = input.snapshot(now);

        if state.phase == GamePhase::Idle && !state.entitled {
            state.entitled = gate.try_consume();
        }
        tick(&mut state, &snapshot, now);

        for event in state.drain_events() {
            match event {
                GameEvent::GameOver { score } => final_score = Some(score),
                GameEvent::LevelStarted { level } => log::info!("demo reached level {level}"),
                other => log::debug!("event: {other:?}"),
            }
        }
        if final_score.is_some() {
            break;
        }
    }

    let score = final_score.unwrap_or(state.score);
    high_scores.add_score(score, state.level, clock.now_ms() as f64);
    high_scores.save();
    match scores.submit_score("demo", score, clock.now_ms()) {
        Ok(reward) => log::info!("reward {} tokens, signature {}", reward.amount, reward.signature),
        Err(e) => log::warn!("no reward: {e}"),
    }

    println!(
        "Demo finished: level {}, score {}, {} ms of game time",
        state.level,
        score,
        clock.now_ms()
    );
}
