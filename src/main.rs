//! Cosmic Math entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, KeyboardEvent, MouseEvent};

    use cosmic_math::audio::{AudioManager, SoundEffect};
    use cosmic_math::sim::{
        self, GameEvent, GameState, LanePosition, LaneState, Outcome, SimError,
    };
    use cosmic_math::{InputBinding, Settings};

    /// Which screen is up
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Screen {
        Start,
        Playing,
        GameOver,
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        input: InputBinding,
        audio: AudioManager,
        screen: Screen,
        last_time: f64,
        /// Sub-millisecond remainder carried between frames
        carry_ms: f64,
        /// Engine revision last drawn
        drawn_revision: Option<u64>,
        drawn_banner: bool,
    }

    impl Game {
        fn new(seed: u64) -> Result<Self, SimError> {
            Ok(Self {
                state: GameState::new(seed)?,
                input: InputBinding::new(),
                audio: AudioManager::new(Settings::default()),
                screen: Screen::Start,
                last_time: 0.0,
                carry_ms: 0.0,
                drawn_revision: None,
                drawn_banner: false,
            })
        }

        /// Fresh session; also used for restart
        fn start(&mut self, seed: u64) -> Result<(), SimError> {
            self.audio.resume();
            self.audio.stop_music();
            self.audio.play_music();
            sim::restart(&mut self.state, seed)?;
            self.input.reset();
            self.carry_ms = 0.0;
            self.drawn_revision = None;
            self.screen = Screen::Playing;
            // The opening RoundStarted is not interesting to the driver
            self.state.drain_events();
            log::info!("Game started with seed: {}", seed);
            Ok(())
        }

        /// Feed elapsed wall time to the engine in whole milliseconds
        fn update(&mut self, dt_ms: f64) -> Result<(), SimError> {
            self.audio.update();
            if self.screen != Screen::Playing {
                return Ok(());
            }

            // Clamp long stalls (background tab) to a single second
            self.carry_ms += dt_ms.min(1000.0);
            let whole = self.carry_ms.floor();
            self.carry_ms -= whole;

            let step = whole as u64;
            sim::advance(&mut self.state, step)?;
            self.input.advance(step);
            self.process_events();
            Ok(())
        }

        fn process_events(&mut self) {
            for event in self.state.drain_events() {
                self.input.observe(&event);
                if let Some(effect) = SoundEffect::for_event(&event) {
                    self.audio.play(effect);
                }
                if let GameEvent::GameOver { .. } = event {
                    self.audio.stop_music();
                    self.screen = Screen::GameOver;
                }
            }
        }

        fn on_key(&mut self, key: &str) -> Result<bool, SimError> {
            if self.screen != Screen::Playing {
                return Ok(false);
            }
            let action = self.input.handle_key(&mut self.state, key)?;
            self.process_events();
            Ok(action.is_some())
        }

        fn on_lane_tap(&mut self, position: LanePosition) -> Result<(), SimError> {
            if self.screen != Screen::Playing {
                return Ok(());
            }
            self.input.handle_lane_tap(&mut self.state, position)?;
            self.process_events();
            Ok(())
        }

        /// Push the snapshot into the DOM when something changed
        fn render(&mut self, document: &Document) {
            let banner = self.input.banner_active();
            if self.drawn_revision == Some(self.state.revision()) && self.drawn_banner == banner {
                return;
            }
            self.drawn_revision = Some(self.state.revision());
            self.drawn_banner = banner;

            let snap = self.state.snapshot();

            show(document, "start-screen", self.screen == Screen::Start);
            show(document, "game-screen", self.screen == Screen::Playing);
            show(document, "end-screen", self.screen == Screen::GameOver);

            set_text(document, "hud-score", &snap.score.to_string());
            set_text(document, "hud-stage", &snap.stage.to_string());
            set_text(document, "problem", &snap.problem.to_string());
            set_text(
                document,
                "mute-btn",
                if self.audio.is_muted() { "🔇" } else { "🔊" },
            );

            // Timer bar turns red under 40%
            if let Some(el) = document.get_element_by_id("timer-bar") {
                let fraction = snap.time_fraction();
                let color = if fraction > 0.4 { "timer-ok" } else { "timer-low" };
                let _ = el.set_attribute("class", color);
                let _ = el.set_attribute("style", &format!("width: {:.0}%", fraction * 100.0));
            }

            for lane in &snap.lanes {
                let id = format!("lane-{}", lane.position);
                set_text(document, &id, &lane.value.to_string());
                if let Some(el) = document.get_element_by_id(&id) {
                    let class = match lane.state {
                        LaneState::Default => "lane",
                        LaneState::Correct => "lane correct",
                        LaneState::Incorrect => "lane incorrect",
                    };
                    let _ = el.set_attribute("class", class);
                    if snap.is_resolving {
                        let _ = el.set_attribute("disabled", "");
                    } else {
                        let _ = el.remove_attribute("disabled");
                    }
                }
            }

            if let Some(el) = document.get_element_by_id("rocket") {
                let boost = if snap.is_resolving { " boost" } else { "" };
                let _ = el.set_attribute("class", &format!("rocket at-{}{}", snap.focused, boost));
            }

            show(document, "stage-banner", banner);
            set_text(document, "banner-stage", &snap.stage.to_string());

            if self.screen == Screen::GameOver {
                if let Some((score, outcome)) = self.state.outcome {
                    set_text(document, "final-score", &score.to_string());
                    let (title, subtitle) = match outcome {
                        Outcome::Win => ("Mission complete!", "Congratulations, space pilot!"),
                        Outcome::Lose(_) => ("Game over", "Nice try, space pilot!"),
                    };
                    set_text(document, "end-title", title);
                    set_text(document, "end-subtitle", subtitle);
                    let class = if outcome.is_win() { "win" } else { "lose" };
                    if let Some(el) = document.get_element_by_id("end-title") {
                        let _ = el.set_attribute("class", class);
                    }
                }
            }
        }
    }

    fn show(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn report(result: Result<(), SimError>) {
        if let Err(e) = result {
            log::error!("Engine error: {}", e);
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Cosmic Math starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let seed = js_sys::Date::now() as u64;
        let game = Game::new(seed).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let game = Rc::new(RefCell::new(game));

        setup_start_buttons(&document, game.clone());
        setup_keyboard(&window, game.clone());
        setup_lanes(&document, game.clone());
        setup_mute_button(&document, game.clone());

        request_animation_frame(game);

        log::info!("Cosmic Math running!");
        Ok(())
    }

    fn setup_start_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        for id in ["start-btn", "restart-btn"] {
            if let Some(btn) = document.get_element_by_id(id) {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    let seed = js_sys::Date::now() as u64;
                    report(game.borrow_mut().start(seed));
                });
                let _ =
                    btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn setup_keyboard(window: &web_sys::Window, game: Rc<RefCell<Game>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            match game.borrow_mut().on_key(&event.key()) {
                Ok(true) => event.prevent_default(),
                Ok(false) => {}
                Err(e) => log::error!("Engine error: {}", e),
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_lanes(document: &Document, game: Rc<RefCell<Game>>) {
        for position in LanePosition::ALL {
            let id = format!("lane-{}", position);
            if let Some(el) = document.get_element_by_id(&id) {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    report(game.borrow_mut().on_lane_tap(position));
                });
                let _ =
                    el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn setup_mute_button(document: &Document, game: Rc<RefCell<Game>>) {
        if let Some(btn) = document.get_element_by_id("mute-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.audio.toggle_mute();
                // Force a redraw of the button label
                g.drawn_revision = None;
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            let dt = if g.last_time > 0.0 {
                time - g.last_time
            } else {
                0.0
            };
            g.last_time = time;

            report(g.update(dt));
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                g.render(&document);
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), cosmic_math::sim::SimError> {
    env_logger::init();
    log::info!("Cosmic Math (native) starting...");
    log::info!("Native mode plays a headless autopilot run - use `trunk serve` for the web version");

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    autopilot(seed)
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play a full game through the input binding, always steering to the answer
#[cfg(not(target_arch = "wasm32"))]
fn autopilot(seed: u64) -> Result<(), cosmic_math::sim::SimError> {
    use cosmic_math::InputBinding;
    use cosmic_math::sim::{self, GameEvent, GamePhase, GameState};

    /// Simulated thinking time per problem
    const THINK_MS: u64 = 700;
    const WAIT_MS: u64 = 250;

    let mut state = GameState::new(seed)?;
    let mut input = InputBinding::new();
    log::info!("Autopilot seed: {}", seed);

    fn step(
        state: &mut GameState,
        input: &mut InputBinding,
        ms: u64,
    ) -> Result<(), cosmic_math::sim::SimError> {
        input.advance(ms);
        sim::advance(state, ms)
    }

    loop {
        for event in state.drain_events() {
            input.observe(&event);
            match event {
                GameEvent::RoundStarted { round, .. } => {
                    println!("Round {:>2}: {}", round, state.session.problem);
                }
                GameEvent::StageAdvanced { stage } => println!("*** Stage {} ***", stage),
                GameEvent::GameOver {
                    final_score,
                    outcome,
                } => {
                    println!("Game over: {:?}, final score {}", outcome, final_score);
                    return Ok(());
                }
                _ => {}
            }
        }

        if input.banner_active() || state.phase != GamePhase::AwaitingInput {
            step(&mut state, &mut input, WAIT_MS)?;
            continue;
        }

        step(&mut state, &mut input, THINK_MS)?;
        if state.phase != GamePhase::AwaitingInput {
            continue;
        }

        let answer = state.session.problem.answer;
        let Some(target) = state
            .session
            .lanes
            .iter()
            .find(|l| l.value == answer)
            .map(|l| l.position)
        else {
            continue;
        };

        while state.focused != target {
            let key = if target.index() < state.focused.index() {
                "ArrowLeft"
            } else {
                "ArrowRight"
            };
            if input.handle_key(&mut state, key)?.is_none() {
                break;
            }
        }
        input.handle_key(&mut state, "Enter")?;
    }
}
