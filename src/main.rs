//! Tile Strike entry point
//!
//! On the web this wires the game to the DOM, `requestAnimationFrame`,
//! `setInterval` and `setTimeout`. Natively it plays a seeded headless
//! session with a simple bot and prints the final stats.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::{Rc, Weak};

    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlElement, HtmlInputElement, KeyboardEvent, Window};

    use tile_strike::GameConfig;
    use tile_strike::platform::{Clock, ClockSignal, ControlSurface, Presentation, TimerHandle};
    use tile_strike::settings::{format_multiplier, parse_speed_multiplier};
    use tile_strike::sim::{
        BoardLayout, Game, GameOverSummary, Phase, Stats, Tile, TileId, TileStatus,
    };

    type WebGame = Game<BrowserClock, DomTiles, DomControls>;

    /// Routes browser callbacks back into the game
    #[derive(Clone, Default)]
    struct Dispatcher(Rc<RefCell<Weak<RefCell<WebGame>>>>);

    impl Dispatcher {
        fn bind(&self, game: &Rc<RefCell<WebGame>>) {
            *self.0.borrow_mut() = Rc::downgrade(game);
        }

        fn dispatch(&self, signal: ClockSignal) {
            let game = self.0.borrow().upgrade();
            if let Some(game) = game {
                game.borrow_mut().handle_signal(signal);
            }
        }
    }

    fn to_browser_ms(ms: f64) -> i32 {
        if ms.is_finite() {
            ms.round().clamp(0.0, i32::MAX as f64) as i32
        } else {
            i32::MAX
        }
    }

    /// `Clock` backed by the window's timers
    struct BrowserClock {
        window: Window,
        dispatcher: Dispatcher,
        next_handle: u64,
        /// Outstanding animation frame request, cleared when it fires
        frame: Rc<Cell<Option<(TimerHandle, i32)>>>,
        intervals: HashMap<TimerHandle, (i32, Closure<dyn FnMut()>)>,
        removals: Rc<RefCell<HashMap<TimerHandle, i32>>>,
    }

    impl BrowserClock {
        fn new(window: Window, dispatcher: Dispatcher) -> Self {
            Self {
                window,
                dispatcher,
                next_handle: 0,
                frame: Rc::new(Cell::new(None)),
                intervals: HashMap::new(),
                removals: Rc::new(RefCell::new(HashMap::new())),
            }
        }

        fn issue(&mut self) -> TimerHandle {
            self.next_handle += 1;
            TimerHandle(self.next_handle)
        }
    }

    impl Clock for BrowserClock {
        fn now_ms(&self) -> f64 {
            self.window.performance().map(|p| p.now()).unwrap_or(0.0)
        }

        fn request_frame(&mut self) -> TimerHandle {
            let handle = self.issue();
            let dispatcher = self.dispatcher.clone();
            let pending = self.frame.clone();
            let closure = Closure::once(move |now_ms: f64| {
                if matches!(pending.get(), Some((current, _)) if current == handle) {
                    pending.set(None);
                }
                dispatcher.dispatch(ClockSignal::Frame { handle, now_ms });
            });
            match self
                .window
                .request_animation_frame(closure.as_ref().unchecked_ref())
            {
                Ok(id) => self.frame.set(Some((handle, id))),
                Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
            }
            closure.forget();
            handle
        }

        fn cancel_frame(&mut self, handle: TimerHandle) {
            if let Some((pending, id)) = self.frame.get() {
                if pending == handle {
                    let _ = self.window.cancel_animation_frame(id);
                    self.frame.set(None);
                }
            }
        }

        fn start_interval(&mut self, period_ms: f64) -> TimerHandle {
            let handle = self.issue();
            let dispatcher = self.dispatcher.clone();
            let closure = Closure::<dyn FnMut()>::new(move || {
                dispatcher.dispatch(ClockSignal::Spawn { handle });
            });
            match self
                .window
                .set_interval_with_callback_and_timeout_and_arguments_0(
                    closure.as_ref().unchecked_ref(),
                    to_browser_ms(period_ms).max(1),
                ) {
                Ok(id) => {
                    self.intervals.insert(handle, (id, closure));
                }
                Err(e) => log::error!("setInterval failed: {:?}", e),
            }
            handle
        }

        fn stop_interval(&mut self, handle: TimerHandle) {
            if let Some((id, _closure)) = self.intervals.remove(&handle) {
                self.window.clear_interval_with_handle(id);
            }
        }

        fn schedule_removal(&mut self, tile: TileId, delay_ms: f64) -> TimerHandle {
            let handle = self.issue();
            let dispatcher = self.dispatcher.clone();
            let removals = self.removals.clone();
            let callback = Closure::once_into_js(move || {
                removals.borrow_mut().remove(&handle);
                dispatcher.dispatch(ClockSignal::Removal { handle, tile });
            });
            match self
                .window
                .set_timeout_with_callback_and_timeout_and_arguments_0(
                    callback.unchecked_ref(),
                    to_browser_ms(delay_ms),
                ) {
                Ok(id) => {
                    self.removals.borrow_mut().insert(handle, id);
                }
                Err(e) => log::error!("setTimeout failed: {:?}", e),
            }
            handle
        }

        fn cancel_removal(&mut self, handle: TimerHandle) {
            if let Some(id) = self.removals.borrow_mut().remove(&handle) {
                self.window.clear_timeout_with_handle(id);
            }
        }
    }

    /// Tiles as absolutely positioned `<div class="tile">` elements
    struct DomTiles {
        document: Document,
        board: HtmlElement,
        elements: HashMap<TileId, HtmlElement>,
    }

    impl DomTiles {
        fn new(document: Document, board: HtmlElement) -> Self {
            Self {
                document,
                board,
                elements: HashMap::new(),
            }
        }

        fn create(&self, tile: &Tile) -> Result<HtmlElement, JsValue> {
            let el: HtmlElement = self.document.create_element("div")?.dyn_into()?;
            el.set_class_name("tile");
            el.set_text_content(Some(&tile.letter.to_string()));
            let style = el.style();
            style.set_property("left", &format!("{}px", tile.x))?;
            style.set_property("top", "0px")?;
            style.set_property("transform", &translate(tile))?;
            self.board.append_child(&el)?;
            Ok(el)
        }
    }

    fn translate(tile: &Tile) -> String {
        format!("translate3d(0, {}px, 0)", tile.position().y)
    }

    impl Presentation for DomTiles {
        fn render_new_tile(&mut self, tile: &Tile) {
            match self.create(tile) {
                Ok(el) => {
                    self.elements.insert(tile.id, el);
                }
                Err(e) => log::warn!("Failed to render tile {:?}: {:?}", tile.id, e),
            }
        }

        fn update_tile_position(&mut self, tile: &Tile) {
            if let Some(el) = self.elements.get(&tile.id) {
                let _ = el.style().set_property("transform", &translate(tile));
            }
        }

        fn mark_tile(&mut self, tile: &Tile) {
            let class = match tile.status {
                TileStatus::Hit => "hit",
                TileStatus::Missed => "missed",
                TileStatus::Falling => return,
            };
            if let Some(el) = self.elements.get(&tile.id) {
                let _ = el.class_list().add_1(class);
            }
        }

        fn remove_tile(&mut self, id: TileId) {
            if let Some(el) = self.elements.remove(&id) {
                el.remove();
            }
        }

        fn clear_all(&mut self) {
            for (_, el) in self.elements.drain() {
                el.remove();
            }
            self.board.set_inner_html("");
        }
    }

    /// Buttons, labels, speed slider and the game-over modal
    struct DomControls {
        document: Document,
    }

    impl DomControls {
        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_disabled(&self, id: &str, disabled: bool) {
            if let Some(el) = self.document.get_element_by_id(id) {
                let _ = if disabled {
                    el.set_attribute("disabled", "")
                } else {
                    el.remove_attribute("disabled")
                };
            }
        }

        fn set_modal_display(&self, display: &str) {
            if let Some(el) = self
                .document
                .get_element_by_id("gameOverModal")
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            {
                let _ = el.style().set_property("display", display);
            }
        }

        fn slider(&self) -> Option<HtmlInputElement> {
            self.document
                .get_element_by_id("speedSlider")
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        }
    }

    impl ControlSurface for DomControls {
        fn show_stats(&mut self, stats: &Stats) {
            self.set_text("score", &stats.score.to_string());
            self.set_text("lives", &stats.lives.to_string());
            self.set_text("level", &stats.level.to_string());
            self.set_text("speedValue", &format_multiplier(stats.speed_multiplier));
        }

        fn show_phase(&mut self, phase: Phase) {
            self.set_disabled("startBtn", !phase.can_start());
            self.set_disabled(
                "pauseBtn",
                !matches!(phase, Phase::Playing | Phase::Paused),
            );
            let label = if phase == Phase::Paused { "Resume" } else { "Pause" };
            self.set_text("pauseBtn", label);
        }

        fn show_game_over(&mut self, summary: &GameOverSummary) {
            self.set_text("finalScore", &summary.score.to_string());
            self.set_text("finalLevel", &summary.level.to_string());
            self.set_modal_display("flex");
        }

        fn hide_game_over(&mut self) {
            self.set_modal_display("none");
        }

        fn speed_multiplier(&self) -> f64 {
            let Some(slider) = self.slider() else {
                return 1.0;
            };
            match parse_speed_multiplier(&slider.value()) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("{}", e);
                    f64::NAN
                }
            }
        }
    }

    /// Read an optional JSON config from `<script id="game-config">`
    fn load_config(document: &Document) -> GameConfig {
        let Some(json) = document
            .get_element_by_id("game-config")
            .and_then(|el| el.text_content())
        else {
            return GameConfig::default();
        };
        match GameConfig::from_json(&json) {
            Ok(config) => {
                log::info!("Loaded game config");
                config
            }
            Err(e) => {
                log::warn!("{}, using defaults", e);
                GameConfig::default()
            }
        }
    }

    fn board_size(board: &HtmlElement) -> (f32, f32) {
        let rect = board.get_bounding_client_rect();
        (rect.width() as f32, board.offset_height() as f32)
    }

    fn on_click(document: &Document, id: &str, mut action: impl FnMut() + 'static) {
        let Some(el) = document.get_element_by_id(id) else {
            log::warn!("Missing #{}", id);
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| action());
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_controls(document: &Document, game: &Rc<RefCell<WebGame>>) {
        {
            let game = game.clone();
            on_click(document, "startBtn", move || game.borrow_mut().start());
        }
        {
            let game = game.clone();
            on_click(document, "pauseBtn", move || game.borrow_mut().toggle_pause());
        }
        {
            let game = game.clone();
            on_click(document, "resetBtn", move || game.borrow_mut().reset());
        }
        {
            let game = game.clone();
            on_click(document, "playAgainBtn", move || game.borrow_mut().reset());
        }

        // Speed slider
        if let Some(slider) = document.get_element_by_id("speedSlider") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                let Some(input) = event
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                else {
                    return;
                };
                match parse_speed_multiplier(&input.value()) {
                    Ok(value) => game.borrow_mut().set_speed_multiplier(value),
                    Err(e) => log::warn!("{}", e),
                }
            });
            let _ = slider.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_keyboard(window: &Window, game: &Rc<RefCell<WebGame>>) {
        let game = game.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            game.borrow_mut().handle_key(&event.key());
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(window: &Window, board: &HtmlElement, game: &Rc<RefCell<WebGame>>) {
        let game = game.clone();
        let board = board.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let (width, height) = board_size(&board);
            game.borrow_mut().resize(width, height);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        log::info!("Tile Strike starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let board: HtmlElement = document
            .get_element_by_id("gameBoard")
            .ok_or("no #gameBoard")?
            .dyn_into()?;

        let config = load_config(&document);
        let (width, height) = board_size(&board);
        let layout = BoardLayout::new(width, height, &config);

        let dispatcher = Dispatcher::default();
        let clock = BrowserClock::new(window.clone(), dispatcher.clone());
        let tiles = DomTiles::new(document.clone(), board.clone());
        let controls = DomControls {
            document: document.clone(),
        };

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::with_seed(
            config, layout, clock, tiles, controls, seed,
        )));
        dispatcher.bind(&game);
        log::info!(
            "Board {}x{} ({} columns), seed {}",
            width,
            height,
            layout.column_count(),
            seed
        );

        setup_controls(&document, &game);
        setup_keyboard(&window, &game);
        setup_resize(&window, &board, &game);

        log::info!("Tile Strike ready");
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod headless_game {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use tile_strike::GameConfig;
    use tile_strike::platform::headless::{
        ManualClock, RecordingControls, RecordingPresentation, run_until,
    };
    use tile_strike::sim::{BoardLayout, Game, Phase, Stats};

    /// Simulated time between bot decisions
    const STEP_MS: f64 = 50.0;
    /// Longest session the demo plays
    const MAX_SESSION_MS: f64 = 10.0 * 60.0 * 1000.0;
    /// Chance per step that the bot strikes its target
    const BOT_REACTION: f64 = 0.2;

    /// Play one seeded session and return the final stats
    pub fn autoplay(seed: u64) -> Stats {
        let config = GameConfig::default();
        let layout = BoardLayout::new(450.0, 500.0, &config);
        let mut game = Game::with_seed(
            config,
            layout,
            ManualClock::new(),
            RecordingPresentation::default(),
            RecordingControls::default(),
            seed,
        );
        let mut bot = Pcg32::seed_from_u64(seed ^ 0x5eed);

        game.start();
        let mut now = 0.0;
        while game.phase() == Phase::Playing && now < MAX_SESSION_MS {
            now += STEP_MS;
            run_until(&mut game, now);

            // Aim for the lowest tile once it reaches the lower half
            let threshold = game.layout().miss_boundary() * 0.5;
            let target = game
                .tiles()
                .iter()
                .filter(|t| t.is_falling() && t.vertical_offset > threshold)
                .max_by(|a, b| a.vertical_offset.total_cmp(&b.vertical_offset))
                .map(|t| t.letter);
            if let Some(letter) = target {
                if bot.random_bool(BOT_REACTION) {
                    game.handle_key(&letter.to_string());
                }
            }
        }

        log::info!(
            "Session ended after {:.1}s in phase {}",
            now / 1000.0,
            game.phase().as_str()
        );
        game.stats()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(42);
    log::info!("Tile Strike (native) playing a headless session, seed {}", seed);

    let stats = headless_game::autoplay(seed);
    match serde_json::to_string_pretty(&stats) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize stats: {}", e),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
