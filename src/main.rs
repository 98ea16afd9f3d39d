//! Rage Clicker entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlElement, HtmlInputElement, PointerEvent};

    use rage_clicker::consts::*;
    use rage_clicker::persistence::KeyValueStore;
    use rage_clicker::sim::{Bounds, GameMode, GamePhase};
    use rage_clicker::{CannedPhrases, PointerOutcome, Routed, Session, Settings, platform};

    type WebSession = Session<Box<dyn KeyValueStore>, CannedPhrases>;

    /// Floating "OK!"/"MISS!" text
    struct Feedback {
        el: Element,
        expires_ms: f64,
    }

    /// Game instance holding all state
    struct Game {
        session: WebSession,
        /// One element per seated player, rebuilt on start
        buttons: Vec<HtmlElement>,
        feedbacks: Vec<Feedback>,
        shake_until: f64,
        last_phase: GamePhase,
    }

    impl Game {
        fn new(seed: u64, bounds: Bounds) -> Self {
            let store = platform::default_store();
            let settings = Settings::load(store.as_ref());
            Self {
                session: Session::new(store, CannedPhrases::new(seed ^ 0xA5A5), settings, seed, bounds),
                buttons: Vec::new(),
                feedbacks: Vec::new(),
                shake_until: 0.0,
                last_phase: GamePhase::Menu,
            }
        }

        /// Build one button element per player
        fn mount_buttons(&mut self, document: &Document) {
            for b in self.buttons.drain(..) {
                b.remove();
            }
            let Some(surface) = document.get_element_by_id("play") else {
                return;
            };
            for i in 0..self.session.targets().len() {
                let Ok(el) = document.create_element("div") else {
                    continue;
                };
                let Ok(el) = el.dyn_into::<HtmlElement>() else {
                    continue;
                };
                el.set_class_name(if i == 0 { "rage-button red" } else { "rage-button blue" });
                el.set_text_content(Some(&format!("P{} HIT", i + 1)));
                let _ = surface.append_child(&el);
                self.buttons.push(el);
            }
        }

        fn spawn_feedback(&mut self, document: &Document, outcome: &PointerOutcome, now: f64) {
            let (text, class) = match outcome.routed {
                Routed::Target(_) => ("OK!", "feedback ok"),
                Routed::Background => ("MISS!", "feedback miss"),
                Routed::Ignored => return,
            };
            let Some(surface) = document.get_element_by_id("play") else {
                return;
            };
            if let Ok(el) = document.create_element("div") {
                el.set_class_name(class);
                el.set_text_content(Some(text));
                let _ = el.set_attribute(
                    "style",
                    &format!("left:{}px;top:{}px", outcome.position.x, outcome.position.y),
                );
                let _ = surface.append_child(&el);
                self.feedbacks.push(Feedback {
                    el,
                    expires_ms: now + FEEDBACK_MS,
                });
            }
        }

        fn update(&mut self, now: f64) {
            self.session.advance(now);

            self.feedbacks.retain(|f| {
                let alive = f.expires_ms > now;
                if !alive {
                    f.el.remove();
                }
                alive
            });

            let phase = self.session.phase();
            if phase != self.last_phase {
                if phase != GamePhase::Playing {
                    for b in self.buttons.drain(..) {
                        b.remove();
                    }
                }
                self.last_phase = phase;
            }
        }

        /// Update button styles, HUD and overlays in DOM
        fn render(&self, document: &Document, now: f64) {
            let tuning = self.session.tuning();
            for (el, target) in self.buttons.iter().zip(self.session.targets()) {
                let style = el.style();
                let _ = style.set_property("left", &format!("{}px", target.pos.x));
                let _ = style.set_property("top", &format!("{}px", target.pos.y));
                let _ = style.set_property(
                    "transform",
                    &format!("translate(-50%, -50%) scale({})", target.scale),
                );
                let _ = style.set_property("opacity", &target.opacity.to_string());
                let _ = style.set_property("width", &format!("{}px", tuning.radius * 2.0));
                let _ = style.set_property("height", &format!("{}px", tuning.radius * 2.0));
            }

            let state = self.session.state();
            if let Some(p) = state.players.first() {
                set_text(document, "hud-score", &p.score.to_string());
                set_text(document, "hud-hits", &p.hits.to_string());
                set_text(document, "hud-misses", &p.misses.to_string());
                set_text(document, "hud-combo", &format!("{}x", p.combo));
                set_visible(document, "combo", p.combo >= COMBO_DISPLAY_MIN);

                if let Some(bar) = document
                    .get_element_by_id("patience-bar")
                    .and_then(|e| e.dyn_into::<HtmlElement>().ok())
                {
                    let _ = bar.style().set_property("width", &format!("{}%", p.patience));
                    bar.set_class_name(if p.patience > LOW_PATIENCE { "ok" } else { "low" });
                }
            }
            if let Some(p2) = state.players.get(1) {
                set_text(document, "hud-score-2", &p2.score.to_string());
                set_text(document, "hud-patience-2", &p2.patience.to_string());
            }
            set_text(document, "hud-level", &format!("LEVEL {}", state.level));

            // Announcer panel
            if let Some(panel) = document.get_element_by_id("trash-talk") {
                panel.set_inner_html("");
                for m in self.session.messages(now) {
                    append_line(document, &panel, "p", &format!("{:?}", m.category), &m.text);
                }
            }

            set_visible(document, "menu", state.phase == GamePhase::Menu);
            set_visible(document, "game-over", state.phase == GamePhase::GameOver);
            set_visible(document, "hud", state.phase != GamePhase::Menu);
            if state.phase == GamePhase::GameOver {
                if let Some(p) = state.players.first() {
                    set_text(document, "final-score", &p.score.to_string());
                    set_text(document, "final-combo", &p.max_combo.to_string());
                    set_text(document, "final-hits", &p.hits.to_string());
                    set_text(document, "final-misses", &p.misses.to_string());
                }
                let verdict = match state.winner() {
                    Some(i) => format!("{} wins", state.players[i].display_name(i)),
                    None if state.players.len() > 1 => "Nobody wins".to_string(),
                    None => String::new(),
                };
                set_text(document, "final-verdict", &verdict);

                let score = state.players.first().map(|p| p.score).unwrap_or(0);
                let rank_note = match self.session.final_rank(0) {
                    Some(rank) if state.rules.records_high_scores => format!("New high score: #{}", rank),
                    Some(rank) if score > 0 => format!("A ranked run would have placed #{}", rank),
                    _ => String::new(),
                };
                set_text(document, "final-rank", &rank_note);
                render_leaderboard(document, &self.session);
            }

            if let Some(root) = document.get_element_by_id("play") {
                let shaking = now < self.shake_until;
                let _ = root.class_list().toggle_with_force("shake", shaking);
            }
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    /// Append a text-only child; nicknames never reach the HTML parser
    fn append_line(document: &Document, parent: &Element, tag: &str, class: &str, text: &str) {
        if let Ok(el) = document.create_element(tag) {
            el.set_class_name(class);
            el.set_text_content(Some(text));
            let _ = parent.append_child(&el);
        }
    }

    fn render_leaderboard(document: &Document, session: &WebSession) {
        let Some(list) = document.get_element_by_id("leaderboard") else {
            return;
        };
        list.set_inner_html("");
        for (i, e) in session.high_scores().entries.iter().enumerate() {
            let line = format!("#{} {} {} (lvl {}, {})", i + 1, e.nickname, e.score, e.level, e.date);
            append_line(document, &list, "li", "", &line);
        }
    }

    fn surface_bounds(document: &Document) -> Bounds {
        document
            .get_element_by_id("play")
            .map(|el| Bounds::new(el.client_width() as f32, el.client_height() as f32))
            .unwrap_or(Bounds::new(DEFAULT_WIDTH, DEFAULT_HEIGHT))
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Rage Clicker starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let seed = platform::clock_seed();
        let game = Rc::new(RefCell::new(Game::new(seed, surface_bounds(&document))));
        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&document, game.clone())?;
        setup_menu_buttons(&document, game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("Rage Clicker running!");
        Ok(())
    }

    fn setup_input_handlers(document: &Document, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let surface = document.get_element_by_id("play").ok_or("no #play element")?;

        // Every press on the surface goes through the session's hit test
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                    return;
                };
                let now = platform::now_ms();
                let point = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                let mut g = game.borrow_mut();
                // Offsets are relative to whatever element was pressed
                let point = match event.target().and_then(|t| t.dyn_into::<HtmlElement>().ok()) {
                    Some(el) if el.class_list().contains("rage-button") => {
                        let rect = el.get_bounding_client_rect();
                        let surface_rect = document
                            .get_element_by_id("play")
                            .map(|s| s.get_bounding_client_rect());
                        match surface_rect {
                            Some(s) => Vec2::new(
                                (rect.left() - s.left()) as f32 + point.x,
                                (rect.top() - s.top()) as f32 + point.y,
                            ),
                            None => point,
                        }
                    }
                    _ => point,
                };
                let outcome = g.session.pointer_down(point, now);
                if outcome.shake {
                    g.shake_until = now + SHAKE_MS;
                }
                g.spawn_feedback(&document, &outcome, now);
            });
            surface.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Hover evasion: the enter/leave events bubble from the buttons as over/out
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                if let Some(i) = button_index(&game, &event) {
                    game.borrow_mut().session.pointer_enter(i);
                }
            });
            surface.add_event_listener_with_callback("pointerover", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                if let Some(i) = button_index(&game, &event) {
                    game.borrow_mut().session.pointer_leave(i);
                }
            });
            surface.add_event_listener_with_callback("pointerout", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Window resize
        {
            let window = web_sys::window().ok_or("no window")?;
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    game.borrow_mut().session.resize(surface_bounds(&document));
                }
            });
            window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn button_index(game: &Rc<RefCell<Game>>, event: &PointerEvent) -> Option<usize> {
        let target = event.target()?.dyn_into::<HtmlElement>().ok()?;
        let g = game.borrow();
        g.buttons.iter().position(|b| *b == target)
    }

    fn setup_menu_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        for (id, mode) in [
            ("start-solo-btn", GameMode::Solo),
            ("start-versus-btn", GameMode::Versus),
            ("start-ranked-btn", GameMode::Leaderboard),
        ] {
            let Some(btn) = document.get_element_by_id(id) else {
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::MouseEvent| {
                event.stop_propagation();
                let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                    return;
                };
                let nickname = document
                    .get_element_by_id("nickname")
                    .and_then(|e| e.dyn_into::<HtmlInputElement>().ok())
                    .map(|input| input.value());

                let mut g = game.borrow_mut();
                let mut settings = g.session.settings().clone();
                if settings.mode != mode {
                    settings.mode = mode;
                    g.session.update_settings(settings);
                }
                let bounds = surface_bounds(&document);
                g.session.resize(bounds);
                let nicknames = match mode {
                    GameMode::Leaderboard => vec![nickname],
                    GameMode::Solo | GameMode::Versus => Vec::new(),
                };
                g.session.start(&nicknames, platform::now_ms());
                g.mount_buttons(&document);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("menu-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::MouseEvent| {
                event.stop_propagation();
                game.borrow_mut().session.reset_to_menu();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |_time: f64| {
            game_loop(game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>) {
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            let now = platform::now_ms();
            let mut g = game.borrow_mut();
            g.update(now);
            g.render(&document, now);
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
fn main() {
    env_logger::init();
    log::info!("Rage Clicker (native) starting...");
    log::info!("Native mode plays a headless demo - run with `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(rage_clicker::platform::clock_seed);
    demo::run(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless bot game used by the native binary
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::Vec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use rage_clicker::consts::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
    use rage_clicker::sim::{Bounds, GameMode};
    use rage_clicker::{CannedPhrases, MemoryStore, Session, Settings};

    /// Chance the bot clicks the button instead of the background
    const BOT_ACCURACY: f64 = 0.8;
    /// Time between bot clicks (ms)
    const CLICK_GAP_MS: f64 = 350.0;
    const MAX_CLICKS: usize = 5000;

    pub fn run(seed: u64) {
        let mut bot = Pcg32::seed_from_u64(seed.wrapping_add(1));
        let mut session = Session::new(
            MemoryStore::new(),
            CannedPhrases::new(seed),
            Settings::from_mode(GameMode::Leaderboard),
            seed,
            Bounds::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
        );

        let mut now = 0.0;
        session.start(&[Some("bot".to_string())], now);
        log::info!("Demo seed: {}", seed);

        for _ in 0..MAX_CLICKS {
            if !session.state().is_playing() {
                break;
            }
            now += CLICK_GAP_MS;
            session.advance(now);

            let point = if bot.random_bool(BOT_ACCURACY) {
                session.targets()[0].pos
            } else {
                // Top-left corner is always outside the padded area
                Vec2::new(1.0, 1.0)
            };
            let outcome = session.pointer_down(point, now);
            for msg in session.messages(now) {
                if msg.timestamp == now {
                    log::info!("Announcer: {}", msg.text);
                }
            }
            if outcome.game_over() {
                break;
            }
        }

        let state = session.state();
        if let Some(p) = state.players.first() {
            println!(
                "Final score {} at level {} ({} hits, {} misses, best combo {}, {:.0}% accuracy)",
                p.score,
                state.level,
                p.hits,
                p.misses,
                p.max_combo,
                p.accuracy() * 100.0
            );
        }
        for (i, e) in session.high_scores().entries.iter().enumerate() {
            println!("#{} {} {} (level {}, {})", i + 1, e.nickname, e.score, e.level, e.date);
        }
    }
}
