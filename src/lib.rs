//! Skyline Flap: a fixed-timestep side-scroller engine with a procedural parallax
//! city background.
//!
//! Everything except the browser host compiles natively; the simulation and the
//! renderer are exercised in tests through [`render::RecordingCanvas`].

pub mod assets;
pub mod background;
pub mod config;
pub mod debug;
pub mod engine;
pub mod engine_loop;
pub mod entities;
pub mod error;
pub mod events;
pub mod game;
#[cfg(target_arch = "wasm32")]
mod hud;
pub mod lifecycle;
pub mod math;
pub mod render;

pub use config::{Difficulty, GameConfig, HostOptions};
pub use engine::Engine;
pub use error::EngineError;
pub use events::{EngineEvent, Subscription};
pub use game::GameState;

#[cfg(target_arch = "wasm32")]
pub use browser::{start, stop};

#[cfg(target_arch = "wasm32")]
mod browser {
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};

    use anyhow::{anyhow, Result};
    use js_sys::Function;
    use log::{error, info, warn};
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::{prelude::*, JsCast};
    use wasm_bindgen_futures::{spawn_local, JsFuture};
    use web_sys::{window, HtmlCanvasElement, HtmlImageElement};

    use crate::assets::IconKind;
    use crate::config::{Difficulty, GameConfig, HostOptions};
    use crate::engine::Engine;
    use crate::error::EngineError;
    use crate::events::EngineEvent;
    use crate::hud::Hud;
    use crate::render::web::WebCanvas;
    use crate::render::Palette;

    /// HUD debug line refresh interval, in rendered frames.
    const HUD_REFRESH_FRAMES: u64 = 15;

    struct App {
        engine: Engine<WebCanvas>,
        canvas: WebCanvas,
        hud: Hud,
        raf_closure: Option<Closure<dyn FnMut(f64)>>,
        raf_id: Option<i32>,
        frames: u64,
    }

    thread_local! {
        static APP: RefCell<Option<Rc<RefCell<App>>>> = const { RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub fn start() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();

        let window = window().ok_or_else(|| JsValue::from_str("No window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document"))?;
        let hud = Hud::new(&document)?;

        match run(&window, hud.clone()) {
            Ok(app) => {
                load_icons(&app);
                APP.with(|slot| *slot.borrow_mut() = Some(app));
                Ok(())
            }
            Err(err) => {
                error!("{:#}", err);
                hud.set_error(&fallback_message(&err));
                Err(JsValue::from_str(&format!("{err:#}")))
            }
        }
    }

    /// Cancels the pending animation frame and releases the engine. Listeners left
    /// on the page become no-ops.
    #[wasm_bindgen]
    pub fn stop() {
        let Some(app) = APP.with(|slot| slot.borrow_mut().take()) else {
            return;
        };
        match app.try_borrow_mut() {
            Ok(mut app) => app.teardown(),
            Err(_) => warn!("stop() called while a frame is running"),
        };
        info!("stopped");
    }

    fn fallback_message(err: &anyhow::Error) -> String {
        match err.downcast_ref::<EngineError>() {
            Some(EngineError::ContextUnavailable) => {
                "Canvas 2D is not available\nCheck browser support or hardware acceleration settings".into()
            }
            Some(EngineError::InvalidConfig { field, reason }) => {
                format!("Bad settings: {field} {reason}")
            }
            Some(other) => format!("Engine error ({})\n{other}", other.code()),
            None => format!("Startup failed\n{err:#}"),
        }
    }

    fn performance_now() -> f64 {
        window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or(0.0)
    }

    fn random_seed() -> u64 {
        let hi = (js_sys::Math::random() * u32::MAX as f64) as u64;
        let lo = (js_sys::Math::random() * u32::MAX as f64) as u64;
        (hi << 32) | lo
    }

    fn run(window: &web_sys::Window, hud: Hud) -> Result<Rc<RefCell<App>>> {
        let document = window.document().ok_or_else(|| anyhow!("No document"))?;
        let element = document
            .get_element_by_id("game-canvas")
            .ok_or_else(|| anyhow!("Missing canvas"))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| anyhow!("#game-canvas is not a canvas"))?;

        let options = HostOptions::from_query(&window.location().search().unwrap_or_default());
        let config = GameConfig::for_difficulty(options.difficulty.unwrap_or(Difficulty::Normal));
        let mut palette = match options.theme.as_deref() {
            Some("dusk") => Palette::dusk(),
            _ => Palette::default(),
        };
        if let Some(sky) = options.sky {
            palette.sky_top = sky;
        }
        let seed = options.seed.unwrap_or_else(random_seed);

        let mut canvas = WebCanvas::from_canvas(
            element.clone(),
            config.width,
            config.height,
            window.device_pixel_ratio(),
        )?;
        let mut engine = Engine::new(config, palette, &mut canvas, seed, performance_now())?;
        if options.debug {
            engine.start_recording();
        }

        let events_hud = hud.clone();
        engine.subscribe(move |event| match event {
            EngineEvent::ScoreChange(score) => events_hud.set_score(*score),
            EngineEvent::StateChange(state) => events_hud.set_state(*state),
            EngineEvent::DifficultyChange(difficulty) => {
                info!("difficulty is now {}", difficulty.key())
            }
        });

        let app = Rc::new(RefCell::new(App {
            engine,
            canvas,
            hud,
            raf_closure: None,
            raf_id: None,
            frames: 0,
        }));

        install_window_hooks(window, &app)?;
        install_input_listeners(window, &document, &element, &app)?;
        start_animation_loop(&app);
        Ok(app)
    }

    /// Runs `f` against the app if it is still alive and not mid-frame.
    fn with_app(app: &Weak<RefCell<App>>, f: impl FnOnce(&mut App)) {
        let Some(app) = app.upgrade() else { return };
        match app.try_borrow_mut() {
            Ok(mut guard) => f(&mut guard),
            Err(_) => warn!("input dropped: engine busy"),
        };
    }

    fn install_window_hooks(window: &web_sys::Window, app: &Rc<RefCell<App>>) -> Result<()> {
        let weak = Rc::downgrade(app);
        let jump = Closure::wrap(Box::new(move || {
            with_app(&weak, |app| app.engine.tap(performance_now()));
        }) as Box<dyn FnMut()>);
        let func: &Function = jump.as_ref().unchecked_ref();
        js_sys::Reflect::set(window, &JsValue::from_str("triggerJump"), func)
            .map_err(|_| anyhow!("cannot install triggerJump"))?;
        jump.forget();

        let weak = Rc::downgrade(app);
        let difficulty = Closure::wrap(Box::new(move |key: String| {
            with_app(&weak, |app| {
                if let Err(err) = app.engine.set_difficulty_key(&key, performance_now()) {
                    warn!("{err}");
                }
            });
        }) as Box<dyn FnMut(String)>);
        let func: &Function = difficulty.as_ref().unchecked_ref();
        js_sys::Reflect::set(window, &JsValue::from_str("setDifficulty"), func)
            .map_err(|_| anyhow!("cannot install setDifficulty"))?;
        difficulty.forget();

        let weak = Rc::downgrade(app);
        let export = Closure::wrap(Box::new(move || -> JsValue {
            let Some(app) = weak.upgrade() else {
                return JsValue::NULL;
            };
            let Ok(app) = app.try_borrow() else {
                return JsValue::NULL;
            };
            let mut system = app.engine.system_info();
            if let Some(win) = window() {
                system.user_agent = win.navigator().user_agent().unwrap_or_default();
                system.device_pixel_ratio = win.device_pixel_ratio();
            }
            match app.engine.export_debug(system).to_json() {
                Ok(text) => JsValue::from_str(&text),
                Err(err) => {
                    error!("debug export failed: {err}");
                    JsValue::NULL
                }
            }
        }) as Box<dyn FnMut() -> JsValue>);
        let func: &Function = export.as_ref().unchecked_ref();
        js_sys::Reflect::set(window, &JsValue::from_str("exportDebug"), func)
            .map_err(|_| anyhow!("cannot install exportDebug"))?;
        export.forget();
        Ok(())
    }

    fn install_input_listeners(
        window: &web_sys::Window,
        document: &web_sys::Document,
        canvas: &HtmlCanvasElement,
        app: &Rc<RefCell<App>>,
    ) -> Result<()> {
        let weak = Rc::downgrade(app);
        let key_closure = Closure::wrap(Box::new(move |event: web_sys::KeyboardEvent| {
            if event.repeat() {
                return;
            }
            let code = event.code();
            if matches!(code.as_str(), "Space" | "ArrowUp") {
                event.prevent_default();
            }
            with_app(&weak, |app| {
                let now = performance_now();
                match code.as_str() {
                    "Space" | "ArrowUp" => app.engine.tap(now),
                    "KeyP" | "Escape" => {
                        app.engine.toggle_pause(now);
                    }
                    "KeyR" => app.engine.reset(now),
                    "Digit1" => app.engine.set_difficulty(Difficulty::Easy, now),
                    "Digit2" => app.engine.set_difficulty(Difficulty::Normal, now),
                    "Digit3" => app.engine.set_difficulty(Difficulty::Hard, now),
                    "KeyD" => {
                        if app.engine.debug().is_recording() {
                            app.engine.stop_recording();
                        } else {
                            app.engine.start_recording();
                        }
                    }
                    _ => {}
                }
            });
        }) as Box<dyn FnMut(_)>);
        window
            .add_event_listener_with_callback("keydown", key_closure.as_ref().unchecked_ref())
            .map_err(|_| anyhow!("cannot listen for keydown"))?;
        key_closure.forget();

        let weak = Rc::downgrade(app);
        let mouse_closure = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            with_app(&weak, |app| app.engine.tap(performance_now()));
        }) as Box<dyn FnMut(_)>);
        canvas
            .add_event_listener_with_callback("mousedown", mouse_closure.as_ref().unchecked_ref())
            .map_err(|_| anyhow!("cannot listen for mousedown"))?;
        mouse_closure.forget();

        let weak = Rc::downgrade(app);
        let touch_closure = Closure::wrap(Box::new(move |event: web_sys::TouchEvent| {
            event.prevent_default();
            with_app(&weak, |app| app.engine.tap(performance_now()));
        }) as Box<dyn FnMut(_)>);
        canvas
            .add_event_listener_with_callback("touchstart", touch_closure.as_ref().unchecked_ref())
            .map_err(|_| anyhow!("cannot listen for touchstart"))?;
        touch_closure.forget();

        let weak = Rc::downgrade(app);
        let doc = document.clone();
        let visibility_closure = Closure::wrap(Box::new(move |_: web_sys::Event| {
            if doc.hidden() {
                with_app(&weak, |app| {
                    app.engine.pause();
                });
            }
        }) as Box<dyn FnMut(_)>);
        document
            .add_event_listener_with_callback(
                "visibilitychange",
                visibility_closure.as_ref().unchecked_ref(),
            )
            .map_err(|_| anyhow!("cannot listen for visibilitychange"))?;
        visibility_closure.forget();

        Ok(())
    }

    fn start_animation_loop(app: &Rc<RefCell<App>>) {
        let weak = Rc::downgrade(app);
        let closure = Closure::wrap(Box::new(move |time: f64| {
            let Some(app) = weak.upgrade() else { return };
            let Ok(mut guard) = app.try_borrow_mut() else {
                warn!("frame skipped: engine busy");
                return;
            };
            let app = &mut *guard;
            app.raf_id = None;

            if let Err(err) = app.engine.frame(time, &mut app.canvas) {
                error!("Frame error: {err}");
                if err.is_fatal() {
                    app.hud.set_error(&format!(
                        "Rendering stopped ({})\nReload the page to start again",
                        err.code()
                    ));
                    return;
                }
            }

            app.frames += 1;
            if app.frames % HUD_REFRESH_FRAMES == 0 {
                app.refresh_debug_line();
            }
            app.request_frame();
        }) as Box<dyn FnMut(f64)>);

        let mut app = app.borrow_mut();
        app.raf_closure = Some(closure);
        app.request_frame();
    }

    fn load_icons(app: &Rc<RefCell<App>>) {
        for kind in IconKind::ALL {
            let weak = Rc::downgrade(app);
            spawn_local(async move {
                let image = load_image(kind).await;
                let Some(app) = weak.upgrade() else { return };
                let Ok(mut guard) = app.try_borrow_mut() else {
                    warn!("icon `{}` arrived mid-frame; using fallback", kind.name());
                    return;
                };
                let app = &mut *guard;
                let bitmap = image.and_then(|image| app.canvas.bitmap_from_image(&image));
                app.engine.set_icon(kind, bitmap);
            });
        }
    }

    async fn load_image(kind: IconKind) -> Result<HtmlImageElement, EngineError> {
        let image = HtmlImageElement::new()
            .map_err(|err| EngineError::asset(kind.path(), format!("{err:?}")))?;
        image.set_src(kind.path());
        JsFuture::from(image.decode())
            .await
            .map_err(|err| EngineError::asset(kind.path(), format!("{err:?}")))?;
        Ok(image)
    }

    impl App {
        fn request_frame(&mut self) {
            let (Some(win), Some(cb)) = (window(), self.raf_closure.as_ref()) else {
                return;
            };
            match win.request_animation_frame(cb.as_ref().unchecked_ref()) {
                Ok(id) => self.raf_id = Some(id),
                Err(_) => error!("Failed to schedule animation frame"),
            }
        }

        fn refresh_debug_line(&self) {
            let fps = self.engine.timing().fps();
            let debug = self.engine.debug();
            if debug.is_recording() {
                self.hud.set_debug_line(fps, Some(&debug.ring().stats()));
            } else {
                self.hud.set_debug_line(fps, None);
            }
        }

        fn teardown(&mut self) {
            if let (Some(id), Some(win)) = (self.raf_id.take(), window()) {
                if win.cancel_animation_frame(id).is_err() {
                    warn!("cancel_animation_frame failed");
                }
            }
            self.raf_closure = None;
        }
    }
}
