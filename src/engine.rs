//! The engine facade the host drives.
//!
//! Owns the simulation, the background, the render cache and the instrumentation.
//! The host calls [`Engine::frame`] once per animation callback and forwards input
//! between frames.

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::assets::{IconKind, Icons};
use crate::background::{self, BgContext};
use crate::config::{Difficulty, GameConfig};
use crate::debug::{DebugMonitor, DebugSnapshot, FrameSample, LogKind, SystemInfo, FRAME_CAPACITY};
use crate::engine_loop::{FixedStepLoop, FrameTick};
use crate::entities::{BgLayers, Bird, EntityCounts};
use crate::error::EngineError;
use crate::events::{EngineEvent, EventBus, Subscription};
use crate::game::{EngineState, GameState};
use crate::lifecycle::{reset_engine, sync_prev_bird};
use crate::render::{Canvas, FrameView, Palette, RenderCache, Renderer};

#[cfg(target_arch = "wasm32")]
fn precise_now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

#[cfg(not(target_arch = "wasm32"))]
fn precise_now() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

pub struct Engine<C: Canvas> {
    config: GameConfig,
    state: EngineState,
    prev_bird: Bird,
    timing: FixedStepLoop,
    layers: BgLayers,
    rng: SmallRng,
    cache: RenderCache<C>,
    icons: Icons<C::Bitmap>,
    events: EventBus,
    debug: DebugMonitor,
    pipe_count: usize,
    last_now: f64,
}

impl<C: Canvas> Engine<C> {
    /// Validates `config`, builds the render cache against `canvas` and fills the
    /// background. A canvas whose context is already gone counts as unavailable.
    pub fn new(
        config: GameConfig,
        palette: Palette,
        canvas: &mut C,
        seed: u64,
        now: f64,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        if canvas.is_context_lost() {
            return Err(EngineError::ContextUnavailable);
        }

        let cache = RenderCache::build(canvas, &palette, &config);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut layers = BgLayers::default();
        background::populate(
            &mut layers,
            &BgContext {
                config: &config,
                cloud_sprites: &cache.cloud_sprites,
            },
            &mut rng,
        );

        let state = EngineState::new(&config);
        info!(
            "engine ready: {}x{} difficulty={} seed={seed}",
            config.width,
            config.height,
            config.difficulty.key()
        );
        Ok(Self {
            prev_bird: state.bird,
            timing: FixedStepLoop::new(config.fixed_step_ms, now),
            state,
            layers,
            rng,
            cache,
            icons: Icons::default(),
            events: EventBus::new(),
            debug: DebugMonitor::new(),
            pipe_count: 0,
            last_now: now,
            config,
        })
    }

    /// Runs the fixed steps due at `now`, then draws one frame.
    pub fn frame(&mut self, now: f64, canvas: &mut C) -> Result<FrameTick, EngineError> {
        if canvas.is_context_lost() {
            return Err(EngineError::ContextLost);
        }
        if now.is_finite() {
            self.last_now = now;
        }

        let update_start = precise_now();
        let tick = self.timing.advance(now);
        for _ in 0..tick.steps {
            self.step_once();
        }
        let update_ms = precise_now() - update_start;

        let draw_start = precise_now();
        let view = FrameView {
            config: &self.config,
            state: &self.state,
            prev_bird: &self.prev_bird,
            alpha: tick.alpha,
            layers: &self.layers,
            icons: &self.icons,
        };
        Renderer::new(&self.cache).draw_frame(canvas, &view);
        let draw_ms = precise_now() - draw_start;

        self.debug.record_frame(
            FrameSample {
                delta_ms: tick.delta_ms,
                update_ms,
                draw_ms,
            },
            self.last_now,
        );
        Ok(tick)
    }

    fn step_once(&mut self) {
        sync_prev_bird(&mut self.prev_bird, &self.state.bird);
        let dt = self.config.fixed_step_secs();

        let outcome = self.state.step(&self.config, dt, &mut self.rng);
        if outcome.pipes_changed {
            self.pipe_count = self.state.pipes.len();
        }
        if self.state.state.is_scrolling() {
            background::scroll(
                &mut self.layers,
                &BgContext {
                    config: &self.config,
                    cloud_sprites: &self.cache.cloud_sprites,
                },
                dt,
                &mut self.rng,
            );
        }

        if outcome.scored > 0 {
            self.notify(EngineEvent::ScoreChange(self.state.score));
        }
        if outcome.died {
            info!("run over with score {}", self.state.score);
            self.notify(EngineEvent::StateChange(GameState::Dead));
        }
    }

    fn notify(&mut self, event: EngineEvent) {
        let (kind, detail) = match event {
            EngineEvent::ScoreChange(score) => (LogKind::ScoreChange, score.to_string()),
            EngineEvent::StateChange(state) => (LogKind::StateChange, state.name().to_string()),
            EngineEvent::DifficultyChange(d) => (LogKind::DifficultyChange, d.key().to_string()),
        };
        self.debug.log(kind, self.last_now, detail);
        self.events.emit(event);
    }

    /// Flap impulse. Starts the run from idle; ignored while paused or dead.
    pub fn flap(&mut self) {
        if let Some(next) = self.state.flap(&self.config) {
            self.notify(EngineEvent::StateChange(next));
        }
    }

    /// Primary input: restarts after death, otherwise flaps.
    pub fn tap(&mut self, now: f64) {
        if self.state.state == GameState::Dead {
            self.reset(now);
        } else {
            self.flap();
        }
    }

    /// Freezes a running game. Returns whether anything changed.
    pub fn pause(&mut self) -> bool {
        if self.state.state != GameState::Play {
            return false;
        }
        self.state.state = GameState::Paused;
        self.notify(EngineEvent::StateChange(GameState::Paused));
        true
    }

    /// Continues a paused game. Loop timing restarts at `now` so the pause is not
    /// replayed as elapsed time.
    pub fn resume(&mut self, now: f64) -> bool {
        if self.state.state != GameState::Paused {
            return false;
        }
        self.timing.reset(now);
        self.state.state = GameState::Play;
        self.notify(EngineEvent::StateChange(GameState::Play));
        true
    }

    pub fn toggle_pause(&mut self, now: f64) -> bool {
        match self.state.state {
            GameState::Play => self.pause(),
            GameState::Paused => self.resume(now),
            GameState::Idle | GameState::Dead => false,
        }
    }

    /// Back to a fresh idle run. Background and caches are kept.
    pub fn reset(&mut self, now: f64) {
        let before = (self.state.state, self.state.score);
        let pipe_count = &mut self.pipe_count;
        reset_engine(
            &mut self.state,
            &mut self.timing,
            &mut self.prev_bird,
            &self.config,
            now,
            |n| *pipe_count = n,
        );
        if now.is_finite() {
            self.last_now = now;
        }
        if before.1 != 0 {
            self.notify(EngineEvent::ScoreChange(0));
        }
        if before.0 != GameState::Idle {
            self.notify(EngineEvent::StateChange(GameState::Idle));
        }
    }

    /// Swaps the physics preset and restarts the run.
    pub fn set_difficulty(&mut self, difficulty: Difficulty, now: f64) {
        if difficulty == self.config.difficulty {
            return;
        }
        info!("difficulty {} -> {}", self.config.difficulty.key(), difficulty.key());
        self.config = self.config.with_difficulty(difficulty);
        self.reset(now);
        self.notify(EngineEvent::DifficultyChange(difficulty));
    }

    pub fn set_difficulty_key(&mut self, key: &str, now: f64) -> Result<(), EngineError> {
        let difficulty = Difficulty::from_key(key)?;
        self.set_difficulty(difficulty, now);
        Ok(())
    }

    /// Rebuilds every cached resource for `palette`. The new cache replaces the old
    /// one in a single assignment.
    pub fn set_palette(&mut self, palette: Palette, canvas: &mut C) {
        let cache = RenderCache::build(canvas, &palette, &self.config);
        self.cache = cache;
        debug!("palette swapped");
    }

    /// Adopts new logical dimensions: caches are rebuilt, the background is regenerated
    /// and the run restarts. On error nothing changes.
    pub fn resize(&mut self, canvas: &mut C, width: f64, height: f64, now: f64) -> Result<(), EngineError> {
        let config = self.config.with_size(width, height);
        config.validate()?;
        let cache = RenderCache::build(canvas, &self.cache.palette, &config);

        self.config = config;
        self.cache = cache;
        self.layers.clear();
        background::populate(
            &mut self.layers,
            &BgContext {
                config: &self.config,
                cloud_sprites: &self.cache.cloud_sprites,
            },
            &mut self.rng,
        );
        self.reset(now);
        info!("resized to {width}x{height}");
        Ok(())
    }

    pub fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.events.unsubscribe(subscription)
    }

    /// Stores an asynchronously loaded icon. Failures keep the vector fallback.
    pub fn set_icon(&mut self, kind: IconKind, result: Result<C::Bitmap, EngineError>) {
        self.icons.resolve(kind, result);
    }

    pub fn start_recording(&mut self) {
        info!("debug recording started");
        self.debug.start_recording();
    }

    pub fn stop_recording(&mut self) {
        info!("debug recording stopped ({} entries)", self.debug.entries().len());
        self.debug.stop_recording();
    }

    /// Engine-side system facts; the host fills in what only it knows.
    pub fn system_info(&self) -> SystemInfo {
        SystemInfo {
            canvas_width: self.config.width,
            canvas_height: self.config.height,
            device_pixel_ratio: 1.0,
            fixed_step_ms: self.timing.fixed_step_ms(),
            frame_capacity: FRAME_CAPACITY,
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..SystemInfo::default()
        }
    }

    pub fn export_debug(&self, system: SystemInfo) -> DebugSnapshot {
        self.debug.export(self.last_now, self.entity_counts(), system)
    }

    pub fn entity_counts(&self) -> EntityCounts {
        self.layers.counts(self.pipe_count)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn game_state(&self) -> GameState {
        self.state.state
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn prev_bird(&self) -> &Bird {
        &self.prev_bird
    }

    pub fn layers(&self) -> &BgLayers {
        &self.layers
    }

    pub fn timing(&self) -> &FixedStepLoop {
        &self.timing
    }

    pub fn cache(&self) -> &RenderCache<C> {
        &self.cache
    }

    pub fn icons(&self) -> &Icons<C::Bitmap> {
        &self.icons
    }

    pub fn debug(&self) -> &DebugMonitor {
        &self.debug
    }
}
