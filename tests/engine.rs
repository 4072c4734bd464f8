use std::cell::RefCell;
use std::rc::Rc;

use skyline_flap::assets::IconKind;
use skyline_flap::config::FIXED_STEP_MS;
use skyline_flap::debug::{DebugSnapshot, LogKind};
use skyline_flap::render::{DrawOp, Palette, RecordedBitmap, RecordingCanvas};
use skyline_flap::{Difficulty, Engine, EngineError, EngineEvent, GameConfig, GameState};

struct Harness {
    engine: Engine<RecordingCanvas>,
    canvas: RecordingCanvas,
    frame: u64,
}

impl Harness {
    fn new(seed: u64) -> Self {
        Self::with_config(GameConfig::default(), seed)
    }

    fn with_config(config: GameConfig, seed: u64) -> Self {
        let mut canvas = RecordingCanvas::new(config.width, config.height);
        let engine = Engine::new(config, Palette::default(), &mut canvas, seed, 0.0).unwrap();
        Self {
            engine,
            canvas,
            frame: 0,
        }
    }

    fn now(&self) -> f64 {
        self.frame as f64 * FIXED_STEP_MS
    }

    /// One display frame at exactly the simulation rate.
    fn tick(&mut self) -> u32 {
        self.frame += 1;
        self.canvas.clear_ops();
        let now = self.now();
        self.engine.frame(now, &mut self.canvas).unwrap().steps
    }

    fn run(&mut self, frames: u64) {
        for _ in 0..frames {
            self.tick();
        }
    }

    /// Flaps whenever the bird sinks below the gap of the next pipe it has to pass.
    fn autopilot(&mut self) {
        let config = self.engine.config();
        let state = self.engine.state();
        let radius = config.bird_size / 2.0;
        let target = state
            .pipes
            .iter()
            .find(|p| p.x + config.pipe_width >= config.bird_x - radius)
            .map(|p| p.gap_center)
            .unwrap_or_else(|| config.bird_start_y());
        if state.bird.y > target + 10.0 {
            self.engine.flap();
        }
    }

    fn record_events(&mut self) -> Rc<RefCell<Vec<EngineEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        self.engine.subscribe(move |e| sink.borrow_mut().push(*e));
        events
    }
}

#[test]
fn same_seed_same_run() {
    let mut a = Harness::new(99);
    let mut b = Harness::new(99);
    for h in [&mut a, &mut b] {
        h.run(30);
        h.engine.tap(h.now());
        for _ in 0..600 {
            h.autopilot();
            h.tick();
        }
    }
    assert_eq!(a.engine.state(), b.engine.state());
    assert_eq!(a.engine.layers(), b.engine.layers());
}

#[test]
fn autopilot_scores_and_events_track_score() {
    let mut h = Harness::new(3);
    let events = h.record_events();
    h.engine.tap(0.0);
    for _ in 0..60 * 30 {
        h.autopilot();
        h.tick();
    }

    assert!(h.engine.score() >= 1, "score {}", h.engine.score());
    let scores: Vec<u32> = events
        .borrow()
        .iter()
        .filter_map(|e| match e {
            EngineEvent::ScoreChange(s) => Some(*s),
            _ => None,
        })
        .collect();
    let expected: Vec<u32> = (1..=h.engine.score()).collect();
    assert_eq!(scores, expected);
    assert_eq!(events.borrow()[0], EngineEvent::StateChange(GameState::Play));
}

#[test]
fn falling_bird_dies_once_and_freezes() {
    let mut h = Harness::new(5);
    let events = h.record_events();
    h.engine.flap();
    h.run(60 * 5);

    assert_eq!(h.engine.game_state(), GameState::Dead);
    let deaths = events
        .borrow()
        .iter()
        .filter(|e| **e == EngineEvent::StateChange(GameState::Dead))
        .count();
    assert_eq!(deaths, 1);

    let bird = h.engine.state().bird;
    let layers = h.engine.layers().clone();
    h.run(30);
    assert_eq!(h.engine.state().bird, bird);
    assert_eq!(*h.engine.layers(), layers);

    // flaps are ignored while dead
    h.engine.flap();
    assert_eq!(h.engine.game_state(), GameState::Dead);
}

#[test]
fn tap_after_death_resets_to_idle() {
    let mut h = Harness::new(8);
    let events = h.record_events();
    h.engine.flap();
    h.run(60 * 5);
    assert_eq!(h.engine.game_state(), GameState::Dead);

    let now = h.now();
    h.engine.tap(now);
    assert_eq!(h.engine.game_state(), GameState::Idle);
    assert_eq!(h.engine.score(), 0);
    assert!(h.engine.state().pipes.is_empty());
    assert_eq!(h.engine.entity_counts().pipes, 0);
    assert_eq!(*h.engine.prev_bird(), h.engine.state().bird);
    assert_eq!(h.engine.timing().accumulator(), 0.0);
    assert_eq!(
        events.borrow().last(),
        Some(&EngineEvent::StateChange(GameState::Idle))
    );
}

#[test]
fn reset_twice_is_harmless() {
    let mut h = Harness::new(1);
    h.engine.tap(0.0);
    h.run(90);
    let now = h.now();
    h.engine.reset(now);
    let first = h.engine.state().clone();
    h.engine.reset(now);
    assert_eq!(*h.engine.state(), first);
    assert_eq!(*h.engine.prev_bird(), h.engine.state().bird);
}

#[test]
fn hitch_is_clamped_to_five_steps() {
    let mut h = Harness::new(2);
    h.engine.tap(0.0);
    let tick = h.engine.frame(10_000.0, &mut h.canvas).unwrap();
    assert_eq!(tick.steps, 5);
}

#[test]
fn difficulty_change_restarts_with_new_tuning() {
    let mut h = Harness::new(4);
    let events = h.record_events();
    h.engine.tap(0.0);
    h.run(200);

    let now = h.now();
    h.engine.set_difficulty(Difficulty::Hard, now);
    assert_eq!(h.engine.config().difficulty, Difficulty::Hard);
    assert_eq!(h.engine.config().pipe_gap, Difficulty::Hard.pipe_gap());
    assert_eq!(h.engine.game_state(), GameState::Idle);
    assert_eq!(
        events.borrow().last(),
        Some(&EngineEvent::DifficultyChange(Difficulty::Hard))
    );

    let err = h.engine.set_difficulty_key("impossible", now).unwrap_err();
    assert_eq!(err.code(), "INVALID_CONFIG");
    assert_eq!(h.engine.config().difficulty, Difficulty::Hard);
}

#[test]
fn unsubscribed_listener_goes_quiet() {
    let mut h = Harness::new(6);
    let count = Rc::new(RefCell::new(0));
    let c = count.clone();
    let sub = h.engine.subscribe(move |_| *c.borrow_mut() += 1);
    h.engine.flap();
    assert!(h.engine.unsubscribe(sub));
    h.engine.pause();
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn palette_swap_rebuilds_cache() {
    let mut h = Harness::new(7);
    h.run(10);
    let dusk = Palette::dusk();
    h.engine.set_palette(dusk.clone(), &mut h.canvas);
    assert_eq!(h.engine.cache().palette, dusk);
    h.tick();
    assert!(h
        .canvas
        .ops()
        .contains(&DrawOp::SetFillColor(dusk.ground)));
}

#[test]
fn resize_validates_before_changing_anything() {
    let mut h = Harness::new(9);
    let err = h.engine.resize(&mut h.canvas, 0.0, 600.0, 0.0).unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfig { field: "width", .. }));
    assert_eq!(h.engine.config().width, 400.0);

    h.canvas.resize(800.0, 600.0);
    h.engine.resize(&mut h.canvas, 800.0, 600.0, 0.0).unwrap();
    assert_eq!(h.engine.config().width, 800.0);
    let reach = h
        .engine
        .layers()
        .buildings
        .iter()
        .map(|b| b.x + b.w)
        .fold(f64::MIN, f64::max);
    assert!(reach >= 800.0);
}

#[test]
fn lost_context_is_a_distinct_error() {
    let mut h = Harness::new(10);
    h.run(3);
    h.canvas.lose_context();
    let err = h.engine.frame(1000.0, &mut h.canvas).unwrap_err();
    assert_eq!(err.code(), "CANVAS_CONTEXT_LOST");
    assert!(err.is_fatal());
}

#[test]
fn failed_cloud_bitmaps_do_not_stop_the_game() {
    let config = GameConfig::default();
    let mut canvas = RecordingCanvas::new(config.width, config.height);
    canvas.fail_bitmaps = true;
    canvas.fail_gradients = true;
    let mut engine = Engine::new(config, Palette::default(), &mut canvas, 11, 0.0).unwrap();
    engine.tap(0.0);
    for i in 1..=120 {
        canvas.clear_ops();
        engine.frame(i as f64 * FIXED_STEP_MS, &mut canvas).unwrap();
        assert_eq!(canvas.count(|op| matches!(op, DrawOp::DrawBitmap { .. })), 0);
    }
}

#[test]
fn icons_replace_fallbacks_once_loaded() {
    let mut h = Harness::new(12);
    h.engine.tap(0.0);
    h.tick();
    let clouds = h.canvas.count(|op| matches!(op, DrawOp::DrawBitmap { .. }));

    h.engine.set_icon(
        IconKind::Heart,
        Err(EngineError::asset("assets/heart.png", "404")),
    );
    h.engine.set_icon(
        IconKind::Cheese,
        Ok(RecordedBitmap {
            width: 32,
            height: 32,
            ops: 0,
        }),
    );
    h.tick();
    let with_icon = h.canvas.count(|op| matches!(op, DrawOp::DrawBitmap { .. }));
    assert!(with_icon >= 1);
    assert!(h.engine.icons().cheese.bitmap().is_some());
    assert!(h.engine.icons().heart.bitmap().is_none());
    // cloud count can change between frames, the score icon adds exactly one draw
    let cloud_draws = with_icon - 1;
    assert!(cloud_draws.abs_diff(clouds) <= 2);
}

#[test]
fn recording_export_round_trips() {
    let mut h = Harness::new(13);
    h.engine.start_recording();
    h.engine.tap(0.0);
    h.run(120);
    let now = h.now();
    h.engine.set_difficulty(Difficulty::Easy, now);
    h.engine.stop_recording();

    let snapshot = h.engine.export_debug(h.engine.system_info());
    assert_eq!(snapshot, h.engine.export_debug(h.engine.system_info()));
    assert_eq!(snapshot.stats.window, 120);
    assert_eq!(snapshot.sparkline.len(), 120);
    assert!(snapshot
        .log
        .iter()
        .any(|e| e.kind == LogKind::StateChange && e.detail == "play"));
    assert!(snapshot
        .log
        .iter()
        .any(|e| e.kind == LogKind::DifficultyChange && e.detail == "easy"));

    let text = snapshot.to_json().unwrap();
    assert_eq!(DebugSnapshot::from_json(&text).unwrap(), snapshot);

    h.engine.start_recording();
    assert!(h.engine.debug().entries().is_empty());
}

#[test]
fn background_stays_bounded_over_a_long_idle() {
    let mut h = Harness::new(14);
    let mut max_total = 0;
    for _ in 0..60 * 120 {
        h.tick();
        let c = h.engine.entity_counts();
        let total =
            c.far_clouds + c.mid_clouds + c.skyline_segments + c.buildings + c.trees + c.planes + c.ground_deco;
        max_total = max_total.max(total);
    }
    assert!(max_total < 400, "{max_total}");
}
