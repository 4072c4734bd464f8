use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::entities::{Bird, Pipe};
use crate::math::{rects_overlap, NOSE_DOWN, NOSE_UP};

/// First pipe appears this far beyond the right edge.
const PIPE_LEAD: f64 = 40.0;
/// Pipes are dropped once their right edge is this far past the left edge.
const PIPE_PRUNE_MARGIN: f64 = 80.0;
/// Keeps gaps away from the ceiling and the ground.
const GAP_MARGIN: f64 = 40.0;
const BOB_SPEED: f64 = 4.0;
const BOB_HEIGHT: f64 = 8.0;
/// Radians of pitch per px/s of vertical speed.
const PITCH_PER_SPEED: f64 = 0.0025;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    Idle,
    Play,
    Paused,
    Dead,
}

impl GameState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Play => "play",
            Self::Paused => "paused",
            Self::Dead => "dead",
        }
    }

    /// Whether the world scrolls in this state.
    pub fn is_scrolling(&self) -> bool {
        matches!(self, Self::Idle | Self::Play)
    }
}

/// What a single fixed step changed, for the engine to turn into events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub scored: u32,
    pub died: bool,
    pub pipes_changed: bool,
}

/// The authoritative simulation record.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub state: GameState,
    pub score: u32,
    pub pipes: Vec<Pipe>,
    pub bird: Bird,
    idle_time: f64,
}

impl EngineState {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            state: GameState::Idle,
            score: 0,
            pipes: Vec::new(),
            bird: Bird::at(config.bird_start_y()),
            idle_time: 0.0,
        }
    }

    /// Back to a fresh idle run. Returns how many pipes were removed.
    pub(crate) fn clear(&mut self, config: &GameConfig) -> usize {
        let removed = self.pipes.len();
        self.pipes.clear();
        self.bird = Bird::at(config.bird_start_y());
        self.score = 0;
        self.state = GameState::Idle;
        self.idle_time = 0.0;
        removed
    }

    /// Applies a flap. Starts the run from idle; ignored when paused or dead.
    /// Returns the new state if the flap caused a transition.
    pub fn flap(&mut self, config: &GameConfig) -> Option<GameState> {
        match self.state {
            GameState::Idle => {
                self.state = GameState::Play;
                self.bird.vy = config.flap_impulse;
                Some(GameState::Play)
            }
            GameState::Play => {
                self.bird.vy = config.flap_impulse;
                None
            }
            GameState::Paused | GameState::Dead => None,
        }
    }

    /// One fixed step of `dt` seconds.
    pub fn step<R: Rng>(&mut self, config: &GameConfig, dt: f64, rng: &mut R) -> StepOutcome {
        match self.state {
            GameState::Idle => {
                self.idle_time += dt;
                self.bird.y =
                    config.bird_start_y() + (self.idle_time * BOB_SPEED).sin() * BOB_HEIGHT;
                self.bird.vy = 0.0;
                self.bird.rotation = 0.0;
                StepOutcome::default()
            }
            GameState::Play => self.step_play(config, dt, rng),
            GameState::Paused | GameState::Dead => StepOutcome::default(),
        }
    }

    fn step_play<R: Rng>(&mut self, config: &GameConfig, dt: f64, rng: &mut R) -> StepOutcome {
        let mut outcome = StepOutcome::default();

        self.bird.vy = (self.bird.vy + config.gravity * dt).min(config.max_fall_speed);
        self.bird.y += self.bird.vy * dt;
        self.bird.rotation = (self.bird.vy * PITCH_PER_SPEED).clamp(NOSE_UP, NOSE_DOWN);

        let before = self.pipes.len();
        for pipe in &mut self.pipes {
            pipe.x -= config.pipe_speed * dt;
        }
        self.pipes
            .retain(|pipe| pipe.x + config.pipe_width >= -PIPE_PRUNE_MARGIN);
        let removed = before != self.pipes.len();
        let spawned = self.spawn_pipes(config, rng);
        outcome.pipes_changed = removed || spawned;

        for pipe in &mut self.pipes {
            if !pipe.scored && pipe.x + config.pipe_width < config.bird_x {
                pipe.scored = true;
                self.score += 1;
                outcome.scored += 1;
            }
        }

        if self.collides(config) {
            self.state = GameState::Dead;
            outcome.died = true;
        }
        outcome
    }

    fn spawn_pipes<R: Rng>(&mut self, config: &GameConfig, rng: &mut R) -> bool {
        let mut spawned = false;
        loop {
            let x = match self.pipes.last() {
                None => config.width + PIPE_LEAD,
                Some(last) if last.x + config.pipe_spacing <= config.width + config.pipe_width => {
                    last.x + config.pipe_spacing
                }
                Some(_) => break,
            };
            self.pipes.push(random_pipe(x, config, rng));
            spawned = true;
        }
        spawned
    }

    /// Bird against ceiling, ground and every pipe. Any overlap is fatal.
    pub fn collides(&self, config: &GameConfig) -> bool {
        let half = config.bird_size / 2.0;
        let bird = (
            config.bird_x - half,
            self.bird.y - half,
            config.bird_size,
            config.bird_size,
        );

        if bird.1 <= 0.0 || bird.1 + bird.3 >= config.ground_y() {
            return true;
        }

        self.pipes.iter().any(|pipe| {
            let top = (pipe.x, 0.0, config.pipe_width, pipe.gap_top());
            let bottom = (
                pipe.x,
                pipe.gap_bottom(),
                config.pipe_width,
                config.ground_y() - pipe.gap_bottom(),
            );
            rects_overlap(bird, top) || rects_overlap(bird, bottom)
        })
    }
}

fn random_pipe<R: Rng>(x: f64, config: &GameConfig, rng: &mut R) -> Pipe {
    let half = config.pipe_gap / 2.0;
    let lo = half + GAP_MARGIN;
    let hi = (config.ground_y() - half - GAP_MARGIN).max(lo);
    Pipe {
        x,
        gap_center: lo + rng.gen::<f64>() * (hi - lo),
        gap: config.pipe_gap,
        scored: false,
    }
}
