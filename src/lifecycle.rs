//! Reset and restart.

use log::debug;

use crate::config::GameConfig;
use crate::engine_loop::FixedStepLoop;
use crate::entities::Bird;
use crate::game::EngineState;

/// Copies position, velocity and rotation from `bird` into `prev_bird`.
pub fn sync_prev_bird(prev_bird: &mut Bird, bird: &Bird) {
    prev_bird.y = bird.y;
    prev_bird.vy = bird.vy;
    prev_bird.rotation = bird.rotation;
}

/// Returns the engine to a fresh idle run.
///
/// The bird goes back to its spawn point, pipes are cleared (the new pipe count is
/// reported through `on_pipe_count_change`), the interpolation snapshot is synced so
/// the first frame cannot blend from a stale position, and the loop forgets any
/// banked time. Safe to call any number of times.
pub fn reset_engine<F>(
    state: &mut EngineState,
    timing: &mut FixedStepLoop,
    prev_bird: &mut Bird,
    config: &GameConfig,
    now: f64,
    mut on_pipe_count_change: F,
) where
    F: FnMut(usize),
{
    let removed = state.clear(config);
    if removed > 0 {
        debug!("reset cleared {removed} pipes");
    }
    on_pipe_count_change(state.pipes.len());
    sync_prev_bird(prev_bird, &state.bird);
    timing.set_fixed_step(config.fixed_step_ms);
    timing.reset(now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Difficulty, GameConfig};
    use crate::entities::Pipe;
    use crate::game::GameState;

    fn dirty_state(config: &GameConfig) -> EngineState {
        let mut state = EngineState::new(config);
        state.flap(config);
        state.score = 9;
        state.state = GameState::Dead;
        state.bird = Bird {
            y: 12.0,
            vy: 340.0,
            rotation: 1.1,
        };
        state.pipes.push(Pipe {
            x: 10.0,
            gap_center: 200.0,
            gap: 150.0,
            scored: true,
        });
        state
    }

    #[test]
    fn reset_syncs_prev_bird_and_zeroes_run() {
        for difficulty in Difficulty::ALL {
            let config = GameConfig::for_difficulty(difficulty);
            let mut state = dirty_state(&config);
            let mut timing = FixedStepLoop::new(config.fixed_step_ms, 0.0);
            timing.advance(config.fixed_step_ms * 0.7);
            let mut prev = Bird {
                y: -50.0,
                vy: 1.0,
                rotation: -0.3,
            };
            let mut reported = Vec::new();

            reset_engine(&mut state, &mut timing, &mut prev, &config, 1234.0, |n| {
                reported.push(n)
            });

            assert_eq!(prev, state.bird);
            assert_eq!(state.score, 0);
            assert_eq!(state.state, GameState::Idle);
            assert!(state.pipes.is_empty());
            assert_eq!(reported, vec![0]);
            assert_eq!(timing.accumulator(), 0.0);
            assert_eq!(timing.frame_time(), 1234.0);
        }
    }

    #[test]
    fn reset_is_repeatable() {
        let config = GameConfig::default();
        let mut state = dirty_state(&config);
        let mut timing = FixedStepLoop::new(config.fixed_step_ms, 0.0);
        let mut prev = Bird::default();
        let mut calls = 0;
        for _ in 0..3 {
            reset_engine(&mut state, &mut timing, &mut prev, &config, 50.0, |_| calls += 1);
            assert_eq!(prev, state.bird);
        }
        assert_eq!(calls, 3);
        assert_eq!(state, EngineState::new(&config));
    }

    #[test]
    fn sync_is_idempotent_and_leaves_source_alone() {
        let bird = Bird {
            y: 210.5,
            vy: -430.0,
            rotation: -0.45,
        };
        let original = bird;
        let mut once = Bird::default();
        sync_prev_bird(&mut once, &bird);

        let mut many = Bird::default();
        for _ in 0..5 {
            sync_prev_bird(&mut many, &bird);
        }
        assert_eq!(once, many);
        assert_eq!(many, bird);
        assert_eq!(bird, original);
    }
}
