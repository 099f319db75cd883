//! Fixed-timestep driver for the headless demo.
//!
//! Wall-clock time is accumulated and drained in fixed 60 Hz steps, so world
//! ticks and observer sampling advance at the same rate however long a
//! frame took.

use std::time::Instant;

/// Fixed simulation timestep: 60 Hz.
pub const FIXED_DT: f64 = 1.0 / 60.0;

/// Frames longer than this are clamped rather than caught up on.
pub const MAX_FRAME_TIME: f64 = 0.25;

pub struct GameLoop {
    previous_time: Instant,
    accumulator: f64,
    total_sim_time: f64,
    update_count: u64,
}

impl GameLoop {
    pub fn new() -> Self {
        Self {
            previous_time: Instant::now(),
            accumulator: 0.0,
            total_sim_time: 0.0,
            update_count: 0,
        }
    }

    /// Measures the time since the last call and runs as many fixed steps as
    /// fit. Stops at the first step that fails.
    pub fn tick<E>(&mut self, update_fn: impl FnMut(f64) -> Result<(), E>) -> Result<u32, E> {
        let now = Instant::now();
        let frame_time = now.duration_since(self.previous_time).as_secs_f64();
        self.previous_time = now;
        self.advance(frame_time, update_fn)
    }

    /// Runs fixed steps for an explicit frame time. Returns the step count.
    fn advance<E>(
        &mut self,
        frame_time: f64,
        mut update_fn: impl FnMut(f64) -> Result<(), E>,
    ) -> Result<u32, E> {
        let frame_time = if frame_time > MAX_FRAME_TIME {
            tracing::warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            MAX_FRAME_TIME
        } else {
            frame_time
        };

        self.accumulator += frame_time;
        let mut steps = 0;
        while self.accumulator >= FIXED_DT {
            update_fn(FIXED_DT)?;
            self.total_sim_time += FIXED_DT;
            self.accumulator -= FIXED_DT;
            self.update_count += 1;
            steps += 1;
        }
        Ok(steps)
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Simulated seconds so far.
    pub fn total_sim_time(&self) -> f64 {
        self.total_sim_time
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_steps(game_loop: &mut GameLoop, frame_time: f64) -> u32 {
        game_loop
            .advance(frame_time, |_| Ok::<_, ()>(()))
            .unwrap()
    }

    #[test]
    fn test_single_step() {
        let mut game_loop = GameLoop::new();
        assert_eq!(count_steps(&mut game_loop, FIXED_DT), 1);
        assert!(game_loop.accumulator.abs() < 1e-12);
    }

    #[test]
    fn test_multiple_steps_in_one_frame() {
        let mut game_loop = GameLoop::new();
        assert_eq!(count_steps(&mut game_loop, 3.0 * FIXED_DT + 1e-9), 3);
        assert_eq!(game_loop.update_count(), 3);
        assert!((game_loop.total_sim_time() - 3.0 * FIXED_DT).abs() < 1e-9);
    }

    #[test]
    fn test_short_frames_accumulate() {
        let mut game_loop = GameLoop::new();
        assert_eq!(count_steps(&mut game_loop, FIXED_DT * 0.6), 0);
        assert_eq!(count_steps(&mut game_loop, FIXED_DT * 0.6), 1);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut game_loop = GameLoop::new();
        // 0.25 s is fifteen steps, give or take float rounding.
        let steps = count_steps(&mut game_loop, 10.0);
        assert!((14..=15).contains(&steps), "{steps}");
    }

    #[test]
    fn test_failing_step_stops_the_frame() {
        let mut game_loop = GameLoop::new();
        let mut calls = 0;
        let result = game_loop.advance(5.0 * FIXED_DT, |_| {
            calls += 1;
            if calls == 2 { Err("stop") } else { Ok(()) }
        });
        assert_eq!(result, Err("stop"));
        assert_eq!(game_loop.update_count(), 1);
    }
}
