//! Time management utilities

use std::time::{Duration, Instant};

/// Monotonic tick clock
///
/// The clock starts when it is created; every [`Timer::update`] measures the
/// time since the previous update (or since creation for the first one).
#[derive(Debug, Clone)]
pub struct Timer {
    last_tick: Instant,
    delta_time: f32,
    total_time: f32,
    tick_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            tick_count: 0,
        }
    }

    /// Advance the clock and return the seconds elapsed since the previous tick
    pub fn update(&mut self) -> f32 {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_tick).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_tick = now;
        self.tick_count += 1;
        self.delta_time
    }

    /// Seconds between the last two updates
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Accumulated seconds over all updates
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Number of updates so far
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

/// Simple stopwatch for measuring elapsed time
#[derive(Debug, Clone)]
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Reset to zero and start again
    pub fn restart(&mut self) {
        self.elapsed = Duration::ZERO;
        self.start();
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        self.elapsed + self.start_time.map_or(Duration::ZERO, |start| start.elapsed())
    }

    /// Time left until `budget` is used up, if any
    pub fn remaining(&self, budget: Duration) -> Option<Duration> {
        budget.checked_sub(self.elapsed()).filter(|left| !left.is_zero())
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}
