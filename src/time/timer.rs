// src/time/timer.rs
use std::fmt;
use std::time::{Duration, Instant};

/// Wall-clock timer for one compilation phase.
pub struct Timer {
    title: String,
    start: Instant,
}

impl Timer {
    #[must_use]
    pub fn new(title: &str) -> Self {
        Self { title: title.to_string(), start: Instant::now() }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn stop(self) -> (String, Duration) {
        let elapsed = self.elapsed();
        (self.title, elapsed)
    }
}

/// Accumulates phase durations for the `--verbose` report.
#[derive(Default)]
pub struct PhaseTimings {
    entries: Vec<(String, Duration)>,
}

impl PhaseTimings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f`, recording its duration under `title`.
    pub fn time<F, R>(&mut self, title: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let timer = Timer::new(title);
        let result = f();
        self.entries.push(timer.stop());
        result
    }

    #[must_use]
    pub fn total(&self) -> Duration {
        self.entries.iter().map(|(_, d)| *d).sum()
    }
}

impl fmt::Display for PhaseTimings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (title, duration) in &self.entries {
            writeln!(f, "  {title:<12} {:>9.3} ms", duration.as_secs_f64() * 1000.0)?;
        }
        writeln!(f, "  {:<12} {:>9.3} ms", "total", self.total().as_secs_f64() * 1000.0)
    }
}
