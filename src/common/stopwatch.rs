use memory_stats::memory_stats;
use std::time::{Duration, Instant};
use tracing::info;

/// A cooperative timeout. Search loops poll [`StopWatch::has_finished`] once
/// per outer iteration; nothing is preempted mid-expansion.
#[derive(Debug)]
pub struct StopWatch {
    time_limit: Option<Duration>,
    start_time: Instant,
    last_log_time: Instant,
    peak_memory_usage_mb: Option<usize>,
}

impl StopWatch {
    /// Create a stopwatch with a limit in milliseconds. `u32::MAX` means no
    /// limit. The clock starts immediately.
    pub fn new(max_time_in_ms: u32) -> Self {
        let time_limit = if max_time_in_ms == u32::MAX {
            None
        } else {
            Some(Duration::from_millis(u64::from(max_time_in_ms)))
        };
        Self {
            time_limit,
            start_time: Instant::now(),
            last_log_time: Instant::now(),
            peak_memory_usage_mb: None,
        }
    }

    pub fn has_finished(&self) -> bool {
        match self.time_limit {
            Some(limit) => self.start_time.elapsed() > limit,
            None => false,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Emit a progress line at most once every ten seconds.
    pub fn log_if_needed(&mut self) {
        if self.last_log_time.elapsed() > Duration::from_secs(10) {
            self.last_log_time = Instant::now();
            self.log();
        }
    }

    pub fn log(&mut self) {
        let memory_usage = memory_stats().map(|usage| usage.physical_mem / 1024 / 1024);
        self.peak_memory_usage_mb = self.peak_memory_usage_mb.max(memory_usage);
        info!(
            memory_usage_mb = memory_usage,
            time_elapsed = self.start_time.elapsed().as_secs_f64(),
        );
    }

    pub fn peak_memory_usage_mb(&self) -> Option<usize> {
        self.peak_memory_usage_mb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_stopwatch_never_finishes() {
        let stopwatch = StopWatch::new(u32::MAX);
        assert!(!stopwatch.has_finished());
    }

    #[test]
    fn zero_limit_finishes_immediately() {
        let stopwatch = StopWatch::new(0);
        std::thread::sleep(Duration::from_millis(2));
        assert!(stopwatch.has_finished());
    }
}
