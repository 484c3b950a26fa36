//! Render convergence: deciding when a lazily-loading page has settled.
//!
//! The detector repeatedly measures the rendered content height, scrolls to
//! the bottom to trigger more loading, then waits. Once enough consecutive
//! readings agree the page is considered stable. Pages that keep growing are
//! cut off after `max_iterations`.

use crate::renderer::PageHandle;
use std::time::Duration;
use tracing::debug;

/// Content height, tolerant of engines that report it on different boxes.
pub const HEIGHT_SCRIPT: &str =
    "Math.max(document.body.scrollHeight, document.documentElement.scrollHeight)";

/// Scroll to the bottom of the rendered content.
pub const LOAD_MORE_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Scroll back to the top.
pub const RESET_SCRIPT: &str = "window.scrollTo(0, 0)";

/// Iteration floor regardless of intensity.
pub const MIN_ITERATIONS: u32 = 20;

/// Default number of agreeing readings required.
pub const DEFAULT_MIN_STALLS: u32 = 3;

/// Default wait after each load-more action.
pub const DEFAULT_ITERATION_DELAY: Duration = Duration::from_millis(350);

/// Thresholds for the height-stall heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergenceConfig {
    pub max_iterations: u32,
    /// Length of the run of equal readings that counts as settled, including
    /// the first reading of the run. A value of 3 stops on the third equal
    /// reading, not after three repeats of it. Zero is treated as 1.
    pub min_consecutive_stalls: u32,
    pub iteration_delay: Duration,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self::for_intensity(10)
    }
}

impl ConvergenceConfig {
    /// `max(20, 3 * intensity)` iterations with the default stall window and delay.
    pub fn for_intensity(intensity: u32) -> Self {
        Self {
            max_iterations: intensity.saturating_mul(3).max(MIN_ITERATIONS),
            min_consecutive_stalls: DEFAULT_MIN_STALLS,
            iteration_delay: DEFAULT_ITERATION_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.iteration_delay = delay;
        self
    }

    pub fn with_min_stalls(mut self, stalls: u32) -> Self {
        self.min_consecutive_stalls = stalls;
        self
    }
}

/// What the detector observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergenceReport {
    /// Height readings taken.
    pub iterations: u32,
    pub final_height: i64,
    /// False when `max_iterations` ran out first.
    pub converged: bool,
}

/// Tracks the current run of agreeing height readings.
#[derive(Debug, Clone, Copy, Default)]
struct StallCounter {
    last: Option<i64>,
    run: u32,
}

impl StallCounter {
    /// Record a reading; returns the length of the run of equal readings it belongs to.
    fn observe(&mut self, height: i64) -> u32 {
        if self.last == Some(height) {
            self.run += 1;
        } else {
            self.run = 1;
        }
        self.last = Some(height);
        self.run
    }

    fn last_known(&self) -> i64 {
        self.last.unwrap_or(0)
    }
}

async fn measure<P: PageHandle>(page: &P) -> Option<i64> {
    let value = page.execute_js(HEIGHT_SCRIPT).await.ok()?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.round() as i64))
}

/// Scroll until the page height stops changing.
///
/// A failed measurement reuses the last known height. The final scroll reset
/// is best-effort.
pub async fn stabilize<P: PageHandle>(page: &P, config: &ConvergenceConfig) -> ConvergenceReport {
    let window = config.min_consecutive_stalls.max(1);
    let mut counter = StallCounter::default();
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;
        let height = match measure(page).await {
            Some(h) => h,
            None => {
                debug!("height measurement failed, reusing {}", counter.last_known());
                counter.last_known()
            }
        };
        let run = counter.observe(height);
        debug!("convergence iteration {iterations}: height={height} run={run}");
        if run >= window {
            converged = true;
            break;
        }

        let _ = page.execute_js(LOAD_MORE_SCRIPT).await;
        if !config.iteration_delay.is_zero() {
            tokio::time::sleep(config.iteration_delay).await;
        }
    }

    let _ = page.execute_js(RESET_SCRIPT).await;

    ConvergenceReport {
        iterations,
        final_height: counter.last_known(),
        converged,
    }
}
