//! Progress display for export runs
//!
//! Shows a bar when the segmenter knows its total, a spinner otherwise,
//! with throughput and failure count as the message.

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress tracker for export runs
pub struct ProgressTracker {
    /// Start time of the run
    start_time: Instant,
    /// Progress bar (optional, can be disabled)
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    /// Create a new progress tracker
    ///
    /// # Arguments
    /// * `total` - Total number of records if known (None for unknown)
    /// * `enable_bar` - Whether to display a progress bar
    pub fn new(total: Option<u64>, enable_bar: bool) -> Self {
        let bar = enable_bar.then(|| match total {
            Some(n) => {
                let bar = ProgressBar::new(n);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                {
                    bar.set_style(style.progress_chars("#>-"));
                }
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) =
                    ProgressStyle::default_spinner().template("{spinner:.green} {pos} records {msg}")
                {
                    bar.set_style(style);
                }
                bar
            }
        });

        Self {
            start_time: Instant::now(),
            bar,
        }
    }

    /// A tracker that never draws
    pub fn hidden() -> Self {
        Self::new(None, false)
    }

    /// Update progress with the running counters
    ///
    /// # Arguments
    /// * `succeeded` - Records written so far
    /// * `failed` - Records that failed so far
    pub fn update(&self, succeeded: u64, failed: u64) {
        if let Some(ref bar) = self.bar {
            bar.set_position(succeeded + failed);

            let elapsed = self.start_time.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                let speed = (succeeded + failed) as f64 / elapsed;
                if failed > 0 {
                    bar.set_message(format!("({:.0} rec/sec, {} failed)", speed, failed));
                } else {
                    bar.set_message(format!("({:.0} rec/sec)", speed));
                }
            }
        }
    }

    /// Records counted so far, `None` when nothing is drawn
    pub fn position(&self) -> Option<u64> {
        self.bar.as_ref().map(ProgressBar::position)
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
