// src/domain/progress.rs
// Progress scraping for simulation-engine stdout

use std::fmt;

use tracing::debug;

/// Marker that opens the unsteady flow computation phase
pub const COMPUTATION_MARKER: &str = "LABEL= Unsteady Flow Computations";

/// Marker that closes the computation phase
pub const WARMUP_MARKER: &str = "LABEL= Unsteady Flow Warmup";

/// Marker carried by every progress line (`PROGRESS = 0.10`)
pub const PROGRESS_MARKER: &str = "PROGRESS";

/// Maximum distance between a reported value and a threshold for a match
pub const MATCH_TOLERANCE: f64 = 0.01;

const DECILES: [f64; 10] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

/// A crossed decile threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    fraction: f64,
}

impl ProgressEvent {
    /// Threshold fraction, 0.1 through 1.0
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Threshold as a whole percentage, 10 through 100
    pub fn percent(&self) -> u8 {
        (self.fraction * 100.0).round() as u8
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Stateful filter turning model log lines into decile progress events.
///
/// Progress lines only count while the computation phase is open, i.e. while
/// more computation markers than warm-up markers have been seen. Every decile
/// fires at most once per watcher.
#[derive(Debug, Clone)]
pub struct ProgressWatcher {
    logging_depth: i32,
    pending: Vec<f64>,
}

impl Default for ProgressWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressWatcher {
    pub fn new() -> Self {
        Self {
            logging_depth: 0,
            pending: DECILES.to_vec(),
        }
    }

    /// Feed one line of model output, returning the threshold it crossed, if any
    pub fn feed(&mut self, line: &str) -> Option<ProgressEvent> {
        if line.contains(COMPUTATION_MARKER) {
            self.logging_depth += 1;
        }

        if line.contains(WARMUP_MARKER) {
            self.logging_depth -= 1;
        }

        if self.logging_depth > 0 && line.contains(PROGRESS_MARKER) {
            return self.take_threshold(line);
        }

        None
    }

    /// Whether progress lines are currently being considered
    pub fn in_computation(&self) -> bool {
        self.logging_depth > 0
    }

    /// Thresholds that have not fired yet, in ascending order
    pub fn pending(&self) -> &[f64] {
        &self.pending
    }

    fn take_threshold(&mut self, line: &str) -> Option<ProgressEvent> {
        let (_, value) = line.split_once('=')?;
        let value = value.trim();

        // Values are single precision in the model's log; widen after rounding
        let num = match value.parse::<f32>() {
            Ok(num) => f64::from(num),
            Err(_) => {
                debug!(line, "ignoring progress line with unparseable value");
                return None;
            }
        };

        let index = self
            .pending
            .iter()
            .position(|val| (val - num).abs() < MATCH_TOLERANCE)?;

        Some(ProgressEvent {
            fraction: self.pending.remove(index),
        })
    }
}
