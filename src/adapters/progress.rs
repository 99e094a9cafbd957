// src/adapters/progress.rs
// Progress reporting adapters: plain log lines, or an indicatif bar at a terminal

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::{domain::progress::ProgressEvent, ports::progress::ProgressReporter};

/// Line written for every crossed decile, kept stable for log scrapers
pub fn progress_message(event: ProgressEvent) -> String {
    format!("MODEL RUN PROGRESS = {event}")
}

/// Format a duration as human-readable
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs_f64();

    if total_seconds < 0.1 {
        format!("{:.1}ms", duration.as_millis())
    } else if total_seconds < 1.0 {
        format!("{:.2}s", total_seconds)
    } else if total_seconds < 60.0 {
        format!("{:.1}s", total_seconds)
    } else {
        let minutes = (total_seconds / 60.0).floor();
        let seconds = total_seconds % 60.0;
        format!("{}m {:.1}s", minutes, seconds)
    }
}

/// Reports progress through the log stream only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressReporter;

impl ProgressReporter for LogProgressReporter {
    fn start(&self, model_name: &str) {
        info!(model = model_name, "Running model....");
    }

    fn report(&self, event: ProgressEvent) {
        info!(percent = event.percent(), "{}", progress_message(event));
    }

    fn finish(&self, _success: bool) {}
}

/// Reports progress on an indicatif bar, for runs watched at a terminal
pub struct BarProgressReporter {
    progress_bar: ProgressBar,
    use_colors: bool,
}

impl BarProgressReporter {
    /// Create a reporter drawing to stderr
    pub fn new(use_colors: bool) -> Self {
        Self::with_bar(ProgressBar::new(100), use_colors)
    }

    /// Create a reporter around an existing bar, e.g. `ProgressBar::hidden()`
    pub fn with_bar(progress_bar: ProgressBar, use_colors: bool) -> Self {
        let template = if use_colors {
            "{spinner:.cyan} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% {msg}"
        } else {
            "{spinner} [{elapsed_precise}] {bar:40} {pos:>3}% {msg}"
        };
        let bar_style = ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");

        progress_bar.set_length(100);
        progress_bar.set_style(bar_style);

        Self {
            progress_bar,
            use_colors,
        }
    }

    /// Current position of the bar, in percent
    pub fn position(&self) -> u64 {
        self.progress_bar.position()
    }

    fn styled(&self, text: &str, success: bool) -> String {
        match (self.use_colors, success) {
            (false, _) => text.to_string(),
            (true, true) => style(text).green().to_string(),
            (true, false) => style(text).red().bold().to_string(),
        }
    }
}

impl ProgressReporter for BarProgressReporter {
    fn start(&self, model_name: &str) {
        info!(model = model_name, "Running model....");
        self.progress_bar.set_message(model_name.to_string());
        self.progress_bar.enable_steady_tick(Duration::from_millis(200));
    }

    fn report(&self, event: ProgressEvent) {
        info!(percent = event.percent(), "{}", progress_message(event));
        self.progress_bar.set_position(u64::from(event.percent()));
    }

    fn finish(&self, success: bool) {
        let elapsed = format_duration(self.progress_bar.elapsed());
        if success {
            let message = self.styled(&format!("model finished ({elapsed})"), true);
            self.progress_bar.finish_with_message(message);
        } else {
            let message = self.styled(&format!("model failed ({elapsed})"), false);
            self.progress_bar.abandon_with_message(message);
        }
    }
}
