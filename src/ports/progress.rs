// src/ports/progress.rs

use crate::domain::progress::ProgressEvent;

/// Surfaces model progress to whoever is watching the run
pub trait ProgressReporter: Send + Sync {
    /// Called once before the model is launched
    fn start(&self, model_name: &str);

    /// Called for every decile the model crosses
    fn report(&self, event: ProgressEvent);

    /// Called once after the model exits, successfully or not
    fn finish(&self, success: bool);
}

pub mod mock {
    use std::sync::Mutex;

    use super::*;

    /// Reporter that remembers every call, for assertions
    #[derive(Default)]
    pub struct RecordingProgressReporter {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingProgressReporter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Calls so far, as `start basin`, `report 10%`, `finish true`
        pub fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .map(|calls| calls.clone())
                .unwrap_or_default()
        }

        fn record(&self, call: String) {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call);
            }
        }
    }

    impl ProgressReporter for RecordingProgressReporter {
        fn start(&self, model_name: &str) {
            self.record(format!("start {model_name}"));
        }

        fn report(&self, event: ProgressEvent) {
            self.record(format!("report {event}"));
        }

        fn finish(&self, success: bool) {
            self.record(format!("finish {success}"));
        }
    }
}
