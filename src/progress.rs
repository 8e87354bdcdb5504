//! Progress reporting utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for watch runs
#[derive(Debug)]
pub struct ProgressReporter {
    pub fetch_pb: Option<ProgressBar>,
    pub hash_pb: Option<ProgressBar>,
    pub diff_pb: Option<ProgressBar>,
    pub deliver_pb: Option<ProgressBar>,
    show_progress: bool,
    start_time: std::time::Instant,
}

impl ProgressReporter {
    /// Create progress reporter for a watch run
    pub fn new_for_run() -> Self {
        // Only create the first spinner; later phases appear as they start
        let fetch_pb = create_spinner("Fetching document...");

        Self {
            fetch_pb: Some(fetch_pb),
            hash_pb: None,
            diff_pb: None,
            deliver_pb: None,
            show_progress: true,
            start_time: std::time::Instant::now(),
        }
    }

    /// Create minimal progress reporter (no progress bars)
    pub fn new_minimal() -> Self {
        Self {
            fetch_pb: None,
            hash_pb: None,
            diff_pb: None,
            deliver_pb: None,
            show_progress: false,
            start_time: std::time::Instant::now(),
        }
    }

    /// Lazily create the fingerprint spinner when needed
    fn ensure_hash_pb(&mut self) {
        if self.show_progress && self.hash_pb.is_none() {
            self.hash_pb = Some(create_spinner("Fingerprinting tabs..."));
        }
    }

    /// Lazily create the diff spinner when needed
    fn ensure_diff_pb(&mut self) {
        if self.show_progress && self.diff_pb.is_none() {
            self.diff_pb = Some(create_spinner("Diffing changed tabs..."));
        }
    }

    /// Lazily create the delivery spinner when needed
    fn ensure_deliver_pb(&mut self) {
        if self.show_progress && self.deliver_pb.is_none() {
            self.deliver_pb = Some(create_spinner("Delivering notifications..."));
        }
    }

    /// Finish the fetch phase and prepare for fingerprinting
    pub fn finish_fetch(&mut self, message: &str) {
        if let Some(pb) = self.fetch_pb.take() {
            pb.finish_with_message(message.to_string());
        }
        self.ensure_hash_pb();
    }

    /// Finish the fingerprint phase
    pub fn finish_hash(&mut self, message: &str) {
        self.ensure_hash_pb();
        if let Some(pb) = self.hash_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    /// Finish the diff phase
    pub fn finish_diff(&mut self, message: &str) {
        self.ensure_diff_pb();
        if let Some(pb) = self.diff_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    /// Finish the delivery phase
    pub fn finish_deliver(&mut self, message: &str) {
        self.ensure_deliver_pb();
        if let Some(pb) = self.deliver_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    /// Finish all progress bars
    pub fn finish_all(&mut self, message: &str) {
        self.finish_fetch(message);
        self.finish_hash(message);
        self.finish_diff(message);
        self.finish_deliver(message);
    }

    /// Time elapsed since the run started
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        // Ensure all progress bars are cleaned up silently
        if let Some(pb) = self.fetch_pb.take() {
            pb.finish_and_clear();
        }
        if let Some(pb) = self.hash_pb.take() {
            pb.finish_and_clear();
        }
        if let Some(pb) = self.diff_pb.take() {
            pb.finish_and_clear();
        }
        if let Some(pb) = self.deliver_pb.take() {
            pb.finish_and_clear();
        }
    }
}

/// Create a spinner progress bar
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.green} {msg}")
            .expect("Invalid progress template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
