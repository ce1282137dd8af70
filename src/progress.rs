//! Progress tracking and display using indicatif
//!
//! The converter reports progress through the input file by bytes read.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::info;

/// Progress tracker for conversion runs
pub struct ProgressTracker {
    enabled: bool,
}

impl ProgressTracker {
    /// Create a new progress tracker
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Create a progress bar over the bytes of an input file
    pub fn create_conversion_progress(&self, total_bytes: u64, file_name: &str) -> Option<ProgressBar> {
        if !self.enabled || total_bytes == 0 {
            return None;
        }

        let pb = ProgressBar::new(total_bytes);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏ ")
        );
        pb.set_message(format!("Converting {}...", file_name));
        pb.enable_steady_tick(Duration::from_millis(100));

        info!("Started progress tracking for: {}", file_name);
        Some(pb)
    }

    /// Update progress and optionally change message
    pub fn update_progress(pb: &Option<ProgressBar>, increment: u64, message: Option<&str>) {
        if let Some(ref progress) = pb {
            progress.inc(increment);
            if let Some(msg) = message {
                progress.set_message(msg.to_string());
            }
        }
    }

    /// Finish progress with success message
    pub fn finish_progress(pb: Option<ProgressBar>, success_message: &str) {
        if let Some(progress) = pb {
            progress.finish_with_message(success_message.to_string());
            info!("Progress completed: {}", success_message);
        }
    }

    /// Finish progress with error message
    pub fn finish_with_error(pb: Option<ProgressBar>, error_message: &str) {
        if let Some(progress) = pb {
            progress.abandon_with_message(format!("❌ {}", error_message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_tracker_creation() {
        let enabled_tracker = ProgressTracker::new(true);
        let disabled_tracker = ProgressTracker::new(false);

        assert!(enabled_tracker.enabled);
        assert!(!disabled_tracker.enabled);
    }

    #[test]
    fn test_progress_bar_creation_when_disabled() {
        let tracker = ProgressTracker::new(false);
        let pb = tracker.create_conversion_progress(1024, "board.drl");

        assert!(pb.is_none());
    }

    #[test]
    fn test_progress_bar_creation_when_enabled() {
        let tracker = ProgressTracker::new(true);
        let pb = tracker.create_conversion_progress(1024, "board.drl");

        assert!(pb.is_some());
        ProgressTracker::update_progress(&pb, 512, Some("halfway"));
        assert_eq!(pb.as_ref().map(|p| p.position()), Some(512));
        ProgressTracker::finish_progress(pb, "done");
    }

    #[test]
    fn test_empty_file_progress() {
        let tracker = ProgressTracker::new(true);
        let pb = tracker.create_conversion_progress(0, "empty.drl");

        assert!(pb.is_none());
    }
}
