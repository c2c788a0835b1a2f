//! Progress display for the install pipeline
//!
//! This module provides progress bar functionality using indicatif,
//! integrated with tracing for clean log output.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress manager for a sequential install run
pub struct InstallProgress {
    /// Multi-progress container for both bars
    multi: MultiProgress,
    /// Main bar tracking manifest directories processed
    main_bar: ProgressBar,
    /// Spinner showing the step currently running
    step_bar: ProgressBar,
}

impl InstallProgress {
    /// Create a progress manager for `total` manifest directories
    pub fn new(total: usize) -> Self {
        let multi = MultiProgress::new();

        let main_bar = multi.add(ProgressBar::new(total as u64));
        main_bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} manifests ({eta})",
                )
                .expect("Invalid progress template")
                .progress_chars("#>-"),
        );
        main_bar.enable_steady_tick(Duration::from_millis(100));

        let step_bar = multi.add(ProgressBar::new_spinner());
        step_bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.yellow} {msg}")
                .expect("Invalid spinner template"),
        );
        step_bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            multi,
            main_bar,
            step_bar,
        }
    }

    /// Announce the step about to run
    pub fn start_step(&self, message: &str) {
        self.step_bar.set_message(message.to_string());
    }

    /// Show the latest output line of the running step
    pub fn update_log(&self, line: &str) {
        self.step_bar.set_message(line.to_string());
    }

    /// Mark one manifest directory as fully processed
    pub fn finish_dir(&self) {
        self.main_bar.inc(1);
    }

    /// Finish the run
    pub fn finish(&self, processed: usize, total: usize) {
        self.step_bar.finish_and_clear();
        self.main_bar
            .finish_with_message(format!("Installed {}/{} manifests", processed, total));
    }

    /// Get the multi-progress for integration with tracing
    pub fn multi_progress(&self) -> &MultiProgress {
        &self.multi
    }
}

impl Drop for InstallProgress {
    fn drop(&mut self) {
        self.step_bar.finish_and_clear();
        if !self.main_bar.is_finished() {
            self.main_bar.finish_and_clear();
        }
    }
}
