//! Progress reporting for collection item import
//!
//! Provides a progress bar wrapper using indicatif.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Progress indicator counting imported items
pub struct ImportProgress {
    bar: ProgressBar,
}

impl ImportProgress {
    /// Create a progress bar for `total` items; hidden when `visible` is false.
    pub fn new(total: u64, collection: &str, visible: bool) -> Self {
        let bar = ProgressBar::new(total);
        if !visible {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} items")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░");
        bar.set_style(style);
        bar.set_message(format!("Importing {collection}"));
        if visible {
            bar.enable_steady_tick(Duration::from_millis(100));
        }

        Self { bar }
    }

    /// Advance by one uploaded page.
    pub fn advance(&self, items: u64) {
        self.bar.inc(items);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish_with_message(&self, msg: &str) {
        self.bar.finish_with_message(msg.to_string());
    }

    /// Finish and clear the progress bar
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}
