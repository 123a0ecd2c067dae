//! Progress bar display of a running batch.
//!
//! [`ProgressDisplay`] is driven by the batch's event collector: child bars
//! appear when a part receives its first chunk, and the main bar advances
//! each time a part reaches its terminal state.

use crate::progress::StyleOptions;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};
use std::collections::HashMap;

/// Progress display manager that coordinates the bars of one batch.
pub struct ProgressDisplay {
    multi: MultiProgress,
    main: ProgressBar,
    children: HashMap<usize, ProgressBar>,
    style_options: StyleOptions,
}

impl ProgressDisplay {
    /// Create a display for a batch of `total_parts` parts.
    pub fn new(style_options: StyleOptions, total_parts: usize) -> Self {
        let multi = match style_options.is_enabled() {
            true => MultiProgress::new(),
            false => MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        };

        let main = multi.add(style_options.main().to_progress_bar(total_parts as u64));
        main.tick();

        Self {
            multi,
            main,
            children: HashMap::new(),
            style_options,
        }
    }

    /// Get the main progress bar.
    pub fn main(&self) -> &ProgressBar {
        &self.main
    }

    /// Number of parts currently shown with a child bar.
    pub fn active_parts(&self) -> usize {
        self.children.len()
    }

    /// Update the child bar of a part, creating it on first use.
    ///
    /// While `total` is unknown the bar has no length.
    pub fn progress(&mut self, index: usize, received: u64, total: Option<u64>) {
        let pb = self.children.entry(index).or_insert_with(|| {
            self.multi
                .add(self.style_options.child().to_progress_bar(total.unwrap_or(0)))
        });
        match total {
            Some(total) => pb.set_length(total),
            None => pb.unset_length(),
        }
        pb.set_position(received);
    }

    /// Close the child bar of a part and advance the main bar.
    pub fn finish_part(&mut self, index: usize) {
        if let Some(pb) = self.children.remove(&index) {
            if self.style_options.child().clear {
                pb.finish_and_clear();
            } else {
                pb.finish();
            }
        }
        self.main.inc(1);
    }

    /// Finish the display, clearing or keeping the main bar per configuration.
    pub fn finish(self) {
        for (_, pb) in self.children {
            pb.finish_and_clear();
        }
        if self.style_options.main().clear {
            self.main.finish_and_clear();
        } else {
            self.main.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressBarOpts;

    fn hidden() -> StyleOptions {
        StyleOptions::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden())
    }

    #[test]
    fn test_children_follow_parts() {
        let mut display = ProgressDisplay::new(hidden(), 2);
        display.progress(0, 10, Some(100));
        display.progress(1, 5, None);
        display.progress(0, 20, Some(100));
        assert_eq!(display.active_parts(), 2);

        display.finish_part(0);
        assert_eq!(display.active_parts(), 1);
        assert_eq!(display.main().position(), 1);

        // A part that never received data still advances the main bar.
        display.finish_part(1);
        display.finish_part(2);
        assert_eq!(display.main().position(), 3);
        display.finish();
    }
}
