use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Counts settled documents. Drawn on stderr and hidden when that is not a
/// terminal, so console lines on stdout go through [`ProgressTracker::println`].
pub struct ProgressTracker {
    progress_bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new(total: u64) -> Self {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos:>3}/{len:3} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Downloading:");

        Self { progress_bar: pb }
    }

    pub fn hidden() -> Self {
        Self {
            progress_bar: ProgressBar::hidden(),
        }
    }

    pub fn println(&self, line: impl AsRef<str>) {
        self.progress_bar.suspend(|| println!("{}", line.as_ref()));
    }

    pub fn settle(&self) {
        self.progress_bar.inc(1);
    }

    pub fn finish(&self) {
        self.progress_bar.finish_and_clear();
    }
}
