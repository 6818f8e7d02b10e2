//! Download progress bar
//!
//! The bar has one step per display segment. Downloads without a
//! `Content-Length` get a byte-counting spinner instead.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use cf_core::{ProgressObserver, SegmentPlan};

const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:50.cyan/blue}] {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";

pub struct DownloadProgress {
    bar: ProgressBar,
    plan: Mutex<Option<SegmentPlan>>,
    bytes_done: AtomicU64,
}

impl DownloadProgress {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new(0))
    }

    /// A progress observer that never draws
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::with_draw_target(
            Some(0),
            ProgressDrawTarget::hidden(),
        ))
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            plan: Mutex::new(None),
            bytes_done: AtomicU64::new(0),
        }
    }

    fn plan(&self) -> Option<SegmentPlan> {
        *self.plan.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn message(&self, done: u64, plan: &SegmentPlan) -> String {
        let done_human = humansize::format_size(done, humansize::BINARY);
        match plan.total_bytes {
            Some(total) => format!(
                "{done_human} / {}",
                humansize::format_size(total, humansize::BINARY)
            ),
            None => done_human,
        }
    }
}

impl Default for DownloadProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for DownloadProgress {
    fn start(&self, plan: &SegmentPlan) {
        *self.plan.lock().unwrap_or_else(|e| e.into_inner()) = Some(*plan);
        self.bytes_done.store(0, Ordering::Relaxed);

        let style = if plan.total_bytes.is_some() {
            self.bar.set_length(plan.segments);
            ProgressStyle::with_template(BAR_TEMPLATE)
        } else {
            ProgressStyle::with_template(SPINNER_TEMPLATE)
        };
        if let Ok(style) = style {
            self.bar.set_style(style.progress_chars("#>-"));
        }
        self.bar.set_position(0);
        self.bar.set_message(self.message(0, plan));
    }

    fn advance(&self, bytes: u64) {
        let done = self.bytes_done.fetch_add(bytes, Ordering::Relaxed) + bytes;
        if let Some(plan) = self.plan() {
            self.bar.set_position(plan.segments_completed(done));
            self.bar.set_message(self.message(done, &plan));
        } else {
            self.bar.tick();
        }
    }

    fn finish(&self) {
        self.bar.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_tracks_segments() {
        let progress = DownloadProgress::hidden();
        let plan = SegmentPlan::new(Some(1000), 50, 4096);

        progress.start(&plan);
        assert_eq!(progress.bar.length(), Some(50));

        progress.advance(20);
        progress.advance(19);
        assert_eq!(progress.bar.position(), 1);

        progress.advance(961);
        assert_eq!(progress.bar.position(), 50);
        assert_eq!(progress.bytes_done.load(Ordering::Relaxed), 1000);

        progress.finish();
        assert!(progress.bar.is_finished());
    }

    #[test]
    fn test_unknown_length_counts_bytes() {
        let progress = DownloadProgress::hidden();
        progress.start(&SegmentPlan::new(None, 50, 4096));
        progress.advance(4096);
        progress.advance(10);

        assert_eq!(progress.bytes_done.load(Ordering::Relaxed), 4106);
        assert_eq!(progress.bar.position(), 0);
    }
}
