use indicatif::ProgressBar;
use tfold::{Sequence, TransformHandler, TransformResult};

const BAR_RESOLUTION: u64 = 1000;

/// Renders the engine's progress events as a terminal bar.
///
/// The bar draws on stderr, so it never mixes with record output, and
/// clears itself when the run finishes.
pub struct ProgressHandler {
    bar: ProgressBar,
}

impl ProgressHandler {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::new(BAR_RESOLUTION),
        }
    }
}

impl TransformHandler for ProgressHandler {
    fn progress(&mut self, ratio: f64) {
        self.bar.set_position((ratio * BAR_RESOLUTION as f64) as u64);
    }

    fn finish(&mut self, _: &Sequence, _: &TransformResult) {
        self.bar.finish_and_clear();
    }
}
