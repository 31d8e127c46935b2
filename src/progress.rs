//! Progress indicator for apply runs

use declarative::{NodeResult, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// An indicatif bar that advances once per finished node
pub struct ApplyProgress {
    bar: ProgressBar,
}

impl ApplyProgress {
    /// Bar drawn to stderr; hidden when `visible` is false
    pub fn new(total: usize, visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(Some(total as u64), target);
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        Self { bar }
    }

    /// Remove the bar so result lines print cleanly
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl ProgressCallback for ApplyProgress {
    fn on_level_start(&mut self, level: usize, count: usize) {
        self.bar
            .set_message(format!("level {} ({} resources)", level, count));
    }

    fn on_node_complete(&mut self, result: &NodeResult) {
        if !result.success {
            log::debug!("{} did not converge", result.id);
        }
        self.bar.inc(1);
    }

    fn on_level_complete(&mut self, level: usize) {
        log::trace!("Level {} complete", level);
    }
}
