//! Coarse progress reporting for a single profile scrape.

use indicatif::{ProgressBar, ProgressStyle};

/// Milestones of one scrape, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Checkpoint {
    /// The browser is running and a tab is open.
    SessionReady,
    /// Navigation finished and the profile header rendered.
    PageLoaded,
    /// All three fields were read from the page.
    DataRead,
    /// The result is staged and visible in the preview.
    Populated,
}

impl Checkpoint {
    pub(crate) fn percent(self) -> u64 {
        match self {
            Checkpoint::SessionReady => 10,
            Checkpoint::PageLoaded => 50,
            Checkpoint::DataRead => 90,
            Checkpoint::Populated => 100,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Checkpoint::SessionReady => "browser ready",
            Checkpoint::PageLoaded => "page loaded",
            Checkpoint::DataRead => "data read",
            Checkpoint::Populated => "done",
        }
    }
}

/// Sink for scrape progress. Frontends implement this to show feedback;
/// nothing about correctness depends on it.
pub(crate) trait Progress {
    /// Called once before the browser is launched.
    fn begin(&mut self, _url: &str) {}

    fn checkpoint(&mut self, _checkpoint: Checkpoint) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub(crate) struct NullProgress;
impl Progress for NullProgress {}

/// Terminal progress bar on stderr, 0..=100.
pub(crate) struct BarProgress {
    bar: Option<ProgressBar>,
}

impl BarProgress {
    pub(crate) fn new() -> Self {
        Self { bar: None }
    }
}

impl Progress for BarProgress {
    fn begin(&mut self, url: &str) {
        let bar = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% {msg}")
        {
            bar.set_style(style.progress_chars("##-"));
        }
        bar.set_message(url.to_string());
        self.bar = Some(bar);
    }

    fn checkpoint(&mut self, checkpoint: Checkpoint) {
        if let Some(bar) = &self.bar {
            bar.set_position(checkpoint.percent());
            bar.set_message(checkpoint.label());
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
