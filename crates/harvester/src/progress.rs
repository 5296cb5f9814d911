//! Per-collection progress reporting: animated bars on a TTY, tracing
//! lines otherwise, nothing when quiet.

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

/// Advanced by the pagination engine once per edge. `start` is idempotent
/// so chunked walks sharing one sink report against a single total.
pub trait ProgressSink: Send {
    fn start(&mut self, label: &str, total: u64);
    fn step(&mut self);
}

/// How progress is reported for one run.
#[derive(Clone, Copy, Debug)]
pub enum ProgressMode {
    Interactive,
    Logging,
    Quiet,
}

impl ProgressMode {
    pub fn detect(quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if Term::stderr().is_term() {
            Self::Interactive
        } else {
            Self::Logging
        }
    }

    /// A fresh sink for one collection walk (or one chunked set of walks).
    pub fn sink(&self) -> Box<dyn ProgressSink> {
        match self {
            Self::Interactive => Box::<BarProgress>::default(),
            Self::Logging => Box::<LogProgress>::default(),
            Self::Quiet => Box::new(NoProgress),
        }
    }
}

/// Suppressed reporting.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&mut self, _label: &str, _total: u64) {}
    fn step(&mut self) {}
}

/// Structured-logging reporter for non-TTY runs (CI, pipes).
#[derive(Default)]
pub struct LogProgress {
    label: String,
    total: u64,
    count: u64,
    started: bool,
}

impl ProgressSink for LogProgress {
    fn start(&mut self, label: &str, total: u64) {
        if self.started {
            return;
        }
        self.started = true;
        self.label = label.to_string();
        self.total = total;
        info!(collection = %self.label, total, "collecting");
    }

    fn step(&mut self) {
        self.count += 1;
        debug!(collection = %self.label, count = self.count, total = self.total, "progress");
    }
}

impl Drop for LogProgress {
    fn drop(&mut self) {
        if self.started {
            info!(collection = %self.label, count = self.count, "collection complete");
        }
    }
}

/// Animated reporter for interactive runs.
#[derive(Default)]
pub struct BarProgress {
    bar: Option<ProgressBar>,
}

impl ProgressSink for BarProgress {
    fn start(&mut self, label: &str, total: u64) {
        if self.bar.is_some() {
            return;
        }
        let bar = ProgressBar::new(total).with_style(
            ProgressStyle::with_template("{msg:>14} {bar:40} {pos}/{len}")
                .expect("valid progress bar template"),
        );
        bar.set_message(label.to_string());
        self.bar = Some(bar);
    }

    fn step(&mut self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }
}

impl Drop for BarProgress {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
