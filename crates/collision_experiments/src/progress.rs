//! Progress observation for long simulation runs.
//!
//! Workers report through a shared [`ProgressObserver`]. The console
//! implementation drives an `indicatif` bar and prints one line per
//! disclosure trial above it.

use indicatif::{ProgressBar, ProgressStyle};

/// A receiver line is printed for the first receiver of a share and every
/// this many after it.
pub const RECEIVER_REPORT_INTERVAL: usize = 1000;

/// One worker's state after finishing a disclosure trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialProgress {
    pub worker_id: usize,
    /// 1-based index of the trial within the worker's share.
    pub trial: usize,
    pub share: usize,
    /// Running totals over this worker's trials so far.
    pub collisions: u64,
    pub matches: u64,
}

pub trait ProgressObserver: Sync {
    fn population_started(&self, _receivers: usize) {}

    /// `built` is 1-based within the worker's `share`.
    fn receiver_built(&self, _worker_id: usize, _built: usize, _share: usize) {}

    fn trials_started(&self, _disclosures: usize) {}

    fn trial_completed(&self, _progress: &TrialProgress) {}
}

/// Discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Terminal progress: a bar per phase plus line-oriented reports.
///
/// [`ConsoleProgress::phases_only`] keeps the phase announcements and drops
/// the bar and the per-receiver and per-trial lines.
#[derive(Debug, Clone)]
pub struct ConsoleProgress {
    bar: ProgressBar,
    detailed: bool,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self {
            bar,
            detailed: true,
        }
    }

    pub fn phases_only() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            detailed: false,
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn start_phase(&self, len: usize, message: &'static str) {
        self.bar.set_length(len as u64);
        self.bar.set_position(0);
        self.bar.set_message(message);
    }

    fn line(&self, text: String) {
        self.bar.suspend(|| println!("{text}"));
    }

    fn receiver_line(&self, worker_id: usize, built: usize, share: usize) -> Option<String> {
        (self.detailed && (built - 1) % RECEIVER_REPORT_INTERVAL == 0)
            .then(|| format!("creating receivers worker {worker_id}, {built}/{share}"))
    }

    fn trial_line(&self, progress: &TrialProgress) -> Option<String> {
        self.detailed.then(|| {
            format!(
                "worker {}, {}/{}, collisions {}, matches {}",
                progress.worker_id,
                progress.trial,
                progress.share,
                progress.collisions,
                progress.matches
            )
        })
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ConsoleProgress {
    fn population_started(&self, receivers: usize) {
        self.line(format!("Creating {receivers} simulated receivers"));
        self.start_phase(receivers, "receivers");
    }

    fn receiver_built(&self, worker_id: usize, built: usize, share: usize) {
        self.bar.inc(1);
        if let Some(text) = self.receiver_line(worker_id, built, share) {
            self.line(text);
        }
    }

    fn trials_started(&self, disclosures: usize) {
        self.line("Starting disclosure simulation".to_string());
        self.start_phase(disclosures, "disclosures");
    }

    fn trial_completed(&self, progress: &TrialProgress) {
        self.bar.inc(1);
        if let Some(text) = self.trial_line(progress) {
            self.line(text);
        }
    }
}
