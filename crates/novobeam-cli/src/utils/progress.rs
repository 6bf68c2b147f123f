use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use novobeam::engine::progress::{Progress, ProgressCallback};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const SPINNER_TICK_MS: u64 = 80;
const BAR_TEMPLATE: &str =
    "{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} spectra {prefix:.red} ({eta})";

/// Batch-decoding progress on stderr: a bar over spectra plus a running failure count.
///
/// `ProgressBar` is internally shared, so the handler and its callbacks can be
/// cloned freely across rayon workers.
#[derive(Clone)]
pub struct CliProgressHandler {
    bar: ProgressBar,
    failed: Arc<AtomicUsize>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(None, target);
        bar.set_style(spinner_style());
        Self {
            bar,
            failed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Spectra reported as failed since the last phase started.
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let handler = self.clone();
        Box::new(move |progress| handler.handle(progress))
    }

    fn handle(&self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => {
                self.failed.store(0, Ordering::Relaxed);
                self.bar.reset();
                self.bar.set_length(0);
                self.bar.set_prefix("");
                self.bar.set_style(spinner_style());
                self.bar.set_message(name);
                self.bar
                    .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            }
            Progress::TaskStart { total_steps } => {
                self.bar.set_length(total_steps);
                self.bar.set_position(0);
                self.bar.set_style(bar_style());
            }
            Progress::TaskIncrement => self.bar.inc(1),
            Progress::ItemFailed { id, reason } => {
                let failed = self.failed.fetch_add(1, Ordering::Relaxed) + 1;
                self.bar.set_prefix(format!("{failed} failed"));
                self.bar.suspend(|| eprintln!("  ✗ spectrum {id}: {reason}"));
            }
            Progress::TaskFinish => {
                if let Some(length) = self.bar.length() {
                    self.bar.set_position(length);
                }
            }
            Progress::PhaseFinish => {
                self.bar.disable_steady_tick();
                let summary = match self.failed() {
                    0 => "✓ All spectra decoded".to_string(),
                    n => format!("✓ Decoding finished, {n} spectra failed"),
                };
                self.bar.finish_with_message(summary);
            }
            Progress::Message(msg) => self.bar.set_message(msg),
        }
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}
