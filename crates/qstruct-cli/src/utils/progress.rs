use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use qstruct::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

const SPINNER_TICK_MS: u64 = 100;

/// Live view of an optimization run on stderr.
///
/// Every phase gets a spinner. Annealing reads drive a bar whose message is
/// the lowest read energy seen so far, and refinement shows the energy left
/// after each pass. A finished phase keeps its last message behind a tick.
#[derive(Clone)]
pub struct RunProgress {
    view: Arc<Mutex<RunView>>,
}

impl RunProgress {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::with_draw_target(
            None,
            ProgressDrawTarget::stderr(),
        ))
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            view: Arc::new(Mutex::new(RunView::new(bar))),
        }
    }

    /// Reads finish on worker threads. A poisoned lock is recovered.
    pub fn callback(&self) -> ProgressCallback<'static> {
        let view = Arc::clone(&self.view);
        Box::new(move |event| {
            view.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .apply(event)
        })
    }
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new()
    }
}

struct RunView {
    bar: ProgressBar,
    phase: &'static str,
    best_read: Option<f64>,
}

impl RunView {
    fn new(bar: ProgressBar) -> Self {
        Self {
            bar,
            phase: "",
            best_read: None,
        }
    }

    fn apply(&mut self, event: Progress) {
        match event {
            Progress::PhaseStart { name } => {
                self.phase = name;
                self.bar.reset();
                self.bar.set_style(spinner_style());
                self.bar.set_message(name);
                self.bar
                    .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            }
            Progress::PhaseFinish => {
                self.bar.disable_steady_tick();
                let summary = self.bar.message();
                self.bar.finish_with_message(format!("✓ {summary}"));
            }
            Progress::ReadsStart { total_reads } => {
                self.best_read = None;
                self.bar.reset();
                self.bar.set_length(total_reads);
                self.bar.set_prefix(self.phase);
                self.bar.set_style(reads_style());
                self.bar.set_message("waiting for the first read");
            }
            Progress::ReadFinished { energy } => {
                if self.best_read.is_none_or(|best| energy < best) {
                    self.best_read = Some(energy);
                    self.bar.set_message(format!("best energy {energy:.3}"));
                }
                self.bar.inc(1);
            }
            Progress::ReadsFinish => {
                let reads = self.bar.position();
                self.bar.set_style(spinner_style());
                self.bar.set_message(match self.best_read {
                    Some(best) => format!("{}: {reads} reads, best energy {best:.3}", self.phase),
                    None => format!("{}: no reads", self.phase),
                });
            }
            Progress::RefinementPass {
                pass,
                max_passes,
                moves,
                energy,
            } => {
                let noun = if moves == 1 { "move" } else { "moves" };
                self.bar.set_message(format!(
                    "{}: pass {pass}/{max_passes}, {moves} {noun}, energy {energy:.3}",
                    self.phase
                ));
            }
            Progress::Message(text) => self.bar.println(format!("  {text}")),
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn reads_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix} [{bar:30.cyan/blue}] {pos}/{len} reads, {msg} ({elapsed})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ")
}
