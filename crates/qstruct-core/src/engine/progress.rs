/// Events emitted while an optimization runs.
///
/// Energies are `xᵗQx + offset`, so a feasible one-hot selection reports its
/// scaled objective and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    ReadsStart { total_reads: u64 },
    /// One annealing read finished. Reads may finish in any order.
    ReadFinished { energy: f64 },
    ReadsFinish,

    /// Emitted after each block-wise refinement pass.
    RefinementPass {
        pass: usize,
        max_passes: usize,
        moves: usize,
        energy: f64,
    },
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_ignores_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::Message("ignored".to_string()));
    }

    #[test]
    fn reporter_forwards_events_in_order() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            let label = match event {
                Progress::PhaseStart { name } => name.to_string(),
                Progress::ReadFinished { energy } => format!("{energy}"),
                _ => "other".to_string(),
            };
            seen.lock().unwrap().push(label);
        }));
        reporter.report(Progress::PhaseStart { name: "Encoding" });
        reporter.report(Progress::ReadFinished { energy: 2.5 });
        reporter.report(Progress::PhaseFinish);
        drop(reporter);
        assert_eq!(seen.into_inner().unwrap(), vec!["Encoding", "2.5", "other"]);
    }
}
