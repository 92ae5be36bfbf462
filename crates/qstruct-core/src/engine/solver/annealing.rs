use super::{SolverBackend, SolverError, SolverOutcome};
use crate::core::qubo::BinaryQuadraticProblem;
use crate::engine::config::AnnealingConfig;
use crate::engine::progress::{Progress, ProgressReporter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Repeated single-flip simulated annealing, keeping the best of all reads.
///
/// Every read owns a generator seeded from a value drawn sequentially from the
/// caller's generator, so the first `N` reads are identical for any
/// `num_reads >= N` and the result does not depend on thread scheduling.
#[derive(Debug, Clone)]
pub struct LocalAnnealingSolver {
    config: AnnealingConfig,
}

#[derive(Debug, Clone)]
struct Read {
    assignment: Vec<bool>,
    energy: f64,
}

impl LocalAnnealingSolver {
    pub const NAME: &'static str = "local-annealing";

    pub fn new(config: AnnealingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnnealingConfig {
        &self.config
    }

    fn anneal(&self, problem: &BinaryQuadraticProblem, seed: u64) -> Read {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = problem.num_variables();
        let mut x: Vec<bool> = (0..n).map(|_| rng.gen_bool(0.5)).collect();

        let mut temperature = self.config.initial_temperature;
        while temperature > self.config.final_temperature {
            for _ in 0..self.config.steps_per_temperature {
                let i = rng.gen_range(0..n);
                let delta = problem.flip_delta(&x, i);
                if delta < 0.0 || rng.r#gen::<f64>() < (-delta / temperature).exp() {
                    x[i] = !x[i];
                }
            }
            temperature *= self.config.cooling_rate;
        }

        let energy = problem.energy_unchecked(&x) + problem.offset();
        trace!(seed, energy, "Annealing read finished.");
        Read {
            assignment: x,
            energy,
        }
    }

    fn run_reads(
        &self,
        problem: &BinaryQuadraticProblem,
        seeds: &[u64],
        reporter: &ProgressReporter,
    ) -> Vec<Read> {
        let run = |&seed: &u64| {
            let read = self.anneal(problem, seed);
            reporter.report(Progress::ReadFinished { energy: read.energy });
            read
        };

        #[cfg(feature = "parallel")]
        {
            seeds.par_iter().map(run).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            seeds.iter().map(run).collect()
        }
    }
}

impl SolverBackend for LocalAnnealingSolver {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    #[instrument(level = "debug", skip_all, fields(num_reads = self.config.num_reads))]
    fn solve(
        &self,
        problem: &BinaryQuadraticProblem,
        rng: &mut StdRng,
        reporter: &ProgressReporter,
    ) -> Result<SolverOutcome, SolverError> {
        let num_reads = self.config.num_reads.max(1);
        let seeds: Vec<u64> = (0..num_reads).map(|_| rng.r#gen::<u64>()).collect();

        reporter.report(Progress::ReadsStart {
            total_reads: num_reads as u64,
        });
        let reads = self.run_reads(problem, &seeds, reporter);
        reporter.report(Progress::ReadsFinish);

        let (best_index, best) = reads
            .into_iter()
            .enumerate()
            .min_by(|(ia, a), (ib, b)| a.energy.total_cmp(&b.energy).then(ia.cmp(ib)))
            .ok_or_else(|| SolverError::MalformedResponse("annealing produced no reads".into()))?;

        debug!(best_read = best_index, energy = best.energy, "Annealing complete.");
        Ok(SolverOutcome {
            assignment: best.assignment,
            energy: best.energy,
            backend: Self::NAME,
        })
    }
}
