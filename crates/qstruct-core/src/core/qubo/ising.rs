use super::problem::{BinaryQuadraticProblem, ProblemError};
use serde::Serialize;

/// Spin form of a binary quadratic problem:
/// `E(s) = Σ hᵢsᵢ + Σ_{i<j} Jᵢⱼsᵢsⱼ + offset`, with `s ∈ {−1,+1}ⁿ` and `x = (s+1)/2`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsingModel {
    pub h: Vec<f64>,
    /// Upper-triangle couplings `(i, j, Jᵢⱼ)` with `i < j`; zero couplings are omitted.
    pub couplings: Vec<(usize, usize, f64)>,
    pub offset: f64,
}

impl IsingModel {
    pub fn num_spins(&self) -> usize {
        self.h.len()
    }

    pub fn energy(&self, spins: &[i8]) -> Result<f64, ProblemError> {
        if spins.len() != self.h.len() {
            return Err(ProblemError::AssignmentLength {
                expected: self.h.len(),
                actual: spins.len(),
            });
        }
        let field: f64 = self
            .h
            .iter()
            .zip(spins)
            .map(|(h, &s)| h * f64::from(s))
            .sum();
        let coupling: f64 = self
            .couplings
            .iter()
            .map(|&(i, j, jij)| jij * f64::from(spins[i]) * f64::from(spins[j]))
            .sum();
        Ok(field + coupling + self.offset)
    }
}

/// `+1 → true`, anything else → `false`.
pub fn spins_to_binary(spins: &[i8]) -> Vec<bool> {
    spins.iter().map(|&s| s > 0).collect()
}

impl BinaryQuadraticProblem {
    /// Converts to spin variables. The returned model reproduces
    /// `xᵗQx + offset` exactly for every assignment.
    pub fn to_ising(&self) -> IsingModel {
        let q = self.matrix();
        let n = self.num_variables();
        let mut h = vec![0.0; n];
        let mut couplings = Vec::new();
        let mut offset = self.offset();

        for i in 0..n {
            h[i] += q[(i, i)] / 2.0;
            offset += q[(i, i)] / 2.0;
            for j in (i + 1)..n {
                let qij = q[(i, j)];
                if qij == 0.0 {
                    continue;
                }
                // 2·Qij·xi·xj = (Qij/2)(1 + si + sj + si·sj)
                h[i] += qij / 2.0;
                h[j] += qij / 2.0;
                offset += qij / 2.0;
                couplings.push((i, j, qij / 2.0));
            }
        }

        IsingModel {
            h,
            couplings,
            offset,
        }
    }
}
