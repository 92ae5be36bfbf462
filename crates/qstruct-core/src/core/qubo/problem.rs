use nalgebra::DMatrix;
use thiserror::Error;

const SYMMETRY_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error, PartialEq)]
pub enum ProblemError {
    #[error("Problem matrix is empty")]
    Empty,
    #[error("Problem matrix is not square ({rows}×{cols})")]
    NotSquare { rows: usize, cols: usize },
    #[error("Problem matrix has a non-finite entry at ({row}, {col})")]
    NonFinite { row: usize, col: usize },
    #[error("Problem matrix is not symmetric at ({row}, {col})")]
    NotSymmetric { row: usize, col: usize },
    #[error("Problem offset is not finite")]
    NonFiniteOffset,
    #[error("Assignment has {actual} variables, problem has {expected}")]
    AssignmentLength { expected: usize, actual: usize },
}

/// A symmetric `Q` matrix plus a constant energy offset.
///
/// The matrix is validated on construction (square, finite, symmetric) and is
/// never mutated afterwards, so solvers can use it without re-checking.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryQuadraticProblem {
    matrix: DMatrix<f64>,
    offset: f64,
}

impl BinaryQuadraticProblem {
    /// Builds a problem from an arbitrary square matrix, replacing it with
    /// `(Q + Qᵗ) / 2`. The quadratic form is unchanged by this.
    pub fn symmetrized(matrix: DMatrix<f64>, offset: f64) -> Result<Self, ProblemError> {
        validate_shape_and_values(&matrix, offset)?;
        let symmetric = (&matrix + matrix.transpose()) * 0.5;
        Ok(Self {
            matrix: symmetric,
            offset,
        })
    }

    /// Builds a problem from a matrix that must already be symmetric.
    pub fn from_symmetric(matrix: DMatrix<f64>, offset: f64) -> Result<Self, ProblemError> {
        validate_shape_and_values(&matrix, offset)?;
        let n = matrix.nrows();
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (matrix[(i, j)], matrix[(j, i)]);
                let scale = a.abs().max(b.abs()).max(1.0);
                if (a - b).abs() > SYMMETRY_TOLERANCE * scale {
                    return Err(ProblemError::NotSymmetric { row: i, col: j });
                }
            }
        }
        Ok(Self { matrix, offset })
    }

    pub fn num_variables(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn is_symmetric(&self) -> bool {
        self.matrix == self.matrix.transpose()
    }

    fn check_len(&self, x: &[bool]) -> Result<(), ProblemError> {
        if x.len() != self.num_variables() {
            return Err(ProblemError::AssignmentLength {
                expected: self.num_variables(),
                actual: x.len(),
            });
        }
        Ok(())
    }

    /// `xᵗQx`, without the offset.
    pub fn energy(&self, x: &[bool]) -> Result<f64, ProblemError> {
        self.check_len(x)?;
        Ok(self.energy_unchecked(x))
    }

    /// `xᵗQx + offset`.
    pub fn shifted_energy(&self, x: &[bool]) -> Result<f64, ProblemError> {
        Ok(self.energy(x)? + self.offset)
    }

    pub(crate) fn energy_unchecked(&self, x: &[bool]) -> f64 {
        let active: Vec<usize> = x
            .iter()
            .enumerate()
            .filter_map(|(i, &on)| on.then_some(i))
            .collect();
        active
            .iter()
            .map(|&i| active.iter().map(|&j| self.matrix[(i, j)]).sum::<f64>())
            .sum()
    }

    /// Energy change from flipping bit `i`, using only row `i` of `Q`.
    pub(crate) fn flip_delta(&self, x: &[bool], i: usize) -> f64 {
        let coupling: f64 = x
            .iter()
            .enumerate()
            .filter(|&(j, &on)| on && j != i)
            .map(|(j, _)| self.matrix[(i, j)])
            .sum();
        let gain = self.matrix[(i, i)] + 2.0 * coupling;
        if x[i] { -gain } else { gain }
    }
}

fn validate_shape_and_values(matrix: &DMatrix<f64>, offset: f64) -> Result<(), ProblemError> {
    let (rows, cols) = matrix.shape();
    if rows == 0 || cols == 0 {
        return Err(ProblemError::Empty);
    }
    if rows != cols {
        return Err(ProblemError::NotSquare { rows, cols });
    }
    for col in 0..cols {
        for row in 0..rows {
            if !matrix[(row, col)].is_finite() {
                return Err(ProblemError::NonFinite { row, col });
            }
        }
    }
    if !offset.is_finite() {
        return Err(ProblemError::NonFiniteOffset);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn small_problem() -> BinaryQuadraticProblem {
        let m = DMatrix::from_row_slice(3, 3, &[1.0, 4.0, 0.0, 0.0, -2.0, 1.0, 2.0, 3.0, 0.5]);
        BinaryQuadraticProblem::symmetrized(m, 0.0).unwrap()
    }

    #[test]
    fn symmetrized_matrix_is_symmetric_and_preserves_energy() {
        let raw = DMatrix::from_row_slice(3, 3, &[1.0, 4.0, 0.0, 0.0, -2.0, 1.0, 2.0, 3.0, 0.5]);
        let problem = small_problem();
        assert!(problem.is_symmetric());
        assert!(f64_approx_equal(problem.matrix()[(0, 1)], 2.0));
        for bits in 0..8u32 {
            let x: Vec<bool> = (0..3).map(|k| bits & (1 << k) != 0).collect();
            let v = DMatrix::from_iterator(3, 1, x.iter().map(|&b| if b { 1.0 } else { 0.0 }));
            let direct = (v.transpose() * &raw * &v)[(0, 0)];
            assert!(f64_approx_equal(problem.energy(&x).unwrap(), direct));
        }
    }

    #[test]
    fn flip_delta_matches_energy_difference() {
        let problem = small_problem();
        for bits in 0..8u32 {
            let x: Vec<bool> = (0..3).map(|k| bits & (1 << k) != 0).collect();
            for i in 0..3 {
                let mut flipped = x.clone();
                flipped[i] = !flipped[i];
                let expected = problem.energy(&flipped).unwrap() - problem.energy(&x).unwrap();
                assert!(f64_approx_equal(problem.flip_delta(&x, i), expected));
            }
        }
    }

    #[test]
    fn shifted_energy_adds_offset() {
        let m = DMatrix::from_row_slice(2, 2, &[-1.0, 1.0, 1.0, -1.0]);
        let problem = BinaryQuadraticProblem::from_symmetric(m, 1.0).unwrap();
        assert!(f64_approx_equal(problem.shifted_energy(&[true, false]).unwrap(), 0.0));
        assert!(f64_approx_equal(problem.shifted_energy(&[true, true]).unwrap(), 1.0));
    }

    #[test]
    fn non_square_matrix_is_rejected() {
        let m = DMatrix::<f64>::zeros(2, 3);
        assert_eq!(
            BinaryQuadraticProblem::symmetrized(m, 0.0),
            Err(ProblemError::NotSquare { rows: 2, cols: 3 })
        );
    }

    #[test]
    fn empty_matrix_is_rejected() {
        let m = DMatrix::<f64>::zeros(0, 0);
        assert_eq!(BinaryQuadraticProblem::symmetrized(m, 0.0), Err(ProblemError::Empty));
    }

    #[test]
    fn nan_entry_is_rejected() {
        let mut m = DMatrix::<f64>::zeros(2, 2);
        m[(1, 0)] = f64::NAN;
        assert_eq!(
            BinaryQuadraticProblem::symmetrized(m, 0.0),
            Err(ProblemError::NonFinite { row: 1, col: 0 })
        );
    }

    #[test]
    fn infinite_entry_is_rejected() {
        let mut m = DMatrix::<f64>::zeros(2, 2);
        m[(0, 0)] = f64::INFINITY;
        assert!(matches!(
            BinaryQuadraticProblem::from_symmetric(m, 0.0),
            Err(ProblemError::NonFinite { .. })
        ));
    }

    #[test]
    fn asymmetric_matrix_is_rejected_by_from_symmetric() {
        let m = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 0.0, 0.0]);
        assert_eq!(
            BinaryQuadraticProblem::from_symmetric(m, 0.0),
            Err(ProblemError::NotSymmetric { row: 0, col: 1 })
        );
    }

    #[test]
    fn wrong_assignment_length_is_rejected() {
        let problem = small_problem();
        assert_eq!(
            problem.energy(&[true, false]),
            Err(ProblemError::AssignmentLength {
                expected: 3,
                actual: 2
            })
        );
    }
}
