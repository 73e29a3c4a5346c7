//! Power-iteration eigensolver with rank-1 deflation.
//!
//! The iteration count is fixed and there is no convergence check: for
//! matrices whose two largest eigenvalues are tied or nearly tied the result is
//! an approximation of the dominant direction, not an exact eigenvector.

use super::matrix::{dot, mat_vec, norm};

/// Iterations used by the PCA engine unless configured otherwise.
pub const DEFAULT_ITERATIONS: usize = 100;

/// An eigenvector estimate and its Rayleigh-quotient eigenvalue (signed).
#[derive(Debug, Clone, PartialEq)]
pub struct Eigenpair {
    pub vector: Vec<f64>,
    pub value: f64,
}

/// Estimate the eigenpair of largest-magnitude eigenvalue of `m`.
///
/// Starts from the all-ones vector and applies `m` `iterations` times,
/// rescaling to unit length after each step. A step whose product has zero
/// norm leaves the vector unchanged.
pub fn dominant_eigenpair(m: &[Vec<f64>], iterations: usize) -> Eigenpair {
    let mut vector = vec![1.0; m.len()];

    for _ in 0..iterations {
        let next = mat_vec(m, &vector);
        let length = norm(&next);
        if length > 0.0 {
            vector = next.iter().map(|x| x / length).collect();
        }
    }

    let av = mat_vec(m, &vector);
    let value = dot(&vector, &av);
    Eigenpair { vector, value }
}

/// Remove `pair`'s contribution from `m` in place: `m ← m − λ·v·vᵀ`.
///
/// Uses the signed eigenvalue so the subtraction is an exact rank-1 update.
pub fn deflate(m: &mut [Vec<f64>], pair: &Eigenpair) {
    let v = &pair.vector;
    for (i, row) in m.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell -= pair.value * v[i] * v[j];
        }
    }
}
