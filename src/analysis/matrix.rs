//! Dense row-major matrix helpers.

/// Row-major dense matrix.
pub type Matrix = Vec<Vec<f64>>;

/// Matrix product `a · b`.
///
/// `a` must have as many columns as `b` has rows; that is the caller's
/// responsibility and only checked in debug builds.
pub fn multiply(a: &[Vec<f64>], b: &[Vec<f64>]) -> Matrix {
    let inner = b.len();
    let cols = b.first().map_or(0, Vec::len);
    debug_assert!(a.iter().all(|row| row.len() == inner));

    a.iter()
        .map(|row| {
            (0..cols)
                .map(|j| (0..inner).map(|k| row[k] * b[k][j]).sum::<f64>())
                .collect::<Vec<f64>>()
        })
        .collect()
}

/// Swap rows and columns.
pub fn transpose(m: &[Vec<f64>]) -> Matrix {
    let cols = m.first().map_or(0, Vec::len);
    (0..cols)
        .map(|j| m.iter().map(|row| row[j]).collect::<Vec<f64>>())
        .collect()
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Matrix · column vector.
pub fn mat_vec(m: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    m.iter().map(|row| dot(row, v)).collect()
}

pub fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply() {
        let a = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let b = vec![vec![7.0, 8.0], vec![9.0, 10.0], vec![11.0, 12.0]];
        assert_eq!(multiply(&a, &b), vec![vec![58.0, 64.0], vec![139.0, 154.0]]);
    }

    #[test]
    fn test_transpose() {
        let m = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let t = transpose(&m);
        assert_eq!(t, vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]);
        assert_eq!(transpose(&t), m);
        assert!(transpose(&[]).is_empty());
    }

    #[test]
    fn test_mat_vec_and_norm() {
        let m = vec![vec![2.0, 0.0], vec![0.0, 3.0]];
        assert_eq!(mat_vec(&m, &[1.0, 1.0]), vec![2.0, 3.0]);
        assert_eq!(norm(&[3.0, 4.0]), 5.0);
    }
}
