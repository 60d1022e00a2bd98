//! Validation and norm helpers shared by the dense routines

use crate::dtype::Element;
use crate::error::{Error, Result};

/// Validate a dense row-major buffer holds an `n x n` matrix
pub fn validate_square_matrix<T>(a: &[T], n: usize) -> Result<()> {
    if a.len() != n * n {
        return Err(Error::shape_mismatch(&[n, n], &[a.len()]));
    }
    Ok(())
}

/// Validate a vector has length `n`
pub fn validate_vector<T>(v: &[T], n: usize) -> Result<()> {
    if v.len() != n {
        return Err(Error::shape_mismatch(&[n], &[v.len()]));
    }
    Ok(())
}

/// Infinity norm of a dense row-major `n x n` matrix (max absolute row sum)
pub fn matrix_inf_norm<T: Element>(a: &[T], n: usize) -> f64 {
    a.chunks_exact(n.max(1))
        .map(|row| row.iter().map(|v| v.to_f64().abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// Infinity norm of a vector
pub fn vector_inf_norm<T: Element>(v: &[T]) -> f64 {
    v.iter().map(|x| x.to_f64().abs()).fold(0.0, f64::max)
}

/// `A x` for a dense row-major `n x n` matrix, accumulated in f64
pub fn mat_vec_f64<T: Element>(a: &[T], x: &[T], n: usize) -> Vec<f64> {
    a.chunks_exact(n.max(1))
        .take(n)
        .map(|row| {
            row.iter()
                .zip(x)
                .map(|(&aij, &xj)| aij.to_f64() * xj.to_f64())
                .sum()
        })
        .collect()
}
