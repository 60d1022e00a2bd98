//! Common test utilities
#![allow(dead_code)]

use meshlu::config::LinpackConfig;

/// Route `log` output through the test harness; safe to call from every test
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Assert two f32 slices are close within tolerance
pub fn assert_allclose_f32(a: &[f32], b: &[f32], rtol: f32, atol: f32, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Single-repetition configuration for an `n x n` matrix in tiles of edge `b`
pub fn small_config(n: usize, b: usize, chunk: usize) -> LinpackConfig {
    LinpackConfig::default()
        .with_matrix_size(n)
        .with_block_size(b)
        .with_chunk_size(chunk)
        .with_repetitions(1)
}

/// Deterministic diagonally dominant dense matrix
pub fn dominant_matrix(n: usize) -> Vec<f64> {
    let mut a: Vec<f64> = (0..n * n)
        .map(|i| ((i * 7919 + 13) % 101) as f64 / 101.0 - 0.5)
        .collect();
    for i in 0..n {
        a[i * n + i] = n as f64;
    }
    a
}

/// Matrix that needs row interchanges inside every diagonal tile.
///
/// Built from a dominant matrix whose first two rows of each tile row are
/// exchanged, after zeroing the entry that lands on the diagonal of the first
/// tile. Without interchanges the very first pivot is exactly zero.
pub fn needs_pivoting(n: usize, b: usize) -> Vec<f64> {
    let mut a = dominant_matrix(n);
    for t in 0..n / b {
        let r = t * b;
        a[(r + 1) * n + r] = 0.0;
        for c in 0..n {
            a.swap(r * n + c, (r + 1) * n + c);
        }
    }
    a
}

/// `A * x` for a dense row-major matrix
pub fn mat_vec(a: &[f64], x: &[f64]) -> Vec<f64> {
    let n = x.len();
    (0..n)
        .map(|i| (0..n).map(|j| a[i * n + j] * x[j]).sum())
        .collect()
}
