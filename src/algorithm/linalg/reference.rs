//! Sequential reference factorization and solve
//!
//! These run on a dense row-major `n x n` matrix held by a single node and are
//! the oracle the distributed sweep is validated against. The elimination
//! kernels are the ones diagonal tiles use, so for the same input and the same
//! pivot decisions the factors agree to the last bit.

use super::block::{lu_nopvt_in_place, lu_pvt_in_place};
use super::helpers::{validate_square_matrix, validate_vector};
use crate::dtype::Element;
use crate::error::{Error, Result};

/// LU with partial pivoting over whole columns; returns the pivot row per step
pub fn gefa_ref<T: Element>(a: &mut [T], n: usize) -> Result<Vec<usize>> {
    validate_square_matrix(a, n)?;
    let mut ipvt = Vec::with_capacity(n);
    lu_pvt_in_place(a, n, &mut ipvt).map_err(|step| Error::SingularPivot { tile: 0, step })?;
    Ok(ipvt)
}

/// LU without pivoting. Input must be diagonally dominant.
pub fn gefa_ref_nopvt<T: Element>(a: &mut [T], n: usize) -> Result<()> {
    validate_square_matrix(a, n)?;
    lu_nopvt_in_place(a, n);
    Ok(())
}

/// Solve with factors from [`gefa_ref`], overwriting `b` with `x`
pub fn gesl_ref<T: Element>(a: &[T], b: &mut [T], ipvt: &[usize], n: usize) -> Result<()> {
    validate_square_matrix(a, n)?;
    validate_vector(b, n)?;
    validate_vector(ipvt, n)?;
    for (k, &p) in ipvt.iter().enumerate() {
        b.swap(k, p);
    }
    substitute(a, b, n);
    Ok(())
}

/// Solve with factors from [`gefa_ref_nopvt`], overwriting `b` with `x`
pub fn gesl_ref_nopvt<T: Element>(a: &[T], b: &mut [T], n: usize) -> Result<()> {
    validate_square_matrix(a, n)?;
    validate_vector(b, n)?;
    substitute(a, b, n);
    Ok(())
}

fn substitute<T: Element>(a: &[T], b: &mut [T], n: usize) {
    for i in 1..n {
        for j in 0..i {
            b[i] = b[i] - a[i * n + j] * b[j];
        }
    }
    for i in (0..n).rev() {
        for j in (i + 1)..n {
            b[i] = b[i] - a[i * n + j] * b[j];
        }
        b[i] = b[i] / a[i * n + i];
    }
}

/// Sum of absolute element differences
pub fn total_abs_error<T: Element>(a: &[T], b: &[T]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (x.to_f64() - y.to_f64()).abs())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nopvt_round_trip() {
        let a = vec![4.0, 1.0, 0.5, 1.0, 5.0, 1.0, 0.5, 1.0, 6.0];
        let x_expected = [1.0, -2.0, 3.0];
        let mut b: Vec<f64> = (0..3)
            .map(|i| (0..3).map(|j| a[i * 3 + j] * x_expected[j]).sum())
            .collect();
        let mut lu = a.clone();
        gefa_ref_nopvt(&mut lu, 3).unwrap();
        gesl_ref_nopvt(&lu, &mut b, 3).unwrap();
        assert!(total_abs_error(&b, &x_expected) < 1e-12);
    }

    #[test]
    fn test_pvt_round_trip() {
        let a = vec![0.0, 2.0, 1.0, 3.0, 1.0, -1.0, 1.0, 1.0, 1.0];
        let x_expected = [2.0, 1.0, -1.0];
        let mut b: Vec<f64> = (0..3)
            .map(|i| (0..3).map(|j| a[i * 3 + j] * x_expected[j]).sum())
            .collect();
        let mut lu = a.clone();
        let ipvt = gefa_ref(&mut lu, 3).unwrap();
        assert_eq!(ipvt[0], 1);
        gesl_ref(&lu, &mut b, &ipvt, 3).unwrap();
        assert!(total_abs_error(&b, &x_expected) < 1e-12);
    }

    #[test]
    fn test_singular_reported() {
        let mut a = vec![1.0f32, 2.0, 2.0, 4.0];
        assert!(matches!(
            gefa_ref(&mut a, 2),
            Err(Error::SingularPivot { step: 1, .. })
        ));
    }

    #[test]
    fn test_shape_checks() {
        let mut a = vec![1.0f64; 5];
        assert!(gefa_ref_nopvt(&mut a, 2).is_err());
        let lu = vec![1.0f64; 4];
        let mut b = vec![1.0; 3];
        assert!(gesl_ref_nopvt(&lu, &mut b, 2).is_err());
    }
}
