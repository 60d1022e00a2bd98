//! Result validation against the input system and the sequential reference

use super::data::LinpackData;
use crate::algorithm::linalg::FactorizationStrategy;
use crate::algorithm::linalg::helpers::{mat_vec_f64, matrix_inf_norm, vector_inf_norm};
use crate::algorithm::linalg::reference::{
    gefa_ref, gefa_ref_nopvt, gesl_ref, gesl_ref_nopvt, total_abs_error,
};
use crate::dtype::Element;
use crate::error::{Error, Result};

/// Residual of the computed solution against the original system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationReport {
    /// `‖A x - b‖∞`
    pub residual: f64,
    /// `residual / (n ‖A‖∞ ‖x‖∞ eps)`
    pub normalized_residual: f64,
    /// Machine epsilon of the element type
    pub epsilon: f64,
}

impl ValidationReport {
    /// Fail with [`Error::ValidationFailed`] when the normalized residual exceeds `threshold`
    pub fn check(self, threshold: f64) -> Result<Self> {
        if self.normalized_residual.is_nan() || self.normalized_residual > threshold {
            log::warn!(
                "normalized residual {} exceeds {threshold}",
                self.normalized_residual
            );
            return Err(Error::ValidationFailed {
                error: self.normalized_residual,
                threshold,
            });
        }
        Ok(self)
    }
}

/// Residual of `data.rhs` as a solution of the original system
pub fn validate_output<T: Element>(data: &LinpackData<T>) -> Result<ValidationReport> {
    let n = data.order();
    if data.rhs.len() != n {
        return Err(Error::shape_mismatch(&[n], &[data.rhs.len()]));
    }
    let a = data.original_matrix().to_dense();
    let ax = mat_vec_f64(&a, &data.rhs, n);
    let residual = if data.rhs.iter().all(|v| v.is_finite_val()) {
        ax.iter()
            .zip(data.original_rhs())
            .map(|(&lhs, &b)| (lhs - b.to_f64()).abs())
            .fold(0.0, f64::max)
    } else {
        f64::INFINITY
    };

    let epsilon = T::DTYPE.epsilon();
    let scale = n as f64 * matrix_inf_norm(&a, n) * vector_inf_norm(&data.rhs) * epsilon;
    let normalized_residual = if residual == 0.0 {
        0.0
    } else if scale == 0.0 {
        f64::INFINITY
    } else {
        residual / scale
    };

    log::info!("residual {residual:e}, normalized {normalized_residual:.4}");
    Ok(ValidationReport {
        residual,
        normalized_residual,
        epsilon,
    })
}

/// Distance between the distributed result and the sequential reference
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceComparison {
    /// Sum of absolute differences of the factors
    pub factor_error: f64,
    /// Sum of absolute differences of the solutions
    pub solution_error: f64,
}

impl ReferenceComparison {
    /// Fail with [`Error::ValidationFailed`] when either error exceeds `tolerance`
    pub fn check(self, tolerance: f64) -> Result<Self> {
        let error = self.factor_error.max(self.solution_error);
        if error.is_nan() || error > tolerance {
            log::warn!("distance to the reference {error:e} exceeds {tolerance:e}");
            return Err(Error::ValidationFailed {
                error,
                threshold: tolerance,
            });
        }
        Ok(self)
    }
}

/// Re-run the factorization and solve sequentially on the original input.
///
/// Both sides make the same pivot decisions: none without pivoting, and a
/// full column search when the single tile is the whole matrix.
pub fn compare_with_reference<T: Element>(
    data: &LinpackData<T>,
    strategy: FactorizationStrategy,
) -> Result<ReferenceComparison> {
    let n = data.order();
    let mut lu = data.original_matrix().to_dense();
    let mut x = data.original_rhs().to_vec();

    match strategy {
        FactorizationStrategy::NoPivot => {
            gefa_ref_nopvt(&mut lu, n)?;
            gesl_ref_nopvt(&lu, &mut x, n)?;
        }
        FactorizationStrategy::PartialPivot => {
            if data.matrix.grid_size() != 1 {
                return Err(Error::configuration(
                    "pivoted results are only defined for a single tile",
                ));
            }
            let ipvt = gefa_ref(&mut lu, n)?;
            gesl_ref(&lu, &mut x, &ipvt, n)?;
        }
    }

    let factor_error = total_abs_error(&data.matrix.to_dense(), &lu);
    let solution_error = total_abs_error(&data.rhs, &x);
    log::debug!("reference comparison: factors {factor_error:e}, solution {solution_error:e}");
    Ok(ReferenceComparison {
        factor_error,
        solution_error,
    })
}
