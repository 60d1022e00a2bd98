//! Timed factorization and solve

use super::data::LinpackData;
use crate::algorithm::linalg::TriangularSolver;
use crate::config::LinpackConfig;
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::mesh::MeshClient;
use std::time::{Duration, Instant};

/// Wall-clock durations of every repetition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionTimings {
    /// Distributed factorization sweep, one entry per repetition
    pub factorization: Vec<Duration>,
    /// Triangular solve, one entry per repetition
    pub solve: Vec<Duration>,
}

impl ExecutionTimings {
    /// Number of recorded repetitions
    pub fn repetitions(&self) -> usize {
        self.factorization.len()
    }

    /// Factorization plus solve of each repetition
    pub fn totals(&self) -> impl Iterator<Item = Duration> + '_ {
        self.factorization
            .iter()
            .zip(&self.solve)
            .map(|(&f, &s)| f + s)
    }
}

/// Run `config.repetitions` full factorizations and solves on `data`.
///
/// Every repetition starts from the original input. Afterwards `data` holds
/// the factors, the pivots and the solution of the last repetition, and its
/// channel trace when recording is enabled.
pub fn calculate<T: Element>(
    config: &LinpackConfig,
    data: &mut LinpackData<T>,
) -> Result<ExecutionTimings> {
    config.validate()?;
    if data.order() != config.matrix_size || data.matrix.block_size() != config.block_size {
        return Err(Error::shape_mismatch(
            &[config.matrix_size, config.block_size],
            &[data.order(), data.matrix.block_size()],
        ));
    }

    let client = MeshClient::new(config)?;
    let mut timings = ExecutionTimings::default();

    for rep in 0..config.repetitions {
        data.reset()?;

        let start = Instant::now();
        let sweep = client.factorize(&mut data.matrix)?;
        let factorization = start.elapsed();

        let placeholder = data.original_matrix().clone();
        let factors = std::mem::replace(&mut data.matrix, placeholder);
        let start = Instant::now();
        let solver = TriangularSolver::new(factors, sweep.pivots)?;
        solver.solve_in_place(&mut data.rhs)?;
        let solve = start.elapsed();

        log::info!(
            "repetition {}/{}: factorization {:.6}s, solve {:.6}s",
            rep + 1,
            config.repetitions,
            factorization.as_secs_f64(),
            solve.as_secs_f64()
        );

        data.pivots = solver.pivots().clone();
        data.matrix = solver.into_factors();
        data.trace = sweep.trace;
        timings.factorization.push(factorization);
        timings.solve.push(solve);
    }

    Ok(timings)
}
