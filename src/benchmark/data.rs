//! Benchmark input data

use crate::algorithm::linalg::PivotTracker;
use crate::config::LinpackConfig;
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::mesh::MeshTrace;
use crate::tile::TiledMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Linear system `A x = b` plus everything a run leaves behind.
///
/// The input is kept as a snapshot so repetitions can restore it: factorization
/// overwrites `matrix` with `L` and `U`, and the solve overwrites `rhs` with `x`.
#[derive(Debug, Clone)]
pub struct LinpackData<T> {
    /// Tiled system matrix; holds the factors after a run
    pub matrix: TiledMatrix<T>,
    /// Right-hand side; holds the solution after a run
    pub rhs: Vec<T>,
    /// Row interchanges of the last run
    pub pivots: PivotTracker,
    /// Channel traffic of the last run, when recording was enabled
    pub trace: Option<MeshTrace<T>>,
    snapshot: TiledMatrix<T>,
    original_rhs: Vec<T>,
}

impl<T: Element> LinpackData<T> {
    /// System from a dense row-major matrix of order `n` and its right-hand side
    pub fn new(a: &[T], n: usize, block_size: usize, rhs: Vec<T>) -> Result<Self> {
        if rhs.len() != n {
            return Err(Error::shape_mismatch(&[n], &[rhs.len()]));
        }
        let matrix = TiledMatrix::from_dense(a, n, block_size)?;
        Ok(Self {
            pivots: PivotTracker::identity(matrix.grid_size(), block_size),
            trace: None,
            snapshot: matrix.clone(),
            original_rhs: rhs.clone(),
            matrix,
            rhs,
        })
    }

    /// Matrix order
    #[inline]
    pub fn order(&self) -> usize {
        self.snapshot.order()
    }

    /// The untouched input matrix
    pub fn original_matrix(&self) -> &TiledMatrix<T> {
        &self.snapshot
    }

    /// The untouched right-hand side
    pub fn original_rhs(&self) -> &[T] {
        &self.original_rhs
    }

    /// Restore the input before another repetition
    pub fn reset(&mut self) -> Result<()> {
        self.matrix.reset_from(&self.snapshot)?;
        self.rhs.copy_from_slice(&self.original_rhs);
        self.pivots = PivotTracker::identity(self.snapshot.grid_size(), self.snapshot.block_size());
        self.trace = None;
        Ok(())
    }
}

/// Seeded random system with known solution.
///
/// Entries are uniform in `[-0.5, 0.5)`. With diagonal dominance requested,
/// each diagonal entry is replaced by its row's absolute sum plus one. The
/// right-hand side is `A * 1`, so the exact solution is all ones.
pub fn generate_input_data<T: Element>(config: &LinpackConfig) -> Result<LinpackData<T>> {
    config.validate()?;
    let n = config.matrix_size;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut a: Vec<T> = (0..n * n)
        .map(|_| T::from_f64(rng.random_range(-0.5..0.5)))
        .collect();
    if config.diagonally_dominant {
        for (i, row) in a.chunks_exact_mut(n).enumerate() {
            let sum = row.iter().fold(T::zero(), |acc, &v| acc + v.abs_val());
            row[i] = sum + T::one();
        }
    }

    let rhs = a
        .chunks_exact(n)
        .map(|row| row.iter().fold(T::zero(), |acc, &v| acc + v))
        .collect();

    log::debug!(
        "generated {n}x{n} {} system (seed {}, dominant: {})",
        T::DTYPE,
        config.seed,
        config.diagonally_dominant
    );
    LinpackData::new(&a, n, config.block_size, rhs)
}
