//! Run configuration

use crate::algorithm::linalg::FactorizationStrategy;
use crate::error::{Error, Result};
use crate::mesh::Topology;
use crate::tile::validate_tiling;

/// Configuration of one benchmark run
///
/// The matrix of order `matrix_size` is split into an `N x N` grid of tiles
/// of edge `block_size`, one tile per processing element, so the mesh has
/// `N = matrix_size / block_size` PEs along each edge.
#[derive(Debug, Clone, PartialEq)]
pub struct LinpackConfig {
    /// Matrix order `n` (default: 1024)
    pub matrix_size: usize,
    /// Tile edge `B` (default: 256)
    pub block_size: usize,
    /// Granularity of the triangular payload layout (default: 8)
    pub chunk_size: usize,
    /// Tile edge the compute layer was built for, if it is fixed (default: None)
    pub hardware_block_size: Option<usize>,
    /// Number of timed factorization sweeps (default: 10)
    pub repetitions: usize,
    /// Elimination variant (default: no pivoting); pivoting requires a single tile
    pub strategy: FactorizationStrategy,
    /// Mesh wiring (default: torus)
    pub topology: Topology,
    /// Record every channel payload of the last repetition (default: false)
    pub record_traces: bool,
    /// Seed of the input generator (default: 42)
    pub seed: u64,
    /// Make the generated matrix diagonally dominant (default: true)
    pub diagonally_dominant: bool,
    /// Largest normalized residual a run may report and still pass (default: 1.0)
    pub validation_threshold: f64,
}

impl Default for LinpackConfig {
    fn default() -> Self {
        Self {
            matrix_size: 1024,
            block_size: 256,
            chunk_size: 8,
            hardware_block_size: None,
            repetitions: 10,
            strategy: FactorizationStrategy::NoPivot,
            topology: Topology::Torus,
            record_traces: false,
            seed: 42,
            diagonally_dominant: true,
            validation_threshold: 1.0,
        }
    }
}

impl LinpackConfig {
    /// Reject configurations no run can execute
    pub fn validate(&self) -> Result<()> {
        validate_tiling(self.matrix_size, self.block_size)?;
        if self.chunk_size == 0 || self.block_size % self.chunk_size != 0 {
            return Err(Error::configuration(format!(
                "block size {} is not a multiple of chunk size {}",
                self.block_size, self.chunk_size
            )));
        }
        if let Some(hw) = self.hardware_block_size
            && hw != self.block_size
        {
            return Err(Error::configuration(format!(
                "block size {} does not match the hardware block size {hw}",
                self.block_size
            )));
        }
        if self.strategy.is_pivoted() && self.grid_size() > 1 {
            return Err(Error::configuration(format!(
                "partial pivoting searches one diagonal tile and needs block size {} \
                 to equal matrix size {}",
                self.block_size, self.matrix_size
            )));
        }
        if self.repetitions == 0 {
            return Err(Error::configuration("at least one repetition is required"));
        }
        if self.validation_threshold.is_nan() || self.validation_threshold <= 0.0 {
            return Err(Error::configuration(format!(
                "validation threshold must be positive, got {}",
                self.validation_threshold
            )));
        }
        if self.strategy == FactorizationStrategy::NoPivot && !self.diagonally_dominant {
            log::warn!(
                "no-pivot elimination on a matrix that is not diagonally dominant; \
                 zero pivots go undetected"
            );
        }
        Ok(())
    }

    /// Tiles along one edge of the grid, `matrix_size / block_size`
    #[inline]
    pub fn grid_size(&self) -> usize {
        self.matrix_size / self.block_size.max(1)
    }

    /// Set the matrix order
    pub fn with_matrix_size(mut self, n: usize) -> Self {
        self.matrix_size = n;
        self
    }

    /// Set the tile edge
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the payload chunk granularity
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Pin the tile edge the compute layer supports
    pub fn with_hardware_block_size(mut self, block_size: usize) -> Self {
        self.hardware_block_size = Some(block_size);
        self
    }

    /// Set the number of timed sweeps
    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = repetitions;
        self
    }

    /// Select the elimination variant
    pub fn with_strategy(mut self, strategy: FactorizationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Select the mesh wiring
    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    /// Record channel traffic
    pub fn with_traces(mut self, record: bool) -> Self {
        self.record_traces = record;
        self
    }

    /// Seed the input generator
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Generate a diagonally dominant matrix or a plain uniform one
    pub fn with_diagonal_dominance(mut self, dominant: bool) -> Self {
        self.diagonally_dominant = dominant;
        self
    }

    /// Set the normalized residual bound
    pub fn with_validation_threshold(mut self, threshold: f64) -> Self {
        self.validation_threshold = threshold;
        self
    }
}
