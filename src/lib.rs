//! # meshlu
//!
//! **Blocked LU factorization distributed over a 2-D mesh of processing elements.**
//!
//! A dense square matrix is cut into an `N x N` grid of tiles and every tile is
//! handed to its own processing element (PE). PEs share nothing; they talk to
//! their four neighbors through directional FIFO channels. For each pivot step
//! the diagonal PE factorizes its tile, its factors flow right along the block
//! row and down the block column, and the trailing tiles apply the rank-`B`
//! update. Once the sweep finishes, the tiles hold `L` and `U` and a triangular
//! solve produces `x` for `A x = b`.
//!
//! ## Features
//!
//! - **Two elimination variants**: no pivoting for diagonally dominant input,
//!   or partial pivoting for single-tile runs
//! - **Torus or bounded mesh** wiring with the same protocol
//! - **Channel traces**: every payload can be recorded and persisted as flat
//!   native-endian files
//! - **Benchmark harness**: seeded inputs, repetitions, residual validation and
//!   a sequential reference oracle
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use meshlu::prelude::*;
//!
//! let config = LinpackConfig::default()
//!     .with_matrix_size(512)
//!     .with_block_size(128);
//! let mut data = generate_input_data::<f64>(&config)?;
//! let timings = calculate(&config, &mut data)?;
//! validate_output(&data)?.check(config.validation_threshold)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): run the PEs on a dedicated rayon thread pool instead
//!   of scoped std threads

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithm;
pub mod benchmark;
pub mod config;
pub mod dtype;
pub mod error;
pub mod mesh;
pub mod tile;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::algorithm::linalg::{
        FactorizationStrategy, PanelUpdater, PivotTracker, TriangularSolver,
    };
    pub use crate::benchmark::{
        ExecutionTimings, LinpackData, LinpackResults, calculate, compare_with_reference,
        generate_input_data, validate_output,
    };
    pub use crate::config::LinpackConfig;
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::mesh::{Direction, MeshClient, MeshShape, PeCoord, Topology};
    pub use crate::tile::{Tile, TiledMatrix};
}
