//! LINPACK-style benchmark harness
//!
//! Generates a seeded system, runs the distributed factorization and the
//! solve once per repetition, and checks the result against the sequential
//! reference.
//!
//! ```rust,ignore
//! use meshlu::prelude::*;
//!
//! let config = LinpackConfig::default().with_repetitions(3);
//! let mut data = generate_input_data::<f64>(&config)?;
//! let timings = calculate(&config, &mut data)?;
//! validate_output(&data)?.check(config.validation_threshold)?;
//! println!("{}", LinpackResults::from_timings(config.matrix_size, &timings));
//! ```

mod data;
mod execute;
mod results;
mod validate;

pub use data::{LinpackData, generate_input_data};
pub use execute::{ExecutionTimings, calculate};
pub use results::LinpackResults;
pub use validate::{ReferenceComparison, ValidationReport, compare_with_reference, validate_output};
