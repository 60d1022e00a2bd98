//! Blocked LU building blocks
//!
//! # Module Structure
//!
//! - `block`: in-place factorization of one diagonal tile ([`FactorizationStrategy`])
//! - `pivot`: row-interchange record across diagonal tiles ([`PivotTracker`])
//! - `panel`: payload packing and neighbor-tile updates ([`PanelUpdater`])
//! - `triangular`: substitution over the finished tile grid ([`TriangularSolver`])
//! - `reference`: sequential oracle on a dense matrix
//! - `helpers`: validation and norms

pub mod block;
pub mod helpers;
pub mod panel;
pub mod pivot;
pub mod reference;
pub mod triangular;

pub use block::FactorizationStrategy;
pub use panel::{PanelUpdater, active_len, payload_len};
pub use pivot::PivotTracker;
pub use triangular::TriangularSolver;
