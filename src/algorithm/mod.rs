//! Numerical algorithms the mesh runs
//!
//! Everything here is single-threaded and operates on one tile or one dense
//! buffer at a time. Distribution over processing elements lives in
//! [`crate::mesh`].

pub mod linalg;
