//! Forward and backward substitution over a factorized tile grid
//!
//! Runs on one consolidating node once every tile has been updated. Tile row
//! `i` resolves its unknowns after rows `0..i` (forward) or `i+1..N`
//! (backward) have been solved, consuming the solved segments tile by tile.

use super::pivot::PivotTracker;
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::mesh::PeCoord;
use crate::tile::TiledMatrix;

/// Solves `A x = b` from the tiles left behind by a distributed sweep
#[derive(Debug, Clone)]
pub struct TriangularSolver<T> {
    factors: TiledMatrix<T>,
    pivots: PivotTracker,
}

impl<T: Element> TriangularSolver<T> {
    /// Take ownership of the factor tiles and their pivot record.
    ///
    /// Tiles left of each diagonal tile finished before that tile chose its
    /// pivots, so they still owe its row interchanges. Those are applied here,
    /// which leaves `P * A = L * U` with `P` as recorded by `pivots`.
    pub fn new(mut factors: TiledMatrix<T>, pivots: PivotTracker) -> Result<Self> {
        let grid = factors.grid_size();
        let b = factors.block_size();
        if pivots.block_size() != b {
            return Err(Error::shape_mismatch(&[b], &[pivots.block_size()]));
        }

        for tile_row in 1..grid {
            let interchanges = pivots.permutation_for(tile_row);
            if interchanges.is_empty() {
                continue;
            }
            for tile_col in 0..tile_row {
                let tile = factors.tile_mut(PeCoord::new(tile_row, tile_col));
                let a = tile.as_mut_slice();
                for (step, &row) in interchanges.iter().enumerate() {
                    super::block::swap_rows(a, b, step, row);
                }
            }
        }

        Ok(Self { factors, pivots })
    }

    /// Consolidated factors: unit `L` below the diagonal, `U` on and above it
    pub fn factors(&self) -> &TiledMatrix<T> {
        &self.factors
    }

    /// Give the factor tiles back, deferred interchanges applied
    pub fn into_factors(self) -> TiledMatrix<T> {
        self.factors
    }

    /// Pivot record the solver applies to every right-hand side
    pub fn pivots(&self) -> &PivotTracker {
        &self.pivots
    }

    /// Overwrite `rhs` with the solution of `A x = rhs`
    pub fn solve_in_place(&self, rhs: &mut [T]) -> Result<()> {
        let n = self.factors.order();
        if rhs.len() != n {
            return Err(Error::shape_mismatch(&[n], &[rhs.len()]));
        }
        self.pivots.apply_global_permutation(rhs)?;
        self.forward(rhs);
        self.backward(rhs);
        Ok(())
    }

    /// Solve `A x = rhs` into a new vector
    pub fn solve(&self, rhs: &[T]) -> Result<Vec<T>> {
        let mut x = rhs.to_vec();
        self.solve_in_place(&mut x)?;
        Ok(x)
    }

    /// `L y = P b`, tile rows in increasing order
    fn forward(&self, y: &mut [T]) {
        let grid = self.factors.grid_size();
        let b = self.factors.block_size();
        for tile_row in 0..grid {
            let (solved, rest) = y.split_at_mut(tile_row * b);
            let seg = &mut rest[..b];

            for tile_col in 0..tile_row {
                let l = self.factors.tile(PeCoord::new(tile_row, tile_col));
                let x = &solved[tile_col * b..(tile_col + 1) * b];
                for (r, v) in seg.iter_mut().enumerate() {
                    for c in 0..b {
                        *v = *v - l.get(r, c) * x[c];
                    }
                }
            }

            let diag = self.factors.tile(PeCoord::new(tile_row, tile_row));
            for r in 1..b {
                for c in 0..r {
                    seg[r] = seg[r] - diag.get(r, c) * seg[c];
                }
            }
        }
    }

    /// `U x = y`, tile rows in decreasing order
    fn backward(&self, x: &mut [T]) {
        let grid = self.factors.grid_size();
        let b = self.factors.block_size();
        for tile_row in (0..grid).rev() {
            let (_, rest) = x.split_at_mut(tile_row * b);
            let (seg, solved) = rest.split_at_mut(b);

            for tile_col in (tile_row + 1)..grid {
                let u = self.factors.tile(PeCoord::new(tile_row, tile_col));
                let xs = &solved[(tile_col - tile_row - 1) * b..(tile_col - tile_row) * b];
                for (r, v) in seg.iter_mut().enumerate() {
                    for c in 0..b {
                        *v = *v - u.get(r, c) * xs[c];
                    }
                }
            }

            let diag = self.factors.tile(PeCoord::new(tile_row, tile_row));
            for r in (0..b).rev() {
                for c in (r + 1)..b {
                    seg[r] = seg[r] - diag.get(r, c) * seg[c];
                }
                seg[r] = seg[r] / diag.get(r, r);
            }
        }
    }
}
