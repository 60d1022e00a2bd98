//! Row-interchange bookkeeping across diagonal tiles

use crate::dtype::Element;
use crate::error::{Error, Result};

/// Pivot rows chosen by each diagonal tile, in elimination order.
///
/// Entries are tile-local row indices: step `s` of diagonal tile `t`
/// interchanged global rows `t * block_size + s` and
/// `t * block_size + selected`. Composed tile by tile and step by step they
/// define the global permutation `P` with `P * A = L * U`.
///
/// A tracker with no entries is the identity permutation, which is what the
/// no-pivot strategy uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotTracker {
    block_size: usize,
    tiles: Vec<Vec<usize>>,
}

impl PivotTracker {
    /// Tracker for a grid of `grid` diagonal tiles of edge `block_size`
    pub fn new(grid: usize, block_size: usize) -> Self {
        Self {
            block_size,
            tiles: vec![Vec::new(); grid],
        }
    }

    /// Tracker that never records anything
    pub fn identity(grid: usize, block_size: usize) -> Self {
        Self::new(grid, block_size)
    }

    /// Tile edge the indices are relative to
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// True when no interchange has been recorded
    pub fn is_identity(&self) -> bool {
        self.tiles.iter().all(Vec::is_empty)
    }

    /// Append the pivot row picked by `tile_id` at local `step`.
    ///
    /// Steps of one tile must arrive in order.
    pub fn record_pivot(&mut self, tile_id: usize, step: usize, selected_row: usize) -> Result<()> {
        let b = self.block_size;
        let grid = self.tiles.len();
        let entries = self.tiles.get_mut(tile_id).ok_or_else(|| Error::InvalidArgument {
            arg: "tile_id",
            reason: format!("diagonal tile {tile_id} outside a grid of {grid}"),
        })?;
        if step != entries.len() {
            return Err(Error::InvalidArgument {
                arg: "step",
                reason: format!("expected step {} for tile {tile_id}, got {step}", entries.len()),
            });
        }
        if step >= b || selected_row < step || selected_row >= b {
            return Err(Error::InvalidArgument {
                arg: "selected_row",
                reason: format!("row {selected_row} cannot pivot step {step} of a tile of edge {b}"),
            });
        }
        entries.push(selected_row);
        Ok(())
    }

    /// Record every pivot a diagonal tile produced
    pub fn record_tile(&mut self, tile_id: usize, pivots: &[usize]) -> Result<()> {
        for (step, &row) in pivots.iter().enumerate() {
            self.record_pivot(tile_id, step, row)?;
        }
        Ok(())
    }

    /// Ordered pivot rows of one diagonal tile (empty for the identity)
    pub fn permutation_for(&self, tile_id: usize) -> &[usize] {
        self.tiles.get(tile_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Apply every recorded interchange to `values`, low tile to high, step by step
    pub fn apply_global_permutation<T: Element>(&self, values: &mut [T]) -> Result<()> {
        let n = self.tiles.len() * self.block_size;
        if values.len() != n {
            return Err(Error::shape_mismatch(&[n], &[values.len()]));
        }
        for (tile_id, entries) in self.tiles.iter().enumerate() {
            let base = tile_id * self.block_size;
            for (step, &row) in entries.iter().enumerate() {
                values.swap(base + step, base + row);
            }
        }
        Ok(())
    }

    /// Global row interchanges as `(row, pivot_row)` pairs in application order
    pub fn interchanges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let b = self.block_size;
        self.tiles.iter().enumerate().flat_map(move |(tile_id, entries)| {
            entries
                .iter()
                .enumerate()
                .map(move |(step, &row)| (tile_id * b + step, tile_id * b + row))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_leaves_vector_untouched() {
        let t = PivotTracker::identity(2, 2);
        assert!(t.is_identity());
        let mut v = vec![1.0, 2.0, 3.0, 4.0];
        t.apply_global_permutation(&mut v).unwrap();
        assert_eq!(v, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_swaps_apply_in_recorded_order() {
        let mut t = PivotTracker::new(2, 3);
        t.record_tile(0, &[2, 2, 2]).unwrap();
        t.record_tile(1, &[1, 1, 2]).unwrap();
        assert_eq!(t.permutation_for(0), &[2, 2, 2]);

        let mut v: Vec<f64> = (0..6).map(|x| x as f64).collect();
        t.apply_global_permutation(&mut v).unwrap();
        // tile 0: swap(0,2) -> 2 1 0, swap(1,2) -> 2 0 1, swap(2,2)
        // tile 1: swap(3,4) -> 4 3 5, swap(4,4), swap(5,5)
        assert_eq!(v, vec![2.0, 0.0, 1.0, 4.0, 3.0, 5.0]);

        let pairs: Vec<_> = t.interchanges().collect();
        assert_eq!(pairs[0], (0, 2));
        assert_eq!(pairs[3], (3, 4));
    }

    #[test]
    fn test_out_of_order_step_rejected() {
        let mut t = PivotTracker::new(1, 4);
        assert!(t.record_pivot(0, 1, 2).is_err());
        assert!(t.record_pivot(0, 0, 4).is_err());
        assert!(t.record_pivot(3, 0, 0).is_err());
        t.record_pivot(0, 0, 3).unwrap();
        // A pivot row above the current step is never valid
        assert!(t.record_pivot(0, 1, 0).is_err());
    }

    #[test]
    fn test_length_mismatch() {
        let t = PivotTracker::new(2, 2);
        let mut v = vec![0.0f32; 3];
        assert!(t.apply_global_permutation(&mut v).is_err());
    }
}
