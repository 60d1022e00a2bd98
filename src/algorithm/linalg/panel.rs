//! Panel updates: folding a pivot tile's factors into neighboring tiles
//!
//! After diagonal tile `(k,k)` is factorized into `L_kk * U_kk`, the rest of
//! block row and block column `k` and the trailing submatrix are updated the
//! way a right-looking blocked LU does it, one tile at a time:
//!
//! | Tile | Needs | Update |
//! |---|---|---|
//! | `(k,j)`, `j > k` (top) | `L_kk` and the row interchanges | `A = L_kk⁻¹ P_k A` |
//! | `(i,k)`, `i > k` (left) | `U_kk` | `A = A U_kk⁻¹` |
//! | `(i,j)`, `i,j > k` (inner) | updated `(i,k)` and `(k,j)` | `A -= L_ik U_kj` |
//!
//! # Payload layout
//!
//! Pivot factors travel in a chunked triangular layout. Line `i` (a column of
//! `L` or a row of `U`) is sent from offset `floor(i / chunk) * chunk` up to
//! the tile edge, so it carries
//!
//! ```text
//! active_len(i) = block_size - floor(i / chunk) * chunk
//! ```
//!
//! values. The few values above the diagonal inside a chunk are padding that
//! keeps every line aligned to the chunk granularity; receivers ignore them.

use super::block::swap_rows;
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::tile::Tile;

/// Number of values line `i` contributes to a pivot payload
#[inline]
pub fn active_len(i: usize, block_size: usize, chunk_size: usize) -> usize {
    block_size - (i / chunk_size) * chunk_size
}

/// Total number of values in one pivot payload
pub fn payload_len(block_size: usize, chunk_size: usize) -> usize {
    (0..block_size)
        .map(|i| active_len(i, block_size, chunk_size))
        .sum()
}

/// Packs pivot factors into channel payloads and applies them to tiles
#[derive(Debug, Clone)]
pub struct PanelUpdater {
    block_size: usize,
    chunk_size: usize,
    offsets: Vec<usize>,
    len: usize,
}

impl PanelUpdater {
    /// Updater for tiles of edge `block_size` with chunk granularity `chunk_size`
    pub fn new(block_size: usize, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 || block_size == 0 || block_size % chunk_size != 0 {
            return Err(Error::configuration(format!(
                "block size {block_size} must be a positive multiple of chunk size {chunk_size}"
            )));
        }
        let mut offsets = Vec::with_capacity(block_size);
        let mut len = 0;
        for i in 0..block_size {
            offsets.push(len);
            len += active_len(i, block_size, chunk_size);
        }
        Ok(Self {
            block_size,
            chunk_size,
            offsets,
            len,
        })
    }

    /// Tile edge
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Chunk granularity
    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Values in one pivot payload
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.len
    }

    /// Values in one full-tile payload
    #[inline]
    pub fn tile_len(&self) -> usize {
        self.block_size * self.block_size
    }

    #[inline]
    fn line_start(&self, line: usize) -> usize {
        (line / self.chunk_size) * self.chunk_size
    }

    #[inline]
    fn packed_index(&self, line: usize, pos: usize) -> usize {
        debug_assert!(pos >= self.line_start(line));
        self.offsets[line] + (pos - self.line_start(line))
    }

    /// Columns of a factorized diagonal tile, for tiles sharing its row
    pub fn pack_lower<T: Element>(&self, tile: &Tile<T>) -> Vec<T> {
        let b = self.block_size;
        let mut out = Vec::with_capacity(self.len);
        for col in 0..b {
            for row in self.line_start(col)..b {
                out.push(tile.get(row, col));
            }
        }
        out
    }

    /// Rows of a factorized diagonal tile, for tiles sharing its column
    pub fn pack_upper<T: Element>(&self, tile: &Tile<T>) -> Vec<T> {
        let b = self.block_size;
        let mut out = Vec::with_capacity(self.len);
        for row in 0..b {
            let start = self.line_start(row);
            out.extend_from_slice(&tile.as_slice()[row * b + start..(row + 1) * b]);
        }
        out
    }

    fn check_len(&self, got: usize, expected: usize) -> Result<()> {
        if got != expected {
            return Err(Error::shape_mismatch(&[expected], &[got]));
        }
        Ok(())
    }

    /// Update a tile in the pivot's block row (column-direction update).
    ///
    /// Applies the diagonal tile's row interchanges, then for each pivot
    /// column `k` and every row `j > k`: `row(j) -= L[j][k] * row(k)`.
    pub fn update_top<T: Element>(
        &self,
        tile: &mut Tile<T>,
        lower: &[T],
        pivots: &[usize],
    ) -> Result<()> {
        self.check_len(lower.len(), self.len)?;
        let b = self.block_size;
        let a = tile.as_mut_slice();
        for (k, &p) in pivots.iter().enumerate() {
            swap_rows(a, b, k, p);
        }
        for k in 0..b {
            let (head, tail) = a.split_at_mut((k + 1) * b);
            let pivot_row = &head[k * b..];
            for (offset, row) in tail.chunks_exact_mut(b).enumerate() {
                let m = lower[self.packed_index(k, k + 1 + offset)];
                for c in 0..b {
                    row[c] = row[c] - m * pivot_row[c];
                }
            }
        }
        Ok(())
    }

    /// Update a tile in the pivot's block column (row-direction update).
    ///
    /// Solves `X * U = A` in place: each row of the tile gets the same
    /// multiplier computation the pivot tile applied to its own rows.
    pub fn update_left<T: Element>(&self, tile: &mut Tile<T>, upper: &[T]) -> Result<()> {
        self.check_len(upper.len(), self.len)?;
        let b = self.block_size;
        for row in tile.as_mut_slice().chunks_exact_mut(b) {
            for k in 0..b {
                let m = row[k] / upper[self.packed_index(k, k)];
                row[k] = m;
                for c in (k + 1)..b {
                    row[c] = row[c] - m * upper[self.packed_index(k, c)];
                }
            }
        }
        Ok(())
    }

    /// Trailing update of an inner tile: `A -= left * top`.
    ///
    /// `left` is the finished tile of the pivot column in this tile's row and
    /// `top` the finished tile of the pivot row in this tile's column, both as
    /// full row-major tiles.
    pub fn update_inner<T: Element>(&self, tile: &mut Tile<T>, left: &[T], top: &[T]) -> Result<()> {
        let full = self.tile_len();
        self.check_len(left.len(), full)?;
        self.check_len(top.len(), full)?;
        let b = self.block_size;
        for (r, row) in tile.as_mut_slice().chunks_exact_mut(b).enumerate() {
            for k in 0..b {
                let m = left[r * b + k];
                let top_row = &top[k * b..(k + 1) * b];
                for c in 0..b {
                    row[c] = row[c] - m * top_row[c];
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::linalg::block::FactorizationStrategy;
    use crate::mesh::PeCoord;

    fn tile_from(coord: PeCoord, b: usize, f: impl Fn(usize, usize) -> f64) -> Tile<f64> {
        let data = (0..b * b).map(|i| f(i / b, i % b)).collect();
        Tile::from_vec(coord, b, data).unwrap()
    }

    fn dominant(b: usize) -> Tile<f64> {
        tile_from(PeCoord::new(0, 0), b, |r, c| {
            if r == c { 4.0 * b as f64 } else { (r * 3 + c) as f64 * 0.1 }
        })
    }

    #[test]
    fn test_payload_len_closed_form() {
        // 8 rows, chunk 2: 8+8+6+6+4+4+2+2
        assert_eq!(payload_len(8, 2), 40);
        assert_eq!(payload_len(4, 4), 16);
        assert_eq!(payload_len(4, 1), 10);
        let u = PanelUpdater::new(8, 2).unwrap();
        assert_eq!(u.payload_len(), 40);
        assert_eq!(u.tile_len(), 64);
    }

    #[test]
    fn test_chunk_must_divide_block() {
        assert!(PanelUpdater::new(6, 4).is_err());
        assert!(PanelUpdater::new(4, 0).is_err());
    }

    #[test]
    fn test_pack_lower_and_upper_layout() {
        let u = PanelUpdater::new(4, 2).unwrap();
        let t = tile_from(PeCoord::new(0, 0), 4, |r, c| (r * 4 + c) as f64);
        let lower = u.pack_lower(&t);
        let upper = u.pack_upper(&t);
        assert_eq!(lower.len(), u.payload_len());
        assert_eq!(upper.len(), u.payload_len());
        // column 0 from row 0, column 2 from row 2
        assert_eq!(&lower[..4], &[0.0, 4.0, 8.0, 12.0]);
        assert_eq!(&lower[8..10], &[10.0, 14.0]);
        // row 3 from column 2
        assert_eq!(&upper[10..], &[14.0, 15.0]);
    }

    #[test]
    fn test_top_update_is_forward_substitution() {
        let b = 4;
        let u = PanelUpdater::new(b, 2).unwrap();
        let mut pivot = dominant(b);
        FactorizationStrategy::NoPivot.factorize(&mut pivot).unwrap();

        let original = tile_from(PeCoord::new(0, 1), b, |r, c| (r + 2 * c) as f64 - 3.0);
        let mut top = original.clone();
        u.update_top(&mut top, &u.pack_lower(&pivot), &[]).unwrap();

        // L * updated == original
        for r in 0..b {
            for c in 0..b {
                let mut s = top.get(r, c);
                for k in 0..r {
                    s += pivot.get(r, k) * top.get(k, c);
                }
                assert!((s - original.get(r, c)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_left_update_solves_against_upper() {
        let b = 4;
        let u = PanelUpdater::new(b, 4).unwrap();
        let mut pivot = dominant(b);
        FactorizationStrategy::NoPivot.factorize(&mut pivot).unwrap();

        let original = tile_from(PeCoord::new(1, 0), b, |r, c| (r * c) as f64 + 1.0);
        let mut left = original.clone();
        u.update_left(&mut left, &u.pack_upper(&pivot)).unwrap();

        // updated * U == original
        for r in 0..b {
            for c in 0..b {
                let s: f64 = (0..=c).map(|k| left.get(r, k) * pivot.get(k, c)).sum();
                assert!((s - original.get(r, c)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_inner_update_subtracts_product() {
        let b = 2;
        let u = PanelUpdater::new(b, 1).unwrap();
        let mut t = tile_from(PeCoord::new(1, 1), b, |_, _| 10.0);
        let left = [1.0, 2.0, 3.0, 4.0];
        let top = [1.0, 0.0, 0.0, 1.0];
        u.update_inner(&mut t, &left, &top).unwrap();
        assert_eq!(t.as_slice(), &[9.0, 8.0, 7.0, 6.0]);
    }

    #[test]
    fn test_short_payload_rejected() {
        let u = PanelUpdater::new(4, 2).unwrap();
        let mut t = Tile::<f64>::zeros(PeCoord::new(0, 1), 4);
        assert!(u.update_top(&mut t, &[0.0; 3], &[]).is_err());
        assert!(u.update_left(&mut t, &[0.0; 39]).is_err());
        assert!(u.update_inner(&mut t, &[0.0; 16], &[0.0; 15]).is_err());
    }
}
