//! In-place LU factorization of a single diagonal tile
//!
//! After factorization the tile holds `U` on and above the diagonal and the
//! multipliers of the unit lower-triangular `L` strictly below it, so that
//! `L * U` reconstructs the (row-permuted) input.
//!
//! The elimination kernels here operate on any square row-major buffer and are
//! shared with the sequential reference in [`super::reference`]; that sharing
//! is what makes the distributed result match the reference bit for bit.

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::tile::Tile;

/// Elimination variant, selected once per run from validated configuration
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FactorizationStrategy {
    /// No pivot search. Only valid for diagonally dominant input; a zero pivot
    /// is not detected and produces non-finite output.
    #[default]
    NoPivot,
    /// Partial pivoting over the rows of the current diagonal tile.
    /// Mesh runs only allow it when the matrix is a single tile.
    PartialPivot,
}

impl FactorizationStrategy {
    /// Whether this variant records row interchanges
    #[inline]
    pub fn is_pivoted(self) -> bool {
        matches!(self, Self::PartialPivot)
    }

    /// Factorize a diagonal tile in place.
    ///
    /// Returns the pivot row chosen at each local step (tile-local indices),
    /// or an empty vector for [`FactorizationStrategy::NoPivot`].
    pub fn factorize<T: Element>(self, tile: &mut Tile<T>) -> Result<Vec<usize>> {
        if !tile.is_diagonal() {
            return Err(Error::InvalidArgument {
                arg: "tile",
                reason: format!("tile {} is not on the diagonal", tile.coord()),
            });
        }
        let b = tile.size();
        let tile_index = tile.coord().row;
        match self {
            Self::NoPivot => {
                lu_nopvt_in_place(tile.as_mut_slice(), b);
                Ok(Vec::new())
            }
            Self::PartialPivot => {
                let mut pivots = Vec::with_capacity(b);
                lu_pvt_in_place(tile.as_mut_slice(), b, &mut pivots)
                    .map_err(|step| Error::SingularPivot {
                        tile: tile_index,
                        step,
                    })?;
                Ok(pivots)
            }
        }
    }
}

/// No-pivot Doolittle elimination of a square row-major `n x n` buffer
pub(crate) fn lu_nopvt_in_place<T: Element>(a: &mut [T], n: usize) {
    debug_assert_eq!(a.len(), n * n);
    for k in 0..n {
        eliminate_below(a, n, k);
    }
}

/// Partial-pivot elimination of a square row-major `n x n` buffer.
///
/// Pushes the selected row for every step onto `pivots`. Rows are swapped
/// across all `n` columns. Returns the failing step on an exact zero pivot.
pub(crate) fn lu_pvt_in_place<T: Element>(
    a: &mut [T],
    n: usize,
    pivots: &mut Vec<usize>,
) -> std::result::Result<(), usize> {
    debug_assert_eq!(a.len(), n * n);
    for k in 0..n {
        let p = pivot_search(a, n, k);
        pivots.push(p);

        if a[p * n + k] == T::zero() {
            return Err(k);
        }
        swap_rows(a, n, k, p);
        eliminate_below(a, n, k);
    }
    Ok(())
}

/// Row in `k..n` holding the largest magnitude of column `k` (first one on ties)
#[inline]
fn pivot_search<T: Element>(a: &[T], n: usize, k: usize) -> usize {
    let mut max_row = k;
    let mut max_val = a[k * n + k].abs_val();
    for i in (k + 1)..n {
        let v = a[i * n + k].abs_val();
        if v > max_val {
            max_val = v;
            max_row = i;
        }
    }
    max_row
}

#[inline]
pub(crate) fn swap_rows<T: Element>(a: &mut [T], n: usize, r1: usize, r2: usize) {
    if r1 == r2 {
        return;
    }
    let (lo, hi) = if r1 < r2 { (r1, r2) } else { (r2, r1) };
    let (head, tail) = a.split_at_mut(hi * n);
    head[lo * n..(lo + 1) * n].swap_with_slice(&mut tail[..n]);
}

/// Store multipliers of column `k` and apply the rank-1 update to rows below
#[inline]
fn eliminate_below<T: Element>(a: &mut [T], n: usize, k: usize) {
    let pivot = a[k * n + k];
    let (head, tail) = a.split_at_mut((k + 1) * n);
    let pivot_row = &head[k * n..];
    for row in tail.chunks_exact_mut(n) {
        let m = row[k] / pivot;
        row[k] = m;
        for j in (k + 1)..n {
            row[j] = row[j] - m * pivot_row[j];
        }
    }
}
