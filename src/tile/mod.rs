//! Tiles and the tiled matrix
//!
//! A square matrix of order `n` is partitioned into an `N x N` grid of square
//! tiles of edge `block_size`, with `n = N * block_size`. Each tile owns a
//! contiguous row-major buffer and knows its grid position. In the distributed
//! path every processing element owns exactly one tile; the host keeps the
//! whole [`TiledMatrix`] only to load tiles in and read them back out.

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::mesh::PeCoord;

/// One `block_size x block_size` square of the matrix, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Tile<T> {
    coord: PeCoord,
    size: usize,
    data: Vec<T>,
}

impl<T: Element> Tile<T> {
    /// Wrap an existing row-major buffer
    pub fn from_vec(coord: PeCoord, size: usize, data: Vec<T>) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidArgument {
                arg: "size",
                reason: "tile edge must be positive".to_string(),
            });
        }
        if data.len() != size * size {
            return Err(Error::shape_mismatch(&[size * size], &[data.len()]));
        }
        Ok(Self { coord, size, data })
    }

    /// Tile filled with zeros
    pub fn zeros(coord: PeCoord, size: usize) -> Self {
        Self {
            coord,
            size,
            data: vec![T::zero(); size * size],
        }
    }

    /// Grid position of this tile
    #[inline]
    pub fn coord(&self) -> PeCoord {
        self.coord
    }

    /// Edge length
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Tiles on the main diagonal are the only ones factorized directly
    #[inline]
    pub fn is_diagonal(&self) -> bool {
        self.coord.row == self.coord.col
    }

    /// Element at local `(row, col)`
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.size + col]
    }

    /// Overwrite element at local `(row, col)`
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.size + col] = value;
    }

    /// Row-major contents
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable row-major contents
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Copy the contents of `source` over this tile
    pub fn reset_from(&mut self, source: &Tile<T>) -> Result<()> {
        if source.coord != self.coord || source.size != self.size {
            return Err(Error::InvalidArgument {
                arg: "source",
                reason: format!(
                    "snapshot tile {} (edge {}) does not match tile {} (edge {})",
                    source.coord, source.size, self.coord, self.size
                ),
            });
        }
        self.data.copy_from_slice(&source.data);
        Ok(())
    }
}

/// A square matrix held as a grid of tiles
#[derive(Debug, Clone, PartialEq)]
pub struct TiledMatrix<T> {
    grid: usize,
    block_size: usize,
    tiles: Vec<Tile<T>>,
}

impl<T: Element> TiledMatrix<T> {
    /// Partition a dense row-major `n x n` matrix into tiles of edge `block_size`
    pub fn from_dense(data: &[T], n: usize, block_size: usize) -> Result<Self> {
        if data.len() != n * n {
            return Err(Error::shape_mismatch(&[n, n], &[data.len()]));
        }
        let grid = validate_tiling(n, block_size)?;

        let mut tiles = Vec::with_capacity(grid * grid);
        for tile_row in 0..grid {
            for tile_col in 0..grid {
                let mut buf = Vec::with_capacity(block_size * block_size);
                for r in 0..block_size {
                    let start = (tile_row * block_size + r) * n + tile_col * block_size;
                    buf.extend_from_slice(&data[start..start + block_size]);
                }
                tiles.push(Tile {
                    coord: PeCoord::new(tile_row, tile_col),
                    size: block_size,
                    data: buf,
                });
            }
        }

        Ok(Self {
            grid,
            block_size,
            tiles,
        })
    }

    /// Reassemble tiles produced elsewhere, in any order
    pub fn from_tiles(grid: usize, block_size: usize, tiles: Vec<Tile<T>>) -> Result<Self> {
        if tiles.len() != grid * grid {
            return Err(Error::shape_mismatch(&[grid * grid], &[tiles.len()]));
        }
        let mut slots: Vec<Option<Tile<T>>> = (0..grid * grid).map(|_| None).collect();
        for tile in tiles {
            let coord = tile.coord;
            if coord.row >= grid || coord.col >= grid || tile.size != block_size {
                return Err(Error::InvalidArgument {
                    arg: "tiles",
                    reason: format!("tile {coord} does not fit a {grid}x{grid} grid of edge {block_size}"),
                });
            }
            let slot = &mut slots[coord.row * grid + coord.col];
            if slot.is_some() {
                return Err(Error::InvalidArgument {
                    arg: "tiles",
                    reason: format!("duplicate tile {coord}"),
                });
            }
            *slot = Some(tile);
        }
        // Every slot is filled: the count matched and no slot was taken twice.
        let tiles = slots.into_iter().flatten().collect();
        Ok(Self {
            grid,
            block_size,
            tiles,
        })
    }

    /// Matrix order `n`
    #[inline]
    pub fn order(&self) -> usize {
        self.grid * self.block_size
    }

    /// Number of tiles along one edge
    #[inline]
    pub fn grid_size(&self) -> usize {
        self.grid
    }

    /// Tile edge length
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Tile at grid position `coord`
    pub fn tile(&self, coord: PeCoord) -> &Tile<T> {
        &self.tiles[coord.row * self.grid + coord.col]
    }

    /// Mutable tile at grid position `coord`
    pub fn tile_mut(&mut self, coord: PeCoord) -> &mut Tile<T> {
        &mut self.tiles[coord.row * self.grid + coord.col]
    }

    /// All tiles, row-major over the grid
    pub fn tiles(&self) -> &[Tile<T>] {
        &self.tiles
    }

    /// Global element `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> T {
        let b = self.block_size;
        self.tile(PeCoord::new(row / b, col / b)).get(row % b, col % b)
    }

    /// Dense row-major copy of the whole matrix
    pub fn to_dense(&self) -> Vec<T> {
        let n = self.order();
        let b = self.block_size;
        let mut out = vec![T::zero(); n * n];
        for tile in &self.tiles {
            let PeCoord { row, col } = tile.coord;
            for r in 0..b {
                let start = (row * b + r) * n + col * b;
                out[start..start + b].copy_from_slice(&tile.data[r * b..(r + 1) * b]);
            }
        }
        out
    }

    /// Restore every tile from a snapshot taken before a destructive sweep
    pub fn reset_from(&mut self, snapshot: &TiledMatrix<T>) -> Result<()> {
        if snapshot.grid != self.grid || snapshot.block_size != self.block_size {
            return Err(Error::shape_mismatch(
                &[self.grid, self.block_size],
                &[snapshot.grid, snapshot.block_size],
            ));
        }
        for (tile, source) in self.tiles.iter_mut().zip(&snapshot.tiles) {
            tile.reset_from(source)?;
        }
        Ok(())
    }

    /// Hand every tile over to its owner, leaving the matrix empty
    pub(crate) fn take_tiles(&mut self) -> Vec<Tile<T>> {
        std::mem::take(&mut self.tiles)
    }

    /// Put tiles back after a sweep
    pub(crate) fn restore_tiles(&mut self, tiles: Vec<Tile<T>>) -> Result<()> {
        *self = Self::from_tiles(self.grid, self.block_size, tiles)?;
        Ok(())
    }
}

/// Check that `n` splits into equal tiles of edge `block_size`; returns the grid edge
pub fn validate_tiling(n: usize, block_size: usize) -> Result<usize> {
    if block_size == 0 || n == 0 {
        return Err(Error::configuration(format!(
            "matrix order {n} and block size {block_size} must both be positive"
        )));
    }
    if n % block_size != 0 {
        return Err(Error::configuration(format!(
            "matrix order {n} is not a multiple of block size {block_size}"
        )));
    }
    Ok(n / block_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense(n: usize) -> Vec<f64> {
        (0..n * n).map(|v| v as f64).collect()
    }

    #[test]
    fn test_from_dense_round_trip() {
        let data = dense(6);
        let m = TiledMatrix::from_dense(&data, 6, 3).unwrap();
        assert_eq!(m.grid_size(), 2);
        assert_eq!(m.to_dense(), data);
    }

    #[test]
    fn test_tile_addressing() {
        let m = TiledMatrix::from_dense(&dense(4), 4, 2).unwrap();
        // Element (2, 3) lives in tile (1, 1) at local (0, 1)
        let t = m.tile(PeCoord::new(1, 1));
        assert!(t.is_diagonal());
        assert_eq!(t.get(0, 1), 11.0);
        assert_eq!(m.get(2, 3), 11.0);
        assert!(!m.tile(PeCoord::new(0, 1)).is_diagonal());
    }

    #[test]
    fn test_untileable_matrix_rejected() {
        let err = TiledMatrix::from_dense(&dense(5), 5, 2).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_reset_from_snapshot() {
        let snapshot = TiledMatrix::from_dense(&dense(4), 4, 2).unwrap();
        let mut work = snapshot.clone();
        work.tile_mut(PeCoord::new(0, 1)).set(1, 1, -1.0);
        assert_ne!(work, snapshot);
        work.reset_from(&snapshot).unwrap();
        assert_eq!(work, snapshot);
    }

    #[test]
    fn test_from_tiles_any_order() {
        let m = TiledMatrix::from_dense(&dense(4), 4, 2).unwrap();
        let mut tiles = m.tiles().to_vec();
        tiles.reverse();
        let back = TiledMatrix::from_tiles(2, 2, tiles).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_from_tiles_rejects_duplicates() {
        let t = Tile::<f64>::zeros(PeCoord::new(0, 0), 2);
        let err = TiledMatrix::from_tiles(1, 2, vec![t.clone()]);
        assert!(err.is_ok());
        let err = TiledMatrix::from_tiles(2, 2, vec![t.clone(), t.clone(), t.clone(), t]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { arg: "tiles", .. }));
    }
}
