//! Mesh coordinates and the fixed four-direction neighbor relation

use crate::error::{Error, Result};
use std::fmt;

/// One of the four channel directions of a processing element.
///
/// The numbering is part of the wire contract: a PE's outbound channel in
/// direction `d` feeds the inbound channel `d.opposite()` of its neighbor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Toward the PE in the row above
    Top = 0,
    /// Toward the PE in the column to the right
    Right = 1,
    /// Toward the PE in the row below
    Bottom = 2,
    /// Toward the PE in the column to the left
    Left = 3,
}

impl Direction {
    /// All directions in channel-number order
    pub const ALL: [Direction; 4] = [Self::Top, Self::Right, Self::Bottom, Self::Left];

    /// Channel number
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Direction for a channel number
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Top),
            1 => Some(Self::Right),
            2 => Some(Self::Bottom),
            3 => Some(Self::Left),
            _ => None,
        }
    }

    /// The direction a neighbor uses for the same link
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Right => Self::Left,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
        }
    }
}

/// Grid position of a processing element (and of the tile it owns)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeCoord {
    /// Row in the mesh
    pub row: usize,
    /// Column in the mesh
    pub col: usize,
}

impl PeCoord {
    /// Create a coordinate
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for PeCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// How edge PEs connect
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Edge PEs wrap around to the opposite edge
    #[default]
    Torus,
    /// Edge PEs have no link beyond the edge
    Bounded,
}

/// Extent and wiring of the mesh.
///
/// PEs live in a flat arena indexed row-major; neighbors are found by
/// coordinate arithmetic, modular on a torus.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MeshShape {
    rows: usize,
    cols: usize,
    topology: Topology,
}

impl MeshShape {
    /// A `rows x cols` mesh
    pub fn new(rows: usize, cols: usize, topology: Topology) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::configuration(format!(
                "mesh must have at least one PE, got {rows}x{cols}"
            )));
        }
        Ok(Self {
            rows,
            cols,
            topology,
        })
    }

    /// Rows of PEs
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Columns of PEs
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Edge wiring
    #[inline]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Number of PEs
    #[inline]
    pub fn pe_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Whether `coord` names a PE of this mesh
    #[inline]
    pub fn contains(&self, coord: PeCoord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    /// Arena index of a PE
    #[inline]
    pub fn id_of(&self, coord: PeCoord) -> usize {
        coord.row * self.cols + coord.col
    }

    /// Coordinate of an arena index
    #[inline]
    pub fn coord_of(&self, id: usize) -> PeCoord {
        PeCoord::new(id / self.cols, id % self.cols)
    }

    /// All PE coordinates in arena order
    pub fn coords(&self) -> impl Iterator<Item = PeCoord> + '_ {
        (0..self.pe_count()).map(|id| self.coord_of(id))
    }

    /// The PE on the other end of `coord`'s link in direction `dir`.
    ///
    /// `None` at a bounded edge, or when `coord` is not in the mesh.
    pub fn neighbor(&self, coord: PeCoord, dir: Direction) -> Option<PeCoord> {
        if !self.contains(coord) {
            return None;
        }
        let PeCoord { row, col } = coord;
        let wrap = self.topology == Topology::Torus;
        let (row, col) = match dir {
            Direction::Top if row > 0 => (row - 1, col),
            Direction::Top if wrap => (self.rows - 1, col),
            Direction::Bottom if row + 1 < self.rows => (row + 1, col),
            Direction::Bottom if wrap => (0, col),
            Direction::Left if col > 0 => (row, col - 1),
            Direction::Left if wrap => (row, self.cols - 1),
            Direction::Right if col + 1 < self.cols => (row, col + 1),
            Direction::Right if wrap => (row, 0),
            _ => return None,
        };
        Some(PeCoord::new(row, col))
    }
}
