//! Persisted channel traces
//!
//! Every value a PE sends or receives can be recorded per direction. On disk a
//! trace is one file per channel and direction, a flat sequence of
//! native-width, native-endian floats in send order with no header:
//!
//! ```text
//! <dir>/kernel_output_ch0   values sent toward Top
//! <dir>/kernel_output_ch1   values sent toward Right
//! <dir>/kernel_input_ch3    values received from Left
//! ...
//! ```

use super::direction::{Direction, MeshShape, PeCoord};
use crate::dtype::Element;
use crate::error::{Error, Result};
use std::path::Path;

/// File name of an outbound channel trace
pub fn output_file_name(dir: Direction) -> String {
    format!("kernel_output_ch{}", dir.index())
}

/// File name of an inbound channel trace
pub fn input_file_name(dir: Direction) -> String {
    format!("kernel_input_ch{}", dir.index())
}

/// Values one PE moved over each of its channels during a sweep
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelTrace<T> {
    outbound: [Vec<T>; 4],
    inbound: [Vec<T>; 4],
}

impl<T: Element> Default for ChannelTrace<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> ChannelTrace<T> {
    /// Empty trace
    pub fn new() -> Self {
        Self {
            outbound: std::array::from_fn(|_| Vec::new()),
            inbound: std::array::from_fn(|_| Vec::new()),
        }
    }

    pub(crate) fn record_out(&mut self, dir: Direction, values: &[T]) {
        self.outbound[dir.index()].extend_from_slice(values);
    }

    pub(crate) fn record_in(&mut self, dir: Direction, values: &[T]) {
        self.inbound[dir.index()].extend_from_slice(values);
    }

    /// Values sent in direction `dir`, in send order
    pub fn outbound(&self, dir: Direction) -> &[T] {
        &self.outbound[dir.index()]
    }

    /// Values received from direction `dir`, in arrival order
    pub fn inbound(&self, dir: Direction) -> &[T] {
        &self.inbound[dir.index()]
    }

    /// True if nothing moved in either direction on any channel
    pub fn is_silent(&self) -> bool {
        self.outbound.iter().chain(&self.inbound).all(Vec::is_empty)
    }

    /// Write all eight channel files into `dir`, creating it if needed
    pub fn write_to_dir(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        for d in Direction::ALL {
            write_channel_file(&dir.join(output_file_name(d)), self.outbound(d))?;
            write_channel_file(&dir.join(input_file_name(d)), self.inbound(d))?;
        }
        Ok(())
    }

    /// Load a trace previously written with [`ChannelTrace::write_to_dir`]
    pub fn read_from_dir(dir: &Path) -> Result<Self> {
        let mut trace = Self::new();
        for d in Direction::ALL {
            trace.outbound[d.index()] = read_channel_file(&dir.join(output_file_name(d)))?;
            trace.inbound[d.index()] = read_channel_file(&dir.join(input_file_name(d)))?;
        }
        Ok(trace)
    }
}

/// Traces of every PE in a mesh, in arena order
#[derive(Debug, Clone, PartialEq)]
pub struct MeshTrace<T> {
    shape: MeshShape,
    pes: Vec<ChannelTrace<T>>,
}

impl<T: Element> MeshTrace<T> {
    pub(crate) fn new(shape: MeshShape, pes: Vec<ChannelTrace<T>>) -> Self {
        debug_assert_eq!(pes.len(), shape.pe_count());
        Self { shape, pes }
    }

    /// Trace of the PE at `coord`
    pub fn pe(&self, coord: PeCoord) -> &ChannelTrace<T> {
        &self.pes[self.shape.id_of(coord)]
    }

    /// Total values sent over all channels of all PEs
    pub fn total_sent(&self) -> usize {
        self.pes
            .iter()
            .flat_map(|t| Direction::ALL.map(|d| t.outbound(d).len()))
            .sum()
    }

    /// Write one `pe_<row>_<col>` directory per PE under `root`
    pub fn write_to_dir(&self, root: &Path) -> Result<()> {
        for (id, trace) in self.pes.iter().enumerate() {
            let c = self.shape.coord_of(id);
            trace.write_to_dir(&root.join(format!("pe_{}_{}", c.row, c.col)))?;
        }
        Ok(())
    }
}

/// Write values as raw native-endian bytes
pub fn write_channel_file<T: Element>(path: &Path, values: &[T]) -> Result<()> {
    std::fs::write(path, bytemuck::cast_slice::<T, u8>(values))?;
    Ok(())
}

/// Read a headerless channel file back into values
pub fn read_channel_file<T: Element>(path: &Path) -> Result<Vec<T>> {
    let bytes = std::fs::read(path)?;
    let width = T::DTYPE.size_in_bytes();
    if bytes.len() % width != 0 {
        return Err(Error::InvalidArgument {
            arg: "path",
            reason: format!(
                "{} holds {} bytes, not a whole number of {} values",
                path.display(),
                bytes.len(),
                T::DTYPE
            ),
        });
    }
    Ok(bytemuck::pod_collect_to_vec::<u8, T>(&bytes))
}
