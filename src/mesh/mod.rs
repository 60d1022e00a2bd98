//! The processing-element mesh
//!
//! A `N x N` grid of processing elements (PEs), each owning one tile and
//! talking to its four neighbors through directional FIFO channels. The
//! [`MeshClient`] wires the grid, runs one worker per PE through a full pivot
//! sweep and hands the tiles back.

pub mod channel;
pub mod client;
pub mod direction;
pub mod protocol;
pub mod trace;

pub use channel::{Message, PeChannels, wire};
pub use client::{MeshClient, SweepResult};
pub use direction::{Direction, MeshShape, PeCoord, Topology};
pub use protocol::{PeOutcome, PeState, ProcessingElement, TileRole, steps_for};
pub use trace::{ChannelTrace, MeshTrace, input_file_name, output_file_name};
