//! Directional FIFO channels between mesh-adjacent PEs
//!
//! Each link is a `crossbeam-channel` FIFO: sends never block and never
//! reorder, receives block until a whole payload for one pivot step has
//! arrived. Every receive is checked against the step the PE expects next and
//! the exact number of values that step must carry.

use super::direction::{Direction, MeshShape, PeCoord};
use super::trace::ChannelTrace;
use crate::dtype::Element;
use crate::error::{Error, Result};
use crossbeam_channel::{Receiver, Sender, unbounded};

/// One payload for one pivot step
#[derive(Debug, Clone, PartialEq)]
pub struct Message<T> {
    /// Pivot step the payload belongs to
    pub step: usize,
    /// Float payload, in send order
    pub values: Vec<T>,
    /// Row interchanges of the pivot tile, riding alongside the float payload
    pub pivots: Vec<usize>,
}

impl<T> Message<T> {
    /// Payload without row interchanges
    pub fn new(step: usize, values: Vec<T>) -> Self {
        Self {
            step,
            values,
            pivots: Vec::new(),
        }
    }

    /// Attach the pivot tile's row interchanges
    pub fn with_pivots(mut self, pivots: Vec<usize>) -> Self {
        self.pivots = pivots;
        self
    }
}

/// The four inbound and four outbound endpoints owned by one PE
#[derive(Debug)]
pub struct PeChannels<T> {
    coord: PeCoord,
    outbound: [Option<Sender<Message<T>>>; 4],
    inbound: [Option<Receiver<Message<T>>>; 4],
    trace: Option<ChannelTrace<T>>,
}

impl<T: Element> PeChannels<T> {
    /// PE owning these endpoints
    #[inline]
    pub fn coord(&self) -> PeCoord {
        self.coord
    }

    /// Whether a link exists in direction `dir`
    #[inline]
    pub fn has_link(&self, dir: Direction) -> bool {
        self.outbound[dir.index()].is_some()
    }

    /// Send one payload in direction `dir`
    pub fn send(&mut self, dir: Direction, message: Message<T>) -> Result<()> {
        let coord = self.coord;
        let sender = self.outbound[dir.index()].as_ref().ok_or_else(|| {
            Error::protocol(coord, format!("no outbound link toward {dir:?}"))
        })?;
        if let Some(trace) = self.trace.as_mut() {
            trace.record_out(dir, &message.values);
        }
        log::trace!(
            "PE {coord} sends {} values toward {dir:?} (step {})",
            message.values.len(),
            message.step
        );
        sender
            .send(message)
            .map_err(|_| Error::ChannelClosed {
                pe: coord,
                direction: dir,
            })
    }

    /// Block until the payload of `step` arrives from direction `dir`.
    ///
    /// A payload for any other step, or one whose length differs from
    /// `expected_len`, is a protocol violation.
    pub fn recv(&mut self, dir: Direction, step: usize, expected_len: usize) -> Result<Message<T>> {
        let coord = self.coord;
        let receiver = self.inbound[dir.index()].as_ref().ok_or_else(|| {
            Error::protocol(coord, format!("no inbound link from {dir:?}"))
        })?;
        let message = receiver.recv().map_err(|_| Error::ChannelClosed {
            pe: coord,
            direction: dir,
        })?;
        if let Some(trace) = self.trace.as_mut() {
            trace.record_in(dir, &message.values);
        }
        if message.step != step {
            return Err(Error::protocol(
                coord,
                format!(
                    "expected payload for step {step} from {dir:?}, got step {}",
                    message.step
                ),
            ));
        }
        if message.values.len() != expected_len {
            return Err(Error::protocol(
                coord,
                format!(
                    "step {step} payload from {dir:?} has {} values, expected {expected_len}",
                    message.values.len()
                ),
            ));
        }
        log::trace!("PE {coord} received {expected_len} values from {dir:?} (step {step})");
        Ok(message)
    }

    /// Drop all endpoints and hand back whatever was recorded
    pub fn into_trace(self) -> Option<ChannelTrace<T>> {
        self.trace
    }
}

/// Create the endpoints of every PE in `shape`, in arena order.
///
/// For every PE and direction with a neighbor, one link is created from the
/// PE's outbound endpoint to the neighbor's inbound endpoint of the opposite
/// direction.
pub fn wire<T: Element>(shape: &MeshShape, record: bool) -> Vec<PeChannels<T>> {
    let mut pes: Vec<PeChannels<T>> = shape
        .coords()
        .map(|coord| PeChannels {
            coord,
            outbound: std::array::from_fn(|_| None),
            inbound: std::array::from_fn(|_| None),
            trace: record.then(ChannelTrace::new),
        })
        .collect();

    for coord in shape.coords().collect::<Vec<_>>() {
        for dir in Direction::ALL {
            if let Some(peer) = shape.neighbor(coord, dir) {
                let (tx, rx) = unbounded();
                pes[shape.id_of(coord)].outbound[dir.index()] = Some(tx);
                pes[shape.id_of(peer)].inbound[dir.opposite().index()] = Some(rx);
            }
        }
    }
    pes
}
