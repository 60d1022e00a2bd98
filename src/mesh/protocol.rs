//! Per-PE elimination protocol
//!
//! PE `(i, j)` takes part in pivot steps `0..=min(i, j)`. At step `k` its role
//! follows from its position relative to the pivot tile `(k, k)`:
//!
//! ```text
//!            col k     col j > k
//!          ┌────────┬────────────┐
//!  row k   │Diagonal│    Top     │  Top: L_kk from Left, result to Bottom
//!          ├────────┼────────────┤
//!  row i>k │  Left  │   Inner    │  Left: U_kk from Top, result to Right
//!          └────────┴────────────┘  Inner: both results, forwarded onward
//! ```
//!
//! Pivot data only ever flows toward larger row and column indices, so the
//! Top and Left outbound channels stay silent and no cycle of blocking
//! receives can form.

use super::channel::{Message, PeChannels};
use super::direction::{Direction, PeCoord};
use super::trace::ChannelTrace;
use crate::algorithm::linalg::{FactorizationStrategy, PanelUpdater};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::tile::Tile;

/// Protocol state of one PE
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PeState {
    /// Between pivot steps
    Idle,
    /// Blocked on the pivot payload of the current step
    AwaitingPivot,
    /// Applying a panel update to the owned tile
    Updating,
    /// Relaying received payloads and emitting the updated tile
    Forwarding,
    /// Diagonal PE factorizing its tile
    Factorizing,
    /// Diagonal PE emitting its factors
    Broadcasting,
    /// All pivot steps this PE takes part in are complete
    Done,
}

impl PeState {
    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(self, next: PeState) -> bool {
        use PeState::*;
        matches!(
            (self, next),
            (Idle, AwaitingPivot)
                | (Idle, Factorizing)
                | (Idle, Done)
                | (AwaitingPivot, Updating)
                | (Updating, Forwarding)
                | (Forwarding, Idle)
                | (Factorizing, Broadcasting)
                | (Broadcasting, Idle)
        )
    }
}

/// What a PE does during one pivot step
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TileRole {
    /// Owns the pivot tile
    Diagonal,
    /// Shares the pivot tile's row, right of it
    Top,
    /// Shares the pivot tile's column, below it
    Left,
    /// In the trailing submatrix
    Inner,
}

impl TileRole {
    /// Role of PE `coord` at pivot `step`, or `None` once it is finished
    pub fn at(coord: PeCoord, step: usize) -> Option<Self> {
        let PeCoord { row, col } = coord;
        match (row.cmp(&step), col.cmp(&step)) {
            (std::cmp::Ordering::Equal, std::cmp::Ordering::Equal) => Some(Self::Diagonal),
            (std::cmp::Ordering::Equal, std::cmp::Ordering::Greater) => Some(Self::Top),
            (std::cmp::Ordering::Greater, std::cmp::Ordering::Equal) => Some(Self::Left),
            (std::cmp::Ordering::Greater, std::cmp::Ordering::Greater) => Some(Self::Inner),
            _ => None,
        }
    }
}

/// Number of pivot steps PE `coord` takes part in
#[inline]
pub fn steps_for(coord: PeCoord) -> usize {
    coord.row.min(coord.col) + 1
}

/// What a PE hands back after its last step
#[derive(Debug)]
pub struct PeOutcome<T> {
    /// The owned tile, now holding its part of `L` and `U`
    pub tile: Tile<T>,
    /// Pivot rows chosen, for diagonal PEs running the pivoted strategy
    pub pivots: Vec<usize>,
    /// Channel traffic, if recording was enabled
    pub trace: Option<ChannelTrace<T>>,
}

/// One processing element: its tile, its endpoints and its protocol state
#[derive(Debug)]
pub struct ProcessingElement<'a, T> {
    coord: PeCoord,
    grid: usize,
    tile: Tile<T>,
    channels: PeChannels<T>,
    strategy: FactorizationStrategy,
    updater: &'a PanelUpdater,
    state: PeState,
    pivots: Vec<usize>,
}

impl<'a, T: Element> ProcessingElement<'a, T> {
    /// Bind a tile to the endpoints of the PE at the same grid position
    pub fn new(
        tile: Tile<T>,
        channels: PeChannels<T>,
        grid: usize,
        strategy: FactorizationStrategy,
        updater: &'a PanelUpdater,
    ) -> Result<Self> {
        let coord = channels.coord();
        if tile.coord() != coord {
            return Err(Error::Internal(format!(
                "tile {} handed to PE {coord}",
                tile.coord()
            )));
        }
        Ok(Self {
            coord,
            grid,
            tile,
            channels,
            strategy,
            updater,
            state: PeState::Idle,
            pivots: Vec::new(),
        })
    }

    /// Grid position of this PE
    #[inline]
    pub fn coord(&self) -> PeCoord {
        self.coord
    }

    /// Current protocol state
    #[inline]
    pub fn state(&self) -> PeState {
        self.state
    }

    /// The owned tile in its current state
    #[inline]
    pub fn tile(&self) -> &Tile<T> {
        &self.tile
    }

    /// Run every pivot step this PE takes part in
    pub fn run(mut self) -> Result<PeOutcome<T>> {
        for step in 0..steps_for(self.coord) {
            self.run_step(step)?;
        }
        self.finish()
    }

    /// Run pivot `step` in whatever role this PE has at that step.
    ///
    /// The tile is only touched once every payload of the step has arrived
    /// and passed its step and length checks.
    pub fn run_step(&mut self, step: usize) -> Result<()> {
        let role = TileRole::at(self.coord, step).ok_or_else(|| {
            Error::protocol(self.coord, format!("no role at step {step}"))
        })?;
        match role {
            TileRole::Diagonal => self.diagonal_step(step),
            TileRole::Top => self.top_step(step),
            TileRole::Left => self.left_step(step),
            TileRole::Inner => self.inner_step(step),
        }
    }

    /// Leave the protocol and hand back the tile, pivots and trace
    pub fn finish(mut self) -> Result<PeOutcome<T>> {
        self.transition(PeState::Done)?;
        Ok(PeOutcome {
            tile: self.tile,
            pivots: self.pivots,
            trace: self.channels.into_trace(),
        })
    }

    fn transition(&mut self, next: PeState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(Error::protocol(
                self.coord,
                format!("illegal transition {:?} -> {next:?}", self.state),
            ));
        }
        log::trace!("PE {} {:?} -> {next:?}", self.coord, self.state);
        self.state = next;
        Ok(())
    }

    #[inline]
    fn has_below(&self) -> bool {
        self.coord.row + 1 < self.grid
    }

    #[inline]
    fn has_right(&self) -> bool {
        self.coord.col + 1 < self.grid
    }

    fn own_tile(&self, step: usize) -> Message<T> {
        Message::new(step, self.tile.as_slice().to_vec())
    }

    fn diagonal_step(&mut self, step: usize) -> Result<()> {
        self.transition(PeState::Factorizing)?;
        self.pivots = self.strategy.factorize(&mut self.tile)?;
        log::debug!("PE {} factorized pivot tile {step}", self.coord);

        self.transition(PeState::Broadcasting)?;
        if self.has_right() {
            let lower = self.updater.pack_lower(&self.tile);
            self.channels.send(
                Direction::Right,
                Message::new(step, lower).with_pivots(self.pivots.clone()),
            )?;
        }
        if self.has_below() {
            let upper = self.updater.pack_upper(&self.tile);
            self.channels
                .send(Direction::Bottom, Message::new(step, upper))?;
        }
        self.transition(PeState::Idle)
    }

    fn top_step(&mut self, step: usize) -> Result<()> {
        self.transition(PeState::AwaitingPivot)?;
        let lower = self
            .channels
            .recv(Direction::Left, step, self.updater.payload_len())?;
        self.check_pivots(step, &lower.pivots)?;

        self.transition(PeState::Updating)?;
        self.updater
            .update_top(&mut self.tile, &lower.values, &lower.pivots)?;

        self.transition(PeState::Forwarding)?;
        if self.has_right() {
            self.channels.send(Direction::Right, lower)?;
        }
        let result = self.own_tile(step);
        self.channels.send(Direction::Bottom, result)?;
        self.transition(PeState::Idle)
    }

    fn left_step(&mut self, step: usize) -> Result<()> {
        self.transition(PeState::AwaitingPivot)?;
        let upper = self
            .channels
            .recv(Direction::Top, step, self.updater.payload_len())?;

        self.transition(PeState::Updating)?;
        self.updater.update_left(&mut self.tile, &upper.values)?;

        self.transition(PeState::Forwarding)?;
        if self.has_below() {
            self.channels.send(Direction::Bottom, upper)?;
        }
        let result = self.own_tile(step);
        self.channels.send(Direction::Right, result)?;
        self.transition(PeState::Idle)
    }

    fn inner_step(&mut self, step: usize) -> Result<()> {
        self.transition(PeState::AwaitingPivot)?;
        let full = self.updater.tile_len();
        let top = self.channels.recv(Direction::Top, step, full)?;
        let left = self.channels.recv(Direction::Left, step, full)?;

        self.transition(PeState::Updating)?;
        self.updater
            .update_inner(&mut self.tile, &left.values, &top.values)?;

        self.transition(PeState::Forwarding)?;
        if self.has_below() {
            self.channels.send(Direction::Bottom, top)?;
        }
        if self.has_right() {
            self.channels.send(Direction::Right, left)?;
        }
        self.transition(PeState::Idle)
    }

    /// Interchanges must match the strategy and stay inside the tile
    fn check_pivots(&self, step: usize, pivots: &[usize]) -> Result<()> {
        let b = self.tile.size();
        let expected = if self.strategy.is_pivoted() { b } else { 0 };
        if pivots.len() != expected {
            return Err(Error::protocol(
                self.coord,
                format!(
                    "step {step} carries {} row interchanges, expected {expected}",
                    pivots.len()
                ),
            ));
        }
        if let Some((k, &p)) = pivots.iter().enumerate().find(|&(k, &p)| p < k || p >= b) {
            return Err(Error::protocol(
                self.coord,
                format!("step {step} interchange {k} names row {p}"),
            ));
        }
        Ok(())
    }
}
