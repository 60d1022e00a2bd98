//! Mesh client: wires the PEs and dispatches one distributed sweep

use super::channel::{PeChannels, wire};
use super::direction::{MeshShape, Topology};
use super::protocol::{PeOutcome, ProcessingElement};
use super::trace::MeshTrace;
use crate::algorithm::linalg::{FactorizationStrategy, PanelUpdater, PivotTracker};
use crate::config::LinpackConfig;
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::tile::{Tile, TiledMatrix};
use parking_lot::Mutex;

/// What a sweep leaves behind besides the factorized tiles
#[derive(Debug, Clone)]
pub struct SweepResult<T> {
    /// Row interchanges of every diagonal tile (identity for the no-pivot strategy)
    pub pivots: PivotTracker,
    /// Per-PE channel traffic, when recording is enabled
    pub trace: Option<MeshTrace<T>>,
}

/// Dispatches distributed factorizations over an `N x N` mesh of PEs.
///
/// Each call wires fresh channels, hands every tile to its own worker, and
/// collects the tiles back once every PE has finished its last pivot step.
#[derive(Debug, Clone)]
pub struct MeshClient {
    shape: MeshShape,
    strategy: FactorizationStrategy,
    updater: PanelUpdater,
    record_traces: bool,
}

impl MeshClient {
    /// Client for a validated run configuration
    pub fn new(config: &LinpackConfig) -> Result<Self> {
        config.validate()?;
        let mut client = Self::with_grid(
            config.grid_size(),
            config.block_size,
            config.chunk_size,
            config.topology,
        )?;
        client.strategy = config.strategy;
        client.record_traces = config.record_traces;
        Ok(client)
    }

    /// Client for a `grid x grid` mesh with default strategy and no recording
    pub fn with_grid(
        grid: usize,
        block_size: usize,
        chunk_size: usize,
        topology: Topology,
    ) -> Result<Self> {
        Ok(Self {
            shape: MeshShape::new(grid, grid, topology)?,
            strategy: FactorizationStrategy::default(),
            updater: PanelUpdater::new(block_size, chunk_size)?,
            record_traces: false,
        })
    }

    /// Select the elimination variant
    pub fn with_strategy(mut self, strategy: FactorizationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Record every channel payload
    pub fn with_traces(mut self, record: bool) -> Self {
        self.record_traces = record;
        self
    }

    /// Mesh extent and wiring
    #[inline]
    pub fn shape(&self) -> &MeshShape {
        &self.shape
    }

    /// Elimination variant used by every sweep
    #[inline]
    pub fn strategy(&self) -> FactorizationStrategy {
        self.strategy
    }

    /// Payload packing and tile updates shared by all PEs
    #[inline]
    pub fn updater(&self) -> &PanelUpdater {
        &self.updater
    }

    /// Factorize `matrix` in place across the mesh.
    ///
    /// Errors found before the sweep starts leave `matrix` untouched. Once the
    /// PEs run, an error leaves the tile contents unspecified; tiles whose PE
    /// failed are zeroed so the matrix stays well-formed.
    pub fn factorize<T: Element>(&self, matrix: &mut TiledMatrix<T>) -> Result<SweepResult<T>> {
        let grid = self.shape.rows();
        let b = self.updater.block_size();
        if matrix.grid_size() != grid || matrix.block_size() != b {
            return Err(Error::shape_mismatch(
                &[grid, b],
                &[matrix.grid_size(), matrix.block_size()],
            ));
        }
        // Pivot search sees one diagonal tile, which is only a full column
        // search when that tile is the whole matrix.
        if self.strategy.is_pivoted() && grid > 1 {
            return Err(Error::configuration(format!(
                "partial pivoting needs a single tile, got a {grid}x{grid} grid"
            )));
        }

        log::info!(
            "LU sweep: {grid}x{grid} mesh ({:?}), block {b}, chunk {}, {:?}, {}",
            self.shape.topology(),
            self.updater.chunk_size(),
            self.strategy,
            T::DTYPE
        );

        let channels = wire::<T>(&self.shape, self.record_traces);
        check_pairing(matrix.tiles(), &channels)?;
        let tiles = matrix.take_tiles();
        let mut pes = Vec::with_capacity(tiles.len());
        for (tile, ch) in tiles.into_iter().zip(channels) {
            pes.push(ProcessingElement::new(
                tile,
                ch,
                grid,
                self.strategy,
                &self.updater,
            )?);
        }

        let outcomes = run_all(pes)?;
        self.collect(matrix, outcomes)
    }

    fn collect<T: Element>(
        &self,
        matrix: &mut TiledMatrix<T>,
        outcomes: Vec<Result<PeOutcome<T>>>,
    ) -> Result<SweepResult<T>> {
        let grid = self.shape.rows();
        let b = self.updater.block_size();
        let mut pivots = PivotTracker::new(grid, b);
        let mut tiles = Vec::with_capacity(outcomes.len());
        let mut traces = Vec::with_capacity(outcomes.len());
        let mut root_cause: Option<Error> = None;
        let mut cascade: Option<Error> = None;

        for (id, outcome) in outcomes.into_iter().enumerate() {
            let coord = self.shape.coord_of(id);
            match outcome {
                Ok(out) => {
                    if coord.row == coord.col && !out.pivots.is_empty() {
                        if let Err(err) = pivots.record_tile(coord.row, &out.pivots) {
                            root_cause.get_or_insert(err);
                        }
                    }
                    tiles.push(out.tile);
                    traces.push(out.trace.unwrap_or_default());
                }
                Err(err) => {
                    log::debug!("PE {coord} failed: {err}");
                    let slot = if err.is_cascade() {
                        &mut cascade
                    } else {
                        &mut root_cause
                    };
                    slot.get_or_insert(err);
                    tiles.push(Tile::zeros(coord, b));
                    traces.push(Default::default());
                }
            }
        }

        matrix.restore_tiles(tiles)?;
        if let Some(err) = root_cause.or(cascade) {
            return Err(err);
        }

        let trace = self
            .record_traces
            .then(|| MeshTrace::new(self.shape, traces));
        Ok(SweepResult { pivots, trace })
    }
}

/// Every tile must go to the PE at its own grid position
fn check_pairing<T: Element>(tiles: &[Tile<T>], channels: &[PeChannels<T>]) -> Result<()> {
    if tiles.len() != channels.len() {
        return Err(Error::Internal(format!(
            "{} tiles for {} PEs",
            tiles.len(),
            channels.len()
        )));
    }
    match tiles
        .iter()
        .zip(channels)
        .find(|(tile, ch)| tile.coord() != ch.coord())
    {
        Some((tile, ch)) => Err(Error::Internal(format!(
            "tile {} handed to PE {}",
            tile.coord(),
            ch.coord()
        ))),
        None => Ok(()),
    }
}

/// Run every PE on its own worker and gather the outcomes in arena order
#[cfg(feature = "rayon")]
fn run_all<T: Element>(pes: Vec<ProcessingElement<'_, T>>) -> Result<Vec<Result<PeOutcome<T>>>> {
    let count = pes.len();
    let slots: Mutex<Vec<Option<Result<PeOutcome<T>>>>> =
        Mutex::new((0..count).map(|_| None).collect());

    // One thread per PE: a PE blocked in a receive must never hold back the
    // PE it is waiting for.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(count)
        .thread_name(|i| format!("meshlu-pe-{i}"))
        .build()
        .map_err(|e| Error::Internal(format!("failed to build PE thread pool: {e}")))?;

    pool.scope(|s| {
        for (id, pe) in pes.into_iter().enumerate() {
            let slots = &slots;
            s.spawn(move |_| {
                let outcome = run_guarded(pe);
                slots.lock()[id] = Some(outcome);
            });
        }
    });

    gather(slots.into_inner())
}

/// Run every PE on its own worker and gather the outcomes in arena order
#[cfg(not(feature = "rayon"))]
fn run_all<T: Element>(pes: Vec<ProcessingElement<'_, T>>) -> Result<Vec<Result<PeOutcome<T>>>> {
    let count = pes.len();
    let slots: Mutex<Vec<Option<Result<PeOutcome<T>>>>> =
        Mutex::new((0..count).map(|_| None).collect());

    std::thread::scope(|s| {
        for (id, pe) in pes.into_iter().enumerate() {
            let slots = &slots;
            s.spawn(move || {
                let outcome = run_guarded(pe);
                slots.lock()[id] = Some(outcome);
            });
        }
    });

    gather(slots.into_inner())
}

/// Run one PE, turning a panic into an error so the sweep can report it
fn run_guarded<T: Element>(pe: ProcessingElement<'_, T>) -> Result<PeOutcome<T>> {
    let coord = pe.coord();
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| pe.run()))
        .unwrap_or_else(|_| Err(Error::Internal(format!("PE {coord} panicked"))))
}

fn gather<T>(slots: Vec<Option<Result<PeOutcome<T>>>>) -> Result<Vec<Result<PeOutcome<T>>>> {
    slots
        .into_iter()
        .enumerate()
        .map(|(id, slot)| slot.ok_or_else(|| Error::Internal(format!("PE {id} never reported"))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::linalg::reference::{gefa_ref_nopvt, total_abs_error};
    use crate::mesh::{Direction, PeCoord};

    fn dominant(n: usize) -> Vec<f64> {
        let mut a: Vec<f64> = (0..n * n)
            .map(|i| ((i * 7919) % 97) as f64 / 97.0 - 0.5)
            .collect();
        for i in 0..n {
            a[i * n + i] = n as f64;
        }
        a
    }

    #[test]
    fn test_two_by_two_mesh_matches_reference() {
        let n = 8;
        let a = dominant(n);
        let mut m = TiledMatrix::from_dense(&a, n, 4).unwrap();
        let client = MeshClient::with_grid(2, 4, 2, Topology::Torus).unwrap();
        let sweep = client.factorize(&mut m).unwrap();
        assert!(sweep.pivots.is_identity());
        assert!(sweep.trace.is_none());

        let mut reference = a;
        gefa_ref_nopvt(&mut reference, n).unwrap();
        assert_eq!(total_abs_error(&m.to_dense(), &reference), 0.0);
    }

    #[test]
    fn test_grid_mismatch_rejected() {
        let mut m = TiledMatrix::from_dense(&dominant(8), 8, 4).unwrap();
        let client = MeshClient::with_grid(4, 2, 1, Topology::Bounded).unwrap();
        assert!(matches!(
            client.factorize(&mut m),
            Err(Error::ShapeMismatch { .. })
        ));
        // The matrix is untouched when the sweep never started
        assert_eq!(m.to_dense(), dominant(8));
    }

    #[test]
    fn test_pivoting_on_several_tiles_rejected() {
        let mut m = TiledMatrix::from_dense(&dominant(8), 8, 4).unwrap();
        let client = MeshClient::with_grid(2, 4, 2, Topology::Bounded)
            .unwrap()
            .with_strategy(FactorizationStrategy::PartialPivot);
        assert!(matches!(
            client.factorize(&mut m),
            Err(Error::Configuration { .. })
        ));
        assert_eq!(m.to_dense(), dominant(8));
    }

    #[test]
    fn test_single_tile_singular_pivot() {
        let mut m = TiledMatrix::from_dense(&[1.0f64, 2.0, 2.0, 4.0], 2, 2).unwrap();
        let client = MeshClient::with_grid(1, 2, 1, Topology::Torus)
            .unwrap()
            .with_strategy(FactorizationStrategy::PartialPivot);
        let err = client.factorize(&mut m).unwrap_err();
        assert!(matches!(err, Error::SingularPivot { tile: 0, step: 1 }));
        // The failed tile comes back zeroed rather than missing
        assert_eq!(m.tile(PeCoord::new(0, 0)).as_slice(), &[0.0; 4]);
    }

    #[test]
    fn test_root_cause_preferred_over_hangups() {
        let client = MeshClient::with_grid(2, 2, 1, Topology::Bounded).unwrap();
        let mut m = TiledMatrix::from_dense(&dominant(4), 4, 2).unwrap();
        let finished = Tile::from_vec(PeCoord::new(0, 0), 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let outcomes = vec![
            Ok(PeOutcome {
                tile: finished.clone(),
                pivots: Vec::new(),
                trace: None,
            }),
            Err(Error::ChannelClosed {
                pe: PeCoord::new(0, 1),
                direction: Direction::Left,
            }),
            Err(Error::protocol(PeCoord::new(1, 0), "short payload")),
            Err(Error::ChannelClosed {
                pe: PeCoord::new(1, 1),
                direction: Direction::Top,
            }),
        ];
        let err = client.collect(&mut m, outcomes).unwrap_err();
        assert!(matches!(err, Error::Protocol { pe, .. } if pe == PeCoord::new(1, 0)));
        assert_eq!(m.tile(PeCoord::new(0, 0)), &finished);
        assert_eq!(m.tile(PeCoord::new(1, 1)).as_slice(), &[0.0; 4]);
    }

    #[test]
    fn test_misaligned_endpoints_rejected() {
        let m = TiledMatrix::from_dense(&dominant(4), 4, 2).unwrap();
        let shape = MeshShape::new(2, 2, Topology::Torus).unwrap();
        let mut channels = wire::<f64>(&shape, false);
        check_pairing(m.tiles(), &channels).unwrap();
        channels.reverse();
        assert!(matches!(
            check_pairing(m.tiles(), &channels),
            Err(Error::Internal(_))
        ));
        channels.pop();
        assert!(check_pairing(m.tiles(), &channels).is_err());
    }
}
