//! The seam carver: energy upkeep, minimal-seam search and seam removal.
//!
//! A [`SeamCarver`] never copies pixels while carving. It keeps an index map
//! of the source columns still visible in every row, removes a seam by
//! shifting that map, and records the removal in its [`MultiSizeImage`].
//! Energies are stored per source pixel, so after a seam only the band of
//! pixels whose reader window touched it has to be recomputed.
//!
//! One seam goes through the states
//! `Idle -> EnergyComputed -> PathFound -> SeamApplied -> EnergyComputed ...`;
//! calling an operation in the wrong state is [`CarveError::InvalidState`].

pub mod dp;
pub mod path;

pub use dp::{CostTable, SideBias};
pub use path::{Orientation, SeamPath};

use crate::energy::sample::{PixelSamples, VisibleCache, VisiblePixels};
use crate::energy::{DirectWindow, EnergyFunction, ReadCache, ReaderWindow};
use crate::grid::{EnergyMap, Grid};
use crate::image::PixelBuffer;
use crate::multisize::MultiSizeImage;
use crate::rigidity::{RigidityMap, RigidityMask};
use crate::trace::{trace_event, trace_span};
use crate::util::{CancelToken, CarveError, CarveResult};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Where a carver is in the per-seam cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CarverState {
    /// Nothing computed for the next seam yet.
    Idle,
    /// The energy map matches the visible image.
    EnergyComputed,
    /// A minimal seam has been found and awaits removal.
    PathFound,
    /// A seam was just removed; the energy map is stale around it.
    SeamApplied,
}

impl CarverState {
    fn name(&self) -> &'static str {
        match self {
            CarverState::Idle => "idle",
            CarverState::EnergyComputed => "energy computed",
            CarverState::PathFound => "path found",
            CarverState::SeamApplied => "seam applied",
        }
    }
}

/// Carver parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarverConfig {
    /// Energy reader and gradient.
    pub energy: EnergyFunction,
    /// Rigidity coefficient, `>= 0`.
    pub rigidity: f32,
    /// Largest lateral step between scanlines, `>= 1`.
    pub max_step: usize,
    /// How many times the tie-break side flips over one carving run.
    pub side_switch_frequency: u32,
    /// Precompute reader values once and read them in place.
    pub caching: bool,
    /// Use rayon for the full energy pass and within cost-table scanlines.
    pub parallel: bool,
}

impl Default for CarverConfig {
    fn default() -> Self {
        Self {
            energy: EnergyFunction::default(),
            rigidity: 0.0,
            max_step: 1,
            side_switch_frequency: 0,
            caching: true,
            parallel: false,
        }
    }
}

/// Reported after every committed seam of a carving run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Carving axis.
    pub orientation: Orientation,
    /// Seams committed so far.
    pub depth: usize,
    /// Depth the run is heading for.
    pub target: usize,
}

/// Progress observer.
pub type ProgressFn = Arc<dyn Fn(Progress) + Send + Sync>;

/// Incremental seam carver over one source buffer.
pub struct SeamCarver {
    config: CarverConfig,
    image: MultiSizeImage,
    rigidity: RigidityMap,
    preserve: Option<Grid<f32>>,
    suppress: Option<Grid<f32>>,
    bias: Option<Grid<f32>>,
    mask: Option<Grid<f32>>,
    read_cache: Option<ReadCache>,
    index: Grid<usize>,
    width: usize,
    energy: Grid<f32>,
    energy_valid: bool,
    stale_seam: Option<Vec<usize>>,
    pending: Option<SeamPath>,
    state: CarverState,
    side: SideBias,
    cancel: CancelToken,
    progress: Option<ProgressFn>,
}

impl fmt::Debug for SeamCarver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeamCarver")
            .field("config", &self.config)
            .field("orientation", &self.image.orientation())
            .field("width", &self.width)
            .field("depth", &self.depth())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
enum Samples<'a> {
    Cached(VisibleCache<'a>),
    Buffered(VisiblePixels<'a>),
}

/// Borrowed inputs of one energy pass.
#[derive(Clone, Copy)]
struct EnergyPass<'a> {
    function: EnergyFunction,
    samples: Samples<'a>,
    bias: Option<&'a Grid<f32>>,
    index: &'a Grid<usize>,
    width: usize,
    height: usize,
}

impl<'a> EnergyPass<'a> {
    fn new(
        function: EnergyFunction,
        source: &'a PixelBuffer,
        cache: Option<&'a ReadCache>,
        bias: Option<&'a Grid<f32>>,
        index: &'a Grid<usize>,
        width: usize,
    ) -> CarveResult<Self> {
        let samples = match cache {
            Some(cache) => Samples::Cached(VisibleCache { cache, index, width }),
            None => Samples::Buffered(VisiblePixels {
                samples: PixelSamples::new(source, function.kind)?,
                index,
                width,
            }),
        };
        Ok(Self {
            function,
            samples,
            bias,
            index,
            width,
            height: index.height(),
        })
    }

    fn window(&self) -> ReaderWindow {
        ReaderWindow::new(self.function.kind, self.function.radius())
    }

    /// Writes the energy of visible pixels `xs` of row `y` into `out`,
    /// indexed by source column.
    fn fill_row(
        &self,
        y: usize,
        xs: Range<usize>,
        window: &mut ReaderWindow,
        out: &mut [f32],
    ) -> CarveResult<()> {
        let (w, h) = (self.width, self.height);
        let r = self.function.radius();
        for x in xs {
            let e = match &self.samples {
                Samples::Cached(src) => {
                    let win = DirectWindow::new(self.function.kind, src, x, y, r)?;
                    self.function.evaluate(&win, x, y, w, h)
                }
                Samples::Buffered(src) => {
                    window.fill(src, x, y)?;
                    self.function.evaluate(window, x, y, w, h)
                }
            };
            let sx = self.index[(x, y)];
            out[sx] = e + self.bias.map_or(0.0, |b| b[(sx, y)]);
        }
        Ok(())
    }
}

fn check_overlay(
    grid: &Grid<f32>,
    width: usize,
    height: usize,
    what: &'static str,
) -> CarveResult<()> {
    if grid.width() != width || grid.height() != height {
        return Err(CarveError::InvalidConfig(what));
    }
    if grid.as_slice().iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(CarveError::InvalidConfig(what));
    }
    Ok(())
}

impl SeamCarver {
    /// Prepares to carve `source` along `orientation`.
    pub fn new(
        source: PixelBuffer,
        orientation: Orientation,
        config: CarverConfig,
    ) -> CarveResult<Self> {
        config.energy.kind.validate(source.layout())?;
        let image = MultiSizeImage::new(source, orientation)?;
        let frame = image.frame_source();
        let (w, h) = (frame.width(), frame.height());
        let rigidity = RigidityMap::new(config.rigidity, config.max_step, h)?;
        let read_cache = if config.caching {
            Some(ReadCache::build(frame, config.energy.kind)?)
        } else {
            None
        };
        let mut index = Grid::new(w, h, 0usize)?;
        for y in 0..h {
            for (x, cell) in index.row_mut(y).iter_mut().enumerate() {
                *cell = x;
            }
        }
        let energy = Grid::new(w, h, 0.0f32)?;
        Ok(Self {
            config,
            image,
            rigidity,
            preserve: None,
            suppress: None,
            bias: None,
            mask: None,
            read_cache,
            index,
            width: w,
            energy,
            energy_valid: false,
            stale_seam: None,
            pending: None,
            state: CarverState::Idle,
            side: SideBias::Left,
            cancel: CancelToken::new(),
            progress: None,
        })
    }

    /// Carver parameters.
    pub fn config(&self) -> &CarverConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> CarverState {
        self.state
    }

    /// Carving axis.
    pub fn orientation(&self) -> Orientation {
        self.image.orientation()
    }

    /// Current extent along the carving axis.
    pub fn extent(&self) -> usize {
        self.width
    }

    /// Number of committed seams.
    pub fn depth(&self) -> usize {
        self.image.depth()
    }

    /// Side that currently wins ties.
    pub fn side(&self) -> SideBias {
        self.side
    }

    /// Rigidity table in use.
    pub fn rigidity(&self) -> &RigidityMap {
        &self.rigidity
    }

    /// The multi-size image the carver records into.
    pub fn image(&self) -> &MultiSizeImage {
        &self.image
    }

    /// Consumes the carver, keeping its recorded seams.
    pub fn into_image(self) -> MultiSizeImage {
        self.image
    }

    /// Token polled once per cost-table scanline.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Replaces the cancel token.
    pub fn set_cancel_token(&mut self, token: CancelToken) {
        self.cancel = token;
    }

    /// Installs or removes the progress observer.
    pub fn set_progress(&mut self, progress: Option<ProgressFn>) {
        self.progress = progress;
    }

    /// Adds a non-negative per-pixel bias to the energy.
    ///
    /// The grid has the dimensions of the source image. Only allowed before
    /// the first seam.
    pub fn set_energy_bias(&mut self, bias: Option<Grid<f32>>) -> CarveResult<()> {
        self.require_pristine()?;
        self.preserve = self.overlay_to_frame(
            bias,
            "energy bias must match the image and be non-negative",
        )?;
        self.rebuild_bias()
    }

    /// Marks pixels to be removed first: a pixel's energy drops by its weight.
    ///
    /// Weights are non-negative and in source coordinates. Only allowed
    /// before the first seam.
    pub fn set_suppression_mask(&mut self, weights: Option<Grid<f32>>) -> CarveResult<()> {
        self.require_pristine()?;
        self.suppress = self.overlay_to_frame(
            weights,
            "suppression mask must match the image and be non-negative",
        )?;
        self.rebuild_bias()
    }

    fn overlay_to_frame(
        &self,
        grid: Option<Grid<f32>>,
        what: &'static str,
    ) -> CarveResult<Option<Grid<f32>>> {
        let Some(grid) = grid else {
            return Ok(None);
        };
        let grid = self.to_frame(grid)?;
        check_overlay(&grid, self.width, self.index.height(), what)?;
        Ok(Some(grid))
    }

    /// Folds preservation and suppression into the bias added to the energy.
    ///
    /// A seam takes exactly one pixel per scanline, so lowering a pixel by `s`
    /// picks the same seams as raising the rest of its scanline by `s`. Row
    /// `y` therefore gets `max_y - s` added, which keeps energies non-negative.
    fn rebuild_bias(&mut self) -> CarveResult<()> {
        self.bias = match (&self.preserve, &self.suppress) {
            (None, None) => None,
            (Some(preserve), None) => Some(preserve.clone()),
            (preserve, Some(suppress)) => {
                let mut out = Grid::new(suppress.width(), suppress.height(), 0.0f32)?;
                for y in 0..suppress.height() {
                    let row = suppress.row(y);
                    let top = row.iter().copied().fold(0.0f32, f32::max);
                    for (x, cell) in out.row_mut(y).iter_mut().enumerate() {
                        let kept = preserve.as_ref().map_or(0.0, |p| p[(x, y)]);
                        *cell = kept + top - row[x];
                    }
                }
                Some(out)
            }
        };
        self.energy_valid = false;
        self.state = CarverState::Idle;
        Ok(())
    }

    /// Scales the rigidity bias per pixel. Only allowed before the first seam.
    pub fn set_rigidity_mask(&mut self, mask: Option<RigidityMask>) -> CarveResult<()> {
        self.require_pristine()?;
        self.mask = self.overlay_to_frame(
            mask.map(RigidityMask::into_factors),
            "rigidity mask must match the image",
        )?;
        self.state = CarverState::Idle;
        Ok(())
    }

    /// Brings the energy map up to date with the visible image.
    ///
    /// The first call computes every pixel; after a seam only the band whose
    /// reader windows overlapped it is recomputed.
    pub fn compute_energy(&mut self) -> CarveResult<()> {
        self.require(
            matches!(self.state, CarverState::Idle | CarverState::SeamApplied),
            "idle or seam applied",
        )?;
        if !self.energy_valid {
            self.full_energy()?;
            self.energy_valid = true;
            self.stale_seam = None;
        } else if let Some(seam) = self.stale_seam.take() {
            self.band_energy(&seam)?;
        }
        self.state = CarverState::EnergyComputed;
        Ok(())
    }

    /// Energy of the visible image.
    pub fn current_energy(&self) -> CarveResult<EnergyMap> {
        self.require(
            matches!(self.state, CarverState::EnergyComputed | CarverState::PathFound),
            "energy computed",
        )?;
        self.gather(&self.energy)
    }

    /// Finds the minimal seam through the visible image.
    ///
    /// A cancelled search leaves the carver in `EnergyComputed`.
    pub fn find_minimal_path(&mut self) -> CarveResult<SeamPath> {
        self.require(
            matches!(self.state, CarverState::EnergyComputed | CarverState::PathFound),
            "energy computed",
        )?;
        let energy = self.gather(&self.energy)?;
        let mask = self.mask.as_ref().map(|m| self.gather(m)).transpose()?;
        let table = CostTable::build(
            &energy,
            &self.rigidity,
            mask.as_ref(),
            self.side,
            self.config.parallel,
            &self.cancel,
        )?;
        let path = SeamPath::new(self.orientation(), table.backtrack().positions().to_vec());
        self.pending = Some(path.clone());
        self.state = CarverState::PathFound;
        Ok(path)
    }

    /// Removes `path` from the visible image and returns its generation.
    ///
    /// The path must run along the carver's axis, have one position per
    /// scanline inside the current extent, and step at most `max_step`.
    pub fn apply_seam(&mut self, path: &SeamPath) -> CarveResult<u32> {
        self.require(
            matches!(self.state, CarverState::EnergyComputed | CarverState::PathFound),
            "energy computed or path found",
        )?;
        if self.width < 2 {
            let (width, height) = self.caller_dims(self.width - 1);
            return Err(CarveError::InvalidTargetSize { width, height });
        }
        if path.orientation() != self.orientation() {
            return Err(CarveError::InvalidSeam {
                reason: "orientation differs from the carver's",
            });
        }
        path.check_fits(self.index.height(), self.width)?;
        if path.max_step() > self.config.max_step {
            return Err(CarveError::InvalidSeam {
                reason: "step between scanlines exceeds max step",
            });
        }

        let generation = self.depth() as u32;
        let index = &self.index;
        self.image.record_seam(
            path.positions()
                .iter()
                .enumerate()
                .map(|(y, &x)| (index[(x, y)], y)),
            generation,
        )?;
        for (y, &x) in path.positions().iter().enumerate() {
            self.index.row_mut(y).copy_within(x + 1..self.width, x);
        }
        self.width -= 1;
        self.stale_seam = Some(path.positions().to_vec());
        self.pending = None;
        self.state = CarverState::SeamApplied;
        Ok(generation)
    }

    /// Runs one full cycle: energy, search, removal.
    pub fn carve_seam(&mut self) -> CarveResult<u32> {
        if matches!(self.state, CarverState::Idle | CarverState::SeamApplied) {
            self.compute_energy()?;
        }
        let path = match (&self.pending, self.state) {
            (Some(path), CarverState::PathFound) => path.clone(),
            _ => self.find_minimal_path()?,
        };
        self.apply_seam(&path)
    }

    /// Carves `count` more seams.
    pub fn carve(&mut self, count: usize) -> CarveResult<()> {
        self.ensure_depth(self.depth() + count)
    }

    /// Carves until `depth` seams are committed.
    ///
    /// Every committed seam is reported to the progress observer. On
    /// cancellation the seams committed so far stay recorded.
    pub fn ensure_depth(&mut self, depth: usize) -> CarveResult<()> {
        let start = self.depth();
        if depth <= start {
            return Ok(());
        }
        let extent = self.image.extent();
        if depth >= extent {
            let (width, height) = self.caller_dims(extent.saturating_sub(depth));
            return Err(CarveError::InvalidTargetSize { width, height });
        }
        let _span = trace_span!("carve", from = start, to = depth).entered();

        let runs = depth - start;
        let frequency = self.config.side_switch_frequency as usize;
        let interval = if frequency > 0 { (runs - 1) / frequency + 1 } else { 0 };
        self.side = SideBias::Left;
        for i in 0..runs {
            if interval > 0 && (i + interval / 2) % interval == 0 {
                self.side = self.side.flipped();
            }
            if let Err(err) = self.carve_seam() {
                trace_event!(
                    "carve_stopped",
                    depth = self.depth(),
                    cancelled = err == CarveError::Cancelled
                );
                return Err(err);
            }
            if let Some(progress) = &self.progress {
                progress(Progress {
                    orientation: self.orientation(),
                    depth: self.depth(),
                    target: depth,
                });
            }
        }
        trace_event!("carved", depth = self.depth());
        Ok(())
    }

    /// Drops the pending path and returns to `Idle`.
    pub fn finish(&mut self) {
        self.pending = None;
        self.state = CarverState::Idle;
    }

    /// The image at `target` extent along the carving axis.
    pub fn buffer_for_size(&self, target: usize) -> CarveResult<Arc<PixelBuffer>> {
        self.image.buffer_for_size(target)
    }

    /// The visible image.
    pub fn current_buffer(&self) -> CarveResult<Arc<PixelBuffer>> {
        self.image.buffer_for_size(self.width)
    }

    fn full_energy(&mut self) -> CarveResult<()> {
        let pass = EnergyPass::new(
            self.config.energy,
            self.image.frame_source(),
            self.read_cache.as_ref(),
            self.bias.as_ref(),
            &self.index,
            self.width,
        )?;
        let stride = self.energy.width();
        let rows = self.energy.as_mut_slice();

        #[cfg(feature = "rayon")]
        if self.config.parallel {
            use rayon::prelude::*;
            return rows
                .par_chunks_mut(stride)
                .enumerate()
                .try_for_each_init(
                    || pass.window(),
                    |window, (y, row)| pass.fill_row(y, 0..pass.width, window, row),
                );
        }

        let mut window = pass.window();
        for (y, row) in rows.chunks_mut(stride).enumerate() {
            pass.fill_row(y, 0..pass.width, &mut window, row)?;
        }
        Ok(())
    }

    /// Recomputes the pixels whose window touched the removed `seam`.
    fn band_energy(&mut self, seam: &[usize]) -> CarveResult<()> {
        let pass = EnergyPass::new(
            self.config.energy,
            self.image.frame_source(),
            self.read_cache.as_ref(),
            self.bias.as_ref(),
            &self.index,
            self.width,
        )?;
        let r = self.config.energy.radius();
        let h = seam.len();
        let mut window = pass.window();
        for y in 0..h {
            let rows = y.saturating_sub(r)..(y + r + 1).min(h);
            let lo = rows.clone().map(|s| seam[s]).min().unwrap_or(0);
            let hi = rows.map(|s| seam[s]).max().unwrap_or(0);
            let start = lo.saturating_sub(r);
            let end = (hi + r).min(self.width);
            if start < end {
                pass.fill_row(y, start..end, &mut window, self.energy.row_mut(y))?;
            }
        }
        Ok(())
    }

    /// Copies a per-source-pixel grid into visible coordinates.
    fn gather(&self, grid: &Grid<f32>) -> CarveResult<EnergyMap> {
        let h = self.index.height();
        let mut out = Grid::new(self.width, h, 0.0f32)?;
        for y in 0..h {
            let src = grid.row(y);
            let visible = &self.index.row(y)[..self.width];
            for (cell, &sx) in out.row_mut(y).iter_mut().zip(visible) {
                *cell = src[sx];
            }
        }
        Ok(out)
    }

    fn to_frame(&self, grid: Grid<f32>) -> CarveResult<Grid<f32>> {
        match self.orientation() {
            Orientation::Vertical => Ok(grid),
            Orientation::Horizontal => grid.transposed(),
        }
    }

    fn caller_dims(&self, extent: usize) -> (usize, usize) {
        let other = self.index.height();
        match self.orientation() {
            Orientation::Vertical => (extent, other),
            Orientation::Horizontal => (other, extent),
        }
    }

    fn require(&self, ok: bool, expected: &'static str) -> CarveResult<()> {
        if ok {
            Ok(())
        } else {
            Err(CarveError::InvalidState {
                state: self.state.name(),
                expected,
            })
        }
    }

    fn require_pristine(&self) -> CarveResult<()> {
        if self.depth() == 0 {
            Ok(())
        } else {
            Err(CarveError::InvalidState {
                state: "carved",
                expected: "no committed seams",
            })
        }
    }
}
