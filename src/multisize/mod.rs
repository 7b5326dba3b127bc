//! Multi-size images: a source buffer plus the order its seams were removed.
//!
//! Once seams have been recorded, any extent between `W - depth` and
//! `W + depth` along the carving axis can be produced by filtering (or
//! duplicating) pixels by generation, without touching the carver again.
//! Produced buffers are cached and shared.

pub mod visibility;

pub use visibility::{VisibilityMap, NEVER};

use crate::carver::path::Orientation;
use crate::grid::Grid;
use crate::image::PixelBuffer;
use crate::trace::{trace_event, trace_span};
use crate::util::alloc::try_with_capacity;
use crate::util::{CarveError, CarveResult};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Source buffer, visibility map and a cache of materialised sizes.
///
/// Internally the source is stored so that seams always run vertically; for
/// [`Orientation::Horizontal`] images it is kept transposed and every buffer
/// handed out is transposed back. The visibility map uses that internal frame.
#[derive(Debug)]
pub struct MultiSizeImage {
    source: PixelBuffer,
    orientation: Orientation,
    visibility: VisibilityMap,
    cache: RwLock<HashMap<usize, Arc<PixelBuffer>>>,
}

impl MultiSizeImage {
    /// Wraps `source` for carving along `orientation`.
    pub fn new(source: PixelBuffer, orientation: Orientation) -> CarveResult<Self> {
        let source = match orientation {
            Orientation::Vertical => source,
            Orientation::Horizontal => source.transposed()?,
        };
        let visibility = VisibilityMap::new(source.width(), source.height())?;
        Ok(Self::from_frame(source, orientation, visibility))
    }

    fn from_frame(
        source: PixelBuffer,
        orientation: Orientation,
        visibility: VisibilityMap,
    ) -> Self {
        Self {
            source,
            orientation,
            visibility,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Carving axis.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Original extent along the carving axis.
    pub fn extent(&self) -> usize {
        self.source.width()
    }

    /// Number of recorded seams.
    pub fn depth(&self) -> usize {
        self.visibility.depth()
    }

    /// Smallest extent that can be produced.
    pub fn min_extent(&self) -> usize {
        self.extent() - self.depth()
    }

    /// Largest extent that can be produced.
    pub fn max_extent(&self) -> usize {
        self.extent() + self.depth()
    }

    /// Recorded generations, in the carving frame.
    pub fn visibility(&self) -> &VisibilityMap {
        &self.visibility
    }

    /// Source in the carving frame.
    pub(crate) fn frame_source(&self) -> &PixelBuffer {
        &self.source
    }

    /// Records the pixels of one seam, given in carving-frame coordinates.
    pub(crate) fn record_seam<I>(&mut self, pixels: I, generation: u32) -> CarveResult<()>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        for (x, y) in pixels {
            self.visibility.record_removal(x, y, generation)?;
        }
        Ok(())
    }

    /// Buffer at `target` extent along the carving axis.
    ///
    /// Shrunk buffers keep exactly the pixels whose generation is at least
    /// `W - target`. Enlarged buffers duplicate the pixels of the first
    /// `target - W` seams, each copy being the average of the pixel and its
    /// left neighbour. Results are cached; a cached buffer stays valid as
    /// more seams are recorded.
    pub fn buffer_for_size(&self, target: usize) -> CarveResult<Arc<PixelBuffer>> {
        self.check_target(target)?;
        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&target)
        {
            return Ok(Arc::clone(hit));
        }

        let _span = trace_span!("buffer_for_size", target = target, depth = self.depth()).entered();
        let frame = self.materialize(target)?;
        let buffer = Arc::new(self.to_caller_frame(frame)?);

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(target).or_insert(buffer)))
    }

    /// Extents currently held in the cache, ascending.
    pub fn cached_extents(&self) -> Vec<usize> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        let mut extents: Vec<usize> = cache.keys().copied().collect();
        extents.sort_unstable();
        extents
    }

    /// Materialises the image enlarged by `seams` and returns it as a new
    /// multi-size image.
    ///
    /// The result carries the generations of both the inserted and the
    /// original pixels, so asking it for the original extent gives back the
    /// original buffer and asking for any smaller extent gives the same
    /// buffer as `self` would.
    pub fn inflate(&self, seams: usize) -> CarveResult<Self> {
        if seams > self.depth() {
            let (width, height) = self.caller_dims(self.extent() + seams);
            return Err(CarveError::InvalidTargetSize { width, height });
        }
        let _span = trace_span!("inflate", seams = seams).entered();
        let e = seams as u32;
        let source = self.materialize(self.extent() + seams)?;
        let (w, h) = (self.extent(), self.source.height());
        let mut generations = try_with_capacity((w + seams) * h, "visibility map")?;
        let old = self.visibility.generations();
        for y in 0..h {
            for &g in old.row(y) {
                if g < e {
                    generations.push(e - 1 - g);
                }
                generations.push(if g == NEVER { NEVER } else { g + e });
            }
        }
        let generations = Grid::from_vec(w + seams, h, generations)?;
        let depth = self.visibility.depth() as u32 + e;
        trace_event!("inflated", seams = seams, depth = depth);
        Ok(Self::from_frame(
            source,
            self.orientation,
            VisibilityMap::from_parts(generations, depth),
        ))
    }

    /// Drops every recorded seam and cached buffer.
    pub fn invalidate(&mut self) {
        self.visibility.clear();
        self.cache
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns the source in the caller's frame.
    pub fn into_source(self) -> CarveResult<PixelBuffer> {
        match self.orientation {
            Orientation::Vertical => Ok(self.source),
            Orientation::Horizontal => self.source.transposed(),
        }
    }

    /// Carries a per-pixel grid of the source (caller frame) through the
    /// recorded seams, exactly like [`MultiSizeImage::buffer_for_size`]
    /// carries pixels. Inserted cells average their two neighbours.
    pub fn resample_grid(&self, grid: &Grid<f32>, target: usize) -> CarveResult<Grid<f32>> {
        self.check_target(target)?;
        let frame = match self.orientation {
            Orientation::Vertical => grid.clone(),
            Orientation::Horizontal => grid.transposed()?,
        };
        if frame.width() != self.extent() || frame.height() != self.source.height() {
            return Err(CarveError::InvalidConfig("grid size differs from the image"));
        }
        let values = self.replay(target, frame.as_slice(), 1, |a, b| (a + b) / 2.0)?;
        let out = Grid::from_vec(target, self.source.height(), values)?;
        match self.orientation {
            Orientation::Vertical => Ok(out),
            Orientation::Horizontal => out.transposed(),
        }
    }

    fn check_target(&self, target: usize) -> CarveResult<()> {
        if target < self.min_extent().max(1) || target > self.max_extent() {
            let (width, height) = self.caller_dims(target);
            return Err(CarveError::InvalidTargetSize { width, height });
        }
        Ok(())
    }

    fn materialize(&self, target: usize) -> CarveResult<PixelBuffer> {
        let c = self.source.channels();
        let data = self.replay(target, self.source.data(), c, |a: u8, b: u8| {
            ((u16::from(a) + u16::from(b)) / 2) as u8
        })?;
        PixelBuffer::new(data, target, self.source.height(), self.source.layout())
    }

    /// Rebuilds carving-frame rows of `channels`-wide cells at `target` extent.
    fn replay<T: Copy>(
        &self,
        target: usize,
        values: &[T],
        channels: usize,
        average: impl Fn(T, T) -> T,
    ) -> CarveResult<Vec<T>> {
        let (w, h) = (self.extent(), self.source.height());
        let mut out = try_with_capacity(target * h * channels, "resized buffer")?;
        let generations = self.visibility.generations();
        let cell = move |x: usize, y: usize| {
            let start = (y * w + x) * channels;
            &values[start..start + channels]
        };
        if target <= w {
            let threshold = (w - target) as u32;
            for y in 0..h {
                for (x, &g) in generations.row(y).iter().enumerate() {
                    if g >= threshold {
                        out.extend_from_slice(cell(x, y));
                    }
                }
            }
        } else {
            let e = (target - w) as u32;
            for y in 0..h {
                for (x, &g) in generations.row(y).iter().enumerate() {
                    let here = cell(x, y);
                    if g < e {
                        let left = cell(x.saturating_sub(1), y);
                        out.extend(here.iter().zip(left).map(|(&a, &b)| average(a, b)));
                    }
                    out.extend_from_slice(here);
                }
            }
        }
        Ok(out)
    }

    fn to_caller_frame(&self, frame: PixelBuffer) -> CarveResult<PixelBuffer> {
        match self.orientation {
            Orientation::Vertical => Ok(frame),
            Orientation::Horizontal => frame.transposed(),
        }
    }

    fn caller_dims(&self, extent: usize) -> (usize, usize) {
        match self.orientation {
            Orientation::Vertical => (extent, self.source.height()),
            Orientation::Horizontal => (self.source.height(), extent),
        }
    }
}
