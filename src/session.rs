//! Interactive resize sessions.
//!
//! A [`Session`] owns a source image and the carvers built from it. Asking
//! for a size carves only the seams not already recorded; sizes reached
//! before come straight from the multi-size cache. Any change to the source
//! or to the energy and rigidity settings drops every carver.

use crate::carver::{CarverConfig, Orientation, ProgressFn, SeamCarver};
use crate::energy::{EnergyFunction, EnergyKind, GradientKind};
use crate::grid::Grid;
use crate::image::PixelBuffer;
use crate::multisize::MultiSizeImage;
use crate::rigidity::RigidityMask;
use crate::trace::{trace_event, trace_span};
use crate::util::{CancelToken, CarveError, CarveResult};
use std::sync::Arc;

/// How a request changing both dimensions is split into seam passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResizeOrder {
    /// Columns first, then rows.
    #[default]
    WidthFirst,
    /// Rows first, then columns.
    HeightFirst,
    /// Alternate single column and row removals in proportion to what is
    /// left on each axis; enlargement follows, width first. Nothing is cached.
    Interleaved,
}

/// Session settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionConfig {
    /// Reader variant.
    pub energy_kind: EnergyKind,
    /// Gradient formula.
    pub gradient: GradientKind,
    /// Rigidity coefficient, `>= 0`.
    pub rigidity: f32,
    /// Largest lateral seam step, `>= 1`.
    pub max_step: usize,
    /// Largest enlargement of one round, as a ratio of the round's start
    /// size; bigger enlargements take several rounds. Must exceed 1.
    pub max_enlargement_ratio: f32,
    /// Precompute reader values once per carver.
    pub caching_enabled: bool,
    /// Pass order when both dimensions change.
    pub resize_order: ResizeOrder,
    /// Tie-break side flips per carving run; 0 disables switching.
    pub side_switch_frequency: u32,
    /// Use rayon where available.
    pub parallel: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            energy_kind: EnergyKind::Brightness,
            gradient: GradientKind::XAbs,
            rigidity: 0.0,
            max_step: 1,
            max_enlargement_ratio: 2.0,
            caching_enabled: true,
            resize_order: ResizeOrder::WidthFirst,
            side_switch_frequency: 0,
            parallel: false,
        }
    }
}

impl SessionConfig {
    /// Checks every value range.
    pub fn validate(&self) -> CarveResult<()> {
        if !self.rigidity.is_finite() || self.rigidity < 0.0 {
            return Err(CarveError::InvalidConfig(
                "rigidity coefficient must be finite and non-negative",
            ));
        }
        if self.max_step == 0 {
            return Err(CarveError::InvalidConfig("max step must be at least 1"));
        }
        if !self.max_enlargement_ratio.is_finite() || self.max_enlargement_ratio <= 1.0 {
            return Err(CarveError::InvalidConfig("max enlargement ratio must exceed 1"));
        }
        if self.energy_kind == EnergyKind::Custom(0) {
            return Err(CarveError::InvalidConfig("custom reader needs at least one channel"));
        }
        Ok(())
    }

    fn carver_config(&self) -> CarverConfig {
        CarverConfig {
            energy: EnergyFunction::new(self.energy_kind, self.gradient),
            rigidity: self.rigidity,
            max_step: self.max_step,
            side_switch_frequency: self.side_switch_frequency,
            caching: self.caching_enabled,
            parallel: self.parallel,
        }
    }
}

/// Outcome of [`Session::resize_to`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resized {
    /// The requested size.
    Complete(PixelBuffer),
    /// Cancelled; the image as of the last committed seam.
    Cancelled(PixelBuffer),
}

impl Resized {
    /// True when the requested size was reached.
    pub fn is_complete(&self) -> bool {
        matches!(self, Resized::Complete(_))
    }

    /// The carried buffer.
    pub fn buffer(&self) -> &PixelBuffer {
        match self {
            Resized::Complete(b) | Resized::Cancelled(b) => b,
        }
    }

    /// Consumes the outcome, returning its buffer.
    pub fn into_buffer(self) -> PixelBuffer {
        match self {
            Resized::Complete(b) | Resized::Cancelled(b) => b,
        }
    }
}

/// Per-pixel inputs that have to follow the image through every pass.
#[derive(Clone, Debug, Default)]
struct Overlays {
    bias: Option<Grid<f32>>,
    suppression: Option<Grid<f32>>,
    mask: Option<RigidityMask>,
}

impl Overlays {
    fn resampled(&self, image: &MultiSizeImage, target: usize) -> CarveResult<Self> {
        let bias = self
            .bias
            .as_ref()
            .map(|b| image.resample_grid(b, target))
            .transpose()?;
        let suppression = self
            .suppression
            .as_ref()
            .map(|s| image.resample_grid(s, target))
            .transpose()?;
        let mask = self
            .mask
            .as_ref()
            .map(|m| image.resample_grid(m.factors(), target).and_then(RigidityMask::new))
            .transpose()?;
        Ok(Self {
            bias,
            suppression,
            mask,
        })
    }
}

/// Everything needed to build a carver for one resize request.
struct Factory {
    config: CarverConfig,
    ratio: f32,
    cancel: CancelToken,
    progress: Option<ProgressFn>,
}

impl Factory {
    fn carver(
        &self,
        source: PixelBuffer,
        orientation: Orientation,
        overlays: &Overlays,
    ) -> CarveResult<SeamCarver> {
        let mut carver = SeamCarver::new(source, orientation, self.config)?;
        carver.set_cancel_token(self.cancel.clone());
        carver.set_progress(self.progress.clone());
        carver.set_energy_bias(overlays.bias.clone())?;
        carver.set_suppression_mask(overlays.suppression.clone())?;
        carver.set_rigidity_mask(overlays.mask.clone())?;
        Ok(carver)
    }

    /// Seams inserted by one enlargement round starting at `extent`.
    fn round_size(&self, extent: usize, remaining: usize) -> usize {
        let step = (((self.ratio - 1.0) * extent as f32) as usize).saturating_sub(1).max(1);
        remaining.min(step).min(extent - 1)
    }
}

/// Why a pass stopped early.
enum Interrupt {
    Cancelled(PixelBuffer),
    Failed(CarveError),
}

impl From<CarveError> for Interrupt {
    fn from(err: CarveError) -> Self {
        Interrupt::Failed(err)
    }
}

fn owned(buffer: Arc<PixelBuffer>) -> PixelBuffer {
    Arc::unwrap_or_clone(buffer)
}

/// Maps a carving error to an interrupt, fetching the committed image on cancellation.
fn interrupted(err: CarveError, committed: CarveResult<Arc<PixelBuffer>>) -> Interrupt {
    match (err, committed) {
        (CarveError::Cancelled, Ok(buffer)) => Interrupt::Cancelled(owned(buffer)),
        (CarveError::Cancelled, Err(err)) | (err, _) => Interrupt::Failed(err),
    }
}

fn extent_of(buffer: &PixelBuffer, orientation: Orientation) -> usize {
    match orientation {
        Orientation::Vertical => buffer.width(),
        Orientation::Horizontal => buffer.height(),
    }
}

/// Brings `carver`'s image to `target` extent, enlarging in rounds if needed.
fn carve_axis(
    carver: &mut SeamCarver,
    target: usize,
    factory: &Factory,
    overlays: &Overlays,
) -> Result<(PixelBuffer, Overlays), Interrupt> {
    let extent = carver.image().extent();
    if target <= extent {
        if let Err(err) = carver.ensure_depth(extent - target) {
            return Err(interrupted(err, carver.current_buffer()));
        }
        let out = carver.buffer_for_size(target)?;
        return Ok((owned(out), overlays.resampled(carver.image(), target)?));
    }

    let orientation = carver.orientation();
    let mut remaining = target - extent;
    let delta = factory.round_size(extent, remaining);
    if delta == 0 {
        let buffer = carver.buffer_for_size(extent)?;
        let (width, height) = match orientation {
            Orientation::Vertical => (target, buffer.height()),
            Orientation::Horizontal => (buffer.width(), target),
        };
        return Err(CarveError::InvalidTargetSize { width, height }.into());
    }
    if let Err(err) = carver.ensure_depth(delta) {
        return Err(interrupted(err, carver.buffer_for_size(extent)));
    }
    let mut buffer = owned(carver.buffer_for_size(extent + delta)?);
    let mut overlays = overlays.resampled(carver.image(), extent + delta)?;
    remaining -= delta;

    while remaining > 0 {
        let round_extent = extent_of(&buffer, orientation);
        let delta = factory.round_size(round_extent, remaining);
        let mut round = factory.carver(buffer, orientation, &overlays)?;
        if let Err(err) = round.ensure_depth(delta) {
            return Err(interrupted(err, round.buffer_for_size(round_extent)));
        }
        buffer = owned(round.buffer_for_size(round_extent + delta)?);
        overlays = overlays.resampled(round.image(), round_extent + delta)?;
        remaining -= delta;
        trace_event!("enlargement_round", extent = round_extent + delta, remaining = remaining);
    }
    Ok((buffer, overlays))
}

/// Content-aware resize session over one source image.
pub struct Session {
    source: PixelBuffer,
    config: SessionConfig,
    overlays: Overlays,
    primary: Option<SeamCarver>,
    secondary: Option<(usize, SeamCarver)>,
    cancel: CancelToken,
    progress: Option<ProgressFn>,
}

impl Session {
    /// Starts a session over `source`.
    pub fn new(source: PixelBuffer, config: SessionConfig) -> CarveResult<Self> {
        config.validate()?;
        config.energy_kind.validate(source.layout())?;
        Ok(Self {
            source,
            config,
            overlays: Overlays::default(),
            primary: None,
            secondary: None,
            cancel: CancelToken::new(),
            progress: None,
        })
    }

    /// Current settings.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Source image.
    pub fn source(&self) -> &PixelBuffer {
        &self.source
    }

    /// Seams recorded by the carver over the source image.
    pub fn carved_depth(&self) -> usize {
        self.primary.as_ref().map_or(0, SeamCarver::depth)
    }

    /// Token that stops a running [`Session::resize_to`] from any thread.
    ///
    /// The token is reset at the start of every resize.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Installs or removes an observer told about every committed seam.
    pub fn set_progress(&mut self, progress: Option<ProgressFn>) {
        if let Some(carver) = &mut self.primary {
            carver.set_progress(progress.clone());
        }
        if let Some((_, carver)) = &mut self.secondary {
            carver.set_progress(progress.clone());
        }
        self.progress = progress;
    }

    /// Replaces all settings at once.
    pub fn set_config(&mut self, config: SessionConfig) -> CarveResult<()> {
        config.validate()?;
        config.energy_kind.validate(self.source.layout())?;
        self.config = config;
        self.invalidate();
        Ok(())
    }

    /// Changes the rigidity coefficient.
    pub fn set_rigidity(&mut self, coefficient: f32) -> CarveResult<()> {
        self.set_config(SessionConfig {
            rigidity: coefficient,
            ..self.config
        })
    }

    /// Changes the reader variant.
    pub fn set_energy_kind(&mut self, kind: EnergyKind) -> CarveResult<()> {
        self.set_config(SessionConfig {
            energy_kind: kind,
            ..self.config
        })
    }

    /// Changes the gradient formula.
    pub fn set_gradient(&mut self, gradient: GradientKind) -> CarveResult<()> {
        self.set_config(SessionConfig {
            gradient,
            ..self.config
        })
    }

    /// Sets a non-negative per-pixel energy bias; higher values protect pixels.
    pub fn set_energy_bias(&mut self, bias: Option<Grid<f32>>) -> CarveResult<()> {
        if let Some(grid) = &bias {
            self.check_weights(grid, "energy bias must be finite and non-negative")?;
        }
        self.overlays.bias = bias;
        self.invalidate();
        Ok(())
    }

    /// Sets non-negative per-pixel suppression weights; higher values make
    /// pixels go first.
    pub fn set_suppression_mask(&mut self, weights: Option<Grid<f32>>) -> CarveResult<()> {
        if let Some(grid) = &weights {
            self.check_weights(grid, "suppression weights must be finite and non-negative")?;
        }
        self.overlays.suppression = weights;
        self.invalidate();
        Ok(())
    }

    /// Sets a per-pixel rigidity factor.
    pub fn set_rigidity_mask(&mut self, mask: Option<RigidityMask>) -> CarveResult<()> {
        if let Some(mask) = &mask {
            self.check_overlay(mask.factors())?;
        }
        self.overlays.mask = mask;
        self.invalidate();
        Ok(())
    }

    /// Swaps in a new source image, dropping every carver and overlay.
    pub fn replace_source(&mut self, source: PixelBuffer) -> CarveResult<PixelBuffer> {
        self.config.energy_kind.validate(source.layout())?;
        self.overlays = Overlays::default();
        self.invalidate();
        Ok(std::mem::replace(&mut self.source, source))
    }

    /// Ends the session, returning the source image.
    pub fn into_source(self) -> PixelBuffer {
        self.source
    }

    /// Drops every carver and cached buffer.
    pub fn invalidate(&mut self) {
        self.primary = None;
        self.secondary = None;
    }

    /// Resizes the source to `width x height`.
    ///
    /// Shrinking carves seams; enlarging inserts the seams found on a
    /// shrinking proxy. If the cancel token is set meanwhile, the result is
    /// [`Resized::Cancelled`] with the image as of the last committed seam;
    /// a later call resumes from there.
    pub fn resize_to(&mut self, width: usize, height: usize) -> CarveResult<Resized> {
        if width == 0 || height == 0 {
            return Err(CarveError::InvalidTargetSize { width, height });
        }
        self.cancel.reset();
        let _span = trace_span!(
            "resize",
            from_width = self.source.width(),
            from_height = self.source.height(),
            width = width,
            height = height
        )
        .entered();

        let outcome = match self.config.resize_order {
            ResizeOrder::WidthFirst => {
                self.two_pass(Orientation::Vertical, width, Orientation::Horizontal, height)
            }
            ResizeOrder::HeightFirst => {
                self.two_pass(Orientation::Horizontal, height, Orientation::Vertical, width)
            }
            ResizeOrder::Interleaved => self.interleaved(width, height),
        };
        match outcome {
            Ok(buffer) => Ok(Resized::Complete(buffer)),
            Err(Interrupt::Cancelled(buffer)) => {
                trace_event!("resize_cancelled", width = buffer.width(), height = buffer.height());
                Ok(Resized::Cancelled(buffer))
            }
            Err(Interrupt::Failed(err)) => Err(err),
        }
    }

    fn factory(&self) -> Factory {
        Factory {
            config: self.config.carver_config(),
            ratio: self.config.max_enlargement_ratio,
            cancel: self.cancel.clone(),
            progress: self.progress.clone(),
        }
    }

    fn two_pass(
        &mut self,
        first: Orientation,
        first_target: usize,
        second: Orientation,
        second_target: usize,
    ) -> Result<PixelBuffer, Interrupt> {
        let factory = self.factory();

        let (mid, overlays) = if first_target == extent_of(&self.source, first) {
            (self.source.clone(), self.overlays.clone())
        } else {
            let primary = match self.primary.take() {
                Some(carver) if carver.orientation() == first => self.primary.insert(carver),
                _ => {
                    self.secondary = None;
                    self.primary
                        .insert(factory.carver(self.source.clone(), first, &self.overlays)?)
                }
            };
            carve_axis(primary, first_target, &factory, &self.overlays)?
        };

        if second_target == extent_of(&mid, second) {
            return Ok(mid);
        }
        let secondary = match self.secondary.take() {
            Some((key, carver)) if key == first_target && carver.orientation() == second => {
                &mut self.secondary.insert((key, carver)).1
            }
            _ => {
                let carver = factory.carver(mid, second, &overlays)?;
                &mut self.secondary.insert((first_target, carver)).1
            }
        };
        let (out, _) = carve_axis(secondary, second_target, &factory, &overlays)?;
        Ok(out)
    }

    fn interleaved(&mut self, width: usize, height: usize) -> Result<PixelBuffer, Interrupt> {
        let factory = self.factory();
        let mut current = self.source.clone();
        let mut overlays = self.overlays.clone();
        let dw = current.width().saturating_sub(width);
        let dh = current.height().saturating_sub(height);
        let (mut done_w, mut done_h) = (0, 0);

        while done_w < dw || done_h < dh {
            let vertical = done_h >= dh || (done_w < dw && done_w * dh <= done_h * dw);
            let orientation = if vertical {
                Orientation::Vertical
            } else {
                Orientation::Horizontal
            };
            let mut carver = factory.carver(current, orientation, &overlays)?;
            if let Err(err) = carver.carve(1) {
                return Err(interrupted(err, carver.buffer_for_size(carver.image().extent())));
            }
            let extent = carver.extent();
            overlays = overlays.resampled(carver.image(), extent)?;
            current = owned(carver.buffer_for_size(extent)?);
            if vertical {
                done_w += 1;
            } else {
                done_h += 1;
            }
        }

        if width > current.width() {
            let mut carver = factory.carver(current, Orientation::Vertical, &overlays)?;
            (current, overlays) = carve_axis(&mut carver, width, &factory, &overlays)?;
        }
        if height > current.height() {
            let mut carver = factory.carver(current, Orientation::Horizontal, &overlays)?;
            (current, _) = carve_axis(&mut carver, height, &factory, &overlays)?;
        }
        Ok(current)
    }

    fn check_overlay(&self, grid: &Grid<f32>) -> CarveResult<()> {
        if grid.width() != self.source.width() || grid.height() != self.source.height() {
            return Err(CarveError::InvalidConfig("overlay size differs from the source"));
        }
        Ok(())
    }

    fn check_weights(&self, grid: &Grid<f32>, what: &'static str) -> CarveResult<()> {
        self.check_overlay(grid)?;
        if grid.as_slice().iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(CarveError::InvalidConfig(what));
        }
        Ok(())
    }
}
