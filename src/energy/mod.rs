//! Energy model: reader variants, windows and gradient formulas.
//!
//! An [`EnergyFunction`] pairs an [`EnergyKind`] (how raw pixels become
//! reader values) with a [`GradientKind`] (how a window of reader values
//! becomes one non-negative energy). High energy marks pixels a seam should
//! avoid.

pub mod gradient;
pub mod sample;
pub mod window;

pub use gradient::GradientKind;
pub use sample::{PixelSamples, ReadCache, SampleSource};
pub use window::{DirectWindow, ReaderWindow, WindowRead};

use crate::grid::{EnergyMap, Grid};
use crate::image::{ChannelLayout, PixelBuffer};
use crate::util::{CarveError, CarveResult};

/// Reader variant used to turn pixels into energy samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EnergyKind {
    /// Mean of the colour channels, times alpha.
    #[default]
    Brightness,
    /// Rec. 709 luma, times alpha.
    Luma,
    /// Red, green, blue and alpha, colour premultiplied by alpha. CMYK
    /// pixels are converted to RGB first.
    Rgba,
    /// `n` raw channels.
    Custom(usize),
}

impl EnergyKind {
    /// Reader values produced per pixel.
    pub fn reader_channels(&self) -> usize {
        match self {
            EnergyKind::Brightness | EnergyKind::Luma => 1,
            EnergyKind::Rgba => 4,
            EnergyKind::Custom(n) => *n,
        }
    }

    /// Stable lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            EnergyKind::Brightness => "brightness",
            EnergyKind::Luma => "luma",
            EnergyKind::Rgba => "rgba",
            EnergyKind::Custom(_) => "custom",
        }
    }

    /// Checks that this reader can read pixels of `layout`.
    pub fn validate(&self, layout: ChannelLayout) -> CarveResult<()> {
        let got = layout.channels();
        match self {
            EnergyKind::Brightness | EnergyKind::Luma => Ok(()),
            EnergyKind::Custom(0) => Err(CarveError::InvalidConfig(
                "custom reader needs at least one channel",
            )),
            EnergyKind::Rgba | EnergyKind::Custom(_) => {
                let expected = self.reader_channels();
                if got == expected {
                    Ok(())
                } else {
                    Err(CarveError::ChannelMismatch {
                        reader: self.name(),
                        expected,
                        got,
                    })
                }
            }
        }
    }
}

/// Reader plus gradient formula.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EnergyFunction {
    /// Reader variant.
    pub kind: EnergyKind,
    /// Gradient formula.
    pub gradient: GradientKind,
}

impl EnergyFunction {
    /// Creates an energy function.
    pub fn new(kind: EnergyKind, gradient: GradientKind) -> Self {
        Self { kind, gradient }
    }

    /// Window radius needed by [`EnergyFunction::evaluate`].
    pub fn radius(&self) -> usize {
        self.gradient.radius()
    }

    /// Energy of the window centre `(x, y)` in a `width x height` image.
    ///
    /// The result is non-negative and depends only on the window contents and
    /// on where the centre sits relative to the image borders.
    pub fn evaluate<W: WindowRead + ?Sized>(
        &self,
        window: &W,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> f32 {
        self.gradient.evaluate(window, x, y, width, height)
    }

    /// Computes the energy of every pixel of `image`.
    pub fn energy_map(&self, image: &PixelBuffer) -> CarveResult<EnergyMap> {
        let samples = PixelSamples::new(image, self.kind)?;
        let (w, h) = (image.width(), image.height());
        let mut out = Grid::new(w, h, 0.0f32)?;
        let mut window = ReaderWindow::new(self.kind, self.radius());
        for y in 0..h {
            let row = out.row_mut(y);
            for (x, cell) in row.iter_mut().enumerate() {
                window.fill(&samples, x, y)?;
                *cell = self.evaluate(&window, x, y, w, h);
            }
        }
        Ok(out)
    }
}
