//! Sources of normalised reader samples.
//!
//! A reader turns the raw channels of one pixel into `EnergyKind::reader_channels`
//! values in `[0, 1]`. Windows pull those values from a [`SampleSource`]; the
//! carver provides sources that look at the image through its index map, so
//! the same code serves the original image and every carved state.

use crate::energy::EnergyKind;
use crate::grid::Grid;
use crate::image::{ChannelLayout, PixelBuffer};
use crate::util::alloc::try_filled;
use crate::util::CarveResult;

/// Something a reader window can be filled from.
pub trait SampleSource {
    /// Visible width.
    fn width(&self) -> usize;
    /// Visible height.
    fn height(&self) -> usize;
    /// Reader values per pixel.
    fn channels(&self) -> usize;
    /// Reader value `channel` of visible pixel `(x, y)`.
    ///
    /// Callers guarantee `x < width`, `y < height` and `channel < channels`.
    fn sample(&self, x: usize, y: usize, channel: usize) -> f32;
}

#[inline]
fn unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}

fn alpha(layout: ChannelLayout, pixel: &[u8]) -> f32 {
    layout.alpha_channel().map_or(1.0, |a| unit(pixel[a]))
}

fn brightness(layout: ChannelLayout, pixel: &[u8]) -> f32 {
    let colors = layout.color_channels();
    let n = colors.len() as f32;
    let mut mean = pixel[colors].iter().map(|&v| unit(v)).sum::<f32>() / n;
    if layout.is_subtractive() {
        mean = 1.0 - mean;
    }
    if let Some(k) = layout.black_channel() {
        mean *= 1.0 - unit(pixel[k]);
    }
    mean * alpha(layout, pixel)
}

/// Red, green and blue of a pixel, converting CMY(K); `None` without colour.
fn rgb(layout: ChannelLayout, pixel: &[u8]) -> Option<(f32, f32, f32)> {
    if layout.is_rgb() {
        Some((unit(pixel[0]), unit(pixel[1]), unit(pixel[2])))
    } else if layout.is_subtractive() {
        let k = layout.black_channel().map_or(0.0, |k| unit(pixel[k]));
        Some((
            (1.0 - unit(pixel[0])) * (1.0 - k),
            (1.0 - unit(pixel[1])) * (1.0 - k),
            (1.0 - unit(pixel[2])) * (1.0 - k),
        ))
    } else {
        None
    }
}

fn luma(layout: ChannelLayout, pixel: &[u8]) -> f32 {
    match rgb(layout, pixel) {
        Some((r, g, b)) => (0.2126 * r + 0.7152 * g + 0.0722 * b) * alpha(layout, pixel),
        None => brightness(layout, pixel),
    }
}

fn rgba(layout: ChannelLayout, pixel: &[u8], channel: usize) -> f32 {
    let Some((r, g, b)) = rgb(layout, pixel) else {
        // Four opaque channels are read as straight RGBA.
        let a = unit(pixel[3]);
        return if channel == 3 { a } else { unit(pixel[channel]) * a };
    };
    let a = alpha(layout, pixel);
    match channel {
        0 => r * a,
        1 => g * a,
        2 => b * a,
        _ => a,
    }
}

impl EnergyKind {
    /// Computes reader value `channel` of one raw pixel.
    pub(crate) fn read_channel(&self, layout: ChannelLayout, pixel: &[u8], channel: usize) -> f32 {
        match self {
            EnergyKind::Brightness => brightness(layout, pixel),
            EnergyKind::Luma => luma(layout, pixel),
            EnergyKind::Rgba => rgba(layout, pixel, channel),
            EnergyKind::Custom(_) => unit(pixel[channel]),
        }
    }
}

/// Reads samples straight from a buffer, converting on every access.
#[derive(Clone, Copy, Debug)]
pub struct PixelSamples<'a> {
    buffer: &'a PixelBuffer,
    kind: EnergyKind,
}

impl<'a> PixelSamples<'a> {
    /// Validates `kind` against the buffer layout.
    pub fn new(buffer: &'a PixelBuffer, kind: EnergyKind) -> CarveResult<Self> {
        kind.validate(buffer.layout())?;
        Ok(Self { buffer, kind })
    }
}

impl SampleSource for PixelSamples<'_> {
    fn width(&self) -> usize {
        self.buffer.width()
    }

    fn height(&self) -> usize {
        self.buffer.height()
    }

    fn channels(&self) -> usize {
        self.kind.reader_channels()
    }

    #[inline]
    fn sample(&self, x: usize, y: usize, channel: usize) -> f32 {
        self.kind
            .read_channel(self.buffer.layout(), self.buffer.pixel_unchecked(x, y), channel)
    }
}

/// Reader values precomputed for every pixel of a buffer.
#[derive(Clone, Debug)]
pub struct ReadCache {
    width: usize,
    height: usize,
    channels: usize,
    values: Vec<f32>,
}

impl ReadCache {
    /// Converts every pixel of `buffer` once.
    pub fn build(buffer: &PixelBuffer, kind: EnergyKind) -> CarveResult<Self> {
        let samples = PixelSamples::new(buffer, kind)?;
        let channels = kind.reader_channels();
        let (width, height) = (buffer.width(), buffer.height());
        let mut values = try_filled(width * height * channels, 0.0f32, "read cache")?;
        for y in 0..height {
            for x in 0..width {
                let base = (y * width + x) * channels;
                for c in 0..channels {
                    values[base + c] = samples.sample(x, y, c);
                }
            }
        }
        Ok(Self {
            width,
            height,
            channels,
            values,
        })
    }

    /// Reader values per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub(crate) fn value(&self, x: usize, y: usize, channel: usize) -> f32 {
        self.values[(y * self.width + x) * self.channels + channel]
    }
}

impl SampleSource for ReadCache {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn sample(&self, x: usize, y: usize, channel: usize) -> f32 {
        self.value(x, y, channel)
    }
}

/// Carved view of the source: row `y` shows `index[(0..width, y)]`.
#[derive(Clone, Copy)]
pub(crate) struct VisiblePixels<'a> {
    pub(crate) samples: PixelSamples<'a>,
    pub(crate) index: &'a Grid<usize>,
    pub(crate) width: usize,
}

impl SampleSource for VisiblePixels<'_> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.index.height()
    }

    fn channels(&self) -> usize {
        self.samples.channels()
    }

    #[inline]
    fn sample(&self, x: usize, y: usize, channel: usize) -> f32 {
        self.samples.sample(self.index[(x, y)], y, channel)
    }
}

/// Like [`VisiblePixels`], backed by a [`ReadCache`].
#[derive(Clone, Copy)]
pub(crate) struct VisibleCache<'a> {
    pub(crate) cache: &'a ReadCache,
    pub(crate) index: &'a Grid<usize>,
    pub(crate) width: usize,
}

impl SampleSource for VisibleCache<'_> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.index.height()
    }

    fn channels(&self) -> usize {
        self.cache.channels()
    }

    #[inline]
    fn sample(&self, x: usize, y: usize, channel: usize) -> f32 {
        self.cache.value(self.index[(x, y)], y, channel)
    }
}
