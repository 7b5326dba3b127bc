//! Pixel buffers and borrowed views.
//!
//! `PixelView` is a borrowed 2D view into interleaved 8-bit samples with an
//! explicit stride (in pixels), mirroring how callers usually hand over
//! decoded images. `PixelBuffer` owns its samples contiguously and is the
//! currency of the engine: sessions take one in and hand resized ones back.
//!
//! Seam removal consumes a buffer and returns the same allocation shrunk by
//! one column or row, so ownership makes it clear who may mutate the image.

use crate::carver::path::{Orientation, SeamPath};
use crate::util::alloc::{checked_len, try_filled, try_with_capacity};
use crate::util::{CarveError, CarveResult};

#[cfg(feature = "image-io")]
pub mod io;
pub mod layout;

pub use layout::ChannelLayout;

/// Borrowed 2D view over interleaved samples.
#[derive(Copy, Clone, Debug)]
pub struct PixelView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
}

impl<'a> PixelView<'a> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(
        data: &'a [u8],
        width: usize,
        height: usize,
        channels: usize,
    ) -> CarveResult<Self> {
        Self::new(data, width, height, channels, width)
    }

    /// Creates a view whose rows start `stride` pixels apart.
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        channels: usize,
        stride: usize,
    ) -> CarveResult<Self> {
        checked_len(width, height, channels)?;
        if stride < width {
            return Err(CarveError::InvalidConfig("stride smaller than width"));
        }
        let needed = (height - 1)
            .checked_mul(stride)
            .and_then(|v| v.checked_add(width))
            .and_then(|v| v.checked_mul(channels))
            .ok_or(CarveError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(CarveError::BufferLength {
                expected: needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
            stride,
        })
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the samples per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the distance in pixels between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the samples of pixel `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a [u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.stride + x) * self.channels;
        self.data.get(start..start + self.channels)
    }

    /// Returns the `width * channels` samples of row `y`.
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.stride * self.channels;
        self.data.get(start..start + self.width * self.channels)
    }
}

/// Owned contiguous image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: usize,
    height: usize,
    layout: ChannelLayout,
}

/// Samples taken out of a buffer by [`PixelBuffer::remove_seam`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovedSeam {
    path: SeamPath,
    samples: Vec<u8>,
}

impl RemovedSeam {
    /// Returns the path the samples were removed along.
    pub fn path(&self) -> &SeamPath {
        &self.path
    }

    /// Returns the removed samples, one pixel per scanline.
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }
}

impl PixelBuffer {
    /// Wraps `width * height * layout.channels()` interleaved samples.
    pub fn new(
        data: Vec<u8>,
        width: usize,
        height: usize,
        layout: ChannelLayout,
    ) -> CarveResult<Self> {
        if layout.channels() == 0 {
            return Err(CarveError::InvalidConfig("layout has no channels"));
        }
        let expected = checked_len(width, height, layout.channels())?;
        if data.len() != expected {
            return Err(CarveError::BufferLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            layout,
        })
    }

    /// Creates a buffer with every pixel set to `pixel`.
    pub fn filled(
        width: usize,
        height: usize,
        layout: ChannelLayout,
        pixel: &[u8],
    ) -> CarveResult<Self> {
        if pixel.len() != layout.channels() {
            return Err(CarveError::BufferLength {
                expected: layout.channels(),
                got: pixel.len(),
            });
        }
        let len = checked_len(width, height, layout.channels())?;
        let mut data = try_with_capacity(len, "pixel buffer")?;
        for _ in 0..width * height {
            data.extend_from_slice(pixel);
        }
        Self::new(data, width, height, layout)
    }

    /// Copies a (possibly strided) view into a contiguous buffer.
    pub fn from_view(view: PixelView<'_>, layout: ChannelLayout) -> CarveResult<Self> {
        if view.channels() != layout.channels() {
            return Err(CarveError::ChannelMismatch {
                reader: "layout",
                expected: layout.channels(),
                got: view.channels(),
            });
        }
        let len = checked_len(view.width(), view.height(), view.channels())?;
        let mut data = try_with_capacity(len, "pixel buffer")?;
        for y in 0..view.height() {
            let row = view.row(y).ok_or(CarveError::BufferLength {
                expected: len,
                got: view.data.len(),
            })?;
            data.extend_from_slice(row);
        }
        Self::new(data, view.width(), view.height(), layout)
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the samples per pixel.
    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Returns the channel layout.
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Returns the interleaved samples.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer, returning its samples.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Returns a borrowed view of the whole buffer.
    pub fn view(&self) -> PixelView<'_> {
        PixelView {
            data: &self.data,
            width: self.width,
            height: self.height,
            channels: self.channels(),
            stride: self.width,
        }
    }

    /// Returns the samples of pixel `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> CarveResult<&[u8]> {
        let start = self.pixel_offset(x, y)?;
        Ok(&self.data[start..start + self.channels()])
    }

    /// Returns the samples of pixel `(x, y)` mutably.
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> CarveResult<&mut [u8]> {
        let start = self.pixel_offset(x, y)?;
        let channels = self.channels();
        Ok(&mut self.data[start..start + channels])
    }

    #[inline]
    pub(crate) fn pixel_unchecked(&self, x: usize, y: usize) -> &[u8] {
        let channels = self.channels();
        let start = (y * self.width + x) * channels;
        &self.data[start..start + channels]
    }

    /// Returns a copy with rows and columns swapped.
    pub fn transposed(&self) -> CarveResult<Self> {
        let channels = self.channels();
        let mut data = try_filled(self.data.len(), 0u8, "pixel buffer")?;
        for y in 0..self.height {
            for x in 0..self.width {
                let src = (y * self.width + x) * channels;
                let dst = (x * self.height + y) * channels;
                data[dst..dst + channels].copy_from_slice(&self.data[src..src + channels]);
            }
        }
        Self::new(data, self.height, self.width, self.layout)
    }

    /// Removes one pixel per scanline along `path`.
    ///
    /// A vertical seam shrinks the width by one, a horizontal seam the height.
    /// The allocation is reused; the removed samples are returned so that
    /// [`PixelBuffer::restore_seam`] can undo the operation exactly.
    pub fn remove_seam(mut self, path: &SeamPath) -> CarveResult<(Self, RemovedSeam)> {
        let (scanlines, extent) = self.seam_frame(path.orientation());
        if extent < 2 {
            let (width, height) = match path.orientation() {
                Orientation::Vertical => (self.width - 1, self.height),
                Orientation::Horizontal => (self.width, self.height - 1),
            };
            return Err(CarveError::InvalidTargetSize { width, height });
        }
        path.check_fits(scanlines, extent)?;

        let c = self.channels();
        let mut samples = try_with_capacity(scanlines * c, "removed seam")?;
        match path.orientation() {
            Orientation::Vertical => {
                let w = self.width;
                let mut write = 0;
                for (y, &x) in path.positions().iter().enumerate() {
                    let row = y * w * c;
                    samples.extend_from_slice(&self.data[row + x * c..row + (x + 1) * c]);
                    self.data.copy_within(row..row + x * c, write);
                    write += x * c;
                    self.data.copy_within(row + (x + 1) * c..row + w * c, write);
                    write += (w - x - 1) * c;
                }
                self.data.truncate(write);
                self.width -= 1;
            }
            Orientation::Horizontal => {
                let (w, h) = (self.width, self.height);
                for (x, &y_seam) in path.positions().iter().enumerate() {
                    let at = (y_seam * w + x) * c;
                    samples.extend_from_slice(&self.data[at..at + c]);
                    for y in y_seam..h - 1 {
                        let dst = (y * w + x) * c;
                        let src = ((y + 1) * w + x) * c;
                        self.data.copy_within(src..src + c, dst);
                    }
                }
                self.data.truncate(w * (h - 1) * c);
                self.height -= 1;
            }
        }

        Ok((
            self,
            RemovedSeam {
                path: path.clone(),
                samples,
            },
        ))
    }

    /// Re-inserts a seam taken out by [`PixelBuffer::remove_seam`].
    pub fn restore_seam(self, removed: RemovedSeam) -> CarveResult<Self> {
        let c = self.channels();
        let path = &removed.path;
        let (scanlines, extent) = self.seam_frame(path.orientation());
        if path.len() != scanlines {
            return Err(CarveError::InvalidSeam {
                reason: "path length does not match the number of scanlines",
            });
        }
        if path.positions().iter().any(|&p| p > extent) {
            return Err(CarveError::InvalidSeam {
                reason: "insertion position beyond the scanline end",
            });
        }
        if removed.samples.len() != scanlines * c {
            return Err(CarveError::BufferLength {
                expected: scanlines * c,
                got: removed.samples.len(),
            });
        }

        let (w, h) = (self.width, self.height);
        let mut data = try_with_capacity(self.data.len() + scanlines * c, "pixel buffer")?;
        match path.orientation() {
            Orientation::Vertical => {
                for (y, &x) in path.positions().iter().enumerate() {
                    let row = y * w * c;
                    data.extend_from_slice(&self.data[row..row + x * c]);
                    data.extend_from_slice(&removed.samples[y * c..(y + 1) * c]);
                    data.extend_from_slice(&self.data[row + x * c..row + w * c]);
                }
                Self::new(data, w + 1, h, self.layout)
            }
            Orientation::Horizontal => {
                data.resize(self.data.len() + scanlines * c, 0);
                for (x, &y_seam) in path.positions().iter().enumerate() {
                    for y in 0..=h {
                        let dst = (y * w + x) * c;
                        let src = if y < y_seam {
                            &self.data[(y * w + x) * c..(y * w + x + 1) * c]
                        } else if y == y_seam {
                            &removed.samples[x * c..(x + 1) * c]
                        } else {
                            &self.data[((y - 1) * w + x) * c..((y - 1) * w + x + 1) * c]
                        };
                        data[dst..dst + c].copy_from_slice(src);
                    }
                }
                Self::new(data, w, h + 1, self.layout)
            }
        }
    }

    /// Scanline count and scanline length for seams of `orientation`.
    fn seam_frame(&self, orientation: Orientation) -> (usize, usize) {
        match orientation {
            Orientation::Vertical => (self.height, self.width),
            Orientation::Horizontal => (self.width, self.height),
        }
    }

    fn pixel_offset(&self, x: usize, y: usize) -> CarveResult<usize> {
        if x >= self.width || y >= self.height {
            return Err(CarveError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok((y * self.width + x) * self.channels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> PixelBuffer {
        let data = (0..width * height).map(|v| v as u8).collect();
        PixelBuffer::new(data, width, height, ChannelLayout::Grey).unwrap()
    }

    #[test]
    fn vertical_seam_shrinks_width_in_place() {
        let buf = ramp(4, 3);
        let path = SeamPath::new(Orientation::Vertical, vec![0, 1, 3]);
        let (out, removed) = buf.remove_seam(&path).unwrap();
        assert_eq!((out.width(), out.height()), (3, 3));
        assert_eq!(out.data(), &[1, 2, 3, 4, 6, 7, 8, 9, 10]);
        assert_eq!(removed.samples(), &[0, 5, 11]);
    }

    #[test]
    fn horizontal_seam_shrinks_height() {
        let buf = ramp(3, 3);
        let path = SeamPath::new(Orientation::Horizontal, vec![0, 1, 2]);
        let (out, removed) = buf.remove_seam(&path).unwrap();
        assert_eq!((out.width(), out.height()), (3, 2));
        assert_eq!(out.data(), &[3, 1, 2, 6, 7, 5]);
        assert_eq!(removed.samples(), &[0, 4, 8]);
    }

    #[test]
    fn last_column_cannot_be_removed() {
        let buf = ramp(1, 2);
        let path = SeamPath::new(Orientation::Vertical, vec![0, 0]);
        assert_eq!(
            buf.remove_seam(&path).unwrap_err(),
            CarveError::InvalidTargetSize {
                width: 0,
                height: 2
            }
        );
    }

    #[test]
    fn view_respects_stride() {
        let data: Vec<u8> = (0..12).collect();
        let view = PixelView::new(&data, 2, 2, 2, 3).unwrap();
        assert_eq!(view.get(1, 1).unwrap(), &[8, 9]);
        assert_eq!(view.row(1).unwrap(), &[6, 7, 8, 9]);
        let owned = PixelBuffer::from_view(view, ChannelLayout::GreyAlpha).unwrap();
        assert_eq!(owned.data(), &[0, 1, 2, 3, 6, 7, 8, 9]);
    }
}
