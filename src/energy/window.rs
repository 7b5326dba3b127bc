//! Fixed-radius neighbourhood reads around one pixel.
//!
//! [`ReaderWindow`] copies the `(2r + 1)^2` neighbourhood into a local buffer;
//! [`DirectWindow`] forwards each read to the source. Both treat cells outside
//! the image as 0 and both panic when asked for an offset beyond their radius.

use crate::energy::sample::SampleSource;
use crate::energy::EnergyKind;
use crate::util::{CarveError, CarveResult};

/// Read access to a window centred on one pixel.
pub trait WindowRead {
    /// Window radius.
    fn radius(&self) -> usize;
    /// Values per cell.
    fn channels(&self) -> usize;
    /// Value `channel` at offset `(dx, dy)` from the centre.
    ///
    /// # Panics
    /// Panics if `|dx|` or `|dy|` exceeds the radius.
    fn read(&self, dx: isize, dy: isize, channel: usize) -> f32;
}

#[inline]
fn assert_within(radius: usize, dx: isize, dy: isize) {
    assert!(
        dx.unsigned_abs() <= radius && dy.unsigned_abs() <= radius,
        "offset ({dx}, {dy}) outside window of radius {radius}"
    );
}

fn check_source<S: SampleSource + ?Sized>(
    reader: &'static str,
    channels: usize,
    source: &S,
    x: usize,
    y: usize,
) -> CarveResult<()> {
    if source.channels() != channels {
        return Err(CarveError::ChannelMismatch {
            reader,
            expected: channels,
            got: source.channels(),
        });
    }
    if x >= source.width() || y >= source.height() {
        return Err(CarveError::OutOfBounds {
            x,
            y,
            width: source.width(),
            height: source.height(),
        });
    }
    Ok(())
}

/// Materialised window buffer, reused across fills.
#[derive(Clone, Debug)]
pub struct ReaderWindow {
    reader: &'static str,
    radius: usize,
    channels: usize,
    values: Vec<f32>,
}

impl ReaderWindow {
    /// Creates a window for `kind` readers of the given radius.
    pub fn new(kind: EnergyKind, radius: usize) -> Self {
        let side = 2 * radius + 1;
        let channels = kind.reader_channels();
        Self {
            reader: kind.name(),
            radius,
            channels,
            values: vec![0.0; side * side * channels],
        }
    }

    /// Copies the neighbourhood of `(x, y)` out of `source`.
    ///
    /// Cells outside the source read as 0.
    pub fn fill<S: SampleSource + ?Sized>(
        &mut self,
        source: &S,
        x: usize,
        y: usize,
    ) -> CarveResult<()> {
        check_source(self.reader, self.channels, source, x, y)?;
        let r = self.radius as isize;
        let side = 2 * self.radius + 1;
        let (w, h) = (source.width() as isize, source.height() as isize);
        for dy in -r..=r {
            for dx in -r..=r {
                let base = ((dy + r) as usize * side + (dx + r) as usize) * self.channels;
                let (sx, sy) = (x as isize + dx, y as isize + dy);
                let inside = sx >= 0 && sx < w && sy >= 0 && sy < h;
                for c in 0..self.channels {
                    self.values[base + c] = if inside {
                        source.sample(sx as usize, sy as usize, c)
                    } else {
                        0.0
                    };
                }
            }
        }
        Ok(())
    }
}

impl WindowRead for ReaderWindow {
    fn radius(&self) -> usize {
        self.radius
    }

    fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    fn read(&self, dx: isize, dy: isize, channel: usize) -> f32 {
        assert_within(self.radius, dx, dy);
        assert!(channel < self.channels, "channel {channel} out of range");
        let r = self.radius as isize;
        let side = 2 * self.radius + 1;
        let cell = (dy + r) as usize * side + (dx + r) as usize;
        self.values[cell * self.channels + channel]
    }
}

/// Window that reads through to its source without copying.
#[derive(Clone, Copy)]
pub struct DirectWindow<'a, S: ?Sized> {
    source: &'a S,
    x: usize,
    y: usize,
    radius: usize,
}

impl<'a, S: SampleSource + ?Sized> DirectWindow<'a, S> {
    /// Centres a window on `(x, y)`, checking the source against `kind`.
    pub fn new(
        kind: EnergyKind,
        source: &'a S,
        x: usize,
        y: usize,
        radius: usize,
    ) -> CarveResult<Self> {
        check_source(kind.name(), kind.reader_channels(), source, x, y)?;
        Ok(Self {
            source,
            x,
            y,
            radius,
        })
    }
}

impl<S: SampleSource + ?Sized> WindowRead for DirectWindow<'_, S> {
    fn radius(&self) -> usize {
        self.radius
    }

    fn channels(&self) -> usize {
        self.source.channels()
    }

    #[inline]
    fn read(&self, dx: isize, dy: isize, channel: usize) -> f32 {
        assert_within(self.radius, dx, dy);
        assert!(channel < self.source.channels(), "channel {channel} out of range");
        let sx = self.x as isize + dx;
        let sy = self.y as isize + dy;
        if sx < 0
            || sy < 0
            || sx as usize >= self.source.width()
            || sy as usize >= self.source.height()
        {
            return 0.0;
        }
        self.source.sample(sx as usize, sy as usize, channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::sample::{PixelSamples, ReadCache};
    use crate::image::{ChannelLayout, PixelBuffer};

    fn buffer() -> PixelBuffer {
        let data = (0..4 * 3).map(|v| (v * 20) as u8).collect();
        PixelBuffer::new(data, 4, 3, ChannelLayout::Grey).unwrap()
    }

    #[test]
    fn buffered_and_direct_reads_agree() {
        let buf = buffer();
        let samples = PixelSamples::new(&buf, EnergyKind::Brightness).unwrap();
        let cache = ReadCache::build(&buf, EnergyKind::Brightness).unwrap();
        let mut window = ReaderWindow::new(EnergyKind::Brightness, 2);
        for y in 0..3 {
            for x in 0..4 {
                window.fill(&samples, x, y).unwrap();
                let direct = DirectWindow::new(EnergyKind::Brightness, &cache, x, y, 2).unwrap();
                for dy in -2..=2 {
                    for dx in -2..=2 {
                        assert_eq!(window.read(dx, dy, 0), direct.read(dx, dy, 0));
                    }
                }
            }
        }
    }

    #[test]
    fn outside_cells_read_zero() {
        let buf = buffer();
        let samples = PixelSamples::new(&buf, EnergyKind::Brightness).unwrap();
        let mut window = ReaderWindow::new(EnergyKind::Brightness, 1);
        window.fill(&samples, 0, 0).unwrap();
        assert_eq!(window.read(-1, 0, 0), 0.0);
        assert_eq!(window.read(0, -1, 0), 0.0);
        assert_eq!(window.read(1, 1, 0), 100.0 / 255.0);
    }

    #[test]
    fn wrong_reader_is_rejected() {
        let buf = buffer();
        let samples = PixelSamples::new(&buf, EnergyKind::Brightness).unwrap();
        let mut window = ReaderWindow::new(EnergyKind::Rgba, 1);
        assert_eq!(
            window.fill(&samples, 0, 0).unwrap_err(),
            CarveError::ChannelMismatch {
                reader: "rgba",
                expected: 4,
                got: 1
            }
        );
        let mut window = ReaderWindow::new(EnergyKind::Brightness, 1);
        assert!(matches!(
            window.fill(&samples, 4, 0),
            Err(CarveError::OutOfBounds { .. })
        ));
    }

    #[test]
    #[should_panic]
    fn read_beyond_radius_panics() {
        let buf = buffer();
        let samples = PixelSamples::new(&buf, EnergyKind::Brightness).unwrap();
        let mut window = ReaderWindow::new(EnergyKind::Brightness, 1);
        window.fill(&samples, 1, 1).unwrap();
        let _ = window.read(2, 0, 0);
    }
}
