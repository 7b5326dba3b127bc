//! Seam paths.

use crate::util::{CarveError, CarveResult};

/// Direction a seam runs in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Top to bottom, one column per row; removing it narrows the image.
    #[default]
    Vertical,
    /// Left to right, one row per column; removing it shortens the image.
    Horizontal,
}

/// One position per scanline.
///
/// For a vertical seam `positions[y]` is a column, for a horizontal seam
/// `positions[x]` is a row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeamPath {
    orientation: Orientation,
    positions: Vec<usize>,
}

impl SeamPath {
    /// Creates a path from raw positions.
    pub fn new(orientation: Orientation, positions: Vec<usize>) -> Self {
        Self {
            orientation,
            positions,
        }
    }

    /// Direction of the seam.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Position per scanline.
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Number of scanlines.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True for a path with no scanlines.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Image coordinates `(x, y)` of every seam pixel.
    pub fn coords(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let orientation = self.orientation;
        self.positions
            .iter()
            .enumerate()
            .map(move |(s, &p)| match orientation {
                Orientation::Vertical => (p, s),
                Orientation::Horizontal => (s, p),
            })
    }

    /// Largest position jump between consecutive scanlines.
    pub fn max_step(&self) -> usize {
        self.positions
            .windows(2)
            .map(|w| w[0].abs_diff(w[1]))
            .max()
            .unwrap_or(0)
    }

    /// Checks that the path has `scanlines` positions, all below `extent`.
    pub(crate) fn check_fits(&self, scanlines: usize, extent: usize) -> CarveResult<()> {
        if self.positions.len() != scanlines {
            return Err(CarveError::InvalidSeam {
                reason: "path length does not match the number of scanlines",
            });
        }
        if self.positions.iter().any(|&p| p >= extent) {
            return Err(CarveError::InvalidSeam {
                reason: "position beyond the current scanline length",
            });
        }
        Ok(())
    }
}
