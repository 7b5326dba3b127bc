//! Addressable two-dimensional scalar fields.
//!
//! A `Grid` backs every per-pixel map the carver keeps: energies, cumulative
//! costs, predecessor columns, visibility generations, bias and rigidity masks.
//! All index math lives here; `(x, y)` indexing is bounds-checked on both axes
//! so that a column past the end of a row can never alias the next row.

use crate::util::alloc::try_filled;
use crate::util::{CarveError, CarveResult};
use std::ops::{Index, IndexMut};

/// Owned row-major `width x height` array.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

/// Per-pixel energy values.
pub type EnergyMap = Grid<f32>;

impl<T: Copy> Grid<T> {
    /// Creates a grid with every cell set to `value`.
    pub fn new(width: usize, height: usize, value: T) -> CarveResult<Self> {
        let len = area(width, height)?;
        Ok(Self {
            width,
            height,
            data: try_filled(len, value, "grid")?,
        })
    }

    /// Wraps a row-major vector.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> CarveResult<Self> {
        let expected = area(width, height)?;
        if data.len() != expected {
            return Err(CarveError::BufferLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Returns the number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the value at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Returns the value at `(x, y)` or an `OutOfBounds` error.
    pub fn try_get(&self, x: usize, y: usize) -> CarveResult<T> {
        self.get(x, y).ok_or(CarveError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })
    }

    /// Returns row `y`.
    ///
    /// # Panics
    /// Panics if `y >= height`.
    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.height, "row {y} outside grid of height {}", self.height);
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Returns row `y` mutably.
    ///
    /// # Panics
    /// Panics if `y >= height`.
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        assert!(y < self.height, "row {y} outside grid of height {}", self.height);
        let start = y * self.width;
        &mut self.data[start..start + self.width]
    }

    /// Splits out row `y - 1` (shared) and row `y` (mutable).
    pub(crate) fn prev_and_row_mut(&mut self, y: usize) -> (&[T], &mut [T]) {
        assert!(y > 0 && y < self.height, "row pair {y} outside grid");
        let (head, tail) = self.data.split_at_mut(y * self.width);
        (&head[(y - 1) * self.width..], &mut tail[..self.width])
    }

    /// Returns the backing row-major slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns the backing row-major slice mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the grid, returning its backing vector.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Sets every cell to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|cell| *cell = value);
    }

    /// Returns a copy with rows and columns swapped.
    pub fn transposed(&self) -> CarveResult<Self> {
        let Some(&first) = self.data.first() else {
            return Err(CarveError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        };
        let mut out = Grid::new(self.height, self.width, first)?;
        for y in 0..self.height {
            for (x, &value) in self.row(y).iter().enumerate() {
                out.data[x * self.height + y] = value;
            }
        }
        Ok(out)
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "({x}, {y}) outside {}x{} grid",
            self.width,
            self.height
        );
        y * self.width + x
    }
}

impl<T: Copy> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (x, y): (usize, usize)) -> &T {
        let idx = self.offset(x, y);
        &self.data[idx]
    }
}

impl<T: Copy> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        let idx = self.offset(x, y);
        &mut self.data[idx]
    }
}

fn area(width: usize, height: usize) -> CarveResult<usize> {
    if width == 0 || height == 0 {
        return Err(CarveError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(CarveError::InvalidDimensions { width, height })
}
