//! Removal generations per original pixel.

use crate::grid::Grid;
use crate::util::{CarveError, CarveResult};

/// Generation value of a pixel no seam has removed.
pub const NEVER: u32 = u32::MAX;

/// Records, for every pixel of the original image, the generation of the
/// seam that removed it.
///
/// Generations start at 0 and one seam uses one generation, so after `d`
/// seams every row holds exactly the generations `0..d` once each. A pixel
/// is visible at extent `T` iff its generation is at least `W - T`.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityMap {
    generations: Grid<u32>,
    depth: u32,
    last: Option<u32>,
}

impl VisibilityMap {
    /// Creates an empty map over a `width x height` original.
    pub fn new(width: usize, height: usize) -> CarveResult<Self> {
        Ok(Self {
            generations: Grid::new(width, height, NEVER)?,
            depth: 0,
            last: None,
        })
    }

    /// Wraps a grid that already satisfies the per-row generation invariant.
    pub(crate) fn from_parts(generations: Grid<u32>, depth: u32) -> Self {
        Self {
            generations,
            depth,
            last: depth.checked_sub(1),
        }
    }

    /// Original width.
    pub fn width(&self) -> usize {
        self.generations.width()
    }

    /// Original height.
    pub fn height(&self) -> usize {
        self.generations.height()
    }

    /// Number of completed seams.
    pub fn depth(&self) -> usize {
        self.depth as usize
    }

    /// Generation at which `(x, y)` was removed, `None` if it never was.
    pub fn generation(&self, x: usize, y: usize) -> CarveResult<Option<u32>> {
        let g = self.generations.try_get(x, y)?;
        Ok((g != NEVER).then_some(g))
    }

    /// Raw generation grid; never-removed pixels hold [`NEVER`].
    pub fn generations(&self) -> &Grid<u32> {
        &self.generations
    }

    /// Marks `(x, y)` as removed by seam `generation`.
    ///
    /// A cell is written at most once, and generations may not go backwards.
    pub fn record_removal(&mut self, x: usize, y: usize, generation: u32) -> CarveResult<()> {
        if generation == NEVER {
            return Err(CarveError::InvalidConfig("generation value is reserved"));
        }
        let existing = self.generations.try_get(x, y)?;
        if existing != NEVER {
            return Err(CarveError::GenerationReassigned { x, y, existing });
        }
        if let Some(last) = self.last {
            if generation < last {
                return Err(CarveError::GenerationOutOfOrder { generation, last });
            }
        }
        self.generations[(x, y)] = generation;
        self.last = Some(generation);
        self.depth = self.depth.max(generation + 1);
        Ok(())
    }

    /// Forgets every recorded removal.
    pub fn clear(&mut self) {
        self.generations.fill(NEVER);
        self.depth = 0;
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_each_cell_once() {
        let mut map = VisibilityMap::new(3, 2).unwrap();
        map.record_removal(1, 0, 0).unwrap();
        map.record_removal(2, 1, 0).unwrap();
        assert_eq!(map.depth(), 1);
        assert_eq!(map.generation(1, 0).unwrap(), Some(0));
        assert_eq!(map.generation(0, 0).unwrap(), None);
        assert_eq!(
            map.record_removal(1, 0, 1).unwrap_err(),
            CarveError::GenerationReassigned {
                x: 1,
                y: 0,
                existing: 0
            }
        );
    }

    #[test]
    fn generations_never_go_backwards() {
        let mut map = VisibilityMap::new(3, 1).unwrap();
        map.record_removal(0, 0, 1).unwrap();
        assert_eq!(
            map.record_removal(1, 0, 0).unwrap_err(),
            CarveError::GenerationOutOfOrder {
                generation: 0,
                last: 1
            }
        );
        assert!(map.record_removal(3, 0, 2).is_err());
        map.clear();
        assert_eq!(map.depth(), 0);
        map.record_removal(1, 0, 0).unwrap();
    }
}
