//! Cumulative cost table for vertical seams.
//!
//! `m[0][x] = e[0][x]` and, for `y > 0`,
//! `m[y][x] = e[y][x] + min_{|o| <= k} (m[y-1][x+o] + mask[y][x] * bias(o))`.
//! Each cell keeps the offset it came from so the seam can be traced back.
//!
//! Ties between predecessors go to the smallest `|o|`, then to the active
//! [`SideBias`]. Ties between terminal cells go to the leftmost column, or the
//! rightmost when the side is [`SideBias::Right`].

use crate::carver::path::{Orientation, SeamPath};
use crate::grid::{EnergyMap, Grid};
use crate::rigidity::RigidityMap;
use crate::trace::trace_span;
use crate::util::{CancelToken, CarveError, CarveResult};

/// Which way equal-cost choices lean.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SideBias {
    /// Prefer negative offsets and the leftmost terminal.
    #[default]
    Left,
    /// Prefer positive offsets and the rightmost terminal.
    Right,
}

impl SideBias {
    /// The opposite side.
    pub fn flipped(self) -> Self {
        match self {
            SideBias::Left => SideBias::Right,
            SideBias::Right => SideBias::Left,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Step {
    cost: f32,
    offset: i32,
}

/// Filled cost table.
#[derive(Clone, Debug)]
pub struct CostTable {
    steps: Grid<Step>,
    side: SideBias,
}

/// Predecessor offsets in preference order.
fn offset_order(max_step: usize, side: SideBias) -> Vec<isize> {
    let mut order = Vec::with_capacity(2 * max_step + 1);
    order.push(0);
    for d in 1..=max_step as isize {
        match side {
            SideBias::Left => order.extend([-d, d]),
            SideBias::Right => order.extend([d, -d]),
        }
    }
    order
}

#[inline]
fn fill_cell(
    prev: &[Step],
    x: usize,
    energy: f32,
    factor: f32,
    order: &[isize],
    rigidity: &RigidityMap,
) -> Step {
    let w = prev.len() as isize;
    let mut best = f32::INFINITY;
    let mut best_offset = 0;
    for &o in order {
        let px = x as isize + o;
        if px < 0 || px >= w {
            continue;
        }
        let c = prev[px as usize].cost + factor * rigidity.bias(o);
        if c < best {
            best = c;
            best_offset = o as i32;
        }
    }
    Step {
        cost: energy + best,
        offset: best_offset,
    }
}

impl CostTable {
    /// Fills the table scanline by scanline.
    ///
    /// `cancel` is polled once per scanline; a set token aborts with
    /// [`CarveError::Cancelled`] and the partial table is dropped. With the
    /// `rayon` feature and `parallel` set, cells within a scanline are filled
    /// in parallel; the result is identical.
    pub fn build(
        energy: &EnergyMap,
        rigidity: &RigidityMap,
        mask: Option<&Grid<f32>>,
        side: SideBias,
        parallel: bool,
        cancel: &CancelToken,
    ) -> CarveResult<Self> {
        let (w, h) = (energy.width(), energy.height());
        if let Some(mask) = mask {
            if mask.width() != w || mask.height() != h {
                return Err(CarveError::InvalidConfig("rigidity mask size differs from the image"));
            }
        }
        let _span = trace_span!("cost_table", width = w, height = h).entered();

        let order = offset_order(rigidity.max_step(), side);
        let mut steps = Grid::new(
            w,
            h,
            Step {
                cost: 0.0,
                offset: 0,
            },
        )?;

        cancel.check()?;
        for (cell, &e) in steps.row_mut(0).iter_mut().zip(energy.row(0)) {
            cell.cost = e;
        }

        for y in 1..h {
            cancel.check()?;
            let energy_row = energy.row(y);
            let mask_row = mask.map(|m| m.row(y));
            let factor = |x: usize| mask_row.map_or(1.0, |m| m[x]);
            let (prev, row) = steps.prev_and_row_mut(y);

            #[cfg(feature = "rayon")]
            if parallel {
                use rayon::prelude::*;
                row.par_iter_mut().enumerate().for_each(|(x, cell)| {
                    *cell = fill_cell(prev, x, energy_row[x], factor(x), &order, rigidity);
                });
                continue;
            }
            #[cfg(not(feature = "rayon"))]
            let _ = parallel;

            for (x, cell) in row.iter_mut().enumerate() {
                *cell = fill_cell(prev, x, energy_row[x], factor(x), &order, rigidity);
            }
        }

        Ok(Self { steps, side })
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.steps.width()
    }

    /// Number of scanlines.
    pub fn height(&self) -> usize {
        self.steps.height()
    }

    /// Minimal cumulative cost of reaching `(x, y)`.
    pub fn cost(&self, x: usize, y: usize) -> CarveResult<f32> {
        self.steps.try_get(x, y).map(|s| s.cost)
    }

    /// Column the optimal path to `(x, y)` comes from, `None` on the first row.
    pub fn predecessor(&self, x: usize, y: usize) -> CarveResult<Option<usize>> {
        let step = self.steps.try_get(x, y)?;
        if y == 0 {
            return Ok(None);
        }
        Ok(Some((x as isize + step.offset as isize) as usize))
    }

    /// Column of the cheapest terminal cell.
    pub fn terminal(&self) -> usize {
        let last = self.steps.row(self.height() - 1);
        let mut best = 0;
        for (x, step) in last.iter().enumerate().skip(1) {
            let better = match self.side {
                SideBias::Left => step.cost < last[best].cost,
                SideBias::Right => step.cost <= last[best].cost,
            };
            if better {
                best = x;
            }
        }
        best
    }

    /// Cost of the cheapest seam.
    pub fn min_cost(&self) -> f32 {
        self.steps[(self.terminal(), self.height() - 1)].cost
    }

    /// Traces the cheapest seam back from its terminal cell.
    pub fn backtrack(&self) -> SeamPath {
        let h = self.height();
        let mut positions = vec![0; h];
        let mut x = self.terminal();
        for y in (0..h).rev() {
            positions[y] = x;
            if y > 0 {
                x = (x as isize + self.steps[(x, y)].offset as isize) as usize;
            }
        }
        SeamPath::new(Orientation::Vertical, positions)
    }
}
