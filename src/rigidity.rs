//! Lateral-step penalties for seam transitions.

use crate::grid::Grid;
use crate::util::{CarveError, CarveResult};

/// Bias added to a transition that moves a seam `offset` columns sideways.
///
/// `bias(o) = coefficient * |o|^1.5 / scanlines` for `|o| <= max_step`, and
/// `+inf` beyond. The table is built once and immutable afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct RigidityMap {
    coefficient: f32,
    max_step: usize,
    table: Vec<f32>,
}

impl RigidityMap {
    /// Builds the bias table for seams spanning `scanlines` rows.
    pub fn new(coefficient: f32, max_step: usize, scanlines: usize) -> CarveResult<Self> {
        if !coefficient.is_finite() || coefficient < 0.0 {
            return Err(CarveError::InvalidConfig(
                "rigidity coefficient must be finite and non-negative",
            ));
        }
        if max_step == 0 {
            return Err(CarveError::InvalidConfig("max step must be at least 1"));
        }
        if scanlines == 0 {
            return Err(CarveError::InvalidConfig("rigidity needs at least one scanline"));
        }
        let k = max_step as isize;
        let table = (-k..=k)
            .map(|o| coefficient * (o.unsigned_abs() as f32).powf(1.5) / scanlines as f32)
            .collect();
        Ok(Self {
            coefficient,
            max_step,
            table,
        })
    }

    /// Rigidity coefficient.
    pub fn coefficient(&self) -> f32 {
        self.coefficient
    }

    /// Largest lateral step a seam may take between scanlines.
    pub fn max_step(&self) -> usize {
        self.max_step
    }

    /// Bias for a step of `offset` columns.
    #[inline]
    pub fn bias(&self, offset: isize) -> f32 {
        if offset.unsigned_abs() > self.max_step {
            return f32::INFINITY;
        }
        self.table[(offset + self.max_step as isize) as usize]
    }
}

/// Per-pixel factor applied to the rigidity bias of transitions into that pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct RigidityMask {
    factors: Grid<f32>,
}

impl RigidityMask {
    /// Wraps a grid of non-negative finite factors.
    pub fn new(factors: Grid<f32>) -> CarveResult<Self> {
        if factors.as_slice().iter().any(|f| !f.is_finite() || *f < 0.0) {
            return Err(CarveError::InvalidConfig(
                "rigidity mask factors must be finite and non-negative",
            ));
        }
        Ok(Self { factors })
    }

    /// Factor grid.
    pub fn factors(&self) -> &Grid<f32> {
        &self.factors
    }

    /// Unwraps the factor grid.
    pub fn into_factors(self) -> Grid<f32> {
        self.factors
    }
}
