//! Fallible allocation helpers.
//!
//! Maps and buffers are sized by the image, so a huge request must surface as
//! `CarveError::Allocation` instead of aborting the process.

use crate::util::{CarveError, CarveResult};

/// Allocates a vector of `len` copies of `value`, reporting failure as an error.
pub(crate) fn try_filled<T: Clone>(
    len: usize,
    value: T,
    what: &'static str,
) -> CarveResult<Vec<T>> {
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|_| CarveError::Allocation { what, len })?;
    out.resize(len, value);
    Ok(out)
}

/// Allocates an empty vector with room for `len` elements.
pub(crate) fn try_with_capacity<T>(len: usize, what: &'static str) -> CarveResult<Vec<T>> {
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|_| CarveError::Allocation { what, len })?;
    Ok(out)
}

/// Computes `width * height * channels`, rejecting zero sizes and overflow.
pub(crate) fn checked_len(width: usize, height: usize, channels: usize) -> CarveResult<usize> {
    if width == 0 || height == 0 || channels == 0 {
        return Err(CarveError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(channels))
        .ok_or(CarveError::InvalidDimensions { width, height })
}
