//! Cooperative cancellation.

use crate::util::{CarveError, CarveResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that asks a running carve to stop.
///
/// Clones share the same flag, so a token handed to another thread (a UI
/// "cancel" button, a watchdog) can stop a session running elsewhere. The
/// carver polls it once per scanline of the cost table.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Clears a previous request.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }

    #[inline]
    pub(crate) fn check(&self) -> CarveResult<()> {
        if self.is_cancelled() {
            Err(CarveError::Cancelled)
        } else {
            Ok(())
        }
    }
}
