//! Shared utility helpers.

pub(crate) mod alloc;
pub mod cancel;
pub mod error;

pub use cancel::CancelToken;
pub use error::{CarveError, CarveResult, ErrorKind};
