//! Seamcarve is a content-aware image resizing ("seam carving") engine.
//!
//! It works on caller-supplied in-memory buffers: an energy model built from
//! pluggable reader variants and gradient formulas, a dynamic-programming
//! minimal-seam search with rigidity bias, and a multi-size cache that turns
//! recorded seams into any intermediate (or enlarged) size without carving
//! again. Optional parallelism comes with the `rayon` feature, tracing spans
//! with `tracing`, and conversions to the `image` crate with `image-io`.
//!
//! ```no_run
//! use seamcarve::{ChannelLayout, PixelBuffer, Resized, Session, SessionConfig};
//!
//! # fn main() -> seamcarve::CarveResult<()> {
//! let pixels = vec![0u8; 64 * 48 * 3];
//! let image = PixelBuffer::new(pixels, 64, 48, ChannelLayout::Rgb)?;
//! let mut session = Session::new(image, SessionConfig::default())?;
//! if let Resized::Complete(smaller) = session.resize_to(48, 48)? {
//!     assert_eq!(smaller.width(), 48);
//! }
//! # Ok(())
//! # }
//! ```

pub mod carver;
pub mod energy;
pub mod grid;
pub mod image;
pub mod lowlevel;
pub mod multisize;
pub mod rigidity;
pub mod session;
mod trace;
pub mod util;

pub use carver::{Orientation, Progress, SeamCarver, SeamPath};
pub use energy::{EnergyFunction, EnergyKind, GradientKind};
pub use grid::{EnergyMap, Grid};
pub use image::{ChannelLayout, PixelBuffer, PixelView};
pub use multisize::MultiSizeImage;
pub use rigidity::{RigidityMap, RigidityMask};
pub use session::{ResizeOrder, Resized, Session, SessionConfig};
pub use util::{CancelToken, CarveError, CarveResult, ErrorKind};
