//! Low-level building blocks for custom carving pipelines.
//!
//! These expose the pieces behind [`crate::Session`]: reader windows and
//! sample sources, the cost table, visibility maps and the raw carver.
//! Most users should prefer `Session`.

pub use crate::carver::{
    CarverConfig, CarverState, CostTable, Progress, ProgressFn, SeamCarver, SideBias,
};
pub use crate::energy::{
    DirectWindow, PixelSamples, ReadCache, ReaderWindow, SampleSource, WindowRead,
};
pub use crate::grid::{EnergyMap, Grid};
pub use crate::image::RemovedSeam;
pub use crate::multisize::{MultiSizeImage, VisibilityMap, NEVER};
pub use crate::rigidity::RigidityMap;
