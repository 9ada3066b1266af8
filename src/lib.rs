//! Collision-free angular path planning for triple-axis spectrometers.
//!
//! The configuration space of two instrument axes is sampled on a grid,
//! obstacle regions are traced into line segments, and a Voronoi roadmap
//! over those segments is searched for paths that keep clear of walls.
//! [`PathsBuilder`] drives the whole pipeline.

pub mod builder;
pub mod contour;
pub mod error;
pub mod export;
pub mod grid;
pub mod instrument;
pub mod math;
pub mod path;
pub mod progress;
pub mod roadmap;
pub mod segments;
pub mod spatial;

pub use builder::{BuildState, PathsBuilder, SegmentParams};
pub use error::{ErrorKind, PathsError, Result};
pub use instrument::{AngleConfiguration, CollisionModel, InstrumentSpace, Kinematics, TasKinematics};
pub use math::Point2;
pub use path::{AngleUnit, FormattedPath, Path, PathFormat, PathParams, PathStrategy};
pub use progress::{
    ignore_progress, log_progress, Progress, ProgressFn, ProgressStage, Reporter,
};
