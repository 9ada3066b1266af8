use thiserror::Error;

use crate::builder::BuildState;

/// Top-level error type for the path planning engine.
#[derive(Debug, Error)]
pub enum PathsError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`PathsError`], for callers that only need
/// to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsetInput,
    DegenerateRange,
    OutOfOrderPhase,
    NoPath,
    NumericDegeneracy,
    Io,
}

impl PathsError {
    /// Returns the coarse kind of this error.
    ///
    /// Missing geometry or kinematics are `UnsetInput`. Bad ranges, invalid
    /// parameters and a sampled range without any obstacle
    /// (`GeometryError::NoObstacles`) are `DegenerateRange`. The remaining
    /// geometry errors are `NumericDegeneracy`.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(InputError::UnsetGeometry | InputError::UnsetKinematics) => {
                ErrorKind::UnsetInput
            }
            Self::Input(InputError::DegenerateRange { .. } | InputError::InvalidParameter(_))
            | Self::Geometry(GeometryError::NoObstacles) => ErrorKind::DegenerateRange,
            Self::Workflow(_) => ErrorKind::OutOfOrderPhase,
            Self::Geometry(_) => ErrorKind::NumericDegeneracy,
            Self::Path(_) => ErrorKind::NoPath,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Errors caused by missing or malformed caller input.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("instrument geometry is not set")]
    UnsetGeometry,

    #[error("kinematics are not set")]
    UnsetKinematics,

    #[error("degenerate range on axis {axis}: start = {start}, end = {end}, step = {step}")]
    DegenerateRange {
        axis: usize,
        start: f64,
        end: f64,
        step: f64,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Errors raised when a pipeline phase runs from the wrong state.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{phase} requires state {required:?}, but the builder is in state {actual:?}")]
    OutOfOrder {
        phase: &'static str,
        required: BuildState,
        actual: BuildState,
    },

    #[error("the build is not complete (state {0:?})")]
    NotComplete(BuildState),
}

/// Errors raised by the geometric phases.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("the configuration space has no obstacles to trace")]
    NoObstacles,

    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Which end of a path query an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    Target,
}

/// Errors raised by path queries.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("{which:?} position lies inside an obstacle")]
    InsideObstacle { which: Endpoint },

    #[error("{which:?} position lies outside the configuration space")]
    OutOfBounds { which: Endpoint },

    #[error("{which:?} position cannot reach the roadmap")]
    Unreachable { which: Endpoint },

    #[error("no path connects start and target")]
    NoPath,

    #[error("the roadmap is empty")]
    NoRoadmap,
}

/// Convenience type alias for results using [`PathsError`].
pub type Result<T> = std::result::Result<T, PathsError>;
