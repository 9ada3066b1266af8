use crate::error::{InputError, Result};
use crate::math::Point2;

use super::{Metric, Path};

/// Units of emitted angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleUnit {
    #[default]
    Radians,
    Degrees,
}

impl AngleUnit {
    /// Expresses an angle given in radians in these units.
    #[must_use]
    pub fn convert(self, radians: f64) -> f64 {
        match self {
            Self::Radians => radians,
            Self::Degrees => radians.to_degrees(),
        }
    }

    /// Converts an angle in these units to degrees.
    #[must_use]
    pub fn degrees_of(self, angle: f64) -> f64 {
        match self {
            Self::Radians => angle.to_degrees(),
            Self::Degrees => angle,
        }
    }
}

/// How a path is turned into caller coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathFormat {
    /// Largest distance between consecutive points; `None` keeps the
    /// path's own vertices.
    pub max_step: Option<f64>,
    pub units: AngleUnit,
    /// Keep the query's start and target points.
    pub include_endpoints: bool,
    /// Re-check every emitted point against the collision model.
    pub verify: bool,
}

impl Default for PathFormat {
    fn default() -> Self {
        Self {
            max_step: None,
            units: AngleUnit::Radians,
            include_endpoints: true,
            verify: false,
        }
    }
}

/// Path coordinates ready for output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormattedPath {
    /// `[axis1, axis2]` pairs in `units`.
    pub points: Vec<[f64; 2]>,
    pub units: AngleUnit,
    /// Points dropped by verification.
    pub rejected: usize,
}

/// Resamples, verifies and converts found paths.
///
/// Steps are measured with the metric the path was found with.
#[derive(Debug, Clone)]
pub struct PathPostProcessor {
    format: PathFormat,
}

impl PathPostProcessor {
    #[must_use]
    pub fn new(format: PathFormat) -> Self {
        Self { format }
    }

    /// Formats `path`. When verification is enabled, points for which
    /// `is_free` fails are dropped and counted.
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidParameter` if `max_step` is not a
    /// positive finite number.
    pub fn execute(&self, path: &Path, is_free: impl Fn(&Point2) -> bool) -> Result<FormattedPath> {
        let mut points = match self.format.max_step {
            Some(step) => subdivide(&path.points, step, &path.metric)?,
            None => path.points.clone(),
        };
        if !self.format.include_endpoints {
            let n = points.len();
            points = if n >= 2 {
                points[1..n - 1].to_vec()
            } else {
                Vec::new()
            };
        }

        let before = points.len();
        if self.format.verify {
            points.retain(|p| is_free(p));
        }
        let rejected = before - points.len();
        if rejected > 0 {
            tracing::warn!("verification dropped {rejected} of {before} path points");
        }

        let units = self.format.units;
        Ok(FormattedPath {
            points: points
                .iter()
                .map(|p| [units.convert(p.x), units.convert(p.y)])
                .collect(),
            units,
            rejected,
        })
    }
}

/// Upper bound on the number of points [`subdivide`] may produce.
pub const MAX_SUBDIVISION_POINTS: usize = 1 << 22;

/// Inserts evenly spaced points so that consecutive points are at most
/// `max_step` apart under `metric`. Original vertices are kept exactly.
///
/// # Errors
///
/// Returns `InputError::InvalidParameter` if `max_step` is not a positive
/// finite number, or if it is so small relative to the path that more than
/// [`MAX_SUBDIVISION_POINTS`] points would be needed.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn subdivide(points: &[Point2], max_step: f64, metric: &Metric) -> Result<Vec<Point2>> {
    if !(max_step.is_finite() && max_step > 0.0) {
        return Err(InputError::InvalidParameter(format!(
            "subdivision step must be positive, got {max_step}"
        ))
        .into());
    }
    let pieces: Vec<f64> = points
        .windows(2)
        .map(|w| (metric.distance(&w[0], &w[1]) / max_step).ceil().max(1.0))
        .collect();
    let total = 1.0 + pieces.iter().sum::<f64>();
    if total > MAX_SUBDIVISION_POINTS as f64 {
        return Err(InputError::InvalidParameter(format!(
            "subdivision step {max_step} needs {total:e} points, limit is {MAX_SUBDIVISION_POINTS}"
        ))
        .into());
    }
    let mut out = Vec::with_capacity(total as usize);
    if let Some(first) = points.first() {
        out.push(*first);
    }
    for (w, &n) in points.windows(2).zip(&pieces) {
        let (a, b) = (w[0], w[1]);
        let n = n as usize;
        for k in 1..n {
            out.push(a + (b - a) * (k as f64 / n as f64));
        }
        out.push(b);
    }
    Ok(out)
}
