use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::error::{InputError, Result};
use crate::instrument::{CollisionModel, Kinematics};
use crate::math::Point2;
use crate::progress::Reporter;

use super::{CellState, GridAxis, GridParams, OccupancyGrid};

/// Upper bound on the number of progress updates per grid.
const MAX_PROGRESS_UPDATES: usize = 25;

/// Classifies every cell of the configuration space.
///
/// Rows of the grid are distributed over a dedicated thread pool; each task
/// writes only its own row.
#[derive(Debug, Clone)]
pub struct GridBuilder {
    params: GridParams,
    max_threads: usize,
}

impl GridBuilder {
    /// Creates a new grid builder running on at most `max_threads` threads.
    #[must_use]
    pub fn new(params: GridParams, max_threads: usize) -> Self {
        Self {
            params,
            max_threads: max_threads.max(1),
        }
    }

    /// Executes the classification.
    ///
    /// # Errors
    ///
    /// Returns `InputError::DegenerateRange` for an invalid axis range and
    /// `InputError::InvalidParameter` if the worker pool cannot be created.
    pub fn execute(
        &self,
        kinematics: &dyn Kinematics,
        model: &dyn CollisionModel,
        reporter: Reporter<'_>,
    ) -> Result<OccupancyGrid> {
        let mut grid = OccupancyGrid::new(self.params.axis1, self.params.axis2)?;
        let (width, height) = (grid.width(), grid.height());

        let message = format!(
            "Calculating configuration space in {} threads...",
            self.max_threads
        );
        reporter.begin(&message);
        tracing::debug!("classifying {width} x {height} cells");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_threads)
            .build()
            .map_err(|e| InputError::InvalidParameter(format!("worker pool: {e}")))?;

        let axis1 = self.params.axis1;
        let axis2 = self.params.axis2;
        let rows_done = AtomicUsize::new(0);
        let stride = height.div_ceil(MAX_PROGRESS_UPDATES).max(1);

        pool.install(|| {
            grid.rows_mut()
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| {
                    classify_row(row, y, &axis1, &axis2, kinematics, model);

                    let done = rows_done.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % stride == 0 || done == height {
                        #[allow(clippy::cast_precision_loss)]
                        let fraction = done as f64 / height as f64;
                        reporter.update(fraction, &message);
                    }
                });
        });

        let occupied = grid.occupied_count();
        tracing::info!(
            "configuration space: {} of {} cells occupied",
            occupied,
            width * height
        );
        reporter.end("Configuration space calculated.");
        Ok(grid)
    }
}

#[allow(clippy::cast_precision_loss)]
fn classify_row(
    row: &mut [CellState],
    y: usize,
    axis1: &GridAxis,
    axis2: &GridAxis,
    kinematics: &dyn Kinematics,
    model: &dyn CollisionModel,
) {
    let angle2 = axis2.angle_at(y as f64 + 0.5);
    for (x, cell) in row.iter_mut().enumerate() {
        let angle1 = axis1.angle_at(x as f64 + 0.5);
        *cell = classify(&Point2::new(angle1, angle2), kinematics, model);
    }
}

/// Classifies a single angle pair.
pub(crate) fn classify(
    angle: &Point2,
    kinematics: &dyn Kinematics,
    model: &dyn CollisionModel,
) -> CellState {
    let config = kinematics.configuration(angle.x, angle.y);
    if !model.within_limits(&config) {
        CellState::OutOfLimits
    } else if model.collides(&config) {
        CellState::Colliding
    } else {
        CellState::Free
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::instrument::AngleConfiguration;
    use crate::progress::{ignore_progress, Progress, ProgressStage};

    /// Identity kinematics: a4 is the first axis, a2 the second.
    struct Plane;

    impl Kinematics for Plane {
        fn configuration(&self, axis1: f64, axis2: f64) -> AngleConfiguration {
            AngleConfiguration::from_scattering_angles(axis2, axis1, 0.0)
        }
    }

    /// Occupies a disc around (0.5, 0.5) and forbids a4 > 0.9.
    struct Disc;

    impl CollisionModel for Disc {
        fn within_limits(&self, config: &AngleConfiguration) -> bool {
            config.a4 <= 0.9
        }

        fn collides(&self, config: &AngleConfiguration) -> bool {
            (config.a4 - 0.5).hypot(config.a2 - 0.5) < 0.2
        }
    }

    fn params() -> GridParams {
        GridParams {
            axis1: GridAxis::new(0.0, 1.0, 0.05),
            axis2: GridAxis::new(0.0, 1.0, 0.05),
        }
    }

    #[test]
    fn classifies_collisions_and_limits() {
        let grid = GridBuilder::new(params(), 2)
            .execute(&Plane, &Disc, Reporter::new(&ignore_progress, false))
            .unwrap();
        assert_eq!((grid.width(), grid.height()), (20, 20));
        assert_eq!(grid.get(10, 10), CellState::Colliding);
        assert_eq!(grid.get(19, 0), CellState::OutOfLimits);
        assert_eq!(grid.get(0, 0), CellState::Free);
    }

    #[test]
    fn thread_count_does_not_change_the_grid() {
        let single = GridBuilder::new(params(), 1)
            .execute(&Plane, &Disc, Reporter::new(&ignore_progress, false))
            .unwrap();
        let multi = GridBuilder::new(params(), 4)
            .execute(&Plane, &Disc, Reporter::new(&ignore_progress, false))
            .unwrap();
        assert_eq!(single, multi);
    }

    #[test]
    fn progress_is_bounded() {
        let events = Mutex::new(Vec::new());
        let sink = |p: &Progress| events.lock().unwrap().push(p.clone());
        GridBuilder::new(params(), 3)
            .execute(&Plane, &Disc, Reporter::new(&sink, false))
            .unwrap();
        let events = events.into_inner().unwrap();
        assert_eq!(events.first().unwrap().stage, ProgressStage::Begin);
        assert_eq!(events.last().unwrap().stage, ProgressStage::End);
        assert!(events.len() <= MAX_PROGRESS_UPDATES + 2);
        assert!(events.iter().any(|p| (p.fraction - 1.0).abs() < 1e-12));
    }
}
