//! Discretised configuration space.

mod build;

pub(crate) use build::classify;
pub use build::GridBuilder;

use crate::error::{InputError, Result};
use crate::math::Point2;
use crate::spatial::Aabb;

/// One angular axis of the grid, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridAxis {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl GridAxis {
    #[must_use]
    pub fn new(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    /// Creates an axis from a range and step given in degrees.
    #[must_use]
    pub fn from_degrees(start: f64, end: f64, step: f64) -> Self {
        Self::new(start.to_radians(), end.to_radians(), step.to_radians())
    }

    /// Checks that the range is non-empty and the step positive.
    ///
    /// # Errors
    ///
    /// Returns `InputError::DegenerateRange` otherwise.
    pub fn validate(&self, axis: usize) -> Result<()> {
        let finite = self.start.is_finite() && self.end.is_finite() && self.step.is_finite();
        if !finite || self.start >= self.end || self.step <= 0.0 || self.cell_count() == 0 {
            return Err(InputError::DegenerateRange {
                axis,
                start: self.start,
                end: self.end,
                step: self.step,
            }
            .into());
        }
        Ok(())
    }

    /// Number of whole cells covering the range.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn cell_count(&self) -> usize {
        if self.step <= 0.0 || self.end <= self.start {
            return 0;
        }
        let n = (self.end - self.start) / self.step;
        // Absorb rounding noise when the range is a whole multiple of the step.
        let n = if (n - n.round()).abs() < 1e-6 {
            n.round()
        } else {
            n.floor()
        };
        n as usize
    }

    /// Angle at a continuous cell coordinate (cell `i` spans `[i, i + 1)`).
    #[must_use]
    pub fn angle_at(&self, cell: f64) -> f64 {
        self.start + cell * self.step
    }

    /// Continuous cell coordinate of an angle.
    #[must_use]
    pub fn cell_at(&self, angle: f64) -> f64 {
        (angle - self.start) / self.step
    }
}

/// Axis ranges of the configuration space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridParams {
    /// First planned axis (sample scattering angle).
    pub axis1: GridAxis,
    /// Second planned axis (monochromator or analyser scattering angle).
    pub axis2: GridAxis,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            axis1: GridAxis::from_degrees(-180.0, 180.0, 1.0),
            axis2: GridAxis::from_degrees(-180.0, 180.0, 1.0),
        }
    }
}

/// Classification of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CellState {
    #[default]
    Free = 0x00,
    OutOfLimits = 0xf0,
    Colliding = 0xff,
}

impl CellState {
    #[must_use]
    pub fn is_occupied(self) -> bool {
        self != Self::Free
    }
}

/// Rectangular grid of classified cells over two angle axes.
///
/// Cell `(x, y)` covers `[x, x + 1) × [y, y + 1)` in cell coordinates and is
/// sampled at its centre.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    axis1: GridAxis,
    axis2: GridAxis,
    width: usize,
    height: usize,
    cells: Vec<CellState>,
}

impl OccupancyGrid {
    /// Creates an all-free grid.
    ///
    /// # Errors
    ///
    /// Returns `InputError::DegenerateRange` if either axis is degenerate.
    pub fn new(axis1: GridAxis, axis2: GridAxis) -> Result<Self> {
        axis1.validate(1)?;
        axis2.validate(2)?;
        let width = axis1.cell_count();
        let height = axis2.cell_count();
        Ok(Self {
            axis1,
            axis2,
            width,
            height,
            cells: vec![CellState::Free; width * height],
        })
    }

    /// Creates a grid and fills it from a predicate on cell indices.
    ///
    /// # Errors
    ///
    /// Returns `InputError::DegenerateRange` if either axis is degenerate.
    pub fn from_fn(
        axis1: GridAxis,
        axis2: GridAxis,
        mut state: impl FnMut(usize, usize) -> CellState,
    ) -> Result<Self> {
        let mut grid = Self::new(axis1, axis2)?;
        for y in 0..grid.height {
            for x in 0..grid.width {
                grid.cells[y * grid.width + x] = state(x, y);
            }
        }
        Ok(grid)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn axis1(&self) -> &GridAxis {
        &self.axis1
    }

    #[must_use]
    pub fn axis2(&self) -> &GridAxis {
        &self.axis2
    }

    /// State of a cell; cells outside the grid read as free.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> CellState {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            CellState::Free
        }
    }

    /// Occupancy test with signed indices; outside the grid is free.
    #[must_use]
    pub fn is_occupied(&self, x: isize, y: isize) -> bool {
        match (usize::try_from(x), usize::try_from(y)) {
            (Ok(x), Ok(y)) => self.get(x, y).is_occupied(),
            _ => false,
        }
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [CellState] {
        &mut self.cells
    }

    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_occupied()).count()
    }

    /// Converts continuous cell coordinates to angles.
    #[must_use]
    pub fn cell_to_angle(&self, cell: &Point2) -> Point2 {
        Point2::new(self.axis1.angle_at(cell.x), self.axis2.angle_at(cell.y))
    }

    /// Converts angles to continuous cell coordinates.
    #[must_use]
    pub fn angle_to_cell(&self, angle: &Point2) -> Point2 {
        Point2::new(self.axis1.cell_at(angle.x), self.axis2.cell_at(angle.y))
    }

    /// Angles at which a cell is sampled.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_center(&self, x: usize, y: usize) -> Point2 {
        self.cell_to_angle(&Point2::new(x as f64 + 0.5, y as f64 + 0.5))
    }

    /// Index of the cell containing an angle pair, if inside the grid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn cell_containing(&self, angle: &Point2) -> Option<(usize, usize)> {
        let c = self.angle_to_cell(angle);
        if !(c.x >= 0.0 && c.y >= 0.0) {
            return None;
        }
        let (x, y) = (c.x.floor() as usize, c.y.floor() as usize);
        (x < self.width && y < self.height).then_some((x, y))
    }

    /// State of the cell containing an angle pair.
    #[must_use]
    pub fn state_at(&self, angle: &Point2) -> Option<CellState> {
        self.cell_containing(angle).map(|(x, y)| self.get(x, y))
    }

    /// Angular extent of the grid.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            self.cell_to_angle(&Point2::origin()),
            self.cell_to_angle(&Point2::new(self.width as f64, self.height as f64)),
        )
    }

    /// Smallest cell edge length in angle units.
    #[must_use]
    pub fn min_step(&self) -> f64 {
        self.axis1.step.min(self.axis2.step)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn scenario_cell_counts() {
        let a4 = GridAxis::new(-PI - 8f64.to_radians(), PI + 8f64.to_radians(), 2f64.to_radians());
        let a2 = GridAxis::new(-PI - 4f64.to_radians(), PI + 4f64.to_radians(), 1f64.to_radians());
        assert_eq!(a4.cell_count(), 188);
        assert_eq!(a2.cell_count(), 368);
    }

    #[test]
    fn degenerate_ranges_are_rejected() {
        let bad = [
            GridAxis::new(1.0, 0.0, 0.1),
            GridAxis::new(0.0, 0.0, 0.1),
            GridAxis::new(0.0, 1.0, 0.0),
            GridAxis::new(0.0, 1.0, -0.1),
        ];
        for axis in bad {
            let err = OccupancyGrid::new(axis, GridAxis::new(0.0, 1.0, 0.1)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DegenerateRange);
        }
    }

    #[test]
    fn angle_cell_conversion() {
        let grid = OccupancyGrid::new(GridAxis::new(-1.0, 1.0, 0.5), GridAxis::new(0.0, 3.0, 1.0))
            .unwrap();
        assert_eq!((grid.width(), grid.height()), (4, 3));
        let c = grid.cell_center(1, 2);
        assert!((c.x + 0.25).abs() < 1e-12);
        assert!((c.y - 2.5).abs() < 1e-12);
        assert_eq!(grid.cell_containing(&c), Some((1, 2)));
        assert_eq!(grid.cell_containing(&Point2::new(1.5, 0.5)), None);
        assert_eq!(grid.cell_containing(&Point2::new(-1.5, 0.5)), None);
        let back = grid.angle_to_cell(&grid.cell_to_angle(&Point2::new(2.25, 1.75)));
        assert!((back.x - 2.25).abs() < 1e-12 && (back.y - 1.75).abs() < 1e-12);
    }

    #[test]
    fn outside_cells_are_free() {
        let grid = OccupancyGrid::from_fn(
            GridAxis::new(0.0, 2.0, 1.0),
            GridAxis::new(0.0, 2.0, 1.0),
            |_, _| CellState::Colliding,
        )
        .unwrap();
        assert!(grid.is_occupied(0, 0));
        assert!(!grid.is_occupied(-1, 0));
        assert!(!grid.is_occupied(0, 2));
        assert_eq!(grid.occupied_count(), 4);
    }
}
