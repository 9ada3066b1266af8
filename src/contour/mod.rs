//! Obstacle regions and their boundary contours.
//!
//! Contours are expressed in cell coordinates: cell `(x, y)` covers the unit
//! square `[x, x + 1) × [y, y + 1)`. Use [`OccupancyGrid::cell_to_angle`] to
//! convert them to angles.

mod convex;
mod label;
mod raster;
mod simplify;
mod trace;

pub use raster::rasterize;

use crate::error::{GeometryError, Result};
use crate::grid::OccupancyGrid;
#[cfg(test)]
use crate::grid::{CellState, GridAxis};
use crate::math::polygon_2d::point_in_loops;
use crate::math::Point2;
use crate::progress::Reporter;

/// Tuning knobs of the contour extractor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourParams {
    /// Remove raster staircases and nearly straight vertices.
    pub simplify: bool,
    /// Split each processed boundary into convex parts.
    pub convex_split: bool,
    /// Largest staircase, in cells, that simplification may cut off.
    pub simplify_min_dist: f64,
    /// Angular tolerance in radians for straight runs and axis alignment.
    pub angular_eps: f64,
    /// Distance below which two vertices coincide.
    pub eps: f64,
}

impl Default for ContourParams {
    fn default() -> Self {
        Self {
            simplify: true,
            convex_split: false,
            simplify_min_dist: 3.0,
            angular_eps: 1e-3,
            eps: 1e-3,
        }
    }
}

/// A 4-connected set of occupied cells with its boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleRegion {
    pub index: usize,
    /// Occupied cells in row-major order.
    pub cells: Vec<(usize, usize)>,
    /// Exact cell-edge outline: the outer loop (counter-clockwise) followed
    /// by the holes (clockwise).
    pub full_boundary: Vec<Vec<Point2>>,
    /// Outline after simplification, in the same loop order.
    pub boundary: Vec<Vec<Point2>>,
    /// Convex decomposition of `boundary`, if requested and successful.
    pub convex_parts: Option<Vec<Vec<Point2>>>,
    /// Whether the region lies inside a hole of another region.
    pub inverted: bool,
}

impl ObstacleRegion {
    /// Loops that describe the region downstream: the convex parts when
    /// present, the processed boundary otherwise.
    #[must_use]
    pub fn output_loops(&self) -> &[Vec<Point2>] {
        self.convex_parts.as_deref().unwrap_or(&self.boundary)
    }
}

/// Traces the boundaries of all obstacle regions of a grid.
#[derive(Debug, Clone)]
pub struct ContourExtractor {
    params: ContourParams,
}

impl ContourExtractor {
    #[must_use]
    pub fn new(params: ContourParams) -> Self {
        Self { params }
    }

    /// Executes the extraction.
    ///
    /// Regions are numbered in the row-major order of their first cell.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NoObstacles` if no cell is occupied.
    pub fn execute(
        &self,
        grid: &OccupancyGrid,
        reporter: Reporter<'_>,
    ) -> Result<Vec<ObstacleRegion>> {
        let message = "Calculating obstacle contours...";
        reporter.begin(message);

        let labels = label::label_components(grid);
        if labels.components.is_empty() {
            return Err(GeometryError::NoObstacles.into());
        }
        let count = labels.components.len();
        let stride = count.div_ceil(25).max(1);

        let mut regions = Vec::with_capacity(count);
        for (index, cells) in labels.components.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let traced = trace::trace_component(&labels, index as u32);
            regions.push(self.process(index, cells.clone(), traced.loops));

            if (index + 1) % stride == 0 {
                #[allow(clippy::cast_precision_loss)]
                reporter.update((index + 1) as f64 / count as f64, message);
            }
        }

        mark_inverted(&mut regions);

        let vertices: usize = regions
            .iter()
            .flat_map(|r| r.boundary.iter())
            .map(Vec::len)
            .sum();
        tracing::info!(
            "contours: {} regions ({} inverted), {} boundary vertices",
            regions.len(),
            regions.iter().filter(|r| r.inverted).count(),
            vertices
        );
        reporter.end("Obstacle contours calculated.");
        Ok(regions)
    }

    fn process(
        &self,
        index: usize,
        cells: Vec<(usize, usize)>,
        full: Vec<Vec<Point2>>,
    ) -> ObstacleRegion {
        let mut boundary = full.clone();
        if self.params.simplify {
            simplify::simplify_loops(&mut boundary, &self.params);
            boundary.retain(|lp| lp.len() >= 3);
        }

        let convex_parts = if self.params.convex_split {
            let parts = convex::convex_parts(&boundary);
            if parts.is_none() {
                tracing::warn!("region {index}: keeping the unsplit boundary");
            }
            parts
        } else {
            None
        };

        ObstacleRegion {
            index,
            cells,
            full_boundary: full,
            boundary,
            convex_parts,
            inverted: false,
        }
    }
}

/// Flags regions nested inside an odd number of other regions' outlines.
#[allow(clippy::cast_precision_loss)]
fn mark_inverted(regions: &mut [ObstacleRegion]) {
    let depth: Vec<usize> = regions
        .iter()
        .map(|region| {
            let Some(&(x, y)) = region.cells.first() else {
                return 0;
            };
            let probe = Point2::new(x as f64 + 0.5, y as f64 + 0.5);
            regions
                .iter()
                .filter(|other| other.index != region.index)
                .filter_map(|other| other.full_boundary.first())
                .filter(|outer| point_in_loops(&probe, std::slice::from_ref(*outer)))
                .count()
        })
        .collect();

    for (region, d) in regions.iter_mut().zip(depth) {
        region.inverted = d % 2 == 1;
    }
}

/// Builds a unit-step grid from text rows, top row first; `#` marks a
/// colliding cell.
#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_precision_loss)]
pub(crate) fn grid_from_rows(rows: &[&str]) -> OccupancyGrid {
    let height = rows.len();
    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let cells: Vec<Vec<u8>> = rows.iter().rev().map(|r| r.bytes().collect()).collect();
    OccupancyGrid::from_fn(
        GridAxis::new(0.0, width as f64, 1.0),
        GridAxis::new(0.0, height as f64, 1.0),
        |x, y| match cells[y].get(x) {
            Some(b'#') => CellState::Colliding,
            _ => CellState::Free,
        },
    )
    .unwrap()
}
