//! Build workflow: owns every intermediate product and enforces phase order.

use std::io::Write;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::contour::{ContourExtractor, ContourParams, ObstacleRegion};
use crate::error::{InputError, PathsError, Result, WorkflowError};
use crate::export::write_lines2d;
use crate::grid::{classify, GridBuilder, GridParams, OccupancyGrid};
use crate::instrument::{CollisionModel, Kinematics};
use crate::math::Point2;
use crate::path::{
    FormattedPath, Metric, Path, PathFinder, PathFormat, PathParams, PathPostProcessor,
};
use crate::progress::{ProgressFn, Reporter};
use crate::roadmap::{RoadmapBuilder, RoadmapGraph, RoadmapParams};
use crate::segments::{SegmentBuilder, SegmentSet};
use crate::spatial::SpatialIndex;

/// Pipeline position of a [`PathsBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum BuildState {
    #[default]
    Empty,
    GridReady,
    ContoursReady,
    SegmentsReady,
    /// Roadmap and spatial index are built.
    RoadmapReady,
    Complete,
}

/// Options of the segment phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentParams {
    pub merge_collinear: bool,
    pub angular_eps: f64,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            merge_collinear: true,
            angular_eps: 1e-3,
        }
    }
}

/// Runs the planning pipeline and answers path queries.
///
/// Phases must run in order:
/// [`calculate_config_space`](Self::calculate_config_space),
/// [`calculate_wall_contours`](Self::calculate_wall_contours),
/// [`calculate_line_segments`](Self::calculate_line_segments),
/// [`calculate_voronoi`](Self::calculate_voronoi) and
/// [`finish_workflow`](Self::finish_workflow). A phase called from any other
/// state fails with `WorkflowError::OutOfOrder` and leaves the builder
/// untouched. Once complete, the builder can be shared between threads for
/// concurrent [`find_path`](Self::find_path) calls.
pub struct PathsBuilder {
    model: Option<Arc<dyn CollisionModel>>,
    kinematics: Option<Arc<dyn Kinematics>>,

    grid_params: GridParams,
    contour_params: ContourParams,
    segment_params: SegmentParams,
    roadmap_params: RoadmapParams,
    max_threads: usize,

    state: BuildState,
    in_workflow: bool,
    grid: Option<OccupancyGrid>,
    regions: Vec<ObstacleRegion>,
    segments: SegmentSet,
    index: SpatialIndex,
    roadmap: RoadmapGraph,
}

impl Default for PathsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: None,
            kinematics: None,
            grid_params: GridParams::default(),
            contour_params: ContourParams::default(),
            segment_params: SegmentParams::default(),
            roadmap_params: RoadmapParams::default(),
            max_threads: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            state: BuildState::Empty,
            in_workflow: false,
            grid: None,
            regions: Vec::new(),
            segments: SegmentSet::default(),
            index: SpatialIndex::default(),
            roadmap: RoadmapGraph::default(),
        }
    }

    /// Sets the collision model and discards any built data.
    pub fn set_instrument(&mut self, model: Arc<dyn CollisionModel>) {
        self.model = Some(model);
        self.clear();
    }

    /// Sets the kinematics and discards any built data.
    pub fn set_kinematics(&mut self, kinematics: Arc<dyn Kinematics>) {
        self.kinematics = Some(kinematics);
        self.clear();
    }

    pub fn set_grid_params(&mut self, params: GridParams) {
        self.grid_params = params;
    }

    #[must_use]
    pub fn grid_params(&self) -> &GridParams {
        &self.grid_params
    }

    pub fn set_contour_params(&mut self, params: ContourParams) {
        self.contour_params = params;
    }

    pub fn set_segment_params(&mut self, params: SegmentParams) {
        self.segment_params = params;
    }

    pub fn set_roadmap_params(&mut self, params: RoadmapParams) {
        self.roadmap_params = params;
    }

    /// Number of threads used to classify the grid.
    #[must_use]
    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    pub fn set_max_threads(&mut self, threads: usize) {
        self.max_threads = threads.max(1);
    }

    #[must_use]
    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Drops every built product and returns to [`BuildState::Empty`].
    pub fn clear(&mut self) {
        self.state = BuildState::Empty;
        self.grid = None;
        self.regions.clear();
        self.segments = SegmentSet::default();
        self.index = SpatialIndex::default();
        self.roadmap = RoadmapGraph::default();
    }

    /// Opens a bracket: until [`finish_workflow`](Self::finish_workflow),
    /// phases report only progress updates, so `progress` sees one begin and
    /// one end for the whole build.
    pub fn begin_workflow(&mut self, progress: ProgressFn<'_>) {
        Reporter::new(progress, false).begin("Calculating path mesh...");
        self.in_workflow = true;
    }

    /// Marks the build complete and closes an open bracket.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::OutOfOrder` unless the roadmap is built.
    pub fn finish_workflow(&mut self, progress: ProgressFn<'_>) -> Result<()> {
        self.require("finish_workflow", BuildState::RoadmapReady)?;
        self.state = BuildState::Complete;
        if self.in_workflow {
            self.in_workflow = false;
            Reporter::new(progress, false).end("Path mesh calculated.");
        }
        tracing::info!(
            "build complete: {} regions, {} roadmap vertices, {} roadmap edges",
            self.regions.len(),
            self.roadmap.num_vertices(),
            self.roadmap.num_edges()
        );
        Ok(())
    }

    /// Classifies the configuration space.
    ///
    /// # Errors
    ///
    /// - `WorkflowError::OutOfOrder` unless the builder is empty.
    /// - `InputError::UnsetGeometry` / `UnsetKinematics` for missing inputs.
    /// - `InputError::DegenerateRange` for an invalid axis range.
    pub fn calculate_config_space(&mut self, progress: ProgressFn<'_>) -> Result<()> {
        self.require("calculate_config_space", BuildState::Empty)?;
        let model = self.model.as_deref().ok_or(InputError::UnsetGeometry)?;
        let kinematics = self.kinematics.as_deref().ok_or(InputError::UnsetKinematics)?;
        let grid = GridBuilder::new(self.grid_params, self.max_threads)
            .execute(kinematics, model, self.reporter(progress))?;
        self.grid = Some(grid);
        self.state = BuildState::GridReady;
        Ok(())
    }

    /// Traces obstacle regions in the grid.
    ///
    /// # Errors
    ///
    /// - `WorkflowError::OutOfOrder` unless the grid is built.
    /// - `GeometryError::NoObstacles` if no cell is occupied.
    pub fn calculate_wall_contours(&mut self, progress: ProgressFn<'_>) -> Result<()> {
        self.require("calculate_wall_contours", BuildState::GridReady)?;
        let grid = self.built_grid()?;
        let regions =
            ContourExtractor::new(self.contour_params).execute(grid, self.reporter(progress))?;
        self.regions = regions;
        self.state = BuildState::ContoursReady;
        Ok(())
    }

    /// Converts region boundaries to angle-space segments.
    ///
    /// # Errors
    ///
    /// - `WorkflowError::OutOfOrder` unless contours are built.
    /// - `GeometryError::Degenerate` if a region has no usable boundary.
    pub fn calculate_line_segments(&mut self, progress: ProgressFn<'_>) -> Result<()> {
        self.require("calculate_line_segments", BuildState::ContoursReady)?;
        let grid = self.built_grid()?;
        let p = self.segment_params;
        let segments = SegmentBuilder::new(p.merge_collinear, p.angular_eps).execute(
            &self.regions,
            grid,
            self.reporter(progress),
        )?;
        self.segments = segments;
        self.state = BuildState::SegmentsReady;
        Ok(())
    }

    /// Builds the spatial index and the roadmap.
    ///
    /// # Errors
    ///
    /// - `WorkflowError::OutOfOrder` unless segments are built.
    /// - `GeometryError::NumericDegeneracy` if the diagram cannot be built.
    pub fn calculate_voronoi(&mut self, progress: ProgressFn<'_>) -> Result<()> {
        self.require("calculate_voronoi", BuildState::SegmentsReady)?;
        let grid = self.built_grid()?;
        let index = SpatialIndex::build(&self.segments);
        let roadmap = RoadmapBuilder::new(self.roadmap_params).execute(
            &self.segments,
            &index,
            grid,
            self.reporter(progress),
        )?;
        self.index = index;
        self.roadmap = roadmap;
        self.state = BuildState::RoadmapReady;
        Ok(())
    }

    /// Rebuilds only the spatial index from the current segments.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::OutOfOrder` before the segments exist.
    pub fn rebuild_index(&mut self) -> Result<()> {
        if self.state < BuildState::SegmentsReady {
            return Err(self.out_of_order("rebuild_index", BuildState::SegmentsReady));
        }
        self.index = SpatialIndex::build(&self.segments);
        Ok(())
    }

    /// Finds a path between two `(axis1, axis2)` angle pairs in radians.
    ///
    /// # Errors
    ///
    /// - `WorkflowError::NotComplete` before [`finish_workflow`](Self::finish_workflow).
    /// - `PathError` variants for invalid endpoints or disconnected space.
    pub fn find_path(&self, start: Point2, target: Point2, params: &PathParams) -> Result<Path> {
        self.require_complete()?;
        let grid = self.built_grid()?;
        let metric = Metric::with_speeds(self.axis_speeds(params));
        let path = PathFinder::new(&self.roadmap, &self.index, grid, *params)
            .with_metric(metric)
            .find(start, target);
        if let Err(e) = &path {
            tracing::debug!("path query failed: {e}");
        }
        path
    }

    /// Resamples and converts a found path.
    ///
    /// # Errors
    ///
    /// - `WorkflowError::NotComplete` before the build is complete.
    /// - `InputError::InvalidParameter` for a non-positive step.
    /// - `InputError::UnsetGeometry` / `UnsetKinematics` when verification
    ///   is requested without an instrument.
    pub fn path_vertices(&self, path: &Path, format: &PathFormat) -> Result<FormattedPath> {
        self.require_complete()?;
        let processor = PathPostProcessor::new(*format);
        if !format.verify {
            return processor.execute(path, |_| true);
        }
        let model = self.model.as_deref().ok_or(InputError::UnsetGeometry)?;
        let kinematics = self.kinematics.as_deref().ok_or(InputError::UnsetKinematics)?;
        processor.execute(path, |p| !classify(p, kinematics, model).is_occupied())
    }

    #[must_use]
    pub fn grid(&self) -> Option<&OccupancyGrid> {
        self.grid.as_ref()
    }

    #[must_use]
    pub fn regions(&self) -> &[ObstacleRegion] {
        &self.regions
    }

    #[must_use]
    pub fn num_regions(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn region(&self, index: usize) -> Option<&ObstacleRegion> {
        self.regions.get(index)
    }

    #[must_use]
    pub fn is_region_inverted(&self, index: usize) -> bool {
        self.regions.get(index).is_some_and(|r| r.inverted)
    }

    #[must_use]
    pub fn segments(&self) -> &SegmentSet {
        &self.segments
    }

    /// Segments of one region as `[x0, y0, x1, y1]` rows.
    #[must_use]
    pub fn region_segments_as_array(&self, index: usize) -> Vec<[f64; 4]> {
        self.segments.region_segments_as_array(index)
    }

    #[must_use]
    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.index
    }

    #[must_use]
    pub fn roadmap(&self) -> &RoadmapGraph {
        &self.roadmap
    }

    /// Writes the segment mesh as a `lines2d` document.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::OutOfOrder` before the segments exist and
    /// `PathsError::Io` if writing fails.
    pub fn save_to_lines_tool(&self, out: &mut impl Write) -> Result<()> {
        if self.state < BuildState::SegmentsReady {
            return Err(self.out_of_order("save_to_lines_tool", BuildState::SegmentsReady));
        }
        write_lines2d(&self.segments, out)
    }

    fn reporter<'a>(&self, progress: ProgressFn<'a>) -> Reporter<'a> {
        Reporter::new(progress, self.in_workflow)
    }

    fn axis_speeds(&self, params: &PathParams) -> Option<[f64; 2]> {
        if !params.use_axis_speeds {
            return None;
        }
        let kf_fixed = self.kinematics.as_ref().is_none_or(|k| k.kf_fixed());
        self.model.as_ref().and_then(|m| m.axis_speeds(kf_fixed))
    }

    fn built_grid(&self) -> Result<&OccupancyGrid> {
        self.grid
            .as_ref()
            .ok_or_else(|| WorkflowError::NotComplete(self.state).into())
    }

    fn require(&self, phase: &'static str, required: BuildState) -> Result<()> {
        if self.state == required {
            Ok(())
        } else {
            Err(self.out_of_order(phase, required))
        }
    }

    fn require_complete(&self) -> Result<()> {
        if self.state == BuildState::Complete {
            Ok(())
        } else {
            Err(WorkflowError::NotComplete(self.state).into())
        }
    }

    fn out_of_order(&self, phase: &'static str, required: BuildState) -> PathsError {
        tracing::warn!("{phase} called in state {:?}", self.state);
        WorkflowError::OutOfOrder {
            phase,
            required,
            actual: self.state,
        }
        .into()
    }
}
