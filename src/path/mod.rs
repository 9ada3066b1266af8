//! Path queries over a completed roadmap.

mod format;
mod search;

pub use format::{
    subdivide, AngleUnit, FormattedPath, PathFormat, PathPostProcessor, MAX_SUBDIVISION_POINTS,
};

use crate::error::{Endpoint, PathError, Result};
use crate::grid::OccupancyGrid;
use crate::math::Point2;
use crate::roadmap::{Anchor, RoadmapGraph};
use crate::spatial::SpatialIndex;

use search::shortest_route;

/// Edge cost used by the roadmap search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathStrategy {
    /// Minimise travelled length.
    #[default]
    Shortest,
    /// Divide each length by its clearance, trading length for distance
    /// from obstacles.
    PenalizeWalls,
}

/// Options for a path query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathParams {
    pub strategy: PathStrategy,
    /// Measure lengths as travel time using the instrument's axis speeds.
    pub use_axis_speeds: bool,
    /// Tolerance of the visibility checks; also the smallest clearance
    /// used by [`PathStrategy::PenalizeWalls`].
    pub eps: f64,
}

impl Default for PathParams {
    fn default() -> Self {
        Self {
            strategy: PathStrategy::Shortest,
            use_axis_speeds: false,
            eps: 1e-3,
        }
    }
}

/// Length measure in angle space.
///
/// Without speeds this is the Euclidean distance; with speeds `(v1, v2)` it
/// is the travel time `|(dx / v1, dy / v2)|`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metric {
    speeds: Option<[f64; 2]>,
}

impl Metric {
    #[must_use]
    pub fn euclidean() -> Self {
        Self { speeds: None }
    }

    /// Travel-time metric; non-positive speeds fall back to Euclidean.
    #[must_use]
    pub fn with_speeds(speeds: Option<[f64; 2]>) -> Self {
        Self {
            speeds: speeds.filter(|[v1, v2]| *v1 > 0.0 && *v2 > 0.0),
        }
    }

    #[must_use]
    pub fn distance(&self, a: &Point2, b: &Point2) -> f64 {
        let d = b - a;
        match self.speeds {
            Some([v1, v2]) => (d.x / v1).hypot(d.y / v2),
            None => d.norm(),
        }
    }

    /// Summed length of a polyline.
    #[must_use]
    pub fn length(&self, points: &[Point2]) -> f64 {
        points.windows(2).map(|w| self.distance(&w[0], &w[1])).sum()
    }
}

/// A found path in angle space.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Polyline from start to target; consecutive points are distinct.
    pub points: Vec<Point2>,
    /// Length under the query's metric.
    pub length: f64,
    /// Value of the strategy's cost function.
    pub cost: f64,
    /// Metric the path was measured with.
    pub metric: Metric,
}

impl Path {
    #[must_use]
    pub fn start(&self) -> Option<&Point2> {
        self.points.first()
    }

    #[must_use]
    pub fn target(&self) -> Option<&Point2> {
        self.points.last()
    }
}

/// A way into or out of the graph: the vertex reached, the cost of
/// getting there from the query point and the polyline walked.
struct Portal {
    vertex: usize,
    cost: f64,
    points: Vec<Point2>,
}

/// Finds paths between free angle pairs over a roadmap.
pub struct PathFinder<'a> {
    graph: &'a RoadmapGraph,
    index: &'a SpatialIndex,
    grid: &'a OccupancyGrid,
    params: PathParams,
    metric: Metric,
}

impl<'a> PathFinder<'a> {
    #[must_use]
    pub fn new(
        graph: &'a RoadmapGraph,
        index: &'a SpatialIndex,
        grid: &'a OccupancyGrid,
        params: PathParams,
    ) -> Self {
        Self {
            graph,
            index,
            grid,
            params,
            metric: Metric::euclidean(),
        }
    }

    /// Sets the metric used for lengths and costs.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Finds the cheapest path from `start` to `target`.
    ///
    /// # Errors
    ///
    /// - `PathError::OutOfBounds` / `InsideObstacle` for an invalid endpoint.
    /// - `PathError::NoRoadmap` if the roadmap has no edges.
    /// - `PathError::Unreachable` if an endpoint sees no roadmap point.
    /// - `PathError::NoPath` if the endpoints lie in disconnected free space.
    pub fn find(&self, start: Point2, target: Point2) -> Result<Path> {
        self.check_endpoint(&start, Endpoint::Start)?;
        self.check_endpoint(&target, Endpoint::Target)?;

        if start == target {
            return Ok(Path {
                points: vec![start],
                length: 0.0,
                cost: 0.0,
                metric: self.metric,
            });
        }
        if self.graph.is_empty() {
            return Err(PathError::NoRoadmap.into());
        }

        let start_anchor = self.snap(&start, Endpoint::Start)?;
        let target_anchor = self.snap(&target, Endpoint::Target)?;
        let entries = self.portals(&start, &start_anchor, false);
        let exits = self.portals(&target, &target_anchor, true);

        let weights: Vec<f64> = self
            .graph
            .edges()
            .iter()
            .map(|e| self.cost(self.metric.length(&e.points), e.clearance))
            .collect();
        let sources: Vec<(usize, f64)> = entries.iter().map(|p| (p.vertex, p.cost)).collect();
        let targets: Vec<(usize, f64)> = exits.iter().map(|p| (p.vertex, p.cost)).collect();
        let route = shortest_route(self.graph, &weights, &sources, &targets);

        let direct = (start_anchor.edge == target_anchor.edge)
            .then(|| self.along_edge(&start, &start_anchor, &target, &target_anchor));

        let (cost, mut points) = match (route, direct) {
            (Some(route), Some((direct_cost, direct_points))) if direct_cost <= route.cost => {
                (direct_cost, direct_points)
            }
            (None, Some((direct_cost, direct_points))) => (direct_cost, direct_points),
            (Some(route), _) => {
                let entry = pick_portal(&entries, route.source);
                let exit = pick_portal(&exits, route.last_vertex());
                let mut points = vec![start];
                points.extend_from_slice(&entry.points);
                let mut at = route.source;
                for &(e, next) in &route.steps {
                    let edge = &self.graph.edges()[e];
                    if edge.from == at {
                        points.extend(edge.points.iter().copied());
                    } else {
                        points.extend(edge.points.iter().rev().copied());
                    }
                    at = next;
                }
                points.extend_from_slice(&exit.points);
                points.push(target);
                (route.cost, points)
            }
            (None, None) => {
                tracing::debug!("no path between {start:?} and {target:?}");
                return Err(PathError::NoPath.into());
            }
        };

        points.dedup_by(|b, a| self.metric.distance(a, b) <= f64::EPSILON);
        let length = self.metric.length(&points);
        tracing::debug!(
            "path with {} points, length {length:.4}, cost {cost:.4}",
            points.len()
        );
        Ok(Path {
            points,
            length,
            cost,
            metric: self.metric,
        })
    }

    fn check_endpoint(&self, p: &Point2, which: Endpoint) -> Result<()> {
        if !self.grid.bounds().contains(p) {
            return Err(PathError::OutOfBounds { which }.into());
        }
        let occupied = self.grid.state_at(p).is_some_and(|s| s.is_occupied());
        if occupied || self.index.region_at(p).is_some() {
            return Err(PathError::InsideObstacle { which }.into());
        }
        Ok(())
    }

    fn snap(&self, p: &Point2, which: Endpoint) -> Result<Anchor> {
        let eps = self.params.eps;
        self.graph
            .nearest_anchor(p, |q| !self.index.intersects_segment(p, q, eps))
            .ok_or_else(|| PathError::Unreachable { which }.into())
    }

    fn cost(&self, length: f64, clearance: f64) -> f64 {
        match self.params.strategy {
            PathStrategy::Shortest => length,
            PathStrategy::PenalizeWalls => length / clearance.max(self.params.eps),
        }
    }

    /// Cost of the straight connector between a query point and its anchor.
    fn connector_cost(&self, p: &Point2, anchor: &Point2) -> f64 {
        let mid = Point2::from((p.coords + anchor.coords) * 0.5);
        let clearance = [p, anchor, &mid]
            .into_iter()
            .map(|q| self.index.clearance(q))
            .fold(f64::INFINITY, f64::min);
        self.cost(self.metric.distance(p, anchor), clearance)
    }

    /// Both ways from an anchor to the ends of its edge. Entry polylines
    /// run anchor to vertex; exit polylines (`reverse`) vertex to anchor.
    fn portals(&self, p: &Point2, anchor: &Anchor, reverse: bool) -> Vec<Portal> {
        let edge = &self.graph.edges()[anchor.edge];
        let connector = self.connector_cost(p, &anchor.position);
        let mut to_from: Vec<Point2> = edge.points[..=anchor.index].to_vec();
        let mut to_to: Vec<Point2> = edge.points[anchor.index..].to_vec();
        if reverse {
            to_to.reverse();
        } else {
            to_from.reverse();
        }
        [(edge.from, to_from), (edge.to, to_to)]
            .into_iter()
            .map(|(vertex, points)| Portal {
                vertex,
                cost: connector + self.cost(self.metric.length(&points), edge.clearance),
                points,
            })
            .collect()
    }

    /// Route that stays on the single edge both anchors lie on.
    fn along_edge(
        &self,
        start: &Point2,
        from: &Anchor,
        target: &Point2,
        to: &Anchor,
    ) -> (f64, Vec<Point2>) {
        let edge = &self.graph.edges()[from.edge];
        let (lo, hi) = (from.index.min(to.index), from.index.max(to.index));
        let mut middle = edge.points[lo..=hi].to_vec();
        if from.index > to.index {
            middle.reverse();
        }
        let cost = self.connector_cost(start, &from.position)
            + self.cost(self.metric.length(&middle), edge.clearance)
            + self.connector_cost(target, &to.position);
        let mut points = Vec::with_capacity(middle.len() + 2);
        points.push(*start);
        points.extend(middle);
        points.push(*target);
        (cost, points)
    }
}

fn pick_portal(portals: &[Portal], vertex: usize) -> &Portal {
    portals
        .iter()
        .filter(|p| p.vertex == vertex)
        .min_by(|a, b| a.cost.total_cmp(&b.cost))
        .unwrap_or(&portals[0])
}
