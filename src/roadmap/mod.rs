//! Generalised Voronoi roadmap over the obstacle segments.
//!
//! The segments are sampled densely, the samples are triangulated, and the
//! dual Voronoi edges separating samples of different boundary loops form
//! the roadmap. Edges that leave the grid, enter an obstacle or touch a
//! segment are discarded.

mod graph;
mod sites;

pub use graph::{Anchor, RoadmapEdge, RoadmapGraph};

use spade::{DelaunayTriangulation, Triangulation};

use crate::error::{GeometryError, Result};
use crate::grid::OccupancyGrid;
use crate::math::distance_2d::point_to_segment_dist;
use crate::math::Point2;
use crate::progress::Reporter;
use crate::segments::SegmentSet;
use crate::spatial::SpatialIndex;

use sites::{prepare_segments, sample_sites, Quantizer, Site};

/// Shape of the roadmap edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoronoiBackend {
    /// Every straight Voronoi edge is a graph edge.
    Lines,
    /// Chains through degree-2 vertices are merged into polyline edges that
    /// follow the curved bisectors.
    #[default]
    Curved,
}

/// Tuning knobs of the roadmap builder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadmapParams {
    /// Ignore Voronoi edges between two parts of the same boundary loop.
    pub group_lines: bool,
    pub backend: VoronoiBackend,
    /// Geometric tolerance in angle units; also fixes the snapping grid.
    pub eps: f64,
    /// Relative deviation allowed when thinning curved edges: an interior
    /// point is dropped only if it lies within `edge_eps` times its
    /// clearance of the shortened chord, and the chord touches no segment.
    pub edge_eps: f64,
    /// Distance between samples along a segment, in grid cells.
    pub site_spacing: f64,
}

impl Default for RoadmapParams {
    fn default() -> Self {
        Self {
            group_lines: true,
            backend: VoronoiBackend::Curved,
            eps: 1e-3,
            edge_eps: 1e-2,
            site_spacing: 0.5,
        }
    }
}

/// Builds the [`RoadmapGraph`] of a segment set.
#[derive(Debug, Clone)]
pub struct RoadmapBuilder {
    params: RoadmapParams,
}

impl RoadmapBuilder {
    #[must_use]
    pub fn new(params: RoadmapParams) -> Self {
        Self { params }
    }

    /// Executes the construction.
    ///
    /// `index` must have been built from `set`; `grid` supplies the frame
    /// and the sampling resolution.
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidParameter` for non-positive tolerances or
    /// an `eps` too fine to snap coordinates of the grid's extent, and
    /// `GeometryError::NumericDegeneracy` if the triangulation fails.
    pub fn execute(
        &self,
        set: &SegmentSet,
        index: &SpatialIndex,
        grid: &OccupancyGrid,
        reporter: Reporter<'_>,
    ) -> Result<RoadmapGraph> {
        let p = &self.params;
        if !(p.eps > 0.0 && p.edge_eps > 0.0 && p.site_spacing > 0.0) {
            return Err(crate::error::InputError::InvalidParameter(format!(
                "roadmap tolerances must be positive: {p:?}"
            ))
            .into());
        }
        let message = "Calculating Voronoi diagram...";
        reporter.begin(message);

        let q = Quantizer::new(p.eps);
        let bounds = grid.bounds();
        if !q.covers(&bounds) {
            return Err(crate::error::InputError::InvalidParameter(format!(
                "roadmap eps {} is too fine for the configuration space",
                p.eps
            ))
            .into());
        }
        let segments = prepare_segments(set, &bounds, q);
        let sites = sample_sites(&segments, p.site_spacing * grid.min_step(), q);
        tracing::debug!(
            "triangulating {} sites of {} segments",
            sites.len(),
            segments.len()
        );

        let dt: DelaunayTriangulation<Site> = DelaunayTriangulation::bulk_load(sites)
            .map_err(|e| GeometryError::NumericDegeneracy(format!("triangulation: {e}")))?;
        reporter.update(0.5, message);

        let (vertices, fine_edges) = self.voronoi_edges(&dt, index, grid);
        let graph = match p.backend {
            VoronoiBackend::Lines => lines_graph(vertices, &fine_edges, index),
            VoronoiBackend::Curved => curved_graph(&vertices, &fine_edges, index, p),
        };

        tracing::info!(
            "roadmap: {} vertices, {} edges",
            graph.num_vertices(),
            graph.num_edges()
        );
        reporter.end("Voronoi diagram calculated.");
        Ok(graph)
    }

    /// Returns the kept Voronoi vertices and the straight edges between
    /// them, sorted and without duplicates.
    fn voronoi_edges(
        &self,
        dt: &DelaunayTriangulation<Site>,
        index: &SpatialIndex,
        grid: &OccupancyGrid,
    ) -> (Vec<Point2>, Vec<(usize, usize)>) {
        let eps = self.params.eps;
        let faces = dt.num_all_faces();
        let mut centre = vec![Point2::origin(); faces];
        for face in dt.inner_faces() {
            let c = face.circumcenter();
            centre[face.fix().index()] = Point2::new(c.x, c.y);
        }

        // Cocircular sites give several faces with the same circumcentre;
        // merge them into one vertex.
        let mut roots = UnionFind::new(faces);
        for edge in dt.undirected_edges() {
            let d = edge.as_directed();
            if let (Some(a), Some(b)) = (d.face().as_inner(), d.rev().face().as_inner()) {
                let (a, b) = (a.fix().index(), b.fix().index());
                if (centre[a] - centre[b]).norm() <= eps {
                    roots.union(a, b);
                }
            }
        }

        let frame = grid.bounds();
        let mut usable = vec![None::<bool>; faces];
        let mut is_usable = |face: usize, roots: &mut UnionFind| -> Option<usize> {
            let r = roots.find(face);
            let ok = *usable[r].get_or_insert_with(|| {
                let c = centre[r];
                let inside_frame = c.x >= frame.min.x - eps
                    && c.x <= frame.max.x + eps
                    && c.y >= frame.min.y - eps
                    && c.y <= frame.max.y + eps;
                inside_frame && index.region_at(&c).is_none()
            });
            ok.then_some(r)
        };

        let mut pairs: Vec<(usize, usize)> = Vec::new();
        for edge in dt.undirected_edges() {
            let [s, t] = edge.vertices().map(|v| *v.data());
            if s.segment == t.segment {
                continue;
            }
            if self.params.group_lines && s.group.is_some() && s.group == t.group {
                continue;
            }
            let d = edge.as_directed();
            let (Some(a), Some(b)) = (d.face().as_inner(), d.rev().face().as_inner()) else {
                continue;
            };
            let (Some(ra), Some(rb)) = (
                is_usable(a.fix().index(), &mut roots),
                is_usable(b.fix().index(), &mut roots),
            ) else {
                continue;
            };
            if ra == rb || index.intersects_segment(&centre[ra], &centre[rb], eps) {
                continue;
            }
            pairs.push((ra.min(rb), ra.max(rb)));
        }
        pairs.sort_unstable();
        pairs.dedup();

        // Renumber the face roots that carry an edge, in edge order.
        let mut ids = vec![usize::MAX; faces];
        let mut vertices = Vec::new();
        let mut id_of = |root: usize, vertices: &mut Vec<Point2>| {
            if ids[root] == usize::MAX {
                ids[root] = vertices.len();
                vertices.push(centre[root]);
            }
            ids[root]
        };
        let edges = pairs
            .into_iter()
            .map(|(a, b)| (id_of(a, &mut vertices), id_of(b, &mut vertices)))
            .collect();
        (vertices, edges)
    }
}

fn edge_clearance(points: &[Point2], index: &SpatialIndex) -> f64 {
    let vertices = points.iter().map(|p| index.clearance(p));
    let midpoints = points
        .windows(2)
        .map(|w| index.clearance(&nalgebra::center(&w[0], &w[1])));
    vertices.chain(midpoints).fold(f64::INFINITY, f64::min)
}

fn polyline_length(points: &[Point2]) -> f64 {
    points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

fn lines_graph(
    vertices: Vec<Point2>,
    edges: &[(usize, usize)],
    index: &SpatialIndex,
) -> RoadmapGraph {
    let edges = edges
        .iter()
        .map(|&(from, to)| {
            let points = vec![vertices[from], vertices[to]];
            RoadmapEdge {
                from,
                to,
                length: polyline_length(&points),
                clearance: edge_clearance(&points, index),
                points,
            }
        })
        .collect();
    RoadmapGraph::new(vertices, edges)
}

/// Contracts every chain of degree-2 vertices into a single polyline edge.
fn curved_graph(
    vertices: &[Point2],
    edges: &[(usize, usize)],
    index: &SpatialIndex,
    params: &RoadmapParams,
) -> RoadmapGraph {
    let n = vertices.len();
    let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    for (e, &(a, b)) in edges.iter().enumerate() {
        adjacency[a].push((b, e));
        adjacency[b].push((a, e));
    }

    // Junctions survive; a pure cycle keeps its lowest vertex.
    let mut junction: Vec<bool> = adjacency.iter().map(|adj| adj.len() != 2).collect();
    let mut used = vec![false; edges.len()];
    let mut chains: Vec<Vec<usize>> = Vec::new();
    for v in 0..n {
        if !junction[v] {
            continue;
        }
        for &first in &adjacency[v] {
            if !used[first.1] {
                chains.push(walk_chain(&adjacency, &junction, v, first, &mut used));
            }
        }
    }
    for v in 0..n {
        if let Some(&first) = adjacency[v].iter().find(|&&(_, e)| !used[e]) {
            junction[v] = true;
            chains.push(walk_chain(&adjacency, &junction, v, first, &mut used));
        }
    }

    let mut ids = vec![usize::MAX; n];
    let mut kept = Vec::new();
    for (v, &is_junction) in junction.iter().enumerate() {
        if is_junction && !adjacency[v].is_empty() {
            ids[v] = kept.len();
            kept.push(vertices[v]);
        }
    }

    let out_edges = chains
        .into_iter()
        .filter_map(|chain| {
            let (&first, &last) = (chain.first()?, chain.last()?);
            let full: Vec<Point2> = chain.iter().map(|&v| vertices[v]).collect();
            let points = thin_chain(&full, index, params.edge_eps, params.eps);
            Some(RoadmapEdge {
                from: ids[first],
                to: ids[last],
                length: polyline_length(&points),
                clearance: edge_clearance(&points, index),
                points,
            })
        })
        .filter(|e| e.from != e.to || e.points.len() > 3)
        .collect();
    RoadmapGraph::new(kept, out_edges)
}

/// Follows degree-2 vertices from `start` until the next junction.
fn walk_chain(
    adjacency: &[Vec<(usize, usize)>],
    junction: &[bool],
    start: usize,
    (mut cur, mut e): (usize, usize),
    used: &mut [bool],
) -> Vec<usize> {
    let mut chain = vec![start];
    loop {
        used[e] = true;
        chain.push(cur);
        if junction[cur] || cur == start {
            break;
        }
        match adjacency[cur].iter().find(|&&(_, ne)| ne != e) {
            Some(&(next, ne)) => (cur, e) = (next, ne),
            None => break,
        }
    }
    chain
}

/// Greedily replaces runs of chain points by chords.
///
/// A chord is taken only while it touches no segment and every point it
/// skips lies within `edge_eps` times that point's clearance of it, so the
/// thinned edge stays inside the free corridor the chain runs through.
fn thin_chain(points: &[Point2], index: &SpatialIndex, edge_eps: f64, eps: f64) -> Vec<Point2> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let clearance: Vec<f64> = points.iter().map(|p| index.clearance(p)).collect();
    let chord_fits = |from: usize, to: usize| {
        let (a, b) = (&points[from], &points[to]);
        (from + 1..to)
            .all(|k| point_to_segment_dist(&points[k], a, b) <= edge_eps * clearance[k])
            && !index.intersects_segment(a, b, eps)
    };

    let mut out = vec![points[0]];
    let mut anchor = 0;
    while anchor + 1 < points.len() {
        let mut next = anchor + 1;
        while next + 1 < points.len() && chord_fits(anchor, next + 1) {
            next += 1;
        }
        out.push(points[next]);
        anchor = next;
    }
    out
}

/// Disjoint-set forest with path halving.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Joins two sets; the smaller root becomes the representative.
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = (ra.min(rb), ra.max(rb));
            self.parent[hi] = lo;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::grid::{CellState, GridAxis};
    use crate::math::intersect_2d::segments_cross_properly;
    use crate::progress::ignore_progress;
    use crate::segments::FillRule;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2> {
        vec![p(x0, y0), p(x1, y0), p(x1, y1), p(x0, y1)]
    }

    fn grid() -> OccupancyGrid {
        OccupancyGrid::from_fn(
            GridAxis::new(0.0, 10.0, 0.5),
            GridAxis::new(0.0, 6.0, 0.5),
            |_, _| CellState::Free,
        )
        .unwrap()
    }

    fn build(set: &SegmentSet, backend: VoronoiBackend) -> RoadmapGraph {
        let index = SpatialIndex::build(set);
        let params = RoadmapParams {
            backend,
            ..RoadmapParams::default()
        };
        RoadmapBuilder::new(params)
            .execute(set, &index, &grid(), Reporter::new(&ignore_progress, false))
            .unwrap()
    }

    fn two_blocks() -> SegmentSet {
        let mut set = SegmentSet::default();
        set.push_region(vec![square(2.0, 2.0, 4.0, 4.0)], FillRule::EvenOdd, false);
        set.push_region(vec![square(6.0, 2.0, 8.0, 4.0)], FillRule::EvenOdd, false);
        set
    }

    #[test]
    fn roadmap_stays_in_free_space() {
        let set = two_blocks();
        let index = SpatialIndex::build(&set);
        for backend in [VoronoiBackend::Lines, VoronoiBackend::Curved] {
            let graph = build(&set, backend);
            assert!(!graph.is_empty());
            for edge in graph.edges() {
                for w in edge.points.windows(2) {
                    assert!(index.region_at(&w[0]).is_none());
                    assert!(!index.intersects_segment(&w[0], &w[1], 1e-9));
                }
                assert!(edge.clearance > 0.0);
            }
        }
    }

    #[test]
    fn corridor_between_blocks_is_on_the_bisector() {
        let graph = build(&two_blocks(), VoronoiBackend::Lines);
        let mid = graph
            .vertices()
            .iter()
            .filter(|v| v.y > 2.5 && v.y < 3.5 && v.x > 4.5 && v.x < 5.5)
            .count();
        assert!(mid > 0);
        assert!(graph
            .vertices()
            .iter()
            .filter(|v| v.y > 2.2 && v.y < 3.8 && v.x > 4.0 && v.x < 6.0)
            .all(|v| (v.x - 5.0).abs() < 0.05));
    }

    #[test]
    fn edges_do_not_cross() {
        let graph = build(&two_blocks(), VoronoiBackend::Lines);
        let edges = graph.edges();
        for (i, a) in edges.iter().enumerate() {
            for b in &edges[i + 1..] {
                assert!(!segments_cross_properly(
                    &a.points[0],
                    &a.points[1],
                    &b.points[0],
                    &b.points[1],
                    1e-12
                ));
            }
        }
    }

    #[test]
    fn curved_backend_contracts_chains() {
        let set = two_blocks();
        let lines = build(&set, VoronoiBackend::Lines);
        let curved = build(&set, VoronoiBackend::Curved);
        assert!(curved.num_vertices() < lines.num_vertices());
        assert!(curved.edges().iter().any(|e| e.points.len() > 2));
        let total = |g: &RoadmapGraph| g.edges().iter().map(|e| e.length).sum::<f64>();
        assert!(total(&curved) <= total(&lines) + 1e-9);
    }

    #[test]
    fn construction_is_deterministic() {
        let set = two_blocks();
        let a = build(&set, VoronoiBackend::Curved);
        let b = build(&set, VoronoiBackend::Curved);
        assert_eq!(a.vertices(), b.vertices());
        assert_eq!(a.edges(), b.edges());
    }

    /// Two zigzag walls leaving a narrow winding corridor between them.
    fn zigzag_corridor() -> (SegmentSet, OccupancyGrid) {
        let crest = |x: i32| if (x / 2) % 2 == 0 { 0.0 } else { 2.0 };
        let xs: Vec<i32> = (0..=40).step_by(2).collect();
        let mut lower = vec![p(0.0, 0.0), p(40.0, 0.0)];
        lower.extend(xs.iter().rev().map(|&x| p(f64::from(x), crest(x) + 1.0)));
        let mut upper: Vec<Point2> = xs.iter().map(|&x| p(f64::from(x), crest(x) + 2.0)).collect();
        upper.extend([p(40.0, 6.0), p(0.0, 6.0)]);

        let mut set = SegmentSet::default();
        set.push_region(vec![lower], FillRule::EvenOdd, false);
        set.push_region(vec![upper], FillRule::EvenOdd, false);
        let grid = OccupancyGrid::from_fn(
            GridAxis::new(-1.0, 41.0, 0.25),
            GridAxis::new(-1.0, 7.0, 0.25),
            |_, _| CellState::Free,
        )
        .unwrap();
        (set, grid)
    }

    #[test]
    fn winding_corridor_edges_stay_clear_and_planar() {
        let (set, grid) = zigzag_corridor();
        let index = SpatialIndex::build(&set);
        for backend in [VoronoiBackend::Lines, VoronoiBackend::Curved] {
            let params = RoadmapParams {
                backend,
                ..RoadmapParams::default()
            };
            let graph = RoadmapBuilder::new(params)
                .execute(&set, &index, &grid, Reporter::new(&ignore_progress, false))
                .unwrap();
            let pieces: Vec<(usize, Point2, Point2)> = graph
                .edges()
                .iter()
                .enumerate()
                .flat_map(|(e, edge)| edge.points.windows(2).map(move |w| (e, w[0], w[1])))
                .collect();
            // The corridor centre line is part of the roadmap.
            assert!(pieces.iter().any(|(_, a, b)| {
                a.x.min(b.x) <= 21.0
                    && a.x.max(b.x) >= 21.0
                    && a.y.min(b.y) > 1.0
                    && a.y.max(b.y) < 4.5
            }));
            for (i, (ea, a0, a1)) in pieces.iter().enumerate() {
                assert!(index.region_at(a0).is_none(), "{backend:?}: {a0:?}");
                assert!(
                    !index.intersects_segment(a0, a1, 1e-9),
                    "{backend:?}: {a0:?} -> {a1:?} crosses a wall"
                );
                for (eb, b0, b1) in &pieces[i + 1..] {
                    assert!(
                        ea == eb || !segments_cross_properly(a0, a1, b0, b1, 1e-12),
                        "{backend:?}: edges {ea} and {eb} cross"
                    );
                }
            }
        }
    }

    #[test]
    fn thinning_keeps_bends_and_drops_straight_runs() {
        let index = SpatialIndex::build(&two_blocks());
        let chain = [p(5.0, 1.0), p(5.0, 2.0), p(5.0, 3.0), p(5.0, 4.5), p(7.0, 4.5)];
        let thin = thin_chain(&chain, &index, 1e-2, 1e-3);
        assert_eq!(thin, vec![p(5.0, 1.0), p(5.0, 4.5), p(7.0, 4.5)]);
    }

    #[test]
    fn too_fine_eps_is_rejected() {
        let set = two_blocks();
        let index = SpatialIndex::build(&set);
        let params = RoadmapParams {
            eps: 1e-9,
            ..RoadmapParams::default()
        };
        let err = RoadmapBuilder::new(params)
            .execute(&set, &index, &grid(), Reporter::new(&ignore_progress, false))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::DegenerateRange);
    }
}
