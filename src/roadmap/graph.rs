use crate::math::Point2;
use crate::spatial::{Aabb, Bvh};

/// One roadmap edge: a polyline between two graph vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadmapEdge {
    pub from: usize,
    pub to: usize,
    /// Polyline from `vertices[from]` to `vertices[to]`, both included.
    pub points: Vec<Point2>,
    /// Euclidean length of the polyline in angle units.
    pub length: f64,
    /// Smallest distance to an obstacle along the edge.
    pub clearance: f64,
}

impl RoadmapEdge {
    /// The endpoint opposite to `vertex`.
    #[must_use]
    pub fn other(&self, vertex: usize) -> usize {
        if self.from == vertex {
            self.to
        } else {
            self.from
        }
    }
}

/// A point of an edge polyline, used to attach free positions to the graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub edge: usize,
    /// Index into the edge's `points`.
    pub index: usize,
    pub position: Point2,
}

/// Planar roadmap graph with an index over its edge polylines.
///
/// Adjacency lists are sorted by neighbour and edge index, which fixes the
/// order in which searches relax edges.
#[derive(Debug, Clone, Default)]
pub struct RoadmapGraph {
    vertices: Vec<Point2>,
    edges: Vec<RoadmapEdge>,
    adjacency: Vec<Vec<(usize, usize)>>,
    anchors: Vec<(usize, usize)>,
    bvh: Bvh,
}

impl RoadmapGraph {
    /// Assembles a graph; edge endpoints must index into `vertices`.
    #[must_use]
    pub fn new(vertices: Vec<Point2>, edges: Vec<RoadmapEdge>) -> Self {
        let mut adjacency = vec![Vec::new(); vertices.len()];
        for (e, edge) in edges.iter().enumerate() {
            adjacency[edge.from].push((edge.to, e));
            adjacency[edge.to].push((edge.from, e));
        }
        for list in &mut adjacency {
            list.sort_unstable();
        }

        let anchors: Vec<(usize, usize)> = edges
            .iter()
            .enumerate()
            .flat_map(|(e, edge)| (0..edge.points.len()).map(move |k| (e, k)))
            .collect();
        let bounds: Vec<Aabb> = anchors
            .iter()
            .map(|&(e, k)| {
                let p = edges[e].points[k];
                Aabb::new(p, p)
            })
            .collect();

        Self {
            vertices,
            edges,
            adjacency,
            anchors,
            bvh: Bvh::build(&bounds),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point2] {
        &self.vertices
    }

    #[must_use]
    pub fn vertex(&self, index: usize) -> Option<&Point2> {
        self.vertices.get(index)
    }

    #[must_use]
    pub fn edges(&self) -> &[RoadmapEdge] {
        &self.edges
    }

    #[must_use]
    pub fn edge(&self, index: usize) -> Option<&RoadmapEdge> {
        self.edges.get(index)
    }

    /// `(neighbour, edge)` pairs of a vertex, sorted.
    #[must_use]
    pub fn neighbours(&self, vertex: usize) -> &[(usize, usize)] {
        self.adjacency.get(vertex).map_or(&[], Vec::as_slice)
    }

    /// Nearest edge polyline point to `p` for which `accept` holds.
    pub fn nearest_anchor(
        &self,
        p: &Point2,
        mut accept: impl FnMut(&Point2) -> bool,
    ) -> Option<Anchor> {
        let position = |i: usize| {
            let (e, k) = self.anchors[i];
            self.edges[e].points[k]
        };
        self.bvh
            .nearest_matching(p, |i| (position(i) - p).norm(), |i, _| accept(&position(i)))
            .map(|(i, _)| {
                let (edge, index) = self.anchors[i];
                Anchor {
                    edge,
                    index,
                    position: position(i),
                }
            })
    }

    /// Labels connected components; returns one label per vertex.
    #[must_use]
    pub fn components(&self) -> Vec<usize> {
        let mut label = vec![usize::MAX; self.vertices.len()];
        let mut next = 0;
        let mut stack = Vec::new();
        for start in 0..self.vertices.len() {
            if label[start] != usize::MAX {
                continue;
            }
            label[start] = next;
            stack.push(start);
            while let Some(v) = stack.pop() {
                for &(n, _) in &self.adjacency[v] {
                    if label[n] == usize::MAX {
                        label[n] = next;
                        stack.push(n);
                    }
                }
            }
            next += 1;
        }
        label
    }
}
