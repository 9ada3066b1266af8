use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::math::distance_2d::point_to_box_dist_sq;
use crate::math::Point2;

/// Maximum number of items stored in a leaf.
const LEAF_SIZE: usize = 4;

/// Axis-aligned bounding box in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point2,
    pub max: Point2,
}

impl Aabb {
    #[must_use]
    pub fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    /// An inverted box that any union will replace.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point2::new(f64::INFINITY, f64::INFINITY),
            max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    #[must_use]
    pub fn from_points(points: &[Point2]) -> Self {
        points.iter().fold(Self::empty(), |b, p| b.including(p))
    }

    #[must_use]
    pub fn from_segment(a: &Point2, b: &Point2) -> Self {
        Self::new(
            Point2::new(a.x.min(b.x), a.y.min(b.y)),
            Point2::new(a.x.max(b.x), a.y.max(b.y)),
        )
    }

    #[must_use]
    pub fn including(&self, p: &Point2) -> Self {
        Self::new(
            Point2::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            Point2::new(self.max.x.max(p.x), self.max.y.max(p.y)),
        )
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }

    /// Closed-interval overlap test.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    #[must_use]
    pub fn contains(&self, p: &Point2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    #[must_use]
    pub fn centroid(&self) -> Point2 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Half perimeter, the 2D analogue of surface area for split costs.
    #[must_use]
    pub fn half_perimeter(&self) -> f64 {
        (self.max.x - self.min.x).max(0.0) + (self.max.y - self.min.y).max(0.0)
    }

    /// Squared distance from `p` to the box; zero inside.
    #[must_use]
    pub fn dist_sq(&self, p: &Point2) -> f64 {
        point_to_box_dist_sq(p, &self.min, &self.max)
    }
}

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    Leaf { first: usize, count: usize },
    Branch { left: usize, right: usize },
}

#[derive(Debug, Clone, Copy)]
struct Node {
    bounds: Aabb,
    kind: NodeKind,
}

/// Flat bounding-volume hierarchy over item indices.
///
/// Built top-down with a surface-area split: along the axis of largest
/// centroid spread, every split position `k` of the sorted items is scored
/// as `hp(L_k) * k + hp(R_k) * (n - k)` using prefix and suffix boxes.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<Node>,
    items: Vec<usize>,
}

impl Bvh {
    /// Builds the hierarchy over `bounds`; item `i` is identified by its index.
    #[must_use]
    pub fn build(bounds: &[Aabb]) -> Self {
        let mut bvh = Self {
            nodes: Vec::with_capacity(bounds.len().max(1) * 2 / LEAF_SIZE + 1),
            items: (0..bounds.len()).collect(),
        };
        if !bounds.is_empty() {
            let mut items = std::mem::take(&mut bvh.items);
            build_node(&mut bvh.nodes, &mut items, 0, bounds);
            bvh.items = items;
        }
        bvh
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Calls `f` for every item whose box overlaps `query`, in tree order.
    pub fn visit_overlapping(&self, query: &Aabb, mut f: impl FnMut(usize)) {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = vec![0usize];
        while let Some(n) = stack.pop() {
            let node = &self.nodes[n];
            if !node.bounds.intersects(query) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { first, count } => {
                    for &item in &self.items[first..first + count] {
                        f(item);
                    }
                }
                NodeKind::Branch { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
    }

    /// Returns `true` as soon as `pred` holds for an item overlapping `query`.
    pub fn any_overlapping(&self, query: &Aabb, mut pred: impl FnMut(usize) -> bool) -> bool {
        let mut found = false;
        self.visit_overlapping(query, |item| {
            if !found && pred(item) {
                found = true;
            }
        });
        found
    }

    /// Best-first nearest neighbour search.
    ///
    /// `dist` gives the exact distance from `p` to an item. Items are
    /// offered to `accept` in increasing distance (ties broken by index);
    /// the first accepted item is returned together with its distance.
    pub fn nearest_matching(
        &self,
        p: &Point2,
        dist: impl Fn(usize) -> f64,
        mut accept: impl FnMut(usize, f64) -> bool,
    ) -> Option<(usize, f64)> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut heap = BinaryHeap::new();
        heap.push(SearchEntry {
            dist: self.nodes[0].bounds.dist_sq(p).sqrt(),
            is_item: false,
            index: 0,
        });
        while let Some(entry) = heap.pop() {
            if entry.is_item {
                if accept(entry.index, entry.dist) {
                    return Some((entry.index, entry.dist));
                }
                continue;
            }
            match self.nodes[entry.index].kind {
                NodeKind::Leaf { first, count } => {
                    for &item in &self.items[first..first + count] {
                        heap.push(SearchEntry {
                            dist: dist(item),
                            is_item: true,
                            index: item,
                        });
                    }
                }
                NodeKind::Branch { left, right } => {
                    for child in [left, right] {
                        heap.push(SearchEntry {
                            dist: self.nodes[child].bounds.dist_sq(p).sqrt(),
                            is_item: false,
                            index: child,
                        });
                    }
                }
            }
        }
        None
    }
}

fn build_node(nodes: &mut Vec<Node>, items: &mut [usize], offset: usize, bounds: &[Aabb]) -> usize {
    let node_bounds = items
        .iter()
        .fold(Aabb::empty(), |b, &i| b.union(&bounds[i]));
    let idx = nodes.len();
    nodes.push(Node {
        bounds: node_bounds,
        kind: NodeKind::Leaf {
            first: offset,
            count: items.len(),
        },
    });
    if items.len() <= LEAF_SIZE {
        return idx;
    }

    let centroids = items
        .iter()
        .fold(Aabb::empty(), |b, &i| b.including(&bounds[i].centroid()));
    let along_x = centroids.max.x - centroids.min.x >= centroids.max.y - centroids.min.y;
    let key = |i: usize| {
        let c = bounds[i].centroid();
        if along_x {
            c.x
        } else {
            c.y
        }
    };
    items.sort_by(|&a, &b| key(a).total_cmp(&key(b)).then(a.cmp(&b)));

    let split = sah_split(items, bounds);
    let (lo, hi) = items.split_at_mut(split);
    let left = build_node(nodes, lo, offset, bounds);
    let right = build_node(nodes, hi, offset + split, bounds);
    nodes[idx].kind = NodeKind::Branch { left, right };
    idx
}

#[allow(clippy::cast_precision_loss)]
fn sah_split(items: &[usize], bounds: &[Aabb]) -> usize {
    let n = items.len();
    let mut suffix = vec![Aabb::empty(); n + 1];
    for k in (0..n).rev() {
        suffix[k] = suffix[k + 1].union(&bounds[items[k]]);
    }
    let mut prefix = Aabb::empty();
    let mut best = (f64::INFINITY, n / 2);
    for k in 1..n {
        prefix = prefix.union(&bounds[items[k - 1]]);
        let cost =
            prefix.half_perimeter() * k as f64 + suffix[k].half_perimeter() * (n - k) as f64;
        if cost < best.0 {
            best = (cost, k);
        }
    }
    best.1
}

#[derive(Debug, Clone, Copy)]
struct SearchEntry {
    dist: f64,
    is_item: bool,
    index: usize,
}

impl PartialEq for SearchEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchEntry {}

impl Ord for SearchEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap; nodes are expanded before items at equal
        // distance so that ties resolve by item index.
        other
            .dist
            .total_cmp(&self.dist)
            .then(other.is_item.cmp(&self.is_item))
            .then(other.index.cmp(&self.index))
    }
}

impl PartialOrd for SearchEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
