//! Spatial index over the obstacle line segments.

mod bvh;

use std::collections::BTreeMap;

pub use bvh::{Aabb, Bvh};

use crate::math::distance_2d::point_to_segment_dist;
use crate::math::intersect_2d::segments_touch;
use crate::math::polygon_2d::ray_crosses_segment;
use crate::math::Point2;
use crate::segments::{FillRule, LineSegment, SegmentSet};

/// Result of a nearest-obstacle query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestSegment {
    pub segment: usize,
    pub region: usize,
    pub distance: f64,
}

/// Bounding-volume hierarchy over a [`SegmentSet`], answering containment,
/// nearest-obstacle and segment-crossing queries.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    segments: Vec<LineSegment>,
    fill_rules: Vec<FillRule>,
    bvh: Bvh,
}

impl SpatialIndex {
    /// Indexes every segment of `set`.
    #[must_use]
    pub fn build(set: &SegmentSet) -> Self {
        let segments = set.segments().to_vec();
        let bounds: Vec<Aabb> = segments
            .iter()
            .map(|s| Aabb::from_segment(&s.start, &s.end))
            .collect();
        let fill_rules = set.groups().iter().map(|g| g.fill_rule).collect();
        tracing::debug!("indexed {} obstacle segments", segments.len());
        Self {
            segments,
            fill_rules,
            bvh: Bvh::build(&bounds),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the lowest-indexed region containing `p`, if any.
    ///
    /// Counts crossings of the ray from `p` towards `+x` with each region's
    /// boundary; regions under [`FillRule::Union`] contain `p` when any of
    /// their loops does.
    #[must_use]
    pub fn region_at(&self, p: &Point2) -> Option<usize> {
        let ray = Aabb::new(*p, Point2::new(f64::INFINITY, p.y));
        let mut parity: BTreeMap<(usize, usize), bool> = BTreeMap::new();
        self.bvh.visit_overlapping(&ray, |i| {
            let seg = &self.segments[i];
            if ray_crosses_segment(p, &seg.start, &seg.end) {
                let lp = match self.fill_rules.get(seg.region) {
                    Some(FillRule::Union) => seg.loop_index,
                    _ => 0,
                };
                let odd = parity.entry((seg.region, lp)).or_insert(false);
                *odd = !*odd;
            }
        });
        parity
            .into_iter()
            .find_map(|((region, _), odd)| odd.then_some(region))
    }

    /// Nearest obstacle segment to `p`.
    #[must_use]
    pub fn nearest(&self, p: &Point2) -> Option<NearestSegment> {
        self.bvh
            .nearest_matching(
                p,
                |i| point_to_segment_dist(p, &self.segments[i].start, &self.segments[i].end),
                |_, _| true,
            )
            .map(|(segment, distance)| NearestSegment {
                segment,
                region: self.segments[segment].region,
                distance,
            })
    }

    /// Distance from `p` to the closest obstacle; infinite without obstacles.
    #[must_use]
    pub fn clearance(&self, p: &Point2) -> f64 {
        self.nearest(p).map_or(f64::INFINITY, |n| n.distance)
    }

    /// Returns `true` if the segment `a`-`b` touches any obstacle segment.
    #[must_use]
    pub fn intersects_segment(&self, a: &Point2, b: &Point2, eps: f64) -> bool {
        let query = Aabb::from_segment(a, b);
        self.bvh.any_overlapping(&query, |i| {
            let seg = &self.segments[i];
            segments_touch(a, b, &seg.start, &seg.end, eps)
        })
    }

    /// The indexed segment with the given index.
    #[must_use]
    pub fn segment(&self, index: usize) -> Option<&LineSegment> {
        self.segments.get(index)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    fn ring_and_island() -> SegmentSet {
        let mut hole = square(2.0, 2.0, 8.0, 8.0);
        hole.reverse();
        let mut set = SegmentSet::default();
        set.push_region(vec![square(0.0, 0.0, 10.0, 10.0), hole], FillRule::EvenOdd, false);
        set.push_region(vec![square(4.0, 4.0, 6.0, 6.0)], FillRule::EvenOdd, true);
        set
    }

    #[test]
    fn region_containment_with_nesting() {
        let index = SpatialIndex::build(&ring_and_island());
        assert_eq!(index.region_at(&Point2::new(1.0, 5.0)), Some(0));
        assert_eq!(index.region_at(&Point2::new(3.0, 5.0)), None);
        assert_eq!(index.region_at(&Point2::new(5.0, 5.0)), Some(1));
        assert_eq!(index.region_at(&Point2::new(11.0, 5.0)), None);
    }

    #[test]
    fn union_fill_counts_loops_separately() {
        let mut set = SegmentSet::default();
        // Two overlapping convex parts of one region.
        set.push_region(
            vec![square(0.0, 0.0, 2.0, 1.0), square(1.0, 0.0, 3.0, 1.0)],
            FillRule::Union,
            false,
        );
        let index = SpatialIndex::build(&set);
        assert_eq!(index.region_at(&Point2::new(1.5, 0.5)), Some(0));
        assert_eq!(index.region_at(&Point2::new(0.5, 0.5)), Some(0));
        assert_eq!(index.region_at(&Point2::new(3.5, 0.5)), None);
    }

    #[test]
    fn nearest_reports_region_and_distance() {
        let index = SpatialIndex::build(&ring_and_island());
        let n = index.nearest(&Point2::new(2.8, 5.0)).unwrap();
        assert!((n.distance - 0.8).abs() < 1e-12);
        assert_eq!(n.region, 0);
        let n = index.nearest(&Point2::new(5.0, 3.5)).unwrap();
        assert!((n.distance - 0.5).abs() < 1e-12);
        assert_eq!(n.region, 1);
    }

    #[test]
    fn segment_crossing_query() {
        let index = SpatialIndex::build(&ring_and_island());
        assert!(index.intersects_segment(&Point2::new(3.0, 5.0), &Point2::new(5.0, 5.0), 1e-12));
        assert!(!index.intersects_segment(&Point2::new(3.0, 3.0), &Point2::new(3.0, 7.0), 1e-12));
    }

    #[test]
    fn empty_index_has_infinite_clearance() {
        let index = SpatialIndex::build(&SegmentSet::default());
        assert!(index.is_empty());
        assert!(index.clearance(&Point2::origin()).is_infinite());
        assert_eq!(index.region_at(&Point2::origin()), None);
    }
}
