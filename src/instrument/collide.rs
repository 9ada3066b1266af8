use crate::math::distance_2d::point_to_segment_dist;
use crate::math::polygon_2d::point_in_loops;
use crate::math::{Point2, Vector2};

/// Separating-axis test for two convex polygons.
///
/// Touching polygons are not considered overlapping.
#[must_use]
pub fn polygons_overlap(a: &[Point2], b: &[Point2]) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }
    !has_separating_axis(a, b) && !has_separating_axis(b, a)
}

fn has_separating_axis(poly: &[Point2], other: &[Point2]) -> bool {
    let n = poly.len();
    for i in 0..n {
        let edge = poly[(i + 1) % n] - poly[i];
        let axis = Vector2::new(-edge.y, edge.x);
        let (min_a, max_a) = project(poly, &axis);
        let (min_b, max_b) = project(other, &axis);
        if max_a <= min_b || max_b <= min_a {
            return true;
        }
    }
    false
}

fn project(poly: &[Point2], axis: &Vector2) -> (f64, f64) {
    poly.iter()
        .map(|p| p.coords.dot(axis))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}

/// Returns `true` if a circle overlaps a polygon, either by containing part of
/// its boundary or by lying inside it.
#[must_use]
pub fn circle_polygon_overlap(center: &Point2, radius: f64, poly: &[Point2]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        if point_to_segment_dist(center, &poly[i], &poly[(i + 1) % n]) < radius {
            return true;
        }
    }
    point_in_loops(center, &[poly.to_vec()])
}

/// Returns `true` if two circles overlap.
#[must_use]
pub fn circles_overlap(c1: &Point2, r1: f64, c2: &Point2, r2: f64) -> bool {
    (c1 - c2).norm() < r1 + r2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    #[test]
    fn overlapping_rectangles() {
        assert!(polygons_overlap(&rect(0.0, 0.0, 2.0, 2.0), &rect(1.0, 1.0, 3.0, 3.0)));
        assert!(!polygons_overlap(&rect(0.0, 0.0, 1.0, 1.0), &rect(2.0, 0.0, 3.0, 1.0)));
    }

    #[test]
    fn rotated_rectangle_separated_by_its_own_edge() {
        // A diamond whose bounding box overlaps the square but the shapes do not.
        let diamond = vec![
            Point2::new(2.0, 1.2),
            Point2::new(2.8, 2.0),
            Point2::new(2.0, 2.8),
            Point2::new(1.2, 2.0),
        ];
        assert!(!polygons_overlap(&rect(0.0, 0.0, 1.5, 1.5), &diamond));
    }

    #[test]
    fn circle_inside_polygon() {
        let square = rect(0.0, 0.0, 10.0, 10.0);
        assert!(circle_polygon_overlap(&Point2::new(5.0, 5.0), 0.5, &square));
        assert!(circle_polygon_overlap(&Point2::new(10.2, 5.0), 0.5, &square));
        assert!(!circle_polygon_overlap(&Point2::new(12.0, 5.0), 0.5, &square));
    }

    #[test]
    fn circle_pairs() {
        assert!(circles_overlap(&Point2::new(0.0, 0.0), 1.0, &Point2::new(1.5, 0.0), 1.0));
        assert!(!circles_overlap(&Point2::new(0.0, 0.0), 1.0, &Point2::new(2.5, 0.0), 1.0));
    }
}
