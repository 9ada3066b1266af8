use super::{cross, Point2, TOLERANCE};

/// Computes the signed area of a closed polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Rotates a closed polygon so it starts at the bottommost vertex (smallest y),
/// breaking ties by smallest x.
#[must_use]
pub fn rotate_to_canonical_start(points: &[Point2]) -> Vec<Point2> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let mut best = 0;
    for (i, pt) in points.iter().enumerate().skip(1) {
        let b = &points[best];
        if pt.y < b.y - TOLERANCE || (pt.y - b.y).abs() < TOLERANCE && pt.x < b.x {
            best = i;
        }
    }
    let mut rotated = Vec::with_capacity(points.len());
    rotated.extend_from_slice(&points[best..]);
    rotated.extend_from_slice(&points[..best]);
    rotated
}

/// Returns whether the horizontal ray from `p` towards `+x` crosses the
/// segment `a`-`b`.
///
/// Uses the half-open rule on y so that a ray through a shared vertex is
/// counted exactly once per polygon.
#[must_use]
pub fn ray_crosses_segment(p: &Point2, a: &Point2, b: &Point2) -> bool {
    if (a.y > p.y) == (b.y > p.y) {
        return false;
    }
    let t = (p.y - a.y) / (b.y - a.y);
    let x = a.x + t * (b.x - a.x);
    x > p.x
}

/// Even-odd point-in-polygon test over one or more closed loops.
#[must_use]
pub fn point_in_loops(p: &Point2, loops: &[Vec<Point2>]) -> bool {
    let mut inside = false;
    for lp in loops {
        let n = lp.len();
        for i in 0..n {
            if ray_crosses_segment(p, &lp[i], &lp[(i + 1) % n]) {
                inside = !inside;
            }
        }
    }
    inside
}

/// Returns `true` if the closed polygon is convex (collinear vertices allowed).
#[must_use]
pub fn is_convex(points: &[Point2]) -> bool {
    let n = points.len();
    if n < 4 {
        return n == 3;
    }
    let mut sign = 0.0_f64;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let turn = cross(&(b - a), &(c - b));
        if turn.abs() < TOLERANCE {
            continue;
        }
        if sign == 0.0 {
            sign = turn.signum();
        } else if turn.signum() != sign {
            return false;
        }
    }
    true
}

/// Total length of a closed loop.
#[must_use]
pub fn perimeter(points: &[Point2]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| (points[(i + 1) % n] - points[i]).norm())
        .sum()
}
