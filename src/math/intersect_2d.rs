use super::{cross, Point2};

fn orient(a: &Point2, b: &Point2, c: &Point2, eps: f64) -> i8 {
    let v = cross(&(b - a), &(c - a));
    if v > eps {
        1
    } else if v < -eps {
        -1
    } else {
        0
    }
}

fn on_segment(a: &Point2, b: &Point2, p: &Point2, eps: f64) -> bool {
    p.x >= a.x.min(b.x) - eps
        && p.x <= a.x.max(b.x) + eps
        && p.y >= a.y.min(b.y) - eps
        && p.y <= a.y.max(b.y) + eps
}

/// Returns `true` if the closed segments `a0`-`a1` and `b0`-`b1` share at
/// least one point, including touching and collinear overlap.
#[must_use]
pub fn segments_touch(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2, eps: f64) -> bool {
    let o1 = orient(a0, a1, b0, eps);
    let o2 = orient(a0, a1, b1, eps);
    let o3 = orient(b0, b1, a0, eps);
    let o4 = orient(b0, b1, a1, eps);

    if o1 * o2 < 0 && o3 * o4 < 0 {
        return true;
    }
    (o1 == 0 && on_segment(a0, a1, b0, eps))
        || (o2 == 0 && on_segment(a0, a1, b1, eps))
        || (o3 == 0 && on_segment(b0, b1, a0, eps))
        || (o4 == 0 && on_segment(b0, b1, a1, eps))
}

/// Returns `true` if the segments cross at a single point interior to both.
#[must_use]
pub fn segments_cross_properly(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2, eps: f64) -> bool {
    let o1 = orient(a0, a1, b0, eps);
    let o2 = orient(a0, a1, b1, eps);
    let o3 = orient(b0, b1, a0, eps);
    let o4 = orient(b0, b1, a1, eps);
    o1 * o2 < 0 && o3 * o4 < 0
}
