use std::f64::consts::{FRAC_PI_2, PI};

use crate::math::intersect_2d::segments_touch;
use crate::math::{cross, Point2, Vector2};

use super::ContourParams;

/// Simplifies every loop of one region in place.
///
/// Three passes run per loop: coincident vertices are merged, short
/// "staircase" steps left over from the cell raster are cut off, and
/// vertices on (nearly) straight runs or spikes are dropped. A removal is
/// skipped when the replacement edge would touch another edge of the region.
pub(crate) fn simplify_loops(loops: &mut [Vec<Point2>], params: &ContourParams) {
    for li in 0..loops.len() {
        remove_duplicates(&mut loops[li], params.eps);
        remove_staircases(loops, li, params);
        remove_straight_vertices(loops, li, params);
    }
}

fn remove_duplicates(lp: &mut Vec<Point2>, eps: f64) {
    lp.dedup_by(|a, b| (*a - *b).norm() <= eps);
    while lp.len() > 1 && (lp[0] - lp[lp.len() - 1]).norm() <= eps {
        lp.pop();
    }
}

fn remove_staircases(loops: &mut [Vec<Point2>], li: usize, params: &ContourParams) {
    let mut i = 0;
    while i < loops[li].len() && loops[li].len() >= 5 {
        let lp = &loops[li];
        let n = lp.len();
        let idx = [i, (i + 1) % n, (i + 2) % n, (i + 3) % n, (i + 4) % n];
        let [v1, v2, v3, v4, v5] = idx.map(|k| lp[k]);

        let is_step = (v4 - v1).norm() <= params.simplify_min_dist
            && is_axis_aligned(&(v3 - v2), params.angular_eps)
            && angle_diff(direction(&(v2 - v1)), direction(&(v4 - v3))) < params.angular_eps;

        if is_step && edge_is_clear(loops, &v2, &v5, &[v2, v3, v4, v5], params.eps) {
            let removed = [idx[2], idx[3]];
            let lp = &mut loops[li];
            lp.remove(removed[0].max(removed[1]));
            lp.remove(removed[0].min(removed[1]));
            i -= removed.iter().filter(|&&k| k < i).count();
        } else {
            i += 1;
        }
    }
}

fn remove_straight_vertices(loops: &mut [Vec<Point2>], li: usize, params: &ContourParams) {
    let mut i = 0;
    let mut idle = 0;
    while loops[li].len() > 3 && idle < loops[li].len() {
        let lp = &loops[li];
        let n = lp.len();
        i %= n;
        let (v1, v2, v3) = (lp[(i + n - 1) % n], lp[i], lp[(i + 1) % n]);
        let (d1, d2) = (v2 - v1, v3 - v2);
        let turn = cross(&d1, &d2).atan2(d1.dot(&d2)).abs();

        // Straight continuation or a spike that doubles back.
        let straight = turn < params.angular_eps || (turn - PI).abs() < params.angular_eps;
        if straight && edge_is_clear(loops, &v1, &v3, &[v1, v2, v3], params.eps) {
            loops[li].remove(i);
            idle = 0;
        } else {
            i += 1;
            idle += 1;
        }
    }
}

/// Returns `true` if the edge `a`-`c` touches no edge of `loops` other than
/// those incident to one of the `skip` vertices.
fn edge_is_clear(loops: &[Vec<Point2>], a: &Point2, c: &Point2, skip: &[Point2], eps: f64) -> bool {
    let incident = |p: &Point2| skip.iter().any(|s| (p - s).norm() <= eps);
    loops.iter().all(|lp| {
        let n = lp.len();
        (0..n).all(|k| {
            let (p, q) = (&lp[k], &lp[(k + 1) % n]);
            incident(p) || incident(q) || !segments_touch(a, c, p, q, eps)
        })
    })
}

fn direction(v: &Vector2) -> f64 {
    v.y.atan2(v.x).rem_euclid(2.0 * PI)
}

fn angle_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).abs();
    d.min(2.0 * PI - d)
}

fn is_axis_aligned(v: &Vector2, angular_eps: f64) -> bool {
    let a = direction(v) % FRAC_PI_2;
    a < angular_eps || FRAC_PI_2 - a < angular_eps
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::signed_area_2d;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn params() -> ContourParams {
        ContourParams {
            simplify: true,
            ..ContourParams::default()
        }
    }

    #[test]
    fn merges_duplicates_and_straight_runs() {
        let mut loops = vec![vec![
            p(0.0, 0.0),
            p(0.0, 0.0),
            p(2.0, 0.0005),
            p(4.0, 0.0),
            p(4.0, 4.0),
            p(0.0, 4.0),
            p(0.0, 0.0),
        ]];
        simplify_loops(&mut loops, &params());
        assert_eq!(
            loops[0],
            vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)]
        );
    }

    #[test]
    fn cuts_staircase_steps() {
        let stairs = vec![
            p(0.0, 0.0),
            p(5.0, 0.0),
            p(5.0, 1.0),
            p(4.0, 1.0),
            p(4.0, 2.0),
            p(3.0, 2.0),
            p(3.0, 3.0),
            p(2.0, 3.0),
            p(2.0, 4.0),
            p(1.0, 4.0),
            p(1.0, 5.0),
            p(0.0, 5.0),
        ];
        let mut loops = vec![stairs.clone()];
        simplify_loops(&mut loops, &params());
        assert!(loops[0].len() < stairs.len());
        let area = signed_area_2d(&loops[0]);
        assert!(area > 10.0 && area < 20.0, "area {area}");
    }

    #[test]
    fn keeps_vertices_when_the_shortcut_would_cross_a_hole() {
        // The shallow notch at (2, -0.0005) would be removed, but a hole
        // reaches down across the shortcut.
        let outer = vec![
            p(0.0, 0.0),
            p(2.0, -0.0005),
            p(4.0, 0.0),
            p(4.0, 4.0),
            p(0.0, 4.0),
        ];
        let hole = vec![p(1.9, -0.0003), p(1.9, 1.0), p(2.1, 1.0), p(2.1, -0.0003)];
        let mut loops = vec![outer, hole];
        let params = ContourParams {
            eps: 1e-6,
            ..params()
        };
        simplify_loops(&mut loops, &params);
        assert_eq!(loops[0].len(), 5);
        assert_eq!(loops[1].len(), 4);
    }

    #[test]
    fn triangles_are_left_alone() {
        let mut loops = vec![vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)]];
        simplify_loops(&mut loops, &params());
        assert_eq!(loops[0].len(), 3);
    }
}
