use std::collections::HashMap;
use std::f64::consts::PI;

use crate::math::polygon_2d::{rotate_to_canonical_start, signed_area_2d};
use crate::math::Point2;

use super::label::Labels;

/// Integer cell corner.
type Corner = (i64, i64);

/// Traced boundary of one component: the outer loop (counter-clockwise)
/// followed by its holes (clockwise), all in cell-corner coordinates.
#[derive(Debug, Clone)]
pub(crate) struct TracedBoundary {
    pub loops: Vec<Vec<Point2>>,
}

/// Traces the cell-edge boundary of component `label`.
///
/// Every cell edge between the component and any other cell becomes a
/// directed edge with the component on its right. Loops are walked by
/// always taking the sharpest right turn, which keeps diagonally touching
/// cells apart, and are reversed at the end so the outer loop runs
/// counter-clockwise.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn trace_component(labels: &Labels, label: u32) -> TracedBoundary {
    let mut edges: Vec<(Corner, Corner)> = Vec::new();
    for &(x, y) in &labels.components[label as usize] {
        let (xi, yi) = (x as i64, y as i64);
        let (xs, ys) = (x as isize, y as isize);
        if labels.get(xs, ys - 1) != label {
            edges.push(((xi + 1, yi), (xi, yi)));
        }
        if labels.get(xs, ys + 1) != label {
            edges.push(((xi, yi + 1), (xi + 1, yi + 1)));
        }
        if labels.get(xs - 1, ys) != label {
            edges.push(((xi, yi), (xi, yi + 1)));
        }
        if labels.get(xs + 1, ys) != label {
            edges.push(((xi + 1, yi + 1), (xi + 1, yi)));
        }
    }

    let mut loops: Vec<Vec<Point2>> = trace_loops(&edges)
        .into_iter()
        .map(|corners| {
            let mut pts: Vec<Point2> = corners
                .iter()
                .rev()
                .map(|&(x, y)| Point2::new(x as f64, y as f64))
                .collect();
            pts = drop_collinear(&pts);
            rotate_to_canonical_start(&pts)
        })
        .filter(|pts| pts.len() >= 3)
        .collect();

    // Outer loop first, holes after it in canonical order.
    loops.sort_by(|a, b| {
        let outer_a = signed_area_2d(a) > 0.0;
        let outer_b = signed_area_2d(b) > 0.0;
        outer_b
            .cmp(&outer_a)
            .then(a[0].y.total_cmp(&b[0].y))
            .then(a[0].x.total_cmp(&b[0].x))
    });

    TracedBoundary { loops }
}

/// Walks closed loops through a set of directed edges.
fn trace_loops(edges: &[(Corner, Corner)]) -> Vec<Vec<Corner>> {
    if edges.is_empty() {
        return Vec::new();
    }

    // Build adjacency list: corner -> list of (edge_idx, target corner).
    let mut adjacency: HashMap<Corner, Vec<(usize, Corner)>> = HashMap::new();
    for (edge_idx, &(from, to)) in edges.iter().enumerate() {
        adjacency.entry(from).or_default().push((edge_idx, to));
    }

    // Start candidates ordered by lowest y, then x.
    let mut order: Vec<usize> = (0..edges.len()).collect();
    order.sort_by_key(|&i| (edges[i].0 .1, edges[i].0 .0, i));

    let mut used = vec![false; edges.len()];
    let mut results = Vec::new();
    for &start in &order {
        if used[start] {
            continue;
        }
        let boundary = trace_one_boundary(start, edges, &adjacency, &mut used);
        if boundary.len() >= 3 {
            results.push(boundary);
        }
    }
    results
}

/// Traces a single boundary loop starting from the given edge.
fn trace_one_boundary(
    start_edge: usize,
    edges: &[(Corner, Corner)],
    adjacency: &HashMap<Corner, Vec<(usize, Corner)>>,
    used: &mut [bool],
) -> Vec<Corner> {
    let mut boundary = Vec::new();
    let mut current = start_edge;
    loop {
        used[current] = true;
        let (from, to) = edges[current];
        boundary.push(from);

        let incoming_angle = angle_of(from, to);
        match pick_next_edge(to, incoming_angle, adjacency) {
            Some(next) if next == start_edge => break,
            Some(next) if !used[next] => current = next,
            _ => {
                tracing::warn!("open boundary at corner {:?}", to);
                break;
            }
        }
    }
    boundary
}

/// Picks the outgoing edge with the minimum counter-clockwise angle from
/// the reversed incoming direction, i.e. the sharpest right turn.
fn pick_next_edge(
    node: Corner,
    incoming_angle: f64,
    adjacency: &HashMap<Corner, Vec<(usize, Corner)>>,
) -> Option<usize> {
    let reverse_angle = normalize_angle(incoming_angle + PI);
    let mut best: Option<(usize, f64)> = None;

    for &(next_edge, next_target) in adjacency.get(&node)? {
        let mut delta = normalize_angle(angle_of(node, next_target) - reverse_angle);
        if delta.abs() < 1e-9 {
            delta = 2.0 * PI;
        }
        if best.is_none_or(|(_, bd)| delta < bd) {
            best = Some((next_edge, delta));
        }
    }

    best.map(|(idx, _)| idx)
}

#[allow(clippy::cast_precision_loss)]
fn angle_of(from: Corner, to: Corner) -> f64 {
    ((to.1 - from.1) as f64).atan2((to.0 - from.0) as f64)
}

/// Normalizes an angle to [0, 2pi).
fn normalize_angle(a: f64) -> f64 {
    let two_pi = 2.0 * PI;
    let mut r = a % two_pi;
    if r < 0.0 {
        r += two_pi;
    }
    r
}

/// Removes vertices lying exactly on the line through their neighbours.
pub(crate) fn drop_collinear(points: &[Point2]) -> Vec<Point2> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            crate::math::cross(&(points[i] - prev), &(next - points[i])).abs() > 1e-12
        })
        .map(|i| points[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::grid_from_rows;
    use crate::contour::label::label_components;

    fn trace(rows: &[&str]) -> Vec<TracedBoundary> {
        let grid = grid_from_rows(rows);
        let labels = label_components(&grid);
        #[allow(clippy::cast_possible_truncation)]
        (0..labels.components.len() as u32)
            .map(|l| trace_component(&labels, l))
            .collect()
    }

    #[test]
    fn single_cell_is_a_ccw_square() {
        let b = trace(&["#"]);
        assert_eq!(b.len(), 1);
        let lp = &b[0].loops;
        assert_eq!(lp.len(), 1);
        assert_eq!(lp[0].len(), 4);
        assert!((signed_area_2d(&lp[0]) - 1.0).abs() < 1e-12);
        assert_eq!(lp[0][0], Point2::new(0.0, 0.0));
    }

    #[test]
    fn l_shape_keeps_only_corners() {
        let b = trace(&["#.", "##"]);
        let lp = &b[0].loops;
        assert_eq!(lp.len(), 1);
        assert_eq!(lp[0].len(), 6);
        assert!((signed_area_2d(&lp[0]) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn ring_has_clockwise_hole() {
        let b = trace(&["###", "#.#", "###"]);
        let lp = &b[0].loops;
        assert_eq!(lp.len(), 2);
        assert!((signed_area_2d(&lp[0]) - 9.0).abs() < 1e-12);
        assert!((signed_area_2d(&lp[1]) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn hole_area_is_subtracted() {
        let b = trace(&["###.", "#.#.", "####"]);
        assert_eq!(b.len(), 1);
        let total: f64 = b[0].loops.iter().map(|l| signed_area_2d(l)).sum();
        assert!((total - 9.0).abs() < 1e-12, "area {total}");
    }

    #[test]
    fn hole_open_at_a_corner_joins_the_outline() {
        // The free cell touches the outside through a diagonal corner only.
        let b = trace(&["##.", "#.#", "###"]);
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].loops.len(), 1);
        assert!((signed_area_2d(&b[0].loops[0]) - 7.0).abs() < 1e-12);
    }
}
