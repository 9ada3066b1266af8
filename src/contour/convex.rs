use std::collections::VecDeque;

use spade::handles::{FixedFaceHandle, FixedVertexHandle, InnerTag};
use spade::{ConstrainedDelaunayTriangulation, Point2 as SpadePoint2, Triangulation};

use crate::math::polygon_2d::{is_convex, rotate_to_canonical_start};
use crate::math::Point2;

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Splits the area enclosed by `loops` (even-odd) into convex polygons.
///
/// The area is triangulated with the loop edges as constraints, and
/// neighbouring pieces are then merged across every non-constraint diagonal
/// whose removal keeps the union convex (Hertel-Mehlhorn). Returns `None`
/// if the loops cannot be inserted as constraints, e.g. because two of them
/// cross.
pub(crate) fn convex_parts(loops: &[Vec<Point2>]) -> Option<Vec<Vec<Point2>>> {
    let cdt = triangulate(loops)?;
    let interior = classify_interior_faces(&cdt);

    let mut positions = vec![Point2::origin(); cdt.num_vertices()];
    for v in cdt.vertices() {
        positions[v.fix().index()] = Point2::new(v.position().x, v.position().y);
    }

    // Every interior triangle starts as its own polygon.
    let mut owner: Vec<Option<usize>> = vec![None; cdt.num_all_faces()];
    let mut polygons: Vec<Option<Vec<usize>>> = Vec::new();
    for face in cdt.inner_faces() {
        let idx = face.fix().index();
        if interior[idx] == Some(true) {
            owner[idx] = Some(polygons.len());
            polygons.push(Some(face.vertices().map(|v| v.fix().index()).to_vec()));
        }
    }

    for edge in cdt.undirected_edges() {
        if cdt.is_constraint_edge(edge.fix()) {
            continue;
        }
        let d = edge.as_directed();
        let (Some(left), Some(right)) = (d.face().as_inner(), d.rev().face().as_inner()) else {
            continue;
        };
        let (Some(a), Some(b)) = (owner[left.fix().index()], owner[right.fix().index()]) else {
            continue;
        };
        if a == b {
            continue;
        }
        let (u, v) = (d.from().fix().index(), d.to().fix().index());
        let (Some(pa), Some(pb)) = (&polygons[a], &polygons[b]) else {
            continue;
        };
        let Some(merged) = merge_across(pa, pb, u, v) else {
            continue;
        };
        let pts: Vec<Point2> = merged.iter().map(|&i| positions[i]).collect();
        if !is_convex(&pts) {
            continue;
        }
        polygons[a] = Some(merged);
        polygons[b] = None;
        for o in owner.iter_mut().filter(|o| **o == Some(b)) {
            *o = Some(a);
        }
    }

    let parts: Vec<Vec<Point2>> = polygons
        .into_iter()
        .flatten()
        .map(|ids| {
            let pts: Vec<Point2> = ids.iter().map(|&i| positions[i]).collect();
            rotate_to_canonical_start(&pts)
        })
        .collect();
    tracing::debug!("split {} loops into {} convex parts", loops.len(), parts.len());
    Some(parts)
}

fn triangulate(loops: &[Vec<Point2>]) -> Option<Cdt> {
    let mut cdt = Cdt::new();
    for lp in loops {
        let mut handles: Vec<FixedVertexHandle> = Vec::with_capacity(lp.len());
        for p in lp {
            match cdt.insert(SpadePoint2::new(p.x, p.y)) {
                Ok(h) => handles.push(h),
                Err(e) => {
                    tracing::warn!("convex split: cannot insert vertex {p}: {e}");
                    return None;
                }
            }
        }
        for i in 0..handles.len() {
            let (from, to) = (handles[i], handles[(i + 1) % handles.len()]);
            if from == to {
                continue;
            }
            if !cdt.can_add_constraint(from, to) {
                tracing::warn!("convex split: contour edges intersect");
                return None;
            }
            cdt.add_constraint(from, to);
        }
    }
    Some(cdt)
}

/// Joins polygon `a`, which has the edge `u -> v`, with polygon `b`, which
/// has the edge `v -> u`. Both are counter-clockwise vertex id lists.
fn merge_across(a: &[usize], b: &[usize], u: usize, v: usize) -> Option<Vec<usize>> {
    let find = |poly: &[usize], from: usize, to: usize| {
        let n = poly.len();
        (0..n).find(|&k| poly[k] == from && poly[(k + 1) % n] == to)
    };
    let ka = find(a, u, v)?;
    let kb = find(b, v, u)?;

    let mut merged = Vec::with_capacity(a.len() + b.len() - 2);
    // a from v around to u, then b strictly between u and v.
    merged.extend((0..a.len()).map(|k| a[(ka + 1 + k) % a.len()]));
    merged.extend((2..b.len()).map(|k| b[(kb + k) % b.len()]));
    Some(merged)
}

/// Marks interior faces by flood-filling from the convex hull and flipping
/// parity at every constraint edge.
///
/// Returns, per face index, `Some(true)` for interior triangles, `Some(false)`
/// for exterior ones and `None` for faces that were not reached.
fn classify_interior_faces(cdt: &Cdt) -> Vec<Option<bool>> {
    let mut inside: Vec<Option<bool>> = vec![None; cdt.num_all_faces()];
    let mut queue: VecDeque<(FixedFaceHandle<InnerTag>, bool)> = VecDeque::new();

    for hull_edge in cdt.convex_hull() {
        let Some(face) = hull_edge
            .face()
            .as_inner()
            .or_else(|| hull_edge.rev().face().as_inner())
        else {
            continue;
        };
        let idx = face.fix().index();
        if inside[idx].is_none() {
            let parity = cdt.is_constraint_edge(hull_edge.as_undirected().fix());
            inside[idx] = Some(parity);
            queue.push_back((face.fix(), parity));
        }
    }

    while let Some((fix, parity)) = queue.pop_front() {
        for edge in cdt.face(fix).adjacent_edges() {
            let Some(next) = edge.rev().face().as_inner() else {
                continue;
            };
            let idx = next.fix().index();
            if inside[idx].is_some() {
                continue;
            }
            let next_parity = parity ^ cdt.is_constraint_edge(edge.as_undirected().fix());
            inside[idx] = Some(next_parity);
            queue.push_back((next.fix(), next_parity));
        }
    }

    inside
}
