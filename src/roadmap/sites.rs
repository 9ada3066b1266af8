use spade::{HasPosition, Point2 as SpadePoint2};

use crate::math::Point2;
use crate::segments::{FillRule, SegmentSet};
use crate::spatial::Aabb;

/// Identifies the boundary loop a segment came from; `None` for segments
/// whose Voronoi edges are always kept (holes and the frame).
pub(crate) type Group = Option<(usize, usize)>;

/// A cleaned-up input segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct InputSegment {
    pub start: Point2,
    pub end: Point2,
    pub group: Group,
}

/// A point sample of an input segment, inserted into the triangulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Site {
    pub position: SpadePoint2<f64>,
    pub segment: usize,
    pub group: Group,
}

impl HasPosition for Site {
    type Scalar = f64;

    fn position(&self) -> SpadePoint2<f64> {
        self.position
    }
}

/// Fixed-point grid used to snap and compare coordinates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Quantizer {
    scale: f64,
}

impl Quantizer {
    /// A grid fine enough that `eps`-separated points stay distinct.
    pub(crate) fn new(eps: f64) -> Self {
        Self {
            scale: (1.0 / (eps * eps)).ceil(),
        }
    }

    /// Returns `true` if every key inside `bounds` is an exact integer, so
    /// that distinct snapped points keep distinct keys.
    pub(crate) fn covers(&self, bounds: &Aabb) -> bool {
        // 2^53
        const EXACT: f64 = 9_007_199_254_740_992.0;
        let reach = [bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y]
            .into_iter()
            .fold(0.0_f64, |m, c| m.max(c.abs()));
        reach.is_finite() && reach * self.scale < EXACT
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn key(&self, p: &Point2) -> (i64, i64) {
        ((p.x * self.scale).round() as i64, (p.y * self.scale).round() as i64)
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn snap(&self, p: &Point2) -> Point2 {
        let (x, y) = self.key(p);
        Point2::new(x as f64 / self.scale, y as f64 / self.scale)
    }
}

/// Collects the obstacle segments plus the frame around `bounds`, snapped to
/// the fixed-point grid, with zero-length and duplicate segments removed.
///
/// Obstacle segments keep their order and precede the frame.
pub(crate) fn prepare_segments(set: &SegmentSet, bounds: &Aabb, q: Quantizer) -> Vec<InputSegment> {
    let mut raw: Vec<InputSegment> = Vec::with_capacity(set.segments().len() + 4);
    for group in set.groups() {
        for seg in &set.segments()[group.range.clone()] {
            let is_hole = group.fill_rule == FillRule::EvenOdd && seg.loop_index > 0;
            raw.push(InputSegment {
                start: q.snap(&seg.start),
                end: q.snap(&seg.end),
                group: (!is_hole).then_some((seg.region, seg.loop_index)),
            });
        }
    }

    let corners = [
        bounds.min,
        Point2::new(bounds.max.x, bounds.min.y),
        bounds.max,
        Point2::new(bounds.min.x, bounds.max.y),
    ];
    for i in 0..4 {
        raw.push(InputSegment {
            start: q.snap(&corners[i]),
            end: q.snap(&corners[(i + 1) % 4]),
            group: None,
        });
    }

    let mut keyed: Vec<((i64, i64), (i64, i64), usize)> = raw
        .iter()
        .enumerate()
        .filter_map(|(i, s)| {
            let (a, b) = (q.key(&s.start), q.key(&s.end));
            (a != b).then_some((a.min(b), a.max(b), i))
        })
        .collect();
    let zero_length = raw.len() - keyed.len();
    keyed.sort_unstable();
    keyed.dedup_by_key(|(a, b, _)| (*a, *b));
    let duplicates = raw.len() - zero_length - keyed.len();
    if zero_length + duplicates > 0 {
        tracing::debug!(
            "roadmap input: dropped {zero_length} zero-length and {duplicates} duplicate segments"
        );
    }

    let mut kept: Vec<usize> = keyed.into_iter().map(|(_, _, i)| i).collect();
    kept.sort_unstable();
    kept.into_iter().map(|i| raw[i]).collect()
}

/// Samples every segment at most `spacing` apart, endpoints included.
///
/// A position shared by several segments keeps the site of the first one.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn sample_sites(segments: &[InputSegment], spacing: f64, q: Quantizer) -> Vec<Site> {
    let mut sites: Vec<(Point2, Site)> = Vec::new();
    for (index, seg) in segments.iter().enumerate() {
        let n = ((seg.end - seg.start).norm() / spacing).ceil().max(1.0) as usize;
        for k in 0..=n {
            let p = q.snap(&(seg.start + (seg.end - seg.start) * (k as f64 / n as f64)));
            sites.push((
                p,
                Site {
                    position: SpadePoint2::new(p.x, p.y),
                    segment: index,
                    group: seg.group,
                },
            ));
        }
    }

    let mut order: Vec<((i64, i64), usize)> = sites
        .iter()
        .enumerate()
        .map(|(i, (p, _))| (q.key(p), i))
        .collect();
    order.sort_unstable();
    order.dedup_by_key(|(key, _)| *key);
    let mut kept: Vec<usize> = order.into_iter().map(|(_, i)| i).collect();
    kept.sort_unstable();
    kept.into_iter().map(|i| sites[i].1).collect()
}
