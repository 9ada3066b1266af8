//! Obstacle boundaries as grouped line segments in angle space.

use std::ops::Range;

use crate::contour::ObstacleRegion;
use crate::error::{GeometryError, Result};
use crate::grid::OccupancyGrid;
use crate::math::{cross, Point2};
use crate::progress::Reporter;

/// One boundary edge of an obstacle region, in angle space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: Point2,
    pub end: Point2,
    /// Index of the owning region.
    pub region: usize,
    /// Index of the closed loop within the region.
    pub loop_index: usize,
}

impl LineSegment {
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

/// How the loops of a region combine into its area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    /// A point is inside when it is enclosed by an odd number of loops.
    EvenOdd,
    /// A point is inside when any loop encloses it (convex parts).
    Union,
}

/// Segments belonging to one region.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentGroup {
    pub region: usize,
    pub inverted: bool,
    pub fill_rule: FillRule,
    /// Index range into [`SegmentSet::segments`].
    pub range: Range<usize>,
    pub loop_count: usize,
}

/// All obstacle segments, grouped by region. Within a group, segments are
/// stored loop by loop, each loop in vertex order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentSet {
    segments: Vec<LineSegment>,
    groups: Vec<SegmentGroup>,
}

impl SegmentSet {
    /// Appends a region made of closed `loops` and returns its index.
    pub fn push_region(
        &mut self,
        loops: Vec<Vec<Point2>>,
        fill_rule: FillRule,
        inverted: bool,
    ) -> usize {
        let region = self.groups.len();
        let first = self.segments.len();
        let mut loop_count = 0;
        for lp in loops.iter().filter(|lp| lp.len() >= 2) {
            let n = lp.len();
            for i in 0..n {
                let (start, end) = (lp[i], lp[(i + 1) % n]);
                if start != end {
                    self.segments.push(LineSegment {
                        start,
                        end,
                        region,
                        loop_index: loop_count,
                    });
                }
            }
            loop_count += 1;
        }
        self.groups.push(SegmentGroup {
            region,
            inverted,
            fill_rule,
            range: first..self.segments.len(),
            loop_count,
        });
        region
    }

    #[must_use]
    pub fn segments(&self) -> &[LineSegment] {
        &self.segments
    }

    #[must_use]
    pub fn groups(&self) -> &[SegmentGroup] {
        &self.groups
    }

    #[must_use]
    pub fn num_regions(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments of one region, or an empty slice for an unknown index.
    #[must_use]
    pub fn region_segments(&self, region: usize) -> &[LineSegment] {
        self.groups
            .get(region)
            .map_or(&[], |g| &self.segments[g.range.clone()])
    }

    /// Segments of one region as `[x0, y0, x1, y1]` rows.
    #[must_use]
    pub fn region_segments_as_array(&self, region: usize) -> Vec<[f64; 4]> {
        self.region_segments(region)
            .iter()
            .map(|s| [s.start.x, s.start.y, s.end.x, s.end.y])
            .collect()
    }

    #[must_use]
    pub fn is_region_inverted(&self, region: usize) -> bool {
        self.groups.get(region).is_some_and(|g| g.inverted)
    }

    /// Re-traces the closed loops of one region from its segments.
    #[must_use]
    pub fn region_loops(&self, region: usize) -> Vec<Vec<Point2>> {
        let mut loops: Vec<Vec<Point2>> = Vec::new();
        let mut current = usize::MAX;
        for seg in self.region_segments(region) {
            if seg.loop_index != current {
                current = seg.loop_index;
                loops.push(Vec::new());
            }
            if let Some(lp) = loops.last_mut() {
                lp.push(seg.start);
            }
        }
        loops
    }
}

/// Flattens region boundaries into a [`SegmentSet`] in angle space.
#[derive(Debug, Clone)]
pub struct SegmentBuilder {
    merge_collinear: bool,
    angular_eps: f64,
}

impl SegmentBuilder {
    #[must_use]
    pub fn new(merge_collinear: bool, angular_eps: f64) -> Self {
        Self {
            merge_collinear,
            angular_eps,
        }
    }

    /// Converts every region's output loops to angle-space segments.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if a region has no usable loop.
    pub fn execute(
        &self,
        regions: &[ObstacleRegion],
        grid: &OccupancyGrid,
        reporter: Reporter<'_>,
    ) -> Result<SegmentSet> {
        reporter.begin("Calculating line segments...");
        let mut set = SegmentSet::default();
        for region in regions {
            let loops: Vec<Vec<Point2>> = region
                .output_loops()
                .iter()
                .map(|lp| {
                    let pts: Vec<Point2> = lp.iter().map(|p| grid.cell_to_angle(p)).collect();
                    if self.merge_collinear {
                        merge_collinear(&pts, self.angular_eps)
                    } else {
                        pts
                    }
                })
                .filter(|lp| lp.len() >= 3)
                .collect();
            if loops.is_empty() {
                return Err(GeometryError::Degenerate(format!(
                    "region {} has no closed boundary",
                    region.index
                ))
                .into());
            }
            let fill_rule = if region.convex_parts.is_some() {
                FillRule::Union
            } else {
                FillRule::EvenOdd
            };
            set.push_region(loops, fill_rule, region.inverted);
        }
        tracing::info!(
            "segments: {} in {} regions",
            set.segments().len(),
            set.num_regions()
        );
        reporter.end("Line segments calculated.");
        Ok(set)
    }
}

/// Drops loop vertices where consecutive edges continue in the same
/// direction within `angular_eps`.
fn merge_collinear(points: &[Point2], angular_eps: f64) -> Vec<Point2> {
    let n = points.len();
    let merged: Vec<Point2> = (0..n)
        .filter(|&i| {
            let d1 = points[i] - points[(i + n - 1) % n];
            let d2 = points[(i + 1) % n] - points[i];
            cross(&d1, &d2).atan2(d1.dot(&d2)).abs() >= angular_eps
        })
        .map(|i| points[i])
        .collect();
    if merged.len() >= 3 {
        merged
    } else {
        points.to_vec()
    }
}
