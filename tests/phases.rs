#![allow(clippy::unwrap_used)]

mod common;

use common::{build_unit_square, mixed_obstacles, Direct};
use taspaths::contour::{ContourExtractor, ContourParams};
use taspaths::grid::{CellState, GridAxis, GridBuilder, GridParams, OccupancyGrid};
use taspaths::path::PathFinder;
use taspaths::roadmap::{RoadmapBuilder, RoadmapParams};
use taspaths::segments::{FillRule, SegmentBuilder, SegmentSet};
use taspaths::spatial::SpatialIndex;
use taspaths::{ignore_progress, PathParams, Point2, Reporter, SegmentParams};

const STEP: f64 = 0.05;

#[test]
fn phases_run_without_the_builder() {
    let reporter = Reporter::new(&ignore_progress, false);
    let params = GridParams {
        axis1: GridAxis::new(-1.0, 1.0, STEP),
        axis2: GridAxis::new(-1.0, 1.0, STEP),
    };
    let grid = GridBuilder::new(params, 2)
        .execute(&Direct, &mixed_obstacles(), reporter)
        .unwrap();
    let regions = ContourExtractor::new(ContourParams::default())
        .execute(&grid, reporter)
        .unwrap();
    let seg = SegmentParams::default();
    let segments = SegmentBuilder::new(seg.merge_collinear, seg.angular_eps)
        .execute(&regions, &grid, reporter)
        .unwrap();
    let index = SpatialIndex::build(&segments);
    let roadmap = RoadmapBuilder::new(RoadmapParams::default())
        .execute(&segments, &index, &grid, reporter)
        .unwrap();

    let builder = build_unit_square(mixed_obstacles(), STEP);
    assert_eq!(Some(&grid), builder.grid());
    assert_eq!(segments, *builder.segments());
    assert_eq!(roadmap.edges(), builder.roadmap().edges());
}

#[test]
fn paths_through_a_winding_corridor_avoid_the_walls() {
    let crest = |x: i32| if (x / 2) % 2 == 0 { 0.0 } else { 2.0 };
    let xs: Vec<i32> = (0..=40).step_by(2).collect();
    let mut lower = vec![Point2::new(0.0, 0.0), Point2::new(40.0, 0.0)];
    lower.extend(xs.iter().rev().map(|&x| Point2::new(f64::from(x), crest(x) + 1.0)));
    let mut upper: Vec<Point2> = xs
        .iter()
        .map(|&x| Point2::new(f64::from(x), crest(x) + 2.0))
        .collect();
    upper.extend([Point2::new(40.0, 6.0), Point2::new(0.0, 6.0)]);
    let mut set = SegmentSet::default();
    set.push_region(vec![lower], FillRule::EvenOdd, false);
    set.push_region(vec![upper], FillRule::EvenOdd, false);

    let grid = OccupancyGrid::from_fn(
        GridAxis::new(-1.0, 41.0, 0.25),
        GridAxis::new(-1.0, 7.0, 0.25),
        |_, _| CellState::Free,
    )
    .unwrap();
    let index = SpatialIndex::build(&set);
    let roadmap = RoadmapBuilder::new(RoadmapParams::default())
        .execute(&set, &index, &grid, Reporter::new(&ignore_progress, false))
        .unwrap();

    let (start, target) = (Point2::new(1.0, 2.5), Point2::new(39.0, 2.5));
    let path = PathFinder::new(&roadmap, &index, &grid, PathParams::default())
        .find(start, target)
        .unwrap();
    assert_eq!(path.start(), Some(&start));
    assert_eq!(path.target(), Some(&target));
    for w in path.points.windows(2) {
        assert!(
            !index.intersects_segment(&w[0], &w[1], 1e-9),
            "{:?} -> {:?} crosses a wall",
            w[0],
            w[1]
        );
    }
}
