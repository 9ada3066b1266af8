use crate::math::Isometry2;

use super::axis::{AxisFrame, AxisFrames, PlacedShape};
use super::collide::{circle_polygon_overlap, circles_overlap, polygons_overlap};
use super::{AngleConfiguration, Axis, CollisionModel, Component};

/// 2D model of a triple-axis spectrometer and the walls around it.
///
/// The three axes form a chain: the sample axis is positioned in the
/// monochromator's outgoing frame and the analyser in the sample's.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSpace {
    pub monochromator: Axis,
    pub sample: Axis,
    pub analyser: Axis,
    pub walls: Vec<Component>,
}

struct Part {
    frame: AxisFrame,
    shape: PlacedShape,
}

impl InstrumentSpace {
    #[must_use]
    pub fn new(monochromator: Axis, sample: Axis, analyser: Axis) -> Self {
        Self {
            monochromator,
            sample,
            analyser,
            walls: Vec::new(),
        }
    }

    /// Adds a static wall.
    #[must_use]
    pub fn with_wall(mut self, wall: Component) -> Self {
        self.walls.push(wall);
        self
    }

    fn place_axes(&self, config: &AngleConfiguration) -> [Vec<Part>; 3] {
        let mono = self
            .monochromator
            .frames(&Isometry2::identity(), config.a1, config.a2);
        let sample = self.sample.frames(&mono.outgoing, config.a3, config.a4);
        let ana = self.analyser.frames(&sample.outgoing, config.a5, config.a6);

        let place = |axis: &Axis, frames: &AxisFrames| -> Vec<Part> {
            axis.components
                .iter()
                .map(|(frame, comp)| Part {
                    frame: *frame,
                    shape: comp.place(frames.get(*frame)),
                })
                .collect()
        };
        [
            place(&self.monochromator, &mono),
            place(&self.sample, &sample),
            place(&self.analyser, &ana),
        ]
    }
}

fn shapes_overlap(a: &PlacedShape, b: &PlacedShape) -> bool {
    if !a.bounds().intersects(b.bounds()) {
        return false;
    }
    match (a, b) {
        (PlacedShape::Polygon { corners: pa, .. }, PlacedShape::Polygon { corners: pb, .. }) => {
            polygons_overlap(pa, pb)
        }
        (
            PlacedShape::Circle { center, radius, .. },
            PlacedShape::Polygon { corners, .. },
        )
        | (
            PlacedShape::Polygon { corners, .. },
            PlacedShape::Circle { center, radius, .. },
        ) => circle_polygon_overlap(center, *radius, corners),
        (
            PlacedShape::Circle {
                center: c1,
                radius: r1,
                ..
            },
            PlacedShape::Circle {
                center: c2,
                radius: r2,
                ..
            },
        ) => circles_overlap(c1, *r1, c2, *r2),
    }
}

/// Checks all part pairs of two axes, skipping the frames that physically
/// join them when the axes are neighbours in the chain.
fn axes_collide(upstream: &[Part], downstream: &[Part], adjacent: bool) -> bool {
    upstream
        .iter()
        .filter(|p| !adjacent || p.frame != AxisFrame::Outgoing)
        .any(|a| {
            downstream
                .iter()
                .filter(|p| !adjacent || p.frame != AxisFrame::Incoming)
                .any(|b| shapes_overlap(&a.shape, &b.shape))
        })
}

impl CollisionModel for InstrumentSpace {
    fn within_limits(&self, config: &AngleConfiguration) -> bool {
        self.monochromator.angles_within_limits(config.a1, config.a2)
            && self.sample.angles_within_limits(config.a3, config.a4)
            && self.analyser.angles_within_limits(config.a5, config.a6)
    }

    fn collides(&self, config: &AngleConfiguration) -> bool {
        let [mono, sample, ana] = self.place_axes(config);

        let walls: Vec<PlacedShape> = self
            .walls
            .iter()
            .map(|w| w.place(&Isometry2::identity()))
            .collect();

        // The incoming monochromator frame carries the fixed primary beam
        // parts, which are mounted through the walls.
        let moving = mono
            .iter()
            .filter(|p| p.frame != AxisFrame::Incoming)
            .chain(sample.iter())
            .chain(ana.iter());
        for part in moving {
            if walls.iter().any(|w| shapes_overlap(&part.shape, w)) {
                return true;
            }
        }

        axes_collide(&mono, &sample, true)
            || axes_collide(&sample, &ana, true)
            || axes_collide(&mono, &ana, false)
    }

    fn axis_speeds(&self, kf_fixed: bool) -> Option<[f64; 2]> {
        let second = if kf_fixed {
            self.monochromator.speed_out
        } else {
            self.analyser.speed_out
        };
        Some([self.sample.speed_out?, second?])
    }
}
