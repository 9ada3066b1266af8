//! Synthetic instruments shared by the integration tests.

#![allow(dead_code)]

use std::f64::consts::PI;
use std::sync::Arc;

use taspaths::grid::{GridAxis, GridParams};
use taspaths::instrument::{Axis, AxisFrame, Component, Shape};
use taspaths::{
    ignore_progress, AngleConfiguration, CollisionModel, InstrumentSpace, Kinematics, PathsBuilder,
    Point2, TasKinematics,
};

/// Plans directly in (a4, a2), without sense flips.
pub struct Direct;

impl Kinematics for Direct {
    fn configuration(&self, axis1: f64, axis2: f64) -> AngleConfiguration {
        AngleConfiguration::from_scattering_angles(axis2, axis1, 0.0)
    }
}

/// Forbidden annuli centred on points of the (a4, a2) plane.
pub struct Rings {
    pub rings: Vec<(Point2, f64, f64)>,
}

impl CollisionModel for Rings {
    fn within_limits(&self, _: &AngleConfiguration) -> bool {
        true
    }

    fn collides(&self, config: &AngleConfiguration) -> bool {
        let p = Point2::new(config.a4, config.a2);
        self.rings.iter().any(|(c, inner, outer)| {
            let r = (p - c).norm();
            r >= *inner && r < *outer
        })
    }
}

/// Builds a complete pipeline over `[-1, 1]²` with the given model.
pub fn build_unit_square(model: Rings, step: f64) -> PathsBuilder {
    let mut builder = PathsBuilder::new();
    builder.set_instrument(Arc::new(model));
    builder.set_kinematics(Arc::new(Direct));
    builder.set_grid_params(GridParams {
        axis1: GridAxis::new(-1.0, 1.0, step),
        axis2: GridAxis::new(-1.0, 1.0, step),
    });
    run_pipeline(&mut builder);
    builder
}

/// Routes library warnings to the test output.
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

pub fn run_pipeline(builder: &mut PathsBuilder) {
    init_tracing();
    let progress = &ignore_progress;
    builder.begin_workflow(progress);
    builder.calculate_config_space(progress).unwrap();
    builder.calculate_wall_contours(progress).unwrap();
    builder.calculate_line_segments(progress).unwrap();
    builder.calculate_voronoi(progress).unwrap();
    builder.finish_workflow(progress).unwrap();
}

/// Two solid discs and a ring around a free moat with a small disc in it.
pub fn mixed_obstacles() -> Rings {
    let ring_center = Point2::new(0.3, 0.45);
    Rings {
        rings: vec![
            (Point2::new(-0.5, 0.4), 0.0, 0.2),
            (Point2::new(0.5, -0.5), 0.0, 0.25),
            (ring_center, 0.22, 0.38),
            (ring_center, 0.0, 0.06),
        ],
    }
}

/// Monochromator at the origin, sample two units downstream, analyser two
/// units further, plus one wall below the instrument.
pub fn spectrometer() -> InstrumentSpace {
    let crystal = |name: &str| Component::new(name, Shape::Circle { radius: 0.2 }, Point2::origin(), 0.0);
    let mut mono = Axis::new("monochromator", Point2::origin())
        .with_component(AxisFrame::Internal, crystal("mono crystal"))
        .with_component(AxisFrame::Outgoing, Component::arm("mono arm", 0.3, 1.7, 0.2));
    mono.speed_out = Some(0.5);
    let mut sample = Axis::new("sample", Point2::new(2.0, 0.0))
        .with_component(AxisFrame::Internal, crystal("sample table"))
        .with_component(AxisFrame::Outgoing, Component::arm("sample arm", 0.3, 1.7, 0.2));
    sample.speed_out = Some(1.0);
    let ana = Axis::new("analyser", Point2::new(2.0, 0.0))
        .with_component(AxisFrame::Internal, crystal("ana crystal"))
        .with_component(AxisFrame::Outgoing, Component::arm("detector", 0.3, 1.3, 0.3));
    InstrumentSpace::new(mono, sample, ana).with_wall(Component::new(
        "pillar",
        Shape::Circle { radius: 0.3 },
        Point2::new(0.0, -3.3),
        0.0,
    ))
}

pub fn spectrometer_kinematics() -> TasKinematics {
    TasKinematics::new([1.0, -1.0, 1.0], true, PI / 3.0)
}

pub fn deg(x: f64, y: f64) -> Point2 {
    Point2::new(x.to_radians(), y.to_radians())
}
