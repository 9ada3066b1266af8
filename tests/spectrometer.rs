#![allow(clippy::unwrap_used)]

mod common;

use std::f64::consts::PI;
use std::sync::Arc;

use common::{deg, spectrometer, spectrometer_kinematics};
use taspaths::export::{InstrumentSetup, NicosExporter, PathExporter};
use taspaths::grid::{CellState, GridAxis, GridParams};
use taspaths::path::PathStrategy;
use taspaths::{
    ignore_progress, AngleUnit, BuildState, CollisionModel, Kinematics, PathFormat, PathParams,
    PathsBuilder,
};

const PADDING: f64 = 4.0;

fn scenario_params() -> GridParams {
    let a4_step = 2f64.to_radians();
    let a2_step = 1f64.to_radians();
    GridParams {
        axis1: GridAxis::new(-PI - PADDING * a4_step, PI + PADDING * a4_step, a4_step),
        axis2: GridAxis::new(-PI - PADDING * a2_step, PI + PADDING * a2_step, a2_step),
    }
}

fn scenario_builder() -> PathsBuilder {
    let mut builder = PathsBuilder::new();
    builder.set_instrument(Arc::new(spectrometer()));
    builder.set_kinematics(Arc::new(spectrometer_kinematics()));
    builder.set_grid_params(scenario_params());
    builder
}

#[test]
fn folded_and_open_poses_are_classified() {
    let space = spectrometer();
    let kin = spectrometer_kinematics();
    // Analyser folded back onto the monochromator.
    assert!(space.collides(&kin.configuration(179f64.to_radians(), 40f64.to_radians())));
    // Wide open pose.
    assert!(!space.collides(&kin.configuration(90f64.to_radians(), 90f64.to_radians())));

    let mut builder = scenario_builder();
    builder.set_max_threads(4);
    builder.calculate_config_space(&ignore_progress).unwrap();
    let grid = builder.grid().unwrap();
    assert_eq!(grid.width(), 188);
    assert_eq!(grid.height(), 368);
    assert!(grid.state_at(&deg(179.0, 40.0)).unwrap().is_occupied());
    assert_eq!(grid.state_at(&deg(90.0, 90.0)), Some(CellState::Free));
}

#[test]
fn full_workflow_plans_around_the_instrument() {
    let mut builder = scenario_builder();
    common::run_pipeline(&mut builder);
    assert_eq!(builder.state(), BuildState::Complete);
    assert!(builder.num_regions() >= 2);

    let start = deg(-80.0, 40.0);
    let target = deg(105.0, 120.0);
    for strategy in [PathStrategy::Shortest, PathStrategy::PenalizeWalls] {
        let params = PathParams {
            strategy,
            use_axis_speeds: true,
            ..PathParams::default()
        };
        let path = builder.find_path(start, target, &params).unwrap();
        let format = PathFormat {
            max_step: Some(0.5f64.to_radians()),
            units: AngleUnit::Degrees,
            include_endpoints: true,
            verify: true,
        };
        let vertices = builder.path_vertices(&path, &format).unwrap();
        assert_eq!(vertices.rejected, 0);
        let first = vertices.points[0];
        assert!((first[0] + 80.0).abs() < 1e-9 && (first[1] - 40.0).abs() < 1e-9);

        let mut script: Vec<u8> = Vec::new();
        let setup = InstrumentSetup::from_kinematics(&spectrometer_kinematics()).with_k_fix(1.4);
        NicosExporter::new(setup).export(&vertices, &mut script).unwrap();
        let script = String::from_utf8(script).unwrap();
        assert_eq!(
            script.matches("maw(stt").count(),
            vertices.points.len()
        );
        assert!(script.starts_with("kf(1.4)"));
    }
}
