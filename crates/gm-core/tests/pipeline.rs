//! End-to-end pipeline test on a synthetic two-chunk dataset.

use std::fs;
use std::io::Write;
use std::path::Path;

use approx::assert_relative_eq;
use byteorder::{NativeEndian, WriteBytesExt};

use gm_core::config::GmConfig;
use gm_core::error::GmError;
use gm_core::grid::{GridEvaluator, GridSpec};
use gm_core::index::StationIndex;
use gm_core::resolve::StationResolver;
use gm_core::signal::{abs_max, differentiate};

const N_STEPS: usize = 100;
const DT: f64 = 0.05;

/// Velocity record: 1 Hz sinusoid on both horizontal components.
fn synthetic_velocity() -> Vec<f64> {
    (0..N_STEPS)
        .map(|i| (2.0 * std::f64::consts::PI * i as f64 * DT).sin())
        .collect()
}

fn write_single_station_chunk(dir: &Path, chunk_id: u32, vel: &[f64]) {
    let mut buf = Vec::new();
    for &v in vel {
        buf.write_f64::<NativeEndian>(v).unwrap(); // along-strike
        buf.write_f64::<NativeEndian>(v).unwrap(); // fault-normal
        buf.write_f64::<NativeEndian>(0.0).unwrap(); // vertical
    }
    let mut f = fs::File::create(dir.join(format!("gm{chunk_id}"))).unwrap();
    f.write_all(&buf).unwrap();
}

fn setup(dir: &Path) -> GmConfig {
    fs::write(dir.join("surface_coor.txt0"), "0 0 0\n").unwrap();
    fs::write(dir.join("surface_coor.txt1"), "10 0 0\n").unwrap();
    let vel = synthetic_velocity();
    write_single_station_chunk(dir, 0, &vel);
    write_single_station_chunk(dir, 1, &vel);

    GmConfig {
        dt: DT,
        // With identical components the per-angle geometric mean is
        // max|a|·sqrt(|cos 2θ|); the 100th percentile recovers max|a|
        // exactly, which keeps the expectation analytic.
        percentile: 100.0,
        ..GmConfig::default()
    }
}

#[test]
fn grid_point_at_origin_resolves_chunk_zero_with_analytic_pga() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = setup(dir.path());

    let index = StationIndex::build(dir.path(), &cfg).unwrap();
    assert_eq!(index.records.len(), 2);

    let resolver = StationResolver::new(&index, dir.path(), &cfg.coord_prefix);
    let hit = resolver.resolve([0.0, 0.0, 0.0]).unwrap();
    assert_eq!(hit.station.chunk_id, 0);
    assert_eq!(hit.ordinal, 0);
    assert_eq!(hit.distance, 0.0);

    let evaluator = GridEvaluator::new(&cfg, &resolver);
    let measures = evaluator.evaluate_node([0.0, 0.0, 0.0]).unwrap();

    // Expected PGA: peak of the backward-difference acceleration scaled
    // to cm/s/s, over the n-1 samples the sweep sees.
    let acc: Vec<f64> = differentiate(&synthetic_velocity(), DT)
        .iter()
        .map(|a| a * 100.0)
        .collect();
    let expected_pga = abs_max(&acc[..N_STEPS - 1]);

    assert_relative_eq!(measures.pga, expected_pga, epsilon = 1e-6);
    assert_eq!(measures.sa.len(), cfg.periods.len());
    assert!(measures.cav > 0.0);
    assert!(measures.pgv > 0.0);
}

#[test]
fn grid_sweep_produces_inclusive_ny_by_nx_fields() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = setup(dir.path());

    let index = StationIndex::build(dir.path(), &cfg).unwrap();
    let resolver = StationResolver::new(&index, dir.path(), &cfg.coord_prefix);
    let evaluator = GridEvaluator::new(&cfg, &resolver);

    let spec = GridSpec {
        x_range: [0.0, 10.0],
        y_range: [0.0, 0.0],
        spacing: 5.0,
    };
    let out = evaluator.evaluate(&spec).unwrap();

    let pga = out.metrics.get("PGA").expect("PGA field");
    assert_eq!((pga.ny, pga.nx), (1, 3));

    // Both chunks hold the same record; every node sees the same PGA.
    assert_relative_eq!(pga.get(0, 0), pga.get(0, 2), epsilon = 1e-9);

    // One spectral field per configured period, labelled by period.
    assert!(out.metrics.get("RSA_T_0.100").is_some());
    assert!(out.metrics.get("RSA_T_5.000").is_some());
    assert_eq!(out.metrics.fields.len(), 4 + cfg.periods.len());

    // Station-info fields carry node coordinates and fault distance
    // (all nodes sit between the default fault x-bounds, so Rjb = |y| = 0).
    let x = out.station_info.get("x").unwrap();
    assert_eq!(x.get(0, 1), 5.0);
    assert_eq!(out.station_info.get("Rjb").unwrap().get(0, 0), 0.0);
}

#[test]
fn degenerate_spacing_is_rejected_before_the_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = setup(dir.path());

    let index = StationIndex::build(dir.path(), &cfg).unwrap();
    let resolver = StationResolver::new(&index, dir.path(), &cfg.coord_prefix);
    let evaluator = GridEvaluator::new(&cfg, &resolver);

    for spacing in [0.0, -5.0, f64::NAN, f64::INFINITY] {
        let spec = GridSpec {
            x_range: [0.0, 10.0],
            y_range: [0.0, 0.0],
            spacing,
        };
        let err = evaluator.evaluate(&spec).unwrap_err();
        assert!(matches!(err, GmError::InvalidGridSpacing(_)));
    }
}
