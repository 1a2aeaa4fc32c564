//! End-to-end diagnostics on published narrow-line-region ratios.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use fivel::solver::{IterationOrder, TemperatureGrid};
use fivel::{AtomicDataTable, CoupledIterator, DiagnosticSolver, FivelError, IonId, IterationConfig};

/// One grid step, allowing for a neighbouring sample at the sign change.
const GRID_SLACK: f64 = 0.11;

#[test]
fn ngc3227_oiii_sii() {
    let table = AtomicDataTable::osterbrock();
    let (diagnosis, trace) = CoupledIterator::new(&table)
        .converge_traced(122.72, 1.36, IonId::Oiii, IonId::Sii)
        .unwrap();

    assert_abs_diff_eq!(diagnosis.temperature, 12033.8, epsilon = GRID_SLACK);
    assert_relative_eq!(diagnosis.density, 114.70197, max_relative = 1e-4);
    assert_eq!(diagnosis.rounds, 4);

    assert_eq!(trace.len(), 4);
    assert_abs_diff_eq!(trace[0].temperature, 11808.4, epsilon = GRID_SLACK);
    assert_relative_eq!(trace[0].density, 113.62268, max_relative = 1e-4);
    assert_eq!(trace[3].round, 4);
}

#[test]
fn ngc1068_hot_gas() {
    let table = AtomicDataTable::osterbrock();
    let diagnosis = CoupledIterator::new(&table)
        .converge(15.628, 1.228, IonId::Oiii, IonId::Sii)
        .unwrap();

    assert_abs_diff_eq!(diagnosis.temperature, 52338.2, epsilon = GRID_SLACK);
    assert_relative_eq!(diagnosis.density, 530.5349, max_relative = 1e-4);
}

#[test]
fn ngc5548_ratio_above_low_density_limit() {
    // [S II] 1.523 lies beyond the low-density limit, so the closed form goes negative
    let table = AtomicDataTable::osterbrock();
    let err = CoupledIterator::new(&table)
        .converge(65.865, 1.523, IonId::Oiii, IonId::Sii)
        .unwrap_err();

    assert!(matches!(err, FivelError::DegenerateRatio { ion: IonId::Sii, .. }));
}

#[test]
fn nii_with_oii() {
    let table = AtomicDataTable::osterbrock();
    let diagnosis = CoupledIterator::new(&table)
        .converge(80.0, 1.2, IonId::Nii, IonId::Oii)
        .unwrap();

    assert_abs_diff_eq!(diagnosis.temperature, 10982.0, epsilon = GRID_SLACK);
    assert_relative_eq!(diagnosis.density, 217.1802, max_relative = 1e-4);
}

#[test]
fn density_first_reaches_same_fixed_point() {
    let table = AtomicDataTable::osterbrock();
    let config = IterationConfig::new().with_order(IterationOrder::DensityFirst);
    let diagnosis = CoupledIterator::with_config(DiagnosticSolver::new(&table), config)
        .converge(122.72, 1.36, IonId::Oiii, IonId::Sii)
        .unwrap();

    assert_abs_diff_eq!(diagnosis.temperature, 12033.8, epsilon = GRID_SLACK);
    assert_relative_eq!(diagnosis.density, 114.70197, max_relative = 1e-4);
}

#[test]
fn zero_rounds_returns_seeded_first_solve() {
    let table = AtomicDataTable::osterbrock();
    let config = IterationConfig::new().with_rounds(0);
    let diagnosis = CoupledIterator::with_config(DiagnosticSolver::new(&table), config)
        .converge(122.72, 1.36, IonId::Oiii, IonId::Sii)
        .unwrap();

    assert_abs_diff_eq!(diagnosis.temperature, 11808.4, epsilon = GRID_SLACK);
    assert_eq!(diagnosis.density, 1e4);
    assert_eq!(diagnosis.rounds, 0);
}

#[test]
fn repeated_runs_are_bitwise_identical() {
    let table = AtomicDataTable::osterbrock();
    let iterator = CoupledIterator::new(&table);
    let a = iterator.converge(122.72, 1.36, IonId::Oiii, IonId::Sii).unwrap();
    let b = iterator.converge(122.72, 1.36, IonId::Oiii, IonId::Sii).unwrap();

    assert_eq!(a.temperature.to_bits(), b.temperature.to_bits());
    assert_eq!(a.density.to_bits(), b.density.to_bits());
}

#[test]
fn unknown_ion_by_name() {
    let table = AtomicDataTable::osterbrock();
    let err = DiagnosticSolver::new(&table).solve(1.0, 1e4, "XEON").unwrap_err();
    assert!(matches!(err, FivelError::UnknownIon { ref ion } if ion == "XEON"));
}

#[test]
fn unreachable_ratio_has_no_root() {
    let table = AtomicDataTable::osterbrock();
    let err = CoupledIterator::new(&table)
        .converge(1.0, 1.36, IonId::Oiii, IonId::Sii)
        .unwrap_err();
    assert!(matches!(err, FivelError::NoRootFound { ion: IonId::Oiii, .. }));
}

#[test]
fn swapped_roles_are_rejected() {
    let table = AtomicDataTable::osterbrock();
    let err = CoupledIterator::new(&table)
        .converge(1.36, 122.72, IonId::Sii, IonId::Oiii)
        .unwrap_err();
    assert!(matches!(
        err,
        FivelError::FamilyMismatch {
            ion: IonId::Sii,
            ..
        }
    ));
}

#[test]
fn coarse_grid_stays_within_one_step() {
    let table = AtomicDataTable::osterbrock();
    let grid = TemperatureGrid::new(100.0, 1e5, 10.0).unwrap();
    let diagnosis = CoupledIterator::with_grid(&table, grid, IterationConfig::default())
        .converge(122.72, 1.36, IonId::Oiii, IonId::Sii)
        .unwrap();

    assert!((diagnosis.temperature - 12033.8).abs() <= 10.0);
    assert_relative_eq!(diagnosis.density, 114.70197, max_relative = 1e-3);
}

#[test]
fn atomic_data_override_limits_available_ions() {
    let full: serde_json::Value =
        serde_json::from_str(&AtomicDataTable::osterbrock().to_json_string().unwrap()).unwrap();
    let mut partial = serde_json::Map::new();
    partial.insert("OIII".into(), full["OIII"].clone());
    partial.insert("SII".into(), full["SII"].clone());
    let table = AtomicDataTable::from_json_str(&serde_json::Value::Object(partial).to_string()).unwrap();

    let diagnosis = CoupledIterator::new(&table)
        .converge(122.72, 1.36, IonId::Oiii, IonId::Sii)
        .unwrap();
    assert_abs_diff_eq!(diagnosis.temperature, 12033.8, epsilon = GRID_SLACK);

    let err = CoupledIterator::new(&table)
        .converge(80.0, 1.2, IonId::Nii, IonId::Oii)
        .unwrap_err();
    assert!(matches!(err, FivelError::UnknownIon { .. }));
}
