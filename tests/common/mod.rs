// Shared synthetic hydrogen-like dataset for the distribution tests
use muscat::{ElasticDataTable, ElectronElasticData, MomentPreservingTable, MU_PEAK};

/// Relative comparison helper; exact equality short-circuits so boundary
/// values can be checked without tolerance.
pub fn assert_relative_eq(actual: f64, expected: f64, tol: f64) {
    if actual == expected {
        return;
    }
    let denom = expected.abs().max(actual.abs());
    assert!(
        ((actual - expected) / denom).abs() <= tol,
        "relative mismatch: actual {:e} expected {:e} (tol {:e})",
        actual,
        expected,
        tol
    );
}

fn forward_table() -> ElasticDataTable {
    ElasticDataTable {
        angular_energy_grid: vec![1e-5, 1e-3, 1e5],
        cutoff_angles: vec![
            vec![-1.0, 0.0, 0.9, MU_PEAK],
            vec![-1.0, 0.0, 0.9, MU_PEAK],
            vec![-1.0, 0.0, 0.9, MU_PEAK],
        ],
        cutoff_pdf: vec![
            // Uniform tables at the two lower energies keep the inverse
            // CDF linear for hand-checked expectations
            vec![0.5, 0.5, 0.5, 0.5],
            vec![0.5, 0.5, 0.5, 0.5],
            vec![0.1, 0.2, 1.0, 8.0],
        ],
        energy_grid: vec![1e-5, 1e-3, 1e5],
        cutoff_cross_section: vec![9.0, 9.0, 9.0],
        total_cross_section: vec![10.0, 10.0, 10.0],
        moment_preserving: Some(MomentPreservingTable {
            discrete_angles: vec![
                vec![0.92, 0.96],
                vec![0.92, 0.96],
                vec![0.95, 0.98],
            ],
            weights: vec![vec![0.25, 0.75], vec![0.25, 0.75], vec![0.5, 0.5]],
            cross_section_reduction: vec![0.1, 0.1, 0.1],
        }),
    }
}

/// Hydrogen-like test dataset: constant 0.9 cutoff/total ratio, uniform
/// angular tables at the two lower energies, forward peaked at the top,
/// moment preserving data generated at a 0.9 cutoff.
pub fn build_test_data() -> ElectronElasticData {
    let data = ElectronElasticData {
        atomic_number: 1,
        cutoff_angle_cosine: 0.9,
        forward: forward_table(),
        adjoint: Some(forward_table()),
    };
    data.validate().expect("test dataset is valid");
    data
}
