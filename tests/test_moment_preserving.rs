mod common;

use common::build_test_data;
use muscat::factory;
use muscat::{FakeStreamRng, Sampling, TwoDInterp};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_energy_is_conserved() {
    let data = build_test_data();
    let dist = factory::create_moment_preserving_elastic_distribution(
        &data.forward_view(),
        TwoDInterp::LinLinLog,
        Sampling::Correlated,
        0.9,
        1e-7,
    )
    .unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    for energy in [1e-5, 1e-4, 1e-3, 1e2, 1e5] {
        for _ in 0..50 {
            let (e_out, _) = dist.sample(energy, &mut rng);
            assert_eq!(e_out, energy);
        }
    }
}

#[test]
fn test_angles_stay_above_cutoff() {
    let data = build_test_data();
    let dist = factory::create_moment_preserving_elastic_distribution(
        &data.forward_view(),
        TwoDInterp::LinLinLog,
        Sampling::Correlated,
        0.9,
        1e-7,
    )
    .unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    for energy in [1e-5, 1e-4, 1e-3, 1e2, 1e5] {
        for _ in 0..200 {
            let (_, mu) = dist.sample(energy, &mut rng);
            assert!(mu > 0.9 && mu <= 1.0, "mu = {} at {}", mu, energy);
        }
    }
}

#[test]
fn test_discrete_picks_at_grid_energy() {
    let data = build_test_data();
    let dist = factory::create_moment_preserving_elastic_distribution(
        &data.forward_view(),
        TwoDInterp::LinLinLog,
        Sampling::Correlated,
        0.9,
        1e-7,
    )
    .unwrap();

    // Weights at 1e-3 are [0.25, 0.75] over angles [0.92, 0.96]
    let mut rng = FakeStreamRng::new(vec![0.0, 0.25, 0.5, 1.0 - 1e-15]);
    let (_, mu) = dist.sample(1e-3, &mut rng);
    assert_eq!(mu, 0.92);
    let (_, mu) = dist.sample(1e-3, &mut rng);
    assert_eq!(mu, 0.92);
    let (_, mu) = dist.sample(1e-3, &mut rng);
    assert_eq!(mu, 0.96);
    let (_, mu) = dist.sample(1e-3, &mut rng);
    assert_eq!(mu, 0.96);
}

#[test]
fn test_correlated_interpolation_between_discrete_tables() {
    let data = build_test_data();
    let dist = factory::create_moment_preserving_elastic_distribution(
        &data.forward_view(),
        TwoDInterp::LinLinLog,
        Sampling::Correlated,
        0.9,
        1e-7,
    )
    .unwrap();

    // Between 1e-3 ([0.92, 0.96] tables) and 1e5 ([0.95, 0.98]) a
    // correlated draw of 0.125 picks the first point of each table and
    // interpolates between 0.92 and 0.95
    let mut rng = FakeStreamRng::new(vec![0.125]);
    let (_, mu) = dist.sample(1.0, &mut rng);
    assert!(mu > 0.92 && mu < 0.95, "mu = {}", mu);
}

#[test]
fn test_requires_moment_preserving_data() {
    let mut data = build_test_data();
    data.forward.moment_preserving = None;
    let err = factory::create_moment_preserving_elastic_distribution(
        &data.forward_view(),
        TwoDInterp::LinLinLog,
        Sampling::Correlated,
        0.9,
        1e-7,
    )
    .unwrap_err();
    assert!(err.to_string().contains("moment preserving"));
}

#[test]
fn test_threshold_trimming_invariants() {
    let data = build_test_data();
    let view = data.forward_view();
    let (cross_sections, threshold_index) = factory::moment_preserving_cross_sections(
        &view,
        TwoDInterp::LinLinLog,
        Sampling::Correlated,
        1e-7,
    )
    .unwrap();

    let grid_len = view.electron_energy_grid().len();
    assert_eq!(cross_sections.len() + threshold_index, grid_len);
    assert!(cross_sections.iter().all(|cs| *cs >= 0.0));
    // The test dataset has reduction data at every energy, so nothing is
    // trimmed and every entry is positive
    assert_eq!(threshold_index, 0);
    assert!(cross_sections.iter().all(|cs| *cs > 0.0));
}

#[test]
fn test_threshold_trims_leading_degenerate_entries() {
    let mut data = build_test_data();
    // Zero out the reduction at the lowest angular energy; the log-log
    // reduction table then has no support at the bottom grid point
    if let Some(mp) = &mut data.forward.moment_preserving {
        mp.cross_section_reduction = vec![0.0, 0.1, 0.1];
    }
    let view = data.forward_view();
    let (cross_sections, threshold_index) = factory::moment_preserving_cross_sections(
        &view,
        TwoDInterp::LinLinLog,
        Sampling::Correlated,
        1e-7,
    )
    .unwrap();

    assert!(threshold_index >= 1);
    assert_eq!(
        cross_sections.len() + threshold_index,
        view.electron_energy_grid().len()
    );
    assert!(cross_sections.iter().all(|cs| *cs >= 0.0));
}
