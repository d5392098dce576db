// Derived elastic cross sections: moment preserving tails and sampling ratios
//
// The moment preserving cross section at an energy is the cross section
// scattered past the cutoff angle, reduced by the tabulated discretization
// factor:
//
//   mp_cs(E) = reduction(E) * [ (total - cutoff) + (1 - F(E, mu_c)) * cutoff ]
//
// where F is the cutoff distribution's conditional angular CDF. Entries at
// energies where the reduction table has no support evaluate to zero and are
// trimmed off the front through the threshold index.

use crate::bivariate::ScatteringFunction;
use crate::cutoff::CutoffElasticDistribution;
use crate::error::{check_same_length, Error, Result};
use crate::interpolation::Interp;
use crate::univariate::TabularDistribution;

/// Build the cutoff/total elastic cross section ratio function over the
/// energy grid (log-log tabular, domain bounds equal to the grid extremes).
pub fn create_cutoff_cross_section_ratios(
    energy_grid: &[f64],
    cutoff_cross_section: &[f64],
    total_cross_section: &[f64],
) -> Result<TabularDistribution> {
    check_same_length(
        "energy_grid/cutoff_cross_section",
        energy_grid.len(),
        cutoff_cross_section.len(),
    )?;
    check_same_length(
        "energy_grid/total_cross_section",
        energy_grid.len(),
        total_cross_section.len(),
    )?;

    let mut ratios = Vec::with_capacity(energy_grid.len());
    for (i, (cutoff, total)) in cutoff_cross_section
        .iter()
        .zip(total_cross_section)
        .enumerate()
    {
        if *total <= 0.0 {
            return Err(Error::InvalidValue {
                name: "total_cross_section",
                value: *total,
                expected: "> 0 at every energy grid point",
            });
        }
        if cutoff > total {
            return Err(Error::InvalidValue {
                name: "cutoff_cross_section",
                value: energy_grid[i],
                expected: "cutoff <= total at every energy",
            });
        }
        ratios.push(cutoff / total);
    }
    TabularDistribution::new(Interp::LogLog, energy_grid.to_vec(), ratios)
}

/// Build the hybrid sampling ratio function over the energy grid:
/// at each energy, the fraction of the combined (reduced cutoff + moment
/// preserving) cross section carried by the continuous piece below the
/// cutoff angle.
pub fn create_hybrid_cross_section_ratios(
    energy_grid: &[f64],
    cutoff_cross_section: &[f64],
    moment_preserving_cross_section: &[f64],
    cutoff_scattering_function: &ScatteringFunction,
    cutoff_mu: f64,
) -> Result<TabularDistribution> {
    check_same_length(
        "energy_grid/cutoff_cross_section",
        energy_grid.len(),
        cutoff_cross_section.len(),
    )?;
    check_same_length(
        "energy_grid/moment_preserving_cross_section",
        energy_grid.len(),
        moment_preserving_cross_section.len(),
    )?;

    let mut ratios = Vec::with_capacity(energy_grid.len());
    for ((energy, cutoff_cs), mp_cs) in energy_grid
        .iter()
        .zip(cutoff_cross_section)
        .zip(moment_preserving_cross_section)
    {
        let cutoff_cdf =
            cutoff_scattering_function.evaluate_secondary_conditional_cdf(*energy, cutoff_mu);
        let reduced_cross_section = cutoff_cs * cutoff_cdf;
        ratios.push(reduced_cross_section / (reduced_cross_section + mp_cs));
    }
    TabularDistribution::new(Interp::LogLog, energy_grid.to_vec(), ratios)
}

/// Moment preserving cross sections on the energy grid, trimmed to the
/// first positive entry.
///
/// Returns the suffix of positive entries and the threshold index such that
/// `cross_sections.len() + threshold_energy_index == energy_grid.len()`.
/// Degenerate (zero or negative) leading entries are the normal condition
/// near the reaction threshold, not an error; interior degeneracies after
/// the threshold are clamped to zero.
pub fn calculate_moment_preserving_cross_sections(
    cutoff_distribution: &CutoffElasticDistribution,
    reduction_distribution: &TabularDistribution,
    energy_grid: &[f64],
    cutoff_cross_section: &[f64],
    total_cross_section: &[f64],
    cutoff_mu: f64,
) -> Result<(Vec<f64>, usize)> {
    check_same_length(
        "energy_grid/cutoff_cross_section",
        energy_grid.len(),
        cutoff_cross_section.len(),
    )?;
    check_same_length(
        "energy_grid/total_cross_section",
        energy_grid.len(),
        total_cross_section.len(),
    )?;

    let mut raw = Vec::with_capacity(energy_grid.len());
    for ((energy, cutoff_cs), total_cs) in energy_grid
        .iter()
        .zip(cutoff_cross_section)
        .zip(total_cross_section)
    {
        raw.push(moment_preserving_cross_section_at(
            cutoff_distribution,
            reduction_distribution,
            *energy,
            *cutoff_cs,
            *total_cs,
            cutoff_mu,
        ));
    }

    let threshold_energy_index = raw
        .iter()
        .position(|cs| *cs > 0.0)
        .unwrap_or(energy_grid.len());

    let cross_sections = raw[threshold_energy_index..]
        .iter()
        .map(|cs| cs.max(0.0))
        .collect();
    Ok((cross_sections, threshold_energy_index))
}

/// Expand a threshold-trimmed cross section back onto the full energy grid
/// with zeros below the threshold.
pub fn expand_to_full_grid(
    cross_sections: &[f64],
    threshold_energy_index: usize,
    grid_len: usize,
) -> Vec<f64> {
    let mut full = vec![0.0; grid_len];
    full[threshold_energy_index..].copy_from_slice(cross_sections);
    full
}

fn moment_preserving_cross_section_at(
    cutoff_distribution: &CutoffElasticDistribution,
    reduction_distribution: &TabularDistribution,
    energy: f64,
    cutoff_cross_section: f64,
    total_cross_section: f64,
    cutoff_mu: f64,
) -> f64 {
    let reduction = reduction_distribution.evaluate(energy);
    if reduction <= 0.0 {
        return 0.0;
    }
    let cutoff_cdf = cutoff_distribution.evaluate_cutoff_cdf(energy, cutoff_mu);
    let rutherford_cross_section = total_cross_section - cutoff_cross_section;
    reduction * (rutherford_cross_section + (1.0 - cutoff_cdf) * cutoff_cross_section)
}
