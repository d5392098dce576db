// Construction entry points for the elastic scattering distributions
//
// Every constructor is a pure function of the data container view, the
// policy pair and its tolerances: the same inputs always produce the same
// distribution object. Forward and adjoint data go through the same code
// paths via `DataView`.

use crate::bivariate::{ScatteringFunction, SecondaryDistribution};
use crate::coupled::{CoupledElasticDistribution, CoupledSamplingMethod};
use crate::cross_sections::{
    calculate_moment_preserving_cross_sections, create_cutoff_cross_section_ratios,
    create_hybrid_cross_section_ratios, expand_to_full_grid,
};
use crate::cutoff::CutoffElasticDistribution;
use crate::data::DataView;
use crate::error::{Error, Result};
use crate::grid::{angular_grid_and_pdf_below_cutoff, raw_grid_at_energy, GridRefiner};
use crate::hybrid::HybridElasticDistribution;
use crate::interpolation::{Interp, Sampling, TwoDInterp};
use crate::moment_preserving::MomentPreservingElasticDistribution;
use crate::screened_rutherford::ScreenedRutherfordElasticDistribution;
use crate::screening::{ScreeningTraits, MU_PEAK};
use crate::univariate::{
    CoupledElasticUnivariate, DiscreteDistribution, HybridElasticUnivariate,
    TabularDistribution,
};

fn check_cutoff_angle(cutoff_mu: f64) -> Result<()> {
    if cutoff_mu <= -1.0 || cutoff_mu > 1.0 {
        return Err(Error::InvalidValue {
            name: "cutoff_angle_cosine",
            value: cutoff_mu,
            expected: "(-1, 1]",
        });
    }
    Ok(())
}

// A cutoff of 1 leaves no angular room for a discrete or analytic tail;
// those datasets are sampled with the pure cutoff distribution instead
fn check_tail_cutoff(cutoff_mu: f64) -> Result<()> {
    if cutoff_mu >= 1.0 {
        return Err(Error::InvalidValue {
            name: "cutoff_angle_cosine",
            value: cutoff_mu,
            expected: "< 1 when a tail component is requested",
        });
    }
    Ok(())
}

fn check_evaluation_tol(evaluation_tol: f64) -> Result<()> {
    if evaluation_tol <= 0.0 || evaluation_tol >= 1.0 {
        return Err(Error::InvalidValue {
            name: "evaluation_tol",
            value: evaluation_tol,
            expected: "(0, 1)",
        });
    }
    Ok(())
}

/// Build the tabulated (energy, angle) scattering function from per-energy
/// angular tables, optionally trimmed to the region below the cutoff.
///
/// With `discrete` set the tables are interpreted as discrete
/// angle/weight pairs; discrete tables cannot be trimmed mid-grid.
pub fn create_scattering_function(
    angles: &[Vec<f64>],
    pdfs: &[Vec<f64>],
    energy_grid: &[f64],
    interp: TwoDInterp,
    sampling: Sampling,
    cutoff_mu: f64,
    evaluation_tol: f64,
    discrete: bool,
) -> Result<ScatteringFunction> {
    let mut distributions = Vec::with_capacity(energy_grid.len());
    for (angle_table, pdf_table) in angles.iter().zip(pdfs) {
        let last_angle = *angle_table.last().ok_or(Error::InvalidValue {
            name: "cutoff_angles",
            value: 0.0,
            expected: "a non-empty angular grid",
        })?;

        let dist = if cutoff_mu < last_angle {
            if discrete {
                return Err(Error::InvalidValue {
                    name: "cutoff_angle_cosine",
                    value: cutoff_mu,
                    expected: "no trimming of discrete angular tables",
                });
            }
            let (grid, pdf) = angular_grid_and_pdf_below_cutoff(
                angle_table,
                pdf_table,
                cutoff_mu,
                Interp::LinLin,
            )?;
            SecondaryDistribution::Tabular(TabularDistribution::new(
                Interp::LinLin,
                grid,
                pdf,
            )?)
        } else if discrete {
            SecondaryDistribution::Discrete(DiscreteDistribution::new(
                angle_table.clone(),
                pdf_table.clone(),
            )?)
        } else {
            SecondaryDistribution::Tabular(TabularDistribution::new(
                Interp::LinLin,
                angle_table.clone(),
                pdf_table.clone(),
            )?)
        };
        distributions.push(dist);
    }

    ScatteringFunction::new(
        energy_grid.to_vec(),
        distributions,
        interp,
        sampling,
        evaluation_tol,
    )
}

/// Build the single-energy angular distribution restricted to
/// [-1, cutoff_mu].
pub fn create_scattering_function_in_subrange(
    raw_grid: &[f64],
    raw_pdf: &[f64],
    energy: f64,
    cutoff_mu: f64,
) -> Result<(f64, TabularDistribution)> {
    let (grid, pdf) =
        angular_grid_and_pdf_below_cutoff(raw_grid, raw_pdf, cutoff_mu, Interp::LinLin)?;
    Ok((energy, TabularDistribution::new(Interp::LinLin, grid, pdf)?))
}

/// Create the continuous cutoff elastic distribution.
pub fn create_cutoff_elastic_distribution(
    data: &DataView<'_>,
    interp: TwoDInterp,
    sampling: Sampling,
    cutoff_mu: f64,
    evaluation_tol: f64,
) -> Result<CutoffElasticDistribution> {
    check_cutoff_angle(cutoff_mu)?;
    check_evaluation_tol(evaluation_tol)?;

    let angles = data.cutoff_elastic_angles();
    let pdfs = data.cutoff_elastic_pdf();
    let energy_grid = data.elastic_angular_energy_grid();

    let full_function = create_scattering_function(
        angles,
        pdfs,
        energy_grid,
        interp,
        sampling,
        MU_PEAK,
        evaluation_tol,
        false,
    )?;

    let restricted_function = if cutoff_mu < MU_PEAK {
        Some(create_scattering_function(
            angles,
            pdfs,
            energy_grid,
            interp,
            sampling,
            cutoff_mu,
            evaluation_tol,
            false,
        )?)
    } else {
        None
    };

    Ok(CutoffElasticDistribution::new(
        full_function,
        restricted_function,
        cutoff_mu.min(MU_PEAK),
    ))
}

/// Create the analytic screened Rutherford distribution for an element.
pub fn create_screened_rutherford_elastic_distribution(
    atomic_number: u32,
) -> Result<ScreenedRutherfordElasticDistribution> {
    Ok(ScreenedRutherfordElasticDistribution::new(
        ScreeningTraits::new(atomic_number)?,
    ))
}

/// Create the discrete moment preserving distribution above the cutoff.
pub fn create_moment_preserving_elastic_distribution(
    data: &DataView<'_>,
    interp: TwoDInterp,
    sampling: Sampling,
    cutoff_mu: f64,
    evaluation_tol: f64,
) -> Result<MomentPreservingElasticDistribution> {
    check_cutoff_angle(cutoff_mu)?;
    check_tail_cutoff(cutoff_mu)?;
    check_evaluation_tol(evaluation_tol)?;

    let scattering_function = create_scattering_function(
        data.moment_preserving_elastic_discrete_angles()?,
        data.moment_preserving_elastic_weights()?,
        data.elastic_angular_energy_grid(),
        interp,
        sampling,
        1.0,
        evaluation_tol,
        true,
    )?;

    Ok(MomentPreservingElasticDistribution::new(
        scattering_function,
        cutoff_mu,
    ))
}

/// Create the hybrid (cutoff + moment preserving) distribution.
///
/// The moment preserving cross sections are derived from the dataset's
/// reduction tables with the same policy pair as the scattering function.
pub fn create_hybrid_elastic_distribution(
    data: &DataView<'_>,
    interp: TwoDInterp,
    sampling: Sampling,
    cutoff_mu: f64,
    evaluation_tol: f64,
) -> Result<HybridElasticDistribution> {
    check_cutoff_angle(cutoff_mu)?;
    check_tail_cutoff(cutoff_mu)?;
    check_evaluation_tol(evaluation_tol)?;
    if !data.has_moment_preserving_data() {
        return Err(Error::MissingMomentPreservingData);
    }

    let energy_grid = data.electron_energy_grid();

    // Continuous scattering function over the full tabulated angular range
    let full_continuous_function = create_scattering_function(
        data.cutoff_elastic_angles(),
        data.cutoff_elastic_pdf(),
        data.elastic_angular_energy_grid(),
        interp,
        sampling,
        1.0,
        evaluation_tol,
        false,
    )?;

    let (mp_cross_sections, threshold_index) =
        moment_preserving_cross_sections(data, interp, sampling, evaluation_tol)?;
    let mp_full = expand_to_full_grid(&mp_cross_sections, threshold_index, energy_grid.len());

    let cross_section_ratios = create_hybrid_cross_section_ratios(
        energy_grid,
        data.cutoff_elastic_cross_section(),
        &mp_full,
        &full_continuous_function,
        cutoff_mu,
    )?;

    // Per-energy gated unions over the angular energy grid
    let angular_energy_grid = data.elastic_angular_energy_grid();
    let discrete_angles = data.moment_preserving_elastic_discrete_angles()?;
    let discrete_weights = data.moment_preserving_elastic_weights()?;

    let mut distributions = Vec::with_capacity(angular_energy_grid.len());
    for (n, energy) in angular_energy_grid.iter().enumerate() {
        let ratio = cross_section_ratios.evaluate(*energy);
        distributions.push(SecondaryDistribution::Hybrid(HybridElasticUnivariate::new(
            data.cutoff_elastic_angles()[n].clone(),
            data.cutoff_elastic_pdf()[n].clone(),
            discrete_angles[n].clone(),
            discrete_weights[n].clone(),
            cutoff_mu,
            ratio,
        )?));
    }

    let hybrid_function = ScatteringFunction::new(
        angular_energy_grid.to_vec(),
        distributions,
        interp,
        sampling,
        evaluation_tol,
    )?;

    Ok(HybridElasticDistribution::new(
        hybrid_function,
        cutoff_mu,
        evaluation_tol,
    ))
}

/// Create the coupled (cutoff + screened Rutherford) distribution over the
/// full angular range.
pub fn create_coupled_elastic_distribution(
    data: &DataView<'_>,
    interp: TwoDInterp,
    sampling: Sampling,
    method: CoupledSamplingMethod,
    evaluation_tol: f64,
) -> Result<CoupledElasticDistribution> {
    check_evaluation_tol(evaluation_tol)?;

    // The modified union's gate requires the correlated junction CDF; the
    // stochastic policy cannot provide it for the log-cosine tables
    if method == CoupledSamplingMethod::ModifiedTwoDUnion
        && sampling == Sampling::Stochastic
        && matches!(
            interp,
            TwoDInterp::LogLogCosLog | TwoDInterp::LogNudgedLogCosLog
        )
    {
        return Err(Error::UnknownName {
            kind: "coupled sampling configuration",
            name: format!("{} with stochastic {}", method.name(), interp.name()),
        });
    }

    let traits = ScreeningTraits::new(data.atomic_number())?;
    let cross_section_ratios = create_cutoff_cross_section_ratios(
        data.electron_energy_grid(),
        data.cutoff_elastic_cross_section(),
        data.total_elastic_cross_section(),
    )?;

    let angular_energy_grid = data.elastic_angular_energy_grid();
    let mut distributions = Vec::with_capacity(angular_energy_grid.len());
    for (n, energy) in angular_energy_grid.iter().enumerate() {
        let eta = traits.moliere_eta(*energy);
        let ratio = cross_section_ratios.evaluate(*energy);
        distributions.push(SecondaryDistribution::Coupled(CoupledElasticUnivariate::new(
            data.cutoff_elastic_angles()[n].clone(),
            data.cutoff_elastic_pdf()[n].clone(),
            eta,
            ratio,
        )?));
    }

    let scattering_function = ScatteringFunction::new(
        angular_energy_grid.to_vec(),
        distributions,
        interp,
        sampling,
        evaluation_tol,
    )?;

    Ok(CoupledElasticDistribution::new(
        scattering_function,
        cross_section_ratios,
        traits,
        method,
    ))
}

/// Moment preserving cross sections on the electron energy grid, trimmed
/// via the threshold index.
pub fn moment_preserving_cross_sections(
    data: &DataView<'_>,
    interp: TwoDInterp,
    sampling: Sampling,
    evaluation_tol: f64,
) -> Result<(Vec<f64>, usize)> {
    if !data.has_moment_preserving_data() {
        return Err(Error::MissingMomentPreservingData);
    }

    let cutoff_distribution =
        create_cutoff_elastic_distribution(data, interp, sampling, MU_PEAK, evaluation_tol)?;

    let reduction_distribution = TabularDistribution::new(
        Interp::LogLog,
        data.elastic_angular_energy_grid().to_vec(),
        data.moment_preserving_cross_section_reduction()?.to_vec(),
    )?;

    calculate_moment_preserving_cross_sections(
        &cutoff_distribution,
        &reduction_distribution,
        data.electron_energy_grid(),
        data.cutoff_elastic_cross_section(),
        data.total_elastic_cross_section(),
        data.dataset_cutoff_angle_cosine(),
    )
}

/// Evaluate the angular grid and PDF of the continuous cutoff piece at an
/// arbitrary energy inside the angular energy grid.
///
/// At tabulated energies this is the trimmed table itself (idempotent at
/// the cutoff); between energies a two-point scattering function is built
/// from the bracketing tables and the nearest tabulated grid is refined
/// against its conditional PDF until adjacent-point convergence.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_angular_grid_and_pdf(
    angles: &[Vec<f64>],
    pdfs: &[Vec<f64>],
    angular_energy_grid: &[f64],
    energy: f64,
    interp: TwoDInterp,
    sampling: Sampling,
    cutoff_mu: f64,
    evaluation_tol: f64,
    grid_convergence_tol: f64,
    absolute_diff_tol: f64,
    distance_tol: f64,
) -> Result<(Vec<f64>, Vec<f64>)> {
    check_cutoff_angle(cutoff_mu)?;
    check_evaluation_tol(evaluation_tol)?;

    let min = angular_energy_grid[0];
    let max = *angular_energy_grid.last().unwrap();
    if energy < min || energy > max {
        return Err(Error::EnergyOutsideGrid { energy, min, max });
    }

    if let Some(i) = angular_energy_grid.iter().position(|e| *e == energy) {
        return angular_grid_and_pdf_below_cutoff(
            &angles[i],
            &pdfs[i],
            cutoff_mu,
            Interp::LinLin,
        );
    }

    let upper = angular_energy_grid
        .iter()
        .position(|e| *e > energy)
        .expect("energy inside grid bounds");
    let lower = upper - 1;

    let scattering_function = create_scattering_function(
        &[angles[lower].clone(), angles[upper].clone()],
        &[pdfs[lower].clone(), pdfs[upper].clone()],
        &[angular_energy_grid[lower], angular_energy_grid[upper]],
        interp,
        sampling,
        MU_PEAK,
        evaluation_tol,
        false,
    )?;

    let raw_grid = raw_grid_at_energy(angular_energy_grid, angles, energy)?;
    let mut angular_grid = crate::grid::angular_grid_below_cutoff(raw_grid, cutoff_mu);

    let refiner = GridRefiner::new(grid_convergence_tol, absolute_diff_tol, distance_tol);
    let evaluated_pdf = refiner.refine_and_evaluate(&mut angular_grid, |mu| {
        scattering_function.evaluate_secondary_conditional_pdf(energy, mu)
    });

    Ok((angular_grid, evaluated_pdf))
}
