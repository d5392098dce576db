//! Elastic electron scattering angular distribution construction and
//! Monte Carlo sampling from tabulated nuclear data.
//!
//! The factory module builds five kinds of sampling distributions from a
//! native data container: continuous cutoff, analytic screened Rutherford,
//! discrete moment preserving, hybrid (cutoff + moment preserving) and
//! coupled (cutoff + screened Rutherford). Every distribution samples a
//! scattering angle cosine and leaves the particle energy unchanged; built
//! objects are immutable and safe to share across worker threads.

mod bivariate;
mod coupled;
mod cross_sections;
mod cutoff;
mod data;
mod error;
pub mod factory;
mod grid;
mod hybrid;
mod interpolation;
mod moment_preserving;
mod rng;
mod screened_rutherford;
mod screening;
mod univariate;

pub use bivariate::{ScatteringFunction, SecondaryDistribution, FUZZY_BOUND_TOL};
pub use coupled::{CoupledElasticDistribution, CoupledSamplingMethod};
pub use cross_sections::{
    calculate_moment_preserving_cross_sections, create_cutoff_cross_section_ratios,
    create_hybrid_cross_section_ratios, expand_to_full_grid,
};
pub use cutoff::CutoffElasticDistribution;
pub use data::{DataView, ElasticDataTable, ElectronElasticData, MomentPreservingTable};
pub use error::{Error, Result};
pub use grid::{
    angular_grid_above_cutoff, angular_grid_above_cutoff_at_energy,
    angular_grid_and_pdf_below_cutoff, angular_grid_below_cutoff, GridRefiner,
};
pub use hybrid::HybridElasticDistribution;
pub use interpolation::{Interp, Sampling, TwoDInterp};
pub use moment_preserving::MomentPreservingElasticDistribution;
pub use rng::FakeStreamRng;
pub use screened_rutherford::ScreenedRutherfordElasticDistribution;
pub use screening::{ScreeningTraits, DELTA_MU_PEAK, MU_PEAK};
pub use univariate::{
    CoupledElasticUnivariate, DiscreteDistribution, HybridElasticUnivariate,
    TabularDistribution,
};
