// Coupled elastic scattering distribution
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bivariate::ScatteringFunction;
use crate::error::{Error, Result};
use crate::screened_rutherford::sample_peak;
use crate::screening::{ScreeningTraits, MU_PEAK};
use crate::univariate::TabularDistribution;

/// Union strategy for sampling the coupled (cutoff + screened Rutherford)
/// distribution over the full angular range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoupledSamplingMethod {
    /// Sample the unioned 2-D table directly: each per-energy table gates
    /// at its own tabulated cross section ratio
    TwoDUnion,
    /// Gate on the locally interpolated cross section ratio, then sample
    /// the selected piece with 1-D interpolation only
    OneDUnion,
    /// As `TwoDUnion`, but the peak region is replaced by the analytic
    /// form gated at the union's own junction CDF, keeping the
    /// cutoff-to-peak transition continuous at off-grid energies
    ModifiedTwoDUnion,
}

impl CoupledSamplingMethod {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "TWO_D_UNION" => Ok(CoupledSamplingMethod::TwoDUnion),
            "ONE_D_UNION" => Ok(CoupledSamplingMethod::OneDUnion),
            "MODIFIED_TWO_D_UNION" => Ok(CoupledSamplingMethod::ModifiedTwoDUnion),
            _ => Err(Error::UnknownName {
                kind: "coupled sampling method",
                name: name.to_string(),
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CoupledSamplingMethod::TwoDUnion => "TWO_D_UNION",
            CoupledSamplingMethod::OneDUnion => "ONE_D_UNION",
            CoupledSamplingMethod::ModifiedTwoDUnion => "MODIFIED_TWO_D_UNION",
        }
    }
}

/// Coupled elastic scattering over the full angular range [-1, 1]: the
/// tabulated cutoff distribution below 0.999999 unioned with the analytic
/// screened Rutherford peak above it.
#[derive(Debug, Clone)]
pub struct CoupledElasticDistribution {
    scattering_function: ScatteringFunction,
    cutoff_ratios: TabularDistribution,
    traits: ScreeningTraits,
    method: CoupledSamplingMethod,
}

impl CoupledElasticDistribution {
    pub(crate) fn new(
        scattering_function: ScatteringFunction,
        cutoff_ratios: TabularDistribution,
        traits: ScreeningTraits,
        method: CoupledSamplingMethod,
    ) -> Self {
        CoupledElasticDistribution {
            scattering_function,
            cutoff_ratios,
            traits,
            method,
        }
    }

    pub fn sampling_method(&self) -> CoupledSamplingMethod {
        self.method
    }

    pub fn atomic_number(&self) -> u32 {
        self.traits.atomic_number()
    }

    pub fn min_energy(&self) -> f64 {
        self.scattering_function.min_energy()
    }

    pub fn max_energy(&self) -> f64 {
        self.scattering_function.max_energy()
    }

    /// Sample a scattering angle cosine in [-1, 1]; the outgoing energy
    /// equals the incoming energy.
    pub fn sample<R: Rng>(&self, incoming_energy: f64, rng: &mut R) -> (f64, f64) {
        let u = rng.gen::<f64>();
        let mu = match self.method {
            CoupledSamplingMethod::TwoDUnion => self.sample_two_d_union(incoming_energy, u, rng),
            CoupledSamplingMethod::OneDUnion => self.sample_one_d_union(incoming_energy, u, rng),
            CoupledSamplingMethod::ModifiedTwoDUnion => {
                self.sample_modified_two_d_union(incoming_energy, u, rng)
            }
        };
        (incoming_energy, mu)
    }

    /// Conditional CDF of the union at the given energy.
    pub fn evaluate_cdf(&self, energy: f64, mu: f64) -> f64 {
        self.scattering_function
            .evaluate_secondary_conditional_cdf(energy, mu)
    }

    /// Conditional PDF of the union at the given energy.
    pub fn evaluate_pdf(&self, energy: f64, mu: f64) -> f64 {
        self.scattering_function
            .evaluate_secondary_conditional_pdf(energy, mu)
    }

    fn sample_two_d_union<R: Rng>(&self, energy: f64, u: f64, rng: &mut R) -> f64 {
        self.scattering_function.sample_with_random_number(energy, u, rng)
    }

    /// Gate on the tabulated 1-D cross section ratio at this energy, then
    /// sample within the selected piece alone.
    fn sample_one_d_union<R: Rng>(&self, energy: f64, u: f64, rng: &mut R) -> f64 {
        let ratio = self.cutoff_ratios.evaluate(energy);
        if u == ratio {
            MU_PEAK
        } else if u > ratio {
            let scaled = (u - ratio) / (1.0 - ratio);
            sample_peak(scaled, self.traits.moliere_eta(energy))
        } else {
            let scaled = u / ratio;
            self.scattering_function
                .sample_with_random_number_in_subrange(energy, scaled, MU_PEAK, rng)
        }
    }

    /// Gate on the unioned table's own CDF at the peak junction, which is
    /// continuous across energies, and replace the peak region with the
    /// analytic form. Plain 2-D union sampling interpolates the peak from
    /// the neighboring tables and is discontinuous at off-grid energies.
    fn sample_modified_two_d_union<R: Rng>(&self, energy: f64, u: f64, rng: &mut R) -> f64 {
        let ratio = self
            .scattering_function
            .evaluate_secondary_conditional_cdf(energy, MU_PEAK);
        if u == ratio {
            MU_PEAK
        } else if u > ratio {
            let scaled = (u - ratio) / (1.0 - ratio);
            sample_peak(scaled, self.traits.moliere_eta(energy))
        } else {
            self.scattering_function.sample_with_random_number(energy, u, rng)
        }
    }
}
