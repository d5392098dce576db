// Cutoff elastic scattering distribution
use rand::Rng;

use crate::bivariate::ScatteringFunction;
use crate::screening::MU_PEAK;

/// Continuous tabulated elastic scattering restricted to angle cosines at
/// or below the cutoff.
///
/// Holds the full tabulated scattering function (spanning [-1, 0.999999])
/// for CDF and PDF evaluation; when the cutoff sits below the tabulated
/// peak a second function restricted to [-1, cutoff] drives sampling.
/// Elastic scattering leaves the energy unchanged, so `sample` always
/// returns the incoming energy.
#[derive(Debug, Clone)]
pub struct CutoffElasticDistribution {
    full_function: ScatteringFunction,
    restricted_function: Option<ScatteringFunction>,
    cutoff_mu: f64,
}

impl CutoffElasticDistribution {
    pub(crate) fn new(
        full_function: ScatteringFunction,
        restricted_function: Option<ScatteringFunction>,
        cutoff_mu: f64,
    ) -> Self {
        CutoffElasticDistribution {
            full_function,
            restricted_function,
            cutoff_mu,
        }
    }

    pub fn cutoff_angle_cosine(&self) -> f64 {
        self.cutoff_mu
    }

    pub fn min_energy(&self) -> f64 {
        self.full_function.min_energy()
    }

    pub fn max_energy(&self) -> f64 {
        self.full_function.max_energy()
    }

    /// Sample a scattering angle cosine; the outgoing energy equals the
    /// incoming energy.
    pub fn sample<R: Rng>(&self, incoming_energy: f64, rng: &mut R) -> (f64, f64) {
        let function = self
            .restricted_function
            .as_ref()
            .unwrap_or(&self.full_function);
        let mu = function.sample(incoming_energy, rng);
        (incoming_energy, mu)
    }

    /// Conditional angular PDF of the full tabulated distribution.
    pub fn evaluate_pdf(&self, energy: f64, mu: f64) -> f64 {
        if mu > self.cutoff_mu.min(MU_PEAK) {
            return 0.0;
        }
        self.full_function.evaluate_secondary_conditional_pdf(energy, mu)
    }

    /// Conditional angular CDF of the full tabulated distribution, used by
    /// the moment preserving cross section reduction.
    pub fn evaluate_cutoff_cdf(&self, energy: f64, mu: f64) -> f64 {
        self.full_function.evaluate_secondary_conditional_cdf(energy, mu)
    }
}
