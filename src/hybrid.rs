// Hybrid elastic scattering distribution
use rand::Rng;

use crate::bivariate::ScatteringFunction;

/// Hybrid elastic scattering: tabulated cutoff piece below the cutoff
/// angle, discrete moment preserving points above it.
///
/// Each per-energy table is itself a gated union (see
/// `HybridElasticUnivariate`): a uniform draw below the energy's sampling
/// ratio inverts the continuous cutoff CDF, a draw above it is re-scaled
/// onto the discrete tail. The production transport loop samples this
/// distribution by default.
#[derive(Debug, Clone)]
pub struct HybridElasticDistribution {
    scattering_function: ScatteringFunction,
    cutoff_mu: f64,
    evaluation_tol: f64,
}

impl HybridElasticDistribution {
    pub(crate) fn new(
        scattering_function: ScatteringFunction,
        cutoff_mu: f64,
        evaluation_tol: f64,
    ) -> Self {
        HybridElasticDistribution {
            scattering_function,
            cutoff_mu,
            evaluation_tol,
        }
    }

    pub fn cutoff_angle_cosine(&self) -> f64 {
        self.cutoff_mu
    }

    pub fn evaluation_tolerance(&self) -> f64 {
        self.evaluation_tol
    }

    pub fn min_energy(&self) -> f64 {
        self.scattering_function.min_energy()
    }

    pub fn max_energy(&self) -> f64 {
        self.scattering_function.max_energy()
    }

    /// Sample a scattering angle cosine from the gated union; the outgoing
    /// energy equals the incoming energy.
    pub fn sample<R: Rng>(&self, incoming_energy: f64, rng: &mut R) -> (f64, f64) {
        let mu = self.scattering_function.sample(incoming_energy, rng);
        (incoming_energy, mu)
    }

    /// Conditional CDF of the union at the given energy.
    pub fn evaluate_cdf(&self, energy: f64, mu: f64) -> f64 {
        self.scattering_function
            .evaluate_secondary_conditional_cdf(energy, mu)
    }
}
