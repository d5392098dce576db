// Moment preserving elastic scattering distribution
use rand::Rng;

use crate::bivariate::ScatteringFunction;

/// Discrete moment preserving elastic scattering above the cutoff angle.
///
/// Each tabulated energy carries a small set of discrete angle cosines in
/// (cutoff, 1] whose weights preserve the low order angular moments of the
/// continuous tail. Sampling in angle is a discrete inverse-CDF lookup; the
/// energy dimension follows the scattering function's sampling policy
/// (correlated interpolation of the bracketing discrete points, or
/// stochastic table selection).
#[derive(Debug, Clone)]
pub struct MomentPreservingElasticDistribution {
    scattering_function: ScatteringFunction,
    cutoff_mu: f64,
}

impl MomentPreservingElasticDistribution {
    pub(crate) fn new(scattering_function: ScatteringFunction, cutoff_mu: f64) -> Self {
        MomentPreservingElasticDistribution {
            scattering_function,
            cutoff_mu,
        }
    }

    pub fn cutoff_angle_cosine(&self) -> f64 {
        self.cutoff_mu
    }

    pub fn min_energy(&self) -> f64 {
        self.scattering_function.min_energy()
    }

    pub fn max_energy(&self) -> f64 {
        self.scattering_function.max_energy()
    }

    /// Sample a discrete scattering angle cosine; the outgoing energy
    /// equals the incoming energy.
    pub fn sample<R: Rng>(&self, incoming_energy: f64, rng: &mut R) -> (f64, f64) {
        let mu = self.scattering_function.sample(incoming_energy, rng);
        (incoming_energy, mu)
    }

    /// Cumulative discrete weight at or below the given angle.
    pub fn evaluate_cdf(&self, energy: f64, mu: f64) -> f64 {
        self.scattering_function
            .evaluate_secondary_conditional_cdf(energy, mu)
    }
}
