// Screened Rutherford elastic scattering distribution
use rand::Rng;

use crate::screening::{ScreeningTraits, DELTA_MU_PEAK, MU_PEAK};

/// Analytic Moliere screened Rutherford peak over [0.999999, 1].
///
/// Parameterized by atomic number alone; the screening constant is
/// evaluated per incoming energy at sample time, so no energy grid is
/// carried.
#[derive(Debug, Clone)]
pub struct ScreenedRutherfordElasticDistribution {
    traits: ScreeningTraits,
}

impl ScreenedRutherfordElasticDistribution {
    pub(crate) fn new(traits: ScreeningTraits) -> Self {
        ScreenedRutherfordElasticDistribution { traits }
    }

    pub fn atomic_number(&self) -> u32 {
        self.traits.atomic_number()
    }

    pub fn cutoff_angle_cosine(&self) -> f64 {
        MU_PEAK
    }

    /// Sample an angle cosine in [0.999999, 1]; the outgoing energy equals
    /// the incoming energy.
    pub fn sample<R: Rng>(&self, incoming_energy: f64, rng: &mut R) -> (f64, f64) {
        let u = rng.gen::<f64>();
        let eta = self.traits.moliere_eta(incoming_energy);
        (incoming_energy, sample_peak(u, eta))
    }

    /// Normalized PDF of the peak at the given energy.
    pub fn evaluate_pdf(&self, energy: f64, mu: f64) -> f64 {
        if !(MU_PEAK..=1.0).contains(&mu) {
            return 0.0;
        }
        let eta = self.traits.moliere_eta(energy);
        let denominator = eta + (1.0 - mu);
        eta * (DELTA_MU_PEAK + eta) / (DELTA_MU_PEAK * denominator * denominator)
    }

    /// Normalized CDF of the peak at the given energy.
    pub fn evaluate_cdf(&self, energy: f64, mu: f64) -> f64 {
        if mu <= MU_PEAK {
            return 0.0;
        }
        if mu >= 1.0 {
            return 1.0;
        }
        let eta = self.traits.moliere_eta(energy);
        eta * (mu - MU_PEAK) / (DELTA_MU_PEAK * (eta + (1.0 - mu)))
    }
}

/// Closed-form inverse CDF of the screened Rutherford peak.
///
/// mu = (eta (mu_c + dr) + dr)/(eta + dr) with dr = (1 - mu_c) u; a draw
/// of 0 maps exactly onto the peak boundary 0.999999.
pub(crate) fn sample_peak(u: f64, eta: f64) -> f64 {
    let delta_rand = DELTA_MU_PEAK * u;
    (eta * (MU_PEAK + delta_rand) + delta_rand) / (eta + delta_rand)
}
