// Energy x angle-cosine tabulated scattering functions
//
// A scattering function pairs an ascending energy grid with one univariate
// angular distribution per grid point. Between grid points the behavior is
// governed by the 2-D interpolation policy and the sampling policy:
// correlated sampling inverts both bracketing tables at the same uniform
// draw and interpolates the two angles, stochastic sampling picks one
// bracketing table at random (weighted by the processed-energy fraction)
// and samples it alone.

use rand::Rng;

use crate::error::{check_ascending, check_same_length, Error, Result};
use crate::interpolation::{delta_cosine, Interp, Sampling, TwoDInterp};
use crate::univariate::{
    CoupledElasticUnivariate, DiscreteDistribution, HybridElasticUnivariate,
    TabularDistribution,
};

/// Iteration cap for the correlated CDF-matching bisection.
const MAX_CDF_ITERATIONS: usize = 500;

/// Absolute error escape for the correlated bisection when the relative
/// criterion cannot converge (angle at or near zero).
const CDF_ERROR_TOL: f64 = 1e-15;

/// Default fuzzy tolerance on the secondary variable bounds.
pub const FUZZY_BOUND_TOL: f64 = 1e-6;

/// One per-energy angular distribution held by a scattering function.
#[derive(Debug, Clone)]
pub enum SecondaryDistribution {
    Tabular(TabularDistribution),
    Discrete(DiscreteDistribution),
    Coupled(CoupledElasticUnivariate),
    Hybrid(HybridElasticUnivariate),
}

impl SecondaryDistribution {
    pub fn lower_bound(&self) -> f64 {
        match self {
            SecondaryDistribution::Tabular(d) => d.lower_bound(),
            SecondaryDistribution::Discrete(d) => d.lower_bound(),
            SecondaryDistribution::Coupled(d) => d.lower_bound(),
            SecondaryDistribution::Hybrid(d) => d.lower_bound(),
        }
    }

    pub fn upper_bound(&self) -> f64 {
        match self {
            SecondaryDistribution::Tabular(d) => d.upper_bound(),
            SecondaryDistribution::Discrete(d) => d.upper_bound(),
            SecondaryDistribution::Coupled(d) => d.upper_bound(),
            SecondaryDistribution::Hybrid(d) => d.upper_bound(),
        }
    }

    pub fn evaluate_pdf(&self, mu: f64) -> f64 {
        match self {
            SecondaryDistribution::Tabular(d) => d.evaluate_pdf(mu),
            // A discrete table acts as a sum of delta functions; its
            // pointwise density is zero
            SecondaryDistribution::Discrete(_) => 0.0,
            SecondaryDistribution::Coupled(d) => d.evaluate_pdf(mu),
            SecondaryDistribution::Hybrid(d) => d.evaluate_pdf(mu),
        }
    }

    pub fn evaluate_cdf(&self, mu: f64) -> f64 {
        match self {
            SecondaryDistribution::Tabular(d) => d.evaluate_cdf(mu),
            SecondaryDistribution::Discrete(d) => d.evaluate_cdf(mu),
            SecondaryDistribution::Coupled(d) => d.evaluate_cdf(mu),
            SecondaryDistribution::Hybrid(d) => d.evaluate_cdf(mu),
        }
    }

    pub fn sample_with_random_number(&self, u: f64) -> f64 {
        match self {
            SecondaryDistribution::Tabular(d) => d.sample_with_random_number(u),
            SecondaryDistribution::Discrete(d) => d.sample_with_random_number(u),
            SecondaryDistribution::Coupled(d) => d.sample_with_random_number(u),
            SecondaryDistribution::Hybrid(d) => d.sample_with_random_number(u),
        }
    }

    pub fn sample_with_random_number_in_subrange(&self, u: f64, max_mu: f64) -> f64 {
        let max_mu = max_mu.min(self.upper_bound());
        match self {
            SecondaryDistribution::Tabular(d) => {
                d.sample_with_random_number_in_subrange(u, max_mu)
            }
            SecondaryDistribution::Discrete(d) => {
                d.sample_with_random_number(u * d.evaluate_cdf(max_mu))
            }
            SecondaryDistribution::Coupled(d) => {
                d.sample_with_random_number_in_subrange(u, max_mu)
            }
            SecondaryDistribution::Hybrid(d) => {
                d.sample_with_random_number(u * d.evaluate_cdf(max_mu))
            }
        }
    }
}

/// Tabulated bivariate (energy, angle cosine) -> PDF scattering function.
#[derive(Debug, Clone)]
pub struct ScatteringFunction {
    energies: Vec<f64>,
    distributions: Vec<SecondaryDistribution>,
    interp: TwoDInterp,
    sampling: Sampling,
    fuzzy_bound_tol: f64,
    evaluation_tol: f64,
    lower_mu_bound: f64,
    upper_mu_bound: f64,
}

impl ScatteringFunction {
    pub fn new(
        energies: Vec<f64>,
        distributions: Vec<SecondaryDistribution>,
        interp: TwoDInterp,
        sampling: Sampling,
        evaluation_tol: f64,
    ) -> Result<Self> {
        if energies.len() < 2 {
            return Err(Error::InvalidValue {
                name: "energy grid",
                value: energies.len() as f64,
                expected: "at least 2 points",
            });
        }
        check_ascending("energy grid", &energies)?;
        check_same_length(
            "energy grid/secondary distributions",
            energies.len(),
            distributions.len(),
        )?;
        if energies[0] <= 0.0 {
            return Err(Error::InvalidValue {
                name: "energy grid",
                value: energies[0],
                expected: "> 0",
            });
        }
        if evaluation_tol <= 0.0 || evaluation_tol >= 1.0 {
            return Err(Error::InvalidValue {
                name: "evaluation_tol",
                value: evaluation_tol,
                expected: "(0, 1)",
            });
        }

        let lower_mu_bound = distributions
            .iter()
            .map(SecondaryDistribution::lower_bound)
            .fold(f64::INFINITY, f64::min);
        let upper_mu_bound = distributions
            .iter()
            .map(SecondaryDistribution::upper_bound)
            .fold(f64::NEG_INFINITY, f64::max);

        Ok(ScatteringFunction {
            energies,
            distributions,
            interp,
            sampling,
            fuzzy_bound_tol: FUZZY_BOUND_TOL,
            evaluation_tol,
            lower_mu_bound,
            upper_mu_bound,
        })
    }

    pub fn min_energy(&self) -> f64 {
        self.energies[0]
    }

    pub fn max_energy(&self) -> f64 {
        *self.energies.last().unwrap()
    }

    pub fn lower_mu_bound(&self) -> f64 {
        self.lower_mu_bound
    }

    pub fn upper_mu_bound(&self) -> f64 {
        self.upper_mu_bound
    }

    pub fn interp(&self) -> TwoDInterp {
        self.interp
    }

    pub fn sampling(&self) -> Sampling {
        self.sampling
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn distribution_at(&self, index: usize) -> &SecondaryDistribution {
        &self.distributions[index]
    }

    /// Bracketing grid indices for an energy (clamped to the grid).
    fn find_bins(&self, energy: f64) -> (usize, usize) {
        let n = self.energies.len();
        if energy <= self.energies[0] {
            return (0, 0);
        }
        if energy >= self.energies[n - 1] {
            return (n - 1, n - 1);
        }
        let mut low = 0usize;
        let mut high = n - 1;
        while high - low > 1 {
            let mid = (low + high) >> 1;
            if self.energies[mid] <= energy {
                low = mid;
            } else {
                high = mid;
            }
        }
        if self.energies[low] == energy {
            (low, low)
        } else {
            (low, low + 1)
        }
    }

    /// Sample an angle cosine at the given energy and uniform draw.
    ///
    /// Stochastic sampling consumes one extra uniform between grid points
    /// to pick the bracketing table.
    pub fn sample_with_random_number<R: Rng>(
        &self,
        energy: f64,
        u: f64,
        rng: &mut R,
    ) -> f64 {
        let (lo, hi) = self.find_bins(energy);
        if lo == hi {
            return self.distributions[lo].sample_with_random_number(u);
        }
        match self.sampling {
            Sampling::Correlated => {
                let mu_lo = self.distributions[lo].sample_with_random_number(u);
                let mu_hi = self.distributions[hi].sample_with_random_number(u);
                self.interpolate_samples(lo, hi, energy, mu_lo, mu_hi)
            }
            Sampling::Stochastic => {
                let picked = self.pick_bin(lo, hi, energy, rng);
                self.distributions[picked].sample_with_random_number(u)
            }
        }
    }

    pub fn sample<R: Rng>(&self, energy: f64, rng: &mut R) -> f64 {
        let u = rng.gen::<f64>();
        self.sample_with_random_number(energy, u, rng)
    }

    /// Sample restricted to angle cosines at or below `max_mu`.
    pub fn sample_with_random_number_in_subrange<R: Rng>(
        &self,
        energy: f64,
        u: f64,
        max_mu: f64,
        rng: &mut R,
    ) -> f64 {
        let (lo, hi) = self.find_bins(energy);
        if lo == hi {
            return self.distributions[lo].sample_with_random_number_in_subrange(u, max_mu);
        }
        match self.sampling {
            Sampling::Correlated => {
                let mu_lo =
                    self.distributions[lo].sample_with_random_number_in_subrange(u, max_mu);
                let mu_hi =
                    self.distributions[hi].sample_with_random_number_in_subrange(u, max_mu);
                self.interpolate_samples(lo, hi, energy, mu_lo, mu_hi)
            }
            Sampling::Stochastic => {
                let picked = self.pick_bin(lo, hi, energy, rng);
                self.distributions[picked].sample_with_random_number_in_subrange(u, max_mu)
            }
        }
    }

    pub fn sample_in_subrange<R: Rng>(&self, energy: f64, max_mu: f64, rng: &mut R) -> f64 {
        let u = rng.gen::<f64>();
        self.sample_with_random_number_in_subrange(energy, u, max_mu, rng)
    }

    /// Interpolate two correlated samples across the energy axis.
    fn interpolate_samples(
        &self,
        lo: usize,
        hi: usize,
        energy: f64,
        mu_lo: f64,
        mu_hi: f64,
    ) -> f64 {
        // Equal samples occur at shared bounds; skip interpolation so the
        // log rules cannot produce a spurious ln of zero-width interval
        if mu_lo == mu_hi {
            return mu_lo;
        }
        self.interp.secondary_rule().interpolate(
            self.energies[lo],
            self.energies[hi],
            energy,
            mu_lo,
            mu_hi,
        )
    }

    /// Pick the bracketing table for stochastic sampling.
    fn pick_bin<R: Rng>(&self, lo: usize, hi: usize, energy: f64, rng: &mut R) -> usize {
        let fraction =
            self.interp
                .energy_fraction(self.energies[lo], self.energies[hi], energy);
        if rng.gen::<f64>() < fraction {
            hi
        } else {
            lo
        }
    }

    /// Conditional CDF of the angle at the given energy.
    pub fn evaluate_secondary_conditional_cdf(&self, energy: f64, mu: f64) -> f64 {
        let (lo, hi) = self.find_bins(energy);
        if lo == hi {
            return self.distributions[lo].evaluate_cdf(mu);
        }
        let mu = self.apply_fuzzy_bounds(mu);
        if mu <= self.lower_mu_bound {
            return 0.0;
        }
        if mu >= self.upper_mu_bound {
            return 1.0;
        }
        match self.sampling {
            Sampling::Correlated => {
                let beta = self.interp.energy_fraction(
                    self.energies[lo],
                    self.energies[hi],
                    energy,
                );
                self.match_correlated_cdf(lo, hi, beta, mu).cdf
            }
            Sampling::Stochastic => {
                let c_lo = self.distributions[lo].evaluate_cdf(mu);
                let c_hi = self.distributions[hi].evaluate_cdf(mu);
                self.interpolate_evaluations(lo, hi, energy, c_lo, c_hi)
            }
        }
    }

    /// Conditional PDF of the angle at the given energy.
    pub fn evaluate_secondary_conditional_pdf(&self, energy: f64, mu: f64) -> f64 {
        let (lo, hi) = self.find_bins(energy);
        if lo == hi {
            return self.distributions[lo].evaluate_pdf(mu);
        }
        let mu = self.apply_fuzzy_bounds(mu);
        if mu < self.lower_mu_bound || mu > self.upper_mu_bound {
            return 0.0;
        }
        match self.sampling {
            Sampling::Correlated => {
                let beta = self.interp.energy_fraction(
                    self.energies[lo],
                    self.energies[hi],
                    energy,
                );
                let (mu_lo, mu_hi) = if mu == self.lower_mu_bound {
                    (self.lower_mu_bound, self.lower_mu_bound)
                } else if mu == self.upper_mu_bound {
                    (self.upper_mu_bound, self.upper_mu_bound)
                } else {
                    let matched = self.match_correlated_cdf(lo, hi, beta, mu);
                    (matched.mu_lo, matched.mu_hi)
                };
                let f_lo = self.distributions[lo].evaluate_pdf(mu_lo);
                let f_hi = self.distributions[hi].evaluate_pdf(mu_hi);
                if f_lo == f_hi {
                    return f_lo;
                }
                self.combine_correlated_pdf(mu, mu_lo, f_lo, mu_hi, f_hi, beta)
            }
            Sampling::Stochastic => {
                let f_lo = self.distributions[lo].evaluate_pdf(mu);
                let f_hi = self.distributions[hi].evaluate_pdf(mu);
                self.interpolate_evaluations(lo, hi, energy, f_lo, f_hi)
            }
        }
    }

    /// Interpolate two boundary evaluations at fixed angle across energy
    /// (direct evaluation), with a linear fallback when a boundary is zero.
    fn interpolate_evaluations(
        &self,
        lo: usize,
        hi: usize,
        energy: f64,
        v_lo: f64,
        v_hi: f64,
    ) -> f64 {
        let e_lo = self.energies[lo];
        let e_hi = self.energies[hi];
        if v_lo * v_hi > 0.0 {
            self.interp
                .dependent_rule()
                .interpolate(e_lo, e_hi, energy, v_lo, v_hi)
        } else {
            Interp::LinLin.interpolate(e_lo, e_hi, energy, v_lo, v_hi)
        }
    }

    /// Combine correlated boundary PDF evaluations.
    ///
    /// Linear secondary rules use the harmonic form
    /// f = f0 f1 / (f1 + (f0 - f1) beta); log-cosine rules carry the
    /// delta-cosine weights through the same form.
    fn combine_correlated_pdf(
        &self,
        mu: f64,
        mu_lo: f64,
        f_lo: f64,
        mu_hi: f64,
        f_hi: f64,
        beta: f64,
    ) -> f64 {
        let rule = self.interp.secondary_rule();
        if rule.is_cosine_rule() {
            let nudged = rule.is_nudged();
            let lower_product = f_lo * delta_cosine(mu_lo, nudged);
            let upper_product = f_hi * delta_cosine(mu_hi, nudged);
            lower_product * upper_product
                / (Interp::LinLin.interpolate_beta(beta, upper_product, lower_product)
                    * delta_cosine(mu, nudged))
        } else {
            f_lo * f_hi / Interp::LinLin.interpolate_beta(beta, f_hi, f_lo)
        }
    }

    /// Clamp an angle just outside the secondary bounds back onto them.
    fn apply_fuzzy_bounds(&self, mu: f64) -> f64 {
        let width = self.upper_mu_bound - self.lower_mu_bound;
        let tol = self.fuzzy_bound_tol * width;
        if mu > self.upper_mu_bound && mu <= self.upper_mu_bound + tol {
            self.upper_mu_bound
        } else if mu < self.lower_mu_bound && mu >= self.lower_mu_bound - tol {
            self.lower_mu_bound
        } else {
            mu
        }
    }

    /// Bisect on the CDF value whose correlated interpolated angle equals
    /// `mu` between the bracketing tables.
    fn match_correlated_cdf(&self, lo: usize, hi: usize, beta: f64, mu: f64) -> MatchedCdf {
        let dist_lo = &self.distributions[lo];
        let dist_hi = &self.distributions[hi];
        let rule = self.interp.secondary_rule();

        let evaluate_at = |cdf: f64| -> (f64, f64, f64) {
            let mu_lo = dist_lo.sample_with_random_number(cdf);
            let mu_hi = dist_hi.sample_with_random_number(cdf);
            let mu_est = if mu_lo == mu_hi {
                mu_lo
            } else {
                rule.interpolate_beta(beta, mu_lo, mu_hi)
            };
            (mu_est, mu_lo, mu_hi)
        };

        // Bracket the target CDF with the boundary-table CDF evaluations
        let c0 = dist_lo.evaluate_cdf(mu);
        let c1 = dist_hi.evaluate_cdf(mu);
        let (mut lower_cdf, mut upper_cdf) = if c0 <= c1 { (c0, c1) } else { (c1, c0) };

        while evaluate_at(lower_cdf).0 > mu {
            upper_cdf = lower_cdf;
            lower_cdf *= 0.9;
            if lower_cdf == 0.0 {
                break;
            }
        }
        while evaluate_at(upper_cdf).0 < mu {
            lower_cdf = upper_cdf;
            upper_cdf *= 1.1;
            if upper_cdf >= 1.0 {
                upper_cdf = 1.0;
                break;
            }
        }

        // The relative criterion degenerates at mu = 0; fall back to the
        // absolute error tolerance there
        let (norm, tolerance) = if mu == 0.0 {
            (1.0, CDF_ERROR_TOL)
        } else {
            (mu, self.evaluation_tol)
        };

        for iteration in 0.. {
            let estimated = 0.5 * (lower_cdf + upper_cdf);
            let (mu_est, mu_lo, mu_hi) = evaluate_at(estimated);
            if mu_est == mu {
                return MatchedCdf {
                    cdf: estimated,
                    mu_lo,
                    mu_hi,
                };
            }
            let rel_error = ((mu - mu_est) / norm).abs();
            if rel_error <= tolerance {
                return MatchedCdf {
                    cdf: estimated,
                    mu_lo,
                    mu_hi,
                };
            }
            if mu_est < mu {
                lower_cdf = estimated;
            } else {
                upper_cdf = estimated;
            }
            if iteration >= MAX_CDF_ITERATIONS {
                let abs_error = (mu - mu_est).abs();
                if abs_error < CDF_ERROR_TOL {
                    return MatchedCdf {
                        cdf: estimated,
                        mu_lo,
                        mu_hi,
                    };
                }
                panic!(
                    "correlated CDF evaluation did not converge: {} iterations, \
                     relative error {:e} above tolerance {:e}",
                    MAX_CDF_ITERATIONS, rel_error, tolerance
                );
            }
        }
        unreachable!()
    }
}

#[derive(Debug, Clone, Copy)]
struct MatchedCdf {
    cdf: f64,
    mu_lo: f64,
    mu_hi: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::FakeStreamRng;

    fn two_energy_function(sampling: Sampling) -> ScatteringFunction {
        // Two energies with different triangular angular tables
        let d0 = TabularDistribution::new(
            Interp::LinLin,
            vec![-1.0, 0.0, 1.0],
            vec![1.0, 1.0, 1.0],
        )
        .unwrap();
        let d1 = TabularDistribution::new(
            Interp::LinLin,
            vec![-1.0, 0.5, 1.0],
            vec![0.5, 1.5, 0.5],
        )
        .unwrap();
        ScatteringFunction::new(
            vec![1e-4, 1e-2],
            vec![
                SecondaryDistribution::Tabular(d0),
                SecondaryDistribution::Tabular(d1),
            ],
            TwoDInterp::LinLinLog,
            sampling,
            1e-12,
        )
        .unwrap()
    }

    #[test]
    fn test_primary_bounds_match_grid() {
        let f = two_energy_function(Sampling::Correlated);
        assert_eq!(f.min_energy(), 1e-4);
        assert_eq!(f.max_energy(), 1e-2);
    }

    #[test]
    fn test_sample_at_grid_point_uses_that_table() {
        let f = two_energy_function(Sampling::Correlated);
        let mut rng = FakeStreamRng::new(vec![]);
        // Uniform table at the first energy: u = 0.5 maps to 0
        let mu = f.sample_with_random_number(1e-4, 0.5, &mut rng);
        assert!((mu - 0.0).abs() < 1e-14, "got {}", mu);
    }

    #[test]
    fn test_correlated_sample_between_grid_points() {
        let f = two_energy_function(Sampling::Correlated);
        let mut rng = FakeStreamRng::new(vec![]);
        // Log energy axis: 1e-3 is the midpoint of [1e-4, 1e-2]
        let mu_lo = f.distribution_at(0).sample_with_random_number(0.25);
        let mu_hi = f.distribution_at(1).sample_with_random_number(0.25);
        let expected = 0.5 * (mu_lo + mu_hi);
        let mu = f.sample_with_random_number(1e-3, 0.25, &mut rng);
        assert!((mu - expected).abs() < 1e-14, "got {} expected {}", mu, expected);
    }

    #[test]
    fn test_correlated_boundary_draws() {
        let f = two_energy_function(Sampling::Correlated);
        let mut rng = FakeStreamRng::new(vec![]);
        assert_eq!(f.sample_with_random_number(1e-3, 0.0, &mut rng), -1.0);
        let top = f.sample_with_random_number(1e-3, 1.0 - 1e-15, &mut rng);
        assert!((top - 1.0).abs() < 1e-12, "got {}", top);
    }

    #[test]
    fn test_stochastic_sample_consumes_selection_draw() {
        let f = two_energy_function(Sampling::Stochastic);
        // Selection draw 0.75 >= beta 0.5 picks the lower table
        let mut rng = FakeStreamRng::new(vec![0.75]);
        let mu = f.sample_with_random_number(1e-3, 0.5, &mut rng);
        assert!((mu - 0.0).abs() < 1e-14);
        assert_eq!(rng.remaining(), 0);
        // Selection draw below beta picks the upper table
        let mut rng = FakeStreamRng::new(vec![0.25]);
        let mu = f.sample_with_random_number(1e-3, 0.5, &mut rng);
        let expected = f.distribution_at(1).sample_with_random_number(0.5);
        assert_eq!(mu, expected);
    }

    #[test]
    fn test_correlated_cdf_matches_sample_inverse() {
        let f = two_energy_function(Sampling::Correlated);
        let mut rng = FakeStreamRng::new(vec![]);
        for u in [0.1, 0.4, 0.6, 0.9] {
            let mu = f.sample_with_random_number(1e-3, u, &mut rng);
            let cdf = f.evaluate_secondary_conditional_cdf(1e-3, mu);
            assert!(
                (cdf - u).abs() < 1e-9,
                "cdf({}) = {} expected {}",
                mu,
                cdf,
                u
            );
        }
    }

    #[test]
    fn test_cdf_bounds() {
        let f = two_energy_function(Sampling::Correlated);
        assert_eq!(f.evaluate_secondary_conditional_cdf(1e-3, -1.0), 0.0);
        assert_eq!(f.evaluate_secondary_conditional_cdf(1e-3, 1.0), 1.0);
    }

    #[test]
    fn test_stochastic_pdf_interpolates_directly() {
        let f = two_energy_function(Sampling::Stochastic);
        let f_lo = f.distribution_at(0).evaluate_pdf(0.25);
        let f_hi = f.distribution_at(1).evaluate_pdf(0.25);
        let pdf = f.evaluate_secondary_conditional_pdf(1e-3, 0.25);
        // LinLinLog dependent rule: linear in log energy, midpoint
        let expected = 0.5 * (f_lo + f_hi);
        assert!((pdf - expected).abs() < 1e-14);
    }

    #[test]
    fn test_correlated_pdf_positive_inside_support() {
        let f = two_energy_function(Sampling::Correlated);
        for mu in [-0.9, -0.5, 0.0, 0.5, 0.9] {
            let pdf = f.evaluate_secondary_conditional_pdf(1e-3, mu);
            assert!(pdf > 0.0, "pdf({}) = {}", mu, pdf);
        }
        assert_eq!(f.evaluate_secondary_conditional_pdf(1e-3, 1.5), 0.0);
    }

    #[test]
    fn test_fuzzy_bound_clamps_near_edge() {
        let f = two_energy_function(Sampling::Correlated);
        let just_outside = 1.0 + 1e-7;
        assert_eq!(f.evaluate_secondary_conditional_cdf(1e-3, just_outside), 1.0);
    }
}
