// Single energy (univariate) angular distributions
//
// All four kinds share the same tabular backbone: per grid point we store
// the angle cosine, the running unnormalized CDF, the (possibly scaled) PDF
// value and the PDF slope into the next bin. The CDF within a bin is then
// quadratic in the angle and can be inverted in closed form, so a uniform
// draw of exactly 0.0 maps to the first grid angle and the bin search is
// exact at grid boundaries.

use crate::error::{check_ascending, check_same_length, Error, Result};
use crate::interpolation::Interp;
use crate::screening::{DELTA_MU_PEAK, MU_PEAK};

/// One row of the tabular backbone: (x, unnormalized cdf, pdf, slope).
#[derive(Debug, Clone, Copy)]
struct Bin {
    x: f64,
    cdf: f64,
    pdf: f64,
    slope: f64,
}

/// Tabular backbone shared by the continuous distributions.
#[derive(Debug, Clone)]
struct Bins(Vec<Bin>);

impl Bins {
    /// Build the trapezoid CDF and per-bin slopes from (grid, pdf) pairs.
    fn new(grid: &[f64], pdf: &[f64]) -> Self {
        let mut bins: Vec<Bin> = grid
            .iter()
            .zip(pdf)
            .map(|(&x, &p)| Bin {
                x,
                cdf: 0.0,
                pdf: p,
                slope: 0.0,
            })
            .collect();

        for i in 1..bins.len() {
            let width = bins[i].x - bins[i - 1].x;
            bins[i].cdf = bins[i - 1].cdf + 0.5 * width * (bins[i].pdf + bins[i - 1].pdf);
        }
        for i in 0..bins.len() - 1 {
            bins[i].slope = (bins[i + 1].pdf - bins[i].pdf) / (bins[i + 1].x - bins[i].x);
        }
        Bins(bins)
    }

    fn first(&self) -> &Bin {
        &self.0[0]
    }

    fn last(&self) -> &Bin {
        self.0.last().expect("empty bin table")
    }

    /// Index of the last bin with x <= value (value within bounds).
    fn lower_bin_by_x(&self, value: f64) -> usize {
        let bins = &self.0;
        let mut low = 0usize;
        let mut high = bins.len() - 1;
        while high - low > 1 {
            let mid = (low + high) >> 1;
            if bins[mid].x <= value {
                low = mid;
            } else {
                high = mid;
            }
        }
        low
    }

    /// Index of the last bin with cdf <= value.
    fn lower_bin_by_cdf(&self, value: f64) -> usize {
        let bins = &self.0;
        let mut low = 0usize;
        let mut high = bins.len() - 1;
        while high - low > 1 {
            let mid = (low + high) >> 1;
            if bins[mid].cdf <= value {
                low = mid;
            } else {
                high = mid;
            }
        }
        low
    }

    /// Unnormalized CDF at x (x within bounds).
    fn unnormalized_cdf(&self, x: f64) -> f64 {
        let i = self.lower_bin_by_x(x);
        let bin = &self.0[i];
        let d = x - bin.x;
        bin.cdf + d * bin.pdf + 0.5 * d * d * bin.slope
    }

    /// Interpolate the stored (possibly scaled) PDF value at x.
    fn value(&self, x: f64, interp: Interp) -> f64 {
        let i = self.lower_bin_by_x(x);
        let lo = &self.0[i];
        if x == lo.x {
            return lo.pdf;
        }
        let hi = &self.0[i + 1];
        if x == hi.x {
            return hi.pdf;
        }
        interp.interpolate(lo.x, hi.x, x, lo.pdf, hi.pdf)
    }

    /// Invert the quadratic in-bin CDF at the given unnormalized CDF value.
    ///
    /// x = x0 + [sqrt(pdf0^2 + 2 m (c - c0)) - pdf0]/m, degenerating to
    /// x0 + (c - c0)/pdf0 for flat bins.
    fn invert(&self, scaled_cdf: f64) -> (f64, usize) {
        let i = self.lower_bin_by_cdf(scaled_cdf);
        let bin = &self.0[i];
        let cdf_diff = scaled_cdf - bin.cdf;
        let x = if bin.slope != 0.0 {
            // The discriminant can round a hair below zero at the top of a
            // bin whose PDF falls to zero
            let discriminant = (bin.pdf * bin.pdf + 2.0 * bin.slope * cdf_diff).max(0.0);
            bin.x + (discriminant.sqrt() - bin.pdf) / bin.slope
        } else {
            bin.x + cdf_diff / bin.pdf
        };
        (x, i)
    }
}

/// Continuous tabular distribution over an ascending grid.
///
/// Sampling inverts the exact quadratic CDF of the linearly interpolated
/// PDF; `interp` only affects `evaluate` (the cross-section ratio tables
/// built over the energy grid use a log-log rule there).
#[derive(Debug, Clone)]
pub struct TabularDistribution {
    bins: Bins,
    interp: Interp,
    norm_constant: f64,
}

impl TabularDistribution {
    pub fn new(interp: Interp, grid: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        if grid.len() < 2 {
            return Err(Error::InvalidValue {
                name: "grid",
                value: grid.len() as f64,
                expected: "at least 2 points",
            });
        }
        check_same_length("tabular grid/values", grid.len(), values.len())?;
        check_ascending("tabular grid", &grid)?;
        if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(Error::InvalidValue {
                name: "tabular values",
                value: *bad,
                expected: "finite and >= 0",
            });
        }

        let bins = Bins::new(&grid, &values);
        let max_cdf = bins.last().cdf;
        if max_cdf <= 0.0 {
            return Err(Error::InvalidValue {
                name: "tabular values",
                value: max_cdf,
                expected: "a positive integral",
            });
        }
        Ok(TabularDistribution {
            bins,
            interp,
            norm_constant: 1.0 / max_cdf,
        })
    }

    pub fn lower_bound(&self) -> f64 {
        self.bins.first().x
    }

    pub fn upper_bound(&self) -> f64 {
        self.bins.last().x
    }

    /// Evaluate the unnormalized tabulated value at x (0 outside bounds).
    pub fn evaluate(&self, x: f64) -> f64 {
        if x < self.lower_bound() || x > self.upper_bound() {
            return 0.0;
        }
        self.bins.value(x, self.interp)
    }

    /// Evaluate the normalized PDF at x.
    pub fn evaluate_pdf(&self, x: f64) -> f64 {
        self.evaluate(x) * self.norm_constant
    }

    /// Evaluate the CDF at x (clamped to [0, 1] outside bounds).
    pub fn evaluate_cdf(&self, x: f64) -> f64 {
        if x <= self.lower_bound() {
            return 0.0;
        }
        if x >= self.upper_bound() {
            return 1.0;
        }
        self.bins.unnormalized_cdf(x) * self.norm_constant
    }

    /// Inverse CDF at the uniform draw `u` in [0, 1].
    pub fn sample_with_random_number(&self, u: f64) -> f64 {
        self.bins.invert(u * self.bins.last().cdf).0
    }

    /// Inverse CDF restricted to [lower_bound, max_x].
    pub fn sample_with_random_number_in_subrange(&self, u: f64, max_x: f64) -> f64 {
        let scaled = u * self.evaluate_cdf(max_x);
        self.sample_with_random_number(scaled)
    }
}

/// Discrete distribution over distinct angle cosines.
#[derive(Debug, Clone)]
pub struct DiscreteDistribution {
    angles: Vec<f64>,
    // normalized cumulative weights, last entry == 1.0
    cdf: Vec<f64>,
}

impl DiscreteDistribution {
    pub fn new(angles: Vec<f64>, weights: Vec<f64>) -> Result<Self> {
        if angles.is_empty() {
            return Err(Error::InvalidValue {
                name: "discrete angles",
                value: 0.0,
                expected: "at least 1 point",
            });
        }
        check_same_length("discrete angles/weights", angles.len(), weights.len())?;
        check_ascending("discrete angles", &angles)?;
        if weights.iter().any(|w| *w < 0.0) {
            return Err(Error::InvalidValue {
                name: "discrete weights",
                value: *weights.iter().find(|w| **w < 0.0).unwrap(),
                expected: ">= 0",
            });
        }

        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(Error::InvalidValue {
                name: "discrete weights",
                value: total,
                expected: "a positive sum",
            });
        }
        let mut cdf = Vec::with_capacity(weights.len());
        let mut running = 0.0;
        for w in &weights {
            running += w / total;
            cdf.push(running);
        }
        *cdf.last_mut().unwrap() = 1.0;
        Ok(DiscreteDistribution { angles, cdf })
    }

    pub fn lower_bound(&self) -> f64 {
        self.angles[0]
    }

    pub fn upper_bound(&self) -> f64 {
        *self.angles.last().unwrap()
    }

    /// CDF at x: cumulative weight of all points at or below x.
    pub fn evaluate_cdf(&self, x: f64) -> f64 {
        if x < self.angles[0] {
            return 0.0;
        }
        let mut idx = 0;
        for (i, angle) in self.angles.iter().enumerate() {
            if *angle <= x {
                idx = i;
            } else {
                break;
            }
        }
        self.cdf[idx]
    }

    /// First tabulated angle whose cumulative weight reaches `u`.
    pub fn sample_with_random_number(&self, u: f64) -> f64 {
        let idx = self.sample_index_with_random_number(u);
        self.angles[idx]
    }

    pub fn sample_index_with_random_number(&self, u: f64) -> usize {
        self.cdf
            .iter()
            .position(|c| *c >= u)
            .unwrap_or(self.angles.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }
}

/// Single-energy union of the tabulated cutoff distribution on
/// [-1, 0.999999] and the analytic screened Rutherford peak on
/// [0.999999, 1].
///
/// The tabulated PDF values are scaled by the cutoff-to-total cross section
/// ratio so the stored table is the cutoff piece of the *total* elastic
/// distribution; the peak carries the remaining `1 - ratio` of the CDF.
#[derive(Debug, Clone)]
pub struct CoupledElasticUnivariate {
    bins: Bins,
    moliere_eta: f64,
    cutoff_ratio: f64,
    // 1/(1 - ratio)
    scaling_parameter: f64,
    // scaled cutoff pdf at mu_peak times (delta_mu_peak + eta)^2
    pdf_parameter: f64,
    // (1 - ratio) * eta / delta_mu_peak
    cdf_parameter: f64,
    norm_constant: f64,
    scaled_norm_constant: f64,
    max_cdf: f64,
}

impl CoupledElasticUnivariate {
    pub fn new(
        angles: Vec<f64>,
        pdf: Vec<f64>,
        moliere_eta: f64,
        cutoff_ratio: f64,
    ) -> Result<Self> {
        if angles.len() < 2 {
            return Err(Error::InvalidValue {
                name: "coupled angles",
                value: angles.len() as f64,
                expected: "at least 2 points",
            });
        }
        check_same_length("coupled angles/pdf", angles.len(), pdf.len())?;
        check_ascending("coupled angles", &angles)?;
        if angles[0] != -1.0 || *angles.last().unwrap() != MU_PEAK {
            return Err(Error::InvalidValue {
                name: "coupled angles",
                value: *angles.last().unwrap(),
                expected: "a grid spanning [-1, 0.999999]",
            });
        }
        if moliere_eta <= 0.0 {
            return Err(Error::InvalidValue {
                name: "moliere_eta",
                value: moliere_eta,
                expected: "> 0",
            });
        }
        if cutoff_ratio <= 0.0 || cutoff_ratio > 1.0 {
            return Err(Error::InvalidValue {
                name: "cutoff_ratio",
                value: cutoff_ratio,
                expected: "(0, 1]",
            });
        }

        // Scale the cutoff pdf onto the total elastic distribution
        let scaled: Vec<f64> = pdf.iter().map(|p| p * cutoff_ratio).collect();
        let bins = Bins::new(&angles, &scaled);

        let norm_constant = 1.0 / bins.last().cdf;
        let scaled_norm_constant = norm_constant * cutoff_ratio;
        let pdf_peak = bins.last().pdf;

        Ok(CoupledElasticUnivariate {
            bins,
            moliere_eta,
            cutoff_ratio,
            scaling_parameter: 1.0 / (1.0 - cutoff_ratio),
            pdf_parameter: pdf_peak
                * (DELTA_MU_PEAK + moliere_eta)
                * (DELTA_MU_PEAK + moliere_eta),
            cdf_parameter: (1.0 - cutoff_ratio) * moliere_eta / DELTA_MU_PEAK,
            norm_constant,
            scaled_norm_constant,
            max_cdf: 1.0 / scaled_norm_constant,
        })
    }

    pub fn lower_bound(&self) -> f64 {
        -1.0
    }

    pub fn upper_bound(&self) -> f64 {
        1.0
    }

    pub fn cutoff_bound(&self) -> f64 {
        MU_PEAK
    }

    pub fn moliere_eta(&self) -> f64 {
        self.moliere_eta
    }

    pub fn cutoff_ratio(&self) -> f64 {
        self.cutoff_ratio
    }

    /// Evaluate the unnormalized distribution (the scaled table below the
    /// peak, the analytic Rutherford form above it).
    pub fn evaluate(&self, mu: f64) -> f64 {
        if mu > MU_PEAK {
            let delta = 1.0 - mu;
            self.pdf_parameter / ((delta + self.moliere_eta) * (delta + self.moliere_eta))
        } else if mu == MU_PEAK {
            self.bins.last().pdf
        } else if mu < -1.0 {
            0.0
        } else {
            self.bins.value(mu, Interp::LinLin)
        }
    }

    pub fn evaluate_pdf(&self, mu: f64) -> f64 {
        if mu > MU_PEAK {
            self.evaluate(mu) * self.norm_constant
        } else {
            self.evaluate(mu) * self.scaled_norm_constant
        }
    }

    pub fn evaluate_cdf(&self, mu: f64) -> f64 {
        if mu <= -1.0 {
            0.0
        } else if mu < MU_PEAK {
            self.bins.unnormalized_cdf(mu) * self.scaled_norm_constant
        } else if mu == MU_PEAK {
            self.cutoff_ratio
        } else if mu >= 1.0 {
            1.0
        } else {
            // ratio + (1 - ratio) (eta / delta_mu_peak) (mu - mu_c)/(eta + 1 - mu)
            self.cutoff_ratio
                + self.cdf_parameter * (mu - MU_PEAK) / (self.moliere_eta + (1.0 - mu))
        }
    }

    /// Inverse CDF over the full union range. A draw exactly equal to the
    /// cutoff ratio returns the peak boundary 0.999999.
    pub fn sample_with_random_number(&self, u: f64) -> f64 {
        if u == self.cutoff_ratio {
            MU_PEAK
        } else if u > self.cutoff_ratio {
            let scaled = (u - self.cutoff_ratio) * self.scaling_parameter;
            self.sample_screened_rutherford(scaled)
        } else {
            self.sample_cutoff(u)
        }
    }

    pub fn sample_with_random_number_in_subrange(&self, u: f64, max_mu: f64) -> f64 {
        self.sample_with_random_number(u * self.evaluate_cdf(max_mu))
    }

    /// Closed-form inverse of the screened Rutherford peak for a draw
    /// rescaled onto [0, 1).
    ///
    /// mu = (eta (mu_c + dr) + dr)/(eta + dr) with dr = (1 - mu_c) u.
    pub fn sample_screened_rutherford(&self, u: f64) -> f64 {
        let delta_rand = DELTA_MU_PEAK * u;
        (self.moliere_eta * (MU_PEAK + delta_rand) + delta_rand)
            / (self.moliere_eta + delta_rand)
    }

    /// Inverse of the tabulated cutoff piece for a draw below the ratio.
    fn sample_cutoff(&self, u: f64) -> f64 {
        self.bins.invert(u * self.max_cdf).0
    }
}

/// Single-energy union of a tabulated cutoff distribution on
/// [-1, cutoff_mu] and a discrete moment preserving tail above it.
///
/// `sampling_ratio` is the fraction of the combined (reduced cutoff +
/// moment preserving) cross section carried by the continuous piece; the
/// tabulated PDF values are scaled by it, and a draw above it selects one
/// of the discrete angles. The same draw is re-scaled for whichever branch
/// applies; no second uniform is consumed.
#[derive(Debug, Clone)]
pub struct HybridElasticUnivariate {
    bins: Bins,
    discrete: DiscreteDistribution,
    cutoff_mu: f64,
    sampling_ratio: f64,
    // 1/(1 - ratio)
    scaling_parameter: f64,
    // unnormalized (scaled-table) cdf at cutoff_mu divided by the ratio
    max_cutoff_cdf: f64,
    cutoff_norm_constant: f64,
}

impl HybridElasticUnivariate {
    pub fn new(
        cutoff_angles: Vec<f64>,
        cutoff_pdf: Vec<f64>,
        discrete_angles: Vec<f64>,
        discrete_weights: Vec<f64>,
        cutoff_mu: f64,
        sampling_ratio: f64,
    ) -> Result<Self> {
        if cutoff_angles.len() < 2 {
            return Err(Error::InvalidValue {
                name: "hybrid cutoff angles",
                value: cutoff_angles.len() as f64,
                expected: "at least 2 points",
            });
        }
        check_same_length(
            "hybrid cutoff angles/pdf",
            cutoff_angles.len(),
            cutoff_pdf.len(),
        )?;
        check_ascending("hybrid cutoff angles", &cutoff_angles)?;
        if cutoff_angles[0] != -1.0 {
            return Err(Error::InvalidValue {
                name: "hybrid cutoff angles",
                value: cutoff_angles[0],
                expected: "a grid starting at -1",
            });
        }
        if cutoff_mu <= -1.0 || cutoff_mu > MU_PEAK {
            return Err(Error::InvalidValue {
                name: "cutoff_mu",
                value: cutoff_mu,
                expected: "(-1, 0.999999]",
            });
        }
        if *cutoff_angles.last().unwrap() < cutoff_mu {
            return Err(Error::InvalidValue {
                name: "hybrid cutoff angles",
                value: *cutoff_angles.last().unwrap(),
                expected: "a grid reaching the cutoff angle",
            });
        }
        // A ratio of exactly 1 occurs below the moment preserving
        // threshold; the discrete branch is then never selected
        if sampling_ratio <= 0.0 || sampling_ratio > 1.0 {
            return Err(Error::InvalidValue {
                name: "sampling_ratio",
                value: sampling_ratio,
                expected: "(0, 1]",
            });
        }
        let discrete = DiscreteDistribution::new(discrete_angles, discrete_weights)?;
        if discrete.lower_bound() <= cutoff_mu || discrete.upper_bound() >= 1.0 {
            return Err(Error::InvalidValue {
                name: "hybrid discrete angles",
                value: discrete.lower_bound(),
                expected: "angles in (cutoff_mu, 1)",
            });
        }

        let scaled: Vec<f64> = cutoff_pdf.iter().map(|p| p * sampling_ratio).collect();
        let bins = Bins::new(&cutoff_angles, &scaled);
        let max_cutoff_cdf = bins.unnormalized_cdf(cutoff_mu) / sampling_ratio;

        Ok(HybridElasticUnivariate {
            bins,
            discrete,
            cutoff_mu,
            sampling_ratio,
            scaling_parameter: 1.0 / (1.0 - sampling_ratio),
            max_cutoff_cdf,
            cutoff_norm_constant: 1.0 / max_cutoff_cdf,
        })
    }

    pub fn lower_bound(&self) -> f64 {
        -1.0
    }

    pub fn upper_bound(&self) -> f64 {
        1.0
    }

    pub fn cutoff_bound(&self) -> f64 {
        self.cutoff_mu
    }

    pub fn sampling_ratio(&self) -> f64 {
        self.sampling_ratio
    }

    /// Evaluate the scaled tabulated value below the cutoff. The discrete
    /// tail is a sum of delta functions and evaluates to zero.
    pub fn evaluate(&self, mu: f64) -> f64 {
        if mu < -1.0 || mu > self.cutoff_mu {
            0.0
        } else {
            self.bins.value(mu, Interp::LinLin)
        }
    }

    pub fn evaluate_pdf(&self, mu: f64) -> f64 {
        self.evaluate(mu) / self.max_cutoff_cdf
    }

    pub fn evaluate_cdf(&self, mu: f64) -> f64 {
        if mu <= -1.0 {
            0.0
        } else if mu < self.cutoff_mu {
            self.bins.unnormalized_cdf(mu) * self.cutoff_norm_constant
        } else if mu < self.discrete.lower_bound() {
            self.sampling_ratio
        } else if mu >= self.discrete.upper_bound() {
            1.0
        } else {
            self.sampling_ratio
                + self.discrete.evaluate_cdf(mu) * (1.0 - self.sampling_ratio)
        }
    }

    /// Inverse CDF over the union: the gate draw itself is re-scaled into
    /// whichever branch it selects.
    pub fn sample_with_random_number(&self, u: f64) -> f64 {
        if u <= self.sampling_ratio {
            self.sample_cutoff(u)
        } else {
            self.sample_discrete(u)
        }
    }

    fn sample_cutoff(&self, u: f64) -> f64 {
        self.bins.invert(u * self.max_cutoff_cdf).0
    }

    fn sample_discrete(&self, u: f64) -> f64 {
        let scaled = (u - self.sampling_ratio) * self.scaling_parameter;
        self.discrete.sample_with_random_number(scaled)
    }
}
