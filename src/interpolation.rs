// Interpolation rules for tabulated cross section and angular data
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Nudge added to the delta cosine by the nudged log-cosine rules so that
/// mu = 1 stays finite under the log transform.
pub const COSINE_NUDGE: f64 = 1e-10;

/// Convert an angle cosine to the delta-cosine variable used by the
/// log-cosine rules: `(1 - mu)`, plus the nudge when requested.
#[inline]
pub fn delta_cosine(mu: f64, nudged: bool) -> f64 {
    if nudged {
        (1.0 - mu) + COSINE_NUDGE
    } else {
        1.0 - mu
    }
}

/// Recover an angle cosine from the delta-cosine variable.
#[inline]
pub fn cosine_from_delta(delta: f64, nudged: bool) -> f64 {
    if nudged {
        (COSINE_NUDGE - delta) + 1.0
    } else {
        1.0 - delta
    }
}

/// One dimensional interpolation rule between two tabulated points.
///
/// The first half of the name is the dependent-variable rule, the second the
/// independent-variable rule (`LogLin` = log in y, linear in x). The
/// log-cosine rules operate on the delta cosine `1 - mu` (optionally nudged)
/// instead of the raw dependent value, which keeps forward-peaked angular
/// data well behaved near mu = 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interp {
    LinLin,
    LogLin,
    LinLog,
    LogLog,
    /// Log of the delta cosine vs log of the independent variable
    LogCosLog,
    /// As `LogCosLog` with the 1e-10 nudge applied to the delta cosine
    NudgedLogCosLog,
}

impl Interp {
    /// Interpolate y(x) between (x0, y0) and (x1, y1).
    pub fn interpolate(self, x0: f64, x1: f64, x: f64, y0: f64, y1: f64) -> f64 {
        match self {
            Interp::LinLin => y0 + (x - x0) * (y1 - y0) / (x1 - x0),
            Interp::LogLin => {
                (y0.ln() + (x - x0) * (y1.ln() - y0.ln()) / (x1 - x0)).exp()
            }
            Interp::LinLog => {
                y0 + (x / x0).ln() * (y1 - y0) / (x1 / x0).ln()
            }
            Interp::LogLog => {
                (y0.ln() + (x / x0).ln() * (y1.ln() - y0.ln()) / (x1 / x0).ln()).exp()
            }
            Interp::LogCosLog | Interp::NudgedLogCosLog => {
                let nudged = self == Interp::NudgedLogCosLog;
                let d0 = delta_cosine(y0, nudged);
                let d1 = delta_cosine(y1, nudged);
                let d = d0 * (d1 / d0).powf((x / x0).ln() / (x1 / x0).ln());
                cosine_from_delta(d, nudged)
            }
        }
    }

    /// Interpolate using the processed independent-variable fraction beta in
    /// [0, 1] instead of the raw x value.
    pub fn interpolate_beta(self, beta: f64, y0: f64, y1: f64) -> f64 {
        match self {
            Interp::LinLin | Interp::LinLog => y0 + beta * (y1 - y0),
            Interp::LogLin | Interp::LogLog => {
                (y0.ln() + beta * (y1.ln() - y0.ln())).exp()
            }
            Interp::LogCosLog | Interp::NudgedLogCosLog => {
                let nudged = self == Interp::NudgedLogCosLog;
                let d0 = delta_cosine(y0, nudged);
                let d1 = delta_cosine(y1, nudged);
                cosine_from_delta(d0 * (d1 / d0).powf(beta), nudged)
            }
        }
    }

    /// Process the independent variable into the space the rule is linear in.
    #[inline]
    pub fn process_indep(self, x: f64) -> f64 {
        match self {
            Interp::LinLin | Interp::LogLin => x,
            Interp::LinLog | Interp::LogLog | Interp::LogCosLog | Interp::NudgedLogCosLog => {
                x.ln()
            }
        }
    }

    /// True when the dependent rule is logarithmic in the delta cosine.
    #[inline]
    pub fn is_cosine_rule(self) -> bool {
        matches!(self, Interp::LogCosLog | Interp::NudgedLogCosLog)
    }

    /// True when the dependent rule applies the cosine nudge.
    #[inline]
    pub fn is_nudged(self) -> bool {
        self == Interp::NudgedLogCosLog
    }
}

/// Two dimensional interpolation policy for the (energy, angle cosine)
/// scattering tables.
///
/// The name reads dependent-secondary-primary: `LinLinLog` evaluates the PDF
/// linearly in angle and interpolates across energies on a log energy axis;
/// `LogNudgedLogCosLog` works in log PDF, nudged log delta-cosine and log
/// energy. These four (plus the `LogLogLog` dataset-tooling alias) are the
/// only recognized policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TwoDInterp {
    LinLinLin,
    LinLinLog,
    LogLogCosLog,
    LogNudgedLogCosLog,
}

impl TwoDInterp {
    /// Look up a policy from its configuration name.
    ///
    /// Unrecognized names are a fatal misconfiguration, reported with the
    /// offending string.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "LinLinLin" => Ok(TwoDInterp::LinLinLin),
            "LinLinLog" => Ok(TwoDInterp::LinLinLog),
            "LogLogCosLog" => Ok(TwoDInterp::LogLogCosLog),
            "LogNudgedLogCosLog" => Ok(TwoDInterp::LogNudgedLogCosLog),
            // Dataset generation tooling writes the log-cosine policy as
            // plain LogLogLog
            "LogLogLog" => Ok(TwoDInterp::LogLogCosLog),
            _ => Err(Error::UnknownName {
                kind: "interpolation policy",
                name: name.to_string(),
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TwoDInterp::LinLinLin => "LinLinLin",
            TwoDInterp::LinLinLog => "LinLinLog",
            TwoDInterp::LogLogCosLog => "LogLogCosLog",
            TwoDInterp::LogNudgedLogCosLog => "LogNudgedLogCosLog",
        }
    }

    /// Rule for interpolating the sampled angle across the energy axis
    /// (secondary vs primary).
    #[inline]
    pub fn secondary_rule(self) -> Interp {
        match self {
            TwoDInterp::LinLinLin => Interp::LinLin,
            TwoDInterp::LinLinLog => Interp::LinLog,
            TwoDInterp::LogLogCosLog => Interp::LogCosLog,
            TwoDInterp::LogNudgedLogCosLog => Interp::NudgedLogCosLog,
        }
    }

    /// Rule for interpolating PDF values across the energy axis at fixed
    /// angle (dependent vs primary).
    #[inline]
    pub fn dependent_rule(self) -> Interp {
        match self {
            TwoDInterp::LinLinLin => Interp::LinLin,
            TwoDInterp::LinLinLog => Interp::LinLog,
            TwoDInterp::LogLogCosLog | TwoDInterp::LogNudgedLogCosLog => Interp::LogLog,
        }
    }

    /// Processed-energy interpolation fraction for an energy between two
    /// grid points.
    #[inline]
    pub fn energy_fraction(self, e0: f64, e1: f64, energy: f64) -> f64 {
        let rule = self.secondary_rule();
        let p0 = rule.process_indep(e0);
        (rule.process_indep(energy) - p0) / (rule.process_indep(e1) - p0)
    }
}

/// Sampling correlation mode for the 2-D scattering tables.
///
/// `Correlated` preserves the rank of the sampled angle across the
/// bracketing energy tables; `Stochastic` picks one bracketing table at
/// random (weighted by the processed-energy fraction) and samples it alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sampling {
    Correlated,
    Stochastic,
}

impl Sampling {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "Correlated" => Ok(Sampling::Correlated),
            "Stochastic" => Ok(Sampling::Stochastic),
            _ => Err(Error::UnknownName {
                kind: "sampling policy",
                name: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linlin_midpoint() {
        let y = Interp::LinLin.interpolate(0.0, 2.0, 1.0, 10.0, 20.0);
        assert_eq!(y, 15.0);
    }

    #[test]
    fn test_loglog_is_exact_for_power_law() {
        // y = x^2 should be reproduced exactly on a log-log rule
        let y = Interp::LogLog.interpolate(1.0, 4.0, 2.0, 1.0, 16.0);
        assert!((y - 4.0).abs() < 1e-12, "got {}", y);
    }

    #[test]
    fn test_linlog_is_linear_in_log_x() {
        // lin-log: y linear in ln x
        let y = Interp::LinLog.interpolate(1.0, std::f64::consts::E, (0.5f64).exp(), 0.0, 1.0);
        assert!((y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_logcos_endpoints_are_fixed_points() {
        for rule in [Interp::LogCosLog, Interp::NudgedLogCosLog] {
            let y0 = rule.interpolate(1.0, 10.0, 1.0, 0.5, 0.9);
            let y1 = rule.interpolate(1.0, 10.0, 10.0, 0.5, 0.9);
            assert!((y0 - 0.5).abs() < 1e-12);
            assert!((y1 - 0.9).abs() < 1e-9);
        }
    }

    #[test]
    fn test_nudged_logcos_finite_at_unity() {
        let y = Interp::NudgedLogCosLog.interpolate(1.0, 10.0, 3.0, 0.999999, 1.0);
        assert!(y.is_finite());
        assert!(y >= 0.999999 && y <= 1.0);
    }

    #[test]
    fn test_two_d_interp_from_name() {
        assert_eq!(
            TwoDInterp::from_name("LinLinLog").unwrap(),
            TwoDInterp::LinLinLog
        );
        assert_eq!(
            TwoDInterp::from_name("LogLogLog").unwrap(),
            TwoDInterp::LogLogCosLog
        );
        let err = TwoDInterp::from_name("LinLinSpline").unwrap_err();
        assert!(err.to_string().contains("LinLinSpline"));
    }

    #[test]
    fn test_energy_fraction_log_axis() {
        let beta = TwoDInterp::LinLinLog.energy_fraction(1e-4, 1e-2, 1e-3);
        assert!((beta - 0.5).abs() < 1e-12);
    }
}
