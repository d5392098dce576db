// Angular grid construction around the cutoff angle cosine
use crate::error::{Error, Result};
use crate::interpolation::Interp;

/// Cap on accepted bisections per refinement call. The tolerances normally
/// terminate refinement long before this; the cap guarantees termination on
/// pathological tables.
const MAX_REFINEMENT_SPLITS: usize = 1000;

/// Return the angular grid at or above the cutoff: the subsequence of
/// `raw_grid` strictly above the cutoff with the cutoff itself prepended.
///
/// Idempotent when the cutoff is already a grid point. The trailing
/// 0.999999 sentinel of the raw grid is preserved.
pub fn angular_grid_above_cutoff(raw_grid: &[f64], cutoff_mu: f64) -> Vec<f64> {
    let mut grid = Vec::with_capacity(raw_grid.len() + 1);
    grid.push(cutoff_mu);
    grid.extend(raw_grid.iter().copied().filter(|mu| *mu > cutoff_mu));
    grid
}

/// Return the angular grid at or below the cutoff: the subsequence of
/// `raw_grid` strictly below the cutoff with the cutoff itself appended.
pub fn angular_grid_below_cutoff(raw_grid: &[f64], cutoff_mu: f64) -> Vec<f64> {
    let mut grid: Vec<f64> = raw_grid
        .iter()
        .copied()
        .take_while(|mu| *mu < cutoff_mu)
        .collect();
    grid.push(cutoff_mu);
    grid
}

/// Select the tabulated angular grid for an energy, then trim above the
/// cutoff. Off-grid energies use the tabulated grid of the nearest energy.
pub fn angular_grid_above_cutoff_at_energy(
    angular_energy_grid: &[f64],
    angular_grids: &[Vec<f64>],
    energy: f64,
    cutoff_mu: f64,
) -> Result<Vec<f64>> {
    let raw = raw_grid_at_energy(angular_energy_grid, angular_grids, energy)?;
    Ok(angular_grid_above_cutoff(raw, cutoff_mu))
}

/// Pick the tabulated angular grid closest in energy.
pub(crate) fn raw_grid_at_energy<'a>(
    angular_energy_grid: &[f64],
    angular_grids: &'a [Vec<f64>],
    energy: f64,
) -> Result<&'a Vec<f64>> {
    let min = angular_energy_grid[0];
    let max = *angular_energy_grid.last().unwrap();
    if energy < min || energy > max {
        return Err(Error::EnergyOutsideGrid { energy, min, max });
    }
    if let Some(i) = angular_energy_grid.iter().position(|e| *e == energy) {
        return Ok(&angular_grids[i]);
    }
    let upper = angular_energy_grid
        .iter()
        .position(|e| *e > energy)
        .expect("energy inside grid bounds");
    let lower = upper - 1;
    if energy - angular_energy_grid[lower] <= angular_energy_grid[upper] - energy {
        Ok(&angular_grids[lower])
    } else {
        Ok(&angular_grids[upper])
    }
}

/// Trim a (grid, pdf) pair to the region below the cutoff, interpolating
/// the PDF at the inserted cutoff point with the given rule.
///
/// When the cutoff coincides with an existing grid point the tabulated PDF
/// value is reused unchanged, so insertion is exactly idempotent.
pub fn angular_grid_and_pdf_below_cutoff(
    raw_grid: &[f64],
    raw_pdf: &[f64],
    cutoff_mu: f64,
    rule: Interp,
) -> Result<(Vec<f64>, Vec<f64>)> {
    if raw_grid.len() != raw_pdf.len() {
        return Err(Error::LengthMismatch {
            name: "angular grid/pdf",
            left: raw_grid.len(),
            right: raw_pdf.len(),
        });
    }

    let grid = angular_grid_below_cutoff(raw_grid, cutoff_mu);
    let mut pdf = Vec::with_capacity(grid.len());
    pdf.extend(raw_pdf.iter().take(grid.len() - 1));

    let cutoff_pdf = match raw_grid.iter().position(|mu| *mu == cutoff_mu) {
        Some(i) => raw_pdf[i],
        None => {
            let upper = raw_grid
                .iter()
                .position(|mu| *mu > cutoff_mu)
                .ok_or(Error::InvalidValue {
                    name: "cutoff_mu",
                    value: cutoff_mu,
                    expected: "a value bracketed by the angular grid",
                })?;
            let lower = upper - 1;
            rule.interpolate(
                raw_grid[lower],
                raw_grid[upper],
                cutoff_mu,
                raw_pdf[lower],
                raw_pdf[upper],
            )
        }
    };
    pdf.push(cutoff_pdf);
    Ok((grid, pdf))
}

/// Relative error between two evaluations, zero when both vanish.
fn relative_error(a: f64, b: f64) -> f64 {
    if a == b {
        return 0.0;
    }
    (a - b).abs() / a.abs().max(b.abs())
}

/// Adaptive bisection refinement of a 1-D grid against an evaluator.
///
/// Each candidate segment is split at its midpoint until the linearly
/// interpolated midpoint estimate matches the exact evaluation within
/// `convergence_tol` relative error. The absolute-difference and relative
/// grid-distance tolerances accept a segment without clean convergence
/// (with a warning), so refinement terminates on discontinuous tables.
#[derive(Debug, Clone)]
pub struct GridRefiner {
    convergence_tol: f64,
    absolute_diff_tol: f64,
    distance_tol: f64,
}

impl GridRefiner {
    pub fn new(convergence_tol: f64, absolute_diff_tol: f64, distance_tol: f64) -> Self {
        GridRefiner {
            convergence_tol,
            absolute_diff_tol,
            distance_tol,
        }
    }

    /// Refine `grid` in place and return the evaluated values on it.
    pub fn refine_and_evaluate<F>(&self, grid: &mut Vec<f64>, evaluate: F) -> Vec<f64>
    where
        F: Fn(f64) -> f64,
    {
        // Pending points, nearest first, each paired with its evaluation
        let mut pending: Vec<(f64, f64)> = grid
            .iter()
            .rev()
            .map(|x| (*x, evaluate(*x)))
            .collect();

        let mut out_grid = Vec::with_capacity(grid.len());
        let mut out_values = Vec::with_capacity(grid.len());

        let (mut x0, mut y0) = pending.pop().expect("refinement grid is empty");
        out_grid.push(x0);
        out_values.push(y0);

        let mut splits = 0usize;
        while let Some(&(x1, y1)) = pending.last() {
            let x_mid = 0.5 * (x0 + x1);
            let y_mid_estimated = 0.5 * (y0 + y1);
            let y_mid_exact = evaluate(x_mid);

            if self.has_converged(x0, x_mid, x1, y_mid_estimated, y_mid_exact)
                || splits >= MAX_REFINEMENT_SPLITS
            {
                if splits >= MAX_REFINEMENT_SPLITS {
                    eprintln!(
                        "Warning: angular grid refinement split cap reached at mu = {}",
                        x_mid
                    );
                }
                pending.pop();
                out_grid.push(x1);
                out_values.push(y1);
                x0 = x1;
                y0 = y1;
            } else {
                pending.push((x_mid, y_mid_exact));
                splits += 1;
            }
        }

        *grid = out_grid;
        out_values
    }

    fn has_converged(
        &self,
        x0: f64,
        x_mid: f64,
        x1: f64,
        y_mid_estimated: f64,
        y_mid_exact: f64,
    ) -> bool {
        let rel_error = relative_error(y_mid_exact, y_mid_estimated);
        if rel_error <= self.convergence_tol {
            return true;
        }

        if relative_error(x0, x1) <= self.distance_tol {
            eprintln!(
                "Warning: grid distance tolerance hit before convergence near mu = {} \
                 (relative error {:e})",
                x_mid, rel_error
            );
            return true;
        }
        if (y_mid_exact - y_mid_estimated).abs() <= self.absolute_diff_tol {
            eprintln!(
                "Warning: absolute difference tolerance hit before convergence at mu = {} \
                 (relative error {:e})",
                x_mid, rel_error
            );
            return true;
        }
        false
    }
}
