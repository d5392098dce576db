// Native elastic electron data container - reads from JSON files
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{check_ascending, check_same_length, Error, Result};
use crate::screening::MU_PEAK;

/// Moment preserving discretization tables, present only in datasets
/// processed with a cutoff below unity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentPreservingTable {
    /// Discrete angle cosines per angular energy grid point
    pub discrete_angles: Vec<Vec<f64>>,
    /// Weights parallel to `discrete_angles`
    pub weights: Vec<Vec<f64>>,
    /// Cross section reduction factor per angular energy grid point
    pub cross_section_reduction: Vec<f64>,
}

/// One direction (forward or adjoint) of tabulated elastic data.
///
/// The per-energy angular tables are stored as sequences parallel to
/// `angular_energy_grid`; every angular grid spans [-1, 0.999999] with both
/// boundary cosines tabulated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticDataTable {
    /// Energies (MeV) at which angular distributions are tabulated
    pub angular_energy_grid: Vec<f64>,
    /// Angle cosine grids, one per angular energy grid point
    pub cutoff_angles: Vec<Vec<f64>>,
    /// Angular PDF values parallel to `cutoff_angles`
    pub cutoff_pdf: Vec<Vec<f64>>,
    /// Cross section energy grid (MeV)
    pub energy_grid: Vec<f64>,
    /// Cutoff elastic cross section (barns) on `energy_grid`
    pub cutoff_cross_section: Vec<f64>,
    /// Total elastic cross section (barns) on `energy_grid`
    pub total_cross_section: Vec<f64>,
    /// Moment preserving tables, when generated for this dataset
    #[serde(default)]
    pub moment_preserving: Option<MomentPreservingTable>,
}

/// Native elastic electron scattering data for one element.
///
/// Deserialized from JSON; all grids are validated eagerly on load so
/// construction failures carry the offending value instead of surfacing
/// during sampling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectronElasticData {
    /// Atomic (proton) number Z
    pub atomic_number: u32,
    /// Cutoff angle cosine the moment preserving data was generated with
    pub cutoff_angle_cosine: f64,
    pub forward: ElasticDataTable,
    #[serde(default)]
    pub adjoint: Option<ElasticDataTable>,
}

impl ElectronElasticData {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let data: ElectronElasticData = serde_json::from_str(text)?;
        data.validate()?;
        Ok(data)
    }

    /// Validate every grid and parallel-sequence invariant.
    pub fn validate(&self) -> Result<()> {
        if self.atomic_number == 0 || self.atomic_number > 100 {
            return Err(Error::InvalidValue {
                name: "atomic_number",
                value: self.atomic_number as f64,
                expected: "1..=100",
            });
        }
        if self.cutoff_angle_cosine < -1.0 || self.cutoff_angle_cosine > 1.0 {
            return Err(Error::InvalidValue {
                name: "cutoff_angle_cosine",
                value: self.cutoff_angle_cosine,
                expected: "[-1, 1]",
            });
        }
        self.forward.validate()?;
        if let Some(adjoint) = &self.adjoint {
            adjoint.validate()?;
        }
        Ok(())
    }

    /// Read-only view over the forward tables.
    pub fn forward_view(&self) -> DataView<'_> {
        DataView {
            atomic_number: self.atomic_number,
            cutoff_angle_cosine: self.cutoff_angle_cosine,
            table: &self.forward,
        }
    }

    /// Read-only view over the adjoint tables, when present.
    pub fn adjoint_view(&self) -> Result<DataView<'_>> {
        let table = self.adjoint.as_ref().ok_or(Error::InvalidValue {
            name: "adjoint",
            value: 0.0,
            expected: "adjoint data to be present",
        })?;
        Ok(DataView {
            atomic_number: self.atomic_number,
            cutoff_angle_cosine: self.cutoff_angle_cosine,
            table,
        })
    }
}

impl ElasticDataTable {
    fn validate(&self) -> Result<()> {
        check_ascending("angular_energy_grid", &self.angular_energy_grid)?;
        if self.angular_energy_grid.is_empty() || self.angular_energy_grid[0] <= 0.0 {
            return Err(Error::InvalidValue {
                name: "angular_energy_grid",
                value: *self.angular_energy_grid.first().unwrap_or(&0.0),
                expected: "a non-empty grid of positive energies",
            });
        }
        check_same_length(
            "angular_energy_grid/cutoff_angles",
            self.angular_energy_grid.len(),
            self.cutoff_angles.len(),
        )?;
        check_same_length(
            "angular_energy_grid/cutoff_pdf",
            self.angular_energy_grid.len(),
            self.cutoff_pdf.len(),
        )?;

        for (angles, pdf) in self.cutoff_angles.iter().zip(&self.cutoff_pdf) {
            check_same_length("cutoff_angles/cutoff_pdf", angles.len(), pdf.len())?;
            check_ascending("cutoff_angles", angles)?;
            if angles.first() != Some(&-1.0) || angles.last() != Some(&MU_PEAK) {
                return Err(Error::InvalidValue {
                    name: "cutoff_angles",
                    value: *angles.last().unwrap_or(&f64::NAN),
                    expected: "a grid spanning [-1, 0.999999]",
                });
            }
            if let Some(bad) = pdf.iter().find(|p| **p < 0.0) {
                return Err(Error::InvalidValue {
                    name: "cutoff_pdf",
                    value: *bad,
                    expected: ">= 0",
                });
            }
        }

        check_ascending("energy_grid", &self.energy_grid)?;
        if self.energy_grid.len() < 2 || self.energy_grid[0] <= 0.0 {
            return Err(Error::InvalidValue {
                name: "energy_grid",
                value: *self.energy_grid.first().unwrap_or(&0.0),
                expected: "at least 2 positive energies",
            });
        }
        check_same_length(
            "energy_grid/cutoff_cross_section",
            self.energy_grid.len(),
            self.cutoff_cross_section.len(),
        )?;
        check_same_length(
            "energy_grid/total_cross_section",
            self.energy_grid.len(),
            self.total_cross_section.len(),
        )?;

        if let Some(mp) = &self.moment_preserving {
            check_same_length(
                "angular_energy_grid/discrete_angles",
                self.angular_energy_grid.len(),
                mp.discrete_angles.len(),
            )?;
            check_same_length(
                "angular_energy_grid/weights",
                self.angular_energy_grid.len(),
                mp.weights.len(),
            )?;
            check_same_length(
                "angular_energy_grid/cross_section_reduction",
                self.angular_energy_grid.len(),
                mp.cross_section_reduction.len(),
            )?;
            for (angles, weights) in mp.discrete_angles.iter().zip(&mp.weights) {
                check_same_length("discrete_angles/weights", angles.len(), weights.len())?;
                check_ascending("discrete_angles", angles)?;
            }
        }
        Ok(())
    }
}

/// Accessor view used by every factory entry point.
///
/// Forward and adjoint data share this surface, so the factory is exactly
/// symmetric in the two (same algorithms, different tables).
#[derive(Debug, Clone, Copy)]
pub struct DataView<'a> {
    atomic_number: u32,
    cutoff_angle_cosine: f64,
    table: &'a ElasticDataTable,
}

impl<'a> DataView<'a> {
    pub fn atomic_number(&self) -> u32 {
        self.atomic_number
    }

    /// Cutoff angle cosine the dataset's moment preserving tables assume.
    pub fn dataset_cutoff_angle_cosine(&self) -> f64 {
        self.cutoff_angle_cosine
    }

    pub fn elastic_angular_energy_grid(&self) -> &'a [f64] {
        &self.table.angular_energy_grid
    }

    pub fn cutoff_elastic_angles(&self) -> &'a [Vec<f64>] {
        &self.table.cutoff_angles
    }

    pub fn cutoff_elastic_pdf(&self) -> &'a [Vec<f64>] {
        &self.table.cutoff_pdf
    }

    /// Angular grid tabulated at one energy of the angular energy grid.
    pub fn cutoff_elastic_angles_at(&self, energy: f64) -> Result<&'a [f64]> {
        let i = self.angular_energy_index(energy)?;
        Ok(&self.table.cutoff_angles[i])
    }

    pub fn cutoff_elastic_pdf_at(&self, energy: f64) -> Result<&'a [f64]> {
        let i = self.angular_energy_index(energy)?;
        Ok(&self.table.cutoff_pdf[i])
    }

    pub fn electron_energy_grid(&self) -> &'a [f64] {
        &self.table.energy_grid
    }

    pub fn cutoff_elastic_cross_section(&self) -> &'a [f64] {
        &self.table.cutoff_cross_section
    }

    pub fn total_elastic_cross_section(&self) -> &'a [f64] {
        &self.table.total_cross_section
    }

    pub fn has_moment_preserving_data(&self) -> bool {
        self.table.moment_preserving.is_some()
    }

    pub fn moment_preserving_elastic_discrete_angles(&self) -> Result<&'a [Vec<f64>]> {
        Ok(&self.moment_preserving()?.discrete_angles)
    }

    pub fn moment_preserving_elastic_weights(&self) -> Result<&'a [Vec<f64>]> {
        Ok(&self.moment_preserving()?.weights)
    }

    pub fn moment_preserving_cross_section_reduction(&self) -> Result<&'a [f64]> {
        Ok(&self.moment_preserving()?.cross_section_reduction)
    }

    fn moment_preserving(&self) -> Result<&'a MomentPreservingTable> {
        self.table
            .moment_preserving
            .as_ref()
            .ok_or(Error::MissingMomentPreservingData)
    }

    fn angular_energy_index(&self, energy: f64) -> Result<usize> {
        self.table
            .angular_energy_grid
            .iter()
            .position(|e| *e == energy)
            .ok_or(Error::EnergyOutsideGrid {
                energy,
                min: self.table.angular_energy_grid[0],
                max: *self.table.angular_energy_grid.last().unwrap(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_table() -> ElasticDataTable {
        ElasticDataTable {
            angular_energy_grid: vec![1e-5, 1e-3],
            cutoff_angles: vec![vec![-1.0, 0.0, MU_PEAK], vec![-1.0, 0.5, MU_PEAK]],
            cutoff_pdf: vec![vec![0.5, 0.5, 0.5], vec![0.2, 0.8, 1.4]],
            energy_grid: vec![1e-5, 1e-3, 1e-1],
            cutoff_cross_section: vec![1.0, 2.0, 3.0],
            total_cross_section: vec![2.0, 3.0, 4.0],
            moment_preserving: None,
        }
    }

    #[test]
    fn test_validate_accepts_minimal_data() {
        let data = ElectronElasticData {
            atomic_number: 1,
            cutoff_angle_cosine: 0.9,
            forward: minimal_table(),
            adjoint: None,
        };
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_sentinel() {
        let mut table = minimal_table();
        table.cutoff_angles[0] = vec![-1.0, 0.0, 0.9];
        let data = ElectronElasticData {
            atomic_number: 1,
            cutoff_angle_cosine: 0.9,
            forward: table,
            adjoint: None,
        };
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unsorted_energy_grid() {
        let mut table = minimal_table();
        table.energy_grid = vec![1e-3, 1e-5, 1e-1];
        let data = ElectronElasticData {
            atomic_number: 1,
            cutoff_angle_cosine: 0.9,
            forward: table,
            adjoint: None,
        };
        let err = data.validate().unwrap_err();
        assert!(err.to_string().contains("energy_grid"));
    }

    #[test]
    fn test_json_roundtrip() {
        let data = ElectronElasticData {
            atomic_number: 1,
            cutoff_angle_cosine: 1.0,
            forward: minimal_table(),
            adjoint: Some(minimal_table()),
        };
        let text = serde_json::to_string(&data).unwrap();
        let parsed = ElectronElasticData::from_json_str(&text).unwrap();
        assert_eq!(parsed.atomic_number, 1);
        assert!(parsed.adjoint_view().is_ok());
        assert_eq!(
            parsed.forward_view().cutoff_elastic_angles_at(1e-3).unwrap(),
            &[-1.0, 0.5, MU_PEAK]
        );
    }

    #[test]
    fn test_missing_moment_preserving_data() {
        let data = ElectronElasticData {
            atomic_number: 1,
            cutoff_angle_cosine: 0.9,
            forward: minimal_table(),
            adjoint: None,
        };
        let view = data.forward_view();
        assert!(!view.has_moment_preserving_data());
        assert!(matches!(
            view.moment_preserving_elastic_discrete_angles(),
            Err(Error::MissingMomentPreservingData)
        ));
    }
}
