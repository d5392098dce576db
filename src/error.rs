// Error types for distribution construction
use thiserror::Error;

/// Errors raised while validating raw data or building distributions.
///
/// All variants are construction-time failures: once a distribution has been
/// built successfully, sampling cannot fail for in-range energies. The
/// messages carry the offending value since bad inputs are almost always
/// data-quality problems in the upstream nuclear data file.
#[derive(Error, Debug)]
pub enum Error {
    /// A grid that must be strictly ascending is not
    #[error("grid '{name}' is not strictly ascending at index {index}")]
    UnsortedGrid { name: &'static str, index: usize },

    /// Parallel grid/value sequences with different lengths
    #[error("length mismatch for '{name}': {left} grid points vs {right} values")]
    LengthMismatch {
        name: &'static str,
        left: usize,
        right: usize,
    },

    /// A scalar input outside its documented domain
    #[error("invalid value for '{name}': {value} (expected {expected})")]
    InvalidValue {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    /// An unrecognized interpolation policy or sampling method name
    #[error("unrecognized {kind} name: '{name}'")]
    UnknownName { kind: &'static str, name: String },

    /// Required moment preserving data is absent from the container
    #[error("data container has no moment preserving elastic data")]
    MissingMomentPreservingData,

    /// Requested energy outside the tabulated angular energy grid
    #[error("energy {energy} MeV outside the angular energy grid [{min}, {max}]")]
    EnergyOutsideGrid { energy: f64, min: f64, max: f64 },

    #[error("failed to parse data container: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Check that a sequence is strictly ascending, reporting the first offense.
pub(crate) fn check_ascending(name: &'static str, values: &[f64]) -> Result<()> {
    for i in 1..values.len() {
        if values[i] <= values[i - 1] {
            return Err(Error::UnsortedGrid { name, index: i });
        }
    }
    Ok(())
}

/// Check that two parallel sequences have equal lengths.
pub(crate) fn check_same_length(
    name: &'static str,
    left: usize,
    right: usize,
) -> Result<()> {
    if left != right {
        Err(Error::LengthMismatch { name, left, right })
    } else {
        Ok(())
    }
}
