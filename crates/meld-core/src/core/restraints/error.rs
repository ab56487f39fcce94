use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RestraintError {
    #[error("Invalid alpha window [{alpha_min}, {alpha_max}]: bounds must satisfy 0 <= min <= max <= 1")]
    InvalidAlphaWindow { alpha_min: f64, alpha_max: f64 },

    #[error("Invalid time window [{start_time}, {end_time}]: end must be after start")]
    InvalidTimeWindow { start_time: u64, end_time: u64 },

    #[error("Nonlinear factor must be at least 1.0, got {0}")]
    InvalidFactor(f64),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("Atom indices must be distinct, got {0:?}")]
    DuplicateAtoms(Vec<usize>),

    #[error("Spline column {column} has {found} entries but the profile declares {expected} bins")]
    SplineLength {
        column: usize,
        expected: usize,
        found: usize,
    },

    #[error("GMM shape mismatch for '{field}': expected {expected}, found {found}")]
    GmmShape {
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("Precision matrix of GMM component {component} is not symmetric")]
    AsymmetricPrecision { component: usize },

    #[error("A {kind} restraint cannot be placed in a selectable group")]
    NotSelectable { kind: &'static str },

    #[error("num_active = {num_active} is out of range for a {container} with {len} members")]
    NumActiveOutOfRange {
        container: &'static str,
        num_active: usize,
        len: usize,
    },

    #[error("A {0} must contain at least one member")]
    Empty(&'static str),
}
