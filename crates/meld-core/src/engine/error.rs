use thiserror::Error;

use super::config::ConfigError;
use super::force::ForceError;
use crate::core::restraints::error::RestraintError;
use crate::core::sampling::parameters::SamplingError;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Invalid restraint definition: {source}")]
    Restraint {
        #[from]
        source: RestraintError,
    },

    #[error("Force engine call failed: {source}")]
    Force {
        #[from]
        source: ForceError,
    },

    #[error("Sampled parameter lookup failed: {source}")]
    Sampling {
        #[from]
        source: SamplingError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Sampled num_active '{parameter}' resolved to {value}, which is not a valid count")]
    InvalidNumActive { parameter: String, value: f64 },

    #[error("Restraints must be registered with add_interactions before '{0}' is called")]
    NotRegistered(&'static str),

    #[error("Restraints are already registered; add_interactions may only be called once")]
    AlreadyRegistered,
}
