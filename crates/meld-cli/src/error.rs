use meld_core::core::io::restraint_file::RestraintFileError;
use meld_core::engine::config::ConfigError;
use meld_core::engine::error::TransformError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    RestraintFile(#[from] RestraintFileError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
