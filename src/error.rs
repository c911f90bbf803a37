//! Error types for linkshield.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinkShieldError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("No domains tracked")]
    NoDomains,
}
