//! Crate-wide error type.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;

/// Every failure a simulation, sweep or export can report.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more configuration fields violate their constraints.
    #[error("invalid configuration:\n{0}")]
    InvalidConfig(ConfigErrors),

    #[error("cannot parse scenario TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown preset \"{name}\", available: {available}")]
    UnknownPreset { name: String, available: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Non-empty list of field violations collected by `Config::validate`.
#[derive(Debug)]
pub struct ConfigErrors(pub Vec<ConfigError>);

impl ConfigErrors {
    /// Returns `true` when any violation names `field`.
    pub fn contains_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {e}")?;
        }
        Ok(())
    }
}
