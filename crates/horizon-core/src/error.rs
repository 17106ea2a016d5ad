//! Unified error types for horizon
//!
//! [`HorizonError`] is the error returned at every API boundary of the
//! workspace. Solver outcomes such as infeasibility are *not* errors: they are
//! reported through the solve outcome so callers can inspect them without the
//! network having been touched.
//!
//! # Example
//!
//! ```ignore
//! use horizon_core::{HorizonError, HorizonResult};
//!
//! fn assemble(network: &Network) -> HorizonResult<()> {
//!     network.check()?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all horizon operations.
#[derive(Error, Debug)]
pub enum HorizonError {
    /// Structural problems found while assembling the program: dangling bus
    /// references, malformed snapshot/period structure, conflicting bounds.
    /// Never sent to the solver.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Backend failures that are not a solve outcome (e.g. unknown backend)
    #[error("Solver error: {0}")]
    Solver(String),

    /// I/O errors (case files, option files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

impl HorizonError {
    /// Shorthand used by the validators.
    pub fn config(msg: impl Into<String>) -> Self {
        HorizonError::Configuration(msg.into())
    }

    /// True for errors raised during assembly.
    pub fn is_configuration(&self) -> bool {
        matches!(self, HorizonError::Configuration(_))
    }
}

/// Convenience type alias for Results using HorizonError.
pub type HorizonResult<T> = Result<T, HorizonError>;

impl From<anyhow::Error> for HorizonError {
    fn from(err: anyhow::Error) -> Self {
        HorizonError::Other(err.to_string())
    }
}

impl From<String> for HorizonError {
    fn from(s: String) -> Self {
        HorizonError::Other(s)
    }
}

impl From<&str> for HorizonError {
    fn from(s: &str) -> Self {
        HorizonError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for HorizonError {
    fn from(err: serde_json::Error) -> Self {
        HorizonError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HorizonError::config("bus 'x' not found");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("bus 'x' not found"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HorizonError = io_err.into();
        assert!(matches!(err, HorizonError::Io(_)));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> HorizonResult<()> {
            Err(HorizonError::Solver("no backend".into()))
        }

        fn outer() -> HorizonResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: Result<f64, _> = serde_json::from_str::<f64>("not json");
        let err: HorizonError = parse.unwrap_err().into();
        assert!(matches!(err, HorizonError::Parse(_)));
    }
}
