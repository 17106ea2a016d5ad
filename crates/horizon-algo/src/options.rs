//! Solve options.
//!
//! Options are plain serde data so they can come from a TOML file, from CLI
//! flags, or from code. Unspecified fields take their defaults:
//!
//! ```toml
//! multi_period = true
//! solver_time_limit = 600.0
//! solver_tolerance = 1e-6
//! backend = "clarabel"
//! parallel = true
//! ```

use std::path::Path;
use std::time::Duration;

use horizon_core::{HorizonError, HorizonResult};
use serde::{Deserialize, Serialize};

use crate::backend::BackendSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Gate assets by lifecycle and weight costs by period. Never inferred
    /// from the snapshot index.
    pub multi_period: bool,

    /// Wall-clock limit for the solver call, in seconds.
    pub solver_time_limit: Option<f64>,

    pub solver_tolerance: f64,

    /// Backend id looked up in the backend registry.
    pub backend: String,

    /// Build energy-balance rows on the rayon pool when the `parallel`
    /// feature is compiled in.
    pub parallel: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            multi_period: false,
            solver_time_limit: None,
            solver_tolerance: 1e-6,
            backend: "clarabel".to_string(),
            parallel: true,
        }
    }
}

impl SolveOptions {
    pub fn multi_period() -> Self {
        Self {
            multi_period: true,
            ..Self::default()
        }
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.solver_time_limit = Some(seconds);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.solver_tolerance = tolerance;
        self
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Load options from a TOML file.
    pub fn load_from(path: &Path) -> HorizonResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let options: Self = toml::from_str(&contents)
            .map_err(|e| HorizonError::Parse(format!("{}: {}", path.display(), e)))?;
        options.validate()?;
        Ok(options)
    }

    pub fn save_to(&self, path: &Path) -> HorizonResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| HorizonError::Parse(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> HorizonResult<()> {
        if !self.solver_tolerance.is_finite() || self.solver_tolerance <= 0.0 {
            return Err(HorizonError::config(format!(
                "solver_tolerance must be positive, got {}",
                self.solver_tolerance
            )));
        }
        if let Some(limit) = self.solver_time_limit {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(HorizonError::config(format!(
                    "solver_time_limit must be positive, got {}",
                    limit
                )));
            }
            if Duration::try_from_secs_f64(limit).is_err() {
                return Err(HorizonError::config(format!(
                    "solver_time_limit of {} seconds is out of range",
                    limit
                )));
            }
        }
        if self.backend.trim().is_empty() {
            return Err(HorizonError::config("backend must not be empty"));
        }
        Ok(())
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.solver_time_limit
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            tolerance: self.solver_tolerance,
            time_limit: self.time_limit(),
        }
    }

    /// True when rows should be built on the rayon pool.
    pub fn use_parallel(&self) -> bool {
        self.parallel && cfg!(feature = "parallel")
    }
}
