//! LP solver backends.
//!
//! A backend receives a finished [`LinearProgram`] and returns one value per
//! variable, or a typed [`LpError`]. The compiler never sees solver types.
//!
//! ```text
//! LinearProgram ──► LpBackend::solve ──► LpSolution { values, objective }
//!                        │
//!                        └─► LpError::{Infeasible, Unbounded, TimedOut, Failed, Unavailable}
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::lp::{LinearProgram, Sense};

/// Absolute slack allowed on rows that contain no variables.
const CONSTANT_ROW_SLACK: f64 = 1e-9;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LpError {
    #[error("program is infeasible: {0}")]
    Infeasible(String),

    #[error("program is unbounded")]
    Unbounded,

    #[error("solver stopped at its time limit")]
    TimedOut,

    #[error("solver failed: {0}")]
    Failed(String),

    #[error("backend '{0}' is not available in this build")]
    Unavailable(String),
}

/// Per-call settings handed to a backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendSettings {
    /// Feasibility and gap tolerance for the solver; the result is checked
    /// against it afterwards
    pub tolerance: f64,
    pub time_limit: Option<Duration>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            time_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    /// One value per variable, indexed by `VarId::index`
    pub values: Vec<f64>,
    pub objective: f64,
}

/// Implements the actual solving of a [`LinearProgram`].
pub trait LpBackend: Send + Sync {
    /// Unique identifier (e.g. "clarabel")
    fn id(&self) -> &str;

    /// Check if this backend is available at runtime
    fn is_available(&self) -> bool;

    /// True when `solve` stops on its own at `settings.time_limit`.
    /// Otherwise the orchestrator stops waiting for it instead.
    fn enforces_time_limit(&self) -> bool {
        false
    }

    fn solve(
        &self,
        program: &LinearProgram,
        settings: &BackendSettings,
    ) -> Result<LpSolution, LpError>;
}

/// Reject programs whose variable-free rows already fail.
///
/// Such rows come from buses with load and nothing attached, or capacity
/// bounds with no matching asset; solvers handle empty rows inconsistently.
pub fn check_constant_rows(program: &LinearProgram) -> Result<(), LpError> {
    for row in program.constraints.iter().filter(|c| c.expr.is_constant()) {
        let ok = match row.sense {
            Sense::Le => 0.0 <= row.rhs + CONSTANT_ROW_SLACK,
            Sense::Ge => 0.0 >= row.rhs - CONSTANT_ROW_SLACK,
            Sense::Eq => row.rhs.abs() <= CONSTANT_ROW_SLACK,
        };
        if !ok {
            return Err(LpError::Infeasible(format!(
                "row '{}' reads 0 {} {}",
                row.name, row.sense, row.rhs
            )));
        }
    }
    Ok(())
}

/// Clarabel interior-point solver through `good_lp`.
///
/// Clarabel is a pure-Rust solver that is always available when the
/// `solver-clarabel` feature is on.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClarabelBackend;

impl LpBackend for ClarabelBackend {
    fn id(&self) -> &str {
        "clarabel"
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "solver-clarabel")
    }

    fn enforces_time_limit(&self) -> bool {
        self.is_available()
    }

    #[cfg(feature = "solver-clarabel")]
    fn solve(
        &self,
        program: &LinearProgram,
        settings: &BackendSettings,
    ) -> Result<LpSolution, LpError> {
        use clarabel::solver::{IPSolver, SolverStatus};
        use good_lp::solvers::clarabel::clarabel;
        use good_lp::{constraint, variable, variables, Expression, SolverModel, Variable};

        check_constant_rows(program)?;
        if program.variables.is_empty() {
            return Ok(LpSolution {
                values: Vec::new(),
                objective: program.objective.constant,
            });
        }

        let mut vars = variables!();
        let handles: Vec<Variable> = program
            .variables
            .iter()
            .map(|v| {
                let mut def = variable();
                if let Some(lower) = v.lower {
                    def = def.min(lower);
                }
                if let Some(upper) = v.upper {
                    def = def.max(upper);
                }
                vars.add(def)
            })
            .collect();

        let to_expression = |terms: &[(crate::lp::VarId, f64)]| {
            let mut expr = Expression::from(0.0);
            for &(var, coef) in terms {
                expr += coef * handles[var.index()];
            }
            expr
        };

        let objective = to_expression(&program.objective.terms);
        let mut model = vars.minimise(objective).using(clarabel);

        for row in program.constraints.iter().filter(|c| !c.expr.is_constant()) {
            let lhs = to_expression(&row.expr.terms);
            let rhs = row.rhs;
            model = match row.sense {
                Sense::Le => model.with(constraint!(lhs <= rhs)),
                Sense::Ge => model.with(constraint!(lhs >= rhs)),
                Sense::Eq => model.with(constraint!(lhs == rhs)),
            };
        }
        configure_clarabel(model.settings(), settings);

        debug!(
            variables = program.num_variables(),
            rows = program.num_constraints(),
            tolerance = settings.tolerance,
            time_limit = ?settings.time_limit,
            "clarabel: solving"
        );

        let mut solver = model
            .try_into_solver()
            .map_err(|e| LpError::Failed(e.to_string()))?;
        solver.solve();

        let solution = &solver.solution;
        match solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => {}
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                return Err(LpError::Infeasible("reported by clarabel".into()))
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                return Err(LpError::Unbounded)
            }
            SolverStatus::MaxTime => return Err(LpError::TimedOut),
            other => {
                return Err(LpError::Failed(format!(
                    "clarabel returned status {:?}",
                    other
                )))
            }
        }

        // good_lp numbers variables in insertion order
        let values: Vec<f64> = solution.x.iter().take(handles.len()).copied().collect();
        let objective = program.objective.evaluate(&values);
        Ok(LpSolution { values, objective })
    }

    #[cfg(not(feature = "solver-clarabel"))]
    fn solve(
        &self,
        _program: &LinearProgram,
        _settings: &BackendSettings,
    ) -> Result<LpSolution, LpError> {
        Err(LpError::Unavailable(self.id().to_string()))
    }
}

/// Copy the caller's tolerance and time limit into Clarabel's settings.
#[cfg(feature = "solver-clarabel")]
fn configure_clarabel(
    builder: &mut clarabel::solver::DefaultSettingsBuilder<f64>,
    settings: &BackendSettings,
) {
    builder
        .tol_feas(settings.tolerance)
        .tol_gap_abs(settings.tolerance)
        .tol_gap_rel(settings.tolerance);
    if let Some(limit) = settings.time_limit {
        builder.time_limit(limit.as_secs_f64());
    }
}

/// Holds registered backends, looked up by id.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn LpBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in backend.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ClarabelBackend));
        registry
    }

    pub fn register(&mut self, backend: Arc<dyn LpBackend>) {
        self.backends.insert(backend.id().to_string(), backend);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn LpBackend>> {
        self.backends.get(id).cloned()
    }

    /// Backend ids, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn available(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .backends
            .iter()
            .filter(|(_, b)| b.is_available())
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }
}
