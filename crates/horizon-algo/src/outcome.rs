//! Result of a solve call.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::backend::LpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    TimedOut,
    SolverError,
}

impl SolveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::TimedOut => "timed out",
            SolveStatus::SolverError => "solver error",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&LpError> for SolveStatus {
    fn from(error: &LpError) -> Self {
        match error {
            LpError::Infeasible(_) => SolveStatus::Infeasible,
            LpError::Unbounded => SolveStatus::Unbounded,
            LpError::TimedOut => SolveStatus::TimedOut,
            LpError::Failed(_) | LpError::Unavailable(_) => SolveStatus::SolverError,
        }
    }
}

/// Outcome of [`crate::solve`]. Only an optimal outcome has written results
/// back into the network.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub status: SolveStatus,
    pub objective_value: Option<f64>,
    /// True when results were written into the network
    pub write_back: bool,
    /// Capital part of the objective
    pub capital_cost: Option<f64>,
    /// Operating part of the objective
    pub operating_cost: Option<f64>,
    /// Realized left-hand side per global constraint
    pub global_constraints: BTreeMap<String, f64>,
    pub num_variables: usize,
    pub num_constraints: usize,
    /// Largest row or bound violation of the returned point
    pub max_violation: Option<f64>,
    pub solve_time: Duration,
    pub message: String,
}

impl Outcome {
    /// A failed solve; nothing was written back.
    pub fn failed(status: SolveStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            objective_value: None,
            write_back: false,
            capital_cost: None,
            operating_cost: None,
            global_constraints: BTreeMap::new(),
            num_variables: 0,
            num_constraints: 0,
            max_violation: None,
            solve_time: Duration::ZERO,
            message: message.into(),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    /// Human-readable summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Solve Outcome\n{}\n", "=".repeat(40)));
        s.push_str(&format!("Status: {}\n", self.status));
        if let Some(objective) = self.objective_value {
            s.push_str(&format!("Objective: {:.2}\n", objective));
        }
        if let Some(capex) = self.capital_cost {
            s.push_str(&format!("  Capital: {:.2}\n", capex));
        }
        if let Some(opex) = self.operating_cost {
            s.push_str(&format!("  Operating: {:.2}\n", opex));
        }
        s.push_str(&format!(
            "Program: {} variables, {} constraints\n",
            self.num_variables, self.num_constraints
        ));
        if let Some(v) = self.max_violation {
            s.push_str(&format!("Max violation: {:.3e}\n", v));
        }
        s.push_str(&format!("Solve Time: {:.2?}\n", self.solve_time));
        s.push_str(&format!("Written back: {}\n", if self.write_back { "yes" } else { "no" }));

        if !self.global_constraints.is_empty() {
            s.push_str("\nGlobal Constraints:\n");
            for (name, value) in &self.global_constraints {
                s.push_str(&format!("  {}: {:.4}\n", name, value));
            }
        }
        if !self.message.is_empty() {
            s.push_str(&format!("\n{}\n", self.message));
        }
        s
    }
}
