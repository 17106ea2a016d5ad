//! Solve orchestration: compile, call the backend, write back on success.
//!
//! ```text
//! Network ──compile──► LinearProgram ──LpBackend──► values
//!    ▲                                                 │
//!    └──────────── write_back (optimal only) ◄─────────┘
//! ```
//!
//! Configuration problems are errors. Solver outcomes, good or bad, are an
//! [`Outcome`]; every non-optimal outcome leaves the network untouched.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use horizon_core::{HorizonError, HorizonResult, Network};
use tracing::{info, warn};

use crate::backend::{BackendRegistry, BackendSettings, LpBackend, LpError, LpSolution};
use crate::compile::{compile, CompiledProblem};
use crate::lp::LinearProgram;
use crate::options::SolveOptions;
use crate::outcome::{Outcome, SolveStatus};
use crate::writeback::write_back;

/// Why a backend call produced no solution.
#[derive(Debug)]
enum RunFailure {
    Lp(LpError),
    TimedOut(Duration),
    Panicked,
}

/// Solve `network` with the backend named in `options`.
///
/// Returns `Err` only for configuration problems (invalid network, invalid
/// options, unknown backend). On an optimal outcome the network holds the
/// realized capacities and series.
pub fn solve(network: &mut Network, options: &SolveOptions) -> HorizonResult<Outcome> {
    let registry = BackendRegistry::with_defaults();
    let backend = registry.get(&options.backend).ok_or_else(|| {
        HorizonError::Solver(format!(
            "unknown backend '{}' (registered: {})",
            options.backend,
            registry.list().join(", ")
        ))
    })?;
    solve_with(network, options, backend)
}

/// Solve `network` with an explicit backend.
pub fn solve_with(
    network: &mut Network,
    options: &SolveOptions,
    backend: Arc<dyn LpBackend>,
) -> HorizonResult<Outcome> {
    let problem = compile(network, options)?;
    let num_variables = problem.program.num_variables();
    let num_constraints = problem.program.num_constraints();

    info!(
        backend = backend.id(),
        time_limit = ?options.time_limit(),
        "solving"
    );
    let start = Instant::now();
    let result = run_backend(backend, &problem.program, options.backend_settings());
    let solve_time = start.elapsed();

    let mut outcome = match result {
        Ok(solution) => accept(network, &problem, solution, options.solver_tolerance),
        Err(RunFailure::TimedOut(limit)) => {
            warn!(?limit, "solver time limit reached");
            Outcome::failed(
                SolveStatus::TimedOut,
                format!("no solution within the time limit of {:?}", limit),
            )
        }
        Err(RunFailure::Panicked) => {
            warn!("solver backend panicked");
            Outcome::failed(SolveStatus::SolverError, "solver backend panicked")
        }
        Err(RunFailure::Lp(LpError::TimedOut)) => {
            warn!(limit = ?options.time_limit(), "solver stopped at its time limit");
            Outcome::failed(SolveStatus::TimedOut, LpError::TimedOut.to_string())
        }
        Err(RunFailure::Lp(error)) => {
            warn!(%error, "solve failed");
            Outcome::failed(SolveStatus::from(&error), error.to_string())
        }
    };

    outcome.num_variables = num_variables;
    outcome.num_constraints = num_constraints;
    outcome.solve_time = solve_time;
    info!(
        status = %outcome.status,
        objective = ?outcome.objective_value,
        elapsed = ?solve_time,
        "solve finished"
    );
    Ok(outcome)
}

/// Call the backend.
///
/// Backends that enforce the time limit themselves run on the caller's
/// thread. For the others a limit moves the call to a worker thread; a
/// timed-out worker is detached and its result discarded. A panic becomes
/// [`RunFailure::Panicked`] either way.
fn run_backend(
    backend: Arc<dyn LpBackend>,
    program: &LinearProgram,
    settings: BackendSettings,
) -> Result<LpSolution, RunFailure> {
    let limit = match settings.time_limit {
        Some(limit) if !backend.enforces_time_limit() => limit,
        _ => {
            return panic::catch_unwind(AssertUnwindSafe(|| backend.solve(program, &settings)))
                .map_err(|_| RunFailure::Panicked)?
                .map_err(RunFailure::Lp);
        }
    };

    let program = Arc::new(program.clone());
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("horizon-solver".to_string())
        .spawn(move || {
            let result = backend.solve(&program, &settings);
            // receiver is gone after a timeout
            let _ = tx.send(result);
        })
        .map_err(|e| RunFailure::Lp(LpError::Failed(format!("cannot spawn solver thread: {}", e))))?;

    match rx.recv_timeout(limit) {
        Ok(result) => result.map_err(RunFailure::Lp),
        Err(mpsc::RecvTimeoutError::Timeout) => Err(RunFailure::TimedOut(limit)),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(RunFailure::Panicked),
    }
}

/// Check a backend solution and write it back.
fn accept(network: &mut Network, problem: &CompiledProblem, solution: LpSolution, tolerance: f64) -> Outcome {
    let program = &problem.program;
    if solution.values.len() != program.num_variables() {
        return Outcome::failed(
            SolveStatus::SolverError,
            format!(
                "backend returned {} values for {} variables",
                solution.values.len(),
                program.num_variables()
            ),
        );
    }
    if solution.values.iter().any(|v| !v.is_finite()) || !solution.objective.is_finite() {
        return Outcome::failed(SolveStatus::SolverError, "backend returned non-finite values");
    }

    let violation = program.max_violation(&solution.values);
    if violation > tolerance {
        warn!(violation, tolerance, "solution violates constraints beyond tolerance");
    }

    write_back(network, problem, &solution.values);

    let global_constraints = network
        .global_constraints
        .iter()
        .filter_map(|gc| gc.value_opt.map(|v| (gc.name.clone(), v)))
        .collect();

    Outcome {
        status: SolveStatus::Optimal,
        objective_value: Some(solution.objective),
        write_back: true,
        capital_cost: Some(problem.objective.capex.evaluate(&solution.values)),
        operating_cost: Some(problem.objective.opex.evaluate(&solution.values)),
        global_constraints,
        num_variables: 0,
        num_constraints: 0,
        max_violation: Some(violation),
        solve_time: Duration::ZERO,
        message: String::new(),
    }
}
