//! # horizon-algo: Network-to-LP Compiler
//!
//! Turns a [`horizon_core::Network`] plus its multi-period time index into a
//! linear program, solves it through a pluggable backend and writes the
//! optimal capacities and dispatch back into the network.
//!
//! ## Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Activity | [`variables`] | which asset exists in which period |
//! | Variables | [`variables`], [`builders::link`], [`builders::storage`] | capacity, dispatch, flow, state |
//! | Energy balance | [`builders::balance`] | one row per `(snapshot, bus)` |
//! | Capacity bounds | [`builders::capacity`] | `nom_min`/`nom_max` per `(bus, carrier)` |
//! | Global limits | [`builders::global`] | one row per global constraint |
//! | Objective | [`builders::objective`] | discounted capital + weighted operating cost |
//! | Solve | [`mod@solve`], [`backend`] | [`Outcome`], write-back on success |
//!
//! The program is held in a solver-independent form ([`lp::LinearProgram`]);
//! [`backend::LpBackend`] implementations translate it. The default backend
//! is Clarabel through `good_lp`.
//!
//! ## Example
//!
//! ```no_run
//! use horizon_algo::{solve, SolveOptions};
//! use horizon_core::{Bus, Generator, Load, Network, TemporalIndex};
//!
//! let mut network = Network::new("demo", TemporalIndex::uniform(24, 1.0));
//! network.add_bus(Bus::new("x").with_nom_max("solar", 2200.0)).unwrap();
//! network
//!     .add_generator(Generator::new("pv", "x", "solar").extendable(0.0, None).with_costs(0.0, 50.0))
//!     .unwrap();
//! network.add_load(Load::new("demand", "x", 500.0)).unwrap();
//!
//! let outcome = solve(&mut network, &SolveOptions::default()).unwrap();
//! println!("{}", outcome.summary());
//! ```
//!
//! ## Features
//!
//! - `solver-clarabel` (default): Clarabel backend
//! - `parallel` (default): energy-balance rows built on the rayon pool

pub mod backend;
pub mod builders;
pub mod compile;
pub mod lp;
pub mod options;
pub mod outcome;
pub mod solve;
pub mod variables;
pub mod writeback;

pub use backend::{BackendRegistry, BackendSettings, ClarabelBackend, LpBackend, LpError, LpSolution};
pub use compile::{compile, CompiledProblem};
pub use lp::{LinearConstraint, LinearExpr, LinearProgram, Sense, VarId};
pub use options::SolveOptions;
pub use outcome::{Outcome, SolveStatus};
pub use solve::{solve, solve_with};
pub use variables::{CapacityTerm, ModelContext, VariableMap};
pub use writeback::write_back;
