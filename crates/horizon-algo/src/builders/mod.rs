//! Row and variable builders, one module per constraint family.

pub mod balance;
pub mod capacity;
pub mod global;
pub mod link;
pub mod objective;
pub mod storage;

pub use balance::add_energy_balance;
pub use capacity::{add_capacity_bounds, aggregate_capacity};
pub use global::{add_global_constraints, global_expression};
pub use link::{add_link_variables, bus_coefficients, efficiency, output_flow, realized_outputs};
pub use objective::{set_objective, ObjectiveTerms};
pub use storage::{add_storage_units, add_stores};
