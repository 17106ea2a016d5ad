//! Network → linear program.
//!
//! Assembly order is fixed: variables (generators, storage units, stores,
//! links, lines), then energy balance, capacity bounds, global constraints
//! and finally the objective. The network is only borrowed; compiling twice
//! from the same inputs yields the same program.

use horizon_core::{HorizonResult, Network};
use tracing::{debug, info};

use crate::builders::{
    add_capacity_bounds, add_energy_balance, add_global_constraints, add_link_variables,
    add_storage_units, add_stores, set_objective, ObjectiveTerms,
};
use crate::lp::{LinearExpr, LinearProgram};
use crate::options::SolveOptions;
use crate::variables::{add_generator_variables, add_line_variables, ModelContext, VariableMap};

/// A compiled program plus everything needed to interpret its solution.
#[derive(Debug, Clone)]
pub struct CompiledProblem {
    pub program: LinearProgram,
    pub variables: VariableMap,
    /// Left-hand side of each global constraint, in network order
    pub global_exprs: Vec<LinearExpr>,
    pub objective: ObjectiveTerms,
}

/// Validate `network` and build its linear program.
///
/// Fails with [`horizon_core::HorizonError::Configuration`] on invalid
/// options or any error-severity diagnostic; nothing is built in that case.
pub fn compile(network: &Network, options: &SolveOptions) -> HorizonResult<CompiledProblem> {
    options.validate()?;
    let diagnostics = network.check()?;
    if options.multi_period {
        network.check_period_domain()?;
    }
    if diagnostics.warning_count() > 0 {
        debug!(warnings = diagnostics.warning_count(), "network has warnings");
    }

    let ctx = ModelContext::new(network, options);
    let mut lp = LinearProgram::new();

    let variables = VariableMap {
        generators: add_generator_variables(&ctx, &mut lp),
        storage_units: add_storage_units(&ctx, &mut lp),
        stores: add_stores(&ctx, &mut lp),
        links: add_link_variables(&ctx, &mut lp),
        lines: add_line_variables(&ctx, &mut lp),
    };
    debug!(
        variables = lp.num_variables(),
        rows = lp.num_constraints(),
        "asset variables"
    );

    let balance = add_energy_balance(&ctx, &variables, &mut lp);
    debug!(rows = balance, parallel = options.use_parallel(), "energy balance");

    let bounds = add_capacity_bounds(&ctx, &variables, &mut lp);
    debug!(rows = bounds, "capacity bounds");

    let global_exprs = add_global_constraints(&ctx, &variables, &mut lp);
    let objective = set_objective(&ctx, &variables, &mut lp);

    info!(
        network = %network.name,
        variables = lp.num_variables(),
        constraints = lp.num_constraints(),
        snapshots = ctx.num_snapshots(),
        periods = ctx.index.num_periods(),
        multi_period = options.multi_period,
        "compiled linear program"
    );

    Ok(CompiledProblem {
        program: lp,
        variables,
        global_exprs,
        objective,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_core::{Bus, Generator, Load, TemporalIndex};

    fn network() -> Network {
        let mut network = Network::new("compile", TemporalIndex::uniform(3, 1.0));
        network.add_bus(Bus::new("a")).unwrap();
        network
            .add_generator(Generator::new("g", "a", "gas").extendable(0.0, None).with_costs(10.0, 100.0))
            .unwrap();
        network.add_load(Load::new("l", "a", 5.0)).unwrap();
        network
    }

    #[test]
    fn test_compile_is_deterministic() {
        let network = network();
        let options = SolveOptions::default();
        let a = compile(&network, &options).unwrap();
        let b = compile(&network, &options.clone().sequential()).unwrap();
        assert_eq!(a.program.constraints, b.program.constraints);
        assert_eq!(a.program.variables, b.program.variables);
        assert_eq!(a.program.objective, b.program.objective);
    }

    #[test]
    fn test_compile_counts() {
        let problem = compile(&network(), &SolveOptions::default()).unwrap();
        // nom + 3 dispatch
        assert_eq!(problem.program.num_variables(), 4);
        // 3 dispatch upper rows + 3 balance rows
        assert_eq!(problem.program.num_constraints(), 6);
        assert!(problem.global_exprs.is_empty());
    }

    #[test]
    fn test_dangling_reference_is_configuration_error() {
        let mut network = network();
        network.loads[0].bus = "nowhere".to_string();
        let err = compile(&network, &SolveOptions::default()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_invalid_options_rejected_before_assembly() {
        let options = SolveOptions::default().with_tolerance(-1.0);
        let err = compile(&network(), &options).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_build_year_beyond_periods_rejected_in_multi_period() {
        let index = TemporalIndex::builder()
            .period(2030)
            .period(2040)
            .snapshots_for(2030, 1, 1.0)
            .snapshots_for(2040, 1, 1.0)
            .build()
            .unwrap();
        let mut network = Network::new("late", index);
        network.add_bus(Bus::new("a")).unwrap();
        network
            .add_generator(Generator::new("g", "a", "gas").with_p_nom(10.0).with_lifecycle(2050, 20.0))
            .unwrap();
        network.add_load(Load::new("l", "a", 5.0)).unwrap();

        // lifecycle is not gated in single-period mode
        assert!(compile(&network, &SolveOptions::default()).is_ok());

        let err = compile(&network, &SolveOptions::multi_period()).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("build year 2050"));
    }
}
