//! Discounted multi-period cost.
//!
//! ```text
//! min  Σ_asset objective_weight(first active period) · capital_cost · nom
//!    + Σ_t weight(t) · years(period(t)) · Σ_asset marginal_cost · dispatch(asset, t)
//! ```
//!
//! Capital cost is charged once, in the period an extendable asset first
//! becomes active. Fixed capacity carries no capital term.

use horizon_core::Asset;
use tracing::debug;

use crate::lp::{LinearExpr, LinearProgram, VarId};
use crate::variables::{ModelContext, VariableMap};

/// The two halves of the objective, kept apart for reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectiveTerms {
    pub capex: LinearExpr,
    pub opex: LinearExpr,
}

impl ObjectiveTerms {
    pub fn total(&self) -> LinearExpr {
        let mut total = self.capex.clone();
        total.add_scaled(&self.opex, 1.0);
        total.compact()
    }
}

pub fn capital_cost(ctx: &ModelContext<'_>, vars: &VariableMap) -> LinearExpr {
    let mut expr = LinearExpr::new();
    for (asset, nom, activity) in vars.capacity_terms(ctx) {
        let (Some(var), Some(first)) = (nom.var(), activity.first()) else {
            continue;
        };
        let cost = asset.capacity().capital_cost;
        expr.add_term(var, cost * ctx.objective_weight(first));
    }
    expr
}

pub fn operating_cost(ctx: &ModelContext<'_>, vars: &VariableMap) -> LinearExpr {
    let net = ctx.network;
    let mut expr = LinearExpr::new();

    let mut add_series = |cost: f64, series: &[Option<VarId>]| {
        if cost == 0.0 {
            return;
        }
        for (t, var) in series.iter().enumerate() {
            if let Some(var) = *var {
                expr.add_term(var, cost * ctx.operating_weight(t));
            }
        }
    };

    for (gen, v) in net.generators.iter().zip(&vars.generators) {
        add_series(gen.marginal_cost, &v.p);
    }
    for (unit, v) in net.storage_units.iter().zip(&vars.storage_units) {
        add_series(unit.marginal_cost, &v.p_dispatch);
    }
    for (store, v) in net.stores.iter().zip(&vars.stores) {
        add_series(store.marginal_cost, &v.p);
    }
    for (link, v) in net.links.iter().zip(&vars.links) {
        add_series(link.marginal_cost, &v.p0);
    }

    expr
}

/// Set the program objective; returns its parts.
pub fn set_objective(ctx: &ModelContext<'_>, vars: &VariableMap, lp: &mut LinearProgram) -> ObjectiveTerms {
    let terms = ObjectiveTerms {
        capex: capital_cost(ctx, vars).compact(),
        opex: operating_cost(ctx, vars).compact(),
    };
    debug!(
        capex_terms = terms.capex.terms.len(),
        opex_terms = terms.opex.terms.len(),
        "objective"
    );
    lp.objective = terms.total();
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_core::{Bus, Generator, Network, TemporalIndex};

    use crate::options::SolveOptions;
    use crate::variables::add_generator_variables;

    fn coef(expr: &LinearExpr, var: VarId) -> f64 {
        expr.terms
            .iter()
            .filter(|&&(v, _)| v == var)
            .map(|&(_, c)| c)
            .sum()
    }

    fn network() -> Network {
        let index = TemporalIndex::builder()
            .period_with_years(2020, 10.0)
            .period_with_years(2030, 10.0)
            .snapshots_for(2020, 1, 2.0)
            .snapshots_for(2030, 1, 2.0)
            .discount_rate(0.05)
            .build()
            .unwrap();
        let mut network = Network::new("objective", index);
        network.add_bus(Bus::new("a")).unwrap();
        network
            .add_generator(
                Generator::new("late", "a", "wind")
                    .extendable(0.0, None)
                    .with_costs(3.0, 1000.0)
                    .with_lifecycle(2030, 25.0),
            )
            .unwrap();
        network
            .add_generator(Generator::new("fixed", "a", "gas").with_p_nom(50.0).with_costs(40.0, 500.0))
            .unwrap();
        network
    }

    #[test]
    fn test_capex_once_at_first_active_period() {
        let network = network();
        let options = SolveOptions::multi_period();
        let ctx = ModelContext::new(&network, &options);
        let mut lp = LinearProgram::new();
        let vars = VariableMap {
            generators: add_generator_variables(&ctx, &mut lp),
            ..Default::default()
        };
        let terms = set_objective(&ctx, &vars, &mut lp);

        let nom = vars.generators[0].nom.var().unwrap();
        let discount = 1.0 / 1.05f64.powi(10);
        assert!((coef(&terms.capex, nom) - 1000.0 * discount).abs() < 1e-9);
        // fixed capacity has no capital term
        assert_eq!(terms.capex.terms.len(), 1);
    }

    #[test]
    fn test_opex_weighted_by_hours_and_years() {
        let network = network();
        let options = SolveOptions::multi_period();
        let ctx = ModelContext::new(&network, &options);
        let mut lp = LinearProgram::new();
        let vars = VariableMap {
            generators: add_generator_variables(&ctx, &mut lp),
            ..Default::default()
        };
        let terms = set_objective(&ctx, &vars, &mut lp);

        let gas = vars.generators[1].p[0].unwrap();
        assert!((coef(&terms.opex, gas) - 40.0 * 2.0 * 10.0).abs() < 1e-9);
        // inactive in 2020, so only one dispatch term for the wind plant
        assert!(vars.generators[0].p[0].is_none());
        assert_eq!(terms.opex.terms.len(), 3);
        assert_eq!(lp.objective, terms.total());
    }

    #[test]
    fn test_single_period_weights_are_unity() {
        let network = network();
        let options = SolveOptions::default();
        let ctx = ModelContext::new(&network, &options);
        let mut lp = LinearProgram::new();
        let vars = VariableMap {
            generators: add_generator_variables(&ctx, &mut lp),
            ..Default::default()
        };
        let terms = set_objective(&ctx, &vars, &mut lp);
        let nom = vars.generators[0].nom.var().unwrap();
        assert_eq!(coef(&terms.capex, nom), 1000.0);
        let gas = vars.generators[1].p[1].unwrap();
        assert_eq!(coef(&terms.opex, gas), 80.0);
    }
}
