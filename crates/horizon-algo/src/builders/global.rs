//! Horizon-wide scalar limits over a carrier attribute.
//!
//! ```text
//! Σ_t weight(t) · years(period(t)) · Σ_asset attribute[carrier(asset)] · dispatch(asset, t)  R  constant
//! ```
//!
//! Dispatch is generator `p`, storage-unit `p_dispatch - p_store`, link `p0`
//! and store `p`. Attributes may be negative, so removal shows up as a
//! negative contribution.

use horizon_core::{GlobalConstraint, Relation};
use tracing::debug;

use crate::lp::{LinearExpr, LinearProgram, Sense, VarId};
use crate::variables::{ModelContext, VariableMap};

impl From<Relation> for Sense {
    fn from(relation: Relation) -> Self {
        match relation {
            Relation::LessEqual => Sense::Le,
            Relation::GreaterEqual => Sense::Ge,
            Relation::Equal => Sense::Eq,
        }
    }
}

/// Left-hand side of one global constraint.
pub fn global_expression(ctx: &ModelContext<'_>, vars: &VariableMap, constraint: &GlobalConstraint) -> LinearExpr {
    let net = ctx.network;
    let attribute = constraint.carrier_attribute.as_str();
    let mut expr = LinearExpr::new();

    let add_series = |factor: f64, series: &[Option<VarId>], sign: f64, expr: &mut LinearExpr| {
        if factor == 0.0 {
            return;
        }
        for (t, var) in series.iter().enumerate() {
            if let Some(var) = *var {
                expr.add_term(var, sign * factor * ctx.operating_weight(t));
            }
        }
    };

    for (gen, v) in net.generators.iter().zip(&vars.generators) {
        add_series(net.carrier_attribute(&gen.carrier, attribute), &v.p, 1.0, &mut expr);
    }
    for (unit, v) in net.storage_units.iter().zip(&vars.storage_units) {
        let factor = net.carrier_attribute(&unit.carrier, attribute);
        add_series(factor, &v.p_dispatch, 1.0, &mut expr);
        add_series(factor, &v.p_store, -1.0, &mut expr);
    }
    for (link, v) in net.links.iter().zip(&vars.links) {
        add_series(net.carrier_attribute(&link.carrier, attribute), &v.p0, 1.0, &mut expr);
    }
    for (store, v) in net.stores.iter().zip(&vars.stores) {
        add_series(net.carrier_attribute(&store.carrier, attribute), &v.p, 1.0, &mut expr);
    }

    expr.compact()
}

/// One row per global constraint; returns the left-hand sides in network
/// order for evaluating realized values.
pub fn add_global_constraints(
    ctx: &ModelContext<'_>,
    vars: &VariableMap,
    lp: &mut LinearProgram,
) -> Vec<LinearExpr> {
    ctx.network
        .global_constraints
        .iter()
        .map(|gc| {
            let expr = global_expression(ctx, vars, gc);
            debug!(
                constraint = %gc.name,
                terms = expr.terms.len(),
                sense = %gc.sense,
                constant = gc.constant,
                "global constraint"
            );
            lp.add_constraint(
                format!("global '{}'", gc.name),
                expr.clone(),
                gc.sense.into(),
                gc.constant,
            );
            expr
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_core::{Bus, Carrier, Generator, Link, Network, TemporalIndex};

    use crate::builders::link::add_link_variables;
    use crate::options::SolveOptions;
    use crate::variables::add_generator_variables;

    #[test]
    fn test_weighted_by_hours_and_years() {
        let index = TemporalIndex::builder()
            .period_with_years(2030, 10.0)
            .snapshots_for(2030, 2, 3.0)
            .build()
            .unwrap();
        let mut network = Network::new("global", index);
        network.add_bus(Bus::new("elec")).unwrap();
        network.add_bus(Bus::new("co2")).unwrap();
        network
            .add_carrier(Carrier::new("gas").with_attribute("co2_emissions", 0.2))
            .unwrap();
        network
            .add_carrier(Carrier::new("dac").with_attribute("co2_emissions", -1.0))
            .unwrap();
        network
            .add_generator(Generator::new("ocgt", "elec", "gas").with_p_nom(100.0))
            .unwrap();
        network
            .add_generator(Generator::new("wind", "elec", "wind").with_p_nom(100.0))
            .unwrap();
        network
            .add_link(Link::new("capture", "elec").with_output("co2", 1.0).with_carrier("dac").with_p_nom(10.0))
            .unwrap();
        network
            .add_global_constraint(GlobalConstraint::co2_limit("net negative", -50.0))
            .unwrap();

        let options = SolveOptions::multi_period();
        let ctx = ModelContext::new(&network, &options);
        let mut lp = LinearProgram::new();
        let vars = VariableMap {
            generators: add_generator_variables(&ctx, &mut lp),
            links: add_link_variables(&ctx, &mut lp),
            ..Default::default()
        };
        let exprs = add_global_constraints(&ctx, &vars, &mut lp);

        assert_eq!(exprs.len(), 1);
        let row = lp.constraints.last().unwrap();
        assert_eq!(row.sense, Sense::Le);
        assert_eq!(row.rhs, -50.0);
        // gas: 0.2 × 3 h × 10 y, capture: -1 × 30, wind: absent
        let gas = vars.generators[0].p[0].unwrap();
        let capture = vars.links[0].p0[1].unwrap();
        let coef = |var: VarId| {
            row.expr
                .terms
                .iter()
                .find(|&&(v, _)| v == var)
                .map(|&(_, c)| c)
                .unwrap()
        };
        assert!((coef(gas) - 6.0).abs() < 1e-12);
        assert!((coef(capture) + 30.0).abs() < 1e-12);
        assert_eq!(row.expr.terms.len(), 4);
    }

    #[test]
    fn test_relation_to_sense() {
        assert_eq!(Sense::from(Relation::GreaterEqual), Sense::Ge);
        assert_eq!(Sense::from(Relation::Equal), Sense::Eq);
    }
}
