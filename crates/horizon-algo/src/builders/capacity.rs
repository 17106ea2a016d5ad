//! Per-bus, per-carrier bounds on aggregate nominal capacity.
//!
//! `nom_min[c] <= Σ nom(asset) <= nom_max[c]` over generators and storage
//! units at the bus with carrier `c` that are active somewhere in the
//! horizon. Fixed capacities enter as constants.

use horizon_core::Asset;
use tracing::warn;

use crate::lp::{LinearExpr, LinearProgram, Sense};
use crate::variables::{ModelContext, VariableMap};

/// Aggregate capacity expression of generation-type assets at `(bus, carrier)`.
pub fn aggregate_capacity(ctx: &ModelContext<'_>, vars: &VariableMap, bus: &str, carrier: &str) -> LinearExpr {
    let net = ctx.network;
    let mut expr = LinearExpr::new();

    let gens = net
        .generators
        .iter()
        .zip(&vars.generators)
        .map(|(a, v)| (a as &dyn Asset, v.nom));
    let units = net
        .storage_units
        .iter()
        .zip(&vars.storage_units)
        .map(|(a, v)| (a as &dyn Asset, v.nom));

    for (asset, nom) in gens.chain(units) {
        if nom.is_active() && asset.carrier() == carrier && asset.buses()[0] == bus {
            expr.add_scaled(&nom.expr(), 1.0);
        }
    }
    expr
}

/// Append capacity-bound rows; returns the number added.
pub fn add_capacity_bounds(ctx: &ModelContext<'_>, vars: &VariableMap, lp: &mut LinearProgram) -> usize {
    let before = lp.num_constraints();

    for bus in &ctx.network.buses {
        for carrier in bus.bounded_carriers() {
            let expr = aggregate_capacity(ctx, vars, &bus.name, carrier);
            if expr.is_constant() && expr.constant == 0.0 {
                warn!(bus = %bus.name, carrier, "capacity bound matches no active asset");
            }

            if let Some(&min) = bus.nom_min.get(carrier) {
                lp.add_constraint(
                    format!("bus '{}' {} nom_min", bus.name, carrier),
                    expr.clone(),
                    Sense::Ge,
                    min,
                );
            }
            if let Some(&max) = bus.nom_max.get(carrier).filter(|m| m.is_finite()) {
                lp.add_constraint(
                    format!("bus '{}' {} nom_max", bus.name, carrier),
                    expr,
                    Sense::Le,
                    max,
                );
            }
        }
    }

    lp.num_constraints() - before
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_core::{Bus, Generator, Network, StorageUnit, TemporalIndex};

    use crate::builders::storage::add_storage_units;
    use crate::options::SolveOptions;
    use crate::variables::add_generator_variables;

    #[test]
    fn test_bounds_sum_matching_assets_only() {
        let mut network = Network::new("caps", TemporalIndex::uniform(1, 1.0));
        network
            .add_bus(Bus::new("x").with_nom_min("solar", 100.0).with_nom_max("solar", 2200.0))
            .unwrap();
        network.add_bus(Bus::new("y")).unwrap();
        network
            .add_generator(Generator::new("pv1", "x", "solar").extendable(0.0, None))
            .unwrap();
        network
            .add_generator(Generator::new("pv2", "x", "solar").with_p_nom(300.0))
            .unwrap();
        network
            .add_generator(Generator::new("gas", "x", "gas").extendable(0.0, None))
            .unwrap();
        network
            .add_generator(Generator::new("pv3", "y", "solar").extendable(0.0, None))
            .unwrap();
        network
            .add_storage_unit(StorageUnit::new("battery", "x", "solar").extendable(0.0, None))
            .unwrap();

        let options = SolveOptions::default();
        let ctx = ModelContext::new(&network, &options);
        let mut lp = LinearProgram::new();
        let vars = VariableMap {
            generators: add_generator_variables(&ctx, &mut lp),
            storage_units: add_storage_units(&ctx, &mut lp),
            ..Default::default()
        };
        let first = lp.num_constraints();
        let rows = add_capacity_bounds(&ctx, &vars, &mut lp);
        assert_eq!(rows, 2);

        let min_row = &lp.constraints[first];
        let max_row = &lp.constraints[first + 1];
        assert_eq!(min_row.sense, Sense::Ge);
        // pv2's fixed 300 moves to the right-hand side
        assert_eq!(min_row.rhs, -200.0);
        assert_eq!(max_row.rhs, 1900.0);

        let pv1 = vars.generators[0].nom.var().unwrap();
        let battery = vars.storage_units[0].nom.var().unwrap();
        let gas = vars.generators[2].nom.var().unwrap();
        assert!(max_row.expr.terms.contains(&(pv1, 1.0)));
        assert!(max_row.expr.terms.contains(&(battery, 1.0)));
        assert!(!max_row.expr.terms.iter().any(|&(v, _)| v == gas));
    }
}
