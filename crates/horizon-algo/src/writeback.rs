//! Copy optimal values onto the network entities.
//!
//! Series get one value per snapshot; snapshots where an asset is inactive
//! read `0.0`. Capacities of never-active assets read `0.0`.

use horizon_core::Network;

use crate::builders::realized_outputs;
use crate::compile::CompiledProblem;
use crate::lp::VarId;

fn realize(series: &[Option<VarId>], values: &[f64]) -> Vec<f64> {
    series
        .iter()
        .map(|var| var.map_or(0.0, |v| values[v.index()]))
        .collect()
}

/// Write realized capacities, dispatch, flows and storage levels.
///
/// `values` must come from solving `problem.program`, compiled from this
/// network.
pub fn write_back(network: &mut Network, problem: &CompiledProblem, values: &[f64]) {
    let vars = &problem.variables;

    for (gen, v) in network.generators.iter_mut().zip(&vars.generators) {
        gen.p_nom_opt = Some(v.nom.value(values));
        gen.p = realize(&v.p, values);
    }

    for (unit, v) in network.storage_units.iter_mut().zip(&vars.storage_units) {
        unit.p_nom_opt = Some(v.nom.value(values));
        unit.p_dispatch = realize(&v.p_dispatch, values);
        unit.p_store = realize(&v.p_store, values);
        unit.p = unit
            .p_dispatch
            .iter()
            .zip(&unit.p_store)
            .map(|(d, s)| d - s)
            .collect();
        unit.state_of_charge = realize(&v.soc, values);
    }

    for (store, v) in network.stores.iter_mut().zip(&vars.stores) {
        store.e_nom_opt = Some(v.nom.value(values));
        store.e = realize(&v.e, values);
        store.p = realize(&v.p, values);
    }

    for (link, v) in network.links.iter_mut().zip(&vars.links) {
        link.p_nom_opt = Some(v.nom.value(values));
        link.p0 = realize(&v.p0, values);
        link.p_out = realized_outputs(link, &link.p0);
    }

    for (line, v) in network.lines.iter_mut().zip(&vars.lines) {
        line.s_nom_opt = Some(v.nom.value(values));
        line.p0 = realize(&v.p, values);
    }

    for (gc, expr) in network.global_constraints.iter_mut().zip(&problem.global_exprs) {
        gc.value_opt = Some(expr.evaluate(values));
    }
}
