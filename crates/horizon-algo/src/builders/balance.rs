//! Nodal energy balance, one equality per `(snapshot, bus)`.
//!
//! ```text
//! Σ gen p + Σ unit (p_dispatch - p_store) + Σ store p
//!   - Σ link p0 (input bus) + Σ link efficiency_k · p0 (output bus k)
//!   - Σ line p (bus0) + Σ line p (bus1)  =  Σ load p_set
//! ```
//!
//! Rows are produced snapshot by snapshot; with the `parallel` feature the
//! snapshots are spread over the rayon pool. Row order is `(t, bus)` in both
//! cases.

use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::builders::link::bus_coefficients;
use crate::lp::{normalize, LinearConstraint, LinearExpr, LinearProgram, Sense};
use crate::variables::{ModelContext, VariableMap};

/// Append all balance rows; returns the number added.
pub fn add_energy_balance(ctx: &ModelContext<'_>, vars: &VariableMap, lp: &mut LinearProgram) -> usize {
    let buses = ctx.network.bus_positions();
    let n = ctx.num_snapshots();

    let rows: Vec<Vec<LinearConstraint>> = if ctx.options.use_parallel() {
        par_rows(ctx, vars, &buses, n)
    } else {
        (0..n).map(|t| snapshot_rows(ctx, vars, &buses, t)).collect()
    };

    let before = lp.num_constraints();
    lp.extend_constraints(rows.into_iter().flatten());
    lp.num_constraints() - before
}

#[cfg(feature = "parallel")]
fn par_rows(
    ctx: &ModelContext<'_>,
    vars: &VariableMap,
    buses: &HashMap<&str, usize>,
    n: usize,
) -> Vec<Vec<LinearConstraint>> {
    (0..n)
        .into_par_iter()
        .map(|t| snapshot_rows(ctx, vars, buses, t))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn par_rows(
    ctx: &ModelContext<'_>,
    vars: &VariableMap,
    buses: &HashMap<&str, usize>,
    n: usize,
) -> Vec<Vec<LinearConstraint>> {
    (0..n).map(|t| snapshot_rows(ctx, vars, buses, t)).collect()
}

/// Balance rows of every bus at snapshot `t`, in bus order.
fn snapshot_rows(
    ctx: &ModelContext<'_>,
    vars: &VariableMap,
    buses: &HashMap<&str, usize>,
    t: usize,
) -> Vec<LinearConstraint> {
    let net = ctx.network;
    let mut injections = vec![LinearExpr::new(); net.buses.len()];
    let mut load = vec![0.0; net.buses.len()];

    let mut inject = |bus: &str, expr: LinearExpr| {
        if let Some(&b) = buses.get(bus) {
            injections[b].add_scaled(&expr, 1.0);
        }
    };

    for (gen, v) in net.generators.iter().zip(&vars.generators) {
        if let Some(p) = v.p[t] {
            inject(&gen.bus, LinearExpr::term(p, 1.0));
        }
    }
    for (unit, v) in net.storage_units.iter().zip(&vars.storage_units) {
        inject(&unit.bus, v.net(t));
    }
    for (store, v) in net.stores.iter().zip(&vars.stores) {
        if let Some(p) = v.p[t] {
            inject(&store.bus, LinearExpr::term(p, 1.0));
        }
    }
    for (link, v) in net.links.iter().zip(&vars.links) {
        if let Some(p0) = v.p0[t] {
            for (bus, coef) in bus_coefficients(link, t) {
                inject(bus, LinearExpr::term(p0, coef));
            }
        }
    }
    for (line, v) in net.lines.iter().zip(&vars.lines) {
        if let Some(p) = v.p[t] {
            inject(&line.bus0, LinearExpr::term(p, -1.0));
            inject(&line.bus1, LinearExpr::term(p, 1.0));
        }
    }
    for l in &net.loads {
        if let Some(&b) = buses.get(l.bus.as_str()) {
            load[b] += l.p_set.at(t);
        }
    }

    let label = ctx.snapshot_label(t);
    injections
        .into_iter()
        .zip(load)
        .enumerate()
        .filter(|(_, (expr, load))| !(expr.is_constant() && *load == 0.0))
        .map(|(b, (expr, load))| {
            normalize(
                format!("balance {} {}", net.buses[b].name, label),
                expr,
                Sense::Eq,
                load,
            )
        })
        .collect()
}
