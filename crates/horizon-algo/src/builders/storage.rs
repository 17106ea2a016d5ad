//! Storage units and stores: variables and state-of-charge dynamics.
//!
//! For a storage unit at snapshot `t` with weight `w` (hours):
//!
//! ```text
//! soc(t) = (1 - standing_loss)^w · soc(prev)
//!        + w · (η_store · p_store(t) - p_dispatch(t) / η_dispatch + inflow(t) - spill(t))
//! ```
//!
//! For a store, `e(t) = (1 - standing_loss)^w · e(prev) - w · p(t)`.
//!
//! `prev` is the previous snapshot, the last snapshot when cyclic, or the
//! initial level. In multi-period mode with per-period cycling each period
//! starts over.

use horizon_core::Asset;

use crate::lp::{LinearExpr, LinearProgram, Sense, VarId};
use crate::variables::{capacity_term, dispatch_variable, ModelContext, StorageUnitVars, StoreVars};

/// Predecessor of a state variable.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Previous {
    State(VarId),
    Initial,
}

/// Resolve the state preceding `t`.
///
/// Activity is contiguous over periods, so the first existing variable of a
/// run is the only one without a same-run predecessor.
fn previous(
    ctx: &ModelContext<'_>,
    states: &[Option<VarId>],
    t: usize,
    cyclic: bool,
    per_period: bool,
) -> Previous {
    if ctx.options.multi_period && per_period {
        let range = ctx.index.period_of(t).snapshot_range();
        if t > range.start {
            return states[t - 1].map_or(Previous::Initial, Previous::State);
        }
        if cyclic {
            return states[range.end - 1].map_or(Previous::Initial, Previous::State);
        }
        return Previous::Initial;
    }

    if t > 0 {
        if let Some(prev) = states[t - 1] {
            return Previous::State(prev);
        }
    }
    if cyclic {
        if let Some(last) = states.iter().rev().find_map(|s| *s) {
            return Previous::State(last);
        }
    }
    Previous::Initial
}

fn retention(standing_loss: f64, weight: f64) -> f64 {
    (1.0 - standing_loss).powf(weight)
}

/// Storage-unit variables plus their dynamics rows.
pub fn add_storage_units(ctx: &ModelContext<'_>, lp: &mut LinearProgram) -> Vec<StorageUnitVars> {
    let n = ctx.num_snapshots();
    let mut all = Vec::with_capacity(ctx.network.storage_units.len());

    for (unit, activity) in ctx.network.storage_units.iter().zip(&ctx.activity.storage_units) {
        let label = unit.label();
        let nom = capacity_term(lp, &label, unit.capacity(), activity);
        let has_inflow = (0..n).any(|t| unit.inflow.at(t) > 0.0);

        let mut vars = StorageUnitVars {
            nom,
            p_dispatch: vec![None; n],
            p_store: vec![None; n],
            soc: vec![None; n],
            spill: vec![None; n],
        };

        for t in (0..n).filter(|&t| ctx.active_at(activity, t)) {
            let snap = ctx.snapshot_label(t);
            vars.p_dispatch[t] = Some(dispatch_variable(
                lp,
                format!("{} p_dispatch {}", label, snap),
                nom,
                0.0,
                unit.p_max_pu.at(t).max(0.0),
            ));
            vars.p_store[t] = Some(dispatch_variable(
                lp,
                format!("{} p_store {}", label, snap),
                nom,
                0.0,
                (-unit.p_min_pu.at(t)).max(0.0),
            ));
            vars.soc[t] = Some(dispatch_variable(
                lp,
                format!("{} soc {}", label, snap),
                nom,
                0.0,
                unit.max_hours,
            ));
            if has_inflow {
                let cap = unit.inflow.at(t).max(0.0);
                vars.spill[t] = Some(lp.add_variable(format!("{} spill {}", label, snap), 0.0, cap));
            }
        }

        for t in 0..n {
            let Some(soc) = vars.soc[t] else { continue };
            let w = ctx.index.weight(t);
            let keep = retention(unit.standing_loss, w);

            // soc(t) - keep·soc(prev) - w·η_s·p_store + w/η_d·p_dispatch + w·spill = w·inflow
            let mut row = LinearExpr::term(soc, 1.0);
            let mut rhs = w * unit.inflow.at(t);
            match previous(
                ctx,
                &vars.soc,
                t,
                unit.cyclic_state_of_charge,
                unit.cyclic_state_of_charge_per_period,
            ) {
                Previous::State(prev) => row.add_term(prev, -keep),
                Previous::Initial => rhs += keep * unit.state_of_charge_initial,
            }
            if let Some(store) = vars.p_store[t] {
                row.add_term(store, -w * unit.efficiency_store);
            }
            if let Some(dispatch) = vars.p_dispatch[t] {
                row.add_term(dispatch, w / unit.efficiency_dispatch);
            }
            if let Some(spill) = vars.spill[t] {
                row.add_term(spill, w);
            }
            lp.add_constraint(
                format!("{} soc balance {}", label, ctx.snapshot_label(t)),
                row,
                Sense::Eq,
                rhs,
            );
        }

        all.push(vars);
    }

    all
}

/// Store variables plus their energy dynamics rows.
pub fn add_stores(ctx: &ModelContext<'_>, lp: &mut LinearProgram) -> Vec<StoreVars> {
    let n = ctx.num_snapshots();
    let mut all = Vec::with_capacity(ctx.network.stores.len());

    for (store, activity) in ctx.network.stores.iter().zip(&ctx.activity.stores) {
        let label = store.label();
        let nom = capacity_term(lp, &label, store.capacity(), activity);
        let mut vars = StoreVars {
            nom,
            e: vec![None; n],
            p: vec![None; n],
        };

        for t in (0..n).filter(|&t| ctx.active_at(activity, t)) {
            let snap = ctx.snapshot_label(t);
            vars.e[t] = Some(dispatch_variable(
                lp,
                format!("{} e {}", label, snap),
                nom,
                store.e_min_pu.at(t),
                store.e_max_pu.at(t),
            ));
            vars.p[t] = Some(lp.add_variable(
                format!("{} p {}", label, snap),
                f64::NEG_INFINITY,
                f64::INFINITY,
            ));
        }

        for t in 0..n {
            let (Some(e), Some(p)) = (vars.e[t], vars.p[t]) else {
                continue;
            };
            let w = ctx.index.weight(t);
            let keep = retention(store.standing_loss, w);

            // e(t) - keep·e(prev) + w·p(t) = 0
            let mut row = LinearExpr::term(e, 1.0);
            row.add_term(p, w);
            let mut rhs = 0.0;
            match previous(ctx, &vars.e, t, store.e_cyclic, store.e_cyclic_per_period) {
                Previous::State(prev) => row.add_term(prev, -keep),
                Previous::Initial => rhs += keep * store.e_initial,
            }
            lp.add_constraint(
                format!("{} energy balance {}", label, ctx.snapshot_label(t)),
                row,
                Sense::Eq,
                rhs,
            );
        }

        all.push(vars);
    }

    all
}
