//! Decision variables and the context builders share.
//!
//! Variables exist only where an asset is active: an asset inactive in a
//! period has no dispatch variables for that period's snapshots, and an asset
//! inactive in every period has no capacity variable either.

use horizon_core::{Asset, LifecycleResolver, Network, NominalCapacity, TemporalIndex};

use crate::lp::{LinearExpr, LinearProgram, Sense, VarId};
use crate::options::SolveOptions;

/// Activity of one asset in every investment period.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity(Vec<bool>);

impl Activity {
    pub fn in_period(&self, period: usize) -> bool {
        self.0.get(period).copied().unwrap_or(false)
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|&a| a)
    }

    pub fn first(&self) -> Option<usize> {
        self.0.iter().position(|&a| a)
    }
}

/// Per-asset activity, resolved once per assembly.
#[derive(Debug, Clone, Default)]
pub struct ActivityTable {
    pub generators: Vec<Activity>,
    pub storage_units: Vec<Activity>,
    pub stores: Vec<Activity>,
    pub links: Vec<Activity>,
    pub lines: Vec<Activity>,
}

impl ActivityTable {
    pub fn resolve(network: &Network, gating: bool) -> Self {
        let index = network.snapshots();
        let resolver = if gating {
            LifecycleResolver::new(index)
        } else {
            LifecycleResolver::without_gating(index)
        };
        let of = |asset: &dyn Asset| Activity(resolver.activity(&asset.lifecycle()));
        Self {
            generators: network.generators.iter().map(|a| of(a)).collect(),
            storage_units: network.storage_units.iter().map(|a| of(a)).collect(),
            stores: network.stores.iter().map(|a| of(a)).collect(),
            links: network.links.iter().map(|a| of(a)).collect(),
            lines: network.lines.iter().map(|a| of(a)).collect(),
        }
    }
}

/// Read-only view every builder works from.
pub struct ModelContext<'a> {
    pub network: &'a Network,
    pub index: &'a TemporalIndex,
    pub options: &'a SolveOptions,
    pub activity: ActivityTable,
}

impl<'a> ModelContext<'a> {
    pub fn new(network: &'a Network, options: &'a SolveOptions) -> Self {
        Self {
            network,
            index: network.snapshots(),
            options,
            activity: ActivityTable::resolve(network, options.multi_period),
        }
    }

    pub fn num_snapshots(&self) -> usize {
        self.index.len()
    }

    /// Calendar years the period of snapshot `t` stands for (1 in
    /// single-period mode).
    pub fn years(&self, t: usize) -> f64 {
        if self.options.multi_period {
            self.index.period_of(t).years
        } else {
            1.0
        }
    }

    /// Weight applied to operating quantities at `t`: hours × years.
    pub fn operating_weight(&self, t: usize) -> f64 {
        self.index.weight(t) * self.years(t)
    }

    /// Discount applied to capital spent in `period` (1 in single-period mode).
    pub fn objective_weight(&self, period: usize) -> f64 {
        if self.options.multi_period {
            self.index.period_weight(period).objective
        } else {
            1.0
        }
    }

    /// True when `activity` covers the period of snapshot `t`.
    pub fn active_at(&self, activity: &Activity, t: usize) -> bool {
        activity.in_period(self.index.period_index_of(t))
    }

    pub fn snapshot_label(&self, t: usize) -> &str {
        &self.index.snapshots()[t].label
    }
}

/// Nominal capacity as it enters the program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CapacityTerm {
    Fixed(f64),
    Variable(VarId),
    /// Never active in the horizon
    Inactive,
}

impl CapacityTerm {
    pub fn expr(&self) -> LinearExpr {
        match *self {
            CapacityTerm::Fixed(value) => LinearExpr::constant(value),
            CapacityTerm::Variable(var) => LinearExpr::term(var, 1.0),
            CapacityTerm::Inactive => LinearExpr::new(),
        }
    }

    pub fn var(&self) -> Option<VarId> {
        match *self {
            CapacityTerm::Variable(var) => Some(var),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, CapacityTerm::Inactive)
    }

    /// Realized capacity; `0.0` for never-active assets.
    pub fn value(&self, values: &[f64]) -> f64 {
        match *self {
            CapacityTerm::Fixed(value) => value,
            CapacityTerm::Variable(var) => values[var.index()],
            CapacityTerm::Inactive => 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorVars {
    pub nom: CapacityTerm,
    pub p: Vec<Option<VarId>>,
}

#[derive(Debug, Clone)]
pub struct StorageUnitVars {
    pub nom: CapacityTerm,
    pub p_dispatch: Vec<Option<VarId>>,
    pub p_store: Vec<Option<VarId>>,
    pub soc: Vec<Option<VarId>>,
    pub spill: Vec<Option<VarId>>,
}

impl StorageUnitVars {
    /// `p_dispatch - p_store`, empty when inactive at `t`.
    pub fn net(&self, t: usize) -> LinearExpr {
        let mut expr = LinearExpr::new();
        if let Some(d) = self.p_dispatch[t] {
            expr.add_term(d, 1.0);
        }
        if let Some(s) = self.p_store[t] {
            expr.add_term(s, -1.0);
        }
        expr
    }
}

#[derive(Debug, Clone)]
pub struct StoreVars {
    pub nom: CapacityTerm,
    pub e: Vec<Option<VarId>>,
    pub p: Vec<Option<VarId>>,
}

#[derive(Debug, Clone)]
pub struct LinkVars {
    pub nom: CapacityTerm,
    pub p0: Vec<Option<VarId>>,
}

#[derive(Debug, Clone)]
pub struct LineVars {
    pub nom: CapacityTerm,
    pub p: Vec<Option<VarId>>,
}

/// Every decision variable, keyed by entity position and snapshot.
#[derive(Debug, Clone, Default)]
pub struct VariableMap {
    pub generators: Vec<GeneratorVars>,
    pub storage_units: Vec<StorageUnitVars>,
    pub stores: Vec<StoreVars>,
    pub links: Vec<LinkVars>,
    pub lines: Vec<LineVars>,
}

impl VariableMap {
    /// Every capacity term with the asset's capital cost and activity, in
    /// [`Network::assets`] order.
    pub fn capacity_terms<'a>(
        &'a self,
        ctx: &'a ModelContext<'_>,
    ) -> impl Iterator<Item = (&'a dyn Asset, CapacityTerm, &'a Activity)> + 'a {
        let net = ctx.network;
        let act = &ctx.activity;
        let gens = net
            .generators
            .iter()
            .zip(&self.generators)
            .zip(&act.generators)
            .map(|((a, v), x)| (a as &dyn Asset, v.nom, x));
        let units = net
            .storage_units
            .iter()
            .zip(&self.storage_units)
            .zip(&act.storage_units)
            .map(|((a, v), x)| (a as &dyn Asset, v.nom, x));
        let stores = net
            .stores
            .iter()
            .zip(&self.stores)
            .zip(&act.stores)
            .map(|((a, v), x)| (a as &dyn Asset, v.nom, x));
        let links = net
            .links
            .iter()
            .zip(&self.links)
            .zip(&act.links)
            .map(|((a, v), x)| (a as &dyn Asset, v.nom, x));
        let lines = net
            .lines
            .iter()
            .zip(&self.lines)
            .zip(&act.lines)
            .map(|((a, v), x)| (a as &dyn Asset, v.nom, x));
        gens.chain(units).chain(stores).chain(links).chain(lines)
    }
}

/// Capacity variable or constant for an asset.
pub fn capacity_term(
    lp: &mut LinearProgram,
    label: &str,
    capacity: NominalCapacity,
    activity: &Activity,
) -> CapacityTerm {
    if !activity.any() {
        return CapacityTerm::Inactive;
    }
    if !capacity.extendable {
        return CapacityTerm::Fixed(capacity.nom);
    }
    let upper = capacity.nom_max.unwrap_or(f64::INFINITY);
    CapacityTerm::Variable(lp.add_variable(format!("{} nom", label), capacity.nom_min, upper))
}

/// A variable bounded by `[lower_pu × nom, upper_pu × nom]`.
///
/// With fixed capacity the range becomes plain variable bounds. With
/// extendable capacity the variable is free and linked to the capacity
/// variable by explicit rows; a zero lower bound stays a variable bound.
pub fn dispatch_variable(
    lp: &mut LinearProgram,
    name: String,
    nom: CapacityTerm,
    lower_pu: f64,
    upper_pu: f64,
) -> VarId {
    match nom {
        CapacityTerm::Fixed(c) => lp.add_variable(name, lower_pu * c, upper_pu * c),
        CapacityTerm::Inactive => lp.add_variable(name, 0.0, 0.0),
        CapacityTerm::Variable(cap) => {
            let lower = if lower_pu == 0.0 { 0.0 } else { f64::NEG_INFINITY };
            let x = lp.add_variable(name.clone(), lower, f64::INFINITY);

            let mut upper_row = LinearExpr::term(x, 1.0);
            upper_row.add_term(cap, -upper_pu);
            lp.add_constraint(format!("{} upper", name), upper_row, Sense::Le, 0.0);

            if lower_pu != 0.0 {
                let mut lower_row = LinearExpr::term(x, 1.0);
                lower_row.add_term(cap, -lower_pu);
                lp.add_constraint(format!("{} lower", name), lower_row, Sense::Ge, 0.0);
            }
            x
        }
    }
}

/// Generator capacity and per-snapshot output.
pub fn add_generator_variables(ctx: &ModelContext<'_>, lp: &mut LinearProgram) -> Vec<GeneratorVars> {
    let n = ctx.num_snapshots();
    ctx.network
        .generators
        .iter()
        .zip(&ctx.activity.generators)
        .map(|(gen, activity)| {
            let label = gen.label();
            let nom = capacity_term(lp, &label, gen.capacity(), activity);
            let p = (0..n)
                .map(|t| {
                    ctx.active_at(activity, t).then(|| {
                        dispatch_variable(
                            lp,
                            format!("{} p {}", label, ctx.snapshot_label(t)),
                            nom,
                            gen.p_min_pu.at(t),
                            gen.p_max_pu.at(t),
                        )
                    })
                })
                .collect();
            GeneratorVars { nom, p }
        })
        .collect()
}

/// Line capacity and per-snapshot flow in `[-s_max_pu, s_max_pu] × s_nom`.
pub fn add_line_variables(ctx: &ModelContext<'_>, lp: &mut LinearProgram) -> Vec<LineVars> {
    let n = ctx.num_snapshots();
    ctx.network
        .lines
        .iter()
        .zip(&ctx.activity.lines)
        .map(|(line, activity)| {
            let label = line.label();
            let nom = capacity_term(lp, &label, line.capacity(), activity);
            let p = (0..n)
                .map(|t| {
                    ctx.active_at(activity, t).then(|| {
                        let pu = line.s_max_pu.at(t);
                        dispatch_variable(
                            lp,
                            format!("{} p {}", label, ctx.snapshot_label(t)),
                            nom,
                            -pu,
                            pu,
                        )
                    })
                })
                .collect();
            LineVars { nom, p }
        })
        .collect()
}
