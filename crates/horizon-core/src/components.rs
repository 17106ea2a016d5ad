//! Entity kinds owned by a [`Network`](crate::Network).
//!
//! Inputs and results live side by side on each entity. Result fields are
//! skipped on deserialization and only ever written by the solve orchestrator
//! after a successful solve.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lifecycle::Lifecycle;
use crate::schema::EntityKind;
use crate::series::Series;

/// Carrier attribute used by emission limits unless told otherwise.
pub const CO2_EMISSIONS: &str = "co2_emissions";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Carrier {
    pub name: String,
    /// Scalar attributes such as `co2_emissions` (t/MWh), may be negative
    pub attributes: BTreeMap<String, f64>,
}

impl Carrier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Attribute value, `0.0` when unset.
    pub fn attribute(&self, key: &str) -> f64 {
        self.attributes.get(key).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bus {
    pub name: String,
    pub carrier: Option<String>,
    /// Lower bound on summed nominal capacity per carrier
    pub nom_min: BTreeMap<String, f64>,
    /// Upper bound on summed nominal capacity per carrier
    pub nom_max: BTreeMap<String, f64>,
    /// Longitude in degrees
    pub x: Option<f64>,
    /// Latitude in degrees
    pub y: Option<f64>,
}

impl Bus {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_carrier(mut self, carrier: impl Into<String>) -> Self {
        self.carrier = Some(carrier.into());
        self
    }

    pub fn with_nom_min(mut self, carrier: impl Into<String>, value: f64) -> Self {
        self.nom_min.insert(carrier.into(), value);
        self
    }

    pub fn with_nom_max(mut self, carrier: impl Into<String>, value: f64) -> Self {
        self.nom_max.insert(carrier.into(), value);
        self
    }

    pub fn with_coordinates(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// `(longitude, latitude)` when both are set.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.x.zip(self.y)
    }

    /// Carriers with at least one declared capacity bound, sorted.
    pub fn bounded_carriers(&self) -> Vec<&str> {
        let mut carriers: Vec<&str> = self
            .nom_min
            .keys()
            .chain(self.nom_max.keys())
            .map(String::as_str)
            .collect();
        carriers.sort_unstable();
        carriers.dedup();
        carriers
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Load {
    pub name: String,
    pub bus: String,
    /// Withdrawal in MW
    pub p_set: Series,
}

impl Default for Load {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus: String::new(),
            p_set: Series::Static(0.0),
        }
    }
}

impl Load {
    pub fn new(name: impl Into<String>, bus: impl Into<String>, p_set: impl Into<Series>) -> Self {
        Self {
            name: name.into(),
            bus: bus.into(),
            p_set: p_set.into(),
        }
    }
}

/// Nominal capacity of an asset, fixed or a decision variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NominalCapacity {
    pub nom: f64,
    pub extendable: bool,
    pub nom_min: f64,
    pub nom_max: Option<f64>,
    pub capital_cost: f64,
}

impl NominalCapacity {
    /// `(lower, upper)` range the realized capacity may take.
    pub fn range(&self) -> (f64, Option<f64>) {
        if self.extendable {
            (self.nom_min, self.nom_max)
        } else {
            (self.nom, Some(self.nom))
        }
    }

    pub fn is_conflicting(&self) -> bool {
        self.extendable && self.nom_max.is_some_and(|max| self.nom_min > max)
    }
}

/// Behaviour shared by every asset that carries a nominal capacity.
pub trait Asset {
    fn kind(&self) -> EntityKind;
    fn name(&self) -> &str;
    fn carrier(&self) -> &str;
    fn lifecycle(&self) -> Lifecycle;
    fn capacity(&self) -> NominalCapacity;
    /// Every bus the asset attaches to.
    fn buses(&self) -> Vec<&str>;

    fn label(&self) -> String {
        format!("{} '{}'", self.kind(), self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Generator {
    pub name: String,
    pub bus: String,
    pub carrier: String,
    pub p_nom: f64,
    pub p_nom_extendable: bool,
    pub p_nom_min: f64,
    pub p_nom_max: Option<f64>,
    pub p_min_pu: Series,
    pub p_max_pu: Series,
    pub marginal_cost: f64,
    pub capital_cost: f64,
    pub build_year: Option<i32>,
    pub lifetime: Option<f64>,

    #[serde(skip_deserializing)]
    pub p_nom_opt: Option<f64>,
    #[serde(skip_deserializing)]
    pub p: Vec<f64>,
}

impl Default for Generator {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus: String::new(),
            carrier: String::new(),
            p_nom: 0.0,
            p_nom_extendable: false,
            p_nom_min: 0.0,
            p_nom_max: None,
            p_min_pu: Series::Static(0.0),
            p_max_pu: Series::Static(1.0),
            marginal_cost: 0.0,
            capital_cost: 0.0,
            build_year: None,
            lifetime: None,
            p_nom_opt: None,
            p: Vec::new(),
        }
    }
}

impl Generator {
    pub fn new(name: impl Into<String>, bus: impl Into<String>, carrier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bus: bus.into(),
            carrier: carrier.into(),
            ..Default::default()
        }
    }

    pub fn with_p_nom(mut self, p_nom: f64) -> Self {
        self.p_nom = p_nom;
        self
    }

    /// Make capacity a decision variable in `[min, max]`.
    pub fn extendable(mut self, min: f64, max: Option<f64>) -> Self {
        self.p_nom_extendable = true;
        self.p_nom_min = min;
        self.p_nom_max = max;
        self
    }

    pub fn with_availability(mut self, p_min_pu: impl Into<Series>, p_max_pu: impl Into<Series>) -> Self {
        self.p_min_pu = p_min_pu.into();
        self.p_max_pu = p_max_pu.into();
        self
    }

    pub fn with_costs(mut self, marginal_cost: f64, capital_cost: f64) -> Self {
        self.marginal_cost = marginal_cost;
        self.capital_cost = capital_cost;
        self
    }

    pub fn with_lifecycle(mut self, build_year: i32, lifetime: f64) -> Self {
        self.build_year = Some(build_year);
        self.lifetime = Some(lifetime);
        self
    }
}

impl Asset for Generator {
    fn kind(&self) -> EntityKind {
        EntityKind::Generator
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn carrier(&self) -> &str {
        &self.carrier
    }
    fn lifecycle(&self) -> Lifecycle {
        Lifecycle {
            build_year: self.build_year,
            lifetime: self.lifetime,
        }
    }
    fn capacity(&self) -> NominalCapacity {
        NominalCapacity {
            nom: self.p_nom,
            extendable: self.p_nom_extendable,
            nom_min: self.p_nom_min,
            nom_max: self.p_nom_max,
            capital_cost: self.capital_cost,
        }
    }
    fn buses(&self) -> Vec<&str> {
        vec![self.bus.as_str()]
    }
}

/// Power-rated storage with an energy capacity of `max_hours × p_nom`.
///
/// Positive `p` is discharge into the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageUnit {
    pub name: String,
    pub bus: String,
    pub carrier: String,
    pub p_nom: f64,
    pub p_nom_extendable: bool,
    pub p_nom_min: f64,
    pub p_nom_max: Option<f64>,
    pub p_min_pu: Series,
    pub p_max_pu: Series,
    pub max_hours: f64,
    pub efficiency_store: f64,
    pub efficiency_dispatch: f64,
    pub standing_loss: f64,
    pub inflow: Series,
    pub state_of_charge_initial: f64,
    pub cyclic_state_of_charge: bool,
    pub cyclic_state_of_charge_per_period: bool,
    pub marginal_cost: f64,
    pub capital_cost: f64,
    pub build_year: Option<i32>,
    pub lifetime: Option<f64>,

    #[serde(skip_deserializing)]
    pub p_nom_opt: Option<f64>,
    #[serde(skip_deserializing)]
    pub p: Vec<f64>,
    #[serde(skip_deserializing)]
    pub p_dispatch: Vec<f64>,
    #[serde(skip_deserializing)]
    pub p_store: Vec<f64>,
    #[serde(skip_deserializing)]
    pub state_of_charge: Vec<f64>,
}

impl Default for StorageUnit {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus: String::new(),
            carrier: String::new(),
            p_nom: 0.0,
            p_nom_extendable: false,
            p_nom_min: 0.0,
            p_nom_max: None,
            p_min_pu: Series::Static(-1.0),
            p_max_pu: Series::Static(1.0),
            max_hours: 1.0,
            efficiency_store: 1.0,
            efficiency_dispatch: 1.0,
            standing_loss: 0.0,
            inflow: Series::Static(0.0),
            state_of_charge_initial: 0.0,
            cyclic_state_of_charge: false,
            cyclic_state_of_charge_per_period: true,
            marginal_cost: 0.0,
            capital_cost: 0.0,
            build_year: None,
            lifetime: None,
            p_nom_opt: None,
            p: Vec::new(),
            p_dispatch: Vec::new(),
            p_store: Vec::new(),
            state_of_charge: Vec::new(),
        }
    }
}

impl StorageUnit {
    pub fn new(name: impl Into<String>, bus: impl Into<String>, carrier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bus: bus.into(),
            carrier: carrier.into(),
            ..Default::default()
        }
    }

    pub fn with_p_nom(mut self, p_nom: f64) -> Self {
        self.p_nom = p_nom;
        self
    }

    pub fn extendable(mut self, min: f64, max: Option<f64>) -> Self {
        self.p_nom_extendable = true;
        self.p_nom_min = min;
        self.p_nom_max = max;
        self
    }

    pub fn with_max_hours(mut self, max_hours: f64) -> Self {
        self.max_hours = max_hours;
        self
    }

    pub fn with_efficiencies(mut self, store: f64, dispatch: f64) -> Self {
        self.efficiency_store = store;
        self.efficiency_dispatch = dispatch;
        self
    }

    pub fn cyclic(mut self) -> Self {
        self.cyclic_state_of_charge = true;
        self
    }

    pub fn with_costs(mut self, marginal_cost: f64, capital_cost: f64) -> Self {
        self.marginal_cost = marginal_cost;
        self.capital_cost = capital_cost;
        self
    }

    pub fn with_lifecycle(mut self, build_year: i32, lifetime: f64) -> Self {
        self.build_year = Some(build_year);
        self.lifetime = Some(lifetime);
        self
    }
}

impl Asset for StorageUnit {
    fn kind(&self) -> EntityKind {
        EntityKind::StorageUnit
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn carrier(&self) -> &str {
        &self.carrier
    }
    fn lifecycle(&self) -> Lifecycle {
        Lifecycle {
            build_year: self.build_year,
            lifetime: self.lifetime,
        }
    }
    fn capacity(&self) -> NominalCapacity {
        NominalCapacity {
            nom: self.p_nom,
            extendable: self.p_nom_extendable,
            nom_min: self.p_nom_min,
            nom_max: self.p_nom_max,
            capital_cost: self.capital_cost,
        }
    }
    fn buses(&self) -> Vec<&str> {
        vec![self.bus.as_str()]
    }
}

/// Energy-rated store. `p` is positive when the store discharges into its bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Store {
    pub name: String,
    pub bus: String,
    pub carrier: String,
    pub e_nom: f64,
    pub e_nom_extendable: bool,
    pub e_nom_min: f64,
    pub e_nom_max: Option<f64>,
    /// Lower bound on stored energy as a fraction of `e_nom`, may be negative
    pub e_min_pu: Series,
    pub e_max_pu: Series,
    pub e_initial: f64,
    pub e_cyclic: bool,
    pub e_cyclic_per_period: bool,
    /// Fraction of stored energy lost per hour
    pub standing_loss: f64,
    pub marginal_cost: f64,
    pub capital_cost: f64,
    pub build_year: Option<i32>,
    pub lifetime: Option<f64>,

    #[serde(skip_deserializing)]
    pub e_nom_opt: Option<f64>,
    #[serde(skip_deserializing)]
    pub e: Vec<f64>,
    #[serde(skip_deserializing)]
    pub p: Vec<f64>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus: String::new(),
            carrier: String::new(),
            e_nom: 0.0,
            e_nom_extendable: false,
            e_nom_min: 0.0,
            e_nom_max: None,
            e_min_pu: Series::Static(0.0),
            e_max_pu: Series::Static(1.0),
            e_initial: 0.0,
            e_cyclic: false,
            e_cyclic_per_period: true,
            standing_loss: 0.0,
            marginal_cost: 0.0,
            capital_cost: 0.0,
            build_year: None,
            lifetime: None,
            e_nom_opt: None,
            e: Vec::new(),
            p: Vec::new(),
        }
    }
}

impl Store {
    pub fn new(name: impl Into<String>, bus: impl Into<String>, carrier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bus: bus.into(),
            carrier: carrier.into(),
            ..Default::default()
        }
    }

    pub fn with_e_nom(mut self, e_nom: f64) -> Self {
        self.e_nom = e_nom;
        self
    }

    pub fn extendable(mut self, min: f64, max: Option<f64>) -> Self {
        self.e_nom_extendable = true;
        self.e_nom_min = min;
        self.e_nom_max = max;
        self
    }

    pub fn with_energy_bounds(mut self, e_min_pu: impl Into<Series>, e_max_pu: impl Into<Series>) -> Self {
        self.e_min_pu = e_min_pu.into();
        self.e_max_pu = e_max_pu.into();
        self
    }

    pub fn with_initial(mut self, e_initial: f64) -> Self {
        self.e_initial = e_initial;
        self
    }

    pub fn cyclic(mut self) -> Self {
        self.e_cyclic = true;
        self
    }

    pub fn with_costs(mut self, marginal_cost: f64, capital_cost: f64) -> Self {
        self.marginal_cost = marginal_cost;
        self.capital_cost = capital_cost;
        self
    }

    pub fn with_lifecycle(mut self, build_year: i32, lifetime: f64) -> Self {
        self.build_year = Some(build_year);
        self.lifetime = Some(lifetime);
        self
    }
}

impl Asset for Store {
    fn kind(&self) -> EntityKind {
        EntityKind::Store
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn carrier(&self) -> &str {
        &self.carrier
    }
    fn lifecycle(&self) -> Lifecycle {
        Lifecycle {
            build_year: self.build_year,
            lifetime: self.lifetime,
        }
    }
    fn capacity(&self) -> NominalCapacity {
        NominalCapacity {
            nom: self.e_nom,
            extendable: self.e_nom_extendable,
            nom_min: self.e_nom_min,
            nom_max: self.e_nom_max,
            capital_cost: self.capital_cost,
        }
    }
    fn buses(&self) -> Vec<&str> {
        vec![self.bus.as_str()]
    }
}

/// One output leg of a [`Link`]: `p_k(t) = efficiency(t) × p0(t)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkOutput {
    pub bus: String,
    #[serde(default = "unit_efficiency")]
    pub efficiency: Series,
}

fn unit_efficiency() -> Series {
    Series::Static(1.0)
}

impl LinkOutput {
    pub fn new(bus: impl Into<String>, efficiency: impl Into<Series>) -> Self {
        Self {
            bus: bus.into(),
            efficiency: efficiency.into(),
        }
    }
}

/// Converter with one input bus and `K` output buses.
///
/// `p0` is withdrawn from `bus0`; output `k` (1-based, `outputs[k - 1]`)
/// injects `efficiency_k × p0` into its bus. A negative efficiency withdraws
/// instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub name: String,
    pub bus0: String,
    pub outputs: Vec<LinkOutput>,
    pub carrier: String,
    pub p_nom: f64,
    pub p_nom_extendable: bool,
    pub p_nom_min: f64,
    pub p_nom_max: Option<f64>,
    pub p_min_pu: Series,
    pub p_max_pu: Series,
    pub marginal_cost: f64,
    pub capital_cost: f64,
    pub build_year: Option<i32>,
    pub lifetime: Option<f64>,

    #[serde(skip_deserializing)]
    pub p_nom_opt: Option<f64>,
    #[serde(skip_deserializing)]
    pub p0: Vec<f64>,
    /// Realized output flows, `p_out[k - 1][t]`
    #[serde(skip_deserializing)]
    pub p_out: Vec<Vec<f64>>,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus0: String::new(),
            outputs: Vec::new(),
            carrier: String::new(),
            p_nom: 0.0,
            p_nom_extendable: false,
            p_nom_min: 0.0,
            p_nom_max: None,
            p_min_pu: Series::Static(0.0),
            p_max_pu: Series::Static(1.0),
            marginal_cost: 0.0,
            capital_cost: 0.0,
            build_year: None,
            lifetime: None,
            p_nom_opt: None,
            p0: Vec::new(),
            p_out: Vec::new(),
        }
    }
}

impl Link {
    pub fn new(name: impl Into<String>, bus0: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bus0: bus0.into(),
            ..Default::default()
        }
    }

    /// Append the next output leg.
    pub fn with_output(mut self, bus: impl Into<String>, efficiency: impl Into<Series>) -> Self {
        self.outputs.push(LinkOutput::new(bus, efficiency));
        self
    }

    pub fn with_carrier(mut self, carrier: impl Into<String>) -> Self {
        self.carrier = carrier.into();
        self
    }

    pub fn with_p_nom(mut self, p_nom: f64) -> Self {
        self.p_nom = p_nom;
        self
    }

    pub fn extendable(mut self, min: f64, max: Option<f64>) -> Self {
        self.p_nom_extendable = true;
        self.p_nom_min = min;
        self.p_nom_max = max;
        self
    }

    pub fn with_availability(mut self, p_min_pu: impl Into<Series>, p_max_pu: impl Into<Series>) -> Self {
        self.p_min_pu = p_min_pu.into();
        self.p_max_pu = p_max_pu.into();
        self
    }

    pub fn with_costs(mut self, marginal_cost: f64, capital_cost: f64) -> Self {
        self.marginal_cost = marginal_cost;
        self.capital_cost = capital_cost;
        self
    }

    pub fn with_lifecycle(mut self, build_year: i32, lifetime: f64) -> Self {
        self.build_year = Some(build_year);
        self.lifetime = Some(lifetime);
        self
    }

    /// Number of output legs.
    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }
}

impl Asset for Link {
    fn kind(&self) -> EntityKind {
        EntityKind::Link
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn carrier(&self) -> &str {
        &self.carrier
    }
    fn lifecycle(&self) -> Lifecycle {
        Lifecycle {
            build_year: self.build_year,
            lifetime: self.lifetime,
        }
    }
    fn capacity(&self) -> NominalCapacity {
        NominalCapacity {
            nom: self.p_nom,
            extendable: self.p_nom_extendable,
            nom_min: self.p_nom_min,
            nom_max: self.p_nom_max,
            capital_cost: self.capital_cost,
        }
    }
    fn buses(&self) -> Vec<&str> {
        std::iter::once(self.bus0.as_str())
            .chain(self.outputs.iter().map(|o| o.bus.as_str()))
            .collect()
    }
}

/// Lossless transport line. Flow `p0` is positive from `bus0` to `bus1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Line {
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    pub carrier: String,
    pub s_nom: f64,
    pub s_nom_extendable: bool,
    pub s_nom_min: f64,
    pub s_nom_max: Option<f64>,
    pub s_max_pu: Series,
    pub capital_cost: f64,
    /// Added to `capital_cost` once per km of `length`
    pub capital_cost_per_km: f64,
    /// Length in km; derived from bus coordinates when absent
    pub length: Option<f64>,
    pub build_year: Option<i32>,
    pub lifetime: Option<f64>,

    #[serde(skip_deserializing)]
    pub s_nom_opt: Option<f64>,
    #[serde(skip_deserializing)]
    pub p0: Vec<f64>,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus0: String::new(),
            bus1: String::new(),
            carrier: String::new(),
            s_nom: 0.0,
            s_nom_extendable: false,
            s_nom_min: 0.0,
            s_nom_max: None,
            s_max_pu: Series::Static(1.0),
            capital_cost: 0.0,
            capital_cost_per_km: 0.0,
            length: None,
            build_year: None,
            lifetime: None,
            s_nom_opt: None,
            p0: Vec::new(),
        }
    }
}

impl Line {
    pub fn new(name: impl Into<String>, bus0: impl Into<String>, bus1: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bus0: bus0.into(),
            bus1: bus1.into(),
            ..Default::default()
        }
    }

    pub fn with_s_nom(mut self, s_nom: f64) -> Self {
        self.s_nom = s_nom;
        self
    }

    pub fn extendable(mut self, min: f64, max: Option<f64>) -> Self {
        self.s_nom_extendable = true;
        self.s_nom_min = min;
        self.s_nom_max = max;
        self
    }

    pub fn with_capital_cost(mut self, capital_cost: f64) -> Self {
        self.capital_cost = capital_cost;
        self
    }

    pub fn with_length(mut self, km: f64) -> Self {
        self.length = Some(km);
        self
    }

    pub fn with_capital_cost_per_km(mut self, cost: f64) -> Self {
        self.capital_cost_per_km = cost;
        self
    }

    /// Capital cost per unit of capacity, including the length-scaled part.
    pub fn total_capital_cost(&self) -> f64 {
        self.capital_cost + self.capital_cost_per_km * self.length.unwrap_or(0.0)
    }
}

impl Asset for Line {
    fn kind(&self) -> EntityKind {
        EntityKind::Line
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn carrier(&self) -> &str {
        &self.carrier
    }
    fn lifecycle(&self) -> Lifecycle {
        Lifecycle {
            build_year: self.build_year,
            lifetime: self.lifetime,
        }
    }
    fn capacity(&self) -> NominalCapacity {
        NominalCapacity {
            nom: self.s_nom,
            extendable: self.s_nom_extendable,
            nom_min: self.s_nom_min,
            nom_max: self.s_nom_max,
            capital_cost: self.total_capital_cost(),
        }
    }
    fn buses(&self) -> Vec<&str> {
        vec![self.bus0.as_str(), self.bus1.as_str()]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    #[default]
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "==", alias = "=")]
    Equal,
}

impl Relation {
    /// True when `lhs R rhs` holds within `tol`.
    pub fn holds(&self, lhs: f64, rhs: f64, tol: f64) -> bool {
        match self {
            Relation::LessEqual => lhs <= rhs + tol,
            Relation::GreaterEqual => lhs >= rhs - tol,
            Relation::Equal => (lhs - rhs).abs() <= tol,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::LessEqual => "<=",
            Relation::GreaterEqual => ">=",
            Relation::Equal => "==",
        })
    }
}

/// Horizon-wide limit on `Σ carrier[attribute] × dispatch`, weighted by
/// snapshot hours and period years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConstraint {
    pub name: String,
    pub carrier_attribute: String,
    pub sense: Relation,
    pub constant: f64,

    /// Realized left-hand side
    #[serde(skip_deserializing)]
    pub value_opt: Option<f64>,
}

impl Default for GlobalConstraint {
    fn default() -> Self {
        Self {
            name: String::new(),
            carrier_attribute: CO2_EMISSIONS.to_string(),
            sense: Relation::LessEqual,
            constant: 0.0,
            value_opt: None,
        }
    }
}

impl GlobalConstraint {
    pub fn new(
        name: impl Into<String>,
        carrier_attribute: impl Into<String>,
        sense: Relation,
        constant: f64,
    ) -> Self {
        Self {
            name: name.into(),
            carrier_attribute: carrier_attribute.into(),
            sense,
            constant,
            value_opt: None,
        }
    }

    /// `Σ co2_emissions × dispatch <= cap`
    pub fn co2_limit(name: impl Into<String>, cap: f64) -> Self {
        Self::new(name, CO2_EMISSIONS, Relation::LessEqual, cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_range() {
        let fixed = Generator::new("g", "b", "gas").with_p_nom(100.0);
        assert_eq!(fixed.capacity().range(), (100.0, Some(100.0)));

        let ext = Generator::new("g", "b", "gas").extendable(10.0, Some(50.0));
        assert_eq!(ext.capacity().range(), (10.0, Some(50.0)));
        assert!(!ext.capacity().is_conflicting());

        let bad = Generator::new("g", "b", "gas").extendable(60.0, Some(50.0));
        assert!(bad.capacity().is_conflicting());
    }

    #[test]
    fn test_link_buses_and_outputs() {
        let link = Link::new("dac", "elec")
            .with_output("co2 stored", 1.0)
            .with_output("co2 atmosphere", -1.0);
        assert_eq!(link.num_outputs(), 2);
        assert_eq!(link.buses(), vec!["elec", "co2 stored", "co2 atmosphere"]);
        assert_eq!(link.label(), "link 'dac'");
    }

    #[test]
    fn test_generator_deserialize_defaults() {
        let gen: Generator = serde_json::from_str(
            r#"{"name": "wind", "bus": "north", "carrier": "wind", "p_max_pu": [0.2, 0.9]}"#,
        )
        .unwrap();
        assert_eq!(gen.p_min_pu, Series::Static(0.0));
        assert_eq!(gen.p_max_pu, Series::Varying(vec![0.2, 0.9]));
        assert!(gen.p_nom_opt.is_none());
        assert!(gen.lifetime.is_none());
    }

    #[test]
    fn test_link_output_default_efficiency() {
        let out: LinkOutput = serde_json::from_str(r#"{"bus": "heat"}"#).unwrap();
        assert_eq!(out.efficiency, Series::Static(1.0));
    }

    #[test]
    fn test_relation_serde_and_holds() {
        let r: Relation = serde_json::from_str("\"=\"").unwrap();
        assert_eq!(r, Relation::Equal);
        let r: Relation = serde_json::from_str("\">=\"").unwrap();
        assert_eq!(r, Relation::GreaterEqual);

        assert!(Relation::LessEqual.holds(-50.0, -50.0, 1e-6));
        assert!(!Relation::LessEqual.holds(-49.0, -50.0, 1e-6));
        assert!(Relation::GreaterEqual.holds(10.0, 5.0, 0.0));
    }

    #[test]
    fn test_bus_bounded_carriers() {
        let bus = Bus::new("x")
            .with_nom_max("solar", 2200.0)
            .with_nom_min("solar", 100.0)
            .with_nom_min("wind", 10.0);
        assert_eq!(bus.bounded_carriers(), vec!["solar", "wind"]);
    }

    #[test]
    fn test_carrier_attribute_default() {
        let coal = Carrier::new("coal").with_attribute(CO2_EMISSIONS, 0.34);
        assert_eq!(coal.attribute(CO2_EMISSIONS), 0.34);
        assert_eq!(coal.attribute("water"), 0.0);
    }

    #[test]
    fn test_line_capital_cost_scales_with_length() {
        let line = Line::new("ab", "a", "b").with_capital_cost(10.0).with_capital_cost_per_km(2.0);
        assert_eq!(line.total_capital_cost(), 10.0);
        let line = line.with_length(150.0);
        assert_eq!(line.total_capital_cost(), 310.0);
        assert_eq!(line.capacity().capital_cost, 310.0);
    }

    #[test]
    fn test_bus_coordinates_from_json() {
        let bus: Bus = serde_json::from_str(r#"{"name": "berlin", "x": 13.4, "y": 52.5}"#).unwrap();
        assert_eq!(bus.coordinates(), Some((13.4, 52.5)));
        let bus: Bus = serde_json::from_str(r#"{"name": "half", "x": 13.4}"#).unwrap();
        assert_eq!(bus.coordinates(), None);
    }
}
