//! Entity schema registry.
//!
//! Every entity kind has a closed list of attributes (name, value domain,
//! default, static vs. per-snapshot). Links are the one kind whose attribute
//! list grows: a link with `K` outputs needs `bus1..busK`, `efficiency1..K`
//! and `p1..pK`, and only `bus1` ships built in. Callers extend the registry
//! before adding wider links; validation rejects links the registry does not
//! cover. The registry is consulted once per assembly, never patched while a
//! program is being built.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Number of link outputs registered by [`SchemaRegistry::standard`].
pub const BUILTIN_LINK_OUTPUTS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Bus,
    Carrier,
    Load,
    Generator,
    StorageUnit,
    Store,
    Link,
    Line,
    GlobalConstraint,
}

impl EntityKind {
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Bus,
        EntityKind::Carrier,
        EntityKind::Load,
        EntityKind::Generator,
        EntityKind::StorageUnit,
        EntityKind::Store,
        EntityKind::Link,
        EntityKind::Line,
        EntityKind::GlobalConstraint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Bus => "bus",
            EntityKind::Carrier => "carrier",
            EntityKind::Load => "load",
            EntityKind::Generator => "generator",
            EntityKind::StorageUnit => "storage_unit",
            EntityKind::Store => "store",
            EntityKind::Link => "link",
            EntityKind::Line => "line",
            EntityKind::GlobalConstraint => "global_constraint",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value domain of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueDomain {
    Text,
    BusRef,
    CarrierRef,
    Scalar,
    Year,
    Flag,
    Relation,
}

/// Whether an attribute is an input constant, an input series, or a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Temporality {
    Static,
    StaticOrSeries,
    /// Written back by the solver, one value per snapshot
    OutputSeries,
    /// Written back by the solver, one value per entity
    OutputStatic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeDefault {
    None,
    Scalar(f64),
    Flag(bool),
    Text(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeSpec {
    pub name: String,
    pub domain: ValueDomain,
    pub default: AttributeDefault,
    pub temporality: Temporality,
}

impl AttributeSpec {
    fn new(
        name: impl Into<String>,
        domain: ValueDomain,
        default: AttributeDefault,
        temporality: Temporality,
    ) -> Self {
        Self {
            name: name.into(),
            domain,
            default,
            temporality,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaRegistry {
    kinds: BTreeMap<EntityKind, Vec<AttributeSpec>>,
    link_outputs: usize,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl SchemaRegistry {
    /// Built-in attribute lists with `bus1` as the only link output.
    pub fn standard() -> Self {
        use AttributeDefault as D;
        use Temporality::*;
        use ValueDomain::*;

        let lifecycle = || {
            vec![
                AttributeSpec::new("build_year", Year, D::None, Static),
                AttributeSpec::new("lifetime", Scalar, D::Scalar(f64::INFINITY), Static),
            ]
        };
        let capacity = |prefix: &str| {
            vec![
                AttributeSpec::new(format!("{prefix}_nom"), Scalar, D::Scalar(0.0), Static),
                AttributeSpec::new(format!("{prefix}_nom_extendable"), Flag, D::Flag(false), Static),
                AttributeSpec::new(format!("{prefix}_nom_min"), Scalar, D::Scalar(0.0), Static),
                AttributeSpec::new(
                    format!("{prefix}_nom_max"),
                    Scalar,
                    D::Scalar(f64::INFINITY),
                    Static,
                ),
                AttributeSpec::new(format!("{prefix}_nom_opt"), Scalar, D::Scalar(0.0), OutputStatic),
                AttributeSpec::new("capital_cost", Scalar, D::Scalar(0.0), Static),
            ]
        };
        let named = |extra: Vec<AttributeSpec>| {
            let mut attrs = vec![AttributeSpec::new("name", Text, D::None, Static)];
            attrs.extend(extra);
            attrs
        };

        let mut kinds = BTreeMap::new();
        kinds.insert(
            EntityKind::Bus,
            named(vec![
                AttributeSpec::new("carrier", CarrierRef, D::Text(""), Static),
                AttributeSpec::new("nom_min", Scalar, D::Scalar(0.0), Static),
                AttributeSpec::new("nom_max", Scalar, D::Scalar(f64::INFINITY), Static),
                AttributeSpec::new("x", Scalar, D::None, Static),
                AttributeSpec::new("y", Scalar, D::None, Static),
            ]),
        );
        kinds.insert(
            EntityKind::Carrier,
            named(vec![AttributeSpec::new("co2_emissions", Scalar, D::Scalar(0.0), Static)]),
        );
        kinds.insert(
            EntityKind::Load,
            named(vec![
                AttributeSpec::new("bus", BusRef, D::None, Static),
                AttributeSpec::new("p_set", Scalar, D::Scalar(0.0), StaticOrSeries),
            ]),
        );

        let mut generator = vec![
            AttributeSpec::new("bus", BusRef, D::None, Static),
            AttributeSpec::new("carrier", CarrierRef, D::Text(""), Static),
            AttributeSpec::new("p_min_pu", Scalar, D::Scalar(0.0), StaticOrSeries),
            AttributeSpec::new("p_max_pu", Scalar, D::Scalar(1.0), StaticOrSeries),
            AttributeSpec::new("marginal_cost", Scalar, D::Scalar(0.0), Static),
            AttributeSpec::new("p", Scalar, D::Scalar(0.0), OutputSeries),
        ];
        generator.extend(capacity("p"));
        generator.extend(lifecycle());
        kinds.insert(EntityKind::Generator, named(generator));

        let mut storage_unit = vec![
            AttributeSpec::new("bus", BusRef, D::None, Static),
            AttributeSpec::new("carrier", CarrierRef, D::Text(""), Static),
            AttributeSpec::new("p_min_pu", Scalar, D::Scalar(-1.0), StaticOrSeries),
            AttributeSpec::new("p_max_pu", Scalar, D::Scalar(1.0), StaticOrSeries),
            AttributeSpec::new("max_hours", Scalar, D::Scalar(1.0), Static),
            AttributeSpec::new("efficiency_store", Scalar, D::Scalar(1.0), Static),
            AttributeSpec::new("efficiency_dispatch", Scalar, D::Scalar(1.0), Static),
            AttributeSpec::new("standing_loss", Scalar, D::Scalar(0.0), Static),
            AttributeSpec::new("inflow", Scalar, D::Scalar(0.0), StaticOrSeries),
            AttributeSpec::new("state_of_charge_initial", Scalar, D::Scalar(0.0), Static),
            AttributeSpec::new("cyclic_state_of_charge", Flag, D::Flag(false), Static),
            AttributeSpec::new("cyclic_state_of_charge_per_period", Flag, D::Flag(true), Static),
            AttributeSpec::new("marginal_cost", Scalar, D::Scalar(0.0), Static),
            AttributeSpec::new("p", Scalar, D::Scalar(0.0), OutputSeries),
            AttributeSpec::new("p_dispatch", Scalar, D::Scalar(0.0), OutputSeries),
            AttributeSpec::new("p_store", Scalar, D::Scalar(0.0), OutputSeries),
            AttributeSpec::new("state_of_charge", Scalar, D::Scalar(0.0), OutputSeries),
        ];
        storage_unit.extend(capacity("p"));
        storage_unit.extend(lifecycle());
        kinds.insert(EntityKind::StorageUnit, named(storage_unit));

        let mut store = vec![
            AttributeSpec::new("bus", BusRef, D::None, Static),
            AttributeSpec::new("carrier", CarrierRef, D::Text(""), Static),
            AttributeSpec::new("e_min_pu", Scalar, D::Scalar(0.0), StaticOrSeries),
            AttributeSpec::new("e_max_pu", Scalar, D::Scalar(1.0), StaticOrSeries),
            AttributeSpec::new("e_initial", Scalar, D::Scalar(0.0), Static),
            AttributeSpec::new("e_cyclic", Flag, D::Flag(false), Static),
            AttributeSpec::new("e_cyclic_per_period", Flag, D::Flag(true), Static),
            AttributeSpec::new("standing_loss", Scalar, D::Scalar(0.0), Static),
            AttributeSpec::new("marginal_cost", Scalar, D::Scalar(0.0), Static),
            AttributeSpec::new("p", Scalar, D::Scalar(0.0), OutputSeries),
            AttributeSpec::new("e", Scalar, D::Scalar(0.0), OutputSeries),
        ];
        store.extend(capacity("e"));
        store.extend(lifecycle());
        kinds.insert(EntityKind::Store, named(store));

        let mut link = vec![
            AttributeSpec::new("bus0", BusRef, D::None, Static),
            AttributeSpec::new("carrier", CarrierRef, D::Text(""), Static),
            AttributeSpec::new("p_min_pu", Scalar, D::Scalar(0.0), StaticOrSeries),
            AttributeSpec::new("p_max_pu", Scalar, D::Scalar(1.0), StaticOrSeries),
            AttributeSpec::new("marginal_cost", Scalar, D::Scalar(0.0), Static),
            AttributeSpec::new("p0", Scalar, D::Scalar(0.0), OutputSeries),
        ];
        link.extend(capacity("p"));
        link.extend(lifecycle());
        kinds.insert(EntityKind::Link, named(link));

        let mut line = vec![
            AttributeSpec::new("bus0", BusRef, D::None, Static),
            AttributeSpec::new("bus1", BusRef, D::None, Static),
            AttributeSpec::new("carrier", CarrierRef, D::Text(""), Static),
            AttributeSpec::new("s_max_pu", Scalar, D::Scalar(1.0), StaticOrSeries),
            AttributeSpec::new("length", Scalar, D::None, Static),
            AttributeSpec::new("capital_cost_per_km", Scalar, D::Scalar(0.0), Static),
            AttributeSpec::new("p0", Scalar, D::Scalar(0.0), OutputSeries),
        ];
        line.extend(capacity("s"));
        line.extend(lifecycle());
        kinds.insert(EntityKind::Line, named(line));

        kinds.insert(
            EntityKind::GlobalConstraint,
            named(vec![
                AttributeSpec::new("carrier_attribute", Text, D::Text("co2_emissions"), Static),
                AttributeSpec::new("sense", Relation, D::Text("<="), Static),
                AttributeSpec::new("constant", Scalar, D::Scalar(0.0), Static),
            ]),
        );

        let mut registry = Self {
            kinds,
            link_outputs: 0,
        };
        registry.extend_link_outputs(BUILTIN_LINK_OUTPUTS);
        registry
    }

    /// Register link outputs up to and including index `k`.
    ///
    /// Adds `busN`, `efficiencyN` and `pN` for every missing `N`. Calling with
    /// a `k` already covered is a no-op.
    pub fn extend_link_outputs(&mut self, k: usize) {
        use AttributeDefault as D;

        let attrs = self.kinds.entry(EntityKind::Link).or_default();
        for n in (self.link_outputs + 1)..=k {
            attrs.push(AttributeSpec::new(
                format!("bus{n}"),
                ValueDomain::BusRef,
                D::None,
                Temporality::Static,
            ));
            attrs.push(AttributeSpec::new(
                format!("efficiency{n}"),
                ValueDomain::Scalar,
                D::Scalar(1.0),
                Temporality::StaticOrSeries,
            ));
            attrs.push(AttributeSpec::new(
                format!("p{n}"),
                ValueDomain::Scalar,
                D::Scalar(0.0),
                Temporality::OutputSeries,
            ));
        }
        self.link_outputs = self.link_outputs.max(k);
    }

    /// Highest output index a link may use.
    pub fn link_outputs(&self) -> usize {
        self.link_outputs
    }

    pub fn attributes(&self, kind: EntityKind) -> &[AttributeSpec] {
        self.kinds.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn attribute(&self, kind: EntityKind, name: &str) -> Option<&AttributeSpec> {
        self.attributes(kind).iter().find(|a| a.name == name)
    }

    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.kinds.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_has_one_link_output() {
        let registry = SchemaRegistry::standard();
        assert_eq!(registry.link_outputs(), BUILTIN_LINK_OUTPUTS);
        assert!(registry.attribute(EntityKind::Link, "bus1").is_some());
        assert!(registry.attribute(EntityKind::Link, "bus2").is_none());
        assert_eq!(registry.kinds().count(), EntityKind::ALL.len());
    }

    #[test]
    fn test_extend_link_outputs() {
        let mut registry = SchemaRegistry::standard();
        registry.extend_link_outputs(3);
        assert_eq!(registry.link_outputs(), 3);

        let eff = registry.attribute(EntityKind::Link, "efficiency3").unwrap();
        assert_eq!(eff.default, AttributeDefault::Scalar(1.0));
        assert_eq!(eff.temporality, Temporality::StaticOrSeries);

        let bus = registry.attribute(EntityKind::Link, "bus2").unwrap();
        assert_eq!(bus.domain, ValueDomain::BusRef);

        let p = registry.attribute(EntityKind::Link, "p3").unwrap();
        assert_eq!(p.temporality, Temporality::OutputSeries);
    }

    #[test]
    fn test_extend_is_idempotent() {
        let mut registry = SchemaRegistry::standard();
        registry.extend_link_outputs(2);
        let count = registry.attributes(EntityKind::Link).len();
        registry.extend_link_outputs(2);
        registry.extend_link_outputs(1);
        assert_eq!(registry.attributes(EntityKind::Link).len(), count);
        assert_eq!(registry.link_outputs(), 2);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(EntityKind::StorageUnit.to_string(), "storage_unit");
    }
}
