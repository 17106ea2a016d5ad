//! The network: typed entity store plus its time axis and schema.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::components::{
    Asset, Bus, Carrier, GlobalConstraint, Generator, Line, Link, Load, StorageUnit, Store,
};
use crate::diagnostics::Diagnostics;
use crate::error::{HorizonError, HorizonResult};
use crate::geo;
use crate::schema::{EntityKind, SchemaRegistry};
use crate::series::Series;
use crate::temporal::TemporalIndex;
use crate::topology;

/// An energy system: buses, assets, limits and the snapshots they run over.
///
/// The network exclusively owns its entities. Builders borrow it read-only;
/// a successful solve writes results back into the entities in place.
#[derive(Debug, Clone)]
pub struct Network {
    pub name: String,
    schema: SchemaRegistry,
    snapshots: TemporalIndex,
    pub carriers: Vec<Carrier>,
    pub buses: Vec<Bus>,
    pub loads: Vec<Load>,
    pub generators: Vec<Generator>,
    pub storage_units: Vec<StorageUnit>,
    pub stores: Vec<Store>,
    pub links: Vec<Link>,
    pub lines: Vec<Line>,
    pub global_constraints: Vec<GlobalConstraint>,
}

impl Network {
    pub fn new(name: impl Into<String>, snapshots: TemporalIndex) -> Self {
        Self {
            name: name.into(),
            schema: SchemaRegistry::standard(),
            snapshots,
            carriers: Vec::new(),
            buses: Vec::new(),
            loads: Vec::new(),
            generators: Vec::new(),
            storage_units: Vec::new(),
            stores: Vec::new(),
            links: Vec::new(),
            lines: Vec::new(),
            global_constraints: Vec::new(),
        }
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Register link outputs up to index `k` before adding wider links.
    pub fn extend_link_outputs(&mut self, k: usize) {
        self.schema.extend_link_outputs(k);
    }

    pub fn snapshots(&self) -> &TemporalIndex {
        &self.snapshots
    }

    /// Replace the time axis. Series attached to entities must be resized by
    /// the caller; validation reports any mismatch.
    pub fn set_snapshots(&mut self, snapshots: TemporalIndex) {
        self.snapshots = snapshots;
    }

    // =========================================================================
    // Construction
    // =========================================================================

    pub fn add_carrier(&mut self, carrier: Carrier) -> HorizonResult<()> {
        ensure_unique(EntityKind::Carrier, &carrier.name, self.carriers.iter().map(|c| &c.name))?;
        self.carriers.push(carrier);
        Ok(())
    }

    pub fn add_bus(&mut self, bus: Bus) -> HorizonResult<()> {
        ensure_unique(EntityKind::Bus, &bus.name, self.buses.iter().map(|b| &b.name))?;
        self.buses.push(bus);
        Ok(())
    }

    pub fn add_load(&mut self, load: Load) -> HorizonResult<()> {
        ensure_unique(EntityKind::Load, &load.name, self.loads.iter().map(|l| &l.name))?;
        self.loads.push(load);
        Ok(())
    }

    pub fn add_generator(&mut self, generator: Generator) -> HorizonResult<()> {
        ensure_unique(
            EntityKind::Generator,
            &generator.name,
            self.generators.iter().map(|g| &g.name),
        )?;
        self.generators.push(generator);
        Ok(())
    }

    pub fn add_storage_unit(&mut self, unit: StorageUnit) -> HorizonResult<()> {
        ensure_unique(
            EntityKind::StorageUnit,
            &unit.name,
            self.storage_units.iter().map(|s| &s.name),
        )?;
        self.storage_units.push(unit);
        Ok(())
    }

    pub fn add_store(&mut self, store: Store) -> HorizonResult<()> {
        ensure_unique(EntityKind::Store, &store.name, self.stores.iter().map(|s| &s.name))?;
        self.stores.push(store);
        Ok(())
    }

    /// Add a link. Fails when it uses an output index the schema does not
    /// register yet.
    pub fn add_link(&mut self, link: Link) -> HorizonResult<()> {
        ensure_unique(EntityKind::Link, &link.name, self.links.iter().map(|l| &l.name))?;
        if link.num_outputs() > self.schema.link_outputs() {
            return Err(HorizonError::config(format!(
                "link '{}' uses bus{} but the schema registers outputs up to bus{}; \
                 extend the schema first",
                link.name,
                link.num_outputs(),
                self.schema.link_outputs()
            )));
        }
        self.links.push(link);
        Ok(())
    }

    pub fn add_line(&mut self, line: Line) -> HorizonResult<()> {
        ensure_unique(EntityKind::Line, &line.name, self.lines.iter().map(|l| &l.name))?;
        self.lines.push(line);
        Ok(())
    }

    pub fn add_global_constraint(&mut self, constraint: GlobalConstraint) -> HorizonResult<()> {
        ensure_unique(
            EntityKind::GlobalConstraint,
            &constraint.name,
            self.global_constraints.iter().map(|c| &c.name),
        )?;
        self.global_constraints.push(constraint);
        Ok(())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn bus(&self, name: &str) -> Option<&Bus> {
        self.buses.iter().find(|b| b.name == name)
    }

    pub fn carrier(&self, name: &str) -> Option<&Carrier> {
        self.carriers.iter().find(|c| c.name == name)
    }

    pub fn generator(&self, name: &str) -> Option<&Generator> {
        self.generators.iter().find(|g| g.name == name)
    }

    pub fn storage_unit(&self, name: &str) -> Option<&StorageUnit> {
        self.storage_units.iter().find(|s| s.name == name)
    }

    pub fn store(&self, name: &str) -> Option<&Store> {
        self.stores.iter().find(|s| s.name == name)
    }

    pub fn link(&self, name: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.name == name)
    }

    pub fn line(&self, name: &str) -> Option<&Line> {
        self.lines.iter().find(|l| l.name == name)
    }

    pub fn global_constraint(&self, name: &str) -> Option<&GlobalConstraint> {
        self.global_constraints.iter().find(|c| c.name == name)
    }

    /// Bus name -> position in [`Network::buses`].
    pub fn bus_positions(&self) -> HashMap<&str, usize> {
        self.buses
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.as_str(), i))
            .collect()
    }

    /// Declared length of `line`, else the haversine distance between its
    /// buses when both carry coordinates.
    pub fn line_length(&self, line: &Line) -> Option<f64> {
        line.length.or_else(|| {
            let a = self.bus(&line.bus0)?.coordinates()?;
            let b = self.bus(&line.bus1)?.coordinates()?;
            Some(geo::haversine_km(a, b))
        })
    }

    /// Fill in missing line lengths from bus coordinates. Returns how many
    /// lines were updated.
    pub fn derive_line_lengths(&mut self) -> usize {
        let derived: Vec<Option<f64>> = self
            .lines
            .iter()
            .map(|line| match line.length {
                Some(_) => None,
                None => self.line_length(line),
            })
            .collect();

        let mut count = 0;
        for (line, length) in self.lines.iter_mut().zip(derived) {
            if let Some(km) = length {
                line.length = Some(km);
                count += 1;
            }
        }
        if count > 0 {
            debug!(network = %self.name, lines = count, "derived line lengths from coordinates");
        }
        count
    }

    /// Fail when an asset is built after the last declared investment period.
    ///
    /// Such a build year names a period the index does not have. Only
    /// meaningful when assets are gated by period.
    pub fn check_period_domain(&self) -> HorizonResult<()> {
        let Some(last) = self.snapshots.periods().last().map(|p| p.start_year) else {
            return Ok(());
        };
        let late: Vec<String> = self
            .assets()
            .filter_map(|asset| {
                let year = asset.lifecycle().build_year.filter(|&year| year > last)?;
                Some(format!("{} (build year {})", asset.label(), year))
            })
            .collect();
        if late.is_empty() {
            Ok(())
        } else {
            Err(HorizonError::config(format!(
                "build year after the last investment period {}: {}",
                last,
                late.join(", ")
            )))
        }
    }

    /// `carrier[attribute]`, `0.0` for unknown carriers or unset attributes.
    pub fn carrier_attribute(&self, carrier: &str, attribute: &str) -> f64 {
        self.carrier(carrier)
            .map(|c| c.attribute(attribute))
            .unwrap_or(0.0)
    }

    pub fn generators_at_bus<'a>(&'a self, bus: &'a str) -> impl Iterator<Item = &'a Generator> + 'a {
        self.generators.iter().filter(move |g| g.bus == bus)
    }

    pub fn loads_at_bus<'a>(&'a self, bus: &'a str) -> impl Iterator<Item = &'a Load> + 'a {
        self.loads.iter().filter(move |l| l.bus == bus)
    }

    /// Every asset that carries a nominal capacity, in entity-kind order.
    pub fn assets(&self) -> impl Iterator<Item = &dyn Asset> {
        self.generators
            .iter()
            .map(|a| a as &dyn Asset)
            .chain(self.storage_units.iter().map(|a| a as &dyn Asset))
            .chain(self.stores.iter().map(|a| a as &dyn Asset))
            .chain(self.links.iter().map(|a| a as &dyn Asset))
            .chain(self.lines.iter().map(|a| a as &dyn Asset))
    }

    /// Total load across all buses at snapshot `t` (MW).
    pub fn total_load_at(&self, t: usize) -> f64 {
        self.loads.iter().map(|l| l.p_set.at(t)).sum()
    }

    pub fn peak_load(&self) -> f64 {
        (0..self.snapshots.len())
            .map(|t| self.total_load_at(t))
            .fold(0.0, f64::max)
    }

    /// Compute basic statistics about the network
    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats {
            num_buses: self.buses.len(),
            num_carriers: self.carriers.len(),
            num_loads: self.loads.len(),
            num_generators: self.generators.len(),
            num_storage_units: self.storage_units.len(),
            num_stores: self.stores.len(),
            num_links: self.links.len(),
            num_lines: self.lines.len(),
            num_global_constraints: self.global_constraints.len(),
            num_snapshots: self.snapshots.len(),
            num_periods: self.snapshots.num_periods(),
            peak_load_mw: self.peak_load(),
            ..Default::default()
        };

        for gen in &self.generators {
            if gen.p_nom_extendable {
                stats.num_extendable += 1;
            } else {
                stats.fixed_gen_capacity_mw += gen.p_nom;
            }
        }
        stats.num_extendable += self
            .storage_units
            .iter()
            .filter(|s| s.p_nom_extendable)
            .count();
        stats.num_extendable += self.stores.iter().filter(|s| s.e_nom_extendable).count();
        stats.num_extendable += self.links.iter().filter(|l| l.p_nom_extendable).count();
        stats.num_extendable += self.lines.iter().filter(|l| l.s_nom_extendable).count();
        stats.max_link_outputs = self.links.iter().map(Link::num_outputs).max().unwrap_or(0);
        stats
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate the network and append every issue found to `diag`.
    ///
    /// Covers references, duplicates, bounds, series lengths, schema coverage
    /// and topology. Nothing here is fatal by itself; see [`Network::check`].
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        if self.buses.is_empty() {
            diag.add_error("structure", "Network has no buses");
            return;
        }
        if self.snapshots.is_empty() {
            diag.add_warning("temporal", "Network has no snapshots");
        }

        self.validate_duplicates(diag);
        self.validate_buses(diag);
        self.validate_loads(diag);
        self.validate_assets(diag);
        self.validate_links(diag);
        self.validate_storage(diag);
        self.validate_global_constraints(diag);
        topology::validate_into(self, diag);
    }

    /// Validate, log warnings, and fail with a configuration error if any
    /// error-severity issue was found.
    pub fn check(&self) -> HorizonResult<Diagnostics> {
        let mut diag = Diagnostics::new();
        self.validate_into(&mut diag);
        for issue in diag.warnings() {
            warn!(network = %self.name, "{}", issue);
        }
        debug!(network = %self.name, "validation: {}", diag.summary());
        diag.into_result()
    }

    fn validate_duplicates(&self, diag: &mut Diagnostics) {
        let mut check = |kind: EntityKind, names: Vec<&str>| {
            let mut seen = HashSet::new();
            for name in names {
                if !seen.insert(name) {
                    diag.add_error_with_entity(
                        "duplicate",
                        &format!("duplicate {} name", kind),
                        &format!("{} '{}'", kind, name),
                    );
                }
            }
        };
        check(EntityKind::Carrier, self.carriers.iter().map(|c| c.name.as_str()).collect());
        check(EntityKind::Bus, self.buses.iter().map(|b| b.name.as_str()).collect());
        check(EntityKind::Load, self.loads.iter().map(|l| l.name.as_str()).collect());
        check(EntityKind::Generator, self.generators.iter().map(|g| g.name.as_str()).collect());
        check(
            EntityKind::StorageUnit,
            self.storage_units.iter().map(|s| s.name.as_str()).collect(),
        );
        check(EntityKind::Store, self.stores.iter().map(|s| s.name.as_str()).collect());
        check(EntityKind::Link, self.links.iter().map(|l| l.name.as_str()).collect());
        check(EntityKind::Line, self.lines.iter().map(|l| l.name.as_str()).collect());
        check(
            EntityKind::GlobalConstraint,
            self.global_constraints.iter().map(|c| c.name.as_str()).collect(),
        );
    }

    fn validate_buses(&self, diag: &mut Diagnostics) {
        for bus in &self.buses {
            let entity = format!("bus '{}'", bus.name);
            if let Some(carrier) = &bus.carrier {
                self.check_carrier(carrier, &entity, diag);
            }
            match (bus.x, bus.y) {
                (Some(x), Some(y)) if !geo::is_valid_coordinate((x, y)) => {
                    diag.add_error_with_entity(
                        "geo",
                        &format!("coordinates ({}, {}) are outside longitude/latitude range", x, y),
                        &entity,
                    );
                }
                (Some(_), None) | (None, Some(_)) => {
                    diag.add_warning_with_entity("geo", "only one of x and y is set", &entity);
                }
                _ => {}
            }
            for (carrier, min) in &bus.nom_min {
                if !min.is_finite() || *min < 0.0 {
                    diag.add_error_with_entity(
                        "bounds",
                        &format!("nom_min[{}] = {} must be finite and non-negative", carrier, min),
                        &entity,
                    );
                }
                if let Some(max) = bus.nom_max.get(carrier) {
                    if min > max {
                        diag.add_error_with_entity(
                            "bounds",
                            &format!("nom_min[{carrier}] = {min} exceeds nom_max[{carrier}] = {max}"),
                            &entity,
                        );
                    }
                }
            }
            for (carrier, max) in &bus.nom_max {
                if max.is_nan() || *max < 0.0 {
                    diag.add_error_with_entity(
                        "bounds",
                        &format!("nom_max[{}] = {} must be non-negative", carrier, max),
                        &entity,
                    );
                }
            }
        }
    }

    fn validate_loads(&self, diag: &mut Diagnostics) {
        let buses = self.bus_names();
        for load in &self.loads {
            let entity = format!("load '{}'", load.name);
            self.check_bus_ref(&buses, &load.bus, "bus", &entity, diag);
            self.check_series(&load.p_set, "p_set", &entity, diag);
        }
    }

    fn validate_assets(&self, diag: &mut Diagnostics) {
        let buses = self.bus_names();
        for asset in self.assets() {
            let entity = asset.label();
            for (i, bus) in asset.buses().into_iter().enumerate() {
                let field = match (asset.kind(), i) {
                    (EntityKind::Link | EntityKind::Line, i) => format!("bus{}", i),
                    _ => "bus".to_string(),
                };
                self.check_bus_ref(&buses, bus, &field, &entity, diag);
            }
            if !asset.carrier().is_empty() {
                self.check_carrier(asset.carrier(), &entity, diag);
            }

            let cap = asset.capacity();
            if cap.is_conflicting() {
                diag.add_error_with_entity(
                    "bounds",
                    &format!(
                        "nom_min = {} exceeds nom_max = {}",
                        cap.nom_min,
                        cap.nom_max.unwrap_or(f64::INFINITY)
                    ),
                    &entity,
                );
            }
            if !cap.nom.is_finite() || cap.nom < 0.0 || !cap.nom_min.is_finite() || cap.nom_min < 0.0 {
                diag.add_error_with_entity(
                    "bounds",
                    "nominal capacity must be finite and non-negative",
                    &entity,
                );
            }
            if !cap.capital_cost.is_finite() {
                diag.add_error_with_entity("cost", "capital cost must be finite", &entity);
            }

            let lifecycle = asset.lifecycle();
            if let Some(lifetime) = lifecycle.lifetime {
                if lifetime.is_nan() || lifetime <= 0.0 {
                    diag.add_error_with_entity(
                        "lifecycle",
                        &format!("lifetime {} must be positive", lifetime),
                        &entity,
                    );
                }
            }
            if let Some(build_year) = lifecycle.build_year {
                let last = self.snapshots.periods().last().map(|p| p.start_year);
                if last.is_some_and(|last| build_year > last) && self.snapshots.num_periods() > 1 {
                    diag.add_warning_with_entity(
                        "lifecycle",
                        &format!(
                            "build year {} is after the last investment period; \
                             multi-period solves reject it",
                            build_year
                        ),
                        &entity,
                    );
                }
            }
        }

        for gen in &self.generators {
            let entity = gen.label();
            self.check_series(&gen.p_min_pu, "p_min_pu", &entity, diag);
            self.check_series(&gen.p_max_pu, "p_max_pu", &entity, diag);
            self.check_ordered(&gen.p_min_pu, &gen.p_max_pu, "p_min_pu", "p_max_pu", &entity, diag);
            if !gen.marginal_cost.is_finite() {
                diag.add_error_with_entity("cost", "marginal cost must be finite", &entity);
            }
        }
        for line in &self.lines {
            let entity = line.label();
            self.check_series(&line.s_max_pu, "s_max_pu", &entity, diag);
            if line.s_max_pu.min() < 0.0 {
                diag.add_error_with_entity("bounds", "s_max_pu must be non-negative", &entity);
            }
            if line.bus0 == line.bus1 {
                diag.add_warning_with_entity("topology", "line connects a bus to itself", &entity);
            }
            if let Some(length) = line.length {
                if !length.is_finite() || length < 0.0 {
                    diag.add_error_with_entity(
                        "geo",
                        &format!("length {} must be finite and non-negative", length),
                        &entity,
                    );
                }
            }
            if line.capital_cost_per_km != 0.0 && line.length.is_none() {
                let hint = if self.line_length(line).is_some() {
                    "derive lengths from bus coordinates first"
                } else {
                    "no length and no bus coordinates"
                };
                diag.add_warning_with_entity(
                    "geo",
                    &format!("capital_cost_per_km is ignored: {}", hint),
                    &entity,
                );
            }
        }
    }

    fn validate_links(&self, diag: &mut Diagnostics) {
        let registered = self.schema.link_outputs();
        for link in &self.links {
            let entity = link.label();
            if link.outputs.is_empty() {
                diag.add_error_with_entity("structure", "link has no output bus", &entity);
            }
            if link.num_outputs() > registered {
                diag.add_error_with_entity(
                    "schema",
                    &format!(
                        "link uses bus{} but the schema registers outputs up to bus{}",
                        link.num_outputs(),
                        registered
                    ),
                    &entity,
                );
            }
            self.check_series(&link.p_min_pu, "p_min_pu", &entity, diag);
            self.check_series(&link.p_max_pu, "p_max_pu", &entity, diag);
            self.check_ordered(&link.p_min_pu, &link.p_max_pu, "p_min_pu", "p_max_pu", &entity, diag);
            for (k, output) in link.outputs.iter().enumerate() {
                self.check_series(&output.efficiency, &format!("efficiency{}", k + 1), &entity, diag);
            }
            if !link.marginal_cost.is_finite() {
                diag.add_error_with_entity("cost", "marginal cost must be finite", &entity);
            }
        }
    }

    fn validate_storage(&self, diag: &mut Diagnostics) {
        for unit in &self.storage_units {
            let entity = unit.label();
            self.check_series(&unit.p_min_pu, "p_min_pu", &entity, diag);
            self.check_series(&unit.p_max_pu, "p_max_pu", &entity, diag);
            self.check_series(&unit.inflow, "inflow", &entity, diag);
            self.check_ordered(&unit.p_min_pu, &unit.p_max_pu, "p_min_pu", "p_max_pu", &entity, diag);
            if !unit.max_hours.is_finite() || unit.max_hours < 0.0 {
                diag.add_error_with_entity("bounds", "max_hours must be finite and non-negative", &entity);
            }
            for (name, eff) in [
                ("efficiency_store", unit.efficiency_store),
                ("efficiency_dispatch", unit.efficiency_dispatch),
            ] {
                if !eff.is_finite() || eff <= 0.0 {
                    diag.add_error_with_entity(
                        "bounds",
                        &format!("{} = {} must be positive", name, eff),
                        &entity,
                    );
                }
            }
            check_standing_loss(unit.standing_loss, &entity, diag);
            if !unit.marginal_cost.is_finite() {
                diag.add_error_with_entity("cost", "marginal cost must be finite", &entity);
            }
        }

        for store in &self.stores {
            let entity = store.label();
            self.check_series(&store.e_min_pu, "e_min_pu", &entity, diag);
            self.check_series(&store.e_max_pu, "e_max_pu", &entity, diag);
            self.check_ordered(&store.e_min_pu, &store.e_max_pu, "e_min_pu", "e_max_pu", &entity, diag);
            if !store.e_initial.is_finite() {
                diag.add_error_with_entity("bounds", "e_initial must be finite", &entity);
            }
            check_standing_loss(store.standing_loss, &entity, diag);
            if !store.marginal_cost.is_finite() {
                diag.add_error_with_entity("cost", "marginal cost must be finite", &entity);
            }
        }
    }

    fn validate_global_constraints(&self, diag: &mut Diagnostics) {
        for constraint in &self.global_constraints {
            let entity = format!("global_constraint '{}'", constraint.name);
            if !constraint.constant.is_finite() {
                diag.add_error_with_entity("bounds", "constant must be finite", &entity);
            }
            let used = self
                .carriers
                .iter()
                .any(|c| c.attributes.contains_key(&constraint.carrier_attribute));
            if !used {
                diag.add_warning_with_entity(
                    "carrier",
                    &format!(
                        "no carrier defines '{}'; the constraint reduces to 0 {} {}",
                        constraint.carrier_attribute, constraint.sense, constraint.constant
                    ),
                    &entity,
                );
            }
        }
    }

    fn bus_names(&self) -> HashSet<&str> {
        self.buses.iter().map(|b| b.name.as_str()).collect()
    }

    fn check_bus_ref(
        &self,
        buses: &HashSet<&str>,
        bus: &str,
        field: &str,
        entity: &str,
        diag: &mut Diagnostics,
    ) {
        if !buses.contains(bus) {
            diag.add_error_with_entity(
                "reference",
                &format!("{} references unknown bus '{}'", field, bus),
                entity,
            );
        }
    }

    fn check_carrier(&self, carrier: &str, entity: &str, diag: &mut Diagnostics) {
        if !self.carriers.is_empty() && self.carrier(carrier).is_none() {
            diag.add_warning_with_entity(
                "carrier",
                &format!("carrier '{}' is not declared", carrier),
                entity,
            );
        }
    }

    fn check_series(&self, series: &Series, field: &str, entity: &str, diag: &mut Diagnostics) {
        if !series.fits(self.snapshots.len()) {
            diag.add_error_with_entity(
                "series",
                &format!(
                    "{} has {} values but the network has {} snapshots",
                    field,
                    match series {
                        Series::Varying(v) => v.len(),
                        Series::Static(_) => 1,
                    },
                    self.snapshots.len()
                ),
                entity,
            );
        }
        if !series.is_finite() {
            diag.add_error_with_entity("series", &format!("{} contains non-finite values", field), entity);
        }
    }

    fn check_ordered(
        &self,
        lower: &Series,
        upper: &Series,
        lower_name: &str,
        upper_name: &str,
        entity: &str,
        diag: &mut Diagnostics,
    ) {
        let n = self.snapshots.len().max(1);
        if let Some(t) = (0..n).find(|&t| lower.at(t) > upper.at(t)) {
            diag.add_error_with_entity(
                "bounds",
                &format!(
                    "{} = {} exceeds {} = {} at snapshot {}",
                    lower_name,
                    lower.at(t),
                    upper_name,
                    upper.at(t),
                    t
                ),
                entity,
            );
        }
    }
}

fn check_standing_loss(standing_loss: f64, entity: &str, diag: &mut Diagnostics) {
    if !(0.0..=1.0).contains(&standing_loss) {
        diag.add_error_with_entity(
            "bounds",
            &format!("standing_loss = {} must lie in [0, 1]", standing_loss),
            entity,
        );
    }
}

fn ensure_unique<'a>(
    kind: EntityKind,
    name: &str,
    mut existing: impl Iterator<Item = &'a String>,
) -> HorizonResult<()> {
    if name.is_empty() {
        return Err(HorizonError::config(format!("{} name must not be empty", kind)));
    }
    if existing.any(|n| n == name) {
        return Err(HorizonError::config(format!("duplicate {} '{}'", kind, name)));
    }
    Ok(())
}

/// Statistics about a network's size and capacity
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkStats {
    pub num_buses: usize,
    pub num_carriers: usize,
    pub num_loads: usize,
    pub num_generators: usize,
    pub num_storage_units: usize,
    pub num_stores: usize,
    pub num_links: usize,
    pub num_lines: usize,
    pub num_global_constraints: usize,
    pub num_snapshots: usize,
    pub num_periods: usize,
    pub num_extendable: usize,
    pub max_link_outputs: usize,
    pub fixed_gen_capacity_mw: f64,
    pub peak_load_mw: f64,
}

impl std::fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} buses, {} gens ({:.0} MW fixed), {} storage units, {} stores, {} links, {} lines, \
             {} loads (peak {:.0} MW), {} extendable, {} snapshots in {} period{}",
            self.num_buses,
            self.num_generators,
            self.fixed_gen_capacity_mw,
            self.num_storage_units,
            self.num_stores,
            self.num_links,
            self.num_lines,
            self.num_loads,
            self.peak_load_mw,
            self.num_extendable,
            self.num_snapshots,
            self.num_periods,
            if self.num_periods == 1 { "" } else { "s" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Bus, Carrier, Generator, Link, Load, StorageUnit, Store};
    use crate::diagnostics::Severity;

    fn base() -> Network {
        let mut network = Network::new("test", TemporalIndex::uniform(3, 1.0));
        network.add_carrier(Carrier::new("gas").with_attribute("co2_emissions", 0.2)).unwrap();
        network.add_bus(Bus::new("a")).unwrap();
        network.add_bus(Bus::new("b")).unwrap();
        network.add_line(Line::new("ab", "a", "b").with_s_nom(100.0)).unwrap();
        network
            .add_generator(Generator::new("ccgt", "a", "gas").with_p_nom(100.0))
            .unwrap();
        network.add_load(Load::new("demand", "b", 50.0)).unwrap();
        network
    }

    #[test]
    fn test_valid_network_passes() {
        let network = base();
        let diag = network.check().unwrap();
        assert_eq!(diag.error_count(), 0);
    }

    #[test]
    fn test_duplicate_rejected_on_add() {
        let mut network = base();
        let err = network.add_bus(Bus::new("a")).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("duplicate bus 'a'"));
    }

    #[test]
    fn test_dangling_bus_reference() {
        let mut network = base();
        network.add_load(Load::new("ghost", "nowhere", 1.0)).unwrap();
        network
            .add_generator(Generator::new("orphan", "missing", "gas"))
            .unwrap();

        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert_eq!(diag.issues_by_category("reference").count(), 2);
        assert!(network.check().unwrap_err().is_configuration());
    }

    #[test]
    fn test_conflicting_bounds() {
        let mut network = base();
        network
            .add_generator(Generator::new("wind", "a", "gas").extendable(500.0, Some(100.0)))
            .unwrap();
        network.buses[0].nom_min.insert("gas".into(), 10.0);
        network.buses[0].nom_max.insert("gas".into(), 5.0);

        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert_eq!(diag.issues_by_category("bounds").count(), 2);
    }

    #[test]
    fn test_series_length_mismatch() {
        let mut network = base();
        network.loads[0].p_set = Series::varying(vec![1.0, 2.0]);
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert_eq!(diag.issues_by_category("series").count(), 1);
    }

    #[test]
    fn test_link_requires_schema_extension() {
        let mut network = base();
        let link = Link::new("chp", "a").with_output("b", 0.4).with_output("a", 0.5);
        let err = network.add_link(link.clone()).unwrap_err();
        assert!(err.to_string().contains("extend the schema"));

        network.extend_link_outputs(2);
        network.add_link(link).unwrap();
        assert!(network.check().is_ok());
    }

    #[test]
    fn test_schema_checked_for_pushed_links() {
        let mut network = base();
        network.links.push(Link::new("wide", "a").with_output("b", 1.0).with_output("a", 1.0));
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert_eq!(diag.issues_by_category("schema").count(), 1);
    }

    #[test]
    fn test_store_bounds_and_standing_loss() {
        let mut network = base();
        let mut store = Store::new("co2 atmosphere", "a", "co2").with_energy_bounds(-1.0, 1.0);
        store.standing_loss = 1.5;
        network.add_store(store).unwrap();

        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert_eq!(diag.issues_by_category("bounds").count(), 1);
        assert!(diag
            .warnings()
            .any(|i| i.message.contains("carrier 'co2' is not declared")));
    }

    #[test]
    fn test_stats_display() {
        let network = base();
        let stats = network.stats();
        assert_eq!(stats.num_buses, 2);
        assert_eq!(stats.fixed_gen_capacity_mw, 100.0);
        assert_eq!(stats.peak_load_mw, 50.0);
        let text = stats.to_string();
        assert!(text.contains("2 buses"));
        assert!(text.contains("3 snapshots in 1 period"));
    }

    #[test]
    fn test_empty_network_is_error() {
        let network = Network::new("empty", TemporalIndex::uniform(1, 1.0));
        let err = network.check().unwrap_err();
        assert!(err.to_string().contains("no buses"));
    }

    #[test]
    fn test_storage_marginal_costs_must_be_finite() {
        let mut network = base();
        let mut unit = StorageUnit::new("battery", "a", "gas");
        unit.marginal_cost = f64::NAN;
        network.add_storage_unit(unit).unwrap();
        let mut store = Store::new("tank", "b", "gas");
        store.marginal_cost = f64::INFINITY;
        network.add_store(store).unwrap();

        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        let costs: Vec<_> = diag.issues_by_category("cost").collect();
        assert_eq!(costs.len(), 2);
        assert!(network.check().unwrap_err().is_configuration());
    }

    #[test]
    fn test_build_year_after_last_period() {
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
            .add_generator(Generator::new("ok", "a", "gas").with_p_nom(1.0).with_lifecycle(2040, 20.0))
            .unwrap();
        assert!(network.check_period_domain().is_ok());

        network
            .add_generator(Generator::new("future", "a", "gas").with_p_nom(1.0).with_lifecycle(2050, 20.0))
            .unwrap();
        let err = network.check_period_domain().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("generator 'future' (build year 2050)"));
        assert!(!err.to_string().contains("'ok'"));

        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert_eq!(diag.issues_by_category("lifecycle").count(), 1);
    }

    #[test]
    fn test_line_length_from_coordinates() {
        let mut network = Network::new("geo", TemporalIndex::uniform(1, 1.0));
        network.add_bus(Bus::new("berlin").with_coordinates(13.405, 52.52)).unwrap();
        network.add_bus(Bus::new("paris").with_coordinates(2.3522, 48.8566)).unwrap();
        network.add_bus(Bus::new("nowhere")).unwrap();
        network
            .add_line(Line::new("be-pa", "berlin", "paris").with_capital_cost_per_km(1.0))
            .unwrap();
        network.add_line(Line::new("fixed", "berlin", "paris").with_length(900.0)).unwrap();
        network.add_line(Line::new("blind", "berlin", "nowhere")).unwrap();

        let derived = network.line_length(&network.lines[0]).unwrap();
        assert!((derived - 878.0).abs() < 5.0, "{}", derived);
        assert_eq!(network.line_length(&network.lines[1]), Some(900.0));
        assert_eq!(network.line_length(&network.lines[2]), None);

        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(diag.warnings().any(|i| i.message.contains("capital_cost_per_km is ignored")));

        assert_eq!(network.derive_line_lengths(), 1);
        assert_eq!(network.lines[0].length, Some(derived));
        assert_eq!(network.lines[1].length, Some(900.0));
        assert_eq!(network.lines[2].length, None);
        assert!((network.lines[0].capacity().capital_cost - derived).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_coordinates_and_length() {
        let mut network = base();
        network.buses[0] = Bus::new("a").with_coordinates(250.0, 10.0);
        network.lines[0].length = Some(-1.0);

        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        let errors = diag
            .issues_by_category("geo")
            .filter(|i| i.severity == Severity::Error)
            .count();
        assert_eq!(errors, 2);
    }
}
