//! JSON case files.
//!
//! A case file carries the time axis and every entity list. Entity objects
//! use the field names of the core types; unspecified fields take their
//! defaults.
//!
//! ```json
//! {
//!   "name": "two periods",
//!   "link_outputs": 3,
//!   "discount_rate": 0.05,
//!   "periods": [{ "start_year": 2030, "years": 10 }, { "start_year": 2040, "years": 10 }],
//!   "snapshots": [
//!     { "label": "2030-h0", "period": 2030, "weight": 4380 },
//!     { "label": "2040-h0", "period": 2040, "weight": 4380 }
//!   ],
//!   "buses": [{ "name": "x", "nom_max": { "solar": 2200 } }],
//!   "generators": [{ "name": "pv", "bus": "x", "carrier": "solar", "p_nom_extendable": true }],
//!   "loads": [{ "name": "demand", "bus": "x", "p_set": 500 }]
//! }
//! ```
//!
//! Without `periods` all snapshots belong to a single period; without
//! `snapshots` there is one snapshot of weight 1.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use horizon_core::{
    Bus, Carrier, Generator, GlobalConstraint, Line, Link, Load, Network, StorageUnit, Store,
    TemporalIndex,
};
use serde::{Deserialize, Serialize};

/// Start year of the implicit period of a case without `periods`.
const IMPLICIT_PERIOD: i32 = 0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CasePeriod {
    pub start_year: i32,
    #[serde(default)]
    pub years: Option<f64>,
    #[serde(default)]
    pub objective_weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaseSnapshot {
    pub label: String,
    #[serde(default)]
    pub period: Option<i32>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CaseFile {
    pub name: Option<String>,
    /// Highest link output index used by the case
    pub link_outputs: Option<usize>,
    pub discount_rate: Option<f64>,
    pub periods: Vec<CasePeriod>,
    pub snapshots: Vec<CaseSnapshot>,
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

impl CaseFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening case file: {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing case file: {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("parsing case JSON")
    }

    pub fn temporal_index(&self) -> Result<TemporalIndex> {
        let mut builder = TemporalIndex::builder();
        if self.periods.is_empty() {
            builder = builder.period_with_years(IMPLICIT_PERIOD, 1.0);
        }
        for p in &self.periods {
            builder = match (p.years, p.objective_weight) {
                (Some(years), Some(weight)) => builder.period_weighted(p.start_year, years, weight),
                (Some(years), None) => builder.period_with_years(p.start_year, years),
                (None, Some(weight)) => builder.period_weighted(p.start_year, 1.0, weight),
                (None, None) => builder.period(p.start_year),
            };
        }

        let first = self.periods.first().map_or(IMPLICIT_PERIOD, |p| p.start_year);
        if self.snapshots.is_empty() {
            builder = builder.snapshot("now", first, 1.0);
        }
        for s in &self.snapshots {
            builder = builder.snapshot(s.label.clone(), s.period.unwrap_or(first), s.weight);
        }
        if let Some(rate) = self.discount_rate {
            builder = builder.discount_rate(rate);
        }
        Ok(builder.build()?)
    }

    /// Build the network. The schema is extended before any link is added.
    pub fn into_network(self, fallback_name: &str) -> Result<Network> {
        let index = self.temporal_index().context("building the snapshot index")?;
        let name = self.name.clone().unwrap_or_else(|| fallback_name.to_string());
        let mut network = Network::new(name, index);

        let widest = self.links.iter().map(Link::num_outputs).max().unwrap_or(0);
        network.extend_link_outputs(self.link_outputs.unwrap_or(0).max(widest));

        for carrier in self.carriers {
            network.add_carrier(carrier)?;
        }
        for bus in self.buses {
            network.add_bus(bus)?;
        }
        for load in self.loads {
            network.add_load(load)?;
        }
        for generator in self.generators {
            network.add_generator(generator)?;
        }
        for unit in self.storage_units {
            network.add_storage_unit(unit)?;
        }
        for store in self.stores {
            network.add_store(store)?;
        }
        for link in self.links {
            network.add_link(link)?;
        }
        for line in self.lines {
            network.add_line(line)?;
        }
        network.derive_line_lengths();
        for gc in self.global_constraints {
            network.add_global_constraint(gc)?;
        }
        Ok(network)
    }
}

/// Load a case file into a network named after the file stem.
pub fn load_network(path: &Path) -> Result<Network> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("case")
        .to_string();
    CaseFile::from_path(path)?.into_network(&stem)
}

/// Realized results written by `horizon solve --out`.
#[derive(Debug, Serialize)]
pub struct CaseResults<'a> {
    pub network: &'a str,
    pub outcome: &'a horizon_algo::Outcome,
    pub generators: &'a [Generator],
    pub storage_units: &'a [StorageUnit],
    pub stores: &'a [Store],
    pub links: &'a [Link],
    pub lines: &'a [Line],
    pub global_constraints: &'a [GlobalConstraint],
}

impl<'a> CaseResults<'a> {
    pub fn new(network: &'a Network, outcome: &'a horizon_algo::Outcome) -> Self {
        Self {
            network: &network.name,
            outcome,
            generators: &network.generators,
            storage_units: &network.storage_units,
            stores: &network.stores,
            links: &network.links,
            lines: &network.lines,
            global_constraints: &network.global_constraints,
        }
    }
}
