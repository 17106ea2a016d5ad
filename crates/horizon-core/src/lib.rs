//! # horizon-core: Energy-System Network Model
//!
//! Data model for multi-horizon capacity expansion: a typed entity store
//! (buses, carriers, generators, storage, multi-output links, lines, global
//! limits), a two-level time axis of snapshots grouped into investment
//! periods, and the lifecycle rule deciding which assets exist in which
//! period.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                        Network                          │
//! │  ┌──────────────┐  ┌────────────────┐  ┌─────────────┐  │
//! │  │ SchemaRegistry│ │ TemporalIndex  │  │  entities   │  │
//! │  │ (link busK)  │  │ periods/weights│  │ Vec<_> each │  │
//! │  └──────────────┘  └────────────────┘  └─────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//!            │ validate_into / check
//!            ▼
//!       Diagnostics ──► HorizonError::Configuration
//! ```
//!
//! The problem compiler in `horizon-algo` borrows a checked [`Network`]
//! read-only, and writes results back into it only after a successful solve.
//!
//! ## Quick Start
//!
//! ```
//! use horizon_core::{Bus, Generator, Load, Network, TemporalIndex};
//!
//! let index = TemporalIndex::builder()
//!     .period(2030)
//!     .period(2040)
//!     .snapshots_for(2030, 2, 4380.0)
//!     .snapshots_for(2040, 2, 4380.0)
//!     .discount_rate(0.05)
//!     .build()
//!     .unwrap();
//!
//! let mut network = Network::new("demo", index);
//! network.add_bus(Bus::new("x").with_nom_max("solar", 2200.0)).unwrap();
//! network
//!     .add_generator(Generator::new("pv", "x", "solar").extendable(0.0, None))
//!     .unwrap();
//! network.add_load(Load::new("demand", "x", 500.0)).unwrap();
//!
//! let diag = network.check().unwrap();
//! assert_eq!(diag.error_count(), 0);
//! println!("{}", network.stats());
//! ```
//!
//! ## Modules
//!
//! - [`temporal`] - snapshots, investment periods and their weights
//! - [`lifecycle`] - build-year/lifetime activity per period
//! - [`schema`] - per-kind attribute registry, extensible link outputs
//! - [`components`] - entity kinds and the [`Asset`] trait
//! - [`network`] - the entity store and its validation
//! - [`topology`] - sub-networks over lines and links
//! - [`geo`] - haversine distances for line lengths
//! - [`diagnostics`] / [`error`] - issue collection and error types

pub mod components;
pub mod diagnostics;
pub mod error;
pub mod geo;
pub mod lifecycle;
pub mod network;
pub mod schema;
pub mod series;
pub mod temporal;
pub mod topology;

pub use components::{
    Asset, Bus, Carrier, GlobalConstraint, Generator, Line, Link, LinkOutput, Load,
    NominalCapacity, Relation, StorageUnit, Store, CO2_EMISSIONS,
};
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{HorizonError, HorizonResult};
pub use geo::haversine_km;
pub use lifecycle::{is_active, Lifecycle, LifecycleResolver};
pub use network::{Network, NetworkStats};
pub use schema::{AttributeSpec, EntityKind, SchemaRegistry, Temporality, ValueDomain};
pub use series::Series;
pub use temporal::{InvestmentPeriod, PeriodWeighting, Snapshot, TemporalIndex};
pub use topology::{sub_networks, SubNetwork};
