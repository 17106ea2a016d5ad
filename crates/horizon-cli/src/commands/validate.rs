//! `horizon validate`

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use horizon_cli::case::load_network;
use horizon_cli::cli::OutputFormat;
use horizon_core::{sub_networks, Diagnostics};
use serde::Serialize;

#[derive(Serialize)]
struct ValidationReport<'a> {
    network: &'a str,
    snapshots: usize,
    periods: usize,
    sub_networks: usize,
    diagnostics: &'a Diagnostics,
}

pub fn handle(case: &Path, format: OutputFormat) -> Result<ExitCode> {
    let network = load_network(case)?;
    let mut diagnostics = Diagnostics::new();
    network.validate_into(&mut diagnostics);
    let subs = sub_networks(&network);

    match format {
        OutputFormat::Json => {
            let report = ValidationReport {
                network: &network.name,
                snapshots: network.snapshots().len(),
                periods: network.snapshots().num_periods(),
                sub_networks: subs.len(),
                diagnostics: &diagnostics,
            };
            let json = serde_json::to_string_pretty(&report).context("serializing report")?;
            println!("{}", json);
        }
        OutputFormat::Plain => {
            println!("{}", network.stats());
            println!("Sub-networks: {}", subs.len());
            for sub in &subs {
                println!("  #{}: {} bus(es)", sub.id, sub.buses.len());
            }
            print!("{}", diagnostics);
        }
    }

    Ok(if diagnostics.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
