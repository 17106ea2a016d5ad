//! `horizon schema`

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use horizon_algo::BackendRegistry;
use horizon_cli::cli::OutputFormat;
use horizon_core::{AttributeSpec, EntityKind, SchemaRegistry};
use tabwriter::TabWriter;

fn parse_kind(name: &str) -> Result<EntityKind> {
    EntityKind::ALL
        .iter()
        .copied()
        .find(|k| k.as_str() == name)
        .ok_or_else(|| {
            let known: Vec<&str> = EntityKind::ALL.iter().map(EntityKind::as_str).collect();
            anyhow!("unknown entity kind '{}' (known: {})", name, known.join(", "))
        })
}

fn default_text(spec: &AttributeSpec) -> String {
    use horizon_core::schema::AttributeDefault as D;
    match &spec.default {
        D::None => "-".to_string(),
        D::Scalar(v) => v.to_string(),
        D::Flag(b) => b.to_string(),
        D::Text(s) => format!("\"{}\"", s),
    }
}

fn print_backends(format: OutputFormat) -> Result<()> {
    let registry = BackendRegistry::with_defaults();
    let available = registry.available();
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = registry
                .list()
                .into_iter()
                .map(|id| serde_json::json!({ "id": id, "available": available.contains(&id) }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Plain => {
            for id in registry.list() {
                let state = if available.contains(&id) { "available" } else { "not compiled in" };
                println!("{}\t{}", id, state);
            }
        }
    }
    Ok(())
}

pub fn handle(kind: Option<&str>, link_outputs: usize, format: OutputFormat, backends: bool) -> Result<ExitCode> {
    if backends {
        print_backends(format)?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut registry = SchemaRegistry::standard();
    registry.extend_link_outputs(link_outputs);

    let kinds: Vec<EntityKind> = match kind {
        Some(name) => vec![parse_kind(name)?],
        None => registry.kinds().collect(),
    };

    match format {
        OutputFormat::Json => {
            let selected: serde_json::Map<String, serde_json::Value> = kinds
                .iter()
                .map(|k| {
                    let attrs = serde_json::to_value(registry.attributes(*k))?;
                    Ok((k.as_str().to_string(), attrs))
                })
                .collect::<Result<_, serde_json::Error>>()
                .context("serializing schema")?;
            println!("{}", serde_json::to_string_pretty(&selected)?);
        }
        OutputFormat::Plain => {
            let mut writer = TabWriter::new(io::stdout());
            for k in kinds {
                writeln!(writer, "[{}]", k)?;
                writeln!(writer, "ATTRIBUTE\tDOMAIN\tDEFAULT\tTEMPORALITY")?;
                for spec in registry.attributes(k) {
                    writeln!(
                        writer,
                        "{}\t{:?}\t{}\t{:?}",
                        spec.name,
                        spec.domain,
                        default_text(spec),
                        spec.temporality
                    )?;
                }
                writeln!(writer)?;
            }
            writer.flush()?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("storage_unit").unwrap(), EntityKind::StorageUnit);
        let err = parse_kind("turbine").unwrap_err();
        assert!(err.to_string().contains("known"));
    }
}
