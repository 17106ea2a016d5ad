//! `horizon solve`

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use horizon_algo::{solve, SolveOptions};
use horizon_cli::case::{load_network, CaseResults};
use tracing::info;

/// Exit code for a solve that ran but did not reach optimality.
const NOT_OPTIMAL: u8 = 2;

pub struct SolveArgs {
    pub case: PathBuf,
    pub options: Option<PathBuf>,
    pub multi_period: bool,
    pub time_limit: Option<f64>,
    pub tolerance: Option<f64>,
    pub backend: Option<String>,
    pub sequential: bool,
    pub out: Option<PathBuf>,
    pub print_options: bool,
}

/// File options first, then flag overrides.
fn effective_options(args: &SolveArgs) -> Result<SolveOptions> {
    let mut options = match &args.options {
        Some(path) => SolveOptions::load_from(path)
            .with_context(|| format!("loading options from {}", path.display()))?,
        None => SolveOptions::default(),
    };
    if args.multi_period {
        options.multi_period = true;
    }
    if let Some(limit) = args.time_limit {
        options.solver_time_limit = Some(limit);
    }
    if let Some(tolerance) = args.tolerance {
        options.solver_tolerance = tolerance;
    }
    if let Some(backend) = &args.backend {
        options.backend = backend.clone();
    }
    if args.sequential {
        options.parallel = false;
    }
    options.validate().context("invalid solve options")?;
    Ok(options)
}

pub fn handle(args: SolveArgs) -> Result<ExitCode> {
    let options = effective_options(&args)?;
    if args.print_options {
        let text = toml::to_string_pretty(&options).context("serializing options")?;
        print!("{}", text);
        return Ok(ExitCode::SUCCESS);
    }

    let mut network = load_network(&args.case)?;
    info!("{}", network.stats());

    let outcome = solve(&mut network, &options).context("solving case")?;
    println!("{}", outcome.summary());

    if let Some(out) = &args.out {
        let results = CaseResults::new(&network, &outcome);
        let json = serde_json::to_string_pretty(&results).context("serializing results")?;
        let mut file = File::create(out).with_context(|| format!("creating {}", out.display()))?;
        file.write_all(json.as_bytes()).context("writing results")?;
        println!("Results written to {}", out.display());
    }

    Ok(if outcome.is_optimal() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(NOT_OPTIMAL)
    })
}
