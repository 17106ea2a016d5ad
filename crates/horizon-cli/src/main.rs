use std::process::ExitCode;

use clap::Parser;
use horizon_cli::cli::{Cli, Commands};
use tracing::error;
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("cannot install log subscriber: {e}");
    }

    let result = match cli.command {
        Commands::Solve {
            case,
            options,
            multi_period,
            time_limit,
            tolerance,
            backend,
            sequential,
            out,
            print_options,
        } => commands::solve::handle(commands::solve::SolveArgs {
            case,
            options,
            multi_period,
            time_limit,
            tolerance,
            backend,
            sequential,
            out,
            print_options,
        }),
        Commands::Validate { case, format } => commands::validate::handle(&case, format),
        Commands::Schema {
            kind,
            link_outputs,
            format,
            backends,
        } => commands::schema::handle(kind.as_deref(), link_outputs, format, backends),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
