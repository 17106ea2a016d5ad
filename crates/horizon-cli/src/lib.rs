pub mod case;
pub mod cli;

pub use case::{load_network, CaseFile, CaseResults};
pub use cli::{Cli, Commands, OutputFormat};
