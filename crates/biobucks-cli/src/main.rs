mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::dcf::DcfArgs;
use commands::stage::StageArgs;

/// Risk-adjusted DCF valuations for clinical-stage biotech assets
#[derive(Parser)]
#[command(
    name = "biobucks",
    version,
    about = "Risk-adjusted DCF valuations for clinical-stage biotech assets",
    long_about = "Projects a stored asset valuation record into a year-by-year, \
                  probability-of-success weighted DCF with decimal precision. \
                  Records are read from a JSON file or piped on stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the risk-adjusted asset DCF on a valuation record
    Dcf(DcfArgs),
    /// Resolve a development stage label and list the phases it models
    Stage(StageArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Dcf(args) => commands::dcf::run_dcf(args),
        Commands::Stage(args) => commands::stage::run_stage(args),
        Commands::Version => {
            println!("biobucks {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
