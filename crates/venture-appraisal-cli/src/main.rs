mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::appraise::{AppraiseArgs, MetricsArgs};

/// 36-month venture projections and investment appraisal
#[derive(Parser)]
#[command(
    name = "vap",
    version,
    about = "36-month venture projections and investment appraisal",
    long_about = "Projects three years of monthly revenue and profit for a \
                  two-product venture and appraises the investment case with \
                  decimal precision: NPV, IRR, ROI, payback and break-even."
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
    /// Full appraisal: cash flows plus every metric and the verdict
    Appraise(AppraiseArgs),
    /// Print the 36-month projection without appraising it
    Projection(AppraiseArgs),
    /// Derive metrics from a previously built projection
    Metrics(MetricsArgs),
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
        Commands::Appraise(args) => commands::appraise::run_appraise(args),
        Commands::Projection(args) => commands::appraise::run_projection(args),
        Commands::Metrics(args) => commands::appraise::run_metrics(args),
        Commands::Version => {
            println!("vap {}", env!("CARGO_PKG_VERSION"));
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
