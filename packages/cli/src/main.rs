#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the hurricane impact analysis.
//!
//! With a subcommand, runs that step from flags. Without one, falls back to
//! an interactive menu. Logging goes through
//! [`hurricane_impact_cli_utils::init_logger`] so log lines and the
//! per-county progress bar share the terminal.

mod interactive;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::run::{AnalyzeInputs, TrendsInputs};

#[derive(Parser)]
#[command(
    name = "hurricane_impact",
    about = "Hurricane impact on mobility and COVID-19 spread"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the per-county test battery and the cross-county comparisons
    Analyze {
        /// County-day mobility and COVID panel CSV
        #[arg(long)]
        panel: PathBuf,
        /// Wide hurricane exposure CSV (one 0/1 column per date)
        #[arg(long)]
        hurricane: PathBuf,
        /// Evacuation order CSV (`CTFIPS`, `ORDER`)
        #[arg(long)]
        evacuation: PathBuf,
        /// County boundary CSV (`GEOID`, `NAME`, `geometry`)
        #[arg(long)]
        counties: PathBuf,
        /// Directory the results CSV and summary JSON are written to
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
        /// Analysis configuration TOML (defaults to the built-in one)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Export the annotated panel and the plot-ready trend series
    Trends {
        /// County-day mobility and COVID panel CSV
        #[arg(long)]
        panel: PathBuf,
        /// Wide hurricane exposure CSV (one 0/1 column per date)
        #[arg(long)]
        hurricane: PathBuf,
        /// Results CSV written by `analyze`
        #[arg(long)]
        results: PathBuf,
        /// Directory the exports are written to
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
        /// Analysis configuration TOML (defaults to the built-in one)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config {
        /// Analysis configuration TOML (defaults to the built-in one)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the study calendar with weekday names and window labels
    Windows {
        /// Analysis configuration TOML (defaults to the built-in one)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = hurricane_impact_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Hurricane Impact Analysis");
        println!();
        return interactive::run(&multi);
    };

    match command {
        Commands::Analyze {
            panel,
            hurricane,
            evacuation,
            counties,
            output_dir,
            config,
        } => run::analyze_command(
            &multi,
            &AnalyzeInputs {
                panel,
                hurricane,
                evacuation,
                counties,
                output_dir,
                config,
            },
        ),
        Commands::Trends {
            panel,
            hurricane,
            results,
            output_dir,
            config,
        } => run::trends_command(&TrendsInputs {
            panel,
            hurricane,
            results,
            output_dir,
            config,
        }),
        Commands::Config { config } => run::config_command(config.as_deref()),
        Commands::Windows { config } => run::windows_command(config.as_deref()),
    }
}
