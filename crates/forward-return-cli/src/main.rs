mod commands;
mod config;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::fiscal::FiscalArgs;
use commands::forward_return::ForwardReturnArgs;
use commands::screening::ScreenArgs;

/// Fiscal-calendar aware 5-year forward return calculations
#[derive(Parser)]
#[command(
    name = "fwdret",
    version,
    about = "Fiscal-calendar aware 5-year forward return calculations",
    long_about = "A CLI for computing the expected 5-year annual return (IRR) of an equity \
                  from forward per-share estimates, dividends and an exit multiple, with \
                  decimal precision. Also resolves fiscal calendars and ranks companies."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (defaults to FWDRET_OUTPUT, then json)
    #[arg(long, global = true)]
    output: Option<OutputFormat>,

    /// Increase log verbosity on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the 5-year forward IRR for one company
    ForwardReturn(ForwardReturnArgs),
    /// Show where a date falls in a company's fiscal calendar
    Fiscal(FiscalArgs),
    /// Rank several companies by forward IRR
    Screen(ScreenArgs),
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

    if let Err(e) = logging::init_tracing(cli.verbose) {
        eprintln!("{}: {}", "warning".yellow().bold(), e);
    }

    let settings = match config::Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::ForwardReturn(args) => {
            commands::forward_return::run_forward_return(args, &settings)
        }
        Commands::Fiscal(args) => commands::fiscal::run_fiscal(args, &settings),
        Commands::Screen(args) => commands::screening::run_screen(args, &settings),
        Commands::Version => {
            println!("fwdret {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    let format = cli
        .output
        .or_else(|| settings.output.clone())
        .unwrap_or(OutputFormat::Json);

    match result {
        Ok(value) => {
            output::format_output(&format, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
