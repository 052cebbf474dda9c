use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod export;
mod extractor;
mod models;
mod normalize;
mod processor;
mod progress;
mod shell;
mod workflow;

use crate::config::Config;
use crate::extractor::ChromeExtractor;
use crate::workflow::{Collector, ExportOutcome};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    args: config::AppArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape profiles interactively and collect them (default)
    Shell {
        /// Hide the per-scrape progress bar
        #[arg(long)]
        quiet: bool,
    },
    /// Scrape every identifier in a file and export the collection
    Process {
        /// Text file with one profile URL, @handle or handle per line
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the output file (.csv or .json)
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so the shell's own output stays readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::build_config(&cli.args)?;

    match cli.command.unwrap_or(Commands::Shell { quiet: false }) {
        Commands::Shell { quiet } => {
            info!("Starting interactive session");
            run_shell(config, quiet)?;
        }
        Commands::Process { input, output } => {
            info!("Processing identifiers from {} to {}", input.display(), output.display());
            process_file(config, input, output)?;
        }
    }

    Ok(())
}

fn run_shell(config: Config, quiet: bool) -> Result<()> {
    let export_format = config.export_format;
    let collector = Collector::new(ChromeExtractor::new(config), export_format);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut shell = shell::Shell::new(collector, stdin.lock(), stdout.lock(), !quiet);
    shell.run()?;
    Ok(())
}

fn process_file(config: Config, input: PathBuf, output: PathBuf) -> error::Result<()> {
    let input_data = std::fs::read_to_string(&input)?;
    let identifiers = processor::read_identifiers(&input_data);

    info!("Loaded {} identifiers from {}", identifiers.len(), input.display());

    let export_format = config.export_format;
    let mut collector = Collector::new(ChromeExtractor::new(config), export_format);

    let progress_bar = indicatif::ProgressBar::new(identifiers.len() as u64);
    if let Ok(style) = indicatif::ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        progress_bar.set_style(style.progress_chars("##-"));
    }

    let summary = processor::process_identifiers(&mut collector, &identifiers, &progress_bar);

    progress_bar.finish_with_message("Processing complete");

    for (identifier, reason) in &summary.failed {
        eprintln!("Skipped {}: {}", identifier, reason);
    }

    if let ExportOutcome::Written { path, rows, format } = collector.export(Some(&output))? {
        info!("Wrote {} profiles to {} as {:?}", rows, path.display(), format);
        println!(
            "Collected {} of {} profiles into {}",
            summary.collected,
            identifiers.len(),
            path.display()
        );
    }

    Ok(())
}
