use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::{clear, transfer};
use std::process::ExitCode;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "letterboxd2imdb")]
#[command(about = "Imports your Letterboxd ratings and watchlist into IMDb")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transfer a Letterboxd export to IMDb
    #[command(long_about = "Rate films on IMDb from a Letterboxd data export. Watched but unrated films can get a default rating (-r) or go into an IMDb list (--list), and the watchlist can be transferred too (-w). Items already transferred from the same export and cookie are skipped.")]
    Transfer(transfer::TransferArgs),

    /// Clear saved transfer history
    #[command(long_about = "Forget which items were already transferred. With -f, clears the history of that export (and cookie); with --all, clears every saved history.")]
    Clear(clear::ClearArgs),
}

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Transfer(args) => args.log_file.clone(),
        Commands::Clear(_) => None,
    };
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file).map_err(|e| eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Transfer(args) => transfer::run_transfer(args, &output).await,
        Commands::Clear(args) => clear::run_clear(args, &output).await.map(|_| ExitCode::SUCCESS),
    }
}
