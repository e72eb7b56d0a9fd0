use super::transfer::load_config;
use crate::output::Output;
use clap::{ArgAction, Args};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use filmsync_config::PathManager;
use filmsync_core::{HistoryLedger, RunKey};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct ClearArgs {
    /// Clear transfer history
    #[arg(long, action = ArgAction::SetTrue)]
    pub history: bool,

    /// Clear the history of every export, not just one
    #[arg(long, action = ArgAction::SetTrue, requires = "history")]
    pub all: bool,

    /// Export whose history should be cleared
    #[arg(short = 'f', long = "file", value_name = "ZIPFILE", conflicts_with = "all")]
    pub file: Option<PathBuf>,

    /// Cookie file used for that export's transfers
    #[arg(long, value_name = "PATH")]
    pub cookie: Option<PathBuf>,
}

pub async fn run_clear(args: ClearArgs, output: &Output) -> Result<()> {
    if !args.history {
        output.warn("No clear option specified. Use --history");
        output.println("\nExample: letterboxd2imdb clear --history -f letterboxd-export.zip");
        return Ok(());
    }

    let paths = PathManager::default();
    let config = load_config(&paths)?;
    let ledger = HistoryLedger::new(config.history.dir.clone().unwrap_or_else(|| paths.history_dir()));

    if args.all {
        let removed = ledger
            .clear_all()
            .map_err(|e| eyre!("Failed to clear history in {}: {}", ledger.dir().display(), e))?;
        if removed == 0 {
            output.info("No transfer history found to clear");
        } else {
            output.success(format!("Cleared {} transfer histories from {}", removed, ledger.dir().display()));
        }
        return Ok(());
    }

    let Some(file) = args.file else {
        output.warn("Specify the export with -f, or use --all to clear every history");
        return Ok(());
    };
    let cookie = args.cookie.unwrap_or(config.transfer.cookie_file);

    // Same key the transfer computed, so the same inputs are required
    let key = RunKey::from_files(&[cookie.as_path(), file.as_path()])
        .map_err(|e| eyre!("Failed to identify the export's history: {}", e))?;

    let removed = ledger
        .clear(&key)
        .map_err(|e| eyre!("Failed to clear history: {}", e))?;
    if removed {
        output.success(format!("Cleared transfer history for {}", file.display()));
    } else {
        output.info(format!("No transfer history found for {}", file.display()));
    }
    Ok(())
}
