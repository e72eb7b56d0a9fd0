use super::progress_ui::{is_interactive, TransferUi};
use crate::output::Output;
use clap::{ArgAction, Args};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use filmsync_config::{Config, ImdbCookie, ListSettings, PathManager};
use filmsync_core::{
    BuildSummary, LogProgress, ProgressObserver, RunInputs, TerminalState, TransferEngine,
    TransferOptions, TransferResult,
};
use filmsync_sources::SourceSet;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const BANNER: &str = r"
  _        _   _           _                _   ___   ___ __  __ ___  _
 | |   ___| |_| |_ ___ _ _| |__  _____ ____| | |_  ) |_ _|  \/  |   \| |__
 | |__/ -_)  _|  _/ -_) '_| '_ \/ _ \ \ / _` |  / /   | || |\/| | |) | '_ \
 |____\___|\__|\__\___|_| |_.__/\___/_\_\__,_| /___| |___|_|  |_|___/|_.__/
";

#[derive(Args, Debug, Clone, Default)]
pub struct TransferArgs {
    /// The exported zip file (or extracted directory) from Letterboxd
    #[arg(short = 'f', long = "file", value_name = "ZIPFILE")]
    pub file: PathBuf,

    /// Items processed in parallel (valid: 1 to 20)
    #[arg(short = 'p', long)]
    pub parallel: Option<usize>,

    /// Rating for watched but unrated films. By default they are ignored (valid: 1 to 10)
    #[arg(short = 'r', long)]
    pub rating: Option<u8>,

    /// Also transfer your watchlist
    #[arg(short = 'w', long, action = ArgAction::SetTrue)]
    pub watchlist: bool,

    /// Add watched but unrated films to this IMDb list, creating it if needed
    #[arg(long, value_name = "NAME")]
    pub list: Option<String>,

    /// Description used when the list has to be created
    #[arg(long, value_name = "TEXT")]
    pub list_description: Option<String>,

    /// File holding the IMDb session cookie
    #[arg(long, value_name = "PATH")]
    pub cookie: Option<PathBuf>,

    /// Neither skip nor record already transferred items
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_history: bool,

    /// Write logs to this file (rotated daily) instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Config file values, overridden by whatever was given on the command line
pub fn apply_overrides(config: &mut Config, args: &TransferArgs) {
    let transfer = &mut config.transfer;
    if let Some(parallel) = args.parallel {
        transfer.parallel = parallel;
    }
    if let Some(rating) = args.rating {
        transfer.unrated_rating = Some(rating);
    }
    if args.watchlist {
        transfer.watchlist = true;
    }
    if let Some(cookie) = &args.cookie {
        transfer.cookie_file = cookie.clone();
    }
    if let Some(name) = &args.list {
        transfer.list = Some(ListSettings::new(name.clone()));
    }
    if let (Some(list), Some(description)) = (transfer.list.as_mut(), &args.list_description) {
        list.description = description.clone();
    }
    if args.no_history {
        config.history.enabled = false;
    }
}

pub fn load_config(paths: &PathManager) -> Result<Config> {
    let config_file = paths.config_file();
    Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))
}

pub async fn run_transfer(args: TransferArgs, output: &Output) -> Result<ExitCode> {
    debug!("Transfer command started");

    let paths = PathManager::default();
    let mut config = load_config(&paths)?;
    apply_overrides(&mut config, &args);
    config
        .validate()
        .map_err(|e| eyre!("Invalid settings: {}", e))?;

    let cookie_file = config.transfer.cookie_file.clone();
    let cookie = ImdbCookie::load(&cookie_file).wrap_err_with(|| {
        format!("Failed to read {}, have you created the file?", cookie_file.display())
    })?;

    let sources = SourceSet::letterboxd_to_imdb(&config.http, cookie)
        .map_err(|e| eyre!("Failed to set up HTTP clients: {}", e))?;
    let options = TransferOptions::from_config(&config, &paths)
        .map_err(|e| eyre!("{}", e))?;
    let engine = TransferEngine::new(sources).with_options(options);

    if output.is_human() && !output.is_quiet() {
        println!("{}", BANNER);
    }

    let inputs = RunInputs {
        archive: args.file.clone(),
        cookie_file,
    };
    let prepared = engine
        .prepare(&inputs)
        .await
        .wrap_err_with(|| format!("Failed to load {}", args.file.display()))?;

    print_build_summary(&prepared.build, engine.options(), output);

    let interrupt = CancellationToken::new();
    let ctrl_c = {
        let interrupt = interrupt.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping the transfer");
                interrupt.cancel();
            }
        })
    };

    let mut progress: Box<dyn ProgressObserver> =
        if output.is_human() && !output.is_quiet() && is_interactive() {
            Box::new(TransferUi::new())
        } else {
            Box::new(LogProgress::default())
        };

    let result = engine.execute(prepared, progress.as_mut(), &interrupt).await;
    ctrl_c.abort();

    render_result(&result, output)?;
    Ok(ExitCode::from(result.exit_code()))
}

fn print_build_summary(build: &BuildSummary, options: &TransferOptions, output: &Output) {
    output.println(format!("Letterboxd rated: {}", build.rated));
    let watched_note = if build.watched_ignored > 0 {
        " (ignored, see -r option)"
    } else {
        ""
    };
    output.println(format!("Letterboxd watched: {}{}", build.watched_unrated, watched_note));
    let watchlist_note = if options.watchlist {
        ""
    } else {
        " (ignored, see -w option)"
    };
    output.println(format!("Letterboxd watchlist: {}{}\n", build.watchlist, watchlist_note));

    if build.list_unavailable {
        output.warn("Could not find or create the IMDb list, skipping list items");
    }
    if build.invalid_ratings > 0 {
        output.warn(format!("{} rated films have no usable rating", build.invalid_ratings));
    }
    if build.already_transferred > 0 {
        output.info(format!(
            "Skipping {} items already transferred (use --no-history to redo them)",
            build.already_transferred
        ));
    }
}

fn render_result(result: &TransferResult, output: &Output) -> Result<()> {
    if !output.is_human() {
        let value = serde_json::to_value(result).wrap_err("Failed to serialize transfer result")?;
        output.json(&value);
        return Ok(());
    }

    if result.terminal == TerminalState::AuthenticationFailed {
        output.error("Failed to authenticate with cookie");
        return Ok(());
    }

    output.println("");
    for line in result.report.summary_lines() {
        output.println(line);
    }

    match result.terminal {
        TerminalState::RateLimited => {
            output.warn("IMDb is rate limiting requests. Run the same command again later to continue.")
        }
        TerminalState::Interrupted => {
            output.warn("Transfer interrupted. Completed items were saved and will be skipped next time.")
        }
        _ => {}
    }
    if let Some(error) = &result.history_error {
        output.warn(format!("Transfer history could not be saved: {}", error));
    }
    Ok(())
}
