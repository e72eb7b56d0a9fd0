use filmsync_core::{Outcome, ProgressObserver};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

/// Terminal progress bar over the work items of one transfer
pub struct TransferUi {
    bar: ProgressBar,
}

impl TransferUi {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }
}

impl ProgressObserver for TransferUi {
    fn start(&mut self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_message("Transferring...");
    }

    fn advance(&mut self, outcome: &Outcome) {
        self.bar.inc(1);
        self.bar.set_message(outcome.item().record().display_title());
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Progress bars only make sense when a person is watching both streams
pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
