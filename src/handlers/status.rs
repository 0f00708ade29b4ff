//! `status` command.

use super::{HandlerError, HandlerResult, open_store};
use crate::config::Config;
use crate::store::StatusCounts;

pub fn handle_status(config: &Config) -> Result<HandlerResult, HandlerError> {
    let store = open_store(config)?;
    let counts = store.counts()?;
    print!("{}", format_counts(&counts));
    Ok(HandlerResult::Success)
}

fn format_counts(counts: &StatusCounts) -> String {
    format!(
        "pending  {:>8}\nok       {:>8}\nerror    {:>8}\ntotal    {:>8}\nfindings {:>8}\n",
        counts.pending,
        counts.ok,
        counts.error,
        counts.total(),
        counts.findings
    )
}
