//! Command handlers for the `notes` CLI.

pub mod ask;
pub mod chat;
pub mod index;
pub mod serve;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use index::IndexCommand;
pub use serve::ServeCommand;

use notes_knowledge::ProgressReporter;
use std::sync::Arc;

/// Progress reporter that prints build events to stderr.
///
/// Stdout stays reserved for command output so `--json` can be piped.
pub(crate) fn stderr_progress(enabled: bool) -> ProgressReporter {
    if !enabled {
        return ProgressReporter::noop();
    }
    ProgressReporter::new(Arc::new(|event| eprintln!("{}", event.format_simple())))
}
