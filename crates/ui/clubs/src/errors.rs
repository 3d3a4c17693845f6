use std::path::Path;
use std::sync::OnceLock;

use color_eyre::Result;
use tracing::error;

use crate::{config, logging::LOG_FILE};

static INIT: OnceLock<()> = OnceLock::new();

/// Install the eyre report hook and a panic hook that restores the terminal
/// before printing. Safe to call more than once.
pub fn init() -> Result<()> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let hooks = color_eyre::config::HookBuilder::default()
        .panic_section(crash_note(&config::get_data_dir()))
        .capture_span_trace_by_default(false)
        .display_location_section(false)
        .display_env_section(false)
        .try_into_hooks()?;

    let (panic_hook, eyre_hook) = hooks;
    eyre_hook.install()?;

    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(r) = crate::tui::restore() {
            error!(target: "clubs::panic", "unable to leave the alternate screen: {:?}", r);
        }

        #[cfg(not(debug_assertions))]
        {
            use human_panic::{handle_dump, metadata, print_msg};
            let metadata = metadata!();
            let file_path = handle_dump(&metadata, panic_info);
            if print_msg(file_path, &metadata).is_err() {
                eprintln!("{}", panic_hook.panic_report(panic_info));
            }
        }
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        let msg = format!("{}", panic_hook.panic_report(panic_info));
        error!(target: "clubs::panic", %location, "clubs client crashed: {}", strip_ansi_escapes::strip_str(msg));

        #[cfg(debug_assertions)]
        {
            better_panic::Settings::auto()
                .most_recent_first(false)
                .lineno_suffix(true)
                .verbosity(better_panic::Verbosity::Full)
                .create_panic_handler()(panic_info);
        }

        std::process::exit(libc::EXIT_FAILURE);
    }));

    let _ = INIT.set(());

    Ok(())
}

/// Text shown under a panic report. Points at the log file and at the saved
/// sign-in, which survive the crash.
fn crash_note(data_dir: &Path) -> String {
    format!(
        "The clubs client crashed. Your sign-in and recent clubs are kept in {store}.\n\
         Details are in {log}. Consider reporting it at {repo}",
        store = data_dir.join("store").display(),
        log = data_dir.join(LOG_FILE.as_str()).display(),
        repo = env!("CARGO_PKG_REPOSITORY"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crash_note_points_at_log_and_store() {
        let note = crash_note(Path::new("/tmp/clubs-data"));
        assert!(note.contains("/tmp/clubs-data/store"));
        assert!(note.contains(&format!("/tmp/clubs-data/{}", LOG_FILE.as_str())));
        assert!(note.starts_with("The clubs client crashed."));
    }
}
