//! The inevitable catchall "utils" crate. Generally only add
//! things here that only depend on the standard library and
//! "core" crates.
//!
mod command;
pub use command::*;
mod tracing_util;
pub use tracing_util::*;

/// The name of our binary
pub const NAME: &str = "osbuildbootc";

/// The command line was invalid; the usage message has already been printed.
#[derive(Debug, thiserror::Error)]
#[error("invalid usage")]
pub struct UsageError;

/// The code the process should exit with for `err`.
///
/// A child process that exited unsuccessfully gives its own code;
/// everything else is 1.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    child_exit_code(err).unwrap_or(1)
}

/// The diagnostic to print for `err`, without the `error: ` prefix.
///
/// Returns `None` when there is nothing further to say: a failed child's
/// output is already on our stdout/stderr, and usage errors were printed
/// by the argument parser.
pub fn error_message(err: &anyhow::Error) -> Option<String> {
    if child_exit_code(err).is_some() || err.downcast_ref::<UsageError>().is_some() {
        return None;
    }
    Some(format!("{err:#}"))
}

/// Intended for use in `main`, calls an inner function and
/// handles errors by printing them.
pub fn run_main<F>(f: F)
where
    F: FnOnce() -> anyhow::Result<()>,
{
    use std::io::Write as _;

    use owo_colors::OwoColorize;

    if let Err(e) = f() {
        match error_message(&e) {
            Some(msg) => {
                let mut stderr = anstream::stderr();
                // Don't panic if writing fails.
                let _ = writeln!(stderr, "{}{}", "error: ".red(), msg);
            }
            None => tracing::debug!("{e:#}"),
        }
        std::process::exit(exit_code_for(&e));
    }
}
