//! Shared plumbing for the `uidscan` and `uidresp` binaries

pub mod logging;
pub mod settings;

use std::process::ExitCode;

/// Report a command-line parse failure and pick the exit code
///
/// Help and version output exit 0; every real usage error exits 1.
pub fn usage_exit(err: clap::Error) -> ExitCode {
    let _ = err.print();
    if err.use_stderr() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
