//! CLI command implementations
//!
//! Commands return the process exit code:
//! 0 success, 1 partial failure, 2 configuration error, 4 connection error,
//! 5 fatal error, 130 interrupted.

pub mod import;
pub mod init;
pub mod purge;
pub mod validate;

/// Exit codes shared by the commands
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const PARTIAL_FAILURE: i32 = 1;
    pub const CONFIGURATION: i32 = 2;
    pub const CONNECTION: i32 = 4;
    pub const FATAL: i32 = 5;
    pub const INTERRUPTED: i32 = 130;
}

/// Ask for a y/N confirmation on stdin
pub(crate) fn confirm(prompt: &str) -> anyhow::Result<bool> {
    use std::io::{self, Write};

    print!("{prompt} [y/N]: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
