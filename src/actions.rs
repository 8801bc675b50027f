//! GitHub Actions workflow commands.
//!
//! The runner scans a step's stdout for lines of the form
//! `::command::message` and turns them into annotations.

use std::io::{self, Write};

/// Escapes a message so it survives as a single workflow command line.
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn issue_command<W: Write>(out: &mut W, command: &str, message: &str) -> io::Result<()> {
    writeln!(out, "::{}::{}", command, escape_data(message))
}

/// Emits an error annotation; pair with a non-zero exit to fail the step.
pub fn error<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    issue_command(out, "error", message)
}

pub fn warning<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    issue_command(out, "warning", message)
}
