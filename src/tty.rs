//! Terminal I/O utilities for CLI.
//!
//! Provides TTY detection and the interactive confirmation prompt.

use std::io::{self, BufRead, IsTerminal, Write};

use stagehand::prompt::{parse_answer, Confirm};

pub fn is_stdin_tty() -> bool {
    io::stdin().is_terminal()
}

pub fn prompt(message: &str) -> stagehand::Result<String> {
    eprint!("{}", message);
    io::stderr().flush().ok();

    let stdin = io::stdin();
    let mut line = String::new();
    let read = stdin.lock().read_line(&mut line).map_err(|e| {
        stagehand::Error::internal_io(
            format!("Failed to read input: {}", e),
            Some("read stdin".to_string()),
        )
    })?;

    if read == 0 {
        return Err(stagehand::Error::internal_io(
            "stdin closed before an answer was given",
            Some("read stdin".to_string()),
        ));
    }

    Ok(line.trim().to_string())
}

/// Asks on stderr and reads the answer from stdin. Defaults to yes, like the
/// classic `[Y/n]` console prompt.
pub struct TtyConfirm;

impl Confirm for TtyConfirm {
    fn confirm(&mut self, question: &str) -> stagehand::Result<bool> {
        if !is_stdin_tty() {
            return Err(stagehand::Error::validation_invalid_argument(
                "tty",
                format!("Cannot ask '{}' without an interactive terminal", question),
            )
            .with_hint("Re-run with --yes to answer every confirmation with yes"));
        }

        loop {
            let answer = prompt(&format!("{} [Y/n] ", question))?;
            match parse_answer(&answer, true) {
                Some(choice) => return Ok(choice),
                None => eprintln!("I didn't understand you. Please specify '(y)es' or '(n)o'."),
            }
        }
    }
}

/// Print status message to stderr if running in a terminal.
pub fn status(message: &str) {
    if io::stderr().is_terminal() {
        eprintln!("{}", message);
    }
}
