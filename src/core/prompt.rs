//! Operator confirmation.

use crate::error::Result;

/// Source of yes/no answers for confirmation gates.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Answers yes to everything. Backs the `--yes` flag.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        log_status!("confirm", "{} [assumed yes]", question);
        Ok(true)
    }
}

/// Interpret a typed answer. Empty input takes the default.
pub fn parse_answer(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
