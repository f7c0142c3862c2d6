use fswitch_core::prompt::ConfirmPrompt;
use fswitch_core::Result;
use std::io::{self, BufRead, Write};

/// Reads one line from stdin per confirmation. Renders to stderr so piped
/// stdout stays machine-readable.
pub struct ConsolePrompt;

impl ConfirmPrompt for ConsolePrompt {
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        eprint!("{message} [{hint}] ");
        io::stderr().flush()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        let input = input.trim().to_lowercase();
        Ok(match input.as_str() {
            "" => default,
            "y" | "yes" => true,
            _ => false,
        })
    }
}
