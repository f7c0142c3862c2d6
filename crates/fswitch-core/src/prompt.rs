use crate::error::Result;

/// Interactive yes/no confirmation. Every confirmation gates entry into a
/// mutating step, never interrupts one, so a decline is always safe.
pub trait ConfirmPrompt {
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool>;
}
