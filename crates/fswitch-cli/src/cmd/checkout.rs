use crate::cmd;
use crate::output::print_json;
use anyhow::Context;
use fswitch_core::orchestrator::CheckoutOutcome;
use std::path::Path;

pub fn run(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let mut orch = cmd::orchestrator(root)?;
    let outcome = orch
        .checkout(name)
        .with_context(|| format!("failed to check out feature '{name}'"))?;

    if json {
        let outcome_str = match outcome {
            CheckoutOutcome::Complete => "complete",
            CheckoutOutcome::Created => "created",
            CheckoutOutcome::Declined => "declined",
        };
        print_json(&serde_json::json!({ "name": name, "outcome": outcome_str }))?;
        return Ok(());
    }

    match outcome {
        CheckoutOutcome::Complete => println!("Feature checkout complete."),
        CheckoutOutcome::Created => println!("Feature '{name}' created."),
        CheckoutOutcome::Declined => println!("Feature '{name}' was not created."),
    }
    Ok(())
}
