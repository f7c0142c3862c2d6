use crate::cmd;
use crate::output::print_json;
use anyhow::Context;
use std::path::Path;

pub fn run(root: &Path, name: Option<&str>, json: bool) -> anyhow::Result<()> {
    let mut orch = cmd::orchestrator(root)?;
    let name = orch.save(name).context("failed to save feature")?;

    if json {
        print_json(&serde_json::json!({ "name": name, "saved": true }))?;
    } else {
        println!("Saved feature '{name}'.");
    }
    Ok(())
}
