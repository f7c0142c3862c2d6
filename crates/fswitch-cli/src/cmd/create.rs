use crate::cmd;
use crate::output::print_json;
use anyhow::Context;
use std::path::Path;

pub fn run(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let mut orch = cmd::orchestrator(root)?;
    orch.create(name)
        .with_context(|| format!("failed to create feature '{name}'"))?;

    if json {
        print_json(&serde_json::json!({ "name": name, "created": true }))?;
    } else {
        println!("Feature '{name}' created.");
    }
    Ok(())
}
