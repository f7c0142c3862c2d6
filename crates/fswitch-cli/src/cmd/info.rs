use crate::cmd;
use crate::output::print_json;
use std::path::Path;

pub fn run(root: &Path, name: Option<&str>, json: bool) -> anyhow::Result<()> {
    let orch = cmd::orchestrator(root)?;
    let (name, record) = orch.info(name)?;

    let Some(record) = record else {
        if json {
            print_json(&serde_json::json!({ "name": name, "found": false }))?;
        } else {
            println!("Feature not found.");
        }
        return Ok(());
    };

    if json {
        print_json(record)?;
        return Ok(());
    }

    println!("Feature:  {}", record.name);
    println!("Branch:   {}", record.branch);
    if let Some(ref database) = record.database {
        println!("Database: {database}");
    }
    if let Some(saved_at) = record.saved_at {
        println!("Saved:    {}", saved_at.format("%Y-%m-%d %H:%M"));
    }
    if let Some(ref stash) = record.temp_hash_id {
        println!("Stash:    {stash}");
    }
    Ok(())
}
