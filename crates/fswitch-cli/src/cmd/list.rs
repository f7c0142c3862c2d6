use crate::output::{print_json, print_table};
use anyhow::Context;
use fswitch_core::store::FeatureStore;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let store = FeatureStore::load(root).context("failed to load feature store")?;

    if json {
        print_json(&store.records())?;
        return Ok(());
    }

    if store.is_empty() {
        println!("No features saved.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = store
        .records()
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.branch.clone(),
                r.database.clone().unwrap_or_default(),
                r.saved_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["NAME", "BRANCH", "DATABASE", "SAVED"], rows);
    Ok(())
}
