pub mod checkout;
pub mod create;
pub mod info;
pub mod list;
pub mod save;

use crate::prompt::ConsolePrompt;
use anyhow::Context;
use fswitch_core::config::Config;
use fswitch_core::git::GitRepository;
use fswitch_core::orchestrator::FeatureOrchestrator;
use fswitch_core::store::FeatureStore;
use fswitch_core::tasks::ShellTasks;
use std::path::Path;

pub(crate) type Orchestrator = FeatureOrchestrator<GitRepository, ShellTasks, ConsolePrompt>;

pub(crate) fn orchestrator(root: &Path) -> anyhow::Result<Orchestrator> {
    let config = Config::load(root).context("failed to load configuration")?;
    let store = FeatureStore::load(root).context("failed to load feature store")?;
    let vcs = GitRepository::open(root)?;
    let tasks = ShellTasks::new(config.tools, root);
    Ok(FeatureOrchestrator::new(
        root,
        store,
        vcs,
        tasks,
        ConsolePrompt,
    ))
}
