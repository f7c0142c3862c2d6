use crate::config::ToolsConfig;
use crate::error::{FeatureError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// ---------------------------------------------------------------------------
// ProjectTasks
// ---------------------------------------------------------------------------

/// External collaborators the orchestrator delegates to at defined points.
/// Database dump/restore formats and sync protocols are entirely theirs;
/// only the invocation points and the reported metadata are ours.
pub trait ProjectTasks {
    /// Export the project database into `target_dir` using `stem` as the
    /// filename stem. Returns the filename the export actually produced,
    /// relative to `target_dir` — the store records this value instead of
    /// assuming a convention at the call site.
    fn export_database(&self, target_dir: &Path, stem: &str) -> Result<String>;

    fn import_database(&self, source_file: &Path) -> Result<()>;

    /// Remote environment sync is an optional capability.
    fn can_sync_remote(&self) -> bool;

    fn sync_remote(&self, env: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// ShellTasks
// ---------------------------------------------------------------------------

/// `ProjectTasks` over configured shell command lines with `{dir}`,
/// `{stem}`, `{file}` and `{env}` placeholders.
pub struct ShellTasks {
    tools: ToolsConfig,
    root: PathBuf,
}

impl ShellTasks {
    pub fn new(tools: ToolsConfig, root: impl Into<PathBuf>) -> Self {
        Self {
            tools,
            root: root.into(),
        }
    }

    fn run(&self, task: &str, command: &str) -> Result<()> {
        tracing::info!(task, command, "running external task");
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.root)
            .stdout(Stdio::piped())
            // stderr flows through so task log lines appear in the terminal
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| FeatureError::TaskFailed {
                task: task.to_string(),
                detail: format!("failed to spawn: {e}"),
            })?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let hint: String = stdout.trim().chars().take(500).collect();
            return Err(FeatureError::TaskFailed {
                task: task.to_string(),
                detail: format!("exited with {}: {hint}", output.status),
            });
        }
        Ok(())
    }
}

impl ProjectTasks for ShellTasks {
    fn export_database(&self, target_dir: &Path, stem: &str) -> Result<String> {
        let command = self
            .tools
            .export
            .replace("{dir}", &target_dir.to_string_lossy())
            .replace("{stem}", stem);
        self.run("database export", &command)?;
        // The external db:export command writes `<stem>.sql.gz`.
        Ok(format!("{stem}.sql.gz"))
    }

    fn import_database(&self, source_file: &Path) -> Result<()> {
        let command = self
            .tools
            .import
            .replace("{file}", &source_file.to_string_lossy());
        self.run("database import", &command)
    }

    fn can_sync_remote(&self) -> bool {
        self.tools.sync.is_some()
    }

    fn sync_remote(&self, env: &str) -> Result<()> {
        let Some(sync) = &self.tools.sync else {
            return Ok(());
        };
        let command = sync.replace("{env}", env);
        self.run("remote sync", &command)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
