use crate::error::{FeatureError, Result};
use crate::git::VersionControl;
use crate::paths;
use crate::prompt::ConfirmPrompt;
use crate::store::{FeatureRecord, FeatureStore};
use crate::tasks::ProjectTasks;
use chrono::Utc;
use std::path::PathBuf;

/// Marker message for temporary commits that stash uncommitted work across
/// a branch switch.
pub const STASH_COMMIT_MESSAGE: &str = "chore: temporary feature-switch stash";

/// How a `checkout` invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Branch switched and database imported.
    Complete,
    /// The feature was unknown; the user accepted creating it.
    Created,
    /// The feature was unknown and the user declined to create it.
    Declined,
}

// ---------------------------------------------------------------------------
// FeatureOrchestrator
// ---------------------------------------------------------------------------

/// Drives the checkout/create/save sequences over the feature store, the
/// version-control adapter and the external task collaborators. One
/// command invocation owns one orchestrator; every failure is terminal for
/// that invocation and already-completed steps are not rolled back.
pub struct FeatureOrchestrator<V, T, P> {
    root: PathBuf,
    store: FeatureStore,
    vcs: V,
    tasks: T,
    prompt: P,
}

impl<V: VersionControl, T: ProjectTasks, P: ConfirmPrompt> FeatureOrchestrator<V, T, P> {
    pub fn new(root: impl Into<PathBuf>, store: FeatureStore, vcs: V, tasks: T, prompt: P) -> Self {
        Self {
            root: root.into(),
            store,
            vcs,
            tasks,
            prompt,
        }
    }

    // ---------------------------------------------------------------------------
    // checkout
    // ---------------------------------------------------------------------------

    pub fn checkout(&mut self, target: &str) -> Result<CheckoutOutcome> {
        paths::validate_feature_name(target)?;

        let current = self.vcs.current_branch()?;
        if target != current
            && self.prompt.confirm(
                &format!("Save the current feature '{current}' before switching?"),
                true,
            )?
        {
            self.save(Some(current.as_str()))?;
        }

        if self.store.exists(target) {
            self.checkout_branch(target)?;
            self.import_database(target)?;
            return Ok(CheckoutOutcome::Complete);
        }

        if self.prompt.confirm(
            &format!("Feature '{target}' has not been created. Would you like to create it?"),
            false,
        )? {
            self.create(target)?;
            Ok(CheckoutOutcome::Created)
        } else {
            Ok(CheckoutOutcome::Declined)
        }
    }

    /// The branch-switch safety protocol.
    ///
    /// A dirty working tree is stashed into a temporary commit on the
    /// branch being left, recorded on that feature's record and persisted
    /// immediately so the stash point survives any later failure. On
    /// arrival, a stash commit left at the destination's tip the last time
    /// it was left is reverted, restoring the stashed work as uncommitted
    /// changes.
    fn checkout_branch(&mut self, name: &str) -> Result<()> {
        let current = self.vcs.current_branch()?;

        if name == current {
            if !self.prompt.confirm(
                &format!("Branch '{name}' is already checked out, would you like to continue anyway?"),
                false,
            )? {
                return Err(FeatureError::CheckoutCanceled);
            }
            return Ok(());
        }

        if !self.vcs.list_branches()?.iter().any(|b| b == name) {
            return Err(FeatureError::BranchNotFound(name.to_string()));
        }

        if self.vcs.has_uncommitted_changes()? {
            if !self.prompt.confirm(
                "The working tree has uncommitted changes. Stash them into a temporary commit?",
                true,
            )? {
                return Err(FeatureError::CheckoutCanceled);
            }
            let commit = self.vcs.commit_all(STASH_COMMIT_MESSAGE)?;
            tracing::info!(branch = %current, commit = %commit, "stashed working tree");
            self.store.get_or_create(&current).temp_hash_id = Some(commit);
            self.store.save()?;
        }

        self.vcs.checkout(name)?;
        self.revert_stash(name)
    }

    /// Undo a stash commit made the last time `name` was left, but only
    /// while it is still the branch tip — resetting past newer commits
    /// would discard them.
    fn revert_stash(&mut self, name: &str) -> Result<()> {
        let Some(stash) = self.store.get(name).and_then(|r| r.temp_hash_id.clone()) else {
            return Ok(());
        };
        let tip = self.vcs.head_commit()?;
        if stash == tip {
            self.vcs.reset_to_parent_of(&tip)?;
            tracing::info!(branch = %name, commit = %tip, "reverted temporary stash commit");
            self.store.get_or_create(name).temp_hash_id = None;
            self.store.save()?;
        }
        Ok(())
    }

    fn import_database(&self, name: &str) -> Result<()> {
        let database = self
            .store
            .get(name)
            .and_then(|r| r.database.clone())
            .ok_or_else(|| FeatureError::NoDatabaseRecorded(name.to_string()))?;

        let file = paths::database_path(&self.root, &database);
        if !file.exists() {
            return Err(FeatureError::DatabaseFileMissing(file));
        }
        self.tasks.import_database(&file)
    }

    // ---------------------------------------------------------------------------
    // create
    // ---------------------------------------------------------------------------

    pub fn create(&mut self, name: &str) -> Result<()> {
        paths::validate_feature_name(name)?;
        self.checkout_branch(name)?;

        if self.tasks.can_sync_remote() {
            self.tasks.sync_remote(name)?;
        } else {
            tracing::debug!("remote sync not configured, skipping");
        }

        self.save(Some(name))?;
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // save
    // ---------------------------------------------------------------------------

    /// Export the database and record the result. Defaults to the current
    /// branch when no name is given. Returns the resolved feature name.
    pub fn save(&mut self, name: Option<&str>) -> Result<String> {
        let name = match name {
            Some(n) => {
                paths::validate_feature_name(n)?;
                n.to_string()
            }
            None => self.vcs.current_branch()?,
        };

        let dir = paths::features_dir(&self.root);
        crate::io::ensure_dir(&dir)?;
        let stem = paths::encode_feature_name(&name);
        let filename = self.tasks.export_database(&dir, &stem)?;

        let record = self.store.get_or_create(&name);
        record.branch = name.clone();
        record.database = Some(filename);
        record.saved_at = Some(Utc::now());
        self.store.save()?;
        Ok(name)
    }

    // ---------------------------------------------------------------------------
    // read-only
    // ---------------------------------------------------------------------------

    /// Resolve `name` (defaulting to the current branch) and look up its
    /// record, if any.
    pub fn info(&self, name: Option<&str>) -> Result<(String, Option<&FeatureRecord>)> {
        let name = match name {
            Some(n) => n.to_string(),
            None => self.vcs.current_branch()?,
        };
        let record = self.store.get(&name);
        Ok((name, record))
    }

    pub fn list(&self) -> &[FeatureRecord] {
        self.store.records()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, VecDeque};
    use std::path::Path;
    use tempfile::TempDir;

    // ---------------------------------------------------------------------------
    // Fakes
    // ---------------------------------------------------------------------------

    struct FakeVcs {
        branches: Vec<String>,
        current: RefCell<String>,
        dirty: Cell<bool>,
        tips: RefCell<HashMap<String, String>>,
        commit_seq: Cell<u32>,
        commits: RefCell<Vec<String>>,
        resets: RefCell<Vec<String>>,
    }

    impl FakeVcs {
        fn new(current: &str, branches: &[&str]) -> Self {
            Self {
                branches: branches.iter().map(|b| b.to_string()).collect(),
                current: RefCell::new(current.to_string()),
                dirty: Cell::new(false),
                tips: RefCell::new(HashMap::new()),
                commit_seq: Cell::new(0),
                commits: RefCell::new(Vec::new()),
                resets: RefCell::new(Vec::new()),
            }
        }

        fn set_tip(&self, branch: &str, commit: &str) {
            self.tips
                .borrow_mut()
                .insert(branch.to_string(), commit.to_string());
        }
    }

    impl VersionControl for FakeVcs {
        fn current_branch(&self) -> Result<String> {
            Ok(self.current.borrow().clone())
        }

        fn list_branches(&self) -> Result<Vec<String>> {
            Ok(self.branches.clone())
        }

        fn has_uncommitted_changes(&self) -> Result<bool> {
            Ok(self.dirty.get())
        }

        fn checkout(&self, branch: &str) -> Result<()> {
            if !self.branches.iter().any(|b| b == branch) {
                return Err(FeatureError::CheckoutFailed {
                    branch: branch.to_string(),
                    detail: "no such branch".to_string(),
                });
            }
            *self.current.borrow_mut() = branch.to_string();
            Ok(())
        }

        fn commit_all(&self, message: &str) -> Result<String> {
            let n = self.commit_seq.get() + 1;
            self.commit_seq.set(n);
            let id = format!("commit-{n}");
            let current = self.current.borrow().clone();
            self.set_tip(&current, &id);
            self.commits.borrow_mut().push(message.to_string());
            self.dirty.set(false);
            Ok(id)
        }

        fn head_commit(&self) -> Result<String> {
            let current = self.current.borrow().clone();
            Ok(self
                .tips
                .borrow()
                .get(&current)
                .cloned()
                .unwrap_or_else(|| "commit-0".to_string()))
        }

        fn reset_to_parent_of(&self, commit_id: &str) -> Result<()> {
            self.resets.borrow_mut().push(commit_id.to_string());
            let current = self.current.borrow().clone();
            self.set_tip(&current, &format!("{commit_id}~"));
            // Mixed reset leaves the commit's content as pending changes.
            self.dirty.set(true);
            Ok(())
        }
    }

    struct FakeTasks {
        sync_available: bool,
        write_exports: bool,
        exports: RefCell<Vec<String>>,
        imports: RefCell<Vec<PathBuf>>,
        syncs: RefCell<Vec<String>>,
    }

    impl FakeTasks {
        fn new() -> Self {
            Self {
                sync_available: false,
                write_exports: true,
                exports: RefCell::new(Vec::new()),
                imports: RefCell::new(Vec::new()),
                syncs: RefCell::new(Vec::new()),
            }
        }
    }

    impl ProjectTasks for FakeTasks {
        fn export_database(&self, target_dir: &Path, stem: &str) -> Result<String> {
            let filename = format!("{stem}.sql.gz");
            if self.write_exports {
                std::fs::create_dir_all(target_dir)?;
                std::fs::write(target_dir.join(&filename), b"dump")?;
            }
            self.exports.borrow_mut().push(filename.clone());
            Ok(filename)
        }

        fn import_database(&self, source_file: &Path) -> Result<()> {
            self.imports.borrow_mut().push(source_file.to_path_buf());
            Ok(())
        }

        fn can_sync_remote(&self) -> bool {
            self.sync_available
        }

        fn sync_remote(&self, env: &str) -> Result<()> {
            self.syncs.borrow_mut().push(env.to_string());
            Ok(())
        }
    }

    /// Pops one scripted answer per confirmation, in order.
    struct ScriptedPrompt(VecDeque<bool>);

    impl ScriptedPrompt {
        fn answers(answers: &[bool]) -> Self {
            Self(answers.iter().copied().collect())
        }
    }

    impl ConfirmPrompt for ScriptedPrompt {
        fn confirm(&mut self, message: &str, _default: bool) -> Result<bool> {
            match self.0.pop_front() {
                Some(answer) => Ok(answer),
                None => panic!("unexpected prompt: {message}"),
            }
        }
    }

    // ---------------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------------

    fn orchestrator(
        dir: &TempDir,
        vcs: FakeVcs,
        tasks: FakeTasks,
        answers: &[bool],
    ) -> FeatureOrchestrator<FakeVcs, FakeTasks, ScriptedPrompt> {
        let store = FeatureStore::load(dir.path()).unwrap();
        FeatureOrchestrator::new(
            dir.path(),
            store,
            vcs,
            tasks,
            ScriptedPrompt::answers(answers),
        )
    }

    fn seed_named(dir: &TempDir, name: &str, mutate: impl FnOnce(&mut FeatureRecord)) {
        let mut store = FeatureStore::load(dir.path()).unwrap();
        mutate(store.get_or_create(name));
        store.save().unwrap();
    }

    fn touch_database(dir: &TempDir, filename: &str) {
        let features = dir.path().join(paths::FEATURES_DIR);
        std::fs::create_dir_all(&features).unwrap();
        std::fs::write(features.join(filename), b"dump").unwrap();
    }

    // ---------------------------------------------------------------------------
    // checkout
    // ---------------------------------------------------------------------------

    #[test]
    fn same_branch_declined_cancels_without_side_effects() {
        let dir = TempDir::new().unwrap();
        seed_named(&dir, "main", |r| r.branch = "main".to_string());

        let vcs = FakeVcs::new("main", &["main"]);
        // One prompt: "continue anyway?" → no
        let mut orch = orchestrator(&dir, vcs, FakeTasks::new(), &[false]);

        let err = orch.checkout("main").unwrap_err();
        assert!(matches!(err, FeatureError::CheckoutCanceled));
        assert!(orch.tasks.imports.borrow().is_empty());
        assert_eq!(orch.vcs.current_branch().unwrap(), "main");

        let reloaded = FeatureStore::load(dir.path()).unwrap();
        assert!(reloaded.get("main").unwrap().temp_hash_id.is_none());
    }

    #[test]
    fn missing_branch_raises_branch_not_found() {
        let dir = TempDir::new().unwrap();
        seed_named(&dir, "ghost", |r| r.branch = "ghost".to_string());

        let vcs = FakeVcs::new("main", &["main"]);
        // save-first? → no
        let mut orch = orchestrator(&dir, vcs, FakeTasks::new(), &[false]);

        let err = orch.checkout("ghost").unwrap_err();
        assert!(matches!(err, FeatureError::BranchNotFound(name) if name == "ghost"));
        assert_eq!(orch.vcs.current_branch().unwrap(), "main");
        assert!(orch.vcs.commits.borrow().is_empty());
    }

    #[test]
    fn dirty_tree_stashes_switches_and_reverts_destination_stash() {
        let dir = TempDir::new().unwrap();
        seed_named(&dir, "beta", |r| {
            r.branch = "beta".to_string();
            r.database = Some("beta.sql.gz".to_string());
            r.temp_hash_id = Some("beta-stash".to_string());
        });
        touch_database(&dir, "beta.sql.gz");

        let vcs = FakeVcs::new("main", &["main", "beta"]);
        vcs.set_tip("beta", "beta-stash");
        vcs.dirty.set(true);

        // save-first? → no; stash dirty tree? → yes
        let mut orch = orchestrator(&dir, vcs, FakeTasks::new(), &[false, true]);
        let outcome = orch.checkout("beta").unwrap();
        assert_eq!(outcome, CheckoutOutcome::Complete);

        // Exactly one stash commit with the marker message, recorded on the
        // pre-switch feature's record.
        assert_eq!(orch.vcs.commits.borrow().as_slice(), [STASH_COMMIT_MESSAGE]);
        let reloaded = FeatureStore::load(dir.path()).unwrap();
        assert_eq!(
            reloaded.get("main").unwrap().temp_hash_id.as_deref(),
            Some("commit-1")
        );

        // Destination stash was reverted and cleared.
        assert_eq!(orch.vcs.resets.borrow().as_slice(), ["beta-stash"]);
        assert!(reloaded.get("beta").unwrap().temp_hash_id.is_none());

        // Switch happened and the database import ran.
        assert_eq!(orch.vcs.current_branch().unwrap(), "beta");
        assert_eq!(orch.tasks.imports.borrow().len(), 1);
    }

    #[test]
    fn stash_declined_cancels_before_any_commit() {
        let dir = TempDir::new().unwrap();
        seed_named(&dir, "beta", |r| {
            r.branch = "beta".to_string();
            r.database = Some("beta.sql.gz".to_string());
        });
        touch_database(&dir, "beta.sql.gz");

        let vcs = FakeVcs::new("main", &["main", "beta"]);
        vcs.dirty.set(true);

        // save-first? → no; stash? → no
        let mut orch = orchestrator(&dir, vcs, FakeTasks::new(), &[false, false]);
        let err = orch.checkout("beta").unwrap_err();
        assert!(matches!(err, FeatureError::CheckoutCanceled));
        assert!(orch.vcs.commits.borrow().is_empty());
        assert_eq!(orch.vcs.current_branch().unwrap(), "main");
    }

    #[test]
    fn stale_stash_not_at_tip_is_left_alone() {
        let dir = TempDir::new().unwrap();
        seed_named(&dir, "beta", |r| {
            r.branch = "beta".to_string();
            r.database = Some("beta.sql.gz".to_string());
            r.temp_hash_id = Some("old-stash".to_string());
        });
        touch_database(&dir, "beta.sql.gz");

        let vcs = FakeVcs::new("main", &["main", "beta"]);
        vcs.set_tip("beta", "newer-commit");

        let mut orch = orchestrator(&dir, vcs, FakeTasks::new(), &[false]);
        orch.checkout("beta").unwrap();

        assert!(orch.vcs.resets.borrow().is_empty());
        let reloaded = FeatureStore::load(dir.path()).unwrap();
        assert_eq!(
            reloaded.get("beta").unwrap().temp_hash_id.as_deref(),
            Some("old-stash")
        );
    }

    #[test]
    fn save_first_accepted_saves_the_current_feature() {
        let dir = TempDir::new().unwrap();
        seed_named(&dir, "beta", |r| {
            r.branch = "beta".to_string();
            r.database = Some("beta.sql.gz".to_string());
        });
        touch_database(&dir, "beta.sql.gz");

        let vcs = FakeVcs::new("main", &["main", "beta"]);
        // save-first? → yes
        let mut orch = orchestrator(&dir, vcs, FakeTasks::new(), &[true]);
        orch.checkout("beta").unwrap();

        assert_eq!(orch.tasks.exports.borrow().as_slice(), ["main.sql.gz"]);
        let reloaded = FeatureStore::load(dir.path()).unwrap();
        let main = reloaded.get("main").unwrap();
        assert_eq!(main.branch, "main");
        assert_eq!(main.database.as_deref(), Some("main.sql.gz"));
        assert!(main.saved_at.is_some());
    }

    #[test]
    fn unknown_feature_declined_creation_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let vcs = FakeVcs::new("main", &["main", "alpha"]);

        // save-first? → no; create it? → no
        let mut orch = orchestrator(&dir, vcs, FakeTasks::new(), &[false, false]);
        let outcome = orch.checkout("alpha").unwrap();
        assert_eq!(outcome, CheckoutOutcome::Declined);
        assert_eq!(orch.vcs.current_branch().unwrap(), "main");
        assert!(FeatureStore::load(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn create_accepted_but_branch_missing_leaves_store_empty() {
        let dir = TempDir::new().unwrap();
        let vcs = FakeVcs::new("main", &["main"]);

        // save-first? → no; create it? → yes
        let mut orch = orchestrator(&dir, vcs, FakeTasks::new(), &[false, true]);
        let err = orch.checkout("alpha").unwrap_err();
        assert!(matches!(err, FeatureError::BranchNotFound(name) if name == "alpha"));
        assert!(FeatureStore::load(dir.path()).unwrap().is_empty());
        assert!(orch.tasks.exports.borrow().is_empty());
    }

    #[test]
    fn missing_database_file_fails_after_the_switch() {
        let dir = TempDir::new().unwrap();
        seed_named(&dir, "beta", |r| {
            r.branch = "beta".to_string();
            r.database = Some("beta.sql.gz".to_string());
        });
        // beta.sql.gz deliberately absent from disk

        let vcs = FakeVcs::new("main", &["main", "beta"]);
        let mut orch = orchestrator(&dir, vcs, FakeTasks::new(), &[false]);

        let err = orch.checkout("beta").unwrap_err();
        assert!(matches!(err, FeatureError::DatabaseFileMissing(_)));
        // No rollback: the branch switch stands.
        assert_eq!(orch.vcs.current_branch().unwrap(), "beta");
        assert!(orch.tasks.imports.borrow().is_empty());
    }

    #[test]
    fn no_database_recorded_is_reported_not_skipped() {
        let dir = TempDir::new().unwrap();
        seed_named(&dir, "beta", |r| r.branch = "beta".to_string());

        let vcs = FakeVcs::new("main", &["main", "beta"]);
        let mut orch = orchestrator(&dir, vcs, FakeTasks::new(), &[false]);

        let err = orch.checkout("beta").unwrap_err();
        assert!(matches!(err, FeatureError::NoDatabaseRecorded(name) if name == "beta"));
    }

    // ---------------------------------------------------------------------------
    // create / save
    // ---------------------------------------------------------------------------

    #[test]
    fn create_without_sync_capability_still_persists_the_record() {
        let dir = TempDir::new().unwrap();
        let vcs = FakeVcs::new("main", &["main", "alpha"]);

        let mut orch = orchestrator(&dir, vcs, FakeTasks::new(), &[]);
        orch.create("alpha").unwrap();

        assert!(orch.tasks.syncs.borrow().is_empty());
        let reloaded = FeatureStore::load(dir.path()).unwrap();
        let record = reloaded.get("alpha").unwrap();
        assert_eq!(record.branch, "alpha");
        assert_eq!(record.database.as_deref(), Some("alpha.sql.gz"));
    }

    #[test]
    fn create_with_sync_targets_the_feature_environment() {
        let dir = TempDir::new().unwrap();
        let vcs = FakeVcs::new("main", &["main", "alpha"]);
        let tasks = FakeTasks {
            sync_available: true,
            ..FakeTasks::new()
        };

        let mut orch = orchestrator(&dir, vcs, tasks, &[]);
        orch.create("alpha").unwrap();
        assert_eq!(orch.tasks.syncs.borrow().as_slice(), ["alpha"]);
    }

    #[test]
    fn save_defaults_to_the_current_branch() {
        let dir = TempDir::new().unwrap();
        let vcs = FakeVcs::new("main", &["main"]);

        let mut orch = orchestrator(&dir, vcs, FakeTasks::new(), &[]);
        let name = orch.save(None).unwrap();
        assert_eq!(name, "main");

        let reloaded = FeatureStore::load(dir.path()).unwrap();
        assert_eq!(reloaded.get("main").unwrap().branch, "main");
    }

    #[test]
    fn save_uses_the_escaped_stem_for_slashed_names() {
        let dir = TempDir::new().unwrap();
        let vcs = FakeVcs::new("feature/login", &["feature/login"]);

        let mut orch = orchestrator(&dir, vcs, FakeTasks::new(), &[]);
        orch.save(None).unwrap();

        assert_eq!(
            orch.tasks.exports.borrow().as_slice(),
            ["feature%2Flogin.sql.gz"]
        );
        let reloaded = FeatureStore::load(dir.path()).unwrap();
        let record = reloaded.get("feature/login").unwrap();
        assert_eq!(record.database.as_deref(), Some("feature%2Flogin.sql.gz"));
    }

    #[test]
    fn invalid_name_is_rejected_before_any_work() {
        let dir = TempDir::new().unwrap();
        let vcs = FakeVcs::new("main", &["main"]);

        let mut orch = orchestrator(&dir, vcs, FakeTasks::new(), &[]);
        let err = orch.checkout("no spaces allowed").unwrap_err();
        assert!(matches!(err, FeatureError::InvalidFeatureName(_)));
    }

    // ---------------------------------------------------------------------------
    // info / list
    // ---------------------------------------------------------------------------

    #[test]
    fn info_defaults_to_current_branch() {
        let dir = TempDir::new().unwrap();
        seed_named(&dir, "main", |r| r.branch = "main".to_string());

        let vcs = FakeVcs::new("main", &["main"]);
        let orch = orchestrator(&dir, vcs, FakeTasks::new(), &[]);

        let (name, record) = orch.info(None).unwrap();
        assert_eq!(name, "main");
        assert_eq!(record.unwrap().branch, "main");

        let (name, record) = orch.info(Some("missing")).unwrap();
        assert_eq!(name, "missing");
        assert!(record.is_none());
    }

    #[test]
    fn list_is_empty_for_an_empty_store() {
        let dir = TempDir::new().unwrap();
        let vcs = FakeVcs::new("main", &["main"]);
        let orch = orchestrator(&dir, vcs, FakeTasks::new(), &[]);
        assert!(orch.list().is_empty());
    }
}
