use std::path::{Path, PathBuf};

/// Resolve the project root directory.
///
/// Priority:
/// 1. `--root` flag / `FSWITCH_ROOT` env var (passed in as `explicit`)
/// 2. Nearest ancestor of `cwd` containing `.project-x/`
/// 3. Nearest ancestor of `cwd` containing `.git/`
/// 4. `cwd` itself
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    ancestor_with(&cwd, ".project-x")
        .or_else(|| ancestor_with(&cwd, ".git"))
        .unwrap_or(cwd)
}

fn ancestor_with(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}
