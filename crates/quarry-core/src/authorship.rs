//! Best-effort contributor lookup via `git blame`.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;
use tracing::warn;

/// Distinct author names for `file_path` within the repository at
/// `repo_path`. Any failure (not a git repo, file untracked, git
/// missing) yields the empty set; authorship is never load-bearing.
pub fn authors_of(repo_path: &Path, file_path: &Path) -> BTreeSet<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo_path)
        .arg("blame")
        .arg("--line-porcelain")
        .arg("--")
        .arg(file_path)
        .output();

    match output {
        Ok(out) if out.status.success() => parse_blame(&String::from_utf8_lossy(&out.stdout)),
        Ok(out) => {
            warn!(
                file = %file_path.display(),
                "git blame exited with {}; recording no authors",
                out.status
            );
            BTreeSet::new()
        }
        Err(err) => {
            warn!(file = %file_path.display(), "git blame failed: {err}");
            BTreeSet::new()
        }
    }
}

fn parse_blame(porcelain: &str) -> BTreeSet<String> {
    porcelain
        .lines()
        .filter_map(|line| line.strip_prefix("author "))
        .map(|author| author.trim().to_string())
        .filter(|author| !author.is_empty())
        .collect()
}
