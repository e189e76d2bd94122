// File discovery for repository ingestion.
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use quarry_config::CoreConfig;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Extensions loaded as indexable text.
const TEXT_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "py", "java", "go", "rs", "rb", "md", "json", "toml", "txt",
];

const DEFAULT_EXCLUDES: &[&str] = &[
    ".git/**",
    "node_modules/**",
    "target/**",
    "dist/**",
    "build/**",
    "vendor/**",
];

/// One discovered file: absolute path plus its repo-relative form.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub relative_path: String,
}

pub fn scan_repo(root: &Path, config: &CoreConfig) -> Vec<ScannedFile> {
    let include_set = build_globset(if config.include_paths.is_empty() {
        vec!["**/*".to_string()]
    } else {
        config.include_paths.clone()
    });

    let mut exclude_patterns: Vec<String> = config.exclude_paths.clone();
    exclude_patterns.extend(DEFAULT_EXCLUDES.iter().map(|s| s.to_string()));
    let exclude_set = build_globset(exclude_patterns);

    let mut files = Vec::new();
    for result in WalkBuilder::new(root).build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                warn!("error scanning path: {err}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        let rel_path = path.strip_prefix(root).unwrap_or(path);
        let rel_str = rel_path.to_string_lossy();

        if let Some(set) = &include_set {
            if !set.is_match(rel_str.as_ref()) {
                continue;
            }
        }
        if let Some(set) = &exclude_set {
            if set.is_match(rel_str.as_ref()) {
                continue;
            }
        }

        let indexable = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext));
        if indexable {
            files.push(ScannedFile {
                path: path.to_path_buf(),
                relative_path: rel_str.to_string(),
            });
        }
    }

    files
}

pub fn build_globset(patterns: Vec<String>) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        match Glob::new(&pat) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(_) => warn!("ignoring invalid glob pattern: {pat}"),
        }
    }
    match builder.build() {
        Ok(set) => Some(set),
        Err(err) => {
            warn!("failed to build globset: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn scan_skips_vcs_and_dependency_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.ts"), "const x = 1;").unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "x").unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/config"), "x").unwrap();
        fs::write(dir.path().join("image.png"), [0u8; 4]).unwrap();

        let files = scan_repo(dir.path(), &CoreConfig::default());
        let rels: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(rels, vec!["main.ts"]);
    }

    #[test]
    fn scan_honors_configured_excludes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.py"), "pass").unwrap();
        fs::create_dir_all(dir.path().join("generated")).unwrap();
        fs::write(dir.path().join("generated/out.py"), "pass").unwrap();

        let config = CoreConfig {
            exclude_paths: vec!["generated/**".to_string()],
            ..Default::default()
        };
        let files = scan_repo(dir.path(), &config);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "keep.py");
    }
}
