use ignore::{overrides::OverrideBuilder, WalkBuilder};
use std::path::{Path, PathBuf};
use tagfence_core::{Result, TagFenceError, Warning};
use tracing::{debug, info, warn};

/// Extensions recognized as analyzable source.
pub const SOURCE_EXTENSIONS: &[&str] = &["py", "pyi"];

/// Directories that never hold project source. Pruned in addition to
/// caller-supplied patterns.
const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".tox",
    ".venv",
    "venv",
    "node_modules",
    ".eggs",
];

/// A candidate source file emitted by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub abs_path: PathBuf,
    /// Project-relative path with `/` separators; the identity used
    /// everywhere downstream.
    pub rel_path: String,
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub files: Vec<ScannedFile>,
    pub warnings: Vec<Warning>,
}

/// Walks `root`, pruning excluded subtrees entirely and skipping files
/// without a recognized source extension.
///
/// Exclusions use gitignore-style globs relative to `root`. Symbolic links
/// are not followed, so link cycles cannot recurse. Unreadable directories
/// produce a `ScanIo` warning and the walk continues. Output order is
/// deterministic (sorted by path).
pub fn scan_source_files(root: &Path, exclude_patterns: &[String]) -> Result<ScanResult> {
    info!("scanning source files under {:?}", root);

    let mut overrides = OverrideBuilder::new(root);
    for pattern in DEFAULT_EXCLUDES {
        let ignore_glob = format!("!{}", pattern);
        overrides
            .add(&ignore_glob)
            .map_err(|e| TagFenceError::Configuration(format!("bad exclude pattern: {}", e)))?;
    }
    for pattern in exclude_patterns {
        let ignore_glob = format!("!{}", pattern);
        overrides
            .add(&ignore_glob)
            .map_err(|e| TagFenceError::Configuration(format!("bad exclude pattern: {}", e)))?;
        debug!("added exclude pattern: {}", pattern);
    }
    let overrides = overrides
        .build()
        .map_err(|e| TagFenceError::Configuration(format!("bad exclude pattern: {}", e)))?;

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .ignore(false)
        .follow_links(false)
        .overrides(overrides)
        .sort_by_file_path(|a, b| a.cmp(b));

    let mut result = ScanResult::default();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("walker error: {}", e);
                result
                    .warnings
                    .push(Warning::scan_io(root.display().to_string(), e.to_string()));
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let recognized = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| SOURCE_EXTENSIONS.contains(&ext))
            .unwrap_or(false);
        if !recognized {
            continue;
        }

        let rel_path = match path.strip_prefix(root) {
            Ok(rel) => rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/"),
            Err(_) => continue,
        };
        result.files.push(ScannedFile {
            abs_path: path.to_path_buf(),
            rel_path,
        });
    }

    info!("scan complete: {} candidate files", result.files.len());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn collects_only_recognized_extensions() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "pkg/mod.py", "x = 1\n");
        write(tmp.path(), "pkg/stub.pyi", "x: int\n");
        write(tmp.path(), "pkg/readme.md", "# nope\n");

        let result = scan_source_files(tmp.path(), &[]).unwrap();
        let rels: Vec<_> = result.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(rels, vec!["pkg/mod.py", "pkg/stub.pyi"]);
    }

    #[test]
    fn excluded_subtrees_are_pruned() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "src/main.py", "import os\n");
        write(tmp.path(), "legacy/old.py", "import os\n");
        write(tmp.path(), "legacy/nested/deep.py", "import os\n");

        let result = scan_source_files(tmp.path(), &["legacy".to_string()]).unwrap();
        let rels: Vec<_> = result.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(rels, vec!["src/main.py"]);
    }

    #[test]
    fn default_excludes_skip_caches() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "app.py", "x = 1\n");
        write(tmp.path(), "__pycache__/app.cpython-312.py", "x = 1\n");

        let result = scan_source_files(tmp.path(), &[]).unwrap();
        let rels: Vec<_> = result.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(rels, vec!["app.py"]);
    }

    #[test]
    fn output_is_sorted_and_stable() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b.py", "");
        write(tmp.path(), "a.py", "");
        write(tmp.path(), "c/d.py", "");

        let first = scan_source_files(tmp.path(), &[]).unwrap();
        let second = scan_source_files(tmp.path(), &[]).unwrap();
        let rels: Vec<_> = first.files.iter().map(|f| f.rel_path.clone()).collect();
        assert_eq!(rels, vec!["a.py", "b.py", "c/d.py"]);
        assert_eq!(first.files, second.files);
    }
}
