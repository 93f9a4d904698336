use std::collections::BTreeSet;
use tagfence_core::ImportDeclaration;

/// In-memory view of the scanned tree used during resolution. The resolver
/// never touches the filesystem; everything it needs is derived from the
/// scanner's output once, up front.
#[derive(Debug, Default)]
pub struct ModuleTable {
    files: BTreeSet<String>,
    dirs: BTreeSet<String>,
}

impl ModuleTable {
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut files = BTreeSet::new();
        let mut dirs = BTreeSet::new();
        for path in paths {
            let mut end = 0;
            while let Some(pos) = path[end..].find('/') {
                dirs.insert(path[..end + pos].to_string());
                end += pos + 1;
            }
            files.insert(path);
        }
        Self { files, dirs }
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.dirs.contains(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Outcome of resolving one import reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Project-relative path of the resolved module file.
    Module(String),
    /// No project root knows the reference; a third-party or standard
    /// library module. Inert for policy purposes.
    External,
    /// The reference looks like it belongs to the project but no module file
    /// backs it. The edge is dropped and a warning recorded, never silently
    /// treated as external.
    Unresolved,
}

/// Turns raw import references into canonical project-relative module paths.
pub struct ModuleResolver<'a> {
    table: &'a ModuleTable,
    source_roots: &'a [String],
}

impl<'a> ModuleResolver<'a> {
    pub fn new(table: &'a ModuleTable, source_roots: &'a [String]) -> Self {
        Self {
            table,
            source_roots,
        }
    }

    pub fn resolve(&self, import: &ImportDeclaration, importing_file: &str) -> Resolution {
        if import.level > 0 {
            self.resolve_relative(import, importing_file)
        } else {
            self.resolve_absolute(import)
        }
    }

    /// Relative references anchor at the importing file's directory and
    /// ascend `level - 1` directories before appending the written suffix.
    /// Escaping the project root is unresolvable, not external.
    fn resolve_relative(&self, import: &ImportDeclaration, importing_file: &str) -> Resolution {
        let mut dir: Vec<&str> = match importing_file.rsplit_once('/') {
            Some((dir, _)) => dir.split('/').collect(),
            None => Vec::new(),
        };
        for _ in 1..import.level {
            if dir.pop().is_none() {
                return Resolution::Unresolved;
            }
        }

        let prefix = dir.join("/");
        let segments: Vec<&str> = if import.reference.is_empty() {
            Vec::new()
        } else {
            import.reference.split('.').collect()
        };
        // Relative references are always from-imports, and a relative member
        // import may chop down to the anchor package itself
        // (`from . import symbol` lands on its __init__).
        match self.probe_module(&prefix, &segments, 0) {
            Some(path) => Resolution::Module(path),
            None => Resolution::Unresolved,
        }
    }

    /// Absolute references try each declared source root in order; the first
    /// root that resolves wins. A reference whose leading segment is unknown
    /// under every root is external.
    fn resolve_absolute(&self, import: &ImportDeclaration) -> Resolution {
        let reference = &import.reference;
        if reference.is_empty() {
            return Resolution::Unresolved;
        }
        let segments: Vec<&str> = reference.split('.').collect();
        // A plain `import a.b` names an exact module; only a from-import may
        // chop its final segment, and never below the top-level module.
        let min_after_chop = if import.from_import { 1 } else { segments.len() };
        let mut prefix_known = false;

        for root in self.source_roots {
            if let Some(path) = self.probe_module(root_prefix(root), &segments, min_after_chop) {
                return Resolution::Module(path);
            }
            let head = join_path(root_prefix(root), segments[0]);
            if self.table.has_dir(&head)
                || self.table.has_file(&format!("{}.py", head))
                || self.table.has_file(&format!("{}.pyi", head))
            {
                prefix_known = true;
            }
        }

        if prefix_known {
            Resolution::Unresolved
        } else {
            Resolution::External
        }
    }

    /// Probes a dotted path as a module file or package `__init__`, then as
    /// a member of its parent (`from m import symbol`, final segment chopped
    /// once). `min_after_chop` bounds how short the chopped path may get.
    fn probe_module(&self, prefix: &str, segments: &[&str], min_after_chop: usize) -> Option<String> {
        if let Some(path) = self.probe_exact(prefix, segments) {
            return Some(path);
        }
        if segments.is_empty() || segments.len() - 1 < min_after_chop {
            return None;
        }
        self.probe_exact(prefix, &segments[..segments.len() - 1])
    }

    fn probe_exact(&self, prefix: &str, segments: &[&str]) -> Option<String> {
        let path = join_path(prefix, &segments.join("/"));
        if !path.is_empty() {
            for ext in ["py", "pyi"] {
                let candidate = format!("{}.{}", path, ext);
                if self.table.has_file(&candidate) {
                    return Some(candidate);
                }
            }
        }
        for init in ["__init__.py", "__init__.pyi"] {
            let candidate = join_path(&path, init);
            if self.table.has_file(&candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

fn root_prefix(root: &str) -> &str {
    if root == "." {
        ""
    } else {
        root.trim_matches('/')
    }
}

fn join_path(prefix: &str, rest: &str) -> String {
    if prefix.is_empty() {
        rest.to_string()
    } else if rest.is_empty() {
        prefix.to_string()
    } else {
        format!("{}/{}", prefix, rest)
    }
}
