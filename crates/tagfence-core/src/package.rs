use crate::{Result, TagFenceError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A declared unit of ownership: a directory subtree carrying one or more tags.
///
/// Identity is the canonical project-relative directory path. Two packages
/// with the same path are a configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub path: String,
    /// Ordered, case-sensitive tag list. Must be non-empty.
    pub tags: Vec<String>,
    /// Only accept dependents named by an explicit policy entry; shared-tag
    /// overlap does not grant access.
    #[serde(default)]
    pub strict: bool,
    /// Exclude this package from checking entirely.
    #[serde(default)]
    pub unchecked: bool,
}

impl Package {
    pub fn new(path: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            path: normalize_path(path.into()),
            tags,
            strict: false,
            unchecked: false,
        }
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_unchecked(mut self, unchecked: bool) -> Self {
        self.unchecked = unchecked;
        self
    }
}

fn normalize_path(path: String) -> String {
    path.trim_matches('/').to_string()
}

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<String, TrieNode>,
    /// Index into the package arena when a package is declared at this node.
    package: Option<usize>,
}

/// Prefix-indexed lookup over the declared package set.
///
/// Ownership uses longest-prefix-match over path segments: with packages at
/// `a` and `a/b`, a file at `a/b/c.py` belongs to `a/b`. Built once per run
/// and never mutated afterwards.
#[derive(Debug)]
pub struct PackageIndex {
    packages: Vec<Package>,
    root: TrieNode,
}

impl PackageIndex {
    /// Validates and indexes the declared packages. Duplicate paths and empty
    /// tag sets abort the run before any scanning happens.
    pub fn build(packages: Vec<Package>) -> Result<Self> {
        let mut root = TrieNode::default();
        for (idx, package) in packages.iter().enumerate() {
            if package.path.is_empty() {
                return Err(TagFenceError::Configuration(
                    "package path must not be empty".to_string(),
                ));
            }
            if package.tags.is_empty() {
                return Err(TagFenceError::Configuration(format!(
                    "package '{}' declares no tags",
                    package.path
                )));
            }
            let mut node = &mut root;
            for segment in package.path.split('/') {
                node = node.children.entry(segment.to_string()).or_default();
            }
            if node.package.is_some() {
                return Err(TagFenceError::Configuration(format!(
                    "duplicate package path '{}'",
                    package.path
                )));
            }
            node.package = Some(idx);
        }
        Ok(Self { packages, root })
    }

    /// The deepest declared package whose directory encloses `path`, if any.
    /// Files outside every package are unassigned.
    pub fn package_for(&self, path: &str) -> Option<&Package> {
        let mut node = &self.root;
        let mut owner = None;
        for segment in path.trim_matches('/').split('/') {
            match node.children.get(segment) {
                Some(child) => {
                    node = child;
                    if let Some(idx) = node.package {
                        owner = Some(idx);
                    }
                }
                None => break,
            }
        }
        owner.map(|idx| &self.packages[idx])
    }

    /// Exact lookup by canonical package path.
    pub fn get(&self, path: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.path == path)
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
