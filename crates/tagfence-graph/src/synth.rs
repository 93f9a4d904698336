use crate::DependencyGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tagfence_core::{PackageIndex, Policy};
use tracing::debug;

/// A policy entry never exercised by any observed edge; a candidate for
/// removal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnusedConstraint {
    pub tag: String,
    pub allowed: String,
}

/// Derives the minimal policy consistent with the observed graph: for every
/// checked package P and each of its tags, the allowed set is the union of
/// the tags of every package P actually depends on.
///
/// Checking the same graph against the returned policy yields zero
/// violations. Tags of checked packages with no dependencies still appear,
/// with empty allowed sets, so a bootstrapped policy names every tag.
pub fn synthesize(graph: &DependencyGraph, index: &PackageIndex) -> Policy {
    let mut policy = Policy::new();

    for package in index.packages().iter().filter(|p| !p.unchecked) {
        for tag in &package.tags {
            policy.ensure_tag(tag.clone());
        }
        for target_path in graph.targets_of(&package.path) {
            let Some(target) = index.get(target_path) else {
                continue;
            };
            if target.unchecked {
                continue;
            }
            for tag in &package.tags {
                for target_tag in &target.tags {
                    policy.allow(tag.clone(), target_tag.clone());
                }
            }
        }
    }

    debug!("synthesized policy with {} tags", policy.len());
    policy
}

/// Reports every `(tag, allowed-tag)` policy entry that no observed edge
/// exercises. The policy itself is never mutated.
pub fn prune(policy: &Policy, graph: &DependencyGraph, index: &PackageIndex) -> Vec<UnusedConstraint> {
    let mut exercised: BTreeSet<(&str, &str)> = BTreeSet::new();

    for (source_path, target_path, _) in graph.package_edges() {
        let (Some(source), Some(target)) = (index.get(source_path), index.get(target_path)) else {
            continue;
        };
        if source.unchecked || target.unchecked {
            continue;
        }
        for source_tag in &source.tags {
            for target_tag in &target.tags {
                exercised.insert((source_tag.as_str(), target_tag.as_str()));
            }
        }
    }

    let mut unused = Vec::new();
    for (tag, allowed_set) in policy.entries() {
        for allowed in allowed_set {
            if !exercised.contains(&(tag.as_str(), allowed.as_str())) {
                unused.push(UnusedConstraint {
                    tag: tag.clone(),
                    allowed: allowed.clone(),
                });
            }
        }
    }

    debug!("prune: {} unused constraints", unused.len());
    unused
}
