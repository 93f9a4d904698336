use crate::Package;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Tag-to-allowed-tags mapping defining legal dependency directions.
///
/// Keyed by the *depending* package's tag: `rules["api"]` holds the tags an
/// `api`-tagged package may import. A package may always depend on packages
/// sharing one of its own tags, without an entry. Cycles between declared
/// permissions are legal; only the observed graph is checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Policy {
    rules: BTreeMap<String, BTreeSet<String>>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `tag` permission to depend on `allowed`.
    pub fn allow(&mut self, tag: impl Into<String>, allowed: impl Into<String>) {
        self.rules.entry(tag.into()).or_default().insert(allowed.into());
    }

    /// Make sure `tag` is present as a key, with no grants added.
    pub fn ensure_tag(&mut self, tag: impl Into<String>) {
        self.rules.entry(tag.into()).or_default();
    }

    pub fn with_rule<I, S>(mut self, tag: &str, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.rules.entry(tag.to_string()).or_default();
        for item in allowed {
            entry.insert(item.into());
        }
        self
    }

    pub fn allowed(&self, tag: &str) -> Option<&BTreeSet<String>> {
        self.rules.get(tag)
    }

    pub fn contains(&self, tag: &str, allowed: &str) -> bool {
        self.rules.get(tag).is_some_and(|set| set.contains(allowed))
    }

    /// Deterministic iteration over (tag, allowed-set) entries.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Outcome of evaluating one package-pair edge against the policy.
///
/// Kept explicit rather than boolean so violation reasons stay precise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeVerdict {
    Allowed,
    /// No tag of the source may depend on any tag of the target.
    DeniedByPolicy,
    /// Tag overlap would have granted access, but the target is strict and
    /// no explicit policy entry names one of its tags.
    DeniedByStrict,
}

/// Two-step edge evaluation.
///
/// Step one is tag reachability: the edge is allowed if some policy entry of
/// a source tag names a target tag, or if source and target share a tag
/// (implicit self-dependency). Step two is the strict override: a strict
/// target only accepts the explicit form, closing the shared-tag loophole.
pub fn evaluate_edge(source: &Package, target: &Package, policy: &Policy) -> EdgeVerdict {
    let explicit = source.tags.iter().any(|s| {
        policy
            .allowed(s)
            .is_some_and(|set| target.tags.iter().any(|t| set.contains(t)))
    });
    if explicit {
        return EdgeVerdict::Allowed;
    }

    let shared = source.tags.iter().any(|s| target.tags.contains(s));
    if shared {
        if target.strict {
            EdgeVerdict::DeniedByStrict
        } else {
            EdgeVerdict::Allowed
        }
    } else {
        EdgeVerdict::DeniedByPolicy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(path: &str, tags: &[&str]) -> Package {
        Package::new(path, tags.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn explicit_entry_allows_dependency() {
        let policy = Policy::new().with_rule("api", ["core"]);
        let api = pkg("api", &["api"]);
        let core = pkg("core", &["core"]);
        assert_eq!(evaluate_edge(&api, &core, &policy), EdgeVerdict::Allowed);
        assert_eq!(
            evaluate_edge(&core, &api, &policy),
            EdgeVerdict::DeniedByPolicy
        );
    }

    #[test]
    fn shared_tag_is_implicitly_allowed() {
        let policy = Policy::new();
        let a = pkg("a", &["shared"]);
        let b = pkg("b", &["shared"]);
        assert_eq!(evaluate_edge(&a, &b, &policy), EdgeVerdict::Allowed);
    }

    #[test]
    fn strict_target_rejects_shared_tag_overlap() {
        let policy = Policy::new()
            .with_rule("api", ["core"])
            .with_rule("other", ["core"]);
        let a = pkg("a", &["shared"]);
        let b = pkg("b", &["shared"]).with_strict(true);
        assert_eq!(evaluate_edge(&a, &b, &policy), EdgeVerdict::DeniedByStrict);
    }

    #[test]
    fn strict_target_accepts_explicit_entry() {
        let policy = Policy::new().with_rule("api", ["core"]);
        let api = pkg("api", &["api"]);
        let core = pkg("core", &["core"]).with_strict(true);
        assert_eq!(evaluate_edge(&api, &core, &policy), EdgeVerdict::Allowed);
    }

    #[test]
    fn strict_without_any_grant_is_plain_denial() {
        let policy = Policy::new();
        let a = pkg("a", &["x"]);
        let b = pkg("b", &["y"]).with_strict(true);
        assert_eq!(evaluate_edge(&a, &b, &policy), EdgeVerdict::DeniedByPolicy);
    }

    #[test]
    fn policy_cycles_are_legal() {
        let policy = Policy::new()
            .with_rule("a", ["b"])
            .with_rule("b", ["a"]);
        let one = pkg("one", &["a"]);
        let two = pkg("two", &["b"]);
        assert_eq!(evaluate_edge(&one, &two, &policy), EdgeVerdict::Allowed);
        assert_eq!(evaluate_edge(&two, &one, &policy), EdgeVerdict::Allowed);
    }
}
