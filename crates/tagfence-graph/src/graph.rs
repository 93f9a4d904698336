use std::collections::{BTreeMap, BTreeSet};
use tagfence_core::{EdgeTarget, ResolvedEdge};

/// Directed multigraph over packages, aggregated from resolved edges.
///
/// Every import occurrence between a pair is retained (checking reports each
/// one); distinct targets per package are tracked separately for synthesis.
/// Built once from per-file batches, then read-only; it lives no longer than
/// the run that produced it.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// (source package, target package) → every import occurrence.
    edges: BTreeMap<(String, String), Vec<ResolvedEdge>>,
    /// source package → distinct target packages.
    targets: BTreeMap<String, BTreeSet<String>>,
    /// Packages owning at least one scanned source file.
    nodes: BTreeSet<String>,
    /// In-project edges pointing outside the project. Kept for provenance;
    /// never checked.
    externals: Vec<ResolvedEdge>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor from a finished pipeline outcome.
    pub fn from_edges<N, E>(nodes: N, edges: E) -> Self
    where
        N: IntoIterator<Item = String>,
        E: IntoIterator<Item = ResolvedEdge>,
    {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node);
        }
        graph.add_file_edges(edges);
        graph
    }

    /// Registers a package that owns at least one source file, whether or
    /// not any edge touches it.
    pub fn add_node(&mut self, package: String) {
        self.nodes.insert(package);
    }

    /// Merges a batch of resolved edges. Callers hand over whole files at a
    /// time, so a file's edges land together or not at all.
    pub fn add_file_edges<E>(&mut self, edges: E)
    where
        E: IntoIterator<Item = ResolvedEdge>,
    {
        for edge in edges {
            match &edge.target {
                EdgeTarget::Package(target) => {
                    self.nodes.insert(edge.source_package.clone());
                    self.nodes.insert(target.clone());
                    self.targets
                        .entry(edge.source_package.clone())
                        .or_default()
                        .insert(target.clone());
                    self.edges
                        .entry((edge.source_package.clone(), target.clone()))
                        .or_default()
                        .push(edge);
                }
                EdgeTarget::External => self.externals.push(edge),
            }
        }
    }

    /// Every import occurrence from `source` into `target`.
    pub fn edges_between(&self, source: &str, target: &str) -> &[ResolvedEdge] {
        self.edges
            .get(&(source.to_string(), target.to_string()))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Distinct packages `source` depends on.
    pub fn targets_of(&self, source: &str) -> impl Iterator<Item = &str> {
        self.targets
            .get(source)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Deterministic iteration over (source, target) pairs with their
    /// occurrences.
    pub fn package_edges(
        &self,
    ) -> impl Iterator<Item = (&str, &str, &[ResolvedEdge])> {
        self.edges
            .iter()
            .map(|((source, target), occurrences)| {
                (source.as_str(), target.as_str(), occurrences.as_slice())
            })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn contains_node(&self, package: &str) -> bool {
        self.nodes.contains(package)
    }

    /// Total package-to-package import occurrences.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn external_edges(&self) -> &[ResolvedEdge] {
        &self.externals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(file: &str, line: u32, source: &str, target: EdgeTarget) -> ResolvedEdge {
        ResolvedEdge {
            file: file.to_string(),
            line,
            source_package: source.to_string(),
            target,
            module_path: None,
        }
    }

    fn pkg_target(path: &str) -> EdgeTarget {
        EdgeTarget::Package(path.to_string())
    }

    #[test]
    fn keeps_every_occurrence_between_a_pair() {
        let mut graph = DependencyGraph::new();
        graph.add_file_edges(vec![
            edge("api/a.py", 1, "api", pkg_target("core")),
            edge("api/a.py", 9, "api", pkg_target("core")),
            edge("api/b.py", 4, "api", pkg_target("core")),
        ]);

        assert_eq!(graph.edges_between("api", "core").len(), 3);
        assert_eq!(graph.edge_count(), 3);
        let targets: Vec<_> = graph.targets_of("api").collect();
        assert_eq!(targets, vec!["core"]);
    }

    #[test]
    fn nodes_include_edge_endpoints_and_registered_owners() {
        let mut graph = DependencyGraph::new();
        graph.add_node("lonely".to_string());
        graph.add_file_edges(vec![edge("api/a.py", 1, "api", pkg_target("core"))]);

        let nodes: Vec<_> = graph.nodes().collect();
        assert_eq!(nodes, vec!["api", "core", "lonely"]);
    }

    #[test]
    fn external_edges_stay_out_of_adjacency() {
        let mut graph = DependencyGraph::new();
        graph.add_file_edges(vec![edge("api/a.py", 2, "api", EdgeTarget::External)]);

        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.external_edges().len(), 1);
        assert!(graph.targets_of("api").next().is_none());
    }

    #[test]
    fn pair_iteration_is_deterministic() {
        let mut graph = DependencyGraph::new();
        graph.add_file_edges(vec![
            edge("b/x.py", 1, "b", pkg_target("a")),
            edge("a/y.py", 1, "a", pkg_target("b")),
        ]);
        let pairs: Vec<_> = graph
            .package_edges()
            .map(|(s, t, _)| (s.to_string(), t.to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "a".to_string())
            ]
        );
    }
}
