use crate::DependencyGraph;
use tagfence_core::{
    evaluate_edge, AnalysisObserver, EdgeVerdict, PackageIndex, Policy, Violation, ViolationReason,
};
use tracing::debug;

/// Evaluates every observed package-pair edge against the policy.
pub struct BoundaryChecker<'a> {
    index: &'a PackageIndex,
    policy: &'a Policy,
}

impl<'a> BoundaryChecker<'a> {
    pub fn new(index: &'a PackageIndex, policy: &'a Policy) -> Self {
        Self { index, policy }
    }

    /// Produces one violation per denied import occurrence, ordered by
    /// (file, line). An empty result means the tree is compliant. No side
    /// effects beyond the returned report.
    pub fn check(&self, graph: &DependencyGraph) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (source_path, target_path, occurrences) in graph.package_edges() {
            let Some(source) = self.index.get(source_path) else {
                continue;
            };
            let Some(target) = self.index.get(target_path) else {
                continue;
            };
            if source.unchecked || target.unchecked {
                continue;
            }

            let reason = match evaluate_edge(source, target, self.policy) {
                EdgeVerdict::Allowed => continue,
                EdgeVerdict::DeniedByPolicy => ViolationReason::DisallowedDependency,
                EdgeVerdict::DeniedByStrict => ViolationReason::StrictModeRejection,
            };
            for occurrence in occurrences {
                violations.push(Violation {
                    file: occurrence.file.clone(),
                    line: occurrence.line,
                    source_package: source_path.to_string(),
                    target_package: target_path.to_string(),
                    reason,
                });
            }
        }

        violations.sort();
        debug!("boundary check: {} violations", violations.len());
        violations
    }

    /// Like [`check`](Self::check), forwarding each violation to the
    /// observer after the report is assembled.
    pub fn check_with(
        &self,
        graph: &DependencyGraph,
        observer: &dyn AnalysisObserver,
    ) -> Vec<Violation> {
        let violations = self.check(graph);
        for violation in &violations {
            observer.on_violation(violation);
        }
        violations
    }
}
