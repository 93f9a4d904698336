use crate::{Result, TagFenceError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Declared source roots for absolute import resolution, in priority
    /// order. Project-relative; `.` means the project root itself.
    pub source_roots: Vec<String>,
    /// Directory-relative exclusion globs. Excluded subtrees are pruned from
    /// the walk, never visited.
    pub exclude_patterns: Vec<String>,
    /// Worker pool size for per-file extraction and resolution.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Optional run deadline. Outstanding workers are abandoned once it
    /// elapses; aggregation stays whole-file consistent.
    #[serde(default)]
    pub deadline: Option<Duration>,
}

fn default_workers() -> usize {
    num_cpus::get()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            source_roots: vec![".".to_string()],
            exclude_patterns: Vec::new(),
            workers: default_workers(),
            deadline: None,
        }
    }
}

impl AnalysisConfig {
    pub fn with_source_roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_roots = roots.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_roots.is_empty() {
            return Err(TagFenceError::Configuration(
                "at least one source root is required".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(TagFenceError::Configuration(
                "worker count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.workers >= 1);
        assert_eq!(config.source_roots, vec![".".to_string()]);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = AnalysisConfig::default().with_workers(0);
        assert!(matches!(
            config.validate(),
            Err(TagFenceError::Configuration(_))
        ));
    }

    #[test]
    fn empty_roots_are_rejected() {
        let config = AnalysisConfig::default().with_source_roots(Vec::<String>::new());
        assert!(matches!(
            config.validate(),
            Err(TagFenceError::Configuration(_))
        ));
    }
}
