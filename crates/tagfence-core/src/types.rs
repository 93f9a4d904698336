use serde::{Deserialize, Serialize};
use std::fmt;

/// A single import declaration as written in source, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDeclaration {
    /// Dotted module reference (`a.b.c`). Empty for a bare `from . import x` base.
    pub reference: String,
    /// Ancestor count for relative imports (`from ..x` has level 2); 0 means absolute.
    pub level: u32,
    /// 1-based line of the declaration.
    pub line: u32,
    /// Written as `from <base> import <name>`. Only then may the final
    /// segment be a member symbol rather than a submodule.
    pub from_import: bool,
    /// The declaration sits inside a conditional or deferred block (`if`, `try`,
    /// a function body). Still a full-weight edge; the flag is kept so callers
    /// can refine the semantics without re-scanning.
    pub conditional: bool,
}

impl ImportDeclaration {
    /// The reference the way it was written, leading dots included.
    pub fn written_form(&self) -> String {
        format!("{}{}", ".".repeat(self.level as usize), self.reference)
    }
}

/// Where a resolved import points.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeTarget {
    /// Another declared package, by canonical path.
    Package(String),
    /// Outside the project (third-party or standard library). Never a violation.
    External,
}

/// A resolved dependency occurrence, with provenance for reporting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResolvedEdge {
    /// Project-relative path of the importing file.
    pub file: String,
    pub line: u32,
    /// Canonical path of the package owning the importing file.
    pub source_package: String,
    pub target: EdgeTarget,
    /// Project-relative path of the resolved module file, when in-project.
    pub module_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViolationReason {
    /// No tag of the importing package may depend on any tag of the target.
    DisallowedDependency,
    /// The target is strict and no explicit policy entry names it.
    StrictModeRejection,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViolationReason::DisallowedDependency => "disallowed dependency",
            ViolationReason::StrictModeRejection => "strict mode rejection",
        };
        write!(f, "{}", s)
    }
}

/// One reported boundary breach. Every import occurrence of a denied
/// package pair produces its own violation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Violation {
    pub file: String,
    pub line: u32,
    pub source_package: String,
    pub target_package: String,
    pub reason: ViolationReason,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: '{}' may not depend on '{}' ({})",
            self.file, self.line, self.source_package, self.target_package, self.reason
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WarningKind {
    ScanIo,
    ParseError,
    UnresolvedImport,
}

/// A non-fatal analysis condition. Warnings are a side channel distinct from
/// violations; callers must not conflate the two.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub file: String,
    pub line: Option<u32>,
    pub message: String,
}

impl Warning {
    pub fn scan_io(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ScanIo,
            file: file.into(),
            line: None,
            message: message.into(),
        }
    }

    pub fn parse_error(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ParseError,
            file: file.into(),
            line: None,
            message: message.into(),
        }
    }

    pub fn unresolved_import(file: impl Into<String>, line: u32, reference: &str) -> Self {
        Self {
            kind: WarningKind::UnresolvedImport,
            file: file.into(),
            line: Some(line),
            message: format!("unresolved import '{}'", reference),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.file, line, self.message),
            None => write!(f, "{}: {}", self.file, self.message),
        }
    }
}
