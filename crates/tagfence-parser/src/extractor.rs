use tagfence_core::{ImportDeclaration, Result, TagFenceError};
use tree_sitter::{Node, Parser};

/// Syntactic import extraction over Python surface syntax.
///
/// Recognizes `import a.b`, `import a.b as x`, `from a.b import c, d`,
/// `from . import x`, `from ..pkg import y as z` and `from m import *`.
/// Declarations inside conditional or deferred blocks are extracted with the
/// `conditional` flag set; nothing is evaluated.
pub struct ImportExtractor {
    parser: Parser,
}

/// Node kinds whose bodies make an import conditional or deferred:
/// guarded blocks may or may not execute, and function bodies defer the
/// import past module load.
const GUARD_KINDS: &[&str] = &[
    "if_statement",
    "try_statement",
    "match_statement",
    "with_statement",
    "function_definition",
];

impl ImportExtractor {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| {
                TagFenceError::Configuration(format!("failed to load Python grammar: {}", e))
            })?;
        Ok(Self { parser })
    }

    /// Extracts every import declaration in `source`.
    ///
    /// A file whose parse tree contains syntax errors yields a `Parse` error
    /// for that file only; callers record a warning and keep going.
    pub fn extract(&mut self, file: &str, source: &str) -> Result<Vec<ImportDeclaration>> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| TagFenceError::Parse {
                file: file.to_string(),
                message: "parser produced no tree".to_string(),
            })?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(TagFenceError::Parse {
                file: file.to_string(),
                message: "unrecognized import syntax".to_string(),
            });
        }

        let mut imports = Vec::new();
        collect_imports(root, source.as_bytes(), false, &mut imports);
        Ok(imports)
    }
}

fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn collect_imports(node: Node, source: &[u8], conditional: bool, out: &mut Vec<ImportDeclaration>) {
    match node.kind() {
        "import_statement" => extract_import(node, source, conditional, out),
        "import_from_statement" => extract_import_from(node, source, conditional, out),
        kind => {
            let guarded = conditional || GUARD_KINDS.contains(&kind);
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_imports(child, source, guarded, out);
            }
        }
    }
}

/// `import a.b, c.d as x` — one declaration per listed module.
fn extract_import(node: Node, source: &[u8], conditional: bool, out: &mut Vec<ImportDeclaration>) {
    let line = node.start_position().row as u32 + 1;
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        if let Some(reference) = imported_module(name, source) {
            out.push(ImportDeclaration {
                reference,
                level: 0,
                line,
                from_import: false,
                conditional,
            });
        }
    }
}

/// `from <base> import a, b as c` — one declaration per imported name, each
/// joined onto the base so the resolver can decide whether the name is a
/// submodule or a member symbol.
fn extract_import_from(
    node: Node,
    source: &[u8],
    conditional: bool,
    out: &mut Vec<ImportDeclaration>,
) {
    let line = node.start_position().row as u32 + 1;
    let Some(module_name) = node.child_by_field_name("module_name") else {
        return;
    };

    let (base, level) = if module_name.kind() == "relative_import" {
        let mut level = 0u32;
        let mut base = String::new();
        let mut cursor = module_name.walk();
        for child in module_name.named_children(&mut cursor) {
            match child.kind() {
                "import_prefix" => {
                    level = node_text(child, source).matches('.').count() as u32;
                }
                "dotted_name" => base = node_text(child, source).to_string(),
                _ => {}
            }
        }
        (base, level)
    } else {
        (node_text(module_name, source).to_string(), 0)
    };

    let mut cursor = node.walk();
    let wildcard = node
        .named_children(&mut cursor)
        .any(|child| child.kind() == "wildcard_import");
    if wildcard {
        out.push(ImportDeclaration {
            reference: base,
            level,
            line,
            from_import: true,
            conditional,
        });
        return;
    }

    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let Some(imported) = imported_module(name, source) else {
            continue;
        };
        let reference = if base.is_empty() {
            imported
        } else {
            format!("{}.{}", base, imported)
        };
        out.push(ImportDeclaration {
            reference,
            level,
            line,
            from_import: true,
            conditional,
        });
    }
}

fn imported_module(name: Node, source: &[u8]) -> Option<String> {
    match name.kind() {
        "dotted_name" => Some(node_text(name, source).to_string()),
        "aliased_import" => name
            .child_by_field_name("name")
            .map(|n| node_text(n, source).to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> Vec<ImportDeclaration> {
        ImportExtractor::new()
            .unwrap()
            .extract("test.py", source)
            .unwrap()
    }

    fn refs(imports: &[ImportDeclaration]) -> Vec<(&str, u32)> {
        imports
            .iter()
            .map(|i| (i.reference.as_str(), i.level))
            .collect()
    }

    #[test]
    fn absolute_imports() {
        let imports = extract("import os\nimport a.b.c\nimport x.y as z\n");
        assert_eq!(refs(&imports), vec![("os", 0), ("a.b.c", 0), ("x.y", 0)]);
        assert_eq!(imports[1].line, 2);
        assert!(!imports[0].conditional);
        assert!(imports.iter().all(|i| !i.from_import));
    }

    #[test]
    fn multi_name_import_statement() {
        let imports = extract("import a, b.c\n");
        assert_eq!(refs(&imports), vec![("a", 0), ("b.c", 0)]);
        assert_eq!(imports[0].line, imports[1].line);
    }

    #[test]
    fn from_import_joins_each_name() {
        let imports = extract("from a.b import c, d as e\n");
        assert_eq!(refs(&imports), vec![("a.b.c", 0), ("a.b.d", 0)]);
        assert!(imports.iter().all(|i| i.from_import));
    }

    #[test]
    fn relative_imports_carry_ancestor_count() {
        let imports = extract("from . import sibling\nfrom ..pkg import name\n");
        assert_eq!(refs(&imports), vec![("sibling", 1), ("pkg.name", 2)]);
    }

    #[test]
    fn wildcard_import_targets_the_module() {
        let imports = extract("from a.b import *\nfrom . import *\n");
        assert_eq!(refs(&imports), vec![("a.b", 0), ("", 1)]);
    }

    #[test]
    fn guarded_imports_are_marked_conditional() {
        let source = "\
import top

if True:
    import guarded

try:
    import optional
except ImportError:
    pass

def late():
    import deferred

from typing import TYPE_CHECKING
if TYPE_CHECKING:
    from a import b
";
        let imports = extract(source);
        let by_ref: Vec<(&str, bool)> = imports
            .iter()
            .map(|i| (i.reference.as_str(), i.conditional))
            .collect();
        assert_eq!(
            by_ref,
            vec![
                ("top", false),
                ("guarded", true),
                ("optional", true),
                ("deferred", true),
                ("typing.TYPE_CHECKING", false),
                ("a.b", true),
            ]
        );
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let err = ImportExtractor::new()
            .unwrap()
            .extract("bad.py", "def broken(:\n")
            .unwrap_err();
        assert!(matches!(err, TagFenceError::Parse { .. }));
    }

    #[test]
    fn no_imports_yields_empty_list() {
        assert!(extract("x = 1\n").is_empty());
    }
}
