use crate::grammar::SyntaxTree;
use crate::language::LanguageConfig;
use tree_sitter::Node;

/// A boundary node found in the syntax tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxSpan {
    /// Grammar node type
    pub node_type: String,
    pub start_byte: usize,
    pub end_byte: usize,
    /// First line (1-indexed)
    pub start_line: usize,
    /// Last line (1-indexed, inclusive)
    pub end_line: usize,
    /// Distance from the tree root
    pub depth: usize,
    /// Declared name, when the grammar exposes a `name` field
    pub name: Option<String>,
}

impl SyntaxSpan {
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Whether `other` lies within this span's bytes
    pub fn contains(&self, other: &SyntaxSpan) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }
}

/// Collect boundary spans in pre-order.
///
/// Spans come out sorted by start offset, ancestors before descendants that
/// start at the same offset. Nested boundaries are kept; the assembler decides
/// which of them become chunks.
pub fn extract(tree: &SyntaxTree, config: &LanguageConfig, source: &str) -> Vec<SyntaxSpan> {
    let mut spans = Vec::new();
    let mut cursor = tree.root().walk();
    let mut depth = 0usize;

    loop {
        let node = cursor.node();
        if is_boundary(node, config) {
            spans.push(span_for(node, depth, source));
        }

        if cursor.goto_first_child() {
            depth += 1;
            continue;
        }

        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                log::trace!(
                    "Extracted {} {} boundary spans",
                    spans.len(),
                    config.identifier()
                );
                return spans;
            }
            depth -= 1;
        }
    }
}

fn is_boundary(node: Node, config: &LanguageConfig) -> bool {
    !node.is_error()
        && !node.is_missing()
        && node.end_byte() > node.start_byte()
        && config.is_boundary(node.kind())
}

fn span_for(node: Node, depth: usize, source: &str) -> SyntaxSpan {
    let start = node.start_position();
    let end = node.end_position();

    // A node that ends right after a newline does not occupy the next row.
    let end_row = if end.column == 0 && end.row > start.row {
        end.row - 1
    } else {
        end.row
    };

    SyntaxSpan {
        node_type: node.kind().to_string(),
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
        start_line: start.row + 1,
        end_line: end_row + 1,
        depth,
        name: symbol_name(node, source),
    }
}

fn symbol_name(node: Node, source: &str) -> Option<String> {
    let name = node.child_by_field_name("name")?;
    let text = name.utf8_text(source.as_bytes()).ok()?.trim();
    if text.is_empty() || text.contains('\n') {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarAdapter;
    use crate::language::LanguageRegistry;

    fn spans(language: &str, source: &str) -> Vec<SyntaxSpan> {
        let registry = LanguageRegistry::with_defaults();
        let config = registry.resolve(Some(language), None).unwrap();
        let tree = GrammarAdapter::parse(source, &config).unwrap();
        extract(&tree, &config, source)
    }

    #[test]
    fn test_top_level_rust_items() {
        let source = "use std::fmt;\n\nfn main() {\n    run();\n}\n\nstruct Point {\n    x: i32,\n}\n";
        let found = spans("rust", source);

        let kinds: Vec<_> = found.iter().map(|s| s.node_type.as_str()).collect();
        assert_eq!(kinds, ["function_item", "struct_item"]);
        assert_eq!((found[0].start_line, found[0].end_line), (3, 5));
        assert_eq!(found[0].name.as_deref(), Some("main"));
        assert_eq!((found[1].start_line, found[1].end_line), (7, 9));
        assert_eq!(found[1].name.as_deref(), Some("Point"));
    }

    #[test]
    fn test_nested_boundaries_follow_their_parent() {
        let source = "mod api {\n    impl Car {\n        fn drive(&self) {}\n    }\n}\n";
        let found = spans("rust", source);

        let kinds: Vec<_> = found.iter().map(|s| s.node_type.as_str()).collect();
        assert_eq!(kinds, ["mod_item", "impl_item", "function_item"]);
        assert!(found[0].contains(&found[1]));
        assert!(found[1].contains(&found[2]));
        assert!(found[0].depth < found[1].depth && found[1].depth < found[2].depth);
        assert_eq!(found[2].name.as_deref(), Some("drive"));
    }

    #[test]
    fn test_spans_sorted_by_start() {
        let source = "class A:\n    def a(self):\n        pass\n\n    def b(self):\n        pass\n\ndef c():\n    pass\n";
        let found = spans("python", source);

        assert_eq!(found.len(), 4);
        for pair in found.windows(2) {
            assert!(pair[0].start_byte <= pair[1].start_byte);
        }
        assert_eq!(found[0].node_type, "class_definition");
        assert_eq!(found[3].name.as_deref(), Some("c"));
    }

    #[test]
    fn test_error_nodes_never_match() {
        let source = "fn ok() {}\n\nfn broken( {\n\nfn also_ok() {}\n";
        let found = spans("rust", source);

        assert!(found.iter().all(|s| s.node_type != "ERROR"));
        assert!(found
            .iter()
            .any(|s| s.name.as_deref() == Some("ok") && s.start_line == 1));
    }

    #[test]
    fn test_no_boundaries_yields_empty() {
        assert!(spans("rust", "// only a comment\n").is_empty());
    }
}
