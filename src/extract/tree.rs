//! Thin wrapper over the tree-sitter C++ grammar.
//!
//! The C++ grammar also parses the C subset, so every recognized source
//! extension goes through the same language.

use tree_sitter::{Language, Parser, Tree};

/// An immutable parse tree together with the bytes it was parsed from.
///
/// Kept as one unit so node text can be sliced without re-reading the file.
pub struct ParsedSource {
    tree: Tree,
    source: Vec<u8>,
}

impl ParsedSource {
    /// Root node of the tree.
    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Decode a node's exact byte range as text, replacing invalid UTF-8.
    pub fn node_text(&self, node: tree_sitter::Node) -> String {
        String::from_utf8_lossy(&self.source[node.byte_range()]).into_owned()
    }

    /// True when the grammar had to error-recover anywhere in the tree.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

/// Parse raw bytes with the C++ grammar.
///
/// Returns `None` only when the parser itself cannot run (language version
/// mismatch or cancelled parse); syntactically broken input still yields a
/// tree with ERROR nodes.
pub fn parse(source: &[u8]) -> Option<ParsedSource> {
    let language: Language = tree_sitter_cpp::LANGUAGE.into();
    let mut parser = Parser::new();
    parser.set_language(&language).ok()?;
    let tree = parser.parse(source, None)?;
    Some(ParsedSource {
        tree,
        source: source.to_vec(),
    })
}
