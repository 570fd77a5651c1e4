//! Tree traversal and declarator name resolution.

use tree_sitter::Node;

use super::tree::ParsedSource;
use super::FunctionRecord;

/// The closed set of node kinds the traversal dispatches on.
///
/// Everything else is `Other` and only gets recursed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    FunctionDefinition,
    TemplateDeclaration,
    FunctionDeclarator,
    PointerDeclarator,
    ReferenceDeclarator,
    QualifiedIdentifier,
    Identifier,
    FieldIdentifier,
    Other,
}

impl NodeKind {
    fn of(node: &Node) -> Self {
        match node.kind() {
            "function_definition" => NodeKind::FunctionDefinition,
            "template_declaration" => NodeKind::TemplateDeclaration,
            "function_declarator" => NodeKind::FunctionDeclarator,
            "pointer_declarator" => NodeKind::PointerDeclarator,
            "reference_declarator" => NodeKind::ReferenceDeclarator,
            "qualified_identifier" => NodeKind::QualifiedIdentifier,
            "identifier" => NodeKind::Identifier,
            // Method names inside a class body bind as field identifiers.
            "field_identifier" => NodeKind::FieldIdentifier,
            _ => NodeKind::Other,
        }
    }
}

/// Collect all function definitions in pre-order (source) order.
pub(super) fn collect_functions(parsed: &ParsedSource) -> Vec<FunctionRecord> {
    let mut records = Vec::new();
    visit(parsed.root(), parsed, &mut records);
    records
}

fn visit(node: Node, parsed: &ParsedSource, out: &mut Vec<FunctionRecord>) {
    match NodeKind::of(&node) {
        // A matched definition is terminal: lambdas and local classes inside
        // the body must not produce their own top-level records.
        NodeKind::FunctionDefinition => {
            if let Some(name) = resolve_name(node, parsed) {
                out.push(record_for(node, name, parsed));
            }
        }
        // Template wrappers are unwrapped to the inner definition for the
        // name, but the record spans the wrapper so the template parameter
        // header is part of the captured code. Terminal either way: a class
        // template that resolves no function name yields nothing.
        NodeKind::TemplateDeclaration => {
            let mut cursor = node.walk();
            let inner = node
                .children(&mut cursor)
                .find(|c| NodeKind::of(c) == NodeKind::FunctionDefinition);
            if let Some(definition) = inner {
                if let Some(name) = resolve_name(definition, parsed) {
                    out.push(record_for(node, name, parsed));
                }
            }
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                visit(child, parsed, out);
            }
        }
    }
}

fn record_for(node: Node, name: String, parsed: &ParsedSource) -> FunctionRecord {
    FunctionRecord {
        name,
        code: parsed.node_text(node),
        // tree-sitter positions are 0-indexed
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
    }
}

/// Resolve the identifier bound by a definition's declarator chain.
///
/// Scans immediate children in order: a declarator wrapper (function,
/// pointer, or reference) is recursed into, which unwinds arbitrarily nested
/// pointer/reference layers (`T* f()`, `T** f()`, `T& f()`); a qualified,
/// bare, or field identifier (in-class methods) terminates the search.
/// `None` means the grammar bound no name here and the record is dropped by
/// the caller.
fn resolve_name(node: Node, parsed: &ParsedSource) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match NodeKind::of(&child) {
            NodeKind::FunctionDeclarator
            | NodeKind::PointerDeclarator
            | NodeKind::ReferenceDeclarator => return resolve_name(child, parsed),
            NodeKind::QualifiedIdentifier | NodeKind::Identifier | NodeKind::FieldIdentifier => {
                return Some(parsed.node_text(child))
            }
            _ => {}
        }
    }
    None
}
