//! Typed view over tree-sitter nodes.
//!
//! The annotator only cares about a handful of constructs. [`SyntaxKind`]
//! folds the grammar's node names (which differ slightly between the
//! TypeScript, TSX and JavaScript grammars) into one enumeration so the
//! traversal can dispatch with a plain `match`.

use std::fmt;

/// The node kinds the annotator distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Program,
    CallExpression,
    MemberExpression,
    Arguments,
    /// `function (...) {}` and `function* (...) {}` in expression position
    FunctionExpression,
    ArrowFunction,
    /// `class X {}`, `abstract class X {}` and `export default class {}`;
    /// other class expressions are not declarations
    ClassDeclaration,
    ClassBody,
    /// Methods, accessors and constructors
    MethodDefinition,
    /// Class properties (`static $inject = [...]`)
    FieldDefinition,
    StatementBlock,
    ExpressionStatement,
    StringLiteral,
    ArrayLiteral,
    FormalParameters,
    RequiredParameter,
    OptionalParameter,
    RestPattern,
    AssignmentPattern,
    Other,
}

impl SyntaxKind {
    /// Map a grammar node name onto a kind.
    pub fn from_grammar(kind: &str) -> Self {
        match kind {
            "program" => SyntaxKind::Program,
            "call_expression" => SyntaxKind::CallExpression,
            "member_expression" => SyntaxKind::MemberExpression,
            "arguments" => SyntaxKind::Arguments,
            "function_expression" | "function" | "generator_function" => {
                SyntaxKind::FunctionExpression
            }
            "arrow_function" => SyntaxKind::ArrowFunction,
            "class_declaration" | "abstract_class_declaration" => SyntaxKind::ClassDeclaration,
            "class_body" => SyntaxKind::ClassBody,
            "method_definition" => SyntaxKind::MethodDefinition,
            "public_field_definition" | "field_definition" => SyntaxKind::FieldDefinition,
            "statement_block" => SyntaxKind::StatementBlock,
            "expression_statement" => SyntaxKind::ExpressionStatement,
            "string" => SyntaxKind::StringLiteral,
            "array" => SyntaxKind::ArrayLiteral,
            "formal_parameters" => SyntaxKind::FormalParameters,
            "required_parameter" => SyntaxKind::RequiredParameter,
            "optional_parameter" => SyntaxKind::OptionalParameter,
            "rest_pattern" => SyntaxKind::RestPattern,
            "assignment_pattern" => SyntaxKind::AssignmentPattern,
            _ => SyntaxKind::Other,
        }
    }

    /// Function and arrow literals: the constructs that can carry an annotation.
    pub fn is_callable(self) -> bool {
        matches!(self, SyntaxKind::FunctionExpression | SyntaxKind::ArrowFunction)
    }
}

/// A node of the parse tree together with the buffer it was parsed from.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    node: tree_sitter::Node<'t>,
    source: &'t str,
}

impl<'t> SyntaxNode<'t> {
    pub fn new(node: tree_sitter::Node<'t>, source: &'t str) -> Self {
        Self { node, source }
    }

    pub fn kind(&self) -> SyntaxKind {
        match self.node.kind() {
            // `export default class { ... }` has no name, so the grammar
            // parses it as a class expression
            "class" if self.is_exported() => SyntaxKind::ClassDeclaration,
            kind => SyntaxKind::from_grammar(kind),
        }
    }

    fn is_exported(&self) -> bool {
        self.node
            .parent()
            .is_some_and(|parent| parent.kind() == "export_statement")
    }

    /// Byte offset of the first character of the node (trivia excluded).
    pub fn start(&self) -> usize {
        self.node.start_byte()
    }

    /// Byte offset one past the node's last character.
    pub fn end(&self) -> usize {
        self.node.end_byte()
    }

    pub fn text(&self) -> &'t str {
        &self.source[self.node.byte_range()]
    }

    /// The whole buffer this node belongs to.
    pub fn source(&self) -> &'t str {
        self.source
    }

    /// Named children in source order, comments excluded.
    pub fn children(&self) -> Vec<SyntaxNode<'t>> {
        let mut cursor = self.node.walk();
        let children = self
            .node
            .named_children(&mut cursor)
            .filter(|child| !child.is_extra())
            .map(|child| SyntaxNode::new(child, self.source))
            .collect();
        children
    }

    pub fn first_child(&self) -> Option<SyntaxNode<'t>> {
        self.children().into_iter().next()
    }

    pub fn field(&self, name: &str) -> Option<SyntaxNode<'t>> {
        self.node
            .child_by_field_name(name)
            .map(|child| SyntaxNode::new(child, self.source))
    }

    pub fn parent(&self) -> Option<SyntaxNode<'t>> {
        self.node
            .parent()
            .map(|parent| SyntaxNode::new(parent, self.source))
    }

    /// Value of a string literal with its quotes removed.
    pub fn string_value(&self) -> Option<&'t str> {
        if self.kind() != SyntaxKind::StringLiteral {
            return None;
        }
        let text = self.text();
        if text.len() < 2 {
            return None;
        }
        text.get(1..text.len() - 1)
    }
}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}..{}]",
            self.node.kind(),
            self.node.start_byte(),
            self.node.end_byte()
        )
    }
}

/// Names declared by a callable's parameter list, in declaration order.
///
/// Works for function/arrow literals and for constructors. Modifiers, type
/// annotations and default values are not part of a name; a rest parameter
/// contributes the identifier after `...`.
pub fn parameter_names<'t>(callable: SyntaxNode<'t>) -> Vec<&'t str> {
    // `x => ...` has a bare identifier instead of a parameter list
    if let Some(single) = callable.field("parameter") {
        return vec![single.text()];
    }
    let Some(parameters) = callable.field("parameters") else {
        return Vec::new();
    };
    parameters
        .children()
        .into_iter()
        .filter_map(parameter_name)
        .collect()
}

fn parameter_name(parameter: SyntaxNode<'_>) -> Option<&str> {
    match parameter.kind() {
        SyntaxKind::RequiredParameter | SyntaxKind::OptionalParameter => {
            parameter.field("pattern").map(binding_name)
        }
        _ => Some(binding_name(parameter)),
    }
}

fn binding_name(pattern: SyntaxNode<'_>) -> &str {
    match pattern.kind() {
        SyntaxKind::RestPattern => pattern
            .first_child()
            .map(|inner| inner.text())
            .unwrap_or_else(|| pattern.text().trim_start_matches("...")),
        SyntaxKind::AssignmentPattern => pattern
            .field("left")
            .map(|left| left.text())
            .unwrap_or_else(|| pattern.text()),
        _ => pattern.text(),
    }
}
