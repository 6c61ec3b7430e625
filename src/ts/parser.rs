use crate::syntax::SyntaxNode;
use crate::ts::errors::TreeSitterError;
use ast_grep_language::{LanguageExt, SupportLang};
use std::path::{Path, PathBuf};
use tree_sitter::{Parser, Tree};

/// Grammar used to parse a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    TypeScript,
    Tsx,
    JavaScript,
}

impl Dialect {
    /// Pick the grammar from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" | "mts" | "cts" => Some(Dialect::TypeScript),
            "tsx" => Some(Dialect::Tsx),
            "js" | "mjs" | "cjs" | "jsx" => Some(Dialect::JavaScript),
            _ => None,
        }
    }

    /// Pick the grammar for a path, failing on extensions we cannot parse.
    pub fn from_path(path: &Path) -> Result<Self, TreeSitterError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| TreeSitterError::UnsupportedExtension {
                path: path.to_path_buf(),
            })
    }

    fn support_lang(self) -> SupportLang {
        match self {
            Dialect::TypeScript => SupportLang::TypeScript,
            Dialect::Tsx => SupportLang::Tsx,
            Dialect::JavaScript => SupportLang::JavaScript,
        }
    }
}

/// True for ambient declaration files, which carry no code to annotate.
pub fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| {
            name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts")
        })
        .unwrap_or(false)
}

/// Tree-sitter parser wrapper for TypeScript and JavaScript sources.
pub struct ScriptParser {
    parser: Parser,
    dialect: Dialect,
}

impl ScriptParser {
    /// Create a new TypeScript parser.
    pub fn new() -> Result<Self, TreeSitterError> {
        Self::with_dialect(Dialect::default())
    }

    /// Create a new parser for a specific dialect.
    pub fn with_dialect(dialect: Dialect) -> Result<Self, TreeSitterError> {
        let mut parser = Parser::new();
        let ts_lang = dialect.support_lang().get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| TreeSitterError::LanguageSet)?;

        Ok(Self { parser, dialect })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Parse source code into a tree-sitter Tree.
    pub fn parse(&mut self, source: &str) -> Result<Tree, TreeSitterError> {
        self.parser
            .parse(source, None)
            .ok_or(TreeSitterError::ParseFailed)
    }

    /// Parse source code and return the tree along with the source.
    pub fn parse_with_source<'a>(
        &mut self,
        source: &'a str,
    ) -> Result<ParsedSource<'a>, TreeSitterError> {
        let tree = self.parse(source)?;
        Ok(ParsedSource {
            source,
            tree,
            dialect: self.dialect,
        })
    }
}

/// A parsed source buffer with its tree-sitter tree.
pub struct ParsedSource<'a> {
    pub source: &'a str,
    pub tree: Tree,
    pub dialect: Dialect,
}

impl<'a> ParsedSource<'a> {
    /// Get the root node of the tree.
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// The root as a typed syntax view.
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode::new(self.tree.root_node(), self.source)
    }

    /// Check if the tree contains any ERROR nodes.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Get all ERROR and MISSING nodes in the tree.
    pub fn error_nodes(&self) -> Vec<ErrorNode> {
        let mut errors = Vec::new();
        collect_error_nodes(self.tree.root_node(), &mut errors);
        errors
    }

    /// Reject the buffer if the grammar could not make sense of it.
    pub fn ensure_well_formed(&self) -> Result<(), TreeSitterError> {
        let errors = self.error_nodes();
        match errors.as_slice() {
            [] => Ok(()),
            [error] => Err(error.to_error()),
            _ => Err(TreeSitterError::MultipleSyntaxErrors {
                count: errors.len(),
            }),
        }
    }
}

/// Information about an ERROR or MISSING node in the parse tree.
#[derive(Debug, Clone)]
pub struct ErrorNode {
    pub byte_start: usize,
    pub byte_end: usize,
    pub start_point: tree_sitter::Point,
    pub end_point: tree_sitter::Point,
}

impl ErrorNode {
    fn to_error(&self) -> TreeSitterError {
        TreeSitterError::SyntaxError {
            byte_start: self.byte_start,
            byte_end: self.byte_end,
            line: self.start_point.row + 1,
            column: self.start_point.column + 1,
        }
    }
}

fn collect_error_nodes(node: tree_sitter::Node<'_>, errors: &mut Vec<ErrorNode>) {
    if node.is_error() || node.is_missing() {
        errors.push(ErrorNode {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            start_point: node.start_position(),
            end_point: node.end_position(),
        });
        return;
    }

    if !node.has_error() {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_nodes(child, errors);
    }
}

/// Read and identify a source file without parsing it.
pub fn read_source(path: &Path) -> Result<(Dialect, String), TreeSitterError> {
    let dialect = Dialect::from_path(path)?;
    let source = std::fs::read_to_string(path).map_err(|source| TreeSitterError::Io {
        path: PathBuf::from(path),
        source,
    })?;
    Ok((dialect, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_typescript() {
        let mut parser = ScriptParser::new().unwrap();
        let source = "class Foo { constructor(private bar: Bar) {} }";
        let parsed = parser.parse_with_source(source).unwrap();

        assert!(!parsed.has_errors());
        assert!(parsed.ensure_well_formed().is_ok());
        assert_eq!(parsed.root_node().kind(), "program");
    }

    #[test]
    fn parse_invalid_typescript() {
        let mut parser = ScriptParser::new().unwrap();
        let source = "function main( { }";
        let parsed = parser.parse_with_source(source).unwrap();

        assert!(parsed.has_errors());
        assert!(!parsed.error_nodes().is_empty());
        assert!(parsed.ensure_well_formed().is_err());
    }

    #[test]
    fn tsx_dialect_parses_jsx() {
        let mut parser = ScriptParser::with_dialect(Dialect::Tsx).unwrap();
        let parsed = parser
            .parse_with_source("const view = () => <div>{name}</div>;")
            .unwrap();
        assert!(!parsed.has_errors());
    }

    #[test]
    fn dialect_from_extension() {
        assert_eq!(Dialect::from_extension("ts"), Some(Dialect::TypeScript));
        assert_eq!(Dialect::from_extension("tsx"), Some(Dialect::Tsx));
        assert_eq!(Dialect::from_extension("mjs"), Some(Dialect::JavaScript));
        assert_eq!(Dialect::from_extension("rs"), None);
        assert!(matches!(
            Dialect::from_path(Path::new("notes.md")),
            Err(TreeSitterError::UnsupportedExtension { .. })
        ));
    }

    #[test]
    fn declaration_files_are_detected() {
        assert!(is_declaration_file(Path::new("typings/angular.d.ts")));
        assert!(!is_declaration_file(Path::new("src/app.ts")));
        assert!(!is_declaration_file(Path::new("src/d.ts")));
    }
}
