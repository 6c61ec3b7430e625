//! Tree-sitter integration for TypeScript and JavaScript sources.
//!
//! This module is the syntax provider: it turns raw buffers into parsed
//! trees, picks the grammar from the file name and rejects buffers the
//! grammar could not parse cleanly.

pub mod errors;
pub mod parser;
pub mod validator;

pub use errors::TreeSitterError;
pub use parser::{is_declaration_file, read_source, Dialect, ErrorNode, ParsedSource, ScriptParser};
pub use validator::{validate_rewrite, validate_syntax};
