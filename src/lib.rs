//! ts-ng-annotate: dependency-injection annotations for AngularJS sources
//!
//! Finds callables registered with an `angular.module(...)` chain, or opted
//! in with a `"ngInject"` prologue, and rewrites the source so each one
//! declares its dependencies explicitly. Functions gain a leading string
//! array (`['$http', function ($http) {}]`) and classes gain a
//! `static $inject` property. Existing annotations are corrected in place.
//!
//! # Architecture
//!
//! Every change compiles down to a single primitive: [`Edit`], a byte-span
//! replacement computed against the original buffer. Recognition walks the
//! tree-sitter syntax tree, synthesis turns sites into edits, and
//! [`apply_edits`] applies a whole batch in one ordered pass.
//!
//! # Example
//!
//! ```no_run
//! use ts_ng_annotate::{annotate_source, Dialect};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let out = annotate_source(
//!     "angular.module('app').controller('Main', function ($scope) {});",
//!     Dialect::TypeScript,
//! )?;
//! assert_eq!(
//!     out,
//!     "angular.module('app').controller('Main', ['$scope', function ($scope) {}]);"
//! );
//! # Ok(())
//! # }
//! ```

pub mod annotate;
pub mod config;
pub mod edit;
pub mod pool;
pub mod runner;
pub mod syntax;
pub mod ts;

// Re-exports
pub use annotate::{annotating_edits, InjectionSite, Recognizer, Rewrite, Synthesizer};
pub use config::{load_from_path, load_from_str, AnnotateConfig, ConfigError, RecognizerConfig};
pub use edit::{apply_edits, Edit, EditError};
pub use runner::{annotate_path, annotate_paths, Annotated, RunError};
pub use ts::{Dialect, ParsedSource, ScriptParser, TreeSitterError};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error(transparent)]
    Syntax(#[from] TreeSitterError),

    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Annotate a buffer with the default recognizer.
///
/// Sources with syntax errors are rejected rather than rewritten.
pub fn annotate_source(source: &str, dialect: Dialect) -> Result<String, AnnotateError> {
    let recognizer = RecognizerConfig::default();
    let rewrite = pool::with_parser(dialect, |parser| {
        let parsed = parser.parse_with_source(source)?;
        parsed.ensure_well_formed()?;
        Ok::<_, AnnotateError>(annotate::annotate(&parsed, &recognizer)?)
    })??;
    Ok(rewrite.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotate_source_uses_defaults() {
        let out = annotate_source(
            "angular.module('app').directive('d', ($compile) => ({}));",
            Dialect::TypeScript,
        )
        .unwrap();
        assert_eq!(
            out,
            "angular.module('app').directive('d', ['$compile', ($compile) => ({})]);"
        );
    }

    #[test]
    fn annotate_source_rejects_broken_input() {
        let err = annotate_source("function (", Dialect::JavaScript).unwrap_err();
        assert!(matches!(err, AnnotateError::Syntax(_)));
    }
}
