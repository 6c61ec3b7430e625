use crate::pool;
use crate::ts::errors::TreeSitterError;
use crate::ts::parser::{Dialect, ErrorNode};

/// Validate that a source buffer has no syntax errors.
pub fn validate_syntax(dialect: Dialect, source: &str) -> Result<(), TreeSitterError> {
    pool::with_parser(dialect, |parser| {
        parser.parse_with_source(source)?.ensure_well_formed()
    })?
}

/// Validate that a rewrite doesn't introduce syntax errors.
///
/// Errors already present in the original (matched by byte range) are
/// tolerated; anything new is reported.
pub fn validate_rewrite(
    dialect: Dialect,
    original: &str,
    rewritten: &str,
) -> Result<(), TreeSitterError> {
    let (original_errors, new_errors) = pool::with_parser(dialect, |parser| {
        let original_errors = parser.parse_with_source(original)?.error_nodes();
        let new_errors = parser.parse_with_source(rewritten)?.error_nodes();
        Ok::<_, TreeSitterError>((original_errors, new_errors))
    })??;

    let introduced: Vec<&ErrorNode> = new_errors
        .iter()
        .filter(|e| {
            !original_errors
                .iter()
                .any(|o| o.byte_start == e.byte_start && o.byte_end == e.byte_end)
        })
        .collect();

    match introduced.as_slice() {
        [] => Ok(()),
        [error] => Err(TreeSitterError::SyntaxError {
            byte_start: error.byte_start,
            byte_end: error.byte_end,
            line: error.start_point.row + 1,
            column: error.start_point.column + 1,
        }),
        _ => Err(TreeSitterError::MultipleSyntaxErrors {
            count: introduced.len(),
        }),
    }
}
