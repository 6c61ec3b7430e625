//! Thread-local parser pooling.
//!
//! Each worker thread keeps one parser per dialect, created on first use and
//! reused for every later buffer handled on that thread. Parsers are never
//! shared across threads.

use crate::ts::{Dialect, ScriptParser, TreeSitterError};
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

thread_local! {
    static PARSERS: RefCell<HashMap<Dialect, ScriptParser>> = RefCell::new(HashMap::new());
}

/// Execute function with a pooled parser for `dialect`.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use ts_ng_annotate::pool::with_parser;
/// use ts_ng_annotate::ts::Dialect;
///
/// let has_errors = with_parser(Dialect::TypeScript, |parser| {
///     parser.parse_with_source("class Foo {}").map(|parsed| parsed.has_errors())
/// })??;
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(dialect: Dialect, f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&mut ScriptParser) -> R,
{
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = match parsers.entry(dialect) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(ScriptParser::with_dialect(dialect)?),
        };
        Ok(f(parser))
    })
}
