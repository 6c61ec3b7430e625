//! The annotation engine: recognize sites, synthesize edits, apply them.
//!
//! Synthesis never touches the buffer. All edits are computed against the
//! original text first and applied in one pass afterwards, which is what
//! keeps their offsets valid.

pub mod recognizer;
pub mod synthesizer;

pub use recognizer::{InjectionSite, Recognizer};
pub use synthesizer::{string_array_literal, Synthesizer};

use crate::config::RecognizerConfig;
use crate::edit::{apply_edits, Edit, EditError};
use crate::ts::ParsedSource;

/// Result of annotating one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub edit_count: usize,
}

/// All edits needed to annotate a parsed buffer.
pub fn annotating_edits(parsed: &ParsedSource<'_>, config: &RecognizerConfig) -> Vec<Edit> {
    let sites = Recognizer::new(config).recognize(parsed.root());
    Synthesizer::new(&config.inject_property).edits_for_sites(&sites)
}

/// Annotate a parsed buffer and return the rewritten text.
pub fn annotate(parsed: &ParsedSource<'_>, config: &RecognizerConfig) -> Result<Rewrite, EditError> {
    let edits = annotating_edits(parsed, config);
    let text = apply_edits(parsed.source, &edits)?;
    Ok(Rewrite {
        text,
        edit_count: edits.len(),
    })
}
