//! File-level driver: read, annotate, verify, write.
//!
//! Every file goes through the same pipeline. Files are independent, so a
//! batch is processed in parallel and one failure never stops the others.

use crate::annotate::{annotate, Rewrite};
use crate::config::AnnotateConfig;
use crate::edit::{atomic_write, EditError};
use crate::pool;
use crate::ts::{is_declaration_file, read_source, validate_rewrite, TreeSitterError};
use rayon::prelude::*;
use similar::TextDiff;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("{path}: {source}")]
    Syntax {
        path: PathBuf,
        #[source]
        source: TreeSitterError,
    },

    #[error("{path}: {source}")]
    Edit {
        path: PathBuf,
        #[source]
        source: EditError,
    },

    #[error("{path}: rewrite introduced a syntax error: {source}")]
    RewriteBrokeSyntax {
        path: PathBuf,
        #[source]
        source: TreeSitterError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no expected output {expected} for fixture {input}")]
    MissingExpectation { input: PathBuf, expected: PathBuf },
}

/// Outcome of annotating one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotated {
    pub path: PathBuf,
    pub original: String,
    pub rewritten: String,
    pub edit_count: usize,
}

impl Annotated {
    pub fn changed(&self) -> bool {
        self.original != self.rewritten
    }
}

/// Annotate a single file without writing it.
pub fn annotate_path(path: &Path, config: &AnnotateConfig) -> Result<Annotated, RunError> {
    let (dialect, original) = read_source(path).map_err(|source| RunError::Syntax {
        path: path.to_path_buf(),
        source,
    })?;

    if is_declaration_file(path) {
        debug!(path = %path.display(), "skipping declaration file");
        return Ok(Annotated {
            path: path.to_path_buf(),
            rewritten: original.clone(),
            original,
            edit_count: 0,
        });
    }

    let syntax_error = |source: TreeSitterError| RunError::Syntax {
        path: path.to_path_buf(),
        source,
    };
    let rewrite: Rewrite = pool::with_parser(dialect, |parser| {
        let parsed = parser.parse_with_source(&original).map_err(syntax_error)?;
        parsed.ensure_well_formed().map_err(syntax_error)?;
        annotate(&parsed, &config.recognizer).map_err(|source| RunError::Edit {
            path: path.to_path_buf(),
            source,
        })
    })
    .map_err(syntax_error)??;

    if config.output.verify_syntax && rewrite.text != original {
        validate_rewrite(dialect, &original, &rewrite.text).map_err(|source| {
            RunError::RewriteBrokeSyntax {
                path: path.to_path_buf(),
                source,
            }
        })?;
    }

    debug!(path = %path.display(), edits = rewrite.edit_count, "annotated");
    Ok(Annotated {
        path: path.to_path_buf(),
        original,
        rewritten: rewrite.text,
        edit_count: rewrite.edit_count,
    })
}

/// Annotate many files in parallel. Results keep the input order.
pub fn annotate_paths(
    paths: &[PathBuf],
    config: &AnnotateConfig,
) -> Vec<Result<Annotated, RunError>> {
    paths
        .par_iter()
        .map(|path| {
            let result = annotate_path(path, config);
            if let Err(e) = &result {
                warn!("{e}");
            }
            result
        })
        .collect()
}

/// Write the rewrite back if it differs from what is on disk.
///
/// Returns whether the file was written.
pub fn write_in_place(annotated: &Annotated) -> Result<bool, RunError> {
    if !annotated.changed() {
        return Ok(false);
    }
    atomic_write(&annotated.path, annotated.rewritten.as_bytes()).map_err(|source| {
        RunError::Edit {
            path: annotated.path.clone(),
            source,
        }
    })?;
    info!(
        path = %annotated.path.display(),
        edits = annotated.edit_count,
        "wrote annotations"
    );
    Ok(true)
}

/// Path of the expected output for a fixture.
///
/// A file already named `<stem><suffix>.ts` is its own expectation.
pub fn expected_path(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    if is_expectation(name, suffix) {
        return path.to_path_buf();
    }
    let stem = name.strip_suffix(".ts").unwrap_or(name);
    path.with_file_name(format!("{stem}{suffix}.ts"))
}

fn is_expectation(name: &str, suffix: &str) -> bool {
    name.strip_suffix(".ts")
        .is_some_and(|stem| stem.ends_with(suffix))
}

/// All `.ts` fixtures under `dir`, sorted.
pub fn discover_fixtures(dir: &Path) -> Result<Vec<PathBuf>, RunError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| RunError::Io {
            path: e.path().unwrap_or(dir).to_path_buf(),
            source: e.into(),
        })?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().and_then(|ext| ext.to_str()) == Some("ts")
            && !is_declaration_file(path)
        {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// A fixture whose annotation differs from its expectation.
#[derive(Debug, Clone)]
pub struct FixtureMismatch {
    pub input: PathBuf,
    pub expected: PathBuf,
    /// Unified diff from expected to actual
    pub patch: String,
}

#[derive(Debug, Default)]
pub struct FixtureReport {
    pub checked: usize,
    pub mismatches: Vec<FixtureMismatch>,
    pub errors: Vec<RunError>,
}

impl FixtureReport {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty() && self.errors.is_empty()
    }
}

/// Compare every fixture under `dir` with its expectation.
///
/// Inputs are compared with `<stem><suffix>.ts`; expectation files are
/// re-annotated and compared with themselves.
pub fn check_fixtures(dir: &Path, config: &AnnotateConfig) -> Result<FixtureReport, RunError> {
    let fixtures = discover_fixtures(dir)?;
    let suffix = config.fixtures.annotated_suffix.as_str();
    let mut report = FixtureReport::default();

    for result in annotate_paths(&fixtures, config) {
        let annotated = match result {
            Ok(annotated) => annotated,
            Err(e) => {
                report.errors.push(e);
                continue;
            }
        };
        report.checked += 1;

        let expected = expected_path(&annotated.path, suffix);
        let expected_text = if expected == annotated.path {
            annotated.original.clone()
        } else {
            match fs::read_to_string(&expected) {
                Ok(text) => text,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    report.errors.push(RunError::MissingExpectation {
                        input: annotated.path.clone(),
                        expected,
                    });
                    continue;
                }
                Err(source) => {
                    report.errors.push(RunError::Io {
                        path: expected,
                        source,
                    });
                    continue;
                }
            }
        };

        if annotated.rewritten != expected_text {
            let name = expected.display().to_string();
            report.mismatches.push(FixtureMismatch {
                input: annotated.path.clone(),
                patch: unified_patch(&name, &expected_text, &annotated.rewritten),
                expected,
            });
        }
    }

    Ok(report)
}

/// Unified diff of `before` against `after`, both labelled `name`.
pub fn unified_patch(name: &str, before: &str, after: &str) -> String {
    TextDiff::from_lines(before, after)
        .unified_diff()
        .header(name, name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn expected_path_rule() {
        assert_eq!(
            expected_path(Path::new("fx/simple.ts"), ".annotated"),
            PathBuf::from("fx/simple.annotated.ts")
        );
        assert_eq!(
            expected_path(Path::new("fx/simple.annotated.ts"), ".annotated"),
            PathBuf::from("fx/simple.annotated.ts")
        );
        assert_eq!(
            expected_path(Path::new("fx/a.b.ts"), ".expected"),
            PathBuf::from("fx/a.b.expected.ts")
        );
    }

    #[test]
    fn annotate_path_rewrites_in_memory_only() {
        let dir = tempfile::tempdir().unwrap();
        let source = "angular.module('m').run(function ($q) {});\n";
        let path = write(dir.path(), "app.ts", source);

        let annotated = annotate_path(&path, &AnnotateConfig::default()).unwrap();
        assert_eq!(
            annotated.rewritten,
            "angular.module('m').run(['$q', function ($q) {}]);\n"
        );
        assert_eq!(annotated.edit_count, 2);
        assert!(annotated.changed());
        assert_eq!(fs::read_to_string(&path).unwrap(), source);
    }

    #[test]
    fn syntax_errors_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "broken.ts", "angular.module('m').run(function (a {});\n");

        let err = annotate_path(&path, &AnnotateConfig::default()).unwrap_err();
        assert!(matches!(err, RunError::Syntax { .. }));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "notes.md", "# nothing\n");

        let err = annotate_path(&path, &AnnotateConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            RunError::Syntax {
                source: TreeSitterError::UnsupportedExtension { .. },
                ..
            }
        ));
    }

    #[test]
    fn declaration_files_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let source = "declare function f(a: number): void;\n";
        let path = write(dir.path(), "types.d.ts", source);

        let annotated = annotate_path(&path, &AnnotateConfig::default()).unwrap();
        assert_eq!(annotated.rewritten, source);
        assert_eq!(annotated.edit_count, 0);
    }

    #[test]
    fn batch_keeps_order_and_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "good.ts", "angular.module('m').run((a) => {});\n");
        let bad = write(dir.path(), "bad.ts", "class {\n");
        let plain = write(dir.path(), "plain.js", "var x = 1;\n");

        let results = annotate_paths(&[good.clone(), bad, plain.clone()], &AnnotateConfig::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().path, good);
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().path, plain);
    }

    #[test]
    fn write_in_place_only_when_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "done.ts", "angular.module('m').run(['a', function (a) {}]);\n");

        let annotated = annotate_path(&path, &AnnotateConfig::default()).unwrap();
        assert!(!write_in_place(&annotated).unwrap());

        let path = write(dir.path(), "todo.ts", "angular.module('m').run(function (a) {});\n");
        let annotated = annotate_path(&path, &AnnotateConfig::default()).unwrap();
        assert!(write_in_place(&annotated).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), annotated.rewritten);
    }

    #[test]
    fn fixture_check_reports_mismatch_with_patch() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ok.ts", "angular.module('m').run(function (a) {});\n");
        write(
            dir.path(),
            "ok.annotated.ts",
            "angular.module('m').run(['a', function (a) {}]);\n",
        );
        write(dir.path(), "stale.ts", "angular.module('m').run(function (b) {});\n");
        write(
            dir.path(),
            "stale.annotated.ts",
            "angular.module('m').run(function (b) {});\n",
        );

        let report = check_fixtures(dir.path(), &AnnotateConfig::default()).unwrap();
        assert_eq!(report.checked, 4);
        assert!(report.errors.is_empty());
        // stale.ts differs from its expectation, and stale.annotated.ts is not idempotent
        assert_eq!(report.mismatches.len(), 2);
        assert!(report.mismatches[0].patch.contains("+angular.module('m').run(['b', function (b) {}]);"));
        assert!(!report.passed());
    }

    #[test]
    fn fixture_without_expectation_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "lonely.ts", "var x = 1;\n");

        let report = check_fixtures(dir.path(), &AnnotateConfig::default()).unwrap();
        assert!(matches!(
            report.errors.as_slice(),
            [RunError::MissingExpectation { .. }]
        ));
    }
}
