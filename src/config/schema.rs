use crate::annotate::recognizer::{
    NG_INJECT_MARKER, NG_INJECT_PROPERTY, NG_MODULE_ENTRY, NG_MODULE_METHOD_NAMES,
    NG_PROVIDER_ACCESSORS,
};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct AnnotateConfig {
    #[serde(default)]
    pub recognizer: RecognizerConfig,
    #[serde(default)]
    pub fixtures: FixtureConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The names the recognizer matches against.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Prologue string that opts a callable into annotation
    pub marker: String,
    /// Callee text that starts a registration chain
    pub module_entry: String,
    pub registration_methods: Vec<String>,
    /// Full callee texts registering injectables outside a chain
    pub provider_accessors: Vec<String>,
    /// Static class property holding the dependency list
    pub inject_property: String,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            marker: NG_INJECT_MARKER.to_string(),
            module_entry: NG_MODULE_ENTRY.to_string(),
            registration_methods: NG_MODULE_METHOD_NAMES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            provider_accessors: NG_PROVIDER_ACCESSORS
                .iter()
                .map(|accessor| accessor.to_string())
                .collect(),
            inject_property: NG_INJECT_PROPERTY.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FixtureConfig {
    /// Inserted before `.ts` to name the expected output of a fixture
    pub annotated_suffix: String,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            annotated_suffix: ".annotated".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Re-parse every rewrite and reject it if it introduced syntax errors
    pub verify_syntax: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            verify_syntax: true,
        }
    }
}

impl AnnotateConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        let recognizer = &self.recognizer;

        if recognizer.marker.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "recognizer.marker",
            });
        }
        if recognizer.module_entry.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "recognizer.module_entry",
            });
        }
        if recognizer.registration_methods.is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "recognizer.registration_methods",
            });
        }
        for method in &recognizer.registration_methods {
            if !is_identifier(method) {
                issues.push(ValidationIssue::InvalidValue {
                    field: "recognizer.registration_methods",
                    message: format!("'{method}' is not an identifier"),
                });
            }
        }
        if !is_identifier(&recognizer.inject_property) {
            issues.push(ValidationIssue::InvalidValue {
                field: "recognizer.inject_property",
                message: format!("'{}' is not an identifier", recognizer.inject_property),
            });
        }
        if !self.fixtures.annotated_suffix.starts_with('.')
            || self.fixtures.annotated_suffix.len() < 2
        {
            issues.push(ValidationIssue::InvalidValue {
                field: "fixtures.annotated_suffix",
                message: "suffix must start with '.' and name something".to_string(),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '$' || first == '_' || first.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '$' || c == '_' || c.is_alphanumeric())
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    MissingField {
        field: &'static str,
    },
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => {
                write!(f, "missing required field '{field}'")
            }
            ValidationIssue::InvalidValue { field, message } => {
                write!(f, "invalid value for '{field}': {message}")
            }
        }
    }
}
