use crate::config::schema::{AnnotateConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "ng-annotate.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Io { .. } => self,
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config from {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse config TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse config TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid config ({}): {}", path.display(), source),
                None => write!(f, "invalid config: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<AnnotateConfig, ConfigError> {
    let config: AnnotateConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<AnnotateConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// Load an explicit config file, else `ng-annotate.toml` in `dir` if present,
/// else the defaults.
pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<AnnotateConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_from_path(path);
    }
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    if candidate.is_file() {
        return load_from_path(candidate);
    }
    Ok(AnnotateConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = load_from_str("").unwrap();
        assert_eq!(config, AnnotateConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = load_from_str(
            r#"
[recognizer]
marker = "inject"
registration_methods = ["controller", "component"]

[output]
verify_syntax = false
"#,
        )
        .unwrap();
        assert_eq!(config.recognizer.marker, "inject");
        assert_eq!(config.recognizer.registration_methods, vec!["controller", "component"]);
        assert_eq!(config.recognizer.module_entry, "angular.module");
        assert_eq!(config.fixtures.annotated_suffix, ".annotated");
        assert!(!config.output.verify_syntax);
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = load_from_str("[recognizer\nmarker = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { path: None, .. }));
    }

    #[test]
    fn invalid_values_are_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[recognizer]\nregistration_methods = []\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { path: Some(_), .. }));
        assert!(err.to_string().contains(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn resolve_prefers_explicit_then_directory_then_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve(None, dir.path()).unwrap(), AnnotateConfig::default());

        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[fixtures]\nannotated_suffix = \".expected\"\n",
        )
        .unwrap();
        let config = resolve(None, dir.path()).unwrap();
        assert_eq!(config.fixtures.annotated_suffix, ".expected");

        let explicit = dir.path().join("other.toml");
        fs::write(&explicit, "[recognizer]\nmarker = \"di\"\n").unwrap();
        let config = resolve(Some(&explicit), dir.path()).unwrap();
        assert_eq!(config.recognizer.marker, "di");
        assert_eq!(config.fixtures.annotated_suffix, ".annotated");
    }
}
