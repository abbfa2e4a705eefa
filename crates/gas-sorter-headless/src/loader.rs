//! Data file loading: format detection (RON/JSON/TOML), file discovery,
//! deserialization, and validated [`GasSorterConfig`] loading.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use gas_sorter_core::config::{ConfigError, GasSorterConfig};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The file parsed but the config it holds is not usable.
    #[error("invalid config in {file}: {source}")]
    InvalidConfig { file: PathBuf, source: ConfigError },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Look for `{base_name}.ron`, `.toml` or `.json` in `dir`.
///
/// Returns `Ok(None)` if none exists and `Err(ConflictingFormats)` if more
/// than one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if !candidate.exists() {
            continue;
        }
        if let Some(existing) = found {
            return Err(DataLoadError::ConflictingFormats {
                a: existing,
                b: candidate,
            });
        }
        found = Some(candidate);
    }

    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let parse_error = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
    }
}

// ===========================================================================
// Config
// ===========================================================================

/// Load and validate a [`GasSorterConfig`]. Missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<GasSorterConfig, DataLoadError> {
    let config: GasSorterConfig = deserialize_file(path)?;
    config
        .validate()
        .map_err(|source| DataLoadError::InvalidConfig {
            file: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(file = %path.display(), "loaded gas sorter config");
    Ok(config)
}

/// Load `config.{ron,toml,json}` from `dir`, or the defaults if there is none.
pub fn load_config_in_dir(dir: &Path) -> Result<GasSorterConfig, DataLoadError> {
    match find_data_file(dir, "config")? {
        Some(path) => load_config(&path),
        None => Ok(GasSorterConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "gas_sorter_loader_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    // -----------------------------------------------------------------------
    // Format detection
    // -----------------------------------------------------------------------

    #[test]
    fn detect_known_formats() {
        assert_eq!(detect_format(Path::new("a/config.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("config.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("config.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        let err = detect_format(Path::new("config.yaml")).unwrap_err();
        assert!(matches!(err, DataLoadError::UnsupportedFormat { .. }));
        let err = detect_format(Path::new("config")).unwrap_err();
        assert!(matches!(err, DataLoadError::UnsupportedFormat { .. }));
    }

    // -----------------------------------------------------------------------
    // File discovery
    // -----------------------------------------------------------------------

    #[test]
    fn find_data_file_missing_is_none() {
        let dir = make_test_dir("find_missing");
        assert!(find_data_file(&dir, "config").unwrap().is_none());
        let err = require_data_file(&dir, "scene").unwrap_err();
        assert!(err.to_string().contains("'scene'"), "got: {err}");
        cleanup(&dir);
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = make_test_dir("find_conflict");
        fs::write(dir.join("config.ron"), "()").unwrap();
        fs::write(dir.join("config.json"), "{}").unwrap();
        let err = find_data_file(&dir, "config").unwrap_err();
        assert!(matches!(err, DataLoadError::ConflictingFormats { .. }));
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Config loading
    // -----------------------------------------------------------------------

    #[test]
    fn load_partial_toml_config_keeps_defaults() {
        let dir = make_test_dir("toml_partial");
        let path = dir.join("config.toml");
        fs::write(&path, "scan_interval = 10\n\n[transfer]\namount = 0.001\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.scan_interval, 10);
        assert_eq!(config.transfer.amount, 0.001);
        assert_eq!(config.transfer.full_limit, 0.999999);
        assert_eq!(config.chat.root, "/gassorter");
        cleanup(&dir);
    }

    #[test]
    fn load_ron_and_json_configs() {
        let dir = make_test_dir("ron_json");
        let ron_path = dir.join("a.ron");
        fs::write(&ron_path, "(diagnostics: (max_lines: 20))").unwrap();
        assert_eq!(load_config(&ron_path).unwrap().diagnostics.max_lines, 20);

        let json_path = dir.join("b.json");
        fs::write(&json_path, r#"{"chat": {"root": "/gs"}}"#).unwrap();
        assert_eq!(load_config(&json_path).unwrap().chat.root, "/gs");
        cleanup(&dir);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = make_test_dir("invalid");
        let path = dir.join("config.toml");
        fs::write(&path, "scan_interval = 0\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(
            matches!(
                err,
                DataLoadError::InvalidConfig {
                    source: ConfigError::ZeroScanInterval,
                    ..
                }
            ),
            "got: {err:?}"
        );
        cleanup(&dir);
    }

    #[test]
    fn malformed_config_is_a_parse_error() {
        let dir = make_test_dir("malformed");
        let path = dir.join("config.ron");
        fs::write(&path, "(scan_interval: \"soon\")").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::Parse { .. }), "got: {err:?}");
        cleanup(&dir);
    }

    #[test]
    fn config_in_dir_defaults_when_absent() {
        let dir = make_test_dir("in_dir");
        assert_eq!(load_config_in_dir(&dir).unwrap(), GasSorterConfig::default());
        fs::write(dir.join("config.toml"), "scan_interval = 5\n").unwrap();
        assert_eq!(load_config_in_dir(&dir).unwrap().scan_interval, 5);
        cleanup(&dir);
    }
}
