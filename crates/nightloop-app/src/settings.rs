//! Session configuration loading.
//!
//! A config file is a JSON [`LoopConfig`]; every section is optional and
//! falls back to its defaults.

use std::fs;
use std::path::Path;

use tracing::info;

use nightloop_core::config::LoopConfig;

use crate::error::AppError;

/// Read, parse and validate a config file.
pub fn load_config(path: &Path) -> Result<LoopConfig, AppError> {
    let text = fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&text).map_err(|err| match err {
        ParseFailure::Json(source) => AppError::Parse {
            path: path.to_path_buf(),
            source,
        },
        ParseFailure::Invalid(err) => AppError::Core(err),
    })?;
    info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// The default config, or the one at `path` if given.
pub fn load_or_default(path: Option<&Path>) -> Result<LoopConfig, AppError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(LoopConfig::default()),
    }
}

#[derive(Debug)]
enum ParseFailure {
    Json(serde_json::Error),
    Invalid(nightloop_core::CoreError),
}

fn parse_config(text: &str) -> Result<LoopConfig, ParseFailure> {
    let config: LoopConfig = serde_json::from_str(text).map_err(ParseFailure::Json)?;
    config.validate().map_err(ParseFailure::Invalid)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config =
            parse_config(r#"{ "break_in": { "min_secs": 5.0, "max_secs": 6.0 } }"#).unwrap();
        assert_eq!(config.break_in.min_secs, 5.0);
        assert_eq!(config.break_in.max_secs, 6.0);
        assert_eq!(config.break_in.emergency_min_secs, 35.0);
        assert_eq!(config.reset.cooldown_secs, 0.5);
        assert_eq!(config.layout.floor_plan.len(), 12);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let result = parse_config(r#"{ "break_in": { "min_secs": 30.0 } }"#);
        assert!(matches!(result, Err(ParseFailure::Invalid(_))));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let result = parse_config("{ not json");
        assert!(matches!(result, Err(ParseFailure::Json(_))));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/nightloop.json")).unwrap_err();
        assert!(matches!(err, AppError::Read { .. }));
        assert!(err.to_string().contains("nightloop.json"));
    }
}
