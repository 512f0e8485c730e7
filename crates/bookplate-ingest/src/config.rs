//! Ingestion configuration
//!
//! Built once at startup from the environment (a `.env` file is loaded by the
//! binary first) and handed to the pipeline by value.

use bookplate_common::{BookplateError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default file-name pattern for full-export archives
pub const DEFAULT_ARCHIVE_PATTERN: &str = "*.tar.gz";

/// Default number of archives between progress log lines
pub const DEFAULT_PROGRESS_INTERVAL: usize = 5;

/// Default tracker file name inside the output directory
pub const DEFAULT_TRACKER_FILE: &str = "tracker.json";

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory holding the `.tar.gz` exports
    pub source_dir: PathBuf,

    /// Working directory for decompressed MARC-XML files
    pub output_dir: PathBuf,

    /// Directory for `{mms_id}.json` bookplate files
    pub bookplate_dir: PathBuf,

    /// Path of the per-run tracker report
    pub tracker_path: PathBuf,

    /// Shell-style pattern selecting archives in `source_dir`
    pub archive_pattern: String,

    /// Log a progress line every this many archives
    pub progress_interval: usize,
}

impl IngestConfig {
    /// Config with defaults derived from the two required directories
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            source_dir: source_dir.into(),
            bookplate_dir: output_dir.clone(),
            tracker_path: output_dir.join(DEFAULT_TRACKER_FILE),
            output_dir,
            archive_pattern: DEFAULT_ARCHIVE_PATTERN.to_string(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Load configuration from environment variables
    ///
    /// Required: `MARC_FULL_SOURCE_DIR`, `MARC_FULL_OUTPUT_DIR`. The optional
    /// variables are read by [`IngestConfig::merge_env`].
    pub fn from_env() -> Result<Self> {
        let config = Self::new(
            required_env("MARC_FULL_SOURCE_DIR")?,
            required_env("MARC_FULL_OUTPUT_DIR")?,
        )
        .merge_env()?;

        config.validate()?;
        Ok(config)
    }

    /// Apply the optional environment variables on top of `self`
    ///
    /// `BOOKPLATE_JSON_DIR`, `TRACKER_PATH`, `ARCHIVE_PATTERN`, `PROGRESS_INTERVAL`.
    pub fn merge_env(mut self) -> Result<Self> {
        if let Ok(dir) = std::env::var("BOOKPLATE_JSON_DIR") {
            self.bookplate_dir = PathBuf::from(dir);
        }

        if let Ok(path) = std::env::var("TRACKER_PATH") {
            self.tracker_path = PathBuf::from(path);
        }

        if let Ok(pattern) = std::env::var("ARCHIVE_PATTERN") {
            self.archive_pattern = pattern;
        }

        if let Ok(interval) = std::env::var("PROGRESS_INTERVAL") {
            self.progress_interval = interval.parse().map_err(|_| {
                BookplateError::config(format!(
                    "PROGRESS_INTERVAL must be a positive integer, got '{}'",
                    interval
                ))
            })?;
        }

        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.progress_interval == 0 {
            return Err(BookplateError::config("PROGRESS_INTERVAL must be greater than 0"));
        }
        if self.archive_pattern.trim().is_empty() {
            return Err(BookplateError::config("ARCHIVE_PATTERN must not be empty"));
        }
        Ok(())
    }
}

/// Read a required directory setting from the environment
pub fn required_env(name: &str) -> Result<PathBuf> {
    std::env::var(name)
        .map(PathBuf::from)
        .map_err(|_| BookplateError::config(format!("{} environment variable is not set", name)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "MARC_FULL_SOURCE_DIR",
        "MARC_FULL_OUTPUT_DIR",
        "BOOKPLATE_JSON_DIR",
        "TRACKER_PATH",
        "ARCHIVE_PATTERN",
        "PROGRESS_INTERVAL",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults_follow_output_dir() {
        let config = IngestConfig::new("/exports", "/work");
        assert_eq!(config.bookplate_dir, PathBuf::from("/work"));
        assert_eq!(config.tracker_path, PathBuf::from("/work/tracker.json"));
        assert_eq!(config.archive_pattern, "*.tar.gz");
        assert_eq!(config.progress_interval, DEFAULT_PROGRESS_INTERVAL);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        std::env::set_var("MARC_FULL_SOURCE_DIR", "/exports/full");
        std::env::set_var("MARC_FULL_OUTPUT_DIR", "/work/full");
        std::env::set_var("ARCHIVE_PATTERN", "*new.tar.gz");
        std::env::set_var("PROGRESS_INTERVAL", "10");

        let config = IngestConfig::from_env().unwrap();
        assert_eq!(config.source_dir, PathBuf::from("/exports/full"));
        assert_eq!(config.output_dir, PathBuf::from("/work/full"));
        assert_eq!(config.archive_pattern, "*new.tar.gz");
        assert_eq!(config.progress_interval, 10);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_required_var() {
        clear_env();
        std::env::set_var("MARC_FULL_OUTPUT_DIR", "/work/full");

        let err = IngestConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("MARC_FULL_SOURCE_DIR"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_zero_interval_rejected() {
        clear_env();
        std::env::set_var("MARC_FULL_SOURCE_DIR", "/a");
        std::env::set_var("MARC_FULL_OUTPUT_DIR", "/b");
        std::env::set_var("PROGRESS_INTERVAL", "0");

        assert!(IngestConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_merge_env_keeps_defaults_of_given_dirs() {
        clear_env();
        std::env::set_var("TRACKER_PATH", "/reports/run.json");

        let config = IngestConfig::new("/exports", "/scratch").merge_env().unwrap();
        assert_eq!(config.tracker_path, PathBuf::from("/reports/run.json"));
        assert_eq!(config.bookplate_dir, PathBuf::from("/scratch"));

        clear_env();
    }
}
