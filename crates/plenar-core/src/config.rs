//! Plenar Configuration Management
//!
//! Handles configuration from environment variables and TOML files with
//! defaults that reproduce the reference extraction constants.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Transcript segmentation
    pub segmentation: SegmentationConfig,

    /// Annotation extraction
    pub annotation: AnnotationConfig,

    /// Entity resolution thresholds
    pub resolution: ResolutionConfig,

    /// Batch processing
    pub pipeline: PipelineConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Segmentation
        if let Ok(value) = std::env::var("PLENAR_MIN_BODY_CHARS") {
            config.segmentation.min_body_chars = parse_env("PLENAR_MIN_BODY_CHARS", value)?;
        }
        if let Ok(value) = std::env::var("PLENAR_STRIP_NAME_HEADERS") {
            config.segmentation.strip_name_headers =
                parse_env("PLENAR_STRIP_NAME_HEADERS", value)?;
        }

        // Annotation
        if let Ok(value) = std::env::var("PLENAR_NUMBERING") {
            config.annotation.numbering = value.parse()?;
        }

        // Resolution
        if let Ok(value) = std::env::var("PLENAR_CONSTITUENCY_THRESHOLD") {
            config.resolution.constituency_threshold =
                parse_env("PLENAR_CONSTITUENCY_THRESHOLD", value)?;
        }
        if let Ok(value) = std::env::var("PLENAR_FUZZY_THRESHOLD") {
            config.resolution.fuzzy_last_name_threshold =
                parse_env("PLENAR_FUZZY_THRESHOLD", value)?;
        }

        // Pipeline
        if let Ok(value) = std::env::var("PLENAR_WORKERS") {
            config.pipeline.workers = parse_env("PLENAR_WORKERS", value)?;
        }
        if let Ok(value) = std::env::var("PLENAR_BUDGET_MS") {
            config.pipeline.transcript_budget_ms = Some(parse_env("PLENAR_BUDGET_MS", value)?);
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(value) = std::env::var("PLENAR_LOG_JSON") {
            config.logging.json_format = parse_env("PLENAR_LOG_JSON", value)?;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;

        if env_config.segmentation.min_body_chars != SegmentationConfig::default().min_body_chars
        {
            self.segmentation.min_body_chars = env_config.segmentation.min_body_chars;
        }
        if !env_config.segmentation.strip_name_headers {
            self.segmentation.strip_name_headers = false;
        }
        if env_config.annotation.numbering != PositionNumbering::default() {
            self.annotation.numbering = env_config.annotation.numbering;
        }
        if std::env::var("PLENAR_CONSTITUENCY_THRESHOLD").is_ok() {
            self.resolution.constituency_threshold = env_config.resolution.constituency_threshold;
        }
        if std::env::var("PLENAR_FUZZY_THRESHOLD").is_ok() {
            self.resolution.fuzzy_last_name_threshold =
                env_config.resolution.fuzzy_last_name_threshold;
        }
        if env_config.pipeline.workers != PipelineConfig::default().workers {
            self.pipeline.workers = env_config.pipeline.workers;
        }
        if env_config.pipeline.transcript_budget_ms.is_some() {
            self.pipeline.transcript_budget_ms = env_config.pipeline.transcript_budget_ms;
        }
        if env_config.logging.level != LoggingConfig::default().level {
            self.logging.level = env_config.logging.level;
        }
        if env_config.logging.json_format {
            self.logging.json_format = true;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject thresholds outside `[0, 1]`
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            (
                "resolution.constituency_threshold",
                self.resolution.constituency_threshold,
            ),
            (
                "resolution.fuzzy_last_name_threshold",
                self.resolution.fuzzy_last_name_threshold,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        })
}

/// Segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Bodies with this many characters or fewer are dropped
    pub min_body_chars: usize,

    /// Remove page-header lines that repeat a speaker name
    pub strip_name_headers: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            min_body_chars: 30,
            strip_name_headers: true,
        }
    }
}

/// Annotation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Marker numbering policy
    pub numbering: PositionNumbering,
}

/// How `{n}` markers are numbered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionNumbering {
    /// Left to right in the original text
    #[default]
    DocumentOrder,
    /// In the order spans are replaced (right to left)
    ScanOrder,
}

impl std::str::FromStr for PositionNumbering {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "document_order" | "document" => Ok(Self::DocumentOrder),
            "scan_order" | "scan" => Ok(Self::ScanOrder),
            _ => Err(ConfigError::InvalidValue {
                key: "PLENAR_NUMBERING".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Entity resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Constituency similarity must exceed this
    pub constituency_threshold: f64,

    /// Fuzzy last-name similarity must reach this
    pub fuzzy_last_name_threshold: f64,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            constituency_threshold: 0.7,
            fuzzy_last_name_threshold: 0.8,
        }
    }
}

/// Batch processing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker threads, 0 for the thread pool default
    pub workers: usize,

    /// Wall-clock budget per transcript in milliseconds
    pub transcript_budget_ms: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
