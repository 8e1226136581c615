//! Url-Insight: a concurrent URL analysis engine
//!
//! This crate accepts URL records by identifier, fetches and parses each page
//! on a bounded worker pool, and persists structural facts and probed outbound
//! links against the record while moving it through a pollable status lifecycle.

pub mod analyzer;
pub mod config;
pub mod model;
pub mod output;
pub mod pool;
pub mod service;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Url-Insight operations
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Analysis error: {0}")]
    Analyze(#[from] analyzer::AnalyzeError),

    #[error("Pool error: {0}")]
    Pool(#[from] pool::PoolError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Url-Insight operations
pub type Result<T> = std::result::Result<T, InsightError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use analyzer::{HttpPageAnalyzer, PageAnalyzer};
pub use config::Config;
pub use model::{AnalysisResult, HeadingCounts, Link, TaskId, UrlRecord, UrlStatus};
pub use pool::{PoolConfig, WorkerPool};
pub use service::UrlService;
pub use storage::{RecordStore, SqliteStorage};
pub use crate::url::{extract_host, is_external};
