//! Loading the engine's TOML settings
//!
//! The file is read once; the same bytes are parsed and hashed, so the hash
//! logged at startup always describes the settings actually in effect.

use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Parses and validates settings from TOML text
///
/// Missing `[pool]` and `[prober]` sections fall back to their defaults;
/// `[user-agent]` and `[output]` are required.
///
/// ```
/// use url_insight::config::parse_config;
///
/// let config = parse_config(r#"
/// [pool]
/// workers = 2
///
/// [user-agent]
/// crawler-name = "InsightBot"
/// crawler-version = "0.1"
/// contact-url = "https://example.com/bot"
///
/// [output]
/// database-path = "insight.db"
/// "#).unwrap();
///
/// assert_eq!(config.pool.workers, 2);
/// assert_eq!(config.prober.max_concurrent_probes, 8);
/// ```
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex-encoded SHA-256 of configuration text
pub fn hash_content(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Reads, parses and validates the settings file at `path`
///
/// ```no_run
/// use std::path::Path;
/// use url_insight::config::load_config;
/// use url_insight::PoolConfig;
///
/// let config = load_config(Path::new("insight.toml")).unwrap();
/// let pool = PoolConfig::from_settings(&config.pool);
/// println!("{} workers, {:?} per page", pool.workers, pool.task_timeout);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Hash of the settings file at `path`, without parsing it
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(hash_content(&std::fs::read_to_string(path)?))
}

/// Loads the settings file and returns it with the hash of the text it was
/// parsed from
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}
