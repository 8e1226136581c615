use serde::Deserialize;

/// Main configuration structure for Url-Insight
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolSettings,
    #[serde(default)]
    pub prober: ProberSettings,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Worker pool sizing and per-task deadline
#[derive(Debug, Clone, Deserialize)]
pub struct PoolSettings {
    /// Number of concurrent workers draining the task queue
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Capacity of the bounded task queue
    #[serde(rename = "queue-capacity", default = "default_queue_capacity")]
    pub queue_capacity: u32,

    /// Deadline for one analysis attempt (seconds)
    #[serde(rename = "task-timeout-secs", default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            task_timeout_secs: default_task_timeout_secs(),
        }
    }
}

/// Outbound link probe limits
#[derive(Debug, Clone, Deserialize)]
pub struct ProberSettings {
    /// Maximum in-flight probes for a single analysis
    #[serde(rename = "max-concurrent-probes", default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: u32,

    /// Timeout for a single probe request (seconds)
    #[serde(rename = "probe-timeout-secs", default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for ProberSettings {
    fn default() -> Self {
        Self {
            max_concurrent_probes: default_max_concurrent_probes(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_workers() -> u32 {
    4
}

fn default_queue_capacity() -> u32 {
    100
}

fn default_task_timeout_secs() -> u64 {
    60
}

fn default_max_concurrent_probes() -> u32 {
    8
}

fn default_probe_timeout_secs() -> u64 {
    10
}
