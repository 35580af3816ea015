use serde::Deserialize;

use redriver_core::RedriverConfig;

/// Daemon configuration: the core redriver sections plus the wiring a
/// standalone instance needs (store location, engine endpoint, alerting).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub store: StoreConfig,
    pub engine: EngineConfig,
    pub alerting: AlertingConfig,
    #[serde(flatten)]
    pub redriver: RedriverConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// RocksDB data directory.
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Endpoint receiving `{"message_id": ...}` submissions.
    pub submit_url: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AlertingConfig {
    /// Webhook receiving dead-letter notices. When unset, notices go to
    /// the log stream instead.
    pub webhook_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            submit_url: "http://localhost:9191/executions".to_string(),
            request_timeout_ms: 5_000,
        }
    }
}
