use call_events::CandidateOutcomePolicy;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ApiConfig {
    pub cors: Option<CorsConfig>,
    pub server: Option<ServerConfig>,
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub webhooks: WebhookConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebhookConfig {
    /// Answer 200 even when the store rejected a write, so the provider
    /// does not redeliver. Failed bodies stay in the delivery log for replay.
    #[serde(default = "default_true")]
    pub acknowledge_on_persistence_error: bool,
    #[serde(default)]
    pub candidate_outcome_policy: CandidateOutcomePolicy,
    #[serde(default = "default_true")]
    pub record_deliveries: bool,
    /// Days to keep recorded deliveries. Failed ones are kept until replayed;
    /// 0 keeps everything and the table grows without limit.
    #[serde(default = "default_retention_days")]
    pub delivery_retention_days: u32,
}

fn default_true() -> bool {
    true
}

fn default_retention_days() -> u32 {
    30
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            acknowledge_on_persistence_error: true,
            candidate_outcome_policy: CandidateOutcomePolicy::default(),
            record_deliveries: true,
            delivery_retention_days: default_retention_days(),
        }
    }
}

const DEFAULT_CONFIG: &str = r#"
[cors]
allowed_origins = ["http://localhost:3030"]

[server]
host = "127.0.0.1"
port = 8080

[database]
# path = "/var/lib/campaign-dashboard/db.sqlite"

[webhooks]
# Reply 200 to the voice provider even when a write fails
acknowledge_on_persistence_error = true
# "overwrite" replaces candidate answers on every analysis, "merge" keeps known ones
candidate_outcome_policy = "overwrite"
record_deliveries = true
# Raw bodies older than this are deleted, except failed ones awaiting replay.
# 0 keeps every delivery and the table grows without limit.
delivery_retention_days = 30
"#;

impl ApiConfig {
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        Self::load_from(&get_config_path())
    }

    /// Load from `config_path`, writing the default file first if it is missing.
    /// `CAMPAIGN_API_*` environment variables override file values.
    pub fn load_from(config_path: &Path) -> Result<(Self, PathBuf), ConfigError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            std::fs::write(config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.to_path_buf()))
            .add_source(
                Environment::with_prefix("CAMPAIGN_API")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ApiConfig = builder.try_deserialize()?;

        Ok((config, config_path.to_path_buf()))
    }

    pub fn host_and_port(&self) -> (String, u16) {
        match &self.server {
            Some(server) => (server.host.clone(), server.port),
            None => ("127.0.0.1".to_string(), 8080),
        }
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("campaign-dashboard").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}
