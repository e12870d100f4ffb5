use std::fs;
use std::path::Path;
use std::time::Duration;

use busline_fleet::config::DEFAULT_SQLITE_NAME;
use busline_fleet::{FleetConfig, FleetError, FleetResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_NAME: &str = "busline.json";
pub const DEFAULT_BIND: &str = "0.0.0.0:9090";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 5_000;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub shutdown_grace_ms: Option<u64>,
    pub cors_origins: Option<Vec<String>>,
    pub log_level: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND.to_string()),
            shutdown_grace_ms: Some(DEFAULT_SHUTDOWN_GRACE_MS),
            cors_origins: Some(vec![DEFAULT_CORS_ORIGIN.to_string()]),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}

impl ServerConfig {
    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms.unwrap_or(DEFAULT_SHUTDOWN_GRACE_MS))
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_origins
            .clone()
            .unwrap_or_else(|| vec![DEFAULT_CORS_ORIGIN.to_string()])
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HubConfig {
    pub fleet: FleetConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl HubConfig {
    pub fn default_sqlite(path: impl Into<String>) -> Self {
        Self {
            fleet: FleetConfig::default_sqlite(path),
            server: ServerConfig::default(),
        }
    }

    /// Read `busline.json` from `base_dir`, writing the defaults on first run.
    pub fn load_or_init(base_dir: &Path) -> FleetResult<Self> {
        fs::create_dir_all(base_dir)
            .map_err(|err| FleetError::storage(format!("create config dir: {err}")))?;
        let config_path = base_dir.join(DEFAULT_CONFIG_NAME);
        if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .map_err(|err| FleetError::storage(format!("read config: {err}")))?;
            let config: HubConfig = serde_json::from_str(&raw).map_err(|err| {
                FleetError::validation(format!("{}: {err}", config_path.display()))
            })?;
            return Ok(config);
        }
        // Stored relative; `FleetConfig::sqlite_path` resolves it under `base_dir`.
        let default = HubConfig::default_sqlite(DEFAULT_SQLITE_NAME);
        let payload = serde_json::to_string_pretty(&default)
            .map_err(|err| FleetError::storage(format!("serialize config: {err}")))?;
        fs::write(&config_path, payload)
            .map_err(|err| FleetError::storage(format!("write config: {err}")))?;
        log::info!("hub: wrote default config to {}", config_path.display());
        Ok(default)
    }

    /// A database URL switches the fleet to PostgreSQL, keeping any pool
    /// settings already configured.
    pub fn apply_overrides(&mut self, database_url: Option<String>, bind: Option<String>) {
        if let Some(url) = database_url {
            let mut fleet = FleetConfig::postgres(url);
            fleet.pool = self.fleet.pool.take().or(fleet.pool);
            fleet.startup = self.fleet.startup.take().or(fleet.startup);
            fleet.notify = self.fleet.notify.take().or(fleet.notify);
            self.fleet = fleet;
        }
        if let Some(bind) = bind {
            self.server.bind = Some(bind);
        }
    }
}
