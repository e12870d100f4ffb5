use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{FleetError, FleetResult};

pub const DEFAULT_SQLITE_NAME: &str = "busline.sqlite";
const DEFAULT_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;
const DEFAULT_NOTIFY_CAPACITY: usize = 64;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DatabaseConfig {
    Sqlite { path: Option<String> },
    Postgres { url: String },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub acquire_timeout_ms: Option<u64>,
    pub idle_timeout_ms: Option<u64>,
    pub max_lifetime_ms: Option<u64>,
}

impl PoolConfig {
    /// Sizing used by the production deployment against PostgreSQL.
    pub fn server_defaults() -> Self {
        Self {
            max_connections: Some(80),
            min_connections: Some(4),
            connect_timeout_ms: Some(5_000),
            acquire_timeout_ms: Some(10_000),
            idle_timeout_ms: Some(600_000),
            max_lifetime_ms: Some(3_600_000),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StartupConfig {
    pub max_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

impl StartupConfig {
    pub fn attempts(&self) -> u32 {
        self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS).max(1)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS))
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            retry_delay_ms: Some(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub capacity: Option<usize>,
}

impl NotifyConfig {
    pub fn capacity(&self) -> usize {
        self.capacity.unwrap_or(DEFAULT_NOTIFY_CAPACITY).max(1)
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            capacity: Some(DEFAULT_NOTIFY_CAPACITY),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FleetConfig {
    pub database: DatabaseConfig,
    pub pool: Option<PoolConfig>,
    pub startup: Option<StartupConfig>,
    pub notify: Option<NotifyConfig>,
}

impl FleetConfig {
    pub fn default_sqlite(path: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig::Sqlite {
                path: Some(path.into()),
            },
            pool: None,
            startup: Some(StartupConfig::default()),
            notify: Some(NotifyConfig::default()),
        }
    }

    pub fn postgres(url: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig::Postgres { url: url.into() },
            pool: Some(PoolConfig::server_defaults()),
            startup: Some(StartupConfig::default()),
            notify: Some(NotifyConfig::default()),
        }
    }

    pub fn sqlite_path(&self, base_dir: &Path) -> FleetResult<PathBuf> {
        match &self.database {
            DatabaseConfig::Sqlite { path } => {
                let path = path.clone().unwrap_or_else(|| DEFAULT_SQLITE_NAME.to_string());
                let candidate = PathBuf::from(path);
                if candidate.is_absolute() {
                    Ok(candidate)
                } else {
                    Ok(base_dir.join(candidate))
                }
            }
            DatabaseConfig::Postgres { .. } => {
                Err(FleetError::validation("config is not sqlite backend"))
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.database {
            DatabaseConfig::Sqlite { .. } => "sqlite",
            DatabaseConfig::Postgres { .. } => "postgres",
        }
    }

    pub fn connection_url(&self, base_dir: &Path) -> FleetResult<String> {
        match &self.database {
            DatabaseConfig::Sqlite { .. } => {
                let path = self.sqlite_path(base_dir)?;
                Ok(format!("sqlite://{}?mode=rwc", path.display()))
            }
            DatabaseConfig::Postgres { url } => Ok(url.clone()),
        }
    }

    pub fn startup(&self) -> StartupConfig {
        self.startup.clone().unwrap_or_default()
    }

    pub fn notify(&self) -> NotifyConfig {
        self.notify.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use super::{DatabaseConfig, FleetConfig, StartupConfig};

    #[test]
    fn relative_sqlite_paths_resolve_under_base() {
        let config = FleetConfig::default_sqlite("fleet.sqlite");
        let path = config.sqlite_path(Path::new("/srv/busline")).expect("path");
        assert_eq!(path, Path::new("/srv/busline/fleet.sqlite"));
        let url = config
            .connection_url(Path::new("/srv/busline"))
            .expect("url");
        assert_eq!(url, "sqlite:///srv/busline/fleet.sqlite?mode=rwc");
    }

    #[test]
    fn postgres_url_passes_through() {
        let config = FleetConfig::postgres("postgres://hub:hub@db:5432/hub");
        assert_eq!(config.backend_name(), "postgres");
        assert!(config.sqlite_path(Path::new(".")).is_err());
        assert_eq!(
            config.connection_url(Path::new(".")).expect("url"),
            "postgres://hub:hub@db:5432/hub"
        );
        assert_eq!(config.pool.and_then(|pool| pool.max_connections), Some(80));
    }

    #[test]
    fn startup_defaults_match_fixed_retry_policy() {
        let startup = StartupConfig::default();
        assert_eq!(startup.attempts(), 10);
        assert_eq!(startup.retry_delay(), Duration::from_secs(2));
        let zero = StartupConfig {
            max_attempts: Some(0),
            retry_delay_ms: None,
        };
        assert_eq!(zero.attempts(), 1);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = FleetConfig {
            database: DatabaseConfig::Sqlite { path: None },
            pool: None,
            startup: None,
            notify: None,
        };
        assert_eq!(config.startup().attempts(), 10);
        assert_eq!(config.notify().capacity(), 64);
    }
}
