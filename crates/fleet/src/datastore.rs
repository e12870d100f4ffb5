use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::time::sleep;

use crate::config::DEFAULT_SQLITE_NAME;
use crate::notify::PositionNotifier;
use crate::{FleetConfig, FleetError, FleetResult, FleetStore};

pub fn default_sqlite_path(base: &Path) -> PathBuf {
    base.join(DEFAULT_SQLITE_NAME)
}

/// Connect with the bounded startup retry, then initialize the schema.
///
/// Only establishing the pool is retried. A failing migration or seed is
/// returned immediately.
pub async fn open_store(
    config: &FleetConfig,
    base: &Path,
    notifier: Arc<dyn PositionNotifier>,
) -> FleetResult<FleetStore> {
    let startup = config.startup();
    let attempts = startup.attempts();
    let delay = startup.retry_delay();
    let mut attempt = 1;
    let conn = loop {
        match FleetStore::connect_pool(config, base).await {
            Ok(conn) => break conn,
            Err(err) if attempt < attempts => {
                log::warn!(
                    "fleet: {} connect attempt {attempt}/{attempts} failed: {err}; retrying in {}ms",
                    config.backend_name(),
                    delay.as_millis()
                );
                attempt += 1;
                sleep(delay).await;
            }
            Err(err) => {
                log::error!("fleet: giving up after {attempts} connect attempt(s): {err}");
                return Err(FleetError::storage(format!(
                    "could not connect after {attempts} attempt(s): {}",
                    err.message()
                )));
            }
        }
    };
    FleetStore::initialize(conn, notifier).await
}
