pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::currency::RateStore;
use disk::DiskRateStore;
use memory::MemoryRateStore;
use std::sync::Arc;
use tracing::warn;

/// Opens the on-disk rate store under the data directory, falling back to an
/// in-memory store when the directory or keyspace cannot be opened.
pub fn open_rate_store(config: &AppConfig) -> Arc<dyn RateStore> {
    let opened = config
        .default_data_path()
        .map_err(|e| e.to_string())
        .and_then(|path| DiskRateStore::open(&path.join("rates")).map_err(|e| e.to_string()));

    match opened {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("Rate store unavailable ({}), rates will not be persisted", e);
            Arc::new(MemoryRateStore::new())
        }
    }
}
