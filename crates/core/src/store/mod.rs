//! Persistence for runs, status snapshots and failures.

mod memory;
mod sqlite;
mod types;

pub use memory::MemoryStatusStore;
pub use sqlite::SqliteStatusStore;
pub use types::*;

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};

/// Open the backend named in the configuration.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn StatusStore>, StoreError> {
    let store: Arc<dyn StatusStore> = match config.backend {
        StorageBackend::Sqlite => Arc::new(SqliteStatusStore::new(&config.path)?),
        StorageBackend::Memory => Arc::new(MemoryStatusStore::new()),
    };
    tracing::info!(backend = store.backend_name(), "Status store opened");
    Ok(store)
}
