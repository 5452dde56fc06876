//! RpiRegistry — redb-backed persistence for provider records.
//!
//! Records are JSON-serialized into redb's `&[u8]` value column. The
//! registry supports both on-disk and in-memory backends (the latter for
//! testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::tables::PROVIDERS;
use crate::types::RpiInfo;

/// Convert any `Display` error into a `RegistryError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| RegistryError::$variant(e.to_string())
    };
}

/// Thread-safe provider registry backed by redb.
#[derive(Clone)]
pub struct RpiRegistry {
    db: Arc<Database>,
}

impl RpiRegistry {
    /// Open (or create) a persistent registry at the given path.
    pub fn open(path: &Path) -> RegistryResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let registry = Self { db: Arc::new(db) };
        registry.ensure_tables()?;
        debug!(?path, "provider registry opened");
        Ok(registry)
    }

    /// Create an ephemeral in-memory registry (for testing).
    pub fn open_in_memory() -> RegistryResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let registry = Self { db: Arc::new(db) };
        registry.ensure_tables()?;
        debug!("in-memory provider registry opened");
        Ok(registry)
    }

    fn ensure_tables(&self) -> RegistryResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(PROVIDERS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Insert or replace a provider record.
    pub fn add_rpi(&self, rpi: &RpiInfo) -> RegistryResult<()> {
        rpi.validate()?;
        let value = serde_json::to_vec(rpi).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(PROVIDERS).map_err(map_err!(Table))?;
            table
                .insert(rpi.name.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(name = %rpi.name, url = %rpi.url, "provider stored");
        Ok(())
    }

    /// Fetch one provider by name.
    pub fn get_rpi(&self, name: &str) -> RegistryResult<Option<RpiInfo>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PROVIDERS).map_err(map_err!(Table))?;
        match table.get(name).map_err(map_err!(Read))? {
            Some(guard) => {
                let rpi: RpiInfo =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(rpi))
            }
            None => Ok(None),
        }
    }

    /// List all providers, ordered by name.
    pub fn list_rpis(&self) -> RegistryResult<Vec<RpiInfo>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PROVIDERS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let rpi: RpiInfo =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(rpi);
        }
        Ok(results)
    }

    /// Delete a provider. Fails with `NotFound` if it was never registered.
    pub fn delete_rpi(&self, name: &str) -> RegistryResult<()> {
        if self.get_rpi(name)?.is_none() {
            return Err(RegistryError::NotFound(name.to_string()));
        }
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(PROVIDERS).map_err(map_err!(Table))?;
            table.remove(name).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%name, "provider deleted");
        Ok(())
    }
}
