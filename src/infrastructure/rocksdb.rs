use crate::domain::fraud::AlertRecord;
use crate::domain::ports::{AlertStore, TokenStore};
use crate::domain::token::TokenRecord;
use crate::error::{Result, VaultError};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// Column Family for token records, keyed by token.
pub const CF_TOKENS: &str = "tokens";
/// Column Family for fraud alerts, keyed by alert id.
pub const CF_ALERTS: &str = "alerts";

/// A persistent store implementation using RocksDB.
///
/// Holds both the token table and the alert table in separate Column
/// Families. `Clone` shares the underlying `Arc<DB>` and the token write
/// lock. RocksDB holds an exclusive lock on the directory, so the write lock
/// covers every writer of the token table.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    token_writes: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at `path`, creating the
    /// "tokens" and "alerts" column families if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_tokens = ColumnFamilyDescriptor::new(CF_TOKENS, Options::default());
        let cf_alerts = ColumnFamilyDescriptor::new(CF_ALERTS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_tokens, cf_alerts])?;

        Ok(Self {
            db: Arc::new(db),
            token_writes: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| VaultError::Store(format!("{} column family not found", name)))
    }
}

#[async_trait]
impl TokenStore for RocksDBStore {
    async fn put(&self, record: TokenRecord) -> Result<()> {
        let cf = self.cf(CF_TOKENS)?;
        let key = record.token.as_bytes();
        let value = serde_json::to_vec(&record)?;

        // Create-only: existence check and write happen under one lock.
        let _guard = self
            .token_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.db.get_pinned_cf(cf, key)?.is_some() {
            return Err(VaultError::Store(format!(
                "token {} already exists",
                record.token
            )));
        }

        self.db.put_cf(cf, key, value)?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<TokenRecord>> {
        let cf = self.cf(CF_TOKENS)?;
        match self.db.get_cf(cf, token.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AlertStore for RocksDBStore {
    async fn put(&self, alert: AlertRecord) -> Result<()> {
        let cf = self.cf(CF_ALERTS)?;
        let value = serde_json::to_vec(&alert)?;
        self.db.put_cf(cf, alert.alert_id.as_bytes(), value)?;
        Ok(())
    }
}
