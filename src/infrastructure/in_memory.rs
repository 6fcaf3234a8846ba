use crate::domain::fraud::AlertRecord;
use crate::domain::ports::{AlertStore, TokenStore};
use crate::domain::token::TokenRecord;
use crate::error::{Result, VaultError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory token table.
///
/// Uses `Arc<RwLock<HashMap<String, TokenRecord>>>` so clones share the same
/// table. Meant for tests and single-process runs.
#[derive(Default, Clone)]
pub struct InMemoryTokenStore {
    tokens: Arc<RwLock<HashMap<String, TokenRecord>>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn put(&self, record: TokenRecord) -> Result<()> {
        let mut tokens = self.tokens.write().await;
        match tokens.entry(record.token.clone()) {
            Entry::Occupied(_) => Err(VaultError::Store(format!(
                "token {} already exists",
                record.token
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn get(&self, token: &str) -> Result<Option<TokenRecord>> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(token).cloned())
    }
}

/// Append-only in-memory alert table.
#[derive(Default, Clone)]
pub struct InMemoryAlertStore {
    alerts: Arc<RwLock<Vec<AlertRecord>>>,
}

impl InMemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored alert, in insertion order.
    pub async fn alerts(&self) -> Vec<AlertRecord> {
        self.alerts.read().await.clone()
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn put(&self, alert: AlertRecord) -> Result<()> {
        self.alerts.write().await.push(alert);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fraud::ReasonCode;
    use crate::domain::payment::PaymentEvent;
    use crate::domain::token::Last4;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_in_memory_token_store() {
        let store = InMemoryTokenStore::new();
        let record = TokenRecord::new("tok-1".into(), vec![1, 2, 3], Last4::of("1111"));

        store.put(record.clone()).await.unwrap();
        let retrieved = store.get("tok-1").await.unwrap().unwrap();
        assert_eq!(retrieved, record);

        assert!(store.get("tok-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_store_rejects_overwrite() {
        let store = InMemoryTokenStore::new();
        let first = TokenRecord::new("tok-1".into(), vec![1], Last4::of("1111"));
        let second = TokenRecord::new("tok-1".into(), vec![2], Last4::of("2222"));

        store.put(first.clone()).await.unwrap();
        assert!(matches!(store.put(second).await, Err(VaultError::Store(_))));
        assert_eq!(store.get("tok-1").await.unwrap().unwrap(), first);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_in_memory_alert_store() {
        let store = InMemoryAlertStore::new();
        let event = PaymentEvent {
            token: "tok-1".into(),
            amount: dec!(9000),
        };
        let alert = AlertRecord::new(&event, vec![ReasonCode::HighAmount]).unwrap();

        store.put(alert.clone()).await.unwrap();
        assert_eq!(store.alerts().await, vec![alert]);
    }
}
