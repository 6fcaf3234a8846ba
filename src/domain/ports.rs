use super::fraud::AlertRecord;
use super::payment::PaymentEvent;
use super::token::TokenRecord;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Reference to a key held by the key-management service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyId(pub String);

impl KeyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait KeyManagement: Send + Sync {
    async fn encrypt(&self, key_id: &KeyId, plaintext: &[u8]) -> Result<Vec<u8>>;
    async fn decrypt(&self, key_id: &KeyId, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Creates a record. Writing an existing token is an error.
    async fn put(&self, record: TokenRecord) -> Result<()>;
    async fn get(&self, token: &str) -> Result<Option<TokenRecord>>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn put(&self, alert: AlertRecord) -> Result<()>;
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: PaymentEvent) -> Result<()>;
}

pub type KeyManagementRef = Arc<dyn KeyManagement>;
pub type TokenStoreRef = Arc<dyn TokenStore>;
pub type AlertStoreRef = Arc<dyn AlertStore>;
pub type EventPublisherRef = Arc<dyn EventPublisher>;
