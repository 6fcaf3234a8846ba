use crate::domain::payment::PaymentEvent;
use crate::domain::ports::EventPublisher;
use crate::error::{Result, VaultError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, mpsc};

/// In-process event bus backed by an unbounded tokio channel.
#[derive(Clone)]
pub struct ChannelEventBus {
    sender: mpsc::UnboundedSender<PaymentEvent>,
}

impl ChannelEventBus {
    /// Creates the bus and the receiving end consumers read from.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PaymentEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EventPublisher for ChannelEventBus {
    async fn publish(&self, event: PaymentEvent) -> Result<()> {
        self.sender
            .send(event)
            .map_err(|_| VaultError::Emission("event bus receiver closed".to_string()))
    }
}

/// Appends each event as one JSON line to a file.
///
/// The fraud intake reads the same format, so the file doubles as a
/// simple outbox between the payment and fraud processes.
pub struct JsonLinesOutbox {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesOutbox {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EventPublisher for JsonLinesOutbox {
    async fn publish(&self, event: PaymentEvent) -> Result<()> {
        let mut line = serde_json::to_vec(&event)
            .map_err(|e| VaultError::Emission(format!("Serialization error: {}", e)))?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| VaultError::Emission(format!("cannot open outbox: {}", e)))?;
        file.write_all(&line)
            .await
            .map_err(|e| VaultError::Emission(format!("cannot write outbox: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| VaultError::Emission(format!("cannot flush outbox: {}", e)))?;
        Ok(())
    }
}
