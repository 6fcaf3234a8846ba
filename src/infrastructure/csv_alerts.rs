use crate::domain::fraud::AlertRecord;
use crate::domain::ports::AlertStore;
use crate::error::Result;
use crate::interfaces::csv::alert_writer::AlertWriter;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Alert table kept as an append-only CSV file.
pub struct CsvAlertStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvAlertStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl AlertStore for CsvAlertStore {
    async fn put(&self, alert: AlertRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let is_new = file.metadata().await?.len() == 0;

        let mut writer = AlertWriter::new(Vec::new(), is_new)?;
        writer.write_alert(&alert)?;
        file.write_all(&writer.into_inner()?).await?;
        file.flush().await?;
        Ok(())
    }
}
