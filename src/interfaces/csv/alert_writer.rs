use crate::domain::fraud::AlertRecord;
use crate::error::{Result, VaultError};
use std::io::Write;

pub const ALERT_HEADER: [&str; 5] = ["alert_id", "token", "amount", "reasons", "timestamp"];

/// Writes alerts as CSV rows. Reasons are joined with `,`.
pub struct AlertWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AlertWriter<W> {
    pub fn new(sink: W, with_header: bool) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        if with_header {
            writer.write_record(ALERT_HEADER).map_err(write_error)?;
        }
        Ok(Self { writer })
    }

    pub fn write_alert(&mut self, alert: &AlertRecord) -> Result<()> {
        self.writer
            .write_record([
                alert.alert_id.to_string(),
                alert.token.clone(),
                alert.amount.to_string(),
                alert.reasons_joined(),
                alert.timestamp.to_rfc3339(),
            ])
            .map_err(write_error)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying sink.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| VaultError::Store(format!("CSV write error: {}", e.error())))
    }
}

fn write_error(e: csv::Error) -> VaultError {
    VaultError::Store(format!("CSV write error: {}", e))
}
