use crate::domain::payment::{IncomingEvent, parse_amount};
use crate::error::{Result, VaultError};
use serde::Deserialize;
use std::io::Read;

/// Raw row. The amount stays text so large values keep full precision.
#[derive(Debug, Deserialize)]
struct EventRow {
    token: Option<String>,
    amount: Option<String>,
}

impl TryFrom<EventRow> for IncomingEvent {
    type Error = VaultError;

    fn try_from(row: EventRow) -> Result<Self> {
        let amount = match row.amount {
            Some(raw) => Some(
                parse_amount(&raw)
                    .ok_or_else(|| VaultError::Validation(format!("invalid amount: {}", raw)))?,
            ),
            None => None,
        };
        Ok(IncomingEvent {
            token: row.token,
            amount,
        })
    }
}

/// Reads payment events from a CSV source with a `token,amount` header.
///
/// Blank fields come back as `None`, so a row with no amount is still
/// yielded and left for the dispatcher to skip.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes one event per row.
    pub fn events(self) -> impl Iterator<Item = Result<IncomingEvent>> {
        self.reader
            .into_deserialize::<EventRow>()
            .map(|result| result.map_err(VaultError::from).and_then(IncomingEvent::try_from))
    }
}
