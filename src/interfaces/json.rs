//! JSON shapes at the process boundary.

use crate::domain::payment::IncomingEvent;
use crate::error::{Result, VaultError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event-bus envelope: `{ source, "detail-type", detail: { token, amount } }`.
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    #[serde(default)]
    source: Option<String>,
    #[serde(default, rename = "detail-type")]
    detail_type: Option<String>,
    detail: IncomingEvent,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IntakeItem {
    Envelope(EventEnvelope),
    Bare(IncomingEvent),
}

/// Converts one JSON value into an event. Anything that doesn't look like
/// an event comes back empty so the dispatcher skips it.
fn event_from_value(value: Value) -> IncomingEvent {
    match serde_json::from_value::<IntakeItem>(value) {
        Ok(IntakeItem::Envelope(envelope)) => {
            tracing::trace!(
                source = envelope.source.as_deref().unwrap_or_default(),
                detail_type = envelope.detail_type.as_deref().unwrap_or_default(),
                "unwrapped event envelope"
            );
            envelope.detail
        }
        Ok(IntakeItem::Bare(event)) => event,
        Err(e) => {
            tracing::warn!(error = %e, "unrecognised event shape");
            IncomingEvent::default()
        }
    }
}

/// Parses a single event or a JSON array of events.
pub fn parse_events(input: &str) -> Result<Vec<IncomingEvent>> {
    let value: Value = serde_json::from_str(input)
        .map_err(|e| VaultError::Validation(format!("invalid JSON: {}", e)))?;
    Ok(match value {
        Value::Array(items) => items.into_iter().map(event_from_value).collect(),
        single => vec![event_from_value(single)],
    })
}

/// Parses one event per non-blank line. A bad line is kept as an empty
/// event rather than failing the batch.
pub fn parse_event_lines(input: &str) -> Vec<IncomingEvent> {
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match serde_json::from_str::<Value>(line) {
            Ok(value) => event_from_value(value),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unparsable event line");
                IncomingEvent::default()
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudCheckResponse {
    pub alerts_created: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub error: String,
}

impl From<&VaultError> for ErrorResponse {
    fn from(err: &VaultError) -> Self {
        Self {
            status_code: err.status_code(),
            error: err.to_string(),
        }
    }
}
