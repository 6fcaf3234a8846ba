use rust_decimal::Decimal;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payment request body. Both fields are optional on the wire and checked
/// by the payment service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaymentRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

impl PaymentRequest {
    pub fn new(token: impl Into<String>, amount: Decimal) -> Self {
        Self {
            token: Some(token.into()),
            amount: Some(amount),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Approved,
}

/// Response of an approved payment. `account` is always masked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentReceipt {
    pub token: String,
    pub account: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
}

/// Message emitted after a payment is approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub token: String,
    pub amount: Decimal,
}

/// A payment event as received from the transport, before the
/// missing-field check.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IncomingEvent {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<Decimal>,
}

/// Parses an amount from its textual form.
///
/// Numbers outside the `Decimal` range keep their sign: a positive overflow
/// becomes `Decimal::MAX`, a negative one `Decimal::MIN`, and a nonzero value
/// too small to represent becomes `±1e-28`. Returns `None` for text that is
/// not a number at all.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let text = text.trim();
    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(text)
    } else {
        Decimal::from_str(text)
    };
    if let Ok(amount) = parsed {
        if !amount.is_zero() {
            return Some(amount);
        }
    }

    match text.parse::<f64>() {
        Ok(approx) if approx.is_nan() => None,
        Ok(approx) if approx != 0.0 => Some(saturate(approx)),
        _ => parsed.ok(),
    }
}

fn saturate(approx: f64) -> Decimal {
    match (approx.abs() >= 1.0, approx.is_sign_positive()) {
        (true, true) => Decimal::MAX,
        (true, false) => Decimal::MIN,
        (false, true) => Decimal::new(1, 28),
        (false, false) => Decimal::new(-1, 28),
    }
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(AmountVisitor)
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Option<Decimal>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a numeric amount")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        parse_amount(&v.to_string())
            .map(Some)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Float(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        parse_amount(v)
            .map(Some)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

impl IncomingEvent {
    /// Returns `None` when the token or the amount is missing.
    pub fn into_event(self) -> Option<PaymentEvent> {
        match (self.token, self.amount) {
            (Some(token), Some(amount)) => Some(PaymentEvent { token, amount }),
            _ => None,
        }
    }
}

impl From<PaymentEvent> for IncomingEvent {
    fn from(event: PaymentEvent) -> Self {
        Self {
            token: Some(event.token),
            amount: Some(event.amount),
        }
    }
}
