use crate::error::{Result, VaultError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use zeroize::{ZeroizeOnDrop, Zeroizing};

/// Number of trailing characters kept in clear for display masking.
pub const LAST4_LEN: usize = 4;

/// A sensitive primary account number.
///
/// The wrapper exists so the plaintext can't end up in logs by accident:
/// `Debug` is redacted and there is no `Display` or `Serialize`. The buffer
/// is wiped on drop.
pub struct AccountNumber(Zeroizing<String>);

impl AccountNumber {
    /// Validates the raw input. Empty input and input shorter than
    /// [`LAST4_LEN`] characters are rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(VaultError::Validation("Missing accountNumber".to_string()));
        }
        if raw.chars().count() < LAST4_LEN {
            return Err(VaultError::Validation(
                "accountNumber must have at least 4 characters".to_string(),
            ));
        }
        Ok(Self(Zeroizing::new(raw.to_string())))
    }

    pub fn last4(&self) -> Last4 {
        Last4::of(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl ZeroizeOnDrop for AccountNumber {}

impl fmt::Debug for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountNumber(****{})", self.last4())
    }
}

/// The last four characters of an account number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Last4(String);

impl Last4 {
    /// Takes the final four characters (not bytes) of `value`.
    pub fn of(value: &str) -> Self {
        let skip = value.chars().count().saturating_sub(LAST4_LEN);
        Self(value.chars().skip(skip).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `****` followed by the last four characters.
    pub fn masked(&self) -> String {
        format!("****{}", self.0)
    }
}

impl fmt::Display for Last4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates a fresh random token identifier.
pub fn generate_token() -> String {
    Uuid::new_v4().to_string()
}

/// A persisted token. Created once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: String,
    pub ciphertext: Vec<u8>,
    pub last4: Last4,
    pub created_at: DateTime<Utc>,
}

impl TokenRecord {
    pub fn new(token: String, ciphertext: Vec<u8>, last4: Last4) -> Self {
        Self {
            token,
            ciphertext,
            last4,
            created_at: Utc::now(),
        }
    }
}
