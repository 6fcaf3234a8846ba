use crate::domain::ports::{KeyId, KeyManagementRef, TokenStoreRef};
use crate::domain::token::{AccountNumber, Last4, TokenRecord, generate_token};
use crate::error::{Result, VaultError};
use serde::Serialize;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenizeResponse {
    pub token: String,
    pub last4: Last4,
}

/// Swaps account numbers for opaque tokens.
pub struct TokenizationService {
    kms: KeyManagementRef,
    tokens: TokenStoreRef,
    key_id: KeyId,
}

impl TokenizationService {
    pub fn new(kms: KeyManagementRef, tokens: TokenStoreRef, key_id: KeyId) -> Self {
        Self {
            kms,
            tokens,
            key_id,
        }
    }

    /// Encrypts the account number and stores it under a fresh token.
    ///
    /// Nothing is written if validation or encryption fails.
    #[instrument(skip_all)]
    pub async fn tokenize(&self, account_number: &str) -> Result<TokenizeResponse> {
        let account = AccountNumber::parse(account_number)?;
        let ciphertext = self
            .kms
            .encrypt(&self.key_id, account.as_bytes())
            .await
            .inspect_err(log_internal)?;

        let token = generate_token();
        let last4 = account.last4();
        self.tokens
            .put(TokenRecord::new(token.clone(), ciphertext, last4.clone()))
            .await
            .inspect_err(log_internal)?;

        info!(token = %token, "tokenized account");
        Ok(TokenizeResponse { token, last4 })
    }
}

fn log_internal(err: &VaultError) {
    error!(
        status = err.status_code(),
        detail = err.detail().unwrap_or_default(),
        "tokenization failed"
    );
}
