use crate::domain::auth::{AccessPolicy, AuthorizationClaims, Decision};
use crate::domain::payment::{PaymentEvent, PaymentReceipt, PaymentRequest, PaymentStatus};
use crate::domain::ports::{EventPublisherRef, KeyId, KeyManagementRef, TokenStoreRef};
use crate::domain::token::Last4;
use crate::error::{Result, VaultError};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinSet;
use tracing::{Span, error, field, info, instrument, warn};
use zeroize::Zeroizing;

/// Detokenizes for authorized callers and approves payments.
///
/// Approval and fraud analysis are decoupled: the payment event is published
/// on a spawned task after the receipt is built, and a publish failure is
/// only logged.
pub struct PaymentService {
    policy: AccessPolicy,
    kms: KeyManagementRef,
    tokens: TokenStoreRef,
    publisher: EventPublisherRef,
    key_id: KeyId,
    emissions: Mutex<JoinSet<()>>,
}

impl PaymentService {
    pub fn new(
        policy: AccessPolicy,
        kms: KeyManagementRef,
        tokens: TokenStoreRef,
        publisher: EventPublisherRef,
        key_id: KeyId,
    ) -> Self {
        Self {
            policy,
            kms,
            tokens,
            publisher,
            key_id,
            emissions: Mutex::new(JoinSet::new()),
        }
    }

    #[instrument(skip_all, fields(token = field::Empty))]
    pub async fn process_payment(
        &self,
        claims: &AuthorizationClaims,
        request: PaymentRequest,
    ) -> Result<PaymentReceipt> {
        if self.policy.check(claims) == Decision::Deny {
            warn!(
                client_id = claims.client_id.as_deref().unwrap_or("<none>"),
                "payment request denied"
            );
            return Err(VaultError::Unauthorized);
        }

        let (token, amount) = match (request.token, request.amount) {
            (Some(token), Some(amount)) if !token.is_empty() => (token, amount),
            _ => {
                return Err(VaultError::Validation(
                    "token and amount are required".to_string(),
                ));
            }
        };
        Span::current().record("token", token.as_str());

        let record = self
            .tokens
            .get(&token)
            .await
            .inspect_err(log_internal)?
            .ok_or(VaultError::NotFound)?;

        let plaintext = Zeroizing::new(
            self.kms
                .decrypt(&self.key_id, &record.ciphertext)
                .await
                .inspect_err(log_internal)?,
        );
        verify_last4(&plaintext, &record.last4).inspect_err(log_internal)?;
        drop(plaintext);

        let receipt = PaymentReceipt {
            token: token.clone(),
            account: record.last4.masked(),
            amount,
            status: PaymentStatus::Approved,
        };
        info!(amount = %amount, "payment approved");

        self.emit(PaymentEvent { token, amount });
        Ok(receipt)
    }

    /// Waits for outstanding event emissions. Call before a short-lived
    /// process exits.
    pub async fn shutdown(&self) {
        let mut pending = std::mem::take(
            &mut *self
                .emissions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "event emission task aborted");
            }
        }
    }

    fn emit(&self, event: PaymentEvent) {
        let publisher = Arc::clone(&self.publisher);
        let task = async move {
            let token = event.token.clone();
            if let Err(e) = publisher.publish(event).await {
                warn!(
                    token = %token,
                    detail = e.detail().unwrap_or_default(),
                    "payment event emission failed"
                );
            }
        };

        let mut emissions = self
            .emissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while emissions.try_join_next().is_some() {}
        emissions.spawn(task);
    }
}

/// The decrypted account number must end with the stored last four.
fn verify_last4(plaintext: &[u8], expected: &Last4) -> Result<()> {
    let account = std::str::from_utf8(plaintext)
        .map_err(|_| VaultError::Crypto("decrypted account number is not UTF-8".to_string()))?;
    if &Last4::of(account) != expected {
        return Err(VaultError::Crypto(
            "decrypted account number does not match stored last4".to_string(),
        ));
    }
    Ok(())
}

fn log_internal(err: &VaultError) {
    error!(
        status = err.status_code(),
        detail = err.detail().unwrap_or_default(),
        "payment processing failed"
    );
}
