#![allow(dead_code)]

use cardvault::application::fraud::FraudDispatcher;
use cardvault::application::payments::PaymentService;
use cardvault::application::tokenization::TokenizationService;
use cardvault::domain::auth::{AccessPolicy, AuthorizationClaims, DEFAULT_PAYMENTS_SCOPE};
use cardvault::domain::fraud::RuleSet;
use cardvault::domain::payment::PaymentEvent;
use cardvault::domain::ports::KeyId;
use cardvault::infrastructure::event_bus::ChannelEventBus;
use cardvault::infrastructure::in_memory::{InMemoryAlertStore, InMemoryTokenStore};
use cardvault::infrastructure::local_kms::LocalKms;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Base64 of the bytes 0x00..=0x1f.
pub const TEST_MASTER_KEY: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";
pub const TPP_CLIENT: &str = "tpp-client-1";
pub const KEY_ID: &str = "alias/cardvault-test";

pub struct Vault {
    pub tokenization: TokenizationService,
    pub payments: PaymentService,
    pub fraud: FraudDispatcher,
    pub tokens: InMemoryTokenStore,
    pub alerts: InMemoryAlertStore,
    pub events: UnboundedReceiver<PaymentEvent>,
}

/// Wires every service against in-memory adapters sharing one KMS.
pub fn vault() -> Vault {
    let kms = Arc::new(LocalKms::from_base64(KeyId::new(KEY_ID), TEST_MASTER_KEY).unwrap());
    let tokens = InMemoryTokenStore::new();
    let alerts = InMemoryAlertStore::new();
    let (bus, events) = ChannelEventBus::new();

    Vault {
        tokenization: TokenizationService::new(
            kms.clone(),
            Arc::new(tokens.clone()),
            KeyId::new(KEY_ID),
        ),
        payments: PaymentService::new(
            AccessPolicy::new(TPP_CLIENT, DEFAULT_PAYMENTS_SCOPE),
            kms,
            Arc::new(tokens.clone()),
            Arc::new(bus),
            KeyId::new(KEY_ID),
        ),
        fraud: FraudDispatcher::new(RuleSet::default(), Arc::new(alerts.clone())),
        tokens,
        alerts,
        events,
    }
}

pub fn valid_claims() -> AuthorizationClaims {
    AuthorizationClaims::new(Some(TPP_CLIENT), Some("openid payments-api/payments.tpp"))
}
