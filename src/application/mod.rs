//! Application layer orchestrating the domain through its ports.
//!
//! `TokenizationService` onboards account numbers, `PaymentService` gates and
//! performs detokenization for payments, and `FraudDispatcher` turns payment
//! events into alerts.

pub mod fraud;
pub mod payments;
pub mod tokenization;
