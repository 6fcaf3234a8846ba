use super::payment::PaymentEvent;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Amounts strictly above this are flagged as `HIGH_AMOUNT`.
pub const HIGH_AMOUNT_THRESHOLD: Decimal = dec!(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    HighAmount,
    NegativeAmount,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::HighAmount => "HIGH_AMOUNT",
            ReasonCode::NegativeAmount => "NEGATIVE_AMOUNT",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deterministic predicate over a payment event.
pub trait FraudRule: Send + Sync {
    fn check(&self, event: &PaymentEvent) -> Option<ReasonCode>;
}

pub struct HighAmountRule {
    pub threshold: Decimal,
}

impl FraudRule for HighAmountRule {
    fn check(&self, event: &PaymentEvent) -> Option<ReasonCode> {
        (event.amount > self.threshold).then_some(ReasonCode::HighAmount)
    }
}

pub struct NegativeAmountRule;

impl FraudRule for NegativeAmountRule {
    fn check(&self, event: &PaymentEvent) -> Option<ReasonCode> {
        (event.amount < Decimal::ZERO).then_some(ReasonCode::NegativeAmount)
    }
}

/// Ordered list of rules. Every rule is evaluated; each fires at most once.
pub struct RuleSet {
    rules: Vec<Box<dyn FraudRule>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Box<dyn FraudRule>>) -> Self {
        Self { rules }
    }

    /// The default rules with a custom high-amount threshold.
    pub fn with_high_amount_threshold(threshold: Decimal) -> Self {
        Self::new(vec![
            Box::new(HighAmountRule { threshold }),
            Box::new(NegativeAmountRule),
        ])
    }

    pub fn push(&mut self, rule: Box<dyn FraudRule>) {
        self.rules.push(rule);
    }

    pub fn evaluate(&self, event: &PaymentEvent) -> Vec<ReasonCode> {
        self.rules.iter().filter_map(|rule| rule.check(event)).collect()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::with_high_amount_threshold(HIGH_AMOUNT_THRESHOLD)
    }
}

/// An alert for one suspicious payment event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub alert_id: Uuid,
    pub token: String,
    pub amount: Decimal,
    pub reasons: Vec<ReasonCode>,
    pub timestamp: DateTime<Utc>,
}

impl AlertRecord {
    /// Returns `None` if no rule fired; an alert never has empty `reasons`.
    pub fn new(event: &PaymentEvent, reasons: Vec<ReasonCode>) -> Option<Self> {
        if reasons.is_empty() {
            return None;
        }
        Some(Self {
            alert_id: Uuid::new_v4(),
            token: event.token.clone(),
            amount: event.amount,
            reasons,
            timestamp: Utc::now(),
        })
    }

    /// Reasons joined with `,`.
    pub fn reasons_joined(&self) -> String {
        self.reasons
            .iter()
            .map(ReasonCode::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(amount: Decimal) -> PaymentEvent {
        PaymentEvent {
            token: "tok".to_string(),
            amount,
        }
    }

    #[test]
    fn test_thresholds_are_strict() {
        let rules = RuleSet::default();
        assert!(rules.evaluate(&event(dec!(5000))).is_empty());
        assert!(rules.evaluate(&event(dec!(0))).is_empty());
        assert_eq!(
            rules.evaluate(&event(dec!(5000.01))),
            vec![ReasonCode::HighAmount]
        );
        assert_eq!(
            rules.evaluate(&event(dec!(-0.01))),
            vec![ReasonCode::NegativeAmount]
        );
    }

    #[test]
    fn test_rules_never_both_fire_by_default() {
        let rules = RuleSet::default();
        for amount in [dec!(-5001), dec!(-1), dec!(0), dec!(1), dec!(4999.99), dec!(5001), dec!(1000000000)] {
            assert!(rules.evaluate(&event(amount)).len() <= 1);
        }
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let rules = RuleSet::default();
        let e = event(dec!(7000));
        assert_eq!(rules.evaluate(&e), rules.evaluate(&e));
    }

    #[test]
    fn test_reasons_keep_rule_order() {
        // A negative threshold lets both rules fire on the same amount.
        let rules = RuleSet::with_high_amount_threshold(dec!(-100));
        assert_eq!(
            rules.evaluate(&event(dec!(-1))),
            vec![ReasonCode::HighAmount, ReasonCode::NegativeAmount]
        );
    }

    #[test]
    fn test_custom_rule() {
        struct TokenPrefix;
        impl FraudRule for TokenPrefix {
            fn check(&self, event: &PaymentEvent) -> Option<ReasonCode> {
                event.token.starts_with("blocked-").then_some(ReasonCode::HighAmount)
            }
        }

        let mut rules = RuleSet::new(Vec::new());
        rules.push(Box::new(TokenPrefix));
        assert_eq!(
            rules.evaluate(&PaymentEvent {
                token: "blocked-1".into(),
                amount: dec!(1)
            }),
            vec![ReasonCode::HighAmount]
        );
    }

    #[test]
    fn test_alert_requires_reasons() {
        assert!(AlertRecord::new(&event(dec!(10)), Vec::new()).is_none());

        let alert = AlertRecord::new(&event(dec!(6000)), vec![ReasonCode::HighAmount]).unwrap();
        assert_eq!(alert.token, "tok");
        assert_eq!(alert.amount, dec!(6000));
        assert_eq!(alert.reasons_joined(), "HIGH_AMOUNT");
    }

    #[test]
    fn test_reason_code_serialization() {
        let json = serde_json::to_string(&vec![ReasonCode::HighAmount, ReasonCode::NegativeAmount])
            .unwrap();
        assert_eq!(json, r#"["HIGH_AMOUNT","NEGATIVE_AMOUNT"]"#);
    }
}
