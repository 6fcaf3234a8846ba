use crate::domain::fraud::{AlertRecord, RuleSet};
use crate::domain::payment::{IncomingEvent, PaymentEvent};
use crate::domain::ports::AlertStoreRef;
use crate::error::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

/// Consumes payment events, evaluates the fraud rules and stores alerts.
pub struct FraudDispatcher {
    rules: RuleSet,
    alerts: AlertStoreRef,
}

impl FraudDispatcher {
    pub fn new(rules: RuleSet, alerts: AlertStoreRef) -> Self {
        Self { rules, alerts }
    }

    /// Handles one event and returns the number of alerts created (0 or 1).
    ///
    /// Events missing a token or an amount are skipped without evaluation.
    pub async fn handle(&self, incoming: IncomingEvent) -> Result<usize> {
        let Some(event) = incoming.into_event() else {
            debug!("skipping event without token or amount");
            return Ok(0);
        };

        let reasons = self.rules.evaluate(&event);
        let Some(alert) = AlertRecord::new(&event, reasons) else {
            return Ok(0);
        };

        info!(
            alert_id = %alert.alert_id,
            token = %alert.token,
            amount = %alert.amount,
            reasons = %alert.reasons_joined(),
            "fraud alert raised"
        );
        self.alerts.put(alert).await?;
        Ok(1)
    }

    /// Handles every event in the batch and returns the total alert count.
    ///
    /// A skipped or clean event never stops the rest of the batch. Alert
    /// store faults do propagate.
    #[instrument(skip_all, fields(batch_size))]
    pub async fn dispatch<I>(&self, events: I) -> Result<usize>
    where
        I: IntoIterator<Item = IncomingEvent>,
    {
        let mut created = 0;
        let mut seen = 0usize;
        for incoming in events {
            seen += 1;
            created += self.handle(incoming).await?;
        }
        tracing::Span::current().record("batch_size", seen);
        info!(alerts_created = created, "batch processed");
        Ok(created)
    }

    /// Drains an in-process event bus until every sender is dropped.
    pub async fn consume(
        &self,
        mut events: mpsc::UnboundedReceiver<PaymentEvent>,
    ) -> Result<usize> {
        let mut created = 0;
        while let Some(event) = events.recv().await {
            created += self.handle(event.into()).await?;
        }
        Ok(created)
    }
}
