use crate::domain::invoice::Invoice;
use crate::domain::ports::{ClockBox, RecurringInvoiceStoreBox};
use crate::domain::recurring::{RecurringInvoice, check_due_invoices};
use crate::error::{PilotError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Keeps the recurring-invoice schedule: registers new templates, flags the
/// ones that have come due, and turns approvals into one-off drafts.
pub struct RecurringInvoiceService {
    store: RecurringInvoiceStoreBox,
    clock: ClockBox,
}

impl RecurringInvoiceService {
    pub fn new(store: RecurringInvoiceStoreBox, clock: ClockBox) -> Self {
        Self { store, clock }
    }

    pub async fn schedule(&self, invoice: RecurringInvoice) -> Result<()> {
        tracing::info!(
            id = %invoice.id,
            customer = %invoice.customer_name,
            frequency = %invoice.recurrence_frequency,
            start = %invoice.start_date,
            "Scheduled recurring invoice"
        );
        self.store.store(invoice).await
    }

    pub async fn list(&self) -> Result<Vec<RecurringInvoice>> {
        self.store.get_all().await
    }

    /// Flags invoices that have come due and returns the newly flagged ones.
    pub async fn check_due(&self) -> Result<Vec<RecurringInvoice>> {
        let now = self.clock.now();
        let before = self.store.get_all().await?;
        let after = check_due_invoices(before.iter().cloned(), now);

        let mut flagged = Vec::new();
        for (old, new) in before.iter().zip(after) {
            if old.is_due_for_approval != new.is_due_for_approval {
                tracing::info!(id = %new.id, due = %new.next_due_date, "Recurring invoice is due for approval");
                self.store.store(new.clone()).await?;
                flagged.push(new);
            }
        }
        Ok(flagged)
    }

    /// Approves the current occurrence of `id`, advancing its schedule.
    pub async fn approve(&self, id: &str) -> Result<Invoice> {
        let mut invoice = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| PilotError::InvoiceNotFound(id.to_string()))?;

        let draft = invoice.approve(self.clock.now())?;
        tracing::info!(id, next = %invoice.next_due_date, "Approved recurring invoice");
        self.store.store(invoice).await?;
        Ok(draft)
    }

    /// Runs `check_due` every `every` until `shutdown` resolves.
    ///
    /// A failed check is logged and the next tick tries again.
    pub async fn poll_until<F>(&self, every: Duration, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Stopping recurring invoice poller");
                    return Ok(());
                }
                _ = interval.tick() => {
                    if let Err(e) = self.check_due().await {
                        tracing::warn!(error = %e, "Recurring invoice check failed");
                    }
                }
            }
        }
    }
}
