use crate::domain::ports::RecurringInvoiceStore;
use crate::domain::recurring::RecurringInvoice;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for recurring invoices.
///
/// Keeps insertion order so listings match the order invoices were scheduled.
#[derive(Default, Clone)]
pub struct InMemoryRecurringInvoiceStore {
    invoices: Arc<RwLock<Vec<RecurringInvoice>>>,
}

impl InMemoryRecurringInvoiceStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `invoices`, e.g. from a ledger file.
    pub fn with_invoices(invoices: Vec<RecurringInvoice>) -> Self {
        Self {
            invoices: Arc::new(RwLock::new(invoices)),
        }
    }
}

#[async_trait]
impl RecurringInvoiceStore for InMemoryRecurringInvoiceStore {
    async fn store(&self, invoice: RecurringInvoice) -> Result<()> {
        let mut invoices = self.invoices.write().await;
        match invoices.iter_mut().find(|existing| existing.id == invoice.id) {
            Some(existing) => *existing = invoice,
            None => invoices.push(invoice),
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<RecurringInvoice>> {
        let invoices = self.invoices.read().await;
        Ok(invoices.iter().find(|invoice| invoice.id == id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<RecurringInvoice>> {
        let invoices = self.invoices.read().await;
        Ok(invoices.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recurring::RecurrenceFrequency;
    use chrono::NaiveDate;

    fn invoice(id: &str) -> RecurringInvoice {
        RecurringInvoice::new(
            id.to_string(),
            "Acme".to_string(),
            Vec::new(),
            RecurrenceFrequency::Weekly,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_in_memory_store_get() {
        let store = InMemoryRecurringInvoiceStore::new();
        store.store(invoice("recur_1")).await.unwrap();

        let retrieved = store.get("recur_1").await.unwrap().unwrap();
        assert_eq!(retrieved, invoice("recur_1"));
        assert!(store.get("recur_2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_store_replaces_by_id_and_keeps_order() {
        let store = InMemoryRecurringInvoiceStore::with_invoices(vec![invoice("a"), invoice("b")]);

        let mut updated = invoice("a");
        updated.is_due_for_approval = true;
        store.store(updated.clone()).await.unwrap();
        store.store(invoice("c")).await.unwrap();

        let all = store.get_all().await.unwrap();
        let ids: Vec<&str> = all.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(all[0], updated);
    }
}
