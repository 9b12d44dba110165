use crate::domain::ports::RecurringInvoiceStore;
use crate::domain::recurring::RecurringInvoice;
use crate::error::Result;
use crate::interfaces::json::ledger::{load_ledger, save_ledger};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// A store backed by a JSON ledger file.
///
/// Every read reloads the file, so edits made by other processes show up on
/// the next call. Writes replace the invoice by id and rewrite the file.
pub struct JsonFileRecurringInvoiceStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileRecurringInvoiceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecurringInvoiceStore for JsonFileRecurringInvoiceStore {
    async fn store(&self, invoice: RecurringInvoice) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut invoices = load_ledger(&self.path)?;
        match invoices.iter_mut().find(|existing| existing.id == invoice.id) {
            Some(existing) => *existing = invoice,
            None => invoices.push(invoice),
        }
        save_ledger(&self.path, &invoices)
    }

    async fn get(&self, id: &str) -> Result<Option<RecurringInvoice>> {
        Ok(load_ledger(&self.path)?.into_iter().find(|invoice| invoice.id == id))
    }

    async fn get_all(&self) -> Result<Vec<RecurringInvoice>> {
        load_ledger(&self.path)
    }
}
