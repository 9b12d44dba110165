use super::recurring::RecurringInvoice;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::time::Duration;

#[async_trait]
pub trait RecurringInvoiceStore: Send + Sync {
    async fn store(&self, invoice: RecurringInvoice) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<RecurringInvoice>>;
    async fn get_all(&self) -> Result<Vec<RecurringInvoice>>;
}

/// Waits out the delay between terminal stages.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    /// The local calendar date, used for card expiry checks.
    fn today(&self) -> NaiveDate;
}

pub type RecurringInvoiceStoreBox = Box<dyn RecurringInvoiceStore>;
pub type SchedulerBox = Box<dyn Scheduler>;
pub type ClockBox = Box<dyn Clock>;
