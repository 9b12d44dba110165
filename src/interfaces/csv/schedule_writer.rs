use crate::domain::recurring::RecurringInvoice;
use crate::error::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ScheduleRow<'a> {
    id: &'a str,
    customer: &'a str,
    frequency: &'a str,
    next_due_date: NaiveDate,
    due: bool,
    total: Decimal,
}

/// Writes the recurring-invoice schedule as CSV, one row per invoice.
///
/// Totals include tax.
pub struct ScheduleWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ScheduleWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_schedule<'a>(
        &mut self,
        invoices: impl IntoIterator<Item = &'a RecurringInvoice>,
    ) -> Result<()> {
        for invoice in invoices {
            self.writer.serialize(ScheduleRow {
                id: &invoice.id,
                customer: &invoice.customer_name,
                frequency: invoice.recurrence_frequency.as_str(),
                next_due_date: invoice.next_due_date,
                due: invoice.is_due_for_approval,
                total: invoice.totals().rounded().total,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
