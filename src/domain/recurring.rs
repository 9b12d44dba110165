use crate::domain::invoice::{Invoice, InvoiceItem, InvoiceTotals};
use crate::error::{PilotError, Result};
use chrono::{DateTime, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceFrequency::Daily => "daily",
            RecurrenceFrequency::Weekly => "weekly",
            RecurrenceFrequency::Monthly => "monthly",
            RecurrenceFrequency::Yearly => "yearly",
        }
    }
}

impl fmt::Display for RecurrenceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecurrenceFrequency {
    type Err = PilotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(RecurrenceFrequency::Daily),
            "weekly" => Ok(RecurrenceFrequency::Weekly),
            "monthly" => Ok(RecurrenceFrequency::Monthly),
            "yearly" => Ok(RecurrenceFrequency::Yearly),
            other => Err(PilotError::ValidationError(format!(
                "Unknown recurrence frequency '{other}'"
            ))),
        }
    }
}

/// Returns the occurrence after `date`.
///
/// Month and year steps clamp to the last day of a shorter month, so
/// 2024-01-31 monthly is 2024-02-29 and 2024-02-29 yearly is 2025-02-28.
pub fn compute_next_occurrence(
    date: NaiveDate,
    frequency: RecurrenceFrequency,
) -> Result<NaiveDate> {
    let next = match frequency {
        RecurrenceFrequency::Daily => date.checked_add_days(Days::new(1)),
        RecurrenceFrequency::Weekly => date.checked_add_days(Days::new(7)),
        RecurrenceFrequency::Monthly => date.checked_add_months(Months::new(1)),
        RecurrenceFrequency::Yearly => date.checked_add_months(Months::new(12)),
    };
    next.ok_or_else(|| PilotError::DateOutOfRange(format!("{date} + one {frequency} step")))
}

fn default_true() -> bool {
    true
}

/// An invoice template that is redrafted on a fixed schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringInvoice {
    pub id: String,
    pub customer_name: String,
    pub items: Vec<InvoiceItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default = "default_true")]
    pub is_recurring: bool,
    pub recurrence_frequency: RecurrenceFrequency,
    pub start_date: NaiveDate,
    pub next_due_date: NaiveDate,
    #[serde(default)]
    pub is_due_for_approval: bool,
}

impl RecurringInvoice {
    /// A freshly scheduled invoice whose first occurrence is `start_date`.
    pub fn new(
        id: String,
        customer_name: String,
        items: Vec<InvoiceItem>,
        frequency: RecurrenceFrequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            customer_name,
            items,
            notes: None,
            payment_method: None,
            is_recurring: true,
            recurrence_frequency: frequency,
            start_date,
            next_due_date: start_date,
            is_due_for_approval: false,
        }
    }

    pub fn totals(&self) -> InvoiceTotals {
        InvoiceTotals::from_items(&self.items)
    }

    /// Whether the next occurrence has been reached at `now`.
    ///
    /// The due date counts from midnight UTC.
    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        self.next_due_date.and_time(NaiveTime::MIN).and_utc() <= now
    }

    /// Flags the invoice for approval if it has come due. Returns true only
    /// when the flag changed.
    pub fn mark_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_due_for_approval && self.is_due_at(now) {
            self.is_due_for_approval = true;
            true
        } else {
            false
        }
    }

    /// Advances the schedule and returns the one-off draft for this occurrence.
    ///
    /// The draft is due on the day of approval.
    pub fn approve(&mut self, now: DateTime<Utc>) -> Result<Invoice> {
        let next = compute_next_occurrence(self.next_due_date, self.recurrence_frequency)?;
        self.is_due_for_approval = false;
        self.next_due_date = next;

        Ok(Invoice {
            customer_name: self.customer_name.clone(),
            items: self.items.clone(),
            due_date: now.date_naive(),
            notes: self.notes.clone(),
            payment_method: self.payment_method.clone(),
        })
    }
}

/// Flags every invoice that has come due by `now`.
///
/// Invoices already flagged are left untouched, so repeated checks with the
/// same `now` give the same result.
pub fn check_due_invoices(
    invoices: impl IntoIterator<Item = RecurringInvoice>,
    now: DateTime<Utc>,
) -> Vec<RecurringInvoice> {
    invoices
        .into_iter()
        .map(|mut invoice| {
            invoice.mark_if_due(now);
            invoice
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice(next_due: NaiveDate) -> RecurringInvoice {
        let mut invoice = RecurringInvoice::new(
            "recur_1".to_string(),
            "Acme".to_string(),
            vec![InvoiceItem {
                description: "Retainer".to_string(),
                quantity: dec!(1),
                unit_price: dec!(500),
            }],
            RecurrenceFrequency::Monthly,
            next_due,
        );
        invoice.notes = Some("Thanks!".to_string());
        invoice.payment_method = Some("PayPal".to_string());
        invoice
    }

    #[test]
    fn test_next_occurrence_steps() {
        let start = date(2024, 3, 10);
        assert_eq!(
            compute_next_occurrence(start, RecurrenceFrequency::Daily).unwrap(),
            date(2024, 3, 11)
        );
        assert_eq!(
            compute_next_occurrence(start, RecurrenceFrequency::Weekly).unwrap(),
            date(2024, 3, 17)
        );
        assert_eq!(
            compute_next_occurrence(start, RecurrenceFrequency::Monthly).unwrap(),
            date(2024, 4, 10)
        );
        assert_eq!(
            compute_next_occurrence(start, RecurrenceFrequency::Yearly).unwrap(),
            date(2025, 3, 10)
        );
    }

    #[test]
    fn test_month_end_clamps() {
        assert_eq!(
            compute_next_occurrence(date(2024, 1, 31), RecurrenceFrequency::Monthly).unwrap(),
            date(2024, 2, 29)
        );
        assert_eq!(
            compute_next_occurrence(date(2023, 1, 31), RecurrenceFrequency::Monthly).unwrap(),
            date(2023, 2, 28)
        );
        assert_eq!(
            compute_next_occurrence(date(2024, 2, 29), RecurrenceFrequency::Yearly).unwrap(),
            date(2025, 2, 28)
        );
        assert_eq!(
            compute_next_occurrence(date(2024, 12, 31), RecurrenceFrequency::Daily).unwrap(),
            date(2025, 1, 1)
        );
    }

    #[test]
    fn test_next_occurrence_out_of_range() {
        assert!(matches!(
            compute_next_occurrence(NaiveDate::MAX, RecurrenceFrequency::Daily),
            Err(PilotError::DateOutOfRange(_))
        ));
    }

    #[test]
    fn test_frequency_parsing() {
        assert_eq!(
            "Weekly".parse::<RecurrenceFrequency>().unwrap(),
            RecurrenceFrequency::Weekly
        );
        assert!("fortnightly".parse::<RecurrenceFrequency>().is_err());
    }

    #[test]
    fn test_check_due_flags_reached_dates_only() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let checked = check_due_invoices(
            vec![
                invoice(date(2024, 4, 30)),
                invoice(date(2024, 5, 1)),
                invoice(date(2024, 5, 2)),
            ],
            now,
        );
        let flags: Vec<bool> = checked.iter().map(|i| i.is_due_for_approval).collect();
        assert_eq!(flags, vec![true, true, false]);
    }

    #[test]
    fn test_check_due_is_idempotent() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let once = check_due_invoices(vec![invoice(date(2024, 5, 1))], now);
        let twice = check_due_invoices(once.clone(), now);
        assert_eq!(once, twice);

        let mut flagged = twice[0].clone();
        assert!(!flagged.mark_if_due(now));
    }

    #[test]
    fn test_approve_advances_and_drafts() {
        let mut recurring = invoice(date(2024, 1, 31));
        recurring.is_due_for_approval = true;
        let now = Utc.with_ymd_and_hms(2024, 2, 2, 15, 30, 0).unwrap();

        let draft = recurring.approve(now).unwrap();

        assert!(!recurring.is_due_for_approval);
        assert_eq!(recurring.next_due_date, date(2024, 2, 29));
        assert_eq!(recurring.start_date, date(2024, 1, 31));
        assert_eq!(draft.customer_name, "Acme");
        assert_eq!(draft.items, recurring.items);
        assert_eq!(draft.due_date, date(2024, 2, 2));
        assert_eq!(draft.notes.as_deref(), Some("Thanks!"));
        assert_eq!(draft.payment_method.as_deref(), Some("PayPal"));
    }

    #[test]
    fn test_recurring_json_round_trip_fields() {
        let json = r#"{
            "id": "recur_42",
            "customerName": "Globex",
            "items": [{"description": "Hosting", "quantity": 1, "unitPrice": 20}],
            "recurrenceFrequency": "weekly",
            "startDate": "2024-01-01",
            "nextDueDate": "2024-01-08"
        }"#;
        let invoice: RecurringInvoice = serde_json::from_str(json).unwrap();
        assert!(invoice.is_recurring);
        assert!(!invoice.is_due_for_approval);
        assert_eq!(invoice.recurrence_frequency, RecurrenceFrequency::Weekly);

        let value = serde_json::to_value(&invoice).unwrap();
        assert_eq!(value["nextDueDate"], "2024-01-08");
        assert_eq!(value["isDueForApproval"], false);
    }
}
