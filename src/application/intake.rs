//! Turns replies from the generative assistant into invoices.
//!
//! The assistant is asked to answer invoice requests with JSON matching
//! [`invoice_response_schema`]. Anything that does not parse as an invoice is
//! treated as a plain chat message.

use crate::domain::invoice::{Invoice, InvoiceItem};
use crate::domain::recurring::{RecurrenceFrequency, RecurringInvoice};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq)]
pub enum AssistantReply {
    /// A one-off invoice ready for review.
    Draft(Invoice),
    /// A new recurring invoice to add to the schedule.
    Scheduled(RecurringInvoice),
    /// Free text for the conversation.
    Message(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvoiceResponse {
    customer_name: String,
    items: Vec<InvoiceItem>,
    due_date: Option<NaiveDate>,
    notes: Option<String>,
    payment_method: Option<String>,
    #[serde(default)]
    is_recurring: bool,
    recurrence_frequency: Option<RecurrenceFrequency>,
    start_date: Option<NaiveDate>,
}

/// Classifies an assistant response.
///
/// `new_id` is only called when a recurring invoice is created. `today` fills
/// in the due date of a one-off draft when the assistant left it out.
pub fn interpret(response: &str, today: NaiveDate, new_id: impl FnOnce() -> String) -> AssistantReply {
    let parsed: InvoiceResponse = match serde_json::from_str(response.trim()) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(error = %e, "Assistant reply is not an invoice");
            return AssistantReply::Message(response.to_string());
        }
    };

    if parsed.is_recurring
        && let (Some(frequency), Some(start_date)) = (parsed.recurrence_frequency, parsed.start_date)
    {
        let mut invoice = RecurringInvoice::new(
            new_id(),
            parsed.customer_name,
            parsed.items,
            frequency,
            start_date,
        );
        invoice.notes = parsed.notes;
        invoice.payment_method = parsed.payment_method;
        return AssistantReply::Scheduled(invoice);
    }

    AssistantReply::Draft(Invoice {
        customer_name: parsed.customer_name,
        items: parsed.items,
        due_date: parsed.due_date.unwrap_or(today),
        notes: parsed.notes,
        payment_method: parsed.payment_method,
    })
}

/// Id for a newly scheduled recurring invoice.
pub fn new_recurring_id() -> String {
    format!("recur_{}", uuid::Uuid::new_v4().simple())
}

/// Structured-output schema sent with invoice prompts.
pub fn invoice_response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "customerName": {
                "type": "string",
                "description": "The full name of the customer or recipient."
            },
            "items": {
                "type": "array",
                "description": "A list of items or services being invoiced.",
                "items": {
                    "type": "object",
                    "properties": {
                        "description": { "type": "string", "description": "Description of the item or service." },
                        "quantity": { "type": "number", "description": "The quantity of the item." },
                        "unitPrice": { "type": "number", "description": "The price per unit of the item." }
                    },
                    "required": ["description", "quantity", "unitPrice"]
                }
            },
            "dueDate": {
                "type": "string",
                "description": "For one-off invoices, the due date in YYYY-MM-DD format."
            },
            "notes": { "type": "string", "description": "Any additional notes for the customer." },
            "paymentMethod": {
                "type": "string",
                "description": "The requested payment method, if specified (e.g. 'PayPal', 'Venmo', 'Cash App')."
            },
            "isRecurring": {
                "type": "boolean",
                "description": "True if the request is for a recurring, repeating, or subscription invoice."
            },
            "recurrenceFrequency": {
                "type": "string",
                "description": "Frequency of a recurring invoice.",
                "enum": ["daily", "weekly", "monthly", "yearly"]
            },
            "startDate": {
                "type": "string",
                "description": "Start date of a recurring invoice in YYYY-MM-DD format."
            }
        },
        "required": ["customerName", "items"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_one_off_invoice() {
        let response = r#"{
            "customerName": "Acme Corp",
            "items": [{"description": "Logo design", "quantity": 1, "unitPrice": 450}],
            "dueDate": "2024-06-14",
            "paymentMethod": "PayPal"
        }"#;

        let reply = interpret(response, today(), || unreachable!());
        let AssistantReply::Draft(invoice) = reply else {
            panic!("expected a draft, got {reply:?}");
        };
        assert_eq!(invoice.customer_name, "Acme Corp");
        assert_eq!(invoice.due_date, NaiveDate::from_ymd_opt(2024, 6, 14).unwrap());
        assert_eq!(invoice.items[0].unit_price, dec!(450));
        assert_eq!(invoice.payment_method.as_deref(), Some("PayPal"));
    }

    #[test]
    fn test_missing_due_date_defaults_to_today() {
        let response = r#"{"customerName": "Acme", "items": []}"#;
        let AssistantReply::Draft(invoice) = interpret(response, today(), || unreachable!()) else {
            panic!("expected a draft");
        };
        assert_eq!(invoice.due_date, today());
    }

    #[test]
    fn test_recurring_invoice() {
        let response = r#"{
            "customerName": "Client X",
            "items": [{"description": "Monthly retainer", "quantity": 1, "unitPrice": 500}],
            "notes": "Net 15",
            "isRecurring": true,
            "recurrenceFrequency": "monthly",
            "startDate": "2024-07-01"
        }"#;

        let reply = interpret(response, today(), || "recur_test".to_string());
        let AssistantReply::Scheduled(invoice) = reply else {
            panic!("expected a recurring invoice, got {reply:?}");
        };
        assert_eq!(invoice.id, "recur_test");
        assert!(invoice.is_recurring);
        assert_eq!(invoice.recurrence_frequency, RecurrenceFrequency::Monthly);
        assert_eq!(invoice.next_due_date, invoice.start_date);
        assert!(!invoice.is_due_for_approval);
        assert_eq!(invoice.notes.as_deref(), Some("Net 15"));
    }

    #[test]
    fn test_recurring_without_start_date_is_a_draft() {
        let response = r#"{
            "customerName": "Client X",
            "items": [],
            "isRecurring": true,
            "recurrenceFrequency": "weekly"
        }"#;
        assert!(matches!(
            interpret(response, today(), || unreachable!()),
            AssistantReply::Draft(_)
        ));
    }

    #[test]
    fn test_plain_text_and_foreign_json_are_messages() {
        let text = "Sure! What should the invoice include?";
        assert_eq!(
            interpret(text, today(), || unreachable!()),
            AssistantReply::Message(text.to_string())
        );

        let other = r#"{"address": "12 Elm St", "price": 250000}"#;
        assert!(matches!(
            interpret(other, today(), || unreachable!()),
            AssistantReply::Message(_)
        ));
    }

    #[test]
    fn test_recurring_ids_are_unique() {
        let a = new_recurring_id();
        assert!(a.starts_with("recur_"));
        assert_ne!(a, new_recurring_id());
    }

    #[test]
    fn test_schema_lists_frequencies() {
        let schema = invoice_response_schema();
        assert_eq!(
            schema["properties"]["recurrenceFrequency"]["enum"],
            json!(["daily", "weekly", "monthly", "yearly"])
        );
        assert_eq!(schema["required"], json!(["customerName", "items"]));
    }
}
