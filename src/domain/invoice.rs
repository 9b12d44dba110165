use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Flat sales tax applied to every invoice.
pub const TAX_RATE: Decimal = dec!(0.08);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl InvoiceItem {
    pub fn line_total(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

/// A one-off invoice draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub customer_name: String,
    pub items: Vec<InvoiceItem>,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl InvoiceTotals {
    pub fn from_items(items: &[InvoiceItem]) -> Self {
        let subtotal: Decimal = items.iter().map(InvoiceItem::line_total).sum();
        let tax = subtotal * TAX_RATE;
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }

    /// Totals rounded half away from zero to exactly two decimal places.
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: to_cents(self.subtotal),
            tax: to_cents(self.tax),
            total: to_cents(self.total),
        }
    }
}

fn to_cents(value: Decimal) -> Decimal {
    let mut cents = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(2);
    cents
}

impl Invoice {
    pub fn totals(&self) -> InvoiceTotals {
        InvoiceTotals::from_items(&self.items)
    }

    pub fn payment_channel(&self) -> Option<PaymentChannel> {
        self.payment_method.as_deref().map(PaymentChannel::classify)
    }
}

/// Where the customer asked to pay, as recognised from free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentChannel {
    PayPal,
    Venmo,
    CashApp,
    Other(String),
}

impl PaymentChannel {
    pub fn classify(method: &str) -> Self {
        let lower = method.to_lowercase();
        if lower.contains("paypal") {
            PaymentChannel::PayPal
        } else if lower.contains("venmo") {
            PaymentChannel::Venmo
        } else if lower.contains("cash") {
            PaymentChannel::CashApp
        } else {
            PaymentChannel::Other(method.to_string())
        }
    }
}

impl fmt::Display for PaymentChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentChannel::PayPal => f.write_str("PayPal"),
            PaymentChannel::Venmo => f.write_str("Venmo"),
            PaymentChannel::CashApp => f.write_str("Cash App"),
            PaymentChannel::Other(method) => f.write_str(method),
        }
    }
}
