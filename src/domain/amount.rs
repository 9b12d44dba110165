use crate::error::PilotError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A positive currency amount to charge on the terminal.
///
/// Wraps `rust_decimal::Decimal` so a charge can never be zero or negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct ChargeAmount(Decimal);

impl ChargeAmount {
    pub fn new(value: Decimal) -> Result<Self, PilotError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PilotError::ValidationError(
                "Charge amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for ChargeAmount {
    type Error = PilotError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChargeAmount> for Decimal {
    fn from(amount: ChargeAmount) -> Self {
        amount.0
    }
}

impl fmt::Display for ChargeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}
