use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The fields of the card entry form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardField {
    Name,
    Number,
    Expiry,
    Cvc,
    Address,
    City,
    Zip,
}

impl CardField {
    pub const ALL: [CardField; 7] = [
        CardField::Name,
        CardField::Number,
        CardField::Expiry,
        CardField::Cvc,
        CardField::Address,
        CardField::City,
        CardField::Zip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardField::Name => "name",
            CardField::Number => "number",
            CardField::Expiry => "expiry",
            CardField::Cvc => "cvc",
            CardField::Address => "address",
            CardField::City => "city",
            CardField::Zip => "zip",
        }
    }

    /// Cleans raw keystrokes into the stored form of the field.
    ///
    /// The card number is grouped in fours, the expiry gets its slash after the
    /// month, and the numeric fields are truncated to their maximum width.
    pub fn normalize(&self, raw: &str) -> String {
        match self {
            CardField::Number => {
                let digits = digits_only(raw, 16);
                digits
                    .as_bytes()
                    .chunks(4)
                    .map(|group| String::from_utf8_lossy(group).into_owned())
                    .collect::<Vec<_>>()
                    .join(" ")
            }
            CardField::Expiry => {
                let digits = digits_only(raw, 4);
                if digits.len() > 2 {
                    format!("{}/{}", &digits[..2], &digits[2..])
                } else {
                    digits
                }
            }
            CardField::Cvc => digits_only(raw, 4),
            CardField::Zip => digits_only(raw, 5),
            CardField::Name | CardField::Address | CardField::City => raw.to_string(),
        }
    }

    /// Checks a single field value, returning the message to show next to it.
    ///
    /// `today` anchors the expiry check; city has no rule.
    pub fn validate(&self, value: &str, today: NaiveDate) -> Option<&'static str> {
        match self {
            CardField::Name => value.trim().is_empty().then_some("Name is required."),
            CardField::Number => {
                let raw: String = value.chars().filter(|c| !c.is_whitespace()).collect();
                (!is_valid_luhn(&raw) || raw.len() != 16).then_some("Invalid card number.")
            }
            CardField::Expiry => validate_expiry(value, today),
            CardField::Cvc => {
                let valid = (3..=4).contains(&value.len())
                    && value.bytes().all(|b| b.is_ascii_digit());
                (!valid).then_some("Must be 3 or 4 digits.")
            }
            CardField::Address => value.trim().is_empty().then_some("Address is required."),
            CardField::Zip => (value.chars().count() < 5).then_some("Invalid ZIP."),
            CardField::City => None,
        }
    }
}

impl fmt::Display for CardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn digits_only(raw: &str, max: usize) -> String {
    raw.chars().filter(char::is_ascii_digit).take(max).collect()
}

fn validate_expiry(value: &str, today: NaiveDate) -> Option<&'static str> {
    let Some((month, year)) = parse_expiry(value) else {
        return Some("Use MM/YY format.");
    };
    let current_year = (today.year() % 100) as u32;
    if year < current_year {
        return Some("Card year is in the past.");
    }
    if year == current_year && month < today.month() {
        return Some("Card is expired.");
    }
    None
}

/// Parses `MM/YY` with a month in 01-12.
fn parse_expiry(value: &str) -> Option<(u32, u32)> {
    let (month, year) = value.split_once('/')?;
    if month.len() != 2 || year.len() != 2 {
        return None;
    }
    if !month.bytes().chain(year.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let month: u32 = month.parse().ok()?;
    let year: u32 = year.parse().ok()?;
    (1..=12).contains(&month).then_some((month, year))
}

/// Luhn checksum over a card number.
///
/// Only digits, dashes and whitespace are accepted; separators are ignored.
pub fn is_valid_luhn(value: &str) -> bool {
    if value
        .chars()
        .any(|c| !(c.is_ascii_digit() || c == '-' || c.is_whitespace()))
    {
        return false;
    }

    let sum: u32 = value
        .chars()
        .filter_map(|c| c.to_digit(10))
        .rev()
        .enumerate()
        .map(|(i, digit)| {
            if i % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();

    sum % 10 == 0
}

/// Card details as entered in the terminal form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInput {
    pub name: String,
    pub number: String,
    pub expiry: String,
    pub cvc: String,
    pub address: String,
    pub city: String,
    pub zip: String,
}

impl CardInput {
    pub fn get(&self, field: CardField) -> &str {
        match field {
            CardField::Name => &self.name,
            CardField::Number => &self.number,
            CardField::Expiry => &self.expiry,
            CardField::Cvc => &self.cvc,
            CardField::Address => &self.address,
            CardField::City => &self.city,
            CardField::Zip => &self.zip,
        }
    }

    /// Stores a raw keystroke value after normalizing it for the field.
    pub fn set(&mut self, field: CardField, raw: &str) {
        let value = field.normalize(raw);
        let slot = match field {
            CardField::Name => &mut self.name,
            CardField::Number => &mut self.number,
            CardField::Expiry => &mut self.expiry,
            CardField::Cvc => &mut self.cvc,
            CardField::Address => &mut self.address,
            CardField::City => &mut self.city,
            CardField::Zip => &mut self.zip,
        };
        *slot = value;
    }

    /// Card number with the display spacing removed.
    pub fn clean_number(&self) -> String {
        self.number.chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// Validates every field, collecting all messages at once.
    pub fn validate(&self, today: NaiveDate) -> FieldErrors {
        let mut errors = FieldErrors::default();
        for field in CardField::ALL {
            if let Some(message) = field.validate(self.get(field), today) {
                errors.insert(field, message);
            }
        }
        errors
    }
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<CardField, &'static str>);

impl FieldErrors {
    pub fn insert(&mut self, field: CardField, message: &'static str) {
        self.0.insert(field, message);
    }

    pub fn remove(&mut self, field: CardField) {
        self.0.remove(&field);
    }

    pub fn get(&self, field: CardField) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn contains(&self, field: CardField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (CardField, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}
