use std::io::Write;
use tempfile::NamedTempFile;

/// A ledger entry as the app stores it.
pub fn recurring_json(id: &str, customer: &str, frequency: &str, next_due: &str, due: bool) -> String {
    format!(
        r#"{{
    "id": "{id}",
    "customerName": "{customer}",
    "items": [{{"description": "Retainer", "quantity": 1, "unitPrice": 500}}],
    "paymentMethod": "Venmo",
    "isRecurring": true,
    "recurrenceFrequency": "{frequency}",
    "startDate": "2024-01-31",
    "nextDueDate": "{next_due}",
    "isDueForApproval": {due}
}}"#
    )
}

pub fn write_ledger(entries: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[{}]", entries.join(",")).unwrap();
    file
}

pub fn write_text(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{text}").unwrap();
    file
}

/// Arguments for a charge that passes every check.
pub fn charge_args<'a>(number: &'a str, cvc: &'a str, zip: &'a str) -> Vec<&'a str> {
    vec![
        "charge",
        "--amount",
        "108.00",
        "--name",
        "Jane Doe",
        "--number",
        number,
        "--expiry",
        "12/99",
        "--cvc",
        cvc,
        "--address",
        "1 Rodeo Dr",
        "--city",
        "Beverly Hills",
        "--zip",
        zip,
        "--instant",
    ]
}
