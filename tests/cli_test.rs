mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_charge_success() {
    let mut cmd = Command::new(cargo_bin!("paypilot"));
    cmd.args(common::charge_args("4242 4242 4242 4242", "123", "90210"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "connecting\nverifying_avs\nverifying_cvv\nprocessing\nsuccess",
        ))
        .stdout(predicate::str::contains(
            "Successfully processed a payment of $108.00",
        ));
}

#[test]
fn test_charge_avs_failure_stops_early() {
    let mut cmd = Command::new(cargo_bin!("paypilot"));
    cmd.args(common::charge_args("4242 4242 4242 4242", "123", "00000"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Payment of $108.00 failed: Address Verification Failed",
        ))
        .stdout(predicate::str::contains("verifying_cvv").not())
        .stdout(predicate::str::contains("processing").not());
}

#[test]
fn test_charge_cvv_failure() {
    let mut cmd = Command::new(cargo_bin!("paypilot"));
    cmd.args(common::charge_args("4242 4242 4242 4242", "999", "90210"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("CVV Verification Failed"))
        .stdout(predicate::str::contains("processing").not());
}

#[test]
fn test_charge_declined_card() {
    let mut cmd = Command::new(cargo_bin!("paypilot"));
    cmd.args(common::charge_args("4111 1111 1111 1111", "123", "90210"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Transaction was declined by the bank.",
        ));
}

#[test]
fn test_charge_invalid_card_never_connects() {
    let mut cmd = Command::new(cargo_bin!("paypilot"));
    cmd.args(common::charge_args("4242 4242 4242 4241", "123", "90210"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("number: Invalid card number."))
        .stdout(predicate::str::contains("connecting").not());
}

#[test]
fn test_charge_rejects_non_positive_amount() {
    let mut args = common::charge_args("4242 4242 4242 4242", "123", "90210");
    args[2] = "0";
    let mut cmd = Command::new(cargo_bin!("paypilot"));
    cmd.args(args);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Charge amount must be positive"));
}

#[test]
fn test_next_date_clamps_to_month_end() {
    let mut cmd = Command::new(cargo_bin!("paypilot"));
    cmd.args(["next-date", "2024-01-31", "monthly"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::diff("2024-02-29\n"));
}

#[test]
fn test_next_date_rejects_unknown_frequency() {
    let mut cmd = Command::new(cargo_bin!("paypilot"));
    cmd.args(["next-date", "2024-01-31", "hourly"]);

    cmd.assert().failure();
}

#[test]
fn test_schema_lists_invoice_fields() {
    let mut cmd = Command::new(cargo_bin!("paypilot"));
    cmd.arg("schema");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"recurrenceFrequency\""))
        .stdout(predicate::str::contains("\"customerName\""));
}

#[test]
fn test_charge_rejects_oversized_delay_scale() {
    let mut cmd = Command::new(cargo_bin!("paypilot"));
    cmd.env("PAYPILOT_DELAY_SCALE", "1e300")
        .args(common::charge_args("4242 4242 4242 4242", "123", "90210"));

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("PAYPILOT_DELAY_SCALE"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn test_bad_config_does_not_affect_next_date() {
    let mut cmd = Command::new(cargo_bin!("paypilot"));
    cmd.env("PAYPILOT_DELAY_SCALE", "fast")
        .args(["next-date", "2024-03-10", "weekly"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::diff("2024-03-17\n"));
}
