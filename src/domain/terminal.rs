//! The simulated card terminal.
//!
//! `PaymentTerminal` is a synchronous state machine. It never waits by itself:
//! every timed transition is handed back to the caller as a [`Scheduled`] step,
//! and the caller runs it with [`PaymentTerminal::advance`] once the delay has
//! elapsed. Resetting the terminal invalidates any step still in flight.

use crate::domain::amount::ChargeAmount;
use crate::domain::card::{CardField, CardInput, FieldErrors};
use crate::error::{PilotError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStatus {
    Idle,
    AwaitingInput,
    Connecting,
    VerifyingAvs,
    VerifyingCvv,
    Processing,
    Success,
    Error,
}

impl TerminalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalStatus::Idle => "idle",
            TerminalStatus::AwaitingInput => "awaiting_input",
            TerminalStatus::Connecting => "connecting",
            TerminalStatus::VerifyingAvs => "verifying_avs",
            TerminalStatus::VerifyingCvv => "verifying_cvv",
            TerminalStatus::Processing => "processing",
            TerminalStatus::Success => "success",
            TerminalStatus::Error => "error",
        }
    }
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub avs_passed: bool,
    pub cvv_passed: bool,
}

/// Canned gateway responses standing in for a real processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRules {
    /// The only billing zip that passes address verification.
    pub avs_zip: String,
    /// CVC values starting with this pass the CVV check.
    pub cvv_prefix: String,
    /// Card numbers starting with this are authorized.
    pub approved_prefix: String,
}

impl Default for GatewayRules {
    fn default() -> Self {
        Self {
            avs_zip: "90210".to_string(),
            cvv_prefix: "123".to_string(),
            approved_prefix: "4242".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTimings {
    pub connecting: Duration,
    pub avs: Duration,
    pub cvv: Duration,
    pub processing: Duration,
    /// Pause on success/error before completion is reported.
    pub settle: Duration,
}

impl Default for StageTimings {
    fn default() -> Self {
        Self {
            connecting: Duration::from_millis(1000),
            avs: Duration::from_millis(1500),
            cvv: Duration::from_millis(1500),
            processing: Duration::from_millis(1500),
            settle: Duration::from_millis(2500),
        }
    }
}

impl StageTimings {
    /// Multiplies every delay by `factor`, failing if a delay leaves the
    /// range of `Duration`.
    pub fn scaled(self, factor: f64) -> Result<Self> {
        let scale = |d: Duration| {
            Duration::try_from_secs_f64(d.as_secs_f64() * factor).map_err(|_| {
                PilotError::ValidationError(format!("Delay scale {factor} is out of range"))
            })
        };
        Ok(Self {
            connecting: scale(self.connecting)?,
            avs: scale(self.avs)?,
            cvv: scale(self.cvv)?,
            processing: scale(self.processing)?,
            settle: scale(self.settle)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Avs,
    Cvv,
    Authorize,
}

/// One row of the verification sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub status: TerminalStatus,
    pub delay: Duration,
    pub check: Option<Check>,
    pub on_pass: TerminalStatus,
    pub on_fail: TerminalStatus,
}

/// connect → AVS → CVV → authorize.
pub fn stages(timings: &StageTimings) -> Vec<Stage> {
    vec![
        Stage {
            status: TerminalStatus::Connecting,
            delay: timings.connecting,
            check: None,
            on_pass: TerminalStatus::VerifyingAvs,
            on_fail: TerminalStatus::Error,
        },
        Stage {
            status: TerminalStatus::VerifyingAvs,
            delay: timings.avs,
            check: Some(Check::Avs),
            on_pass: TerminalStatus::VerifyingCvv,
            on_fail: TerminalStatus::Error,
        },
        Stage {
            status: TerminalStatus::VerifyingCvv,
            delay: timings.cvv,
            check: Some(Check::Cvv),
            on_pass: TerminalStatus::Processing,
            on_fail: TerminalStatus::Error,
        },
        Stage {
            status: TerminalStatus::Processing,
            delay: timings.processing,
            check: Some(Check::Authorize),
            on_pass: TerminalStatus::Success,
            on_fail: TerminalStatus::Error,
        },
    ]
}

/// Identifies one scheduled step of one charge attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepToken {
    attempt: u64,
    seq: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    pub delay: Duration,
    pub token: StepToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Another step must run after `delay`.
    Scheduled(Scheduled),
    /// The attempt finished; the completion callback receives this outcome.
    Completed(bool),
    /// The token no longer matches the pending step, usually after a reset.
    Stale,
}

#[derive(Debug, Clone, Copy)]
enum Pending {
    Stage { index: usize, passed: bool },
    Settle { success: bool },
}

#[derive(Debug, Clone)]
pub struct PaymentTerminal {
    rules: GatewayRules,
    stages: Vec<Stage>,
    settle: Duration,
    status: TerminalStatus,
    charge_amount: Option<ChargeAmount>,
    card: CardInput,
    submitted: Option<CardInput>,
    errors: FieldErrors,
    verification: VerificationResult,
    history: Vec<TerminalStatus>,
    attempt: u64,
    seq: u32,
    pending: Option<(StepToken, Pending)>,
}

impl Default for PaymentTerminal {
    fn default() -> Self {
        Self::new(GatewayRules::default(), StageTimings::default())
    }
}

impl PaymentTerminal {
    pub fn new(rules: GatewayRules, timings: StageTimings) -> Self {
        Self {
            rules,
            stages: stages(&timings),
            settle: timings.settle,
            status: TerminalStatus::Idle,
            charge_amount: None,
            card: CardInput::default(),
            submitted: None,
            errors: FieldErrors::default(),
            verification: VerificationResult::default(),
            history: vec![TerminalStatus::Idle],
            attempt: 0,
            seq: 0,
            pending: None,
        }
    }

    pub fn status(&self) -> TerminalStatus {
        self.status
    }

    pub fn charge_amount(&self) -> Option<ChargeAmount> {
        self.charge_amount
    }

    pub fn card(&self) -> &CardInput {
        &self.card
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn verification(&self) -> VerificationResult {
        self.verification
    }

    /// Statuses entered since the terminal last left idle.
    pub fn history(&self) -> &[TerminalStatus] {
        &self.history
    }

    pub fn has_pending_step(&self) -> bool {
        self.pending.is_some()
    }

    /// Feeds the external charge amount into the terminal.
    ///
    /// A positive amount while idle opens a fresh attempt; clearing the amount
    /// from any other state resets to idle and drops the pending step.
    pub fn set_charge_amount(&mut self, amount: Option<ChargeAmount>) {
        match amount {
            Some(amount) if self.status == TerminalStatus::Idle => {
                self.charge_amount = Some(amount);
                self.clear_form();
                self.history = vec![TerminalStatus::Idle];
                self.enter(TerminalStatus::AwaitingInput);
            }
            Some(_) => {
                tracing::debug!(status = %self.status, "Charge amount ignored while terminal is busy");
            }
            None if self.status != TerminalStatus::Idle => {
                self.charge_amount = None;
                self.clear_form();
                self.attempt += 1;
                self.pending = None;
                self.history = Vec::new();
                self.enter(TerminalStatus::Idle);
            }
            None => {}
        }
    }

    /// Stores a keystroke for `field`; ignored unless the form is open.
    pub fn update_field(&mut self, field: CardField, raw: &str, today: NaiveDate) {
        if self.status != TerminalStatus::AwaitingInput {
            return;
        }
        self.card.set(field, raw);
        if self.errors.contains(field) {
            self.refresh_error(field, today);
        }
    }

    /// Validates `field` when it loses focus.
    pub fn blur(&mut self, field: CardField, today: NaiveDate) {
        if self.status != TerminalStatus::AwaitingInput {
            return;
        }
        self.refresh_error(field, today);
    }

    /// Validates the whole form and, if it passes, starts the verification
    /// sequence. Returns the first step to schedule.
    pub fn submit(&mut self, today: NaiveDate) -> Result<Scheduled> {
        if self.status != TerminalStatus::AwaitingInput {
            return Err(PilotError::InvalidState {
                actual: self.status,
                expected: TerminalStatus::AwaitingInput,
            });
        }

        self.errors = self.card.validate(today);
        if !self.errors.is_empty() {
            tracing::info!(errors = %self.errors, "Card form rejected");
            return Err(PilotError::CardRejected(self.errors.clone()));
        }

        self.submitted = Some(self.card.clone());
        self.attempt += 1;
        Ok(self.enter_stage(0))
    }

    /// Runs the step identified by `token`.
    pub fn advance(&mut self, token: StepToken) -> Step {
        let pending = match self.pending {
            Some((pending_token, pending)) if pending_token == token => pending,
            _ => {
                tracing::debug!(?token, status = %self.status, "Discarding stale terminal step");
                return Step::Stale;
            }
        };
        self.pending = None;

        match pending {
            Pending::Stage { index, passed } => {
                let stage = self.stages[index];
                let next = if passed { stage.on_pass } else { stage.on_fail };
                match self.stages.iter().position(|s| s.status == next) {
                    Some(next_index) => Step::Scheduled(self.enter_stage(next_index)),
                    None => {
                        self.enter(next);
                        let success = next == TerminalStatus::Success;
                        Step::Scheduled(self.schedule(self.settle, Pending::Settle { success }))
                    }
                }
            }
            Pending::Settle { success } => {
                tracing::info!(success, "Charge attempt completed");
                Step::Completed(success)
            }
        }
    }

    /// The single reason shown for a failed attempt.
    pub fn failure_reason(&self) -> Option<&'static str> {
        if self.status != TerminalStatus::Error {
            return None;
        }
        Some(if !self.verification.avs_passed {
            "Address Verification Failed"
        } else if !self.verification.cvv_passed {
            "CVV Verification Failed"
        } else {
            "Transaction was declined by the bank."
        })
    }

    fn enter_stage(&mut self, index: usize) -> Scheduled {
        let stage = self.stages[index];
        self.enter(stage.status);
        let passed = match stage.check {
            None => true,
            Some(check) => self.evaluate(check),
        };
        self.schedule(stage.delay, Pending::Stage { index, passed })
    }

    fn evaluate(&mut self, check: Check) -> bool {
        let Some(card) = self.submitted.as_ref() else {
            return false;
        };
        match check {
            Check::Avs => {
                let passed = card.zip == self.rules.avs_zip;
                self.verification.avs_passed = passed;
                passed
            }
            Check::Cvv => {
                let passed = card.cvc.starts_with(&self.rules.cvv_prefix);
                self.verification.cvv_passed = passed;
                passed
            }
            Check::Authorize => card.clean_number().starts_with(&self.rules.approved_prefix),
        }
    }

    fn schedule(&mut self, delay: Duration, pending: Pending) -> Scheduled {
        self.seq += 1;
        let token = StepToken {
            attempt: self.attempt,
            seq: self.seq,
        };
        self.pending = Some((token, pending));
        Scheduled { delay, token }
    }

    fn enter(&mut self, status: TerminalStatus) {
        tracing::info!(from = %self.status, to = %status, "Terminal transition");
        self.status = status;
        self.history.push(status);
    }

    fn refresh_error(&mut self, field: CardField, today: NaiveDate) {
        match field.validate(self.card.get(field), today) {
            Some(message) => self.errors.insert(field, message),
            None => self.errors.remove(field),
        }
    }

    fn clear_form(&mut self) {
        self.card = CardInput::default();
        self.submitted = None;
        self.errors.clear();
        self.verification = VerificationResult::default();
    }
}
