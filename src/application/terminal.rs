use crate::domain::amount::ChargeAmount;
use crate::domain::card::CardField;
use crate::domain::ports::{Scheduler, SchedulerBox};
use crate::domain::terminal::{PaymentTerminal, Step, TerminalStatus, VerificationResult};
use crate::error::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;

/// How a completed charge attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeOutcome {
    pub success: bool,
    pub reason: Option<&'static str>,
    pub verification: VerificationResult,
    pub path: Vec<TerminalStatus>,
}

/// Shared access to a terminal plus the scheduler that paces it.
///
/// Clones share the same terminal, so one task can run a charge while another
/// resets the charge amount. A reset mid-flight stops the running charge
/// without reporting completion.
#[derive(Clone)]
pub struct TerminalHandle {
    terminal: Arc<Mutex<PaymentTerminal>>,
    scheduler: Arc<dyn Scheduler>,
}

impl TerminalHandle {
    pub fn new(terminal: PaymentTerminal, scheduler: SchedulerBox) -> Self {
        Self {
            terminal: Arc::new(Mutex::new(terminal)),
            scheduler: Arc::from(scheduler),
        }
    }

    pub async fn status(&self) -> TerminalStatus {
        self.terminal.lock().await.status()
    }

    /// A copy of the terminal's current state.
    pub async fn snapshot(&self) -> PaymentTerminal {
        self.terminal.lock().await.clone()
    }

    pub async fn set_charge_amount(&self, amount: Option<ChargeAmount>) {
        self.terminal.lock().await.set_charge_amount(amount);
    }

    pub async fn update_field(&self, field: CardField, raw: &str, today: NaiveDate) {
        self.terminal.lock().await.update_field(field, raw, today);
    }

    pub async fn blur(&self, field: CardField, today: NaiveDate) {
        self.terminal.lock().await.blur(field, today);
    }

    /// Submits the form and drives the verification sequence to the end.
    ///
    /// `on_complete` is called exactly once with the outcome after the final
    /// delay. Returns `Ok(None)` if the attempt was reset before finishing, in
    /// which case `on_complete` is never called. Validation errors are returned
    /// before any delay is scheduled.
    pub async fn charge<F>(&self, today: NaiveDate, on_complete: F) -> Result<Option<ChargeOutcome>>
    where
        F: FnOnce(bool) + Send,
    {
        let mut scheduled = self.terminal.lock().await.submit(today)?;

        loop {
            self.scheduler.sleep(scheduled.delay).await;

            let mut terminal = self.terminal.lock().await;
            match terminal.advance(scheduled.token) {
                Step::Scheduled(next) => scheduled = next,
                Step::Completed(success) => {
                    let outcome = ChargeOutcome {
                        success,
                        reason: terminal.failure_reason(),
                        verification: terminal.verification(),
                        path: terminal.history().to_vec(),
                    };
                    drop(terminal);
                    on_complete(success);
                    return Ok(Some(outcome));
                }
                Step::Stale => {
                    tracing::info!("Charge attempt was reset before completion");
                    return Ok(None);
                }
            }
        }
    }
}
