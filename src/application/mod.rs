//! Application layer orchestrating the domain.
//!
//! `TerminalHandle` paces the terminal state machine through an injected
//! scheduler, `RecurringInvoiceService` keeps the recurring schedule on top of
//! a store and a clock, and `intake` interprets assistant replies.

pub mod intake;
pub mod recurring;
pub mod terminal;
