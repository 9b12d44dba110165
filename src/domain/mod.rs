//! Domain model: card entry, the terminal state machine, and invoices.

pub mod amount;
pub mod card;
pub mod invoice;
pub mod ports;
pub mod recurring;
pub mod terminal;
