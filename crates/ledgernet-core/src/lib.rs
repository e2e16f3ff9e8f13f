//! # ledgernet-core
//!
//! Record model and shared financial calculations for ledgernet.
//!
//! Provides the raw material every other crate consumes:
//! - [`records::Institution`] — an account holding a balance
//! - [`records::Transaction`] — an immutable deposit or withdrawal
//! - [`records::Goal`]        — a savings target with account allocations
//! - [`calc`]                 — statistics used by the scoring layers
//! - [`time::DateRange`]      — validated unix-second analysis window

pub mod calc;
pub mod records;
pub mod time;

pub use records::{Goal, Institution, Transaction, TransactionKind};
pub use time::{DateRange, TimeError, SECONDS_PER_DAY};
