//! Application layer containing the transaction processing orchestration.
//!
//! [`engine::TransactionEngine`] is the entry point for transfers between
//! accounts; [`fees::FeeService`] issues the bank's own deposits and fees. Both
//! serialize their work per account through a shared [`locks::AccountLocks`].

pub mod engine;
pub mod fees;
pub mod locks;
pub mod policy;

use crate::domain::receipt::TransactionReceipt;
use crate::domain::transaction::Transaction;

/// What a processed request produced: the final transaction record and one
/// receipt per involved account side.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionOutcome {
    pub transaction: Transaction,
    pub receipts: Vec<TransactionReceipt>,
}
