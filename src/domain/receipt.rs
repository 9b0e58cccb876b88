//! Receipt construction.
//!
//! Receipts are the terminal recording step of every transaction attempt and
//! carry no decision logic: callers pass in the outcome they want recorded.

use crate::domain::account::AccountId;
use crate::domain::money::{Currency, Money};
use crate::domain::transaction::{Transaction, TransactionId, TransactionStatus, TransactionType};
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptSide {
    Sender,
    Receiver,
    /// The only side of a system-originated transaction.
    Target,
}

impl fmt::Display for ReceiptSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReceiptSide::Sender => "sender",
            ReceiptSide::Receiver => "receiver",
            ReceiptSide::Target => "target",
        };
        f.write_str(name)
    }
}

/// Audit record of one account side of one transaction.
///
/// The amount is signed: negative for money leaving the account, positive for
/// money arriving, zero for a refusal.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransactionReceipt {
    pub transaction: TransactionId,
    pub account: AccountId,
    pub side: ReceiptSide,
    pub kind: TransactionType,
    pub amount: Money,
    pub status: TransactionStatus,
    pub message: String,
    pub date: DateTime<Utc>,
}

/// Records `tx`'s current status for one side.
pub fn generate(
    tx: &Transaction,
    side: ReceiptSide,
    account: AccountId,
    amount: Money,
    message: impl Into<String>,
) -> Result<TransactionReceipt> {
    let transaction = tx.id().ok_or_else(|| {
        LedgerError::InvariantViolation("receipt requested for an unsaved transaction".to_string())
    })?;
    Ok(TransactionReceipt {
        transaction,
        account,
        side,
        kind: tx.kind(),
        amount,
        status: tx.status(),
        message: message.into(),
        date: tx.operation_date(),
    })
}

/// Money left `account`: the recorded amount is negated.
pub fn debit(
    tx: &Transaction,
    side: ReceiptSide,
    account: AccountId,
    amount: Money,
    message: impl Into<String>,
) -> Result<TransactionReceipt> {
    generate(tx, side, account, -amount, message)
}

/// Money arrived in `account`.
pub fn credit(
    tx: &Transaction,
    side: ReceiptSide,
    account: AccountId,
    amount: Money,
    message: impl Into<String>,
) -> Result<TransactionReceipt> {
    generate(tx, side, account, amount, message)
}

/// Nothing moved: a zero amount in the account's currency.
pub fn refusal(
    tx: &Transaction,
    side: ReceiptSide,
    account: AccountId,
    currency: Currency,
    message: impl Into<String>,
) -> Result<TransactionReceipt> {
    generate(tx, side, account, Money::zero(currency), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::OwnerSlot;
    use rust_decimal_macros::dec;

    fn saved_transfer() -> Transaction {
        let amount = Money::new(dec!(200), Currency::EUR);
        Transaction::local(1, 2, amount, amount, OwnerSlot::Primary, Utc::now()).with_id(4)
    }

    #[test]
    fn test_debit_receipt_is_negative() {
        let mut tx = saved_transfer();
        tx.accept().unwrap();
        let receipt = debit(&tx, ReceiptSide::Sender, 1, tx.requested_amount(), "sent").unwrap();
        assert_eq!(receipt.amount, Money::new(dec!(-200), Currency::EUR));
        assert_eq!(receipt.status, TransactionStatus::Accepted);
        assert_eq!(receipt.transaction, 4);
        assert_eq!(receipt.date, tx.operation_date());
    }

    #[test]
    fn test_credit_receipt_is_positive() {
        let mut tx = saved_transfer();
        tx.accept().unwrap();
        let receipt =
            credit(&tx, ReceiptSide::Receiver, 2, tx.converted_amount(), "received").unwrap();
        assert_eq!(receipt.amount, Money::new(dec!(200), Currency::EUR));
        assert_eq!(receipt.account, 2);
        assert_eq!(receipt.kind, TransactionType::Local);
    }

    #[test]
    fn test_refusal_receipt_is_zero() {
        let mut tx = saved_transfer();
        tx.refuse().unwrap();
        let receipt = refusal(&tx, ReceiptSide::Sender, 1, Currency::USD, "no").unwrap();
        assert!(receipt.amount.is_zero());
        assert_eq!(receipt.amount.currency(), Currency::USD);
        assert_eq!(receipt.status, TransactionStatus::Refused);
        assert_eq!(receipt.message, "no");
    }

    #[test]
    fn test_unsaved_transaction_is_rejected() {
        let amount = Money::new(dec!(1), Currency::EUR);
        let tx = Transaction::local(1, 2, amount, amount, OwnerSlot::Primary, Utc::now());
        assert!(matches!(
            refusal(&tx, ReceiptSide::Sender, 1, Currency::EUR, "no"),
            Err(LedgerError::InvariantViolation(_))
        ));
    }
}
