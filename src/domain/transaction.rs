use crate::domain::account::{AccountId, OwnerSlot};
use crate::domain::money::Money;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type TransactionId = u64;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Accepted,
    Refused,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Accepted => "ACCEPTED",
            TransactionStatus::Refused => "REFUSED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Local,
    ThirdParty,
    Deposit,
    PenaltyFee,
    MaintenanceFee,
}

impl TransactionType {
    /// System-originated transactions have no base account.
    pub fn is_system(&self) -> bool {
        matches!(
            self,
            TransactionType::Deposit | TransactionType::PenaltyFee | TransactionType::MaintenanceFee
        )
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionType::Local => "LOCAL",
            TransactionType::ThirdParty => "THIRD_PARTY",
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::PenaltyFee => "PENALTY_FEE",
            TransactionType::MaintenanceFee => "MAINTENANCE_FEE",
        };
        f.write_str(name)
    }
}

/// A requested money movement and its outcome.
///
/// Everything except the status is fixed when the record is built. The status
/// leaves `Pending` exactly once, through [`Transaction::accept`] or
/// [`Transaction::refuse`].
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    id: Option<TransactionId>,
    base_account: Option<AccountId>,
    target_account: AccountId,
    requested_amount: Money,
    converted_amount: Money,
    status: TransactionStatus,
    operation_date: DateTime<Utc>,
    kind: TransactionType,
    account_owner: Option<OwnerSlot>,
}

impl Transaction {
    /// A transfer between two accounts of this bank.
    ///
    /// `converted_amount` is `requested_amount` expressed in the target
    /// account's currency.
    pub fn local(
        base_account: AccountId,
        target_account: AccountId,
        requested_amount: Money,
        converted_amount: Money,
        account_owner: OwnerSlot,
        operation_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            base_account: Some(base_account),
            target_account,
            requested_amount,
            converted_amount,
            status: TransactionStatus::Pending,
            operation_date,
            kind: TransactionType::Local,
            account_owner: Some(account_owner),
        }
    }

    /// A deposit or fee issued by the bank itself against `target_account`.
    pub fn system(
        kind: TransactionType,
        target_account: AccountId,
        amount: Money,
        operation_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            base_account: None,
            target_account,
            requested_amount: amount,
            converted_amount: amount,
            status: TransactionStatus::Pending,
            operation_date,
            kind,
            account_owner: None,
        }
    }

    pub fn with_id(mut self, id: TransactionId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<TransactionId> {
        self.id
    }

    pub fn base_account(&self) -> Option<AccountId> {
        self.base_account
    }

    pub fn target_account(&self) -> AccountId {
        self.target_account
    }

    pub fn requested_amount(&self) -> Money {
        self.requested_amount
    }

    pub fn converted_amount(&self) -> Money {
        self.converted_amount
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn operation_date(&self) -> DateTime<Utc> {
        self.operation_date
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn account_owner(&self) -> Option<OwnerSlot> {
        self.account_owner
    }

    pub fn involves(&self, account: AccountId) -> bool {
        self.base_account == Some(account) || self.target_account == account
    }

    pub fn accept(&mut self) -> Result<()> {
        self.finish(TransactionStatus::Accepted)
    }

    pub fn refuse(&mut self) -> Result<()> {
        self.finish(TransactionStatus::Refused)
    }

    fn finish(&mut self, status: TransactionStatus) -> Result<()> {
        if self.status != TransactionStatus::Pending {
            return Err(LedgerError::TransactionFinalized(
                self.id.unwrap_or_default(),
            ));
        }
        self.status = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Currency;
    use rust_decimal_macros::dec;

    fn transfer() -> Transaction {
        let amount = Money::new(dec!(200), Currency::EUR);
        Transaction::local(1, 2, amount, amount, OwnerSlot::Primary, Utc::now()).with_id(9)
    }

    #[test]
    fn test_new_transfer_is_pending() {
        let tx = transfer();
        assert_eq!(tx.status(), TransactionStatus::Pending);
        assert_eq!(tx.kind(), TransactionType::Local);
        assert_eq!(tx.base_account(), Some(1));
        assert!(tx.involves(1));
        assert!(tx.involves(2));
        assert!(!tx.involves(3));
    }

    #[test]
    fn test_status_is_terminal() {
        let mut tx = transfer();
        tx.accept().unwrap();
        assert_eq!(tx.status(), TransactionStatus::Accepted);
        assert!(matches!(
            tx.refuse(),
            Err(LedgerError::TransactionFinalized(9))
        ));
        assert!(tx.accept().is_err());
        assert_eq!(tx.status(), TransactionStatus::Accepted);
    }

    #[test]
    fn test_system_transaction_has_no_base_account() {
        let fee = Money::new(dec!(40), Currency::EUR);
        let tx = Transaction::system(TransactionType::PenaltyFee, 3, fee, Utc::now());
        assert!(tx.kind().is_system());
        assert_eq!(tx.base_account(), None);
        assert_eq!(tx.account_owner(), None);
        assert_eq!(tx.converted_amount(), fee);
    }

    #[test]
    fn test_serialization_roundtrip_keeps_status() {
        let mut tx = transfer();
        tx.refuse().unwrap();
        let json = serde_json::to_string(&tx).unwrap();
        assert!(json.contains("\"REFUSED\""));
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
    }
}
