use crate::domain::account::AccountId;
use crate::domain::money::Currency;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Account {0} not found")]
    AccountNotFound(AccountId),
    #[error("Owner name '{claimed}' does not match any holder of account {account}")]
    OwnerMismatch { account: AccountId, claimed: String },
    #[error("No exchange rate available from {from} to {to}")]
    RateUnavailable { from: Currency, to: Currency },
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: Currency, right: Currency },
    #[error("Amount out of range for {0}")]
    AmountOverflow(Currency),
    #[error("Insufficient funds in account {0}")]
    InsufficientFunds(AccountId),
    #[error("Invalid currency code '{0}'")]
    InvalidCurrency(String),
    #[error("Invalid account status '{0}'")]
    InvalidStatus(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Transaction {0} already reached a terminal status")]
    TransactionFinalized(u64),
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(e: rocksdb::Error) -> Self {
        LedgerError::Storage(Box::new(e))
    }
}
