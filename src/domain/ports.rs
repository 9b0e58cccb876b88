//! Collaborator contracts consumed by the engine.

use super::account::{Account, AccountId};
use super::money::Currency;
use super::receipt::TransactionReceipt;
use super::transaction::{Transaction, TransactionId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>>;
    async fn save(&self, account: Account) -> Result<()>;
    async fn all(&self) -> Result<Vec<Account>>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persists `tx`, assigning an id when it has none, and returns the stored record.
    async fn save(&self, tx: Transaction) -> Result<Transaction>;
    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>>;
    /// Transactions on either side of `account` dated at or after `since`,
    /// ascending by operation date.
    async fn history_for_account(
        &self,
        account: AccountId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>>;
}

#[async_trait]
pub trait ReceiptStore: Send + Sync {
    async fn save(&self, receipt: TransactionReceipt) -> Result<()>;
    async fn for_transaction(&self, tx: TransactionId) -> Result<Vec<TransactionReceipt>>;
    async fn for_account(&self, account: AccountId) -> Result<Vec<TransactionReceipt>>;
}

/// Source of exchange rates, in units of `to` per unit of `from`.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn rate(&self, from: Currency, to: Currency) -> Result<Decimal>;
}

/// Side effects that follow a balance change, such as threshold penalties.
#[async_trait]
pub trait AccountPolicy: Send + Sync {
    async fn on_balance_changed(&self, account: &Account) -> Result<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type AccountStoreRef = Arc<dyn AccountStore>;
pub type TransactionStoreRef = Arc<dyn TransactionStore>;
pub type ReceiptStoreRef = Arc<dyn ReceiptStore>;
pub type RateProviderRef = Arc<dyn RateProvider>;
pub type AccountPolicyRef = Arc<dyn AccountPolicy>;
pub type ClockRef = Arc<dyn Clock>;
