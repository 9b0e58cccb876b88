use crate::domain::account::{Account, AccountId};
use crate::domain::ports::{AccountStore, ReceiptStore, TransactionStore};
use crate::domain::receipt::TransactionReceipt;
use crate::domain::transaction::{Transaction, TransactionId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for accounts.
///
/// Uses `Arc<RwLock<HashMap<AccountId, Account>>>` to allow shared concurrent access.
/// Ideal for testing or small datasets where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
}

impl InMemoryAccountStore {
    /// Creates a new, empty in-memory account store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&id).cloned())
    }

    async fn save(&self, account: Account) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        accounts.insert(account.id(), account);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Account>> {
        let accounts = self.accounts.read().await;
        let mut all: Vec<Account> = accounts.values().cloned().collect();
        all.sort_by_key(Account::id);
        Ok(all)
    }
}

#[derive(Default)]
struct TransactionTable {
    last_id: TransactionId,
    rows: BTreeMap<TransactionId, Transaction>,
}

/// A thread-safe in-memory store for transactions.
///
/// Ids are assigned from a counter starting at 1.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    table: Arc<RwLock<TransactionTable>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn save(&self, tx: Transaction) -> Result<Transaction> {
        let mut table = self.table.write().await;
        let id = match tx.id() {
            Some(id) => id,
            None => table.last_id + 1,
        };
        table.last_id = table.last_id.max(id);
        let tx = tx.with_id(id);
        table.rows.insert(id, tx.clone());
        Ok(tx)
    }

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn history_for_account(
        &self,
        account: AccountId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        let table = self.table.read().await;
        let mut history: Vec<Transaction> = table
            .rows
            .values()
            .filter(|tx| tx.involves(account) && tx.operation_date() >= since)
            .cloned()
            .collect();
        // BTreeMap iteration already orders by id, so equal dates stay in insertion order
        history.sort_by_key(Transaction::operation_date);
        Ok(history)
    }
}

/// A thread-safe in-memory store for receipts, kept in insertion order.
#[derive(Default, Clone)]
pub struct InMemoryReceiptStore {
    receipts: Arc<RwLock<Vec<TransactionReceipt>>>,
}

impl InMemoryReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReceiptStore for InMemoryReceiptStore {
    async fn save(&self, receipt: TransactionReceipt) -> Result<()> {
        self.receipts.write().await.push(receipt);
        Ok(())
    }

    async fn for_transaction(&self, tx: TransactionId) -> Result<Vec<TransactionReceipt>> {
        let receipts = self.receipts.read().await;
        Ok(receipts
            .iter()
            .filter(|receipt| receipt.transaction == tx)
            .cloned()
            .collect())
    }

    async fn for_account(&self, account: AccountId) -> Result<Vec<TransactionReceipt>> {
        let receipts = self.receipts.read().await;
        Ok(receipts
            .iter()
            .filter(|receipt| receipt.account == account)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccountDefaults;
    use crate::domain::account::{AccountHolder, AccountType, OwnerSlot};
    use crate::domain::money::{Currency, Money};
    use crate::domain::receipt::{self, ReceiptSide};
    use chrono::{TimeDelta, TimeZone};
    use rust_decimal_macros::dec;

    fn eur(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::EUR)
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
    }

    fn transfer(from: AccountId, to: AccountId, seconds: i64) -> Transaction {
        Transaction::local(
            from,
            to,
            eur(dec!(10)),
            eur(dec!(10)),
            OwnerSlot::Primary,
            base_time() + TimeDelta::seconds(seconds),
        )
    }

    #[tokio::test]
    async fn test_in_memory_account_store() {
        let store = InMemoryAccountStore::new();
        let account = Account::open(
            1,
            AccountType::Checking,
            eur(dec!(100)),
            AccountHolder::new(1, "Ana"),
            &AccountDefaults::default(),
            base_time(),
        );

        store.save(account.clone()).await.unwrap();
        let retrieved = store.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(retrieved, account);

        assert!(store.find_by_id(2).await.unwrap().is_none());
        assert_eq!(store.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transaction_store_assigns_ids() {
        let store = InMemoryTransactionStore::new();
        let first = store.save(transfer(1, 2, 0)).await.unwrap();
        let second = store.save(transfer(1, 2, 1)).await.unwrap();
        assert_eq!(first.id(), Some(1));
        assert_eq!(second.id(), Some(2));

        let mut updated = first.clone();
        updated.accept().unwrap();
        let saved = store.save(updated.clone()).await.unwrap();
        assert_eq!(saved.id(), Some(1));
        assert_eq!(store.find_by_id(1).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_history_is_filtered_and_ordered() {
        let store = InMemoryTransactionStore::new();
        store.save(transfer(1, 2, 30)).await.unwrap();
        store.save(transfer(3, 1, 10)).await.unwrap();
        store.save(transfer(2, 3, 20)).await.unwrap();
        store.save(transfer(1, 3, -60)).await.unwrap();

        let history = store
            .history_for_account(1, base_time())
            .await
            .unwrap();
        let dates: Vec<_> = history.iter().map(Transaction::operation_date).collect();
        assert_eq!(
            dates,
            vec![
                base_time() + TimeDelta::seconds(10),
                base_time() + TimeDelta::seconds(30)
            ]
        );
    }

    #[tokio::test]
    async fn test_receipt_store_queries() {
        let store = InMemoryReceiptStore::new();
        let mut tx = transfer(1, 2, 0).with_id(5);
        tx.refuse().unwrap();
        let sender = receipt::refusal(&tx, ReceiptSide::Sender, 1, Currency::EUR, "no").unwrap();
        let receiver =
            receipt::refusal(&tx, ReceiptSide::Receiver, 2, Currency::EUR, "no").unwrap();
        store.save(sender.clone()).await.unwrap();
        store.save(receiver.clone()).await.unwrap();

        assert_eq!(store.for_transaction(5).await.unwrap(), vec![sender, receiver.clone()]);
        assert_eq!(store.for_account(2).await.unwrap(), vec![receiver]);
        assert!(store.for_transaction(6).await.unwrap().is_empty());
    }
}
