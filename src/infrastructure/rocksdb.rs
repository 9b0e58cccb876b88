use crate::domain::account::{Account, AccountId};
use crate::domain::ports::{AccountStore, ReceiptStore, TransactionStore};
use crate::domain::receipt::TransactionReceipt;
use crate::domain::transaction::{Transaction, TransactionId};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing account states.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for storing transaction records.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for storing receipts, keyed by transaction then account.
pub const CF_RECEIPTS: &str = "receipts";
/// Column Family for bookkeeping values such as the id counter.
pub const CF_META: &str = "meta";
/// Column Family indexing transactions by account then operation date. Keys
/// only, the transaction itself lives in [`CF_TRANSACTIONS`].
pub const CF_HISTORY: &str = "account_history";

const LAST_TRANSACTION_ID: &[u8] = b"last_transaction_id";

/// A persistent store implementation using RocksDB.
///
/// Accounts, transactions and receipts live in separate Column Families with
/// JSON-encoded values. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    /// Serializes id assignment so two concurrent saves never share an id.
    id_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at `path`, creating any missing
    /// column family.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_ACCOUNTS, CF_TRANSACTIONS, CF_RECEIPTS, CF_META, CF_HISTORY]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            id_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::Storage(Box::new(std::io::Error::other(format!(
                "column family '{name}' not found"
            ))))
        })
    }

    fn get<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        match self.db.get_pinned_cf(self.cf(cf)?, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(&self, cf: &str, key: &[u8], value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(self.cf(cf)?, key, bytes)?;
        Ok(())
    }

    /// Decodes every value of `cf` whose key starts with `prefix`.
    fn scan<T: DeserializeOwned>(&self, cf: &str, prefix: &[u8]) -> Result<Vec<T>> {
        let iter = self
            .db
            .iterator_cf(self.cf(cf)?, IteratorMode::From(prefix, Direction::Forward));

        let mut values = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }

    fn last_transaction_id(&self) -> Result<TransactionId> {
        Ok(self.get(CF_META, LAST_TRANSACTION_ID)?.unwrap_or_default())
    }
}

/// `account | millis | transaction`, all big-endian. The sign bit of the
/// timestamp is flipped so pre-epoch dates still sort first.
fn history_key(account: AccountId, date: DateTime<Utc>, transaction: TransactionId) -> Vec<u8> {
    let millis = (date.timestamp_millis() as u64) ^ (1 << 63);
    let mut key = Vec::with_capacity(24);
    key.extend_from_slice(&account.to_be_bytes());
    key.extend_from_slice(&millis.to_be_bytes());
    key.extend_from_slice(&transaction.to_be_bytes());
    key
}

fn receipt_key(transaction: TransactionId, account: AccountId) -> Vec<u8> {
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&transaction.to_be_bytes());
    key.extend_from_slice(&account.to_be_bytes());
    key
}

#[async_trait]
impl AccountStore for RocksDBStore {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        self.get(CF_ACCOUNTS, &id.to_be_bytes())
    }

    async fn save(&self, account: Account) -> Result<()> {
        self.put(CF_ACCOUNTS, &account.id().to_be_bytes(), &account)
    }

    async fn all(&self) -> Result<Vec<Account>> {
        // Big-endian keys iterate in ascending id order.
        self.scan(CF_ACCOUNTS, &[])
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn save(&self, tx: Transaction) -> Result<Transaction> {
        let _guard = self.id_lock.lock().await;
        let last = self.last_transaction_id()?;
        let id = tx.id().unwrap_or(last + 1);
        let tx = tx.with_id(id);

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_TRANSACTIONS)?, id.to_be_bytes(), serde_json::to_vec(&tx)?);
        let history = self.cf(CF_HISTORY)?;
        for account in tx.base_account().into_iter().chain([tx.target_account()]) {
            batch.put_cf(history, history_key(account, tx.operation_date(), id), b"");
        }
        if id > last {
            batch.put_cf(self.cf(CF_META)?, LAST_TRANSACTION_ID, serde_json::to_vec(&id)?);
        }
        self.db.write(batch)?;
        Ok(tx)
    }

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>> {
        self.get(CF_TRANSACTIONS, &id.to_be_bytes())
    }

    async fn history_for_account(
        &self,
        account: AccountId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        let prefix = account.to_be_bytes();
        let start = history_key(account, since, 0);
        let iter = self.db.iterator_cf(
            self.cf(CF_HISTORY)?,
            IteratorMode::From(&start, Direction::Forward),
        );

        let mut history = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            let id_bytes = key
                .get(16..)
                .and_then(|tail| <[u8; 8]>::try_from(tail).ok())
                .ok_or_else(|| {
                    LedgerError::Storage(Box::new(std::io::Error::other("malformed history key")))
                })?;
            let id = TransactionId::from_be_bytes(id_bytes);
            match self.get::<Transaction>(CF_TRANSACTIONS, &id_bytes)? {
                // the index is in milliseconds, the dates are not
                Some(tx) if tx.operation_date() >= since => history.push(tx),
                Some(_) => {}
                None => {
                    return Err(LedgerError::InvariantViolation(format!(
                        "history index points at missing transaction {id}"
                    )));
                }
            }
        }
        history.sort_by_key(Transaction::operation_date);
        Ok(history)
    }
}

#[async_trait]
impl ReceiptStore for RocksDBStore {
    async fn save(&self, receipt: TransactionReceipt) -> Result<()> {
        let key = receipt_key(receipt.transaction, receipt.account);
        self.put(CF_RECEIPTS, &key, &receipt)
    }

    async fn for_transaction(&self, tx: TransactionId) -> Result<Vec<TransactionReceipt>> {
        self.scan(CF_RECEIPTS, &tx.to_be_bytes())
    }

    async fn for_account(&self, account: AccountId) -> Result<Vec<TransactionReceipt>> {
        Ok(self
            .scan::<TransactionReceipt>(CF_RECEIPTS, &[])?
            .into_iter()
            .filter(|receipt| receipt.account == account)
            .collect())
    }
}
