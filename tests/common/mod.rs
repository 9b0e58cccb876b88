#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::Error;
use std::path::Path;
use std::sync::Arc;
use txledger::application::engine::{TransactionEngine, TransferRequest};
use txledger::application::fees::FeeService;
use txledger::application::locks::AccountLocks;
use txledger::application::policy::MinimumBalancePolicy;
use txledger::config::LedgerConfig;
use txledger::domain::account::{Account, AccountHolder, AccountId, AccountType};
use txledger::domain::fraud::FraudDetector;
use txledger::domain::money::{Currency, Money};
use txledger::domain::ports::AccountStore;
use txledger::infrastructure::clock::FixedClock;
use txledger::infrastructure::in_memory::{
    InMemoryAccountStore, InMemoryReceiptStore, InMemoryTransactionStore,
};
use txledger::infrastructure::rates::FixedRateProvider;

pub const COMMAND_HEADER: [&str; 6] = ["type", "source", "target", "amount", "currency", "owner"];

pub fn eur(amount: Decimal) -> Money {
    Money::new(amount, Currency::EUR)
}

pub fn usd(amount: Decimal) -> Money {
    Money::new(amount, Currency::USD)
}

/// Noon on a Monday, far from any day boundary.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap()
}

pub fn transfer(
    source: AccountId,
    target: AccountId,
    amount: Money,
    owner: &str,
) -> TransferRequest {
    TransferRequest {
        source,
        target,
        amount,
        claimed_owner: owner.to_string(),
    }
}

/// A fully wired in-memory ledger driven by a fixed clock.
pub struct Ledger {
    pub config: LedgerConfig,
    pub accounts: Arc<InMemoryAccountStore>,
    pub transactions: Arc<InMemoryTransactionStore>,
    pub receipts: Arc<InMemoryReceiptStore>,
    pub clock: Arc<FixedClock>,
    pub fees: FeeService,
    pub engine: Arc<TransactionEngine>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        let accounts = Arc::new(InMemoryAccountStore::new());
        let transactions = Arc::new(InMemoryTransactionStore::new());
        let receipts = Arc::new(InMemoryReceiptStore::new());
        let clock = Arc::new(FixedClock::new(start()));
        let locks = AccountLocks::new();

        let fees = FeeService::new(
            accounts.clone(),
            transactions.clone(),
            receipts.clone(),
            clock.clone(),
            locks.clone(),
        );
        let rates = FixedRateProvider::from_entries(&config.rates).with_rate(
            Currency::EUR,
            Currency::USD,
            dec!(1.1),
        );
        let engine = TransactionEngine::new(
            accounts.clone(),
            transactions.clone(),
            receipts.clone(),
            Arc::new(rates),
        )
        .with_policy(Arc::new(MinimumBalancePolicy::new(fees.clone(), clock.clone())))
        .with_clock(clock.clone())
        .with_fraud_detector(FraudDetector::new(config.fraud.clone()))
        .with_locks(locks);

        Self {
            config,
            accounts,
            transactions,
            receipts,
            clock,
            fees,
            engine: Arc::new(engine),
        }
    }

    /// Opens and stores an account whose primary holder shares its id.
    pub async fn open(
        &self,
        id: AccountId,
        account_type: AccountType,
        balance: Money,
        owner: &str,
    ) -> Account {
        let account = Account::open(
            id,
            account_type,
            balance,
            AccountHolder::new(id, owner),
            &self.config.accounts,
            start(),
        );
        self.accounts.save(account.clone()).await.unwrap();
        account
    }

    pub async fn store(&self, account: Account) {
        self.accounts.save(account).await.unwrap();
    }

    pub async fn account(&self, id: AccountId) -> Account {
        self.accounts.find_by_id(id).await.unwrap().unwrap()
    }

    pub async fn balance(&self, id: AccountId) -> Money {
        self.account(id).await.balance()
    }
}

/// Writes a commands CSV with the standard header followed by `rows`.
pub fn write_commands_csv(path: &Path, rows: &[[&str; 6]]) -> Result<(), Error> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(COMMAND_HEADER)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes a seed file opening each `(id, type, balance, currency, owner)`.
pub fn write_accounts_json(
    path: &Path,
    accounts: &[(AccountId, &str, &str, &str, &str)],
) -> Result<(), Error> {
    let seeds: Vec<serde_json::Value> = accounts
        .iter()
        .map(|(id, account_type, balance, currency, owner)| {
            serde_json::json!({
                "id": id,
                "type": account_type,
                "balance": balance,
                "currency": currency,
                "primary_owner": {"id": id, "name": owner},
            })
        })
        .collect();
    std::fs::write(path, serde_json::to_vec_pretty(&seeds)?)
}
