use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use txledger::application::TransactionOutcome;
use txledger::application::engine::TransactionEngine;
use txledger::application::fees::FeeService;
use txledger::application::locks::AccountLocks;
use txledger::application::policy::MinimumBalancePolicy;
use txledger::config::LedgerConfig;
use txledger::domain::fraud::FraudDetector;
use txledger::domain::ports::{AccountStoreRef, ClockRef, ReceiptStoreRef, TransactionStoreRef};
use txledger::infrastructure::clock::SystemClock;
use txledger::infrastructure::in_memory::{
    InMemoryAccountStore, InMemoryReceiptStore, InMemoryTransactionStore,
};
use txledger::infrastructure::rates::FixedRateProvider;
use txledger::interfaces::csv::command_reader::{CommandReader, LedgerCommand};
use txledger::interfaces::csv::receipt_writer::ReceiptWriter;
use txledger::interfaces::seed;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file
    input: PathBuf,

    /// JSON file with accounts to open before processing. Accounts that
    /// already exist in the store are left untouched.
    #[arg(long)]
    accounts: Option<PathBuf>,

    /// JSON configuration file (fraud thresholds, account defaults, rates)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

struct Stores {
    accounts: AccountStoreRef,
    transactions: TransactionStoreRef,
    receipts: ReceiptStoreRef,
}

impl Stores {
    fn in_memory() -> Self {
        Self {
            accounts: Arc::new(InMemoryAccountStore::new()),
            transactions: Arc::new(InMemoryTransactionStore::new()),
            receipts: Arc::new(InMemoryReceiptStore::new()),
        }
    }

    #[cfg(feature = "storage-rocksdb")]
    fn open(db_path: Option<PathBuf>) -> Result<Self> {
        use txledger::infrastructure::rocksdb::RocksDBStore;

        let Some(db_path) = db_path else {
            return Ok(Self::in_memory());
        };
        let store = RocksDBStore::open(&db_path).into_diagnostic()?;
        tracing::info!(path = %db_path.display(), "using persistent storage");
        Ok(Self {
            accounts: Arc::new(store.clone()),
            transactions: Arc::new(store.clone()),
            receipts: Arc::new(store),
        })
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    fn open(db_path: Option<PathBuf>) -> Result<Self> {
        if db_path.is_some() {
            warn!(
                "Persistent storage requested via --db-path, but the 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
        }
        Ok(Self::in_memory())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LedgerConfig::from_path(path).into_diagnostic()?,
        None => LedgerConfig::default(),
    };
    let stores = Stores::open(cli.db_path)?;
    let clock: ClockRef = Arc::new(SystemClock);

    if let Some(path) = &cli.accounts {
        let file = File::open(path).into_diagnostic()?;
        let accounts = seed::load_accounts(BufReader::new(file), &config.accounts, clock.now())
            .into_diagnostic()?;
        for account in accounts {
            if stores.accounts.find_by_id(account.id()).await.into_diagnostic()?.is_none() {
                stores.accounts.save(account).await.into_diagnostic()?;
            }
        }
    }

    let locks = AccountLocks::new();
    let fees = FeeService::new(
        stores.accounts.clone(),
        stores.transactions.clone(),
        stores.receipts.clone(),
        clock.clone(),
        locks.clone(),
    );
    let engine = TransactionEngine::new(
        stores.accounts.clone(),
        stores.transactions.clone(),
        stores.receipts.clone(),
        Arc::new(FixedRateProvider::from_entries(&config.rates)),
    )
    .with_policy(Arc::new(MinimumBalancePolicy::new(fees.clone(), clock.clone())))
    .with_clock(clock)
    .with_fraud_detector(FraudDetector::new(config.fraud.clone()))
    .with_locks(locks);

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(BufReader::new(file));
    let mut writer = ReceiptWriter::new(io::stdout());

    for command in reader.commands() {
        let outcome: txledger::error::Result<TransactionOutcome> = match command {
            Ok(LedgerCommand::Transfer(request)) => engine.submit_local_transaction(request).await,
            Ok(LedgerCommand::Deposit { target, amount }) => fees.deposit(target, amount).await,
            Ok(LedgerCommand::PenaltyFee { account }) => fees.charge_penalty_fee(account).await,
            Ok(LedgerCommand::MaintenanceFee { account }) => {
                fees.charge_maintenance_fee(account).await
            }
            Err(e) => {
                warn!(error = %e, "skipping unreadable row");
                continue;
            }
        };

        match outcome {
            Ok(outcome) => writer.write_all(&outcome.receipts).into_diagnostic()?,
            Err(e) => warn!(error = %e, "command failed"),
        }
    }

    writer.flush().into_diagnostic()?;

    Ok(())
}
