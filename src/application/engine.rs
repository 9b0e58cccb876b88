use super::TransactionOutcome;
use super::locks::AccountLocks;
use super::policy::NoopPolicy;
use crate::domain::account::{Account, AccountId};
use crate::domain::fraud::{FraudDetector, HistoryEntry};
use crate::domain::money::{Currency, Money};
use crate::domain::ports::{
    AccountPolicyRef, AccountStoreRef, ClockRef, RateProviderRef, ReceiptStoreRef,
    TransactionStoreRef,
};
use crate::domain::receipt::{self, ReceiptSide};
use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Result};
use crate::infrastructure::clock::SystemClock;
use chrono::{DateTime, NaiveTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const FRAUD_MESSAGE: &str = "Fraudulent behaviour detected! Base account was frozen.";
pub const FROZEN_MESSAGE: &str = "Account is frozen. Unable to complete the transaction.";
pub const INVALID_AMOUNT_MESSAGE: &str = "Invalid amount to transfer.";

/// A request to move money from one account to another.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub source: AccountId,
    pub target: AccountId,
    pub amount: Money,
    /// Name of the holder authorizing the transfer, as typed by the caller.
    pub claimed_owner: String,
}

/// The main entry point for money movements between accounts.
///
/// `TransactionEngine` validates a transfer, applies it to both balances or
/// refuses it, and records a receipt for every account side. Work touching the
/// same account is serialized through [`AccountLocks`], from loading the
/// accounts until the policy hook has run.
pub struct TransactionEngine {
    accounts: AccountStoreRef,
    transactions: TransactionStoreRef,
    receipts: ReceiptStoreRef,
    rates: RateProviderRef,
    policy: AccountPolicyRef,
    clock: ClockRef,
    detector: FraudDetector,
    locks: AccountLocks,
}

impl TransactionEngine {
    /// Creates an engine with the default fraud thresholds, no balance policy
    /// and the system clock.
    pub fn new(
        accounts: AccountStoreRef,
        transactions: TransactionStoreRef,
        receipts: ReceiptStoreRef,
        rates: RateProviderRef,
    ) -> Self {
        Self {
            accounts,
            transactions,
            receipts,
            rates,
            policy: Arc::new(NoopPolicy),
            clock: Arc::new(SystemClock),
            detector: FraudDetector::default(),
            locks: AccountLocks::new(),
        }
    }

    pub fn with_policy(mut self, policy: AccountPolicyRef) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: ClockRef) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_fraud_detector(mut self, detector: FraudDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Shares the lock registry with other services mutating the same accounts.
    pub fn with_locks(mut self, locks: AccountLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Processes one transfer request.
    ///
    /// Unknown accounts, an owner name matching no holder of the source account,
    /// missing exchange rates and amounts that overflow on conversion are
    /// errors and leave no trace. Every other
    /// outcome, accepted or refused, is returned with one receipt per side
    /// (sender first).
    pub async fn submit_local_transaction(
        &self,
        request: TransferRequest,
    ) -> Result<TransactionOutcome> {
        if request.source == request.target {
            return Err(LedgerError::InvalidRequest(format!(
                "source and target are the same account ({})",
                request.source
            )));
        }

        let _guard = self.locks.acquire(&[request.source, request.target]).await;

        let mut source = self.load(request.source).await?;
        let mut target = self.load(request.target).await?;

        let (owner, _) = source
            .authorizing_owner(&request.claimed_owner)
            .ok_or_else(|| LedgerError::OwnerMismatch {
                account: source.id(),
                claimed: request.claimed_owner.clone(),
            })?;

        let now = self.clock.now();
        let converted = self.convert(request.amount, target.balance().currency()).await?;
        let debited = self.convert(request.amount, source.balance().currency()).await?;
        let history = self.outgoing_history(&source, now).await?;
        let assessment = self.detector.evaluate(now, debited, &history)?;

        let tx = Transaction::local(
            source.id(),
            target.id(),
            request.amount,
            converted,
            owner,
            now,
        );
        let tx = self.transactions.save(tx).await?;
        debug!(
            transaction = ?tx.id(),
            time_ok = assessment.time_ok,
            amount_ok = assessment.amount_ok,
            "fraud signals evaluated"
        );

        if assessment.is_fraudulent() {
            target.freeze();
            self.accounts.save(target.clone()).await?;
            warn!(
                transaction = ?tx.id(),
                source = source.id(),
                frozen = target.id(),
                "fraudulent transfer pattern, account frozen"
            );
            return self.refuse(tx, &source, &target, FRAUD_MESSAGE).await;
        }

        if source.is_frozen() || target.is_frozen() {
            return self.refuse(tx, &source, &target, FROZEN_MESSAGE).await;
        }

        if !converted.is_positive()
            || !source.can_debit(debited)?
            || !target.can_credit(converted)?
        {
            return self.refuse(tx, &source, &target, INVALID_AMOUNT_MESSAGE).await;
        }

        self.apply(tx, &mut source, &mut target, debited).await
    }

    async fn load(&self, id: AccountId) -> Result<Account> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))
    }

    async fn convert(&self, amount: Money, target: Currency) -> Result<Money> {
        if amount.currency() == target {
            return Ok(amount);
        }
        let rate = self.rates.rate(amount.currency(), target).await?;
        amount.convert(target, rate)
    }

    /// Earlier transfers sent from `source` that the fraud detector needs to
    /// see: today's, and anything inside the time window.
    async fn outgoing_history(
        &self,
        source: &Account,
        now: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>> {
        let start_of_day = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let since = start_of_day.min(now - self.detector.config().window());
        let currency = source.balance().currency();

        let mut entries = Vec::new();
        for tx in self
            .transactions
            .history_for_account(source.id(), since)
            .await?
            .into_iter()
            .filter(|tx| tx.base_account() == Some(source.id()))
        {
            entries.push(HistoryEntry {
                at: tx.operation_date(),
                amount: self.amount_in(&tx, currency).await?,
            });
        }
        Ok(entries)
    }

    /// The amount of `tx` expressed in `currency`, avoiding a rate lookup when
    /// one of the recorded amounts already matches.
    async fn amount_in(&self, tx: &Transaction, currency: Currency) -> Result<Money> {
        if tx.requested_amount().currency() == currency {
            Ok(tx.requested_amount())
        } else if tx.converted_amount().currency() == currency {
            Ok(tx.converted_amount())
        } else {
            self.convert(tx.requested_amount(), currency).await
        }
    }

    async fn refuse(
        &self,
        mut tx: Transaction,
        source: &Account,
        target: &Account,
        message: &str,
    ) -> Result<TransactionOutcome> {
        tx.refuse()?;
        let tx = self.transactions.save(tx).await?;

        let receipts = vec![
            receipt::refusal(
                &tx,
                ReceiptSide::Sender,
                source.id(),
                source.balance().currency(),
                message,
            )?,
            receipt::refusal(
                &tx,
                ReceiptSide::Receiver,
                target.id(),
                target.balance().currency(),
                message,
            )?,
        ];
        for receipt in &receipts {
            self.receipts.save(receipt.clone()).await?;
        }

        info!(
            transaction = ?tx.id(),
            source = source.id(),
            target = target.id(),
            reason = message,
            "transfer refused"
        );
        Ok(TransactionOutcome {
            transaction: tx,
            receipts,
        })
    }

    async fn apply(
        &self,
        mut tx: Transaction,
        source: &mut Account,
        target: &mut Account,
        debited: Money,
    ) -> Result<TransactionOutcome> {
        let credited = tx.converted_amount();
        source.debit(debited).map_err(|e| {
            LedgerError::InvariantViolation(format!(
                "debit of validated transfer {:?} failed: {e}",
                tx.id()
            ))
        })?;
        target.credit(credited).map_err(|e| {
            LedgerError::InvariantViolation(format!(
                "credit of validated transfer {:?} failed: {e}",
                tx.id()
            ))
        })?;
        tx.accept()?;

        self.accounts.save(source.clone()).await?;
        self.accounts.save(target.clone()).await?;
        let tx = self.transactions.save(tx).await?;

        let receipts = vec![
            receipt::debit(
                &tx,
                ReceiptSide::Sender,
                source.id(),
                debited,
                format!("Transfer of {debited} to account {} completed.", target.id()),
            )?,
            receipt::credit(
                &tx,
                ReceiptSide::Receiver,
                target.id(),
                credited,
                format!("Transfer of {credited} from account {} received.", source.id()),
            )?,
        ];
        for receipt in &receipts {
            self.receipts.save(receipt.clone()).await?;
        }

        info!(
            transaction = ?tx.id(),
            source = source.id(),
            target = target.id(),
            amount = %debited,
            "transfer accepted"
        );

        // Balances are committed at this point: hook failures are logged only.
        for account in [&*source, &*target] {
            if let Err(e) = self.policy.on_balance_changed(account).await {
                warn!(
                    transaction = ?tx.id(),
                    account = account.id(),
                    error = %e,
                    "balance policy failed"
                );
            }
        }

        Ok(TransactionOutcome {
            transaction: tx,
            receipts,
        })
    }
}
