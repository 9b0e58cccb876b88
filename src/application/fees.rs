//! Bank-originated transactions: deposits, penalty fees and maintenance fees.
//!
//! Each of these touches a single account and records a single receipt on the
//! target side.

use super::TransactionOutcome;
use super::engine::FROZEN_MESSAGE;
use super::locks::AccountLocks;
use crate::domain::account::{Account, AccountId};
use crate::domain::money::Money;
use crate::domain::ports::{AccountStoreRef, ClockRef, ReceiptStoreRef, TransactionStoreRef};
use crate::domain::receipt::{self, ReceiptSide};
use crate::domain::transaction::{Transaction, TransactionType};
use crate::error::{LedgerError, Result};
use tracing::info;

pub const INVALID_DEPOSIT_MESSAGE: &str = "Invalid amount to deposit.";
pub const PENALTY_NOT_DUE_MESSAGE: &str = "No penalty fee is due for this account.";
pub const MAINTENANCE_NOT_DUE_MESSAGE: &str = "Maintenance fee already charged this month.";

#[derive(Clone)]
pub struct FeeService {
    accounts: AccountStoreRef,
    transactions: TransactionStoreRef,
    receipts: ReceiptStoreRef,
    clock: ClockRef,
    locks: AccountLocks,
}

impl FeeService {
    pub fn new(
        accounts: AccountStoreRef,
        transactions: TransactionStoreRef,
        receipts: ReceiptStoreRef,
        clock: ClockRef,
        locks: AccountLocks,
    ) -> Self {
        Self {
            accounts,
            transactions,
            receipts,
            clock,
            locks,
        }
    }

    /// Credits `amount` to `target`. The amount must be in the account's currency.
    pub async fn deposit(&self, target: AccountId, amount: Money) -> Result<TransactionOutcome> {
        let _guard = self.locks.acquire(&[target]).await;
        let mut account = self.load(target).await?;
        if amount.currency() != account.balance().currency() {
            return Err(LedgerError::CurrencyMismatch {
                left: account.balance().currency(),
                right: amount.currency(),
            });
        }

        let tx = Transaction::system(TransactionType::Deposit, target, amount, self.clock.now());
        let tx = self.transactions.save(tx).await?;

        if account.is_frozen() {
            return self.refuse(tx, &account, FROZEN_MESSAGE).await;
        }
        if !account.can_credit(amount)? {
            return self.refuse(tx, &account, INVALID_DEPOSIT_MESSAGE).await;
        }

        account.credit(amount)?;
        let message = format!("Deposit of {amount} credited to this account.");
        self.accept(tx, &account, amount, message).await
    }

    /// Charges the penalty fee if the account sits below its minimum balance and
    /// was not penalized yet this month.
    pub async fn charge_penalty_fee(&self, id: AccountId) -> Result<TransactionOutcome> {
        let _guard = self.locks.acquire(&[id]).await;
        self.charge_penalty_fee_locked(id).await
    }

    /// Same as [`FeeService::charge_penalty_fee`] for callers already holding
    /// the account's lock.
    pub(crate) async fn charge_penalty_fee_locked(
        &self,
        id: AccountId,
    ) -> Result<TransactionOutcome> {
        let mut account = self.load(id).await?;
        if !account.kind().has_minimum_balance() {
            return Err(LedgerError::InvalidRequest(format!(
                "{} account {id} has no minimum balance",
                account.kind().account_type()
            )));
        }

        let now = self.clock.now();
        let fee = account.penalty_fee();
        account.balance().try_sub(fee)?;
        let tx = Transaction::system(TransactionType::PenaltyFee, id, fee, now);
        let tx = self.transactions.save(tx).await?;

        if !account.penalty_due(now.date_naive())? {
            return self.refuse(tx, &account, PENALTY_NOT_DUE_MESSAGE).await;
        }

        account.charge_fee(fee)?;
        account.mark_penalty_checked(now.date_naive());
        let message = format!("The penalty fee of {fee} was withdrawn from this account.");
        self.accept(tx, &account, -fee, message).await
    }

    /// Charges the monthly maintenance fee of a checking account when due.
    pub async fn charge_maintenance_fee(&self, id: AccountId) -> Result<TransactionOutcome> {
        let _guard = self.locks.acquire(&[id]).await;
        let mut account = self.load(id).await?;
        let fee = account.maintenance_fee().ok_or_else(|| {
            LedgerError::InvalidRequest(format!(
                "{} account {id} has no maintenance fee",
                account.kind().account_type()
            ))
        })?;

        let now = self.clock.now();
        account.balance().try_sub(fee)?;
        let tx = Transaction::system(TransactionType::MaintenanceFee, id, fee, now);
        let tx = self.transactions.save(tx).await?;

        if !account.maintenance_due(now.date_naive()) {
            return self.refuse(tx, &account, MAINTENANCE_NOT_DUE_MESSAGE).await;
        }

        account.charge_fee(fee)?;
        account.mark_maintenance_checked(now.date_naive());
        let message = format!("The maintenance fee of {fee} was withdrawn from this account.");
        self.accept(tx, &account, -fee, message).await
    }

    async fn load(&self, id: AccountId) -> Result<Account> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))
    }

    /// Persists the mutated account and records `signed_amount` on its receipt.
    async fn accept(
        &self,
        mut tx: Transaction,
        account: &Account,
        signed_amount: Money,
        message: String,
    ) -> Result<TransactionOutcome> {
        tx.accept()?;
        self.accounts.save(account.clone()).await?;
        let tx = self.transactions.save(tx).await?;

        let receipt = receipt::credit(&tx, ReceiptSide::Target, account.id(), signed_amount, message)?;
        self.receipts.save(receipt.clone()).await?;

        info!(
            transaction = ?tx.id(),
            account = account.id(),
            kind = %tx.kind(),
            amount = %signed_amount,
            "system transaction accepted"
        );
        Ok(TransactionOutcome {
            transaction: tx,
            receipts: vec![receipt],
        })
    }

    async fn refuse(
        &self,
        mut tx: Transaction,
        account: &Account,
        message: &str,
    ) -> Result<TransactionOutcome> {
        tx.refuse()?;
        let tx = self.transactions.save(tx).await?;

        let receipt = receipt::refusal(
            &tx,
            ReceiptSide::Target,
            account.id(),
            account.balance().currency(),
            message,
        )?;
        self.receipts.save(receipt.clone()).await?;

        info!(
            transaction = ?tx.id(),
            account = account.id(),
            kind = %tx.kind(),
            reason = message,
            "system transaction refused"
        );
        Ok(TransactionOutcome {
            transaction: tx,
            receipts: vec![receipt],
        })
    }
}
