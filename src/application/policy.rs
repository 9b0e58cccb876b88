//! Implementations of the balance-change hook.

use super::fees::FeeService;
use crate::domain::account::Account;
use crate::domain::ports::{AccountPolicy, ClockRef};
use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;

/// Does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPolicy;

#[async_trait]
impl AccountPolicy for NoopPolicy {
    async fn on_balance_changed(&self, _account: &Account) -> Result<()> {
        Ok(())
    }
}

/// Charges the penalty fee when a balance drops below the account's minimum.
///
/// Runs while the engine still holds the account's lock, so it goes through
/// the fee service's lock-free entry point.
#[derive(Clone)]
pub struct MinimumBalancePolicy {
    fees: FeeService,
    clock: ClockRef,
}

impl MinimumBalancePolicy {
    pub fn new(fees: FeeService, clock: ClockRef) -> Self {
        Self { fees, clock }
    }
}

#[async_trait]
impl AccountPolicy for MinimumBalancePolicy {
    async fn on_balance_changed(&self, account: &Account) -> Result<()> {
        if !account.penalty_due(self.clock.now().date_naive())? {
            return Ok(());
        }
        debug!(account = account.id(), "balance below minimum, charging penalty fee");
        self.fees.charge_penalty_fee_locked(account.id()).await?;
        Ok(())
    }
}
