//! Fraud detection over an account's recent outgoing transfers.

use crate::config::FraudConfig;
use crate::domain::money::Money;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// One earlier outgoing transfer, accepted or refused, with its amount
/// already expressed in the source account's currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub amount: Money,
}

/// Result of both fraud signals for one candidate transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FraudAssessment {
    pub time_ok: bool,
    pub amount_ok: bool,
}

impl FraudAssessment {
    /// A transfer is only treated as fraud when both signals fail.
    pub fn is_fraudulent(&self) -> bool {
        !self.time_ok && !self.amount_ok
    }
}

#[derive(Debug, Clone, Default)]
pub struct FraudDetector {
    config: FraudConfig,
}

impl FraudDetector {
    pub fn new(config: FraudConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FraudConfig {
        &self.config
    }

    /// Evaluates a transfer of `amount` made at `at` against `history`.
    ///
    /// `history` must not contain the candidate itself.
    pub fn evaluate(
        &self,
        at: DateTime<Utc>,
        amount: Money,
        history: &[HistoryEntry],
    ) -> Result<FraudAssessment> {
        Ok(FraudAssessment {
            time_ok: self.time_pattern_ok(at, history),
            amount_ok: self.daily_amount_ok(at, amount, history)?,
        })
    }

    fn time_pattern_ok(&self, at: DateTime<Utc>, history: &[HistoryEntry]) -> bool {
        let window_start = at - self.config.window();
        let recent = history
            .iter()
            .filter(|entry| entry.at >= window_start && entry.at <= at)
            .count();
        recent <= self.config.max_recent_transactions
    }

    fn daily_amount_ok(
        &self,
        at: DateTime<Utc>,
        amount: Money,
        history: &[HistoryEntry],
    ) -> Result<bool> {
        let day = at.date_naive();
        let total = history
            .iter()
            .filter(|entry| entry.at.date_naive() == day && entry.at <= at)
            .try_fold(amount, |sum, entry| sum.try_add(entry.amount));
        let total = match total {
            Ok(total) => total,
            // a sum too large to represent is over any ceiling
            Err(LedgerError::AmountOverflow(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        let ceiling = Money::new(self.config.daily_ceiling, amount.currency());
        Ok(total.try_cmp(&ceiling)? != Ordering::Greater)
    }
}
