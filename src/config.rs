//! Runtime configuration.
//!
//! Everything has a default so an empty JSON object (or no file at all) yields a
//! working ledger.

use crate::domain::money::Currency;
use crate::error::{LedgerError, Result};
use chrono::TimeDelta;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct LedgerConfig {
    pub fraud: FraudConfig,
    pub accounts: AccountDefaults,
    /// Static exchange rates served by the fixed rate provider.
    pub rates: Vec<RateEntry>,
}

impl LedgerConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: LedgerConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fraud.window_millis == 0 {
            return Err(LedgerError::Config(
                "fraud.window_millis must be greater than zero".to_string(),
            ));
        }
        if self.fraud.daily_ceiling <= Decimal::ZERO {
            return Err(LedgerError::Config(
                "fraud.daily_ceiling must be positive".to_string(),
            ));
        }
        if let Some(entry) = self.rates.iter().find(|entry| entry.rate <= Decimal::ZERO) {
            return Err(LedgerError::Config(format!(
                "rate {} -> {} must be positive",
                entry.from, entry.to
            )));
        }
        Ok(())
    }
}

/// Thresholds used by the fraud detector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FraudConfig {
    /// How many earlier transactions may fall inside the window before the
    /// time signal fails.
    pub max_recent_transactions: usize,
    pub window_millis: u64,
    /// Ceiling for the sum of one calendar day's outgoing transfers, in the
    /// source account's currency.
    pub daily_ceiling: Decimal,
}

impl FraudConfig {
    pub fn window(&self) -> TimeDelta {
        TimeDelta::milliseconds(i64::try_from(self.window_millis).unwrap_or(i64::MAX))
    }
}

impl Default for FraudConfig {
    fn default() -> Self {
        Self {
            max_recent_transactions: 1,
            window_millis: 1_000,
            daily_ceiling: dec!(1000),
        }
    }
}

/// Values applied to newly opened accounts, expressed in the account's currency.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AccountDefaults {
    pub penalty_fee: Decimal,
    pub credit_limit: Decimal,
    pub credit_interest_rate: Decimal,
    pub checking_minimum_balance: Decimal,
    pub checking_maintenance_fee: Decimal,
    pub savings_minimum_balance: Decimal,
    pub savings_interest_rate: Decimal,
}

impl Default for AccountDefaults {
    fn default() -> Self {
        Self {
            penalty_fee: dec!(40),
            credit_limit: dec!(100),
            credit_interest_rate: dec!(0.2),
            checking_minimum_balance: dec!(250),
            checking_maintenance_fee: dec!(12),
            savings_minimum_balance: dec!(1000),
            savings_interest_rate: dec!(0.0025),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RateEntry {
    pub from: Currency,
    pub to: Currency,
    pub rate: Decimal,
}
