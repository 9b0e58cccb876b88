//! Opening accounts from a JSON document.

use crate::config::AccountDefaults;
use crate::domain::account::{Account, AccountHolder, AccountId, AccountStatus, AccountType};
use crate::domain::money::{Currency, Money};
use crate::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One entry of the seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSeed {
    pub id: AccountId,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub balance: Decimal,
    pub currency: Currency,
    pub primary_owner: AccountHolder,
    #[serde(default)]
    pub secondary_owner: Option<AccountHolder>,
    /// Parsed case-insensitively; `active` when absent.
    #[serde(default)]
    pub status: Option<String>,
    /// Defaults to the time the seed is loaded.
    #[serde(default)]
    pub opened: Option<DateTime<Utc>>,
}

impl AccountSeed {
    pub fn into_account(self, defaults: &AccountDefaults, now: DateTime<Utc>) -> Result<Account> {
        let status = match self.status.as_deref() {
            Some(status) => status.parse()?,
            None => AccountStatus::Active,
        };

        let mut account = Account::open(
            self.id,
            self.account_type,
            Money::new(self.balance, self.currency),
            self.primary_owner,
            defaults,
            self.opened.unwrap_or(now),
        );
        if let Some(owner) = self.secondary_owner {
            account = account.with_secondary_owner(owner);
        }
        if status == AccountStatus::Frozen {
            account.freeze();
        }
        Ok(account)
    }
}

/// Reads a JSON array of [`AccountSeed`]s and opens every account.
pub fn load_accounts<R: Read>(
    source: R,
    defaults: &AccountDefaults,
    now: DateTime<Utc>,
) -> Result<Vec<Account>> {
    let seeds: Vec<AccountSeed> = serde_json::from_reader(source)?;
    seeds
        .into_iter()
        .map(|seed| seed.into_account(defaults, now))
        .collect()
}
