use crate::config::AccountDefaults;
use crate::domain::money::Money;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub type AccountId = u64;

/// A person holding (or co-holding) an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountHolder {
    pub id: u64,
    pub name: String,
}

impl AccountHolder {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Which holder of an account authorized an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerSlot {
    Primary,
    Secondary,
}

/// Compares two holder names ignoring case and any whitespace.
pub fn names_match(left: &str, right: &str) -> bool {
    fn normalize(name: &str) -> String {
        name.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect()
    }
    let left = normalize(left);
    !left.is_empty() && left == normalize(right)
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Frozen,
}

impl FromStr for AccountStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("active") {
            Ok(AccountStatus::Active)
        } else if s.eq_ignore_ascii_case("frozen") {
            Ok(AccountStatus::Frozen)
        } else {
            Err(LedgerError::InvalidStatus(s.to_string()))
        }
    }
}

/// The product an account was opened as.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Checking,
    StudentChecking,
    Savings,
    CreditCard,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccountType::Checking => "checking",
            AccountType::StudentChecking => "student_checking",
            AccountType::Savings => "savings",
            AccountType::CreditCard => "credit_card",
        };
        f.write_str(name)
    }
}

/// Type-specific account data.
///
/// Amounts held here always share the currency of the account balance.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccountKind {
    Checking {
        minimum_balance: Money,
        monthly_maintenance_fee: Money,
        last_penalty_check: Option<NaiveDate>,
        last_maintenance_check: Option<NaiveDate>,
    },
    StudentChecking,
    Savings {
        minimum_balance: Money,
        interest_rate: Decimal,
        last_penalty_check: Option<NaiveDate>,
    },
    CreditCard {
        credit_limit: Money,
        interest_rate: Decimal,
    },
}

impl AccountKind {
    /// Builds the type-specific data for a new account from the configured defaults.
    pub fn with_defaults(
        account_type: AccountType,
        balance: &Money,
        defaults: &AccountDefaults,
    ) -> Self {
        let currency = balance.currency();
        match account_type {
            AccountType::Checking => AccountKind::Checking {
                minimum_balance: Money::new(defaults.checking_minimum_balance, currency),
                monthly_maintenance_fee: Money::new(defaults.checking_maintenance_fee, currency),
                last_penalty_check: None,
                last_maintenance_check: None,
            },
            AccountType::StudentChecking => AccountKind::StudentChecking,
            AccountType::Savings => AccountKind::Savings {
                minimum_balance: Money::new(defaults.savings_minimum_balance, currency),
                interest_rate: defaults.savings_interest_rate,
                last_penalty_check: None,
            },
            AccountType::CreditCard => AccountKind::CreditCard {
                credit_limit: Money::new(defaults.credit_limit, currency),
                interest_rate: defaults.credit_interest_rate,
            },
        }
    }

    pub fn account_type(&self) -> AccountType {
        match self {
            AccountKind::Checking { .. } => AccountType::Checking,
            AccountKind::StudentChecking => AccountType::StudentChecking,
            AccountKind::Savings { .. } => AccountType::Savings,
            AccountKind::CreditCard { .. } => AccountType::CreditCard,
        }
    }

    pub fn has_credit_limit(&self) -> bool {
        matches!(self, AccountKind::CreditCard { .. })
    }

    pub fn has_minimum_balance(&self) -> bool {
        matches!(self, AccountKind::Checking { .. } | AccountKind::Savings { .. })
    }

    pub fn has_maintenance_fee(&self) -> bool {
        matches!(self, AccountKind::Checking { .. })
    }
}

/// A bank account as seen by the transaction engine.
///
/// The balance and status can only change through [`Account::debit`],
/// [`Account::credit`], [`Account::charge_fee`] and the freeze toggles.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Account {
    id: AccountId,
    balance: Money,
    primary_owner: AccountHolder,
    secondary_owner: Option<AccountHolder>,
    penalty_fee: Money,
    status: AccountStatus,
    creation_date: DateTime<Utc>,
    kind: AccountKind,
}

impl Account {
    pub fn open(
        id: AccountId,
        account_type: AccountType,
        balance: Money,
        primary_owner: AccountHolder,
        defaults: &AccountDefaults,
        creation_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind: AccountKind::with_defaults(account_type, &balance, defaults),
            penalty_fee: Money::new(defaults.penalty_fee, balance.currency()),
            balance,
            primary_owner,
            secondary_owner: None,
            status: AccountStatus::Active,
            creation_date,
        }
    }

    pub fn with_secondary_owner(mut self, owner: AccountHolder) -> Self {
        self.secondary_owner = Some(owner);
        self
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn primary_owner(&self) -> &AccountHolder {
        &self.primary_owner
    }

    pub fn secondary_owner(&self) -> Option<&AccountHolder> {
        self.secondary_owner.as_ref()
    }

    pub fn penalty_fee(&self) -> Money {
        self.penalty_fee
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }

    pub fn kind(&self) -> &AccountKind {
        &self.kind
    }

    pub fn is_frozen(&self) -> bool {
        self.status == AccountStatus::Frozen
    }

    pub fn freeze(&mut self) {
        self.status = AccountStatus::Frozen;
    }

    pub fn unfreeze(&mut self) {
        self.status = AccountStatus::Active;
    }

    /// Finds the holder whose name matches `claimed`, primary holder first.
    pub fn authorizing_owner(&self, claimed: &str) -> Option<(OwnerSlot, &AccountHolder)> {
        if names_match(&self.primary_owner.name, claimed) {
            return Some((OwnerSlot::Primary, &self.primary_owner));
        }
        self.secondary_owner
            .as_ref()
            .filter(|owner| names_match(&owner.name, claimed))
            .map(|owner| (OwnerSlot::Secondary, owner))
    }

    /// Lowest balance a debit may leave behind.
    pub fn debit_floor(&self) -> Money {
        match &self.kind {
            AccountKind::CreditCard { credit_limit, .. } => -*credit_limit,
            _ => Money::zero(self.balance.currency()),
        }
    }

    /// Whether debiting `amount` keeps the balance at or above [`Account::debit_floor`].
    pub fn can_debit(&self, amount: Money) -> Result<bool> {
        if !amount.is_positive() {
            return Ok(false);
        }
        let after = match self.balance.try_sub(amount) {
            Ok(after) => after,
            Err(LedgerError::AmountOverflow(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        Ok(after.try_cmp(&self.debit_floor())? != Ordering::Less)
    }

    /// Whether crediting `amount` yields a representable balance.
    pub fn can_credit(&self, amount: Money) -> Result<bool> {
        match self.balance.try_add(amount) {
            Ok(_) => Ok(amount.is_positive()),
            Err(LedgerError::AmountOverflow(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn debit(&mut self, amount: Money) -> Result<()> {
        if !self.can_debit(amount)? {
            return Err(LedgerError::InsufficientFunds(self.id));
        }
        self.balance = self.balance.try_sub(amount)?;
        Ok(())
    }

    pub fn credit(&mut self, amount: Money) -> Result<()> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidRequest(format!(
                "credit amount must be positive, got {amount}"
            )));
        }
        self.balance = self.balance.try_add(amount)?;
        Ok(())
    }

    /// Withdraws a bank fee. Fees ignore the debit floor and may leave the
    /// balance negative.
    pub fn charge_fee(&mut self, fee: Money) -> Result<()> {
        self.balance = self.balance.try_sub(fee)?;
        Ok(())
    }

    /// Whether the balance sits below the minimum and no penalty was charged
    /// yet in the month of `today`.
    pub fn penalty_due(&self, today: NaiveDate) -> Result<bool> {
        let (minimum, last_check) = match &self.kind {
            AccountKind::Checking {
                minimum_balance,
                last_penalty_check,
                ..
            }
            | AccountKind::Savings {
                minimum_balance,
                last_penalty_check,
                ..
            } => (minimum_balance, last_penalty_check),
            _ => return Ok(false),
        };
        let below = self.balance.try_cmp(minimum)? == Ordering::Less;
        Ok(below && !last_check.is_some_and(|date| same_month(date, today)))
    }

    /// Whether the monthly maintenance fee is due in the month of `today`.
    ///
    /// The first fee is due in the month after the account was opened.
    pub fn maintenance_due(&self, today: NaiveDate) -> bool {
        match &self.kind {
            AccountKind::Checking {
                last_maintenance_check,
                ..
            } => {
                let opened = self.creation_date.date_naive();
                month_index(today) > month_index(opened)
                    && !last_maintenance_check.is_some_and(|date| same_month(date, today))
            }
            _ => false,
        }
    }

    pub fn maintenance_fee(&self) -> Option<Money> {
        match &self.kind {
            AccountKind::Checking {
                monthly_maintenance_fee,
                ..
            } => Some(*monthly_maintenance_fee),
            _ => None,
        }
    }

    pub fn mark_penalty_checked(&mut self, today: NaiveDate) {
        match &mut self.kind {
            AccountKind::Checking {
                last_penalty_check, ..
            }
            | AccountKind::Savings {
                last_penalty_check, ..
            } => *last_penalty_check = Some(today),
            _ => {}
        }
    }

    pub fn mark_maintenance_checked(&mut self, today: NaiveDate) {
        if let AccountKind::Checking {
            last_maintenance_check,
            ..
        } = &mut self.kind
        {
            *last_maintenance_check = Some(today);
        }
    }
}

fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

fn same_month(left: NaiveDate, right: NaiveDate) -> bool {
    month_index(left) == month_index(right)
}
