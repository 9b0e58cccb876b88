use crate::error::{LedgerError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

/// Decimal places kept on every money amount.
pub const MONEY_SCALE: u32 = 2;
/// Decimal places kept on exchange rates.
pub const RATE_SCALE: u32 = 4;

/// A three-letter ISO 4217 currency code, stored upper-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    pub const EUR: Self = Self(*b"EUR");
    pub const USD: Self = Self(*b"USD");
    pub const GBP: Self = Self(*b"GBP");

    pub fn code(&self) -> &str {
        // Only ASCII letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl FromStr for Currency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_ascii_uppercase();
        match code.as_bytes() {
            [a, b, c] if code.bytes().all(|ch| ch.is_ascii_alphabetic()) => Ok(Self([*a, *b, *c])),
            _ => Err(LedgerError::InvalidCurrency(s.to_string())),
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An immutable amount of money in a single currency.
///
/// Every operation returns a new value. Arithmetic between two values is only
/// defined when both share a currency; anything else needs an explicit
/// [`Money::convert`] first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new value, rounding half-up to two decimal places.
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: round_half_up(amount, MONEY_SCALE),
            currency,
        }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn try_add(self, other: Money) -> Result<Money> {
        self.ensure_same_currency(&other)?;
        self.amount
            .checked_add(other.amount)
            .map(|sum| Money::new(sum, self.currency))
            .ok_or(LedgerError::AmountOverflow(self.currency))
    }

    pub fn try_sub(self, other: Money) -> Result<Money> {
        self.ensure_same_currency(&other)?;
        self.amount
            .checked_sub(other.amount)
            .map(|diff| Money::new(diff, self.currency))
            .ok_or(LedgerError::AmountOverflow(self.currency))
    }

    /// Compares two values of the same currency.
    pub fn try_cmp(&self, other: &Money) -> Result<Ordering> {
        self.ensure_same_currency(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    /// Expresses this amount in `target` using `rate` units of `target` per unit
    /// of the current currency. Fails when the product does not fit a `Decimal`.
    pub fn convert(self, target: Currency, rate: Decimal) -> Result<Money> {
        if target == self.currency {
            return Ok(self);
        }
        let rate = round_half_up(rate, RATE_SCALE);
        self.amount
            .checked_mul(rate)
            .map(|amount| Money::new(amount, target))
            .ok_or(LedgerError::AmountOverflow(target))
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<()> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(LedgerError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            })
        }
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money::new(-self.amount, self.currency)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency)
    }
}

fn round_half_up(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}
