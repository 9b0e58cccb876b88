use crate::config::RateEntry;
use crate::domain::money::{Currency, RATE_SCALE};
use crate::domain::ports::RateProvider;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;

/// Serves a static table of exchange rates.
///
/// A missing pair falls back to the inverse of the opposite direction when that
/// one is known.
#[derive(Debug, Clone, Default)]
pub struct FixedRateProvider {
    rates: HashMap<(Currency, Currency), Decimal>,
}

impl FixedRateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a RateEntry>) -> Self {
        entries
            .into_iter()
            .fold(Self::new(), |provider, entry| {
                provider.with_rate(entry.from, entry.to, entry.rate)
            })
    }

    pub fn with_rate(mut self, from: Currency, to: Currency, rate: Decimal) -> Self {
        self.rates.insert((from, to), rate);
        self
    }

    fn lookup(&self, from: Currency, to: Currency) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }
        if let Some(rate) = self.rates.get(&(from, to)) {
            return Some(*rate);
        }
        self.rates
            .get(&(to, from))
            .filter(|rate| !rate.is_zero())
            .and_then(|rate| Decimal::ONE.checked_div(*rate))
            .map(|rate| rate.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero))
    }
}

#[async_trait]
impl RateProvider for FixedRateProvider {
    async fn rate(&self, from: Currency, to: Currency) -> Result<Decimal> {
        self.lookup(from, to)
            .ok_or(LedgerError::RateUnavailable { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_direct_and_identity_rates() {
        let provider = FixedRateProvider::new().with_rate(Currency::EUR, Currency::USD, dec!(1.1));
        assert_eq!(provider.rate(Currency::EUR, Currency::USD).await.unwrap(), dec!(1.1));
        assert_eq!(provider.rate(Currency::GBP, Currency::GBP).await.unwrap(), Decimal::ONE);
    }

    #[tokio::test]
    async fn test_inverse_rate() {
        let provider = FixedRateProvider::new().with_rate(Currency::EUR, Currency::USD, dec!(1.25));
        assert_eq!(provider.rate(Currency::USD, Currency::EUR).await.unwrap(), dec!(0.8));
    }

    #[tokio::test]
    async fn test_missing_rate() {
        let provider = FixedRateProvider::new();
        assert!(matches!(
            provider.rate(Currency::EUR, Currency::GBP).await,
            Err(LedgerError::RateUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_from_config_entries() {
        let entries = vec![RateEntry {
            from: Currency::GBP,
            to: Currency::EUR,
            rate: dec!(1.17),
        }];
        let provider = FixedRateProvider::from_entries(&entries);
        assert_eq!(provider.rate(Currency::GBP, Currency::EUR).await.unwrap(), dec!(1.17));
    }
}
