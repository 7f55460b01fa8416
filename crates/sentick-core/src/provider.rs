//! Collaborator seams for price and sentiment inputs.
//!
//! Fetching bars and scoring posts happens outside this workspace; the
//! engine only needs already-scored series for a time range. Both traits are
//! synchronous and return validated [`TimeSeries`].

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{Symbol, TimeSeries, UtcDateTime, ValidationError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("no data for symbol '{0}'")]
    UnknownSymbol(Symbol),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Price history for one asset over `[start, end)`.
pub trait MarketDataProvider {
    fn price_series(
        &self,
        symbol: &Symbol,
        start: UtcDateTime,
        end: UtcDateTime,
    ) -> Result<TimeSeries, ProviderError>;
}

/// Event-level sentiment scores for one asset over `[start, end)`.
pub trait SentimentProvider {
    fn sentiment_events(
        &self,
        symbol: &Symbol,
        start: UtcDateTime,
        end: UtcDateTime,
    ) -> Result<TimeSeries, ProviderError>;
}

/// In-memory provider over pre-loaded series, keyed by base asset.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    prices: BTreeMap<Symbol, TimeSeries>,
    sentiment: BTreeMap<Symbol, TimeSeries>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, symbol: Symbol, series: TimeSeries) -> Self {
        self.prices.insert(symbol, series);
        self
    }

    pub fn with_sentiment(mut self, symbol: Symbol, series: TimeSeries) -> Self {
        self.sentiment.insert(symbol, series);
        self
    }

    fn lookup<'a>(
        map: &'a BTreeMap<Symbol, TimeSeries>,
        symbol: &Symbol,
    ) -> Result<&'a TimeSeries, ProviderError> {
        map.iter()
            .find(|(key, _)| key.same_asset(symbol))
            .map(|(_, series)| series)
            .ok_or_else(|| ProviderError::UnknownSymbol(symbol.clone()))
    }
}

impl MarketDataProvider for StaticProvider {
    fn price_series(
        &self,
        symbol: &Symbol,
        start: UtcDateTime,
        end: UtcDateTime,
    ) -> Result<TimeSeries, ProviderError> {
        Ok(Self::lookup(&self.prices, symbol)?.slice(start, end))
    }
}

impl SentimentProvider for StaticProvider {
    fn sentiment_events(
        &self,
        symbol: &Symbol,
        start: UtcDateTime,
        end: UtcDateTime,
    ) -> Result<TimeSeries, ProviderError> {
        Ok(Self::lookup(&self.sentiment, symbol)?.slice(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Sample, Span};

    fn ts(input: &str) -> UtcDateTime {
        UtcDateTime::parse(input).expect("timestamp")
    }

    fn symbol(input: &str) -> Symbol {
        Symbol::parse(input).expect("symbol")
    }

    #[test]
    fn serves_slices_by_base_asset() {
        let prices = TimeSeries::fixed(
            Span::hours(1),
            vec![
                Sample::new(ts("2024-01-01T00:00:00Z"), 100.0),
                Sample::new(ts("2024-01-01T01:00:00Z"), 101.0),
                Sample::new(ts("2024-01-01T02:00:00Z"), 102.0),
            ],
        )
        .expect("series");
        let provider = StaticProvider::new().with_price(symbol("BTC-USD"), prices);

        let slice = provider
            .price_series(
                &symbol("btc"),
                ts("2024-01-01T01:00:00Z"),
                ts("2024-01-01T03:00:00Z"),
            )
            .expect("prices");

        assert_eq!(slice.values().collect::<Vec<_>>(), vec![101.0, 102.0]);
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        let provider = StaticProvider::new();

        let err = provider
            .sentiment_events(
                &symbol("ETH"),
                ts("2024-01-01T00:00:00Z"),
                ts("2024-01-02T00:00:00Z"),
            )
            .expect_err("must fail");

        assert!(matches!(err, ProviderError::UnknownSymbol(_)));
    }
}
