use serde::{Deserialize, Serialize};

use crate::{Sample, SampleStore, Sampling, Span, Symbol, TimeSeries, UtcDateTime, ValidationError};

/// OHLCV bar record as delivered by the market-data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub ts: UtcDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl Bar {
    pub fn new(
        ts: UtcDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<f64>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;
        if let Some(volume) = volume {
            validate_non_negative("volume", volume)?;
        }

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidBarBounds);
        }

        Ok(Self {
            ts,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Close prices of `bars` as a fixed-frequency series.
///
/// Bars must be sorted, unique, aligned to `period`, and strictly positive.
pub fn close_series(bars: &[Bar], period: Span) -> Result<TimeSeries, ValidationError> {
    let samples = bars
        .iter()
        .map(|bar| {
            if bar.close > 0.0 {
                Ok(Sample::new(bar.ts, bar.close))
            } else {
                Err(ValidationError::NonPositivePrice { ts: bar.ts })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    TimeSeries::fixed(period, samples)
}

/// A post or comment with its compound sentiment score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPost {
    pub id: String,
    pub ts: UtcDateTime,
    /// Compound score in `[-1, 1]`.
    pub score: f64,
    /// Assets the post talks about.
    pub mentions: Vec<Symbol>,
}

impl ScoredPost {
    pub fn new(
        id: impl Into<String>,
        ts: UtcDateTime,
        score: f64,
        mentions: Vec<Symbol>,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        if !score.is_finite() || !(-1.0..=1.0).contains(&score) {
            return Err(ValidationError::ScoreOutOfRange {
                id,
                score: score.to_string(),
            });
        }
        Ok(Self {
            id,
            ts,
            score,
            mentions,
        })
    }

    pub fn mentions_asset(&self, symbol: &Symbol) -> bool {
        self.mentions.iter().any(|mention| mention.same_asset(symbol))
    }
}

/// Event-level sentiment for one asset.
///
/// A post mentioning several assets contributes to each of them. Posts may
/// arrive in any order; exact timestamp collisions are still an error.
pub fn sentiment_series(posts: &[ScoredPost], symbol: &Symbol) -> Result<TimeSeries, ValidationError> {
    let store: SampleStore = posts
        .iter()
        .filter(|post| post.mentions_asset(symbol))
        .map(|post| Sample::new(post.ts, post.score))
        .collect();
    store.into_series(Sampling::Event)
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
