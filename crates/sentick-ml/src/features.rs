//! Feature matrices built from aligned rows.

use std::ops::Range;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use sentick_core::{AlignedTable, Span, TimeSeries, UtcDateTime, ValidationError, WindowSpec};

pub const SENTIMENT: &str = "sentiment";
pub const PAST_RETURN: &str = "past_return";
pub const VOLATILITY: &str = "volatility";

/// Row-aligned features and labels in chronological order.
///
/// Every row keeps the `as_of` and `realized_at` of the aligned row it came
/// from, so fold planning can purge overlapping labels.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    spec: WindowSpec,
    names: Vec<&'static str>,
    features: Array2<f64>,
    labels: Array1<f64>,
    as_of: Vec<UtcDateTime>,
    realized_at: Vec<UtcDateTime>,
    dropped: usize,
}

impl FeatureMatrix {
    /// The sentiment feature alone.
    pub fn from_table(table: &AlignedTable) -> Self {
        let n = table.len();
        Self {
            spec: table.spec,
            names: vec![SENTIMENT],
            features: Array2::from_shape_fn((n, 1), |(row, _)| table.rows[row].feature),
            labels: table.labels().into_iter().collect(),
            as_of: table.rows.iter().map(|row| row.as_of).collect(),
            realized_at: table.rows.iter().map(|row| row.realized_at).collect(),
            dropped: 0,
        }
    }

    /// Sentiment plus price context known at `as_of`.
    ///
    /// `past_return` is the price change over `lookback` ending at `as_of`;
    /// `volatility` is the sample standard deviation of bar-to-bar returns
    /// for bars in `(as_of - lookback, as_of]`. Rows without enough history
    /// are dropped and counted.
    pub fn with_price_context(
        table: &AlignedTable,
        price: &TimeSeries,
        lookback: Span,
    ) -> Result<Self, ValidationError> {
        lookback.require_positive("lookback")?;

        let mut values: Vec<[f64; 3]> = Vec::with_capacity(table.len());
        let mut labels = Vec::with_capacity(table.len());
        let mut as_of = Vec::with_capacity(table.len());
        let mut realized_at = Vec::with_capacity(table.len());
        let mut dropped = 0;

        for row in &table.rows {
            match price_context(price, row.as_of, lookback) {
                Some((past_return, volatility)) => {
                    values.push([row.feature, past_return, volatility]);
                    labels.push(row.label.as_f64());
                    as_of.push(row.as_of);
                    realized_at.push(row.realized_at);
                }
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            log::debug!("{}: {dropped} rows lack {lookback} of price history", table.spec);
        }

        Ok(Self {
            spec: table.spec,
            names: vec![SENTIMENT, PAST_RETURN, VOLATILITY],
            features: Array2::from_shape_fn((values.len(), 3), |(row, col)| values[row][col]),
            labels: Array1::from(labels),
            as_of,
            realized_at,
            dropped,
        })
    }

    pub fn spec(&self) -> WindowSpec {
        self.spec
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Rows dropped for lack of price history.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    pub fn labels(&self) -> ArrayView1<'_, f64> {
        self.labels.view()
    }

    pub fn as_of(&self) -> &[UtcDateTime] {
        &self.as_of
    }

    pub fn realized_at(&self) -> &[UtcDateTime] {
        &self.realized_at
    }

    /// Features and labels of the given rows.
    pub fn select(&self, rows: &[usize]) -> (Array2<f64>, Array1<f64>) {
        (
            self.features.select(Axis(0), rows),
            self.labels.select(Axis(0), rows),
        )
    }

    pub fn select_range(&self, rows: Range<usize>) -> (Array2<f64>, Array1<f64>) {
        (
            self.features.slice(ndarray::s![rows.clone(), ..]).to_owned(),
            self.labels.slice(ndarray::s![rows]).to_owned(),
        )
    }
}

fn price_context(price: &TimeSeries, as_of: UtcDateTime, lookback: Span) -> Option<(f64, f64)> {
    let start = as_of.checked_sub(lookback)?;
    let p_now = price.latest_at_or_before(as_of)?;
    let p_then = price.latest_at_or_before(start)?;
    if !(p_then.value > 0.0) {
        return None;
    }
    let past_return = (p_now.value - p_then.value) / p_then.value;

    let samples = price.samples();
    let lo = samples.partition_point(|sample| sample.ts <= start).max(1);
    let hi = samples.partition_point(|sample| sample.ts <= as_of);
    if hi <= lo {
        return None;
    }
    let returns: Vec<f64> = (lo..hi)
        .map(|i| (samples[i].value - samples[i - 1].value) / samples[i - 1].value)
        .collect();
    if returns.len() < 2 {
        return None;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
        / (returns.len() - 1) as f64;
    let volatility = variance.sqrt();

    (past_return.is_finite() && volatility.is_finite()).then_some((past_return, volatility))
}
