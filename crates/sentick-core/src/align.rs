//! Leakage-safe alignment of aggregated sentiment with prices.
//!
//! For a bucket ending at `E` the row's `as_of` is `E + lag`, optionally
//! rounded *up* to the price grid. The feature is the bucket value, known at
//! `E <= as_of`. The label compares the anchor price `p0` (latest sample at
//! or before `as_of`) with the horizon price `p1` (latest sample at or before
//! `as_of + horizon`), and `p1` must lie strictly after `as_of`.
//!
//! Rows that cannot be labelled are dropped one by one and counted in the
//! [`AlignmentReport`]; a bad row never fails the whole alignment.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::table::{number_cell, Table, Tabular};
use crate::{AlignmentError, Span, TimeSeries, UtcDateTime, ValidationError};

/// One `(window, horizon, lag)` configuration.
///
/// Ordering is by window, then horizon, then lag; sweep output is sorted by
/// this identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowSpec {
    pub window: Span,
    pub horizon: Span,
    pub lag: Span,
}

impl WindowSpec {
    pub fn new(window: Span, horizon: Span, lag: Span) -> Result<Self, ValidationError> {
        let spec = Self {
            window,
            horizon,
            lag,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.window.require_positive("window")?;
        self.horizon.require_positive("horizon")?;
        Ok(())
    }
}

impl Display for WindowSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "window={} horizon={} lag={}",
            self.window, self.horizon, self.lag
        )
    }
}

/// Label flavour produced by the aligner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Fractional price change `(p1 - p0) / p0`.
    #[default]
    Return,
    /// Sign of the price change; an unchanged price is [`Direction::Down`].
    Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Label {
    Return(f64),
    Direction(Direction),
}

impl Label {
    /// Numeric view: the return itself, or `1.0`/`0.0` for up/down.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Return(value) => *value,
            Self::Direction(Direction::Up) => 1.0,
            Self::Direction(Direction::Down) => 0.0,
        }
    }

    /// Up-move test; a zero return counts as down.
    pub fn is_up(&self) -> bool {
        match self {
            Self::Return(value) => *value > 0.0,
            Self::Direction(direction) => *direction == Direction::Up,
        }
    }
}

/// One feature/label observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedRow {
    pub as_of: UtcDateTime,
    pub feature: f64,
    pub label: Label,
    /// Timestamp of the anchor price `p0`.
    pub anchor_at: UtcDateTime,
    /// Timestamp of the horizon price `p1`.
    pub realized_at: UtcDateTime,
}

impl Tabular for AlignedRow {
    fn columns() -> Vec<&'static str> {
        vec!["as_of", "feature", "label", "anchor_at", "realized_at"]
    }

    fn row(&self) -> Vec<Value> {
        vec![
            Value::String(self.as_of.to_string()),
            number_cell(self.feature),
            number_cell(self.label.as_f64()),
            Value::String(self.anchor_at.to_string()),
            Value::String(self.realized_at.to_string()),
        ]
    }
}

/// Per-configuration row accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentReport {
    /// Sentiment buckets considered.
    pub candidates: usize,
    pub emitted: usize,
    /// Bucket held the no-data sentinel.
    pub dropped_missing_feature: usize,
    /// No price at or before `as_of`.
    pub dropped_missing_anchor: usize,
    /// `as_of + horizon` lies beyond the last price sample.
    pub dropped_boundary: usize,
    /// A price gap left `p1` short of the full horizon.
    pub dropped_short_horizon: usize,
    /// Anchor or horizon price was non-positive or missing.
    pub dropped_invalid_price: usize,
}

impl AlignmentReport {
    pub fn dropped(&self) -> usize {
        self.dropped_missing_feature
            + self.dropped_missing_anchor
            + self.dropped_boundary
            + self.dropped_short_horizon
            + self.dropped_invalid_price
    }

    pub fn drop_ratio(&self) -> f64 {
        if self.candidates == 0 {
            0.0
        } else {
            self.dropped() as f64 / self.candidates as f64
        }
    }
}

/// Aligned rows with the configuration that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedTable {
    pub spec: WindowSpec,
    pub target: Target,
    pub rows: Vec<AlignedRow>,
    pub report: AlignmentReport,
}

impl AlignedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn features(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.feature).collect()
    }

    pub fn labels(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.label.as_f64()).collect()
    }

    /// Rows with their provenance columns prepended.
    pub fn to_table(&self) -> Table {
        let mut columns = vec!["window", "horizon", "lag"];
        columns.extend(AlignedRow::columns());
        let provenance = [
            Value::String(self.spec.window.to_string()),
            Value::String(self.spec.horizon.to_string()),
            Value::String(self.spec.lag.to_string()),
        ];
        let rows = self
            .rows
            .iter()
            .map(|row| provenance.iter().cloned().chain(row.row()).collect())
            .collect();
        Table::new(columns, rows)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    pub target: Target,
    /// Slack allowed when the horizon price does not land exactly on
    /// `as_of + horizon`.
    pub tolerance: Span,
    /// Round `as_of` up to the price grid when prices are fixed-frequency.
    pub snap_to_price_grid: bool,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            target: Target::Return,
            tolerance: Span::ZERO,
            snap_to_price_grid: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Aligner {
    config: AlignConfig,
}

impl Aligner {
    pub fn new(config: AlignConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> AlignConfig {
        self.config
    }

    /// Join an aggregated sentiment series with prices under `spec`.
    ///
    /// Fails only when the configuration itself is unusable: an invalid
    /// spec, event-level sentiment input, or two buckets collapsing onto the
    /// same `as_of`.
    pub fn align(
        &self,
        sentiment: &TimeSeries,
        price: &TimeSeries,
        spec: WindowSpec,
    ) -> Result<AlignedTable, AlignmentError> {
        spec.validate().map_err(AlignmentError::Spec)?;
        if !sentiment.is_fixed() {
            return Err(AlignmentError::SeriesKind);
        }

        let grid = price
            .period()
            .filter(|_| self.config.snap_to_price_grid);
        let mut report = AlignmentReport::default();

        let mut anchored: Vec<(UtcDateTime, UtcDateTime, f64)> =
            Vec::with_capacity(sentiment.len());
        for bucket in sentiment.samples() {
            let as_of = bucket
                .ts
                .checked_add(spec.lag)
                .and_then(|ts| match grid {
                    Some(period) => ts.ceil_to(period),
                    None => Some(ts),
                });
            let Some(as_of) = as_of else {
                report.candidates += 1;
                report.dropped_boundary += 1;
                continue;
            };

            if let Some((previous, first_bucket, _)) = anchored.last() {
                if *previous == as_of {
                    log::warn!("{spec}: buckets {first_bucket} and {} share as_of {as_of}", bucket.ts);
                    return Err(AlignmentError::Ambiguous {
                        as_of,
                        first_bucket: *first_bucket,
                        second_bucket: bucket.ts,
                    });
                }
            }
            anchored.push((as_of, bucket.ts, bucket.value));
        }

        let horizon = spec.horizon.as_nanos();
        let tolerance = self.config.tolerance.as_nanos();
        let last_price = price.last().map(|sample| sample.ts);

        let mut rows = Vec::with_capacity(anchored.len());
        for (as_of, _, feature) in anchored {
            report.candidates += 1;

            if feature.is_nan() {
                report.dropped_missing_feature += 1;
                continue;
            }

            let Some(p0) = price.latest_at_or_before(as_of) else {
                report.dropped_missing_anchor += 1;
                continue;
            };

            let horizon_end = match (as_of.checked_add(spec.horizon), last_price) {
                (Some(end), Some(last)) if end <= last => end,
                _ => {
                    report.dropped_boundary += 1;
                    continue;
                }
            };

            let Some(p1) = price.latest_at_or_before(horizon_end) else {
                report.dropped_boundary += 1;
                continue;
            };

            let covered = p1.ts.unix_nanos() - p0.ts.unix_nanos();
            let shortfall = horizon_end.unix_nanos() - p1.ts.unix_nanos();
            if p1.ts <= as_of || covered < horizon - tolerance || shortfall > tolerance {
                report.dropped_short_horizon += 1;
                continue;
            }

            if !(p0.value > 0.0) || !p1.value.is_finite() {
                report.dropped_invalid_price += 1;
                continue;
            }

            let label = match self.config.target {
                Target::Return => Label::Return((p1.value - p0.value) / p0.value),
                Target::Direction if p1.value > p0.value => Label::Direction(Direction::Up),
                Target::Direction => Label::Direction(Direction::Down),
            };

            rows.push(AlignedRow {
                as_of,
                feature,
                label,
                anchor_at: p0.ts,
                realized_at: p1.ts,
            });
        }

        report.emitted = rows.len();
        log::debug!(
            "{spec}: {} rows from {} candidates (feature={}, anchor={}, boundary={}, gap={}, price={})",
            report.emitted,
            report.candidates,
            report.dropped_missing_feature,
            report.dropped_missing_anchor,
            report.dropped_boundary,
            report.dropped_short_horizon,
            report.dropped_invalid_price
        );
        if report.drop_ratio() > 0.5 {
            log::warn!(
                "{spec}: dropped {} of {} candidate rows",
                report.dropped(),
                report.candidates
            );
        }

        Ok(AlignedTable {
            spec,
            target: self.config.target,
            rows,
            report,
        })
    }
}

/// Align with the default configuration (return target, exact horizon).
pub fn align(
    sentiment: &TimeSeries,
    price: &TimeSeries,
    spec: WindowSpec,
) -> Result<AlignedTable, AlignmentError> {
    Aligner::default().align(sentiment, price, spec)
}
