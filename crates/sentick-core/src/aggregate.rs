//! Window aggregation of sentiment events.
//!
//! Buckets are half-open `[E - window, E)` and stamped with their end `E`,
//! an exact multiple of the window (or step) from the Unix epoch. A bucket's
//! value is therefore fully determined by data observed before `E`.

use serde::{Deserialize, Serialize};

use crate::{Sample, Sampling, Span, TimeSeries, UtcDateTime, ValidationError};

/// Reduction applied to the values in one bucket.
///
/// Missing (`NaN`) values are ignored by every statistic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    #[default]
    Mean,
    Count,
    Sum,
}

impl Statistic {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Count => "count",
            Self::Sum => "sum",
        }
    }

    /// Reduce `values`. The mean of nothing is the no-data sentinel.
    pub fn apply(self, values: &[f64]) -> f64 {
        let present = values.iter().copied().filter(|value| !value.is_nan());
        match self {
            Self::Count => present.count() as f64,
            Self::Sum => present.sum(),
            Self::Mean => {
                let (sum, count) = present.fold((0.0, 0usize), |(sum, count), value| {
                    (sum + value, count + 1)
                });
                if count == 0 {
                    f64::NAN
                } else {
                    sum / count as f64
                }
            }
        }
    }

    /// Value written for an empty bucket under [`EmptyBuckets::Sentinel`].
    /// An empty bucket has a count of zero; its mean and sum are unknown.
    pub const fn empty_bucket(self) -> f64 {
        match self {
            Self::Count => 0.0,
            Self::Mean | Self::Sum => f64::NAN,
        }
    }
}

/// What to emit for a bucket that received no samples.
///
/// "No posts" is not "neutral sentiment", so the default omits the bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyBuckets {
    #[default]
    Omit,
    /// Emit a sample for every empty bucket between the first and last
    /// occupied bucket: `NaN` (no data) for mean and sum, zero for count.
    Sentinel,
}

/// Bucket layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AggregationMode {
    /// Consecutive, non-overlapping buckets of width `window`.
    #[default]
    Tumbling,
    /// A `window`-wide look-back evaluated every `step`.
    Trailing { step: Span },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub statistic: Statistic,
    pub empty_buckets: EmptyBuckets,
    pub mode: AggregationMode,
}

/// Collapses a series into fixed-frequency buckets.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    config: AggregationConfig,
}

impl Aggregator {
    pub fn new(config: AggregationConfig) -> Result<Self, ValidationError> {
        if let AggregationMode::Trailing { step } = config.mode {
            step.require_positive("step")?;
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> AggregationConfig {
        self.config
    }

    /// Aggregate `series` into buckets of width `window`.
    ///
    /// Event input is bucketed by timestamp. Fixed-frequency input treats
    /// each sample as covering `[ts - period, ts)` and requires `window` to
    /// be a multiple of the period; re-aggregating at the input's own width
    /// returns the series unchanged.
    pub fn aggregate(&self, series: &TimeSeries, window: Span) -> Result<TimeSeries, ValidationError> {
        window.require_positive("window")?;

        let step = match self.config.mode {
            AggregationMode::Tumbling => window,
            AggregationMode::Trailing { step } => step,
        };

        let offset = match series.sampling() {
            Sampling::Event => Span::ZERO,
            Sampling::Fixed { period } => {
                for (name, span) in [("window", window), ("step", step)] {
                    if !span.is_multiple_of(period) {
                        log::debug!("cannot aggregate {name} {span} over period {period}");
                        return Err(ValidationError::IncompatibleWindow {
                            window: span.to_string(),
                            period: period.to_string(),
                        });
                    }
                }
                if window == period && step == period {
                    return Ok(series.clone());
                }
                period
            }
        };

        let starts: Vec<Sample> = series
            .samples()
            .iter()
            .map(|sample| {
                sample
                    .ts
                    .checked_sub(offset)
                    .map(|start| Sample::new(start, sample.value))
                    .ok_or_else(|| out_of_range(sample.ts))
            })
            .collect::<Result<_, _>>()?;

        let buckets = match self.config.mode {
            AggregationMode::Tumbling => self.tumbling(&starts, window)?,
            AggregationMode::Trailing { step } => self.trailing(&starts, window, step)?,
        };

        TimeSeries::fixed(step, buckets)
    }

    fn tumbling(&self, starts: &[Sample], window: Span) -> Result<Vec<Sample>, ValidationError> {
        let mut buckets: Vec<Sample> = Vec::new();
        let mut values: Vec<f64> = Vec::new();
        let mut current: Option<UtcDateTime> = None;

        for sample in starts {
            let end = bucket_end(sample.ts, window)?;
            if current != Some(end) {
                if let Some(closed) = current {
                    buckets.push(Sample::new(closed, self.config.statistic.apply(&values)));
                    values.clear();
                    self.fill_gap(&mut buckets, closed, end, window)?;
                }
                current = Some(end);
            }
            values.push(sample.value);
        }
        if let Some(closed) = current {
            buckets.push(Sample::new(closed, self.config.statistic.apply(&values)));
        }

        Ok(buckets)
    }

    fn trailing(
        &self,
        starts: &[Sample],
        window: Span,
        step: Span,
    ) -> Result<Vec<Sample>, ValidationError> {
        let (Some(first), Some(last)) = (starts.first(), starts.last()) else {
            return Ok(Vec::new());
        };

        let mut end = bucket_end(first.ts, step)?;
        let last_end = bucket_end(last.ts, step)?
            .checked_add(window)
            .and_then(|ts| ts.checked_sub(step))
            .ok_or_else(|| out_of_range(last.ts))?;

        let mut buckets = Vec::new();
        let mut values = Vec::new();
        while end <= last_end {
            let begin = end.checked_sub(window).ok_or_else(|| out_of_range(end))?;
            let lo = starts.partition_point(|sample| sample.ts < begin);
            let hi = starts.partition_point(|sample| sample.ts < end);

            if lo < hi {
                values.clear();
                values.extend(starts[lo..hi].iter().map(|sample| sample.value));
                buckets.push(Sample::new(end, self.config.statistic.apply(&values)));
            } else if self.config.empty_buckets == EmptyBuckets::Sentinel {
                buckets.push(Sample::new(end, self.config.statistic.empty_bucket()));
            }

            end = end.checked_add(step).ok_or_else(|| out_of_range(end))?;
        }

        Ok(buckets)
    }

    fn fill_gap(
        &self,
        buckets: &mut Vec<Sample>,
        closed: UtcDateTime,
        next: UtcDateTime,
        window: Span,
    ) -> Result<(), ValidationError> {
        if self.config.empty_buckets != EmptyBuckets::Sentinel {
            return Ok(());
        }
        let mut end = closed.checked_add(window).ok_or_else(|| out_of_range(closed))?;
        while end < next {
            buckets.push(Sample::new(end, self.config.statistic.empty_bucket()));
            end = end.checked_add(window).ok_or_else(|| out_of_range(end))?;
        }
        Ok(())
    }
}

/// Aggregate with tumbling buckets and the default empty-bucket policy.
pub fn aggregate(
    series: &TimeSeries,
    window: Span,
    statistic: Statistic,
) -> Result<TimeSeries, ValidationError> {
    Aggregator::new(AggregationConfig {
        statistic,
        ..AggregationConfig::default()
    })?
    .aggregate(series, window)
}

fn bucket_end(ts: UtcDateTime, width: Span) -> Result<UtcDateTime, ValidationError> {
    ts.floor_to(width)
        .and_then(|start| start.checked_add(width))
        .ok_or_else(|| out_of_range(ts))
}

fn out_of_range(ts: UtcDateTime) -> ValidationError {
    ValidationError::TimestampOutOfRange {
        value: ts.into_inner().unix_timestamp(),
    }
}
