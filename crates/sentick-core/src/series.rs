//! Immutable, validated time series.
//!
//! A [`TimeSeries`] is an ordered run of [`Sample`]s tagged with its
//! [`Sampling`] discipline. Construction enforces strictly increasing
//! timestamps and, for fixed-frequency series, alignment to the period grid.
//! Every transformation returns a new series; nothing mutates in place.
//!
//! `NaN` is the explicit no-data sentinel. Infinite values are rejected.

use serde::{Deserialize, Serialize};

use crate::{Span, Statistic, UtcDateTime, ValidationError};

/// A single `(timestamp, value)` observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub ts: UtcDateTime,
    pub value: f64,
}

impl Sample {
    pub const fn new(ts: UtcDateTime, value: f64) -> Self {
        Self { ts, value }
    }

    /// True for the no-data sentinel.
    pub fn is_missing(&self) -> bool {
        self.value.is_nan()
    }
}

/// Sampling discipline of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sampling {
    /// Point-in-time events (posts, comments).
    Event,
    /// Fixed-frequency bars stamped on multiples of `period` from the epoch.
    Fixed { period: Span },
}

impl Sampling {
    pub const fn period(self) -> Option<Span> {
        match self {
            Self::Event => None,
            Self::Fixed { period } => Some(period),
        }
    }
}

/// Counters from [`TimeSeries::resample_forward_fill`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillReport {
    /// Grid points emitted.
    pub grid_points: usize,
    /// Grid points that had no fresh sample and reused the last value.
    pub filled: usize,
    /// Longest run of consecutive filled grid points.
    pub longest_gap: usize,
}

#[derive(Deserialize)]
struct RawSeries {
    sampling: Sampling,
    samples: Vec<Sample>,
}

impl TryFrom<RawSeries> for TimeSeries {
    type Error = ValidationError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        Self::new(raw.sampling, raw.samples)
    }
}

/// Ordered, immutable sequence of samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct TimeSeries {
    sampling: Sampling,
    samples: Vec<Sample>,
}

impl TimeSeries {
    /// Validate and wrap `samples`.
    ///
    /// Fails with [`ValidationError::UnsortedInput`] when a timestamp goes
    /// backwards and [`ValidationError::DuplicateTimestamp`] on exact
    /// collisions; callers must aggregate colliding samples explicitly.
    pub fn new(sampling: Sampling, samples: Vec<Sample>) -> Result<Self, ValidationError> {
        if let Sampling::Fixed { period } = sampling {
            period.require_positive("period")?;
        }

        for (index, sample) in samples.iter().enumerate() {
            if sample.value.is_infinite() {
                return Err(ValidationError::NonFiniteValue { field: "value" });
            }

            if let Sampling::Fixed { period } = sampling {
                if !sample.ts.is_aligned_to(period) {
                    return Err(ValidationError::MisalignedSample {
                        ts: sample.ts,
                        period: period.to_string(),
                    });
                }
            }

            if index == 0 {
                continue;
            }
            let previous = samples[index - 1].ts;
            if sample.ts < previous {
                return Err(ValidationError::UnsortedInput {
                    index,
                    previous,
                    current: sample.ts,
                });
            }
            if sample.ts == previous {
                return Err(ValidationError::DuplicateTimestamp { ts: sample.ts });
            }
        }

        Ok(Self { sampling, samples })
    }

    pub fn events(samples: Vec<Sample>) -> Result<Self, ValidationError> {
        Self::new(Sampling::Event, samples)
    }

    pub fn fixed(period: Span, samples: Vec<Sample>) -> Result<Self, ValidationError> {
        Self::new(Sampling::Fixed { period }, samples)
    }

    pub fn sampling(&self) -> Sampling {
        self.sampling
    }

    pub fn period(&self) -> Option<Span> {
        self.sampling.period()
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.sampling, Sampling::Fixed { .. })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = UtcDateTime> + '_ {
        self.samples.iter().map(|sample| sample.ts)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|sample| sample.value)
    }

    /// The sample with the latest timestamp `<= ts`.
    pub fn latest_at_or_before(&self, ts: UtcDateTime) -> Option<&Sample> {
        let index = self.samples.partition_point(|sample| sample.ts <= ts);
        index.checked_sub(1).map(|index| &self.samples[index])
    }

    /// Samples in the half-open interval `[start, end)`.
    ///
    /// Never fails; an empty or inverted range yields an empty series with
    /// the same sampling.
    pub fn slice(&self, start: UtcDateTime, end: UtcDateTime) -> Self {
        if start >= end {
            return Self {
                sampling: self.sampling,
                samples: Vec::new(),
            };
        }
        let lo = self.samples.partition_point(|sample| sample.ts < start);
        let hi = self.samples.partition_point(|sample| sample.ts < end);
        Self {
            sampling: self.sampling,
            samples: self.samples[lo..hi].to_vec(),
        }
    }

    /// Re-grid onto `period`, forward-filling gaps (exchange downtime).
    ///
    /// Grid point `g` takes the latest sample with `ts <= g`, so no value is
    /// ever moved earlier than its observation time. The grid runs from the
    /// first sample (rounded up) to the last sample (rounded down). Gaps are
    /// counted in the returned [`FillReport`].
    pub fn resample_forward_fill(
        &self,
        period: Span,
    ) -> Result<(Self, FillReport), ValidationError> {
        period.require_positive("period")?;

        let mut report = FillReport::default();
        let (Some(first), Some(last)) = (self.first(), self.last()) else {
            return Ok((Self::fixed(period, Vec::new())?, report));
        };

        let out_of_range = |ts: UtcDateTime| ValidationError::TimestampOutOfRange {
            value: ts.into_inner().unix_timestamp(),
        };
        let mut grid = first.ts.ceil_to(period).ok_or_else(|| out_of_range(first.ts))?;
        let end = last.ts.floor_to(period).ok_or_else(|| out_of_range(last.ts))?;

        let mut output = Vec::new();
        let mut cursor = 0;
        let mut last_known: Option<f64> = None;
        let mut gap = 0;

        while grid <= end {
            let mut fresh = false;
            while cursor < self.samples.len() && self.samples[cursor].ts <= grid {
                let value = self.samples[cursor].value;
                if !value.is_nan() {
                    last_known = Some(value);
                    fresh = true;
                }
                cursor += 1;
            }

            if let Some(value) = last_known {
                if fresh {
                    gap = 0;
                } else {
                    report.filled += 1;
                    gap += 1;
                    report.longest_gap = report.longest_gap.max(gap);
                }
                output.push(Sample::new(grid, value));
            }

            match grid.checked_add(period) {
                Some(next) => grid = next,
                None => break,
            }
        }

        report.grid_points = output.len();
        if report.filled > 0 {
            log::warn!(
                "forward-filled {} of {} grid points at period {} (longest gap {})",
                report.filled,
                report.grid_points,
                period,
                report.longest_gap
            );
        }

        Ok((Self::fixed(period, output)?, report))
    }
}

/// Unordered sample buffer that sorts on the way out.
///
/// Collaborators hand records over in whatever order storage returned them;
/// the store sorts by timestamp and then applies the normal series
/// validation.
#[derive(Debug, Clone, Default)]
pub struct SampleStore {
    samples: Vec<Sample>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ts: UtcDateTime, value: f64) {
        self.samples.push(Sample::new(ts, value));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sort and validate. Exact timestamp collisions are an error.
    pub fn into_series(mut self, sampling: Sampling) -> Result<TimeSeries, ValidationError> {
        self.samples.sort_by_key(|sample| sample.ts);
        TimeSeries::new(sampling, self.samples)
    }

    /// Sort, then collapse exact timestamp collisions with `statistic`.
    pub fn into_series_merged(
        mut self,
        sampling: Sampling,
        statistic: Statistic,
    ) -> Result<TimeSeries, ValidationError> {
        self.samples.sort_by_key(|sample| sample.ts);

        let mut merged: Vec<Sample> = Vec::with_capacity(self.samples.len());
        let mut group: Vec<f64> = Vec::new();
        for (index, sample) in self.samples.iter().enumerate() {
            group.push(sample.value);
            let closes_group = self
                .samples
                .get(index + 1)
                .map_or(true, |next| next.ts != sample.ts);
            if closes_group {
                merged.push(Sample::new(sample.ts, statistic.apply(&group)));
                group.clear();
            }
        }

        TimeSeries::new(sampling, merged)
    }
}

impl Extend<Sample> for SampleStore {
    fn extend<I: IntoIterator<Item = Sample>>(&mut self, iter: I) {
        self.samples.extend(iter);
    }
}

impl FromIterator<Sample> for SampleStore {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}
