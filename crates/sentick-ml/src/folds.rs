//! Expanding-window chronological splits.
//!
//! Folds follow the forward-chaining layout: `fold_count` equal test slices
//! at the end of the data, each trained on everything before it. With
//! purging on, training rows whose label is realized after the test slice
//! starts are removed, since that price was not yet observable.

use std::ops::Range;

use sentick_core::ValidationError;

use crate::{FeatureMatrix, ValidatorConfig};

/// Row indices for one fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSplit {
    pub index: usize,
    /// Training rows, ascending. A prefix of the data minus purged rows.
    pub train: Vec<usize>,
    pub test: Range<usize>,
    /// Training rows removed for label overlap.
    pub purged: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldPlan {
    splits: Vec<FoldSplit>,
}

impl FoldPlan {
    pub fn new(matrix: &FeatureMatrix, config: &ValidatorConfig) -> Result<Self, ValidationError> {
        let n = matrix.len();
        let k = config.fold_count;
        if k == 0 {
            return Err(ValidationError::InvalidFoldCount);
        }
        if n < config.min_rows {
            return Err(ValidationError::InsufficientRows {
                required: config.min_rows,
                actual: n,
            });
        }

        let test_size = match config.min_train_rows {
            None => n / k.saturating_add(1),
            Some(min_train) => n.saturating_sub(min_train) / k,
        };
        if test_size == 0 {
            return Err(ValidationError::InsufficientRows {
                required: config.required_rows(),
                actual: n,
            });
        }

        let first_test = n - k * test_size;
        let as_of = matrix.as_of();
        let realized_at = matrix.realized_at();

        let splits = (0..k)
            .map(|index| {
                let start = first_test + index * test_size;
                let cutoff = as_of[start];
                let train: Vec<usize> = (0..start)
                    .filter(|&row| !config.purge || realized_at[row] <= cutoff)
                    .collect();
                FoldSplit {
                    index,
                    purged: start - train.len(),
                    train,
                    test: start..start + test_size,
                }
            })
            .collect();

        Ok(Self { splits })
    }

    pub fn splits(&self) -> &[FoldSplit] {
        &self.splits
    }

    pub fn len(&self) -> usize {
        self.splits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use sentick_core::{
        AlignedRow, AlignedTable, AlignmentReport, Label, Span, Target, UtcDateTime, WindowSpec,
    };

    pub(crate) fn hourly_matrix(n: usize, horizon_h: u64) -> FeatureMatrix {
        let at = |h: i64| UtcDateTime::from_unix_seconds(1_704_067_200 + h * 3600).expect("ts");
        let rows = (0..n as i64)
            .map(|h| AlignedRow {
                as_of: at(h),
                feature: (h % 7) as f64 - 3.0,
                label: Label::Return(if h % 7 >= 3 { 0.01 } else { -0.01 }),
                anchor_at: at(h),
                realized_at: at(h + horizon_h as i64),
            })
            .collect();
        let table = AlignedTable {
            spec: WindowSpec::new(Span::hours(1), Span::hours(horizon_h), Span::ZERO)
                .expect("spec"),
            target: Target::Return,
            rows,
            report: AlignmentReport::default(),
        };
        FeatureMatrix::from_table(&table)
    }

    fn config(fold_count: usize, purge: bool) -> ValidatorConfig {
        ValidatorConfig {
            fold_count,
            min_rows: 0,
            purge,
            ..ValidatorConfig::default()
        }
    }

    #[test]
    fn forward_chaining_layout() {
        let matrix = hourly_matrix(62, 1);

        let plan = FoldPlan::new(&matrix, &config(5, false)).expect("plan");

        // 62 rows, 5 folds: test slices of 10 after 12 training rows.
        assert_eq!(plan.len(), 5);
        assert_eq!(plan.splits()[0].test, 12..22);
        assert_eq!(plan.splits()[0].train, (0..12).collect::<Vec<_>>());
        assert_eq!(plan.splits()[4].test, 52..62);
    }

    #[test]
    fn folds_are_chronological_and_expanding() {
        let matrix = hourly_matrix(200, 6);
        let plan = FoldPlan::new(&matrix, &config(5, true)).expect("plan");

        for pair in plan.splits().windows(2) {
            assert!(pair[0].test.end <= pair[1].test.start);
            assert!(pair[0].train.iter().all(|row| pair[1].train.contains(row)));
        }
        for split in plan.splits() {
            assert!(split.train.iter().all(|&row| row < split.test.start));
        }
    }

    #[test]
    fn purges_rows_realized_after_test_start() {
        let matrix = hourly_matrix(60, 3);

        let plan = FoldPlan::new(&matrix, &config(5, true)).expect("plan");
        let split = &plan.splits()[0];

        assert_eq!(split.test.start, 10);
        assert_eq!(split.purged, 2);
        assert_eq!(split.train.last(), Some(&7));
    }

    #[test]
    fn honours_minimum_training_rows() {
        let matrix = hourly_matrix(100, 1);
        let config = ValidatorConfig {
            min_train_rows: Some(50),
            ..config(5, false)
        };

        let plan = FoldPlan::new(&matrix, &config).expect("plan");

        assert_eq!(plan.splits()[0].test, 50..60);
    }

    #[test]
    fn rejects_bad_fold_counts_and_short_inputs() {
        let matrix = hourly_matrix(4, 1);

        let err = FoldPlan::new(&matrix, &config(0, false)).expect_err("zero folds");
        assert!(matches!(err, ValidationError::InvalidFoldCount));

        let err = FoldPlan::new(&matrix, &config(5, false)).expect_err("too short");
        assert!(matches!(err, ValidationError::InsufficientRows { required: 6, actual: 4 }));

        let err = FoldPlan::new(&matrix, &ValidatorConfig::default()).expect_err("min rows");
        assert!(matches!(err, ValidationError::InsufficientRows { required: 200, actual: 4 }));
    }

    #[test]
    fn huge_minimum_training_slice_is_an_error_not_an_overflow() {
        let matrix = hourly_matrix(200, 1);
        let config = ValidatorConfig {
            min_train_rows: Some(usize::MAX),
            ..config(5, false)
        };

        let err = FoldPlan::new(&matrix, &config).expect_err("cannot fit");

        assert_eq!(
            err,
            ValidationError::InsufficientRows {
                required: usize::MAX,
                actual: 200
            }
        );
    }
}
