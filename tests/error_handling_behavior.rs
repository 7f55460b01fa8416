//! Failure model: malformed input aborts, bad configurations do not.

use sentick_core::{
    align, Sample, SampleStore, Sampling, ScoredPost, Span, Statistic, TimeSeries, ValidationError,
    WindowSpec,
};
use sentick_ml::{FeatureMatrix, ValidateError, Validator, ValidatorConfig};
use sentick_sweep::{Rejection, SweepConfig, SweepEngine, SweepError, SweepGrid};
use sentick_tests::{at, at_minutes, events, hourly_prices};

// =============================================================================
// Malformed input
// =============================================================================

#[test]
fn unsorted_input_is_rejected_at_construction() {
    let err = TimeSeries::events(vec![
        Sample::new(at(2), 0.1),
        Sample::new(at(1), 0.2),
    ])
    .expect_err("unsorted");

    assert!(matches!(err, ValidationError::UnsortedInput { index: 1, .. }));
}

#[test]
fn duplicate_timestamps_fail_unless_merged_explicitly() {
    // Given: two posts at the same instant
    let mut store = SampleStore::new();
    store.push(at(1), 0.4);
    store.push(at(0), -0.1);
    store.push(at(1), 0.2);

    // When/Then: plain construction refuses to average silently
    let err = store.clone().into_series(Sampling::Event).expect_err("duplicate");
    assert!(matches!(err, ValidationError::DuplicateTimestamp { .. }));

    // And: an explicit merge is allowed
    let merged = store
        .into_series_merged(Sampling::Event, Statistic::Mean)
        .expect("merged");
    assert_eq!(merged.len(), 2);
    assert!((merged.samples()[1].value - 0.3).abs() < 1e-12);
}

#[test]
fn infinite_values_and_out_of_range_scores_are_rejected() {
    let err = TimeSeries::events(vec![Sample::new(at(0), f64::INFINITY)]).expect_err("inf");
    assert!(matches!(err, ValidationError::NonFiniteValue { .. }));

    let err = ScoredPost::new("x", at(0), -1.2, vec![]).expect_err("score");
    assert!(matches!(err, ValidationError::ScoreOutOfRange { .. }));
}

#[test]
fn misaligned_price_bars_are_rejected() {
    let err = TimeSeries::fixed(Span::hours(1), vec![Sample::new(at_minutes(30), 100.0)])
        .expect_err("misaligned");
    assert!(matches!(err, ValidationError::MisalignedSample { .. }));
}

#[test]
fn non_positive_prices_abort_the_sweep() {
    let posts = events(&[(30, 0.1), (90, 0.2)]);
    let prices = hourly_prices(&[100.0, -1.0, 101.0]);
    let engine = SweepEngine::new(SweepConfig::default()).expect("engine");

    let err = engine.run(&posts, &prices).expect_err("aborts");

    assert!(matches!(
        err,
        SweepError::Validation(ValidationError::NonPositivePrice { .. })
    ));
    assert!(engine.iter(&posts, &prices).is_err());
}

// =============================================================================
// Per-configuration problems
// =============================================================================

#[test]
fn ambiguous_configuration_does_not_abort_the_sweep() {
    // Given: quarter-hour buckets on an hourly price grid
    let posts = events(&[(5, 0.1), (20, 0.3), (70, -0.2), (130, 0.5)]);
    let prices = hourly_prices(&[100.0, 101.0, 102.0, 103.0, 104.0]);
    let engine = SweepEngine::new(SweepConfig {
        grid: SweepGrid::new(
            vec![Span::minutes(15), Span::hours(1)],
            vec![Span::hours(1)],
            vec![Span::ZERO],
        )
        .expect("grid"),
        min_rows: 1,
        ..SweepConfig::default()
    })
    .expect("engine");

    // When: sweeping
    let table = engine.run(&posts, &prices).expect("sweep completes");

    // Then: the ambiguous cell is reported, the other evaluated
    assert_eq!(table.rejected().count(), 1);
    let rejected = table.rejected().next().expect("rejected");
    assert!(matches!(
        rejected,
        sentick_sweep::SweepOutcome::Rejected {
            reason: Rejection::Alignment(_),
            ..
        }
    ));
    let evaluated = table.results().next().expect("evaluated");
    assert_eq!(evaluated.n, 3);
    assert_eq!(table.to_table().row_count, 2);
}

#[test]
fn small_configurations_are_flagged_insufficient() {
    let posts = events(&[(30, 0.1), (90, -0.4), (150, 0.2), (210, 0.6)]);
    let prices = hourly_prices(&[100.0, 101.0, 100.5, 102.0, 101.0, 103.0]);
    let engine = SweepEngine::new(SweepConfig {
        grid: SweepGrid::new(vec![Span::hours(1)], vec![Span::hours(1)], vec![Span::ZERO])
            .expect("grid"),
        ..SweepConfig::default()
    })
    .expect("engine");

    let table = engine.run(&posts, &prices).expect("sweep");
    let result = table.results().next().expect("kept");

    assert!(result.insufficient_data);
    assert_eq!(result.n, 4);
    assert!(table.significant_default().is_empty());
}

#[test]
fn row_level_drops_are_counted_not_hidden() {
    // Given: prices that stop after two hours
    let posts = events(&[(30, 0.1), (90, 0.2), (150, 0.3), (210, 0.4)]);
    let buckets = sentick_core::aggregate(&posts, Span::hours(1), Statistic::Mean).expect("buckets");
    let prices = hourly_prices(&[100.0, 101.0, 102.0]);

    // When: aligning
    let spec = WindowSpec::new(Span::hours(1), Span::hours(1), Span::ZERO).expect("spec");
    let table = align(&buckets, &prices, spec).expect("aligned");

    // Then: every dropped row shows up in a counter
    assert_eq!(table.report.candidates, 4);
    assert_eq!(table.report.emitted + table.report.dropped(), 4);
    assert!(table.report.dropped_boundary > 0);
}

#[test]
fn too_few_rows_for_validation_is_an_error() {
    let posts = events(&[(30, 0.1), (90, -0.2), (150, 0.3)]);
    let buckets = sentick_core::aggregate(&posts, Span::hours(1), Statistic::Mean).expect("buckets");
    let prices = hourly_prices(&[100.0, 101.0, 100.0, 102.0, 103.0]);
    let spec = WindowSpec::new(Span::hours(1), Span::hours(1), Span::ZERO).expect("spec");
    let matrix = FeatureMatrix::from_table(&align(&buckets, &prices, spec).expect("aligned"));

    let err = Validator::new(ValidatorConfig::default())
        .expect("validator")
        .validate_classifier(&matrix, sentick_ml::LogisticRegression::default)
        .expect_err("too short");

    assert_eq!(
        err,
        ValidateError::Validation(ValidationError::InsufficientRows {
            required: 200,
            actual: 3
        })
    );
}
