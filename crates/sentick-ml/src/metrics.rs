//! Fold scoring. Classification metrics treat `1.0` as the positive (up)
//! class and report zero where a ratio is undefined.

use std::collections::BTreeMap;

use ndarray::ArrayView1;

pub type Metrics = BTreeMap<String, f64>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Confusion {
    tp: usize,
    fp: usize,
    tn: usize,
    fn_: usize,
}

impl Confusion {
    fn count(truth: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> Self {
        truth
            .iter()
            .zip(predicted.iter())
            .fold(Self::default(), |mut c, (&t, &p)| {
                match (t > 0.5, p > 0.5) {
                    (true, true) => c.tp += 1,
                    (false, true) => c.fp += 1,
                    (false, false) => c.tn += 1,
                    (true, false) => c.fn_ += 1,
                }
                c
            })
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn accuracy(truth: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    let c = Confusion::count(truth, predicted);
    ratio(c.tp + c.tn, c.tp + c.tn + c.fp + c.fn_)
}

pub fn precision(truth: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    let c = Confusion::count(truth, predicted);
    ratio(c.tp, c.tp + c.fp)
}

pub fn recall(truth: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    let c = Confusion::count(truth, predicted);
    ratio(c.tp, c.tp + c.fn_)
}

pub fn f1(truth: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    let c = Confusion::count(truth, predicted);
    ratio(2 * c.tp, 2 * c.tp + c.fp + c.fn_)
}

/// Share of up labels: the accuracy of always guessing up.
pub fn base_rate(truth: ArrayView1<'_, f64>) -> f64 {
    ratio(truth.iter().filter(|&&t| t > 0.5).count(), truth.len())
}

pub fn mae(truth: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    (&truth - &predicted).mapv(f64::abs).sum() / truth.len() as f64
}

pub fn rmse(truth: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    ((&truth - &predicted).mapv(|e| e * e).sum() / truth.len() as f64).sqrt()
}

pub fn classification_metrics(truth: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> Metrics {
    [
        ("accuracy", accuracy(truth, predicted)),
        ("precision", precision(truth, predicted)),
        ("recall", recall(truth, predicted)),
        ("f1", f1(truth, predicted)),
        ("base_rate", base_rate(truth)),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}

pub fn regression_metrics(truth: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> Metrics {
    [("mae", mae(truth, predicted)), ("rmse", rmse(truth, predicted))]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}
