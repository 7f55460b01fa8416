//! Correlation statistics with two-sided significance tests.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Coefficient and two-sided p-value under the null of no correlation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
}

/// Pearson product-moment correlation.
///
/// `None` when the columns differ in length, hold fewer than three
/// observations, contain non-finite values, or either has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<Correlation> {
    let r = pearson_r(x, y)?;
    Some(Correlation {
        r,
        p_value: t_test_p_value(r, x.len())?,
        n: x.len(),
    })
}

/// Spearman rank correlation: Pearson on average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> Option<Correlation> {
    if x.len() != y.len() || x.iter().chain(y).any(|value| !value.is_finite()) {
        return None;
    }
    pearson(&rank(x), &rank(y))
}

/// 1-based ranks with ties sharing their average rank.
pub fn rank(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let average = (start + end + 1) as f64 / 2.0;
        for &index in &order[start..end] {
            ranks[index] = average;
        }
        start = end;
    }
    ranks
}

fn pearson_r(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 3 {
        return None;
    }
    if x.iter().chain(y).any(|value| !value.is_finite()) {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// `t = r * sqrt((n - 2) / (1 - r^2))` against Student's t with `n - 2`
/// degrees of freedom.
fn t_test_p_value(r: f64, n: usize) -> Option<f64> {
    if n < 3 {
        return None;
    }
    if r.abs() >= 1.0 {
        return Some(0.0);
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pearson_matches_reference_values() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];

        let result = pearson(&x, &y).expect("defined");

        assert!((result.r - 0.774_596_669_241_483_4).abs() < 1e-12);
        assert!(
            result.p_value > 0.12 && result.p_value < 0.13,
            "p={}",
            result.p_value
        );
        assert_eq!(result.n, 5);
    }

    #[test]
    fn perfect_correlation_has_vanishing_p_value() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [-2.0, -4.0, -6.0, -8.0];

        let result = pearson(&x, &y).expect("defined");

        assert!((result.r + 1.0).abs() < 1e-12);
        assert!(result.p_value < 1e-9);
    }

    #[test]
    fn spearman_sees_monotone_nonlinear_relationships() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y: Vec<f64> = x.iter().map(|v: &f64| v.powi(3)).collect();

        let rho = spearman(&x, &y).expect("defined");
        let r = pearson(&x, &y).expect("defined");

        assert!((rho.r - 1.0).abs() < 1e-12);
        assert!(r.r < 1.0);
    }

    #[test]
    fn ranks_average_ties() {
        assert_eq!(rank(&[10.0, 20.0, 10.0, 30.0]), vec![1.5, 3.0, 1.5, 4.0]);
    }

    #[test]
    fn undefined_for_short_or_constant_columns() {
        assert!(pearson(&[1.0, 2.0], &[3.0, 4.0]).is_none());
        assert!(pearson(&[1.0, 1.0, 1.0], &[3.0, 4.0, 5.0]).is_none());
        assert!(pearson(&[1.0, 2.0, 3.0], &[3.0, 4.0]).is_none());
        assert!(spearman(&[1.0, f64::NAN, 3.0], &[3.0, 4.0, 5.0]).is_none());
    }

    #[test]
    fn uncorrelated_columns_are_not_significant() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let y = [1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0];

        let result = pearson(&x, &y).expect("defined");

        assert!(result.r.abs() < 1e-12);
        assert!((result.p_value - 1.0).abs() < 1e-9);
    }
}
