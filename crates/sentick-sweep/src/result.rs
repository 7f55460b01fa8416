//! Per-configuration results and the collected sweep table.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sentick_core::{number_cell, AlignmentReport, Correlation, Table, Tabular, WindowSpec};

use crate::Rejection;

/// Correlation statistics for one evaluated configuration.
///
/// Configurations below the row threshold are kept and flagged rather than
/// dropped, so an empty cell in a heatmap can be explained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    pub spec: WindowSpec,
    /// `None` when undefined (fewer than three rows or a constant column).
    pub pearson: Option<Correlation>,
    pub spearman: Option<Correlation>,
    pub n: usize,
    pub insufficient_data: bool,
    pub report: AlignmentReport,
}

impl SweepResult {
    pub fn pearson_r(&self) -> Option<f64> {
        self.pearson.map(|c| c.r)
    }

    pub fn pearson_p(&self) -> Option<f64> {
        self.pearson.map(|c| c.p_value)
    }

    pub fn spearman_r(&self) -> Option<f64> {
        self.spearman.map(|c| c.r)
    }

    pub fn spearman_p(&self) -> Option<f64> {
        self.spearman.map(|c| c.p_value)
    }

    /// Enough rows and a Pearson p-value below `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        !self.insufficient_data && self.pearson_p().is_some_and(|p| p < alpha)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SweepOutcome {
    Evaluated(SweepResult),
    Rejected { spec: WindowSpec, reason: Rejection },
}

impl SweepOutcome {
    pub fn spec(&self) -> WindowSpec {
        match self {
            Self::Evaluated(result) => result.spec,
            Self::Rejected { spec, .. } => *spec,
        }
    }

    pub fn result(&self) -> Option<&SweepResult> {
        match self {
            Self::Evaluated(result) => Some(result),
            Self::Rejected { .. } => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

impl Tabular for SweepOutcome {
    fn columns() -> Vec<&'static str> {
        vec![
            "window",
            "horizon",
            "lag",
            "status",
            "n",
            "pearson_r",
            "pearson_p",
            "spearman_r",
            "spearman_p",
            "insufficient_data",
            "candidates",
            "dropped",
            "reason",
        ]
    }

    fn row(&self) -> Vec<Value> {
        let spec = self.spec();
        let mut row = vec![
            Value::String(spec.window.to_string()),
            Value::String(spec.horizon.to_string()),
            Value::String(spec.lag.to_string()),
        ];
        let optional = |value: Option<f64>| value.map_or(Value::Null, number_cell);
        match self {
            Self::Evaluated(result) => row.extend([
                Value::from("evaluated"),
                Value::from(result.n),
                optional(result.pearson_r()),
                optional(result.pearson_p()),
                optional(result.spearman_r()),
                optional(result.spearman_p()),
                Value::Bool(result.insufficient_data),
                Value::from(result.report.candidates),
                Value::from(result.report.dropped()),
                Value::Null,
            ]),
            Self::Rejected { reason, .. } => row.extend([
                Value::from("rejected"),
                Value::from(0),
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Bool(true),
                Value::Null,
                Value::Null,
                Value::String(reason.to_string()),
            ]),
        }
        row
    }
}

/// Every outcome of a sweep, sorted by configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepTable {
    outcomes: Vec<SweepOutcome>,
    significance: f64,
}

impl SweepTable {
    pub fn new(mut outcomes: Vec<SweepOutcome>, significance: f64) -> Self {
        outcomes.sort_by_key(SweepOutcome::spec);
        Self {
            outcomes,
            significance,
        }
    }

    pub fn outcomes(&self) -> &[SweepOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, spec: WindowSpec) -> Option<&SweepOutcome> {
        self.outcomes.iter().find(|outcome| outcome.spec() == spec)
    }

    pub fn results(&self) -> impl Iterator<Item = &SweepResult> {
        self.outcomes.iter().filter_map(SweepOutcome::result)
    }

    pub fn rejected(&self) -> impl Iterator<Item = &SweepOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.is_rejected())
    }

    /// Every outcome ordered by `|pearson_r|` descending, p-value ascending.
    ///
    /// Outcomes without a Pearson coefficient follow, rejected
    /// configurations last. Nothing is filtered out.
    pub fn ranked(&self) -> Vec<&SweepOutcome> {
        let mut ranked: Vec<&SweepOutcome> = self.outcomes.iter().collect();
        ranked.sort_by(|a, b| compare_rank(a, b));
        ranked
    }

    pub fn top(&self, k: usize) -> Vec<&SweepOutcome> {
        let mut ranked = self.ranked();
        ranked.truncate(k);
        ranked
    }

    /// Results with enough rows and Pearson p below `alpha`, in rank order.
    pub fn significant(&self, alpha: f64) -> Vec<&SweepResult> {
        self.ranked()
            .into_iter()
            .filter_map(SweepOutcome::result)
            .filter(|result| result.is_significant(alpha))
            .collect()
    }

    /// [`significant`](Self::significant) at the configured level.
    pub fn significant_default(&self) -> Vec<&SweepResult> {
        self.significant(self.significance)
    }

    pub fn to_table(&self) -> Table {
        Table::from_records(&self.outcomes)
    }
}

fn compare_rank(a: &SweepOutcome, b: &SweepOutcome) -> Ordering {
    let pearson = |outcome: &SweepOutcome| outcome.result().and_then(|result| result.pearson);
    let primary = match (pearson(a), pearson(b)) {
        (Some(x), Some(y)) => y
            .r
            .abs()
            .total_cmp(&x.r.abs())
            .then(x.p_value.total_cmp(&y.p_value)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.is_rejected().cmp(&b.is_rejected()),
    };
    primary.then_with(|| a.spec().cmp(&b.spec()))
}
