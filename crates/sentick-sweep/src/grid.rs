//! Parameter grid and sweep configuration.

use serde::{Deserialize, Serialize};
use sentick_core::{AggregationConfig, AlignConfig, Aggregator, Span, ValidationError, WindowSpec};

use crate::SweepError;

const DEFAULT_WINDOWS_H: [u64; 7] = [1, 4, 6, 12, 24, 72, 168];
const DEFAULT_LAGS_H: [u64; 6] = [0, 1, 2, 4, 6, 12];

/// Candidate windows, horizons and lags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepGrid {
    pub windows: Vec<Span>,
    pub horizons: Vec<Span>,
    pub lags: Vec<Span>,
}

impl Default for SweepGrid {
    fn default() -> Self {
        let hours = |values: &[u64]| values.iter().map(|&h| Span::hours(h)).collect::<Vec<_>>();
        Self {
            windows: hours(&DEFAULT_WINDOWS_H),
            horizons: hours(&DEFAULT_WINDOWS_H),
            lags: hours(&DEFAULT_LAGS_H),
        }
    }
}

impl SweepGrid {
    pub fn new(
        windows: Vec<Span>,
        horizons: Vec<Span>,
        lags: Vec<Span>,
    ) -> Result<Self, ValidationError> {
        let grid = Self {
            windows,
            horizons,
            lags,
        };
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (axis, values) in [
            ("windows", &self.windows),
            ("horizons", &self.horizons),
            ("lags", &self.lags),
        ] {
            if values.is_empty() {
                return Err(ValidationError::EmptyGrid { axis });
            }
        }
        for window in &self.windows {
            window.require_positive("window")?;
        }
        for horizon in &self.horizons {
            horizon.require_positive("horizon")?;
        }
        Ok(())
    }

    /// Number of configurations in the Cartesian product.
    pub fn len(&self) -> usize {
        self.windows.len() * self.horizons.len() * self.lags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lazy Cartesian product, window-major, then horizon, then lag.
    pub fn specs(&self) -> impl Iterator<Item = WindowSpec> + Send + '_ {
        self.windows
            .iter()
            .flat_map(move |&window| self.specs_for_window(window))
    }

    pub(crate) fn specs_for_window(&self, window: Span) -> impl Iterator<Item = WindowSpec> + Send + '_ {
        self.horizons.iter().flat_map(move |&horizon| {
            self.lags.iter().map(move |&lag| WindowSpec {
                window,
                horizon,
                lag,
            })
        })
    }
}

/// Immutable sweep settings handed to [`SweepEngine::new`](crate::SweepEngine::new).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub grid: SweepGrid,
    pub aggregation: AggregationConfig,
    pub align: AlignConfig,
    /// Configurations with fewer aligned rows are flagged
    /// `insufficient_data`.
    pub min_rows: usize,
    /// Threshold used by [`SweepTable::significant_default`](crate::SweepTable::significant_default).
    pub significance: f64,
    /// Evaluate configurations on the rayon pool.
    pub parallel: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            grid: SweepGrid::default(),
            aggregation: AggregationConfig::default(),
            align: AlignConfig::default(),
            min_rows: 50,
            significance: 0.05,
            parallel: true,
        }
    }
}

impl SweepConfig {
    pub fn with_grid(grid: SweepGrid) -> Self {
        Self {
            grid,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(input: &str) -> Result<Self, SweepError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SweepError> {
        self.grid.validate()?;
        Aggregator::new(self.aggregation)?;
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(SweepError::Significance(self.significance));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(input: &str) -> Span {
        input.parse().expect("span")
    }

    #[test]
    fn default_grid_matches_documented_values() {
        let grid = SweepGrid::default();

        assert_eq!(grid.windows.len(), 7);
        assert_eq!(grid.lags.first(), Some(&Span::ZERO));
        assert_eq!(grid.windows.last(), Some(&Span::days(7)));
        assert_eq!(grid.len(), 7 * 7 * 6);
    }

    #[test]
    fn specs_are_window_major() {
        let grid = SweepGrid::new(
            vec![span("1h"), span("4h")],
            vec![span("1h"), span("2h")],
            vec![span("0h"), span("1h")],
        )
        .expect("grid");

        let specs: Vec<WindowSpec> = grid.specs().collect();

        assert_eq!(specs.len(), grid.len());
        assert_eq!(
            specs[0],
            WindowSpec::new(span("1h"), span("1h"), span("0h")).expect("spec")
        );
        assert_eq!(
            specs[1],
            WindowSpec::new(span("1h"), span("1h"), span("1h")).expect("spec")
        );
        assert_eq!(
            specs[2],
            WindowSpec::new(span("1h"), span("2h"), span("0h")).expect("spec")
        );
        assert_eq!(specs[4].window, span("4h"));
    }

    #[test]
    fn rejects_empty_axes_and_zero_windows() {
        let err = SweepGrid::new(vec![], vec![span("1h")], vec![span("0h")]).expect_err("empty");
        assert!(matches!(err, ValidationError::EmptyGrid { axis: "windows" }));

        let err = SweepGrid::new(vec![span("1h")], vec![span("0h")], vec![span("0h")])
            .expect_err("zero horizon");
        assert!(matches!(err, ValidationError::ZeroSpan { field: "horizon" }));
    }

    #[test]
    fn loads_config_from_json_with_defaults() {
        let config = SweepConfig::from_json_str(
            r#"{
                "grid": { "windows": ["1h", "90m"], "lags": ["0h"] },
                "aggregation": { "statistic": "count", "empty_buckets": "sentinel" },
                "align": { "target": "direction" },
                "min_rows": 10
            }"#,
        )
        .expect("config");

        assert_eq!(config.grid.windows, vec![Span::hours(1), Span::minutes(90)]);
        assert_eq!(config.grid.horizons, SweepGrid::default().horizons);
        assert_eq!(config.min_rows, 10);
        assert_eq!(config.significance, 0.05);
        assert!(config.parallel);
    }

    #[test]
    fn rejects_bad_significance_and_malformed_json() {
        let err = SweepConfig::from_json_str(r#"{ "significance": 1.5 }"#).expect_err("alpha");
        assert!(matches!(err, SweepError::Significance(_)));

        let err = SweepConfig::from_json_str(r#"{ "grid": { "windows": ["soon"] } }"#)
            .expect_err("span");
        assert!(matches!(err, SweepError::Config(_)));
    }
}
