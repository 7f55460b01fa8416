//! Sweep evaluation: aggregate, align, correlate.
//!
//! Each configuration reads only the two immutable input series and
//! produces its own [`SweepOutcome`]. [`SweepEngine::iter`] evaluates
//! lazily in grid order; [`SweepEngine::run`] evaluates the whole grid on
//! the rayon pool and sorts by configuration, so repeated runs are
//! identical regardless of completion order.

use rayon::prelude::*;
use sentick_core::{
    pearson, spearman, AlignedTable, Aggregator, Aligner, Span, Symbol, TimeSeries,
    ValidationError, WindowSpec,
};

use crate::{Rejection, SweepConfig, SweepError, SweepGrid, SweepOutcome, SweepResult, SweepTable};

type Aggregated = Result<TimeSeries, ValidationError>;

/// Inputs for one asset in a multi-asset sweep.
#[derive(Debug, Clone)]
pub struct AssetInputs {
    pub symbol: Symbol,
    pub sentiment: TimeSeries,
    pub price: TimeSeries,
}

#[derive(Debug, Clone)]
pub struct AssetSweep {
    pub symbol: Symbol,
    pub table: SweepTable,
}

#[derive(Debug, Clone)]
pub struct SweepEngine {
    config: SweepConfig,
    aggregator: Aggregator,
    aligner: Aligner,
}

impl SweepEngine {
    pub fn new(config: SweepConfig) -> Result<Self, SweepError> {
        config.validate()?;
        Ok(Self {
            aggregator: Aggregator::new(config.aggregation)?,
            aligner: Aligner::new(config.align),
            config,
        })
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Align an already aggregated sentiment series and score it.
    ///
    /// Pure: the same inputs always give the same outcome.
    pub fn evaluate(&self, sentiment: &TimeSeries, price: &TimeSeries, spec: WindowSpec) -> SweepOutcome {
        match self.aligner.align(sentiment, price, spec) {
            Ok(table) => SweepOutcome::Evaluated(self.score(&table)),
            Err(err) => {
                log::warn!("{spec}: rejected: {err}");
                SweepOutcome::Rejected {
                    spec,
                    reason: Rejection::Alignment(err),
                }
            }
        }
    }

    /// Lazily evaluate the grid in window-major order.
    ///
    /// The aggregated series is reused while consecutive configurations
    /// share a window. Dropping the iterator stops the sweep.
    pub fn iter<'a>(
        &'a self,
        sentiment: &'a TimeSeries,
        price: &'a TimeSeries,
    ) -> Result<SweepIter<'a>, SweepError> {
        check_prices(price)?;
        Ok(SweepIter {
            engine: self,
            sentiment,
            price,
            specs: Box::new(self.config.grid.specs()),
            cache: None,
        })
    }

    /// Evaluate the whole grid and collect it sorted by configuration.
    pub fn run(&self, sentiment: &TimeSeries, price: &TimeSeries) -> Result<SweepTable, SweepError> {
        check_prices(price)?;
        let grid = &self.config.grid;
        log::info!(
            "sweeping {} configurations over {} sentiment and {} price samples",
            grid.len(),
            sentiment.len(),
            price.len()
        );

        let outcomes: Vec<SweepOutcome> = if self.config.parallel {
            grid.windows
                .par_iter()
                .flat_map(|&window| {
                    let aggregated = self.aggregator.aggregate(sentiment, window);
                    let specs: Vec<WindowSpec> = grid.specs_for_window(window).collect();
                    specs
                        .into_par_iter()
                        .map(move |spec| self.outcome(&aggregated, price, spec))
                })
                .collect()
        } else {
            self.iter(sentiment, price)?.collect()
        };

        let table = SweepTable::new(outcomes, self.config.significance);
        let insufficient = table.results().filter(|result| result.insufficient_data).count();
        log::info!(
            "sweep finished: {} evaluated ({} insufficient), {} rejected",
            table.results().count(),
            insufficient,
            table.rejected().count()
        );
        Ok(table)
    }

    /// One sweep per asset, in input order.
    ///
    /// Malformed input for any asset aborts the call.
    pub fn run_assets(&self, assets: &[AssetInputs]) -> Result<Vec<AssetSweep>, SweepError> {
        assets
            .iter()
            .map(|asset| {
                log::info!("sweeping {}", asset.symbol);
                Ok(AssetSweep {
                    symbol: asset.symbol.clone(),
                    table: self.run(&asset.sentiment, &asset.price)?,
                })
            })
            .collect()
    }

    fn outcome(&self, aggregated: &Aggregated, price: &TimeSeries, spec: WindowSpec) -> SweepOutcome {
        match aggregated {
            Ok(sentiment) => self.evaluate(sentiment, price, spec),
            Err(err) => {
                log::warn!("{spec}: rejected: {err}");
                SweepOutcome::Rejected {
                    spec,
                    reason: Rejection::Aggregation(err.clone()),
                }
            }
        }
    }

    fn score(&self, table: &AlignedTable) -> SweepResult {
        let features = table.features();
        let labels = table.labels();
        let result = SweepResult {
            spec: table.spec,
            pearson: pearson(&features, &labels),
            spearman: spearman(&features, &labels),
            n: table.len(),
            insufficient_data: table.len() < self.config.min_rows,
            report: table.report,
        };
        log::debug!(
            "{}: n={} pearson={:?} spearman={:?} insufficient={}",
            result.spec,
            result.n,
            result.pearson_r(),
            result.spearman_r(),
            result.insufficient_data
        );
        result
    }
}

/// Lazy sweep over the configured grid. See [`SweepEngine::iter`].
pub struct SweepIter<'a> {
    engine: &'a SweepEngine,
    sentiment: &'a TimeSeries,
    price: &'a TimeSeries,
    specs: Box<dyn Iterator<Item = WindowSpec> + Send + 'a>,
    cache: Option<(Span, Aggregated)>,
}

impl Iterator for SweepIter<'_> {
    type Item = SweepOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        let spec = self.specs.next()?;
        let aggregated = match self.cache.take() {
            Some((window, aggregated)) if window == spec.window => aggregated,
            _ => self.engine.aggregator.aggregate(self.sentiment, spec.window),
        };
        let outcome = self.engine.outcome(&aggregated, self.price, spec);
        self.cache = Some((spec.window, aggregated));
        Some(outcome)
    }
}

/// Sweep with default settings over `grid`.
pub fn sweep(
    sentiment: &TimeSeries,
    price: &TimeSeries,
    grid: SweepGrid,
) -> Result<SweepTable, SweepError> {
    SweepEngine::new(SweepConfig::with_grid(grid))?.run(sentiment, price)
}

fn check_prices(price: &TimeSeries) -> Result<(), ValidationError> {
    match price.samples().iter().find(|sample| !(sample.value > 0.0) || sample.value.is_infinite()) {
        Some(sample) => Err(ValidationError::NonPositivePrice { ts: sample.ts }),
        None => Ok(()),
    }
}
