//! Shared fixtures for the behavioural test suites.

use sentick_core::{
    close_series, sentiment_series, Bar, Sample, ScoredPost, Span, Symbol, TimeSeries, UtcDateTime,
};

pub use sentick_core;
pub use sentick_ml;
pub use sentick_sweep;

/// 2024-01-01T00:00:00Z
pub const BASE: i64 = 1_704_067_200;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn at(hours: i64) -> UtcDateTime {
    at_minutes(hours * 60)
}

pub fn at_minutes(minutes: i64) -> UtcDateTime {
    UtcDateTime::from_unix_seconds(BASE + minutes * 60).expect("timestamp in range")
}

pub fn symbol(input: &str) -> Symbol {
    Symbol::parse(input).expect("valid symbol")
}

/// Hourly prices starting at `BASE`.
pub fn hourly_prices(values: &[f64]) -> TimeSeries {
    TimeSeries::fixed(
        Span::hours(1),
        values
            .iter()
            .enumerate()
            .map(|(h, &value)| Sample::new(at(h as i64), value))
            .collect(),
    )
    .expect("valid prices")
}

/// Sentiment events as `(minutes after BASE, score)`.
pub fn events(points: &[(i64, f64)]) -> TimeSeries {
    TimeSeries::events(
        points
            .iter()
            .map(|&(minutes, score)| Sample::new(at_minutes(minutes), score))
            .collect(),
    )
    .expect("valid events")
}

/// Deterministic linear congruential generator for reproducible fixtures.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Uniform in `[-1, 1)`.
    pub fn next_signed(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let unit = (self.0 >> 11) as f64 / (1u64 << 53) as f64;
        unit * 2.0 - 1.0
    }
}

/// Posts and bars for two assets over `hours` hours.
///
/// Three posts per hour mention BTC; the middle one also mentions ETH.
/// BTC's next-hour return follows the hour's mean sentiment; ETH's price
/// is unrelated noise.
pub struct Market {
    pub posts: Vec<ScoredPost>,
    pub btc_bars: Vec<Bar>,
    pub eth_bars: Vec<Bar>,
    pub hours: usize,
}

impl Market {
    pub fn generate(hours: usize) -> Self {
        let mut rng = Lcg::new(42);
        let mut posts = Vec::with_capacity(hours * 3);
        let mut means = Vec::with_capacity(hours);

        for hour in 0..hours {
            let mood = 0.8 * rng.next_signed();
            let mut sum = 0.0;
            for (slot, minute) in [10_i64, 25, 40].into_iter().enumerate() {
                let score = mood + 0.1 * rng.next_signed();
                sum += score;
                let mentions = if slot == 1 {
                    vec![symbol("BTC"), symbol("ETH")]
                } else {
                    vec![symbol("BTC")]
                };
                posts.push(
                    ScoredPost::new(
                        format!("post-{hour}-{slot}"),
                        at_minutes(hour as i64 * 60 + minute),
                        score,
                        mentions,
                    )
                    .expect("valid post"),
                );
            }
            means.push(sum / 3.0);
        }

        let mut btc = vec![30_000.0, 30_000.0];
        let mut eth = vec![2_000.0, 2_000.0];
        for hour in 1..=hours {
            let drift = 0.004 * means[hour - 1] + 0.001 * rng.next_signed();
            let btc_last = btc[hour];
            btc.push(btc_last * (1.0 + drift));
            let eth_last = eth[hour];
            eth.push(eth_last * (1.0 + 0.004 * rng.next_signed()));
        }

        Self {
            posts,
            btc_bars: bars(&btc),
            eth_bars: bars(&eth),
            hours,
        }
    }

    pub fn end(&self) -> UtcDateTime {
        at(self.hours as i64 + 2)
    }

    pub fn btc_prices(&self) -> TimeSeries {
        close_series(&self.btc_bars, Span::hours(1)).expect("btc prices")
    }

    pub fn eth_prices(&self) -> TimeSeries {
        close_series(&self.eth_bars, Span::hours(1)).expect("eth prices")
    }

    pub fn sentiment(&self, asset: &str) -> TimeSeries {
        sentiment_series(&self.posts, &symbol(asset)).expect("sentiment")
    }
}

fn bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(h, &close)| {
            let open = if h == 0 { close } else { closes[h - 1] };
            Bar::new(
                at(h as i64),
                open,
                open.max(close),
                open.min(close),
                close,
                Some(1.0),
            )
            .expect("valid bar")
        })
        .collect()
}
