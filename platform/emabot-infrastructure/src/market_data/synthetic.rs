use chrono::NaiveDateTime;
use emabot_domain::repositories::bar_source::BarSource;
use emabot_domain::services::feed::historical::trading_timestamps;
use emabot_domain::services::feed::session::SessionWindow;
use emabot_domain::value_objects::bar::{naive_to_timestamp, Bar};
use emabot_domain::value_objects::timeframe::Timeframe;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

const START_PRICE: f64 = 100.0;

/// Random-walk bars standing in for a market data API.
///
/// Historical closes drift upward from 100 with normally distributed steps. Live bars
/// open at the previous close and move by at most 0.15%; the first live bar without any
/// history uses fixed seed prices.
pub struct SyntheticBarSource {
    rng: StdRng,
    session: SessionWindow,
}

impl SyntheticBarSource {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            session: SessionWindow::regular(),
        }
    }

    pub fn with_session(mut self, session: SessionWindow) -> Self {
        self.session = session;
        self
    }

    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        mean + std_dev * z
    }

    fn volume(&mut self) -> f64 {
        f64::from(self.rng.gen_range(1_000u32..10_000))
    }
}

impl Default for SyntheticBarSource {
    fn default() -> Self {
        Self::new()
    }
}

impl BarSource for SyntheticBarSource {
    fn fetch_historical(
        &mut self,
        symbol: &str,
        timeframe: &Timeframe,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Bar>, String> {
        let stamps = trading_timestamps(timeframe, &self.session, from, to);
        let mut close = START_PRICE;
        let mut bars = Vec::with_capacity(stamps.len());
        for at in stamps {
            close = (close + self.gauss(0.01, 0.1)).max(0.01);
            let open = (close - self.gauss(0.0, 0.1)).max(0.01);
            let high = open.max(close) + self.gauss(0.05, 0.05).abs();
            let low = (open.min(close) - self.gauss(0.05, 0.05).abs()).max(0.0);
            let volume = self.volume();
            bars.push(Bar {
                symbol: symbol.to_string(),
                timestamp: naive_to_timestamp(at),
                open,
                high,
                low,
                close,
                volume,
                open_interest: Some(0.0),
            });
        }
        Ok(bars)
    }

    fn fetch_live(
        &mut self,
        symbol: &str,
        _timeframe: &Timeframe,
        bar_time: NaiveDateTime,
        last_close: Option<f64>,
    ) -> Option<Bar> {
        let (open, high, low, close) = match last_close {
            Some(last) => {
                let shift: f64 = self.rng.gen_range(0.0..2.0);
                let close = last * (1.0 + 0.001 * (0.5 - shift));
                (
                    last,
                    last.max(close) + 0.001,
                    last.min(close) - 0.001,
                    close,
                )
            }
            None => (99.95, 100.05, 99.90, 100.0),
        };
        let volume = 1_000.0 + self.rng.gen_range(0.0..1_000.0);
        Some(Bar {
            symbol: symbol.to_string(),
            timestamp: naive_to_timestamp(bar_time),
            open,
            high,
            low,
            close,
            volume,
            open_interest: Some(0.0),
        })
    }
}
