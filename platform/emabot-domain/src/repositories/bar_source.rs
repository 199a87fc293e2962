use crate::value_objects::bar::Bar;
use crate::value_objects::timeframe::Timeframe;
use chrono::NaiveDateTime;

/// Produces bars for a symbol, either as a finite range or one bar at a time.
///
/// `fetch_historical` must return bars sorted by strictly increasing timestamp and
/// must return an empty vector, not an error, when the range holds no trading time.
/// `fetch_live` is only called by the live poller once its gates have passed; it
/// builds the bar opening at `bar_time`, seeded from `last_close` when one exists.
pub trait BarSource: Send {
    fn fetch_historical(
        &mut self,
        symbol: &str,
        timeframe: &Timeframe,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Bar>, String>;

    fn fetch_live(
        &mut self,
        symbol: &str,
        timeframe: &Timeframe,
        bar_time: NaiveDateTime,
        last_close: Option<f64>,
    ) -> Option<Bar>;
}
