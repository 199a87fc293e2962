use chrono::{Duration, NaiveDate, NaiveDateTime};
use emabot_domain::repositories::bar_source::BarSource;
use emabot_domain::services::feed::clock::ManualClock;
use emabot_domain::services::feed::historical::{trading_timestamps, HistoricalLoader};
use emabot_domain::services::feed::live::LivePoller;
use emabot_domain::services::feed::session::SessionWindow;
use emabot_domain::services::feed::{
    Advance, DataFeed, FeedPhase, StreamingFeed, StreamingParams,
};
use emabot_domain::value_objects::bar::{naive_to_timestamp, Bar};
use emabot_domain::value_objects::timeframe::Timeframe;
use proptest::prelude::*;
use std::sync::Arc;

/// Deterministic walk: each bar moves the close by the next step, wicks extend by `wick`.
struct WalkSource {
    steps: Vec<f64>,
    wick: f64,
    cursor: usize,
}

impl WalkSource {
    fn new(steps: Vec<f64>, wick: f64) -> Self {
        Self {
            steps,
            wick,
            cursor: 0,
        }
    }

    fn next_step(&mut self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        let step = self.steps[self.cursor % self.steps.len()];
        self.cursor += 1;
        step
    }

    fn make_bar(&mut self, symbol: &str, at: NaiveDateTime, prev: f64) -> Bar {
        let close = (prev + self.next_step()).max(1.0);
        Bar {
            symbol: symbol.to_string(),
            timestamp: naive_to_timestamp(at),
            open: prev,
            high: prev.max(close) + self.wick,
            low: prev.min(close) - self.wick,
            close,
            volume: 1_000.0,
            open_interest: Some(0.0),
        }
    }
}

impl BarSource for WalkSource {
    fn fetch_historical(
        &mut self,
        symbol: &str,
        timeframe: &Timeframe,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Bar>, String> {
        let mut prev = 100.0;
        let mut out = Vec::new();
        for at in trading_timestamps(timeframe, &SessionWindow::regular(), from, to) {
            let bar = self.make_bar(symbol, at, prev);
            prev = bar.close;
            out.push(bar);
        }
        Ok(out)
    }

    fn fetch_live(
        &mut self,
        symbol: &str,
        _timeframe: &Timeframe,
        bar_time: NaiveDateTime,
        last_close: Option<f64>,
    ) -> Option<Bar> {
        Some(self.make_bar(symbol, bar_time, last_close.unwrap_or(100.0)))
    }
}

fn base() -> NaiveDateTime {
    // Monday.
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

fn timeframe_strategy() -> impl Strategy<Value = Timeframe> {
    prop::sample::select(vec!["1m", "5m", "15m", "30m", "1h", "1d", "1w"])
        .prop_map(|label| Timeframe::parse(label).unwrap())
}

fn live_feed(table_days: i64, clock: Arc<ManualClock>, steps: Vec<f64>) -> StreamingFeed {
    let mut params = StreamingParams::new("AAPL", Timeframe::parse("5m").unwrap());
    params.from = Some(base());
    params.to = Some(base() + Duration::days(table_days) - Duration::seconds(1));
    params.live = true;
    params.session = Some(SessionWindow::regular());
    StreamingFeed::builder(params)
        .source(Box::new(WalkSource::new(steps, 0.05)))
        .clock(clock)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn loaded_bars_are_ordered_and_ohlc_consistent(
        timeframe in timeframe_strategy(),
        start_offset in 0i64..20,
        span_days in 0i64..12,
        steps in prop::collection::vec(-3.0f64..3.0, 1..16),
        wick in 0.0f64..1.0,
    ) {
        let from = base() + Duration::days(start_offset);
        let to = from + Duration::days(span_days) + Duration::hours(17);
        let mut source = WalkSource::new(steps, wick);
        let bars = HistoricalLoader::new(from, to)
            .load(&mut source, "AAPL", &timeframe)
            .unwrap();

        for pair in bars.windows(2) {
            prop_assert!(pair[1].timestamp > pair[0].timestamp);
        }
        for bar in &bars {
            prop_assert!(bar.high >= bar.open.max(bar.close));
            prop_assert!(bar.low <= bar.open.min(bar.close));
        }
    }

    #[test]
    fn inverted_range_loads_nothing(
        timeframe in timeframe_strategy(),
        gap_minutes in 1i64..100_000,
    ) {
        let to = base() + Duration::days(10);
        let from = to + Duration::minutes(gap_minutes);
        let mut source = WalkSource::new(vec![1.0], 0.1);
        let bars = HistoricalLoader::new(from, to)
            .load(&mut source, "AAPL", &timeframe)
            .unwrap();
        prop_assert!(bars.is_empty());
    }

    #[test]
    fn sequencer_never_returns_to_historical(
        table_days in 0i64..3,
        ticks in prop::collection::vec(0i64..600, 1..60),
    ) {
        let clock = Arc::new(ManualClock::new(base() + Duration::days(3) + Duration::hours(9)));
        let mut feed = live_feed(table_days, clock.clone(), vec![0.5, -0.25]);
        feed.start().unwrap();

        let mut seen_live = feed.is_live();
        let mut last_ts: Option<i64> = None;
        for minutes in ticks {
            clock.advance_seconds(minutes * 60);
            let outcome = feed.poll();
            prop_assert_ne!(outcome, Advance::Ended);
            if outcome == Advance::NewBar {
                let ts = feed.current_bar().unwrap().timestamp;
                prop_assert!(last_ts.map_or(true, |prev| ts > prev));
                last_ts = Some(ts);
            }
            if seen_live {
                prop_assert_eq!(feed.phase(), FeedPhase::Live);
            }
            seen_live |= feed.is_live();
        }
    }

    #[test]
    fn poller_never_emits_at_or_before_last_known(
        seed_minutes in 0i64..(5 * 24 * 60),
        ticks in prop::collection::vec(0i64..240, 1..80),
    ) {
        let timeframe = Timeframe::parse("5m").unwrap();
        let seed_at = base() + Duration::minutes(seed_minutes);
        let mut source = WalkSource::new(vec![0.3, -0.1], 0.0);
        let seed = source.fetch_live("AAPL", &timeframe, seed_at, None).unwrap();
        let last_known = seed.timestamp;

        let mut poller = LivePoller::new(timeframe, Some(SessionWindow::regular()));
        poller.seed(&seed);
        let clock = ManualClock::new(base());
        let mut previous = last_known;
        for minutes in ticks {
            clock.advance_seconds(minutes * 60);
            if let Some(bar) = poller.poll(&mut source, "AAPL", &clock) {
                prop_assert!(bar.timestamp > last_known);
                prop_assert!(bar.timestamp > previous);
                previous = bar.timestamp;
            }
        }
    }

    #[test]
    fn poller_is_silent_outside_the_session(
        day in 0i64..14,
        minute_of_day in prop_oneof![0i64..570, 961i64..1440],
        polls in 1usize..20,
    ) {
        let timeframe = Timeframe::parse("1m").unwrap();
        let mut poller = LivePoller::new(timeframe, Some(SessionWindow::regular()));
        let mut source = WalkSource::new(vec![1.0], 0.1);
        let clock = ManualClock::new(base() + Duration::days(day) + Duration::minutes(minute_of_day));
        for _ in 0..polls {
            prop_assert!(poller.poll(&mut source, "AAPL", &clock).is_none());
        }
        prop_assert_eq!(poller.last_known(), None);
    }
}

#[test]
fn poller_is_silent_on_weekends_inside_session_hours() {
    let mut poller = LivePoller::new(Timeframe::parse("1m").unwrap(), Some(SessionWindow::regular()));
    let mut source = WalkSource::new(vec![1.0], 0.1);
    // Saturday 2024-01-06 at noon.
    let clock = ManualClock::new(base() + Duration::days(5) + Duration::hours(12));
    assert!(poller.poll(&mut source, "AAPL", &clock).is_none());
}

#[test]
fn first_live_poll_in_session_emits_one_bar_per_interval() {
    let mut poller = LivePoller::new(Timeframe::parse("5m").unwrap(), Some(SessionWindow::regular()));
    let mut source = WalkSource::new(vec![1.0], 0.1);
    let clock = ManualClock::new(base() + Duration::hours(10) + Duration::minutes(2));

    let first = poller.poll(&mut source, "AAPL", &clock).unwrap();
    assert_eq!(
        first.timestamp,
        naive_to_timestamp(base() + Duration::hours(10))
    );
    // Same interval: deduplicated.
    clock.advance_seconds(60);
    assert!(poller.poll(&mut source, "AAPL", &clock).is_none());
    clock.advance_seconds(3 * 60);
    assert!(poller.poll(&mut source, "AAPL", &clock).is_some());
}

#[test]
fn exhausted_table_switches_to_live_on_the_same_advance() {
    // Table covers Monday; the clock sits on Tuesday inside the session.
    let clock = Arc::new(ManualClock::new(base() + Duration::days(1) + Duration::hours(11)));
    let mut feed = live_feed(1, clock.clone(), vec![0.1]);
    feed.start().unwrap();
    let table = feed.historical_len();
    assert_eq!(table, 78);

    for _ in 0..table {
        assert!(feed.advance());
        assert!(!feed.is_live());
    }
    assert!(feed.advance());
    assert!(feed.is_live());
    let live_bar = feed.current_bar().unwrap().clone();
    assert_eq!(
        live_bar.timestamp,
        naive_to_timestamp(base() + Duration::days(1) + Duration::hours(11))
    );

    assert_eq!(feed.poll(), Advance::NoData);
    assert_eq!(feed.current_bar(), Some(&live_bar));
    assert!(feed.is_live());
}
