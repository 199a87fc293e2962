use chrono::{Duration, NaiveDate, NaiveDateTime};
use emabot_domain::services::feed::clock::ManualClock;
use emabot_domain::services::feed::session::SessionWindow;
use emabot_domain::services::feed::{Advance, DataFeed, StreamingFeed, StreamingParams};
use emabot_domain::value_objects::timeframe::Timeframe;
use emabot_infrastructure::market_data::SyntheticBarSource;
use proptest::prelude::*;
use std::sync::Arc;

fn monday() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 8)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

fn feed(timeframe: &str, seed: u64, clock: Arc<ManualClock>, live: bool) -> StreamingFeed {
    let mut params = StreamingParams::new("AAPL", Timeframe::parse(timeframe).unwrap());
    params.live = live;
    params.session = Some(SessionWindow::regular());
    StreamingFeed::builder(params)
        .source(Box::new(SyntheticBarSource::seeded(seed)))
        .clock(clock)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32,
        .. ProptestConfig::default()
    })]

    #[test]
    fn synthetic_history_is_ordered_and_consistent(
        seed in any::<u64>(),
        timeframe in prop::sample::select(vec!["5m", "1h", "1d"]),
    ) {
        let clock = Arc::new(ManualClock::new(monday() + Duration::days(14)));
        let mut feed = feed(timeframe, seed, clock, false);
        feed.start().unwrap();

        let mut last: Option<i64> = None;
        while feed.advance() {
            let bar = feed.current_bar().unwrap();
            prop_assert!(bar.high >= bar.open.max(bar.close));
            prop_assert!(bar.low <= bar.open.min(bar.close));
            prop_assert!(last.map_or(true, |prev| bar.timestamp > prev));
            last = Some(bar.timestamp);
        }
        prop_assert!(last.is_some());
        prop_assert_eq!(feed.poll(), Advance::Ended);
    }
}

#[test]
fn default_range_is_thirty_days_of_weekdays() {
    // Monday 2024-02-05 at noon; the thirty days before it hold 21 weekdays.
    let clock = Arc::new(ManualClock::new(
        NaiveDate::from_ymd_opt(2024, 2, 5)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap(),
    ));
    let mut feed = feed("1d", 1, clock, false);
    feed.start().unwrap();
    assert_eq!(feed.historical_len(), 21);
}

#[test]
fn live_polling_follows_the_clock() {
    let clock = Arc::new(ManualClock::new(monday() + Duration::days(7) + Duration::hours(8)));
    let mut feed = feed("1m", 3, clock.clone(), true);
    feed.start().unwrap();
    let history = feed.historical_len();
    for _ in 0..history {
        assert!(feed.advance());
    }
    let last_history_close = feed.current_bar().unwrap().close;

    // Before the open: the feed is live but has nothing to say.
    assert_eq!(feed.poll(), Advance::NoData);
    assert!(feed.is_live());

    clock.advance_seconds(90 * 60);
    assert!(feed.advance());
    let first_live = feed.current_bar().unwrap().clone();
    assert_eq!(first_live.open, last_history_close);

    assert!(!feed.advance());
    clock.advance_seconds(60);
    assert!(feed.advance());
    assert!(feed.current_bar().unwrap().timestamp > first_live.timestamp);
}
