//! Bar feeds consumed by the trading engine.
//!
//! A feed yields bars one at a time through [`DataFeed::poll`]. [`StreamingFeed`] replays a
//! historical table and then switches, once and for good, to polling for live bars.
//! [`HistoricalFeed`] replays a preloaded table and ends.

pub mod clock;
pub mod cursor;
pub mod historical;
pub mod live;
pub mod replay;
pub mod session;

pub use cursor::{StreamingFeed, StreamingFeedBuilder, StreamingParams};
pub use replay::HistoricalFeed;

use crate::value_objects::bar::Bar;
use crate::value_objects::timeframe::TimeframeError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeedError {
    #[error("feed requires a symbol")]
    MissingSymbol,
    #[error("feed requires a bar source")]
    MissingSource,
    #[error(transparent)]
    Timeframe(#[from] TimeframeError),
    #[error("invalid session window: {0}")]
    InvalidSession(String),
    #[error("historical load failed for {symbol}: {reason}")]
    Historical { symbol: String, reason: String },
}

/// Result of one pull on a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// A new current bar is available.
    NewBar,
    /// Nothing right now; the caller may retry later.
    NoData,
    /// The feed will never yield another bar.
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Historical,
    Live,
}

pub trait DataFeed: Send {
    fn symbol(&self) -> &str;

    fn start(&mut self) -> Result<(), FeedError>;

    fn poll(&mut self) -> Advance;

    /// True when a new current bar was produced. On false the current bar is unchanged.
    fn advance(&mut self) -> bool {
        self.poll() == Advance::NewBar
    }

    fn current_bar(&self) -> Option<&Bar>;

    fn stop(&mut self);

    fn phase(&self) -> FeedPhase;

    fn is_live(&self) -> bool {
        self.phase() == FeedPhase::Live
    }
}
