use crate::services::ohlcv::DataQualityReport;
use crate::value_objects::bar::Bar;
use crate::value_objects::timeframe::Timeframe;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct OhlcvQuery {
    pub path: PathBuf,
    pub symbol: String,
    pub timeframe: Timeframe,
}

pub trait MarketDataRepository {
    fn load_ohlcv(&self, query: &OhlcvQuery) -> Result<(Vec<Bar>, DataQualityReport), String>;
}
