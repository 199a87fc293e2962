pub mod price_file;
pub mod synthetic;

pub use price_file::CsvMarketDataRepository;
pub use synthetic::SyntheticBarSource;
