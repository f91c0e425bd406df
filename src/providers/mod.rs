pub mod csv_source;
pub mod yahoo_finance;

pub use csv_source::CsvPriceSource;
pub use yahoo_finance::YahooFinanceSource;
