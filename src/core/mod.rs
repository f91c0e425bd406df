//! Core abstractions and calculations

pub mod config;
pub mod log;
pub mod pairs;
pub mod price;
pub mod series;
pub mod statistics;
pub mod yields;

// Re-export main types for cleaner imports
pub use pairs::{PairRecord, Side};
pub use price::{Bar, Interval, PriceHistory, PriceSource};
pub use series::{Column, SeriesTable, TimeSeries};
pub use statistics::DescriptiveStatistics;
pub use yields::{YieldDifferential, YieldStore};
