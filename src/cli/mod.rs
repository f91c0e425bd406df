pub mod differential;
pub mod pairs;
pub mod setup;
pub mod stats;
pub mod ui;
pub mod wrangle;
