pub mod corporate;
pub mod dividends;
pub mod engine;
pub mod lots;
pub mod wash;
pub mod year;

pub use engine::{analyze, analyze_ledgers, GlobalStats, TaxReport};
pub use wash::BlockedStatus;
pub use year::YearStats;
