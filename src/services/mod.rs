pub mod database_size;
pub mod directory_size;
pub mod usage_report;

pub use database_size::DatabaseSizeCalculator;
pub use directory_size::{DirectorySizeCalculator, UnreadablePolicy};
pub use usage_report::UsageReportBuilder;
