//! Disk and database usage report for the site administrator.
//!
//! The report counts individuals and media objects across all trees, sums the
//! data and index size of every database table, and walks the media directory
//! and the application root. [`services::UsageReportBuilder`] runs those
//! stages concurrently; [`commands::ServerUsageModule`] exposes the result as
//! an admin-only action and [`server`] serves it over HTTP.

pub mod commands;
pub mod database;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
pub mod utils;

pub use error::{ReportError, Stage, UsageError};
pub use models::UsageReport;
