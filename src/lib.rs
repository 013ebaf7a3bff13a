//! Finance Tracker aggregates personal income and expense transactions into
//! the summaries shown by its dashboard and weekly views.
//!
//! The library is a pure, synchronous engine: given an already fetched list of
//! transactions, a reference instant and the local timezone, it buckets
//! transactions by day and by calendar month, rolls amounts up by category,
//! and calculates period-over-period trends. Fetching, storage and rendering
//! are left to the caller, e.g. the `report` binary.

#![warn(missing_docs)]

pub mod aggregation;
pub mod cache;
mod category;
pub mod dashboard;
mod error;
pub mod preferences;
pub mod timezone;
pub mod transaction;
pub mod weekly;
pub mod window;

#[cfg(test)]
mod test_utils;

pub use aggregation::{
    CategoryTotals, DayBucket, MonthBucket, Totals, Trends, bucket_by_day, bucket_by_month,
    category_totals, compute_trend, totals,
};
pub use cache::{Cache, DEFAULT_MAX_CAPACITY, DEFAULT_TTL, TtlCache};
pub use category::normalize_category;
pub use dashboard::{DashboardSummary, MonthDetail, build_dashboard, month_details};
pub use error::Error;
pub use preferences::{Currency, DateFormat, UserPreferences};
pub use timezone::{LocalZone, resolve_local_zone};
pub use transaction::{Transaction, TransactionType, parse_transactions};
pub use weekly::{DetailFilter, WeeklySummary, build_weekly_summary, transactions_in_period};
pub use window::{Period, WeekStart, start_of_week, week_range};
