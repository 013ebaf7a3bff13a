//! Dashboard summaries: all-time totals, category breakdowns, monthly
//! history with month-over-month trends, and per-month detail.

use std::cmp::Reverse;

use serde::Serialize;
use time::Month;

use crate::{
    Error,
    aggregation::{
        CategoryTotals, MonthBucket, Totals, Trends, bucket_by_month, category_totals, totals,
    },
    timezone::LocalZone,
    transaction::{Transaction, TransactionType},
    window::{Period, month_name, month_period},
};

/// How many transactions are shown in the recent transactions list.
pub const RECENT_TRANSACTION_COUNT: usize = 5;

/// Everything the dashboard overview needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// Totals over the whole history.
    pub totals: Totals,
    /// Income per category over the whole history.
    pub income_by_category: CategoryTotals,
    /// Expenses per category over the whole history.
    pub expenses_by_category: CategoryTotals,
    /// One bucket per month with transactions, oldest first.
    pub months: Vec<MonthBucket>,
    /// The change from the month before the latest month to the latest month.
    pub trends: Trends,
    /// The most recent transactions, newest first.
    pub recent_transactions: Vec<Transaction>,
}

/// The breakdown of a single month for the dashboard detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthDetail {
    /// The full month and year, e.g. "January 2024".
    pub label: String,
    /// The whole month in local time.
    pub period: Period,
    /// Totals for the month.
    pub totals: Totals,
    /// Income per category for the month.
    pub income_by_category: CategoryTotals,
    /// Expenses per category for the month.
    pub expenses_by_category: CategoryTotals,
}

/// Build the dashboard overview, bucketing by calendar month in `zone`.
pub fn build_dashboard(transactions: &[Transaction], zone: LocalZone) -> DashboardSummary {
    let months = bucket_by_month(transactions, zone);
    let trends = month_over_month_trends(&months);

    DashboardSummary {
        totals: totals(transactions, None),
        income_by_category: category_totals(transactions, TransactionType::Income, None),
        expenses_by_category: category_totals(transactions, TransactionType::Expense, None),
        months,
        trends,
        recent_transactions: recent_transactions(transactions, RECENT_TRANSACTION_COUNT),
    }
}

/// Break down each month with transactions, newest month first.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if a month period cannot be represented.
pub fn month_details(
    transactions: &[Transaction],
    zone: LocalZone,
) -> Result<Vec<MonthDetail>, Error> {
    bucket_by_month(transactions, zone)
        .into_iter()
        .rev()
        .map(|bucket| -> Result<MonthDetail, Error> {
            let period = month_period(bucket.year, bucket.month, zone)?;

            Ok(MonthDetail {
                label: format!("{} {}", month_name(bucket.month), bucket.year),
                period,
                totals: bucket.totals(),
                income_by_category: category_totals(
                    transactions,
                    TransactionType::Income,
                    Some(&period),
                ),
                expenses_by_category: category_totals(
                    transactions,
                    TransactionType::Expense,
                    Some(&period),
                ),
            })
        })
        .collect()
}

/// Get up to `count` dated transactions, newest first.
///
/// Transactions on the same instant keep their input order.
pub fn recent_transactions(transactions: &[Transaction], count: usize) -> Vec<Transaction> {
    let mut dated: Vec<&Transaction> = transactions
        .iter()
        .filter(|transaction| transaction.date.is_some())
        .collect();
    dated.sort_by_key(|transaction| Reverse(transaction.date));

    dated.into_iter().take(count).cloned().collect()
}

/// Compare the latest month against the calendar month just before it.
///
/// A previous month with no transactions has zero totals, so its trends are 0.
fn month_over_month_trends(months: &[MonthBucket]) -> Trends {
    let Some((latest, earlier)) = months.split_last() else {
        return Trends::default();
    };

    let (previous_year, previous_month) = previous_month(latest.year, latest.month);
    let previous = earlier
        .last()
        .filter(|bucket| bucket.year == previous_year && bucket.month == previous_month)
        .map(MonthBucket::totals)
        .unwrap_or_default();

    Trends::between(&latest.totals(), &previous)
}

fn previous_month(year: i32, month: Month) -> (i32, Month) {
    if month == Month::January {
        (year - 1, Month::December)
    } else {
        (year, month.previous())
    }
}
