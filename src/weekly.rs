//! The weekly view: daily breakdown of one week, week-over-week trends,
//! week navigation and transaction drill-down.

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    aggregation::{DayBucket, Totals, Trends, bucket_by_day, totals},
    timezone::LocalZone,
    transaction::Transaction,
    window::{Period, WeekStart, week_range},
};

/// Everything the weekly view needs for one week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    /// How many weeks this week is from the current week, 0 or negative.
    pub week_offset: i32,
    /// The week being summarised.
    pub week: Period,
    /// The seven days of the week in display order.
    pub days: Vec<DayBucket>,
    /// Totals for the week.
    pub totals: Totals,
    /// Totals for the week before.
    pub previous_totals: Totals,
    /// The change from the previous week to this week.
    pub trends: Trends,
}

impl WeeklySummary {
    /// The offset of the week before this one.
    pub fn previous_offset(&self) -> i32 {
        self.week_offset.saturating_sub(1)
    }

    /// The offset of the week after this one, `None` if this is the current week.
    pub fn next_offset(&self) -> Option<i32> {
        let next = self.week_offset.checked_add(1)?;
        (next <= 0).then_some(next)
    }
}

/// Which transactions to show when drilling into a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailFilter {
    /// Income and expenses.
    #[default]
    All,
    /// Only income.
    Income,
    /// Only expenses.
    Expenses,
}

impl DetailFilter {
    fn accepts(self, transaction: &Transaction) -> bool {
        match self {
            Self::All => true,
            Self::Income => transaction.is_income(),
            Self::Expenses => !transaction.is_income(),
        }
    }
}

/// Summarise the week `week_offset` weeks from the week containing `reference`.
///
/// `reference` is the captured "now" for this pass. It is used for both this
/// week and the previous week, so the two never disagree about where the
/// week boundaries are. Days and weeks begin at local midnight in `zone`.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if either week cannot be represented.
pub fn build_weekly_summary(
    transactions: &[Transaction],
    reference: OffsetDateTime,
    week_offset: i32,
    week_start: WeekStart,
    zone: LocalZone,
) -> Result<WeeklySummary, Error> {
    let week = week_range(reference, week_offset, week_start, zone)?;
    let previous_week = week_range(
        reference,
        week_offset.checked_sub(1).ok_or(Error::DateOutOfRange)?,
        week_start,
        zone,
    )?;

    let days = bucket_by_day(transactions, &week, week_start, zone);
    let week_totals = totals(transactions, Some(&week));
    let previous_totals = totals(transactions, Some(&previous_week));

    Ok(WeeklySummary {
        week_offset,
        week,
        days,
        totals: week_totals,
        previous_totals,
        trends: Trends::between(&week_totals, &previous_totals),
    })
}

/// Get the transactions inside `period` that pass `filter`, in input order.
pub fn transactions_in_period<'a>(
    transactions: &'a [Transaction],
    period: &Period,
    filter: DetailFilter,
) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|transaction| {
            transaction.date.is_some_and(|date| period.contains(date)) && filter.accepts(transaction)
        })
        .collect()
}
