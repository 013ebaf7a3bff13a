//! Transaction aggregation for charts and summary cards.
//!
//! Provides functions to bucket transactions by day and by month, roll up
//! amounts by category, and calculate period-over-period trends. Every
//! function is pure: it reads the transaction slice, never modifies it, and
//! returns the same output for the same input.

use std::collections::{BTreeMap, btree_map::Entry};

use serde::Serialize;
use time::{Date, Duration, Month};

use crate::{
    category::normalize_category,
    timezone::LocalZone,
    transaction::{Transaction, TransactionType},
    window::{Period, WeekStart, month_abbrev, weekday_name},
};

/// Summed amounts keyed by normalized category name.
pub type CategoryTotals = BTreeMap<String, f64>;

/// Income, expenses and their difference over some set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    /// The sum of income amounts.
    pub income: f64,
    /// The sum of expense amounts.
    pub expenses: f64,
    /// Income minus expenses.
    pub balance: f64,
}

impl Totals {
    /// Add a transaction's amount to the income or expense total.
    pub fn add(&mut self, transaction: &Transaction) {
        match transaction.kind {
            TransactionType::Income => self.income += transaction.amount,
            TransactionType::Expense => self.expenses += transaction.amount,
        }
        self.balance = self.income - self.expenses;
    }
}

/// The totals for one calendar day of a week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayBucket {
    /// The English name of the weekday, e.g. "Monday".
    pub day_name: &'static str,
    /// The local calendar date.
    pub date: Date,
    /// The sum of income on this day.
    pub income: f64,
    /// The sum of expenses on this day.
    pub expenses: f64,
    /// Income minus expenses on this day.
    pub balance: f64,
}

/// The totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    /// The short month and year, e.g. "Jan 2024".
    pub label: String,
    /// The calendar year.
    pub year: i32,
    /// The calendar month.
    pub month: Month,
    /// The sum of income in this month.
    pub income: f64,
    /// The sum of expenses in this month.
    pub expenses: f64,
    /// Income minus expenses in this month.
    pub balance: f64,
    /// The cumulative balance of this month and every month before it.
    pub running_balance: f64,
}

impl MonthBucket {
    /// The month's income, expenses and balance without the running balance.
    pub fn totals(&self) -> Totals {
        Totals {
            income: self.income,
            expenses: self.expenses,
            balance: self.balance,
        }
    }
}

/// Percent changes between two adjacent periods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Trends {
    /// Percent change in income.
    pub income: f64,
    /// Percent change in expenses. Positive means spending went up.
    pub expenses: f64,
    /// Percent change in balance.
    pub balance: f64,
}

impl Trends {
    /// Calculate the trends from the `previous` period to the `current` one.
    pub fn between(current: &Totals, previous: &Totals) -> Self {
        Self {
            income: compute_trend(current.income, previous.income),
            expenses: compute_trend(current.expenses, previous.expenses),
            balance: compute_trend(current.balance, previous.balance),
        }
    }
}

/// Sum income and expenses, optionally only for transactions inside `period`.
///
/// Transactions without a date are counted when there is no period.
pub fn totals(transactions: &[Transaction], period: Option<&Period>) -> Totals {
    let mut totals = Totals::default();

    for transaction in transactions
        .iter()
        .filter(|transaction| in_period(transaction, period))
    {
        totals.add(transaction);
    }

    totals
}

/// Split the transactions in `week` into seven daily buckets.
///
/// The buckets are ordered and named starting from `week_start`, which should
/// be the convention `week` was created with. A transaction is placed by its
/// calendar date in `zone`, which should be the zone `week` was created in.
/// Transactions outside the week or without a date are ignored.
pub fn bucket_by_day(
    transactions: &[Transaction],
    week: &Period,
    week_start: WeekStart,
    zone: LocalZone,
) -> Vec<DayBucket> {
    let first_day = week.start_date();

    if first_day.weekday() != week_start.weekday() {
        tracing::warn!(
            "week starting {first_day} does not start on {week_start}, day labels may not match dates"
        );
    }

    let mut days: Vec<DayBucket> = week_start
        .ordered_weekdays()
        .into_iter()
        .zip(0..)
        .map(|(weekday, index)| DayBucket {
            day_name: weekday_name(weekday),
            date: first_day.saturating_add(Duration::days(index)),
            income: 0.0,
            expenses: 0.0,
            balance: 0.0,
        })
        .collect();

    for transaction in transactions {
        let Some(date) = transaction.date.filter(|date| week.contains(*date)) else {
            continue;
        };

        let Some(local_date) = zone.local_date(date) else {
            continue;
        };
        let index = (local_date - first_day).whole_days();
        let Some(day) = usize::try_from(index).ok().and_then(|index| days.get_mut(index)) else {
            continue;
        };

        match transaction.kind {
            TransactionType::Income => day.income += transaction.amount,
            TransactionType::Expense => day.expenses += transaction.amount,
        }
        day.balance = day.income - day.expenses;
    }

    days
}

/// Aggregate all transactions into calendar months in ascending order.
///
/// Months are taken from each transaction's calendar date in `zone`. Only
/// months that contain at least one transaction are returned. Transactions
/// without a date are ignored.
pub fn bucket_by_month(transactions: &[Transaction], zone: LocalZone) -> Vec<MonthBucket> {
    let mut months: BTreeMap<(i32, u8), Totals> = BTreeMap::new();

    for transaction in transactions {
        let Some(local_date) = transaction.date.and_then(|date| zone.local_date(date)) else {
            continue;
        };

        months
            .entry((local_date.year(), local_date.month() as u8))
            .or_default()
            .add(transaction);
    }

    let mut running_balance = 0.0;

    months
        .into_iter()
        .filter_map(|((year, month_number), totals)| {
            let month = Month::try_from(month_number).ok()?;
            running_balance += totals.balance;

            Some(MonthBucket {
                label: format!("{} {year}", month_abbrev(month)),
                year,
                month,
                income: totals.income,
                expenses: totals.expenses,
                balance: totals.balance,
                running_balance,
            })
        })
        .collect()
}

/// Sum the amounts of transactions of type `kind` per normalized category.
///
/// Category labels that only differ by case or surrounding whitespace are
/// summed together, see [normalize_category]. If `period` is given, only
/// transactions inside it are counted.
pub fn category_totals(
    transactions: &[Transaction],
    kind: TransactionType,
    period: Option<&Period>,
) -> CategoryTotals {
    let mut totals = CategoryTotals::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.kind == kind && in_period(transaction, period))
    {
        match totals.entry(normalize_category(&transaction.category)) {
            Entry::Occupied(mut entry) => *entry.get_mut() += transaction.amount,
            Entry::Vacant(entry) => {
                entry.insert(transaction.amount);
            }
        }
    }

    totals
}

/// Calculate the percent change from `previous` to `current`, rounded to one decimal place.
///
/// If `previous` is zero (or not a finite number) the result is 0 rather
/// than infinite growth. The sign is never inverted: for expenses a positive
/// value means spending went up.
pub fn compute_trend(current: f64, previous: f64) -> f64 {
    if previous == 0.0 || !previous.is_finite() {
        return 0.0;
    }

    let percent = ((current - previous) / previous) * 100.0;
    let rounded = (percent * 10.0).round() / 10.0;

    if rounded.is_finite() {
        // Avoid "-0.0" for changes that round away.
        rounded + 0.0
    } else {
        0.0
    }
}

fn in_period(transaction: &Transaction, period: Option<&Period>) -> bool {
    match period {
        Some(period) => transaction
            .date
            .is_some_and(|date| period.contains(date)),
        None => true,
    }
}
