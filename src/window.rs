//! Calendar period helpers: week boundaries under a configurable week start,
//! month and day periods, and locale independent labels.

use std::{fmt::Display, str::FromStr};

use serde::Serialize;
use time::{Date, Duration, Month, OffsetDateTime, Weekday};

use crate::{Error, preferences::WEEK_START_KEY, timezone::LocalZone};

/// The day that is considered the first day of a calendar week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum WeekStart {
    /// Weeks run Sunday to Saturday.
    Sunday,
    /// Weeks run Monday to Sunday.
    #[default]
    Monday,
    /// Weeks run Saturday to Friday.
    Saturday,
}

impl WeekStart {
    /// The weekday that starts the week.
    pub fn weekday(self) -> Weekday {
        match self {
            Self::Sunday => Weekday::Sunday,
            Self::Monday => Weekday::Monday,
            Self::Saturday => Weekday::Saturday,
        }
    }

    /// The seven weekdays in the order they appear in a week.
    pub fn ordered_weekdays(self) -> [Weekday; 7] {
        let first = self.weekday();
        [
            first,
            first.nth_next(1),
            first.nth_next(2),
            first.nth_next(3),
            first.nth_next(4),
            first.nth_next(5),
            first.nth_next(6),
        ]
    }

    /// How many days `weekday` is after the start of its week, in `0..7`.
    fn days_since_start(self, weekday: Weekday) -> i64 {
        let day_index = i64::from(weekday.number_days_from_sunday());
        let start_index = i64::from(self.weekday().number_days_from_sunday());

        (day_index - start_index).rem_euclid(7)
    }
}

impl FromStr for WeekStart {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sunday" => Ok(Self::Sunday),
            "monday" => Ok(Self::Monday),
            "saturday" => Ok(Self::Saturday),
            _ => Err(Error::InvalidPreference {
                key: WEEK_START_KEY,
                value: s.to_owned(),
            }),
        }
    }
}

impl Display for WeekStart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(weekday_name(self.weekday()))
    }
}

/// An inclusive range of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    /// The first instant in the period.
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    /// The last instant in the period.
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

impl Period {
    /// Whether `instant` falls inside the period, including both ends.
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// The local calendar date on which the period starts.
    pub fn start_date(&self) -> Date {
        self.start.date()
    }

    /// The local calendar date on which the period ends.
    pub fn end_date(&self) -> Date {
        self.end.date()
    }
}

/// Get local midnight on the first day of the week containing `date`.
///
/// The weekday and the midnight are both taken in local time, so the result
/// carries the offset in effect at the start of the week.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the start of the week cannot be represented.
pub fn start_of_week(
    date: OffsetDateTime,
    week_start: WeekStart,
    zone: LocalZone,
) -> Result<OffsetDateTime, Error> {
    let first_day = first_day_of_week(zone.to_local(date)?.date(), week_start)?;

    Ok(zone.midnight(first_day))
}

fn first_day_of_week(date: Date, week_start: WeekStart) -> Result<Date, Error> {
    date.checked_sub(Duration::days(week_start.days_since_start(date.weekday())))
        .ok_or(Error::DateOutOfRange)
}

/// Get the week `week_offset` weeks away from the week containing `reference`.
///
/// An offset of 0 is the week containing `reference`, -1 the week before it.
/// The period starts at local midnight on the first day of the week and ends
/// one millisecond before local midnight seven days later, so consecutive
/// offsets tile the calendar. A week with a daylight saving change is an
/// hour longer or shorter than seven days.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the week cannot be represented.
pub fn week_range(
    reference: OffsetDateTime,
    week_offset: i32,
    week_start: WeekStart,
    zone: LocalZone,
) -> Result<Period, Error> {
    let first_day = first_day_of_week(zone.to_local(reference)?.date(), week_start)?
        .checked_add(Duration::weeks(i64::from(week_offset)))
        .ok_or(Error::DateOutOfRange)?;
    let next_first_day = first_day
        .checked_add(Duration::weeks(1))
        .ok_or(Error::DateOutOfRange)?;

    local_span(first_day, next_first_day, zone)
}

/// Get the calendar month `year`-`month` in local time.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the month cannot be represented.
pub fn month_period(year: i32, month: Month, zone: LocalZone) -> Result<Period, Error> {
    let first_day = Date::from_calendar_date(year, month, 1).map_err(|_| Error::DateOutOfRange)?;
    let next_month_year = if month == Month::December {
        year + 1
    } else {
        year
    };
    let next_first_day = Date::from_calendar_date(next_month_year, month.next(), 1)
        .map_err(|_| Error::DateOutOfRange)?;

    local_span(first_day, next_first_day, zone)
}

/// Get the whole of the local calendar day `date`.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the day cannot be represented.
pub fn day_period(date: Date, zone: LocalZone) -> Result<Period, Error> {
    let next_day = date.next_day().ok_or(Error::DateOutOfRange)?;

    local_span(date, next_day, zone)
}

/// From local midnight on `first_day` up to just before local midnight on `next_first_day`.
fn local_span(first_day: Date, next_first_day: Date, zone: LocalZone) -> Result<Period, Error> {
    let start = zone.midnight(first_day);
    let end = zone
        .midnight(next_first_day)
        .checked_sub(Duration::milliseconds(1))
        .ok_or(Error::DateOutOfRange)?;

    Ok(Period { start, end })
}

/// The three letter English abbreviation of `month`, e.g. "Jan".
pub fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

/// The full English name of `month`, e.g. "January".
pub fn month_name(month: Month) -> &'static str {
    match month {
        Month::January => "January",
        Month::February => "February",
        Month::March => "March",
        Month::April => "April",
        Month::May => "May",
        Month::June => "June",
        Month::July => "July",
        Month::August => "August",
        Month::September => "September",
        Month::October => "October",
        Month::November => "November",
        Month::December => "December",
    }
}

/// The full English name of `weekday`, e.g. "Monday".
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "Monday",
        Weekday::Tuesday => "Tuesday",
        Weekday::Wednesday => "Wednesday",
        Weekday::Thursday => "Thursday",
        Weekday::Friday => "Friday",
        Weekday::Saturday => "Saturday",
        Weekday::Sunday => "Sunday",
    }
}
