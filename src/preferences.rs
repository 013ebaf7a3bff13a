//! User display preferences: currency, date format and the first day of the week.
//!
//! Preferences are stored by the client as plain key/value strings. They are
//! parsed once into a [UserPreferences] value which is then passed explicitly
//! to whatever needs it.

use std::{fmt::Display, str::FromStr};

use numfmt::{Formatter, Precision};
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    window::{Period, WeekStart},
};

/// The key under which the currency code is stored.
pub const CURRENCY_KEY: &str = "currency";
/// The key under which the date format is stored.
pub const DATE_FORMAT_KEY: &str = "dateFormat";
/// The key under which the first day of the week is stored.
pub const WEEK_START_KEY: &str = "startingDay";

/// The currency amounts are displayed in. Only affects formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Currency {
    /// US dollars.
    #[default]
    #[serde(rename = "USD")]
    Usd,
    /// Euros.
    #[serde(rename = "EUR")]
    Eur,
    /// British pounds.
    #[serde(rename = "GBP")]
    Gbp,
    /// Japanese yen, shown without decimals.
    #[serde(rename = "JPY")]
    Jpy,
    /// Canadian dollars.
    #[serde(rename = "CAD")]
    Cad,
}

impl Currency {
    /// The ISO 4217 code, e.g. "USD".
    pub fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Jpy => "JPY",
            Self::Cad => "CAD",
        }
    }

    /// The symbol placed before amounts.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Eur => "€",
            Self::Gbp => "£",
            Self::Jpy => "¥",
            Self::Cad => "CA$",
        }
    }

    fn decimal_places(self) -> u8 {
        match self {
            Self::Jpy => 0,
            _ => 2,
        }
    }

    /// Format `amount` with the currency symbol and thousands separators.
    ///
    /// Negative amounts put the minus sign before the symbol, e.g. "-$12.50".
    pub fn format(self, amount: f64) -> String {
        let decimals = self.decimal_places();
        let amount = if decimals == 0 { amount.round() } else { amount };
        let symbol = self.symbol();

        if amount == 0.0 || !amount.is_finite() {
            // numfmt renders zero as "0", so spell it out.
            return pad_decimals(format!("{symbol}0"), decimals);
        }

        let prefix = if amount < 0.0 {
            format!("-{symbol}")
        } else {
            symbol.to_owned()
        };

        let formatted = match Formatter::currency(&prefix) {
            Ok(formatter) => formatter
                .precision(Precision::Decimals(decimals))
                .fmt_string(amount.abs()),
            Err(error) => {
                tracing::warn!("could not create currency formatter for {prefix:?}: {error:?}");
                format!("{prefix}{:.*}", usize::from(decimals), amount.abs())
            }
        };

        pad_decimals(formatted, decimals)
    }
}

/// Pad the fractional part of `formatted` with zeros to `decimals` digits.
///
/// numfmt omits trailing zeros, so "12.30" comes out as "12.3".
fn pad_decimals(mut formatted: String, decimals: u8) -> String {
    let decimals = usize::from(decimals);
    if decimals == 0 {
        return formatted;
    }

    let fraction_digits = match formatted.rfind('.') {
        Some(point) => formatted.len() - point - 1,
        None => {
            formatted.push('.');
            0
        }
    };

    for _ in fraction_digits..decimals {
        formatted.push('0');
    }

    formatted
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "JPY" => Ok(Self::Jpy),
            "CAD" => Ok(Self::Cad),
            _ => Err(Error::InvalidPreference {
                key: CURRENCY_KEY,
                value: s.to_owned(),
            }),
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// The layout dates are displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DateFormat {
    /// "01/15/2024"
    #[default]
    #[serde(rename = "MM/DD/YYYY")]
    MonthDayYear,
    /// "15/01/2024"
    #[serde(rename = "DD/MM/YYYY")]
    DayMonthYear,
    /// "2024-01-15"
    #[serde(rename = "YYYY-MM-DD")]
    YearMonthDay,
}

impl DateFormat {
    /// The pattern string this format is stored as.
    pub fn pattern(self) -> &'static str {
        match self {
            Self::MonthDayYear => "MM/DD/YYYY",
            Self::DayMonthYear => "DD/MM/YYYY",
            Self::YearMonthDay => "YYYY-MM-DD",
        }
    }

    /// Format `date` with zero padded days and months.
    pub fn format(self, date: Date) -> String {
        let year = date.year();
        let month = u8::from(date.month());
        let day = date.day();

        match self {
            Self::MonthDayYear => format!("{month:02}/{day:02}/{year}"),
            Self::DayMonthYear => format!("{day:02}/{month:02}/{year}"),
            Self::YearMonthDay => format!("{year}-{month:02}-{day:02}"),
        }
    }
}

impl FromStr for DateFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MM/DD/YYYY" => Ok(Self::MonthDayYear),
            "DD/MM/YYYY" => Ok(Self::DayMonthYear),
            "YYYY-MM-DD" => Ok(Self::YearMonthDay),
            _ => Err(Error::InvalidPreference {
                key: DATE_FORMAT_KEY,
                value: s.to_owned(),
            }),
        }
    }
}

impl Display for DateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.pattern())
    }
}

/// The display preferences of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UserPreferences {
    /// The currency amounts are shown in.
    pub currency: Currency,
    /// The layout of displayed dates.
    pub date_format: DateFormat,
    /// The first day of the week for weekly views.
    pub week_start: WeekStart,
}

impl UserPreferences {
    /// Read preferences from stored key/value pairs.
    ///
    /// Missing keys use the defaults (USD, MM/DD/YYYY, Monday). Values that
    /// are not recognised are logged and also replaced by the default, so a
    /// corrupted store never stops the views from rendering. Unknown keys
    /// are ignored.
    pub fn from_key_values<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut preferences = Self::default();

        for (key, value) in pairs {
            match key {
                CURRENCY_KEY => preferences.currency = parse_or_default(value),
                DATE_FORMAT_KEY => preferences.date_format = parse_or_default(value),
                WEEK_START_KEY => preferences.week_start = parse_or_default(value),
                _ => {}
            }
        }

        preferences
    }

    /// Format an amount in the preferred currency.
    pub fn format_currency(&self, amount: f64) -> String {
        self.currency.format(amount)
    }

    /// Format a date in the preferred layout.
    pub fn format_date(&self, date: Date) -> String {
        self.date_format.format(date)
    }

    /// Format a period as "<start date> - <end date>" in the preferred layout.
    pub fn format_period(&self, period: &Period) -> String {
        format!(
            "{} - {}",
            self.format_date(period.start_date()),
            self.format_date(period.end_date())
        )
    }
}

fn parse_or_default<T>(value: &str) -> T
where
    T: FromStr<Err = Error> + Default + Display,
{
    value.parse().unwrap_or_else(|error| {
        let fallback = T::default();
        tracing::warn!("{error}, using {fallback} instead");
        fallback
    })
}
