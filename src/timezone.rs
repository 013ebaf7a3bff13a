//! Resolves the local timezone used for calendar bucketing.

use std::fmt::Debug;

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone, Tz};

use crate::Error;

/// Get the UTC offset of `canonical_timezone` (e.g. "Pacific/Auckland") at the instant `at`.
///
/// Returns `None` if the timezone name is not recognised.
pub fn get_local_offset(canonical_timezone: &str, at: OffsetDateTime) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone).map(|tz| offset_in(tz, at))
}

fn offset_in(tz: &Tz, at: OffsetDateTime) -> UtcOffset {
    tz.get_offset_utc(&at).to_utc()
}

/// The timezone that defines "local time" for calendar days, weeks and months.
///
/// A named zone follows daylight saving, so instants on either side of a
/// clock change are converted with different offsets.
#[derive(Clone, Copy)]
pub enum LocalZone {
    /// The same offset at every instant.
    Fixed(UtcOffset),
    /// A zone from the IANA database.
    Named(&'static Tz),
}

impl LocalZone {
    /// Coordinated Universal Time.
    pub const UTC: Self = Self::Fixed(UtcOffset::UTC);

    /// Look up a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if the name is not a known timezone.
    pub fn named(canonical_timezone: &str) -> Result<Self, Error> {
        time_tz::timezones::get_by_name(canonical_timezone)
            .map(Self::Named)
            .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))
    }

    /// The UTC offset in effect at `instant`.
    pub fn offset_at(self, instant: OffsetDateTime) -> UtcOffset {
        match self {
            Self::Fixed(offset) => offset,
            Self::Named(tz) => offset_in(tz, instant),
        }
    }

    /// Express `instant` in local time.
    ///
    /// # Errors
    /// Returns [Error::DateOutOfRange] if the local time cannot be represented.
    pub fn to_local(self, instant: OffsetDateTime) -> Result<OffsetDateTime, Error> {
        instant
            .checked_to_offset(self.offset_at(instant))
            .ok_or(Error::DateOutOfRange)
    }

    /// The local calendar date of `instant`.
    pub fn local_date(self, instant: OffsetDateTime) -> Option<Date> {
        self.to_local(instant).ok().map(|local| local.date())
    }

    /// The instant at which `date` begins in local time.
    ///
    /// The offset is looked up twice because the offset at the UTC reading of
    /// midnight may differ from the offset at local midnight near a clock change.
    pub fn midnight(self, date: Date) -> OffsetDateTime {
        let local_midnight = date.midnight();
        let guess = local_midnight.assume_offset(self.offset_at(local_midnight.assume_utc()));

        local_midnight.assume_offset(self.offset_at(guess))
    }
}

impl Debug for LocalZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(offset) => f.debug_tuple("Fixed").field(offset).finish(),
            Self::Named(tz) => f.debug_tuple("Named").field(&tz.name()).finish(),
        }
    }
}

impl PartialEq for LocalZone {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Fixed(left), Self::Fixed(right)) => left == right,
            (Self::Named(left), Self::Named(right)) => left.name() == right.name(),
            _ => false,
        }
    }
}

impl From<UtcOffset> for LocalZone {
    fn from(offset: UtcOffset) -> Self {
        Self::Fixed(offset)
    }
}

/// Resolve the timezone that defines "local time" for one aggregation pass.
///
/// If `canonical_timezone` is given it must be a valid, canonical timezone
/// name. Otherwise the offset reported by the operating system at `at` is
/// used for every instant, falling back to UTC on platforms where it cannot
/// be determined.
///
/// # Errors
/// Returns [Error::InvalidTimezoneError] if `canonical_timezone` is not a known timezone.
pub fn resolve_local_zone(
    canonical_timezone: Option<&str>,
    at: OffsetDateTime,
) -> Result<LocalZone, Error> {
    match canonical_timezone {
        Some(name) => LocalZone::named(name),
        None => Ok(LocalZone::Fixed(UtcOffset::local_offset_at(at).unwrap_or_else(
            |error| {
                tracing::warn!("could not determine the system UTC offset, using UTC: {error}");
                UtcOffset::UTC
            },
        ))),
    }
}
