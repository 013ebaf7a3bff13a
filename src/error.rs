//! Defines the crate level error type.

/// The errors that may occur while aggregating transactions.
///
/// Problems with individual records (a missing amount, an unparseable date)
/// are not errors. Those records are coerced or skipped during parsing and
/// aggregation carries on with the rest of the data.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The transaction payload was valid JSON but not a list of records.
    ///
    /// This indicates that the collaborator that fetched the transactions
    /// broke its contract, e.g. it returned an object or an array of numbers.
    #[error("invalid transaction data: {0}")]
    InvalidInput(String),

    /// The transaction payload could not be parsed as JSON at all.
    #[error("could not parse transaction JSON: {0}")]
    InvalidJson(String),

    /// A preference value was not one of the supported options.
    #[error("invalid {key} preference \"{value}\"")]
    InvalidPreference {
        /// The preference key, e.g. "currency".
        key: &'static str,
        /// The rejected value.
        value: String,
    },

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Date arithmetic went past the range of dates that can be represented.
    #[error("the requested date is outside the supported range")]
    DateOutOfRange,
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::InvalidJson(value.to_string())
    }
}
