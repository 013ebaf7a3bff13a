//! The transaction record consumed by the aggregator and the lenient parser
//! that builds it from the `GET /transactions` JSON payload.

use std::fmt::Display;

use serde::Serialize;
use serde_json::{Map, Value};
use time::{
    Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description,
};

use crate::Error;

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The value used for this type in transaction payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single income or expense record.
///
/// Transactions are owned by the persistence layer; the aggregator only ever
/// reads them. Fields that were missing or malformed in the payload have
/// already been coerced (see [parse_transactions]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// Opaque identifier assigned by the persistence layer.
    pub id: String,
    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The category label exactly as stored, empty if it was missing.
    pub category: String,
    /// The amount in the user's currency. Zero if the stored amount was not a number.
    pub amount: f64,
    /// Optional free text.
    pub description: Option<String>,
    /// When the transaction happened, `None` if the stored date could not be parsed.
    #[serde(with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
    /// The user that owns the transaction.
    pub owner: Option<String>,
}

impl Transaction {
    /// Create a transaction with an empty category and no description.
    pub fn new(kind: TransactionType, amount: f64, date: OffsetDateTime) -> Self {
        Self {
            id: String::new(),
            kind,
            category: String::new(),
            amount,
            description: None,
            date: Some(date),
            owner: None,
        }
    }

    /// Set the category label.
    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_owned();
        self
    }

    /// Set the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }

    /// Set the ID.
    pub fn id(mut self, id: &str) -> Self {
        self.id = id.to_owned();
        self
    }

    /// Whether this transaction is income.
    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }
}

/// Parse the JSON array returned by `GET /transactions`.
///
/// Individual records are parsed leniently:
/// - `amount` may be a number or a numeric string, anything else becomes `0`,
/// - `date` may be an RFC 3339 string, a `YYYY-MM-DD` string (midnight UTC)
///   or epoch milliseconds, anything else leaves the date empty,
/// - `type` other than "income" is treated as an expense,
/// - a missing or non-string `category` becomes the empty string.
///
/// # Errors
/// Returns an [Error::InvalidJson] if `json` is not valid JSON, or an
/// [Error::InvalidInput] if it is not an array of objects.
pub fn parse_transactions(json: &str) -> Result<Vec<Transaction>, Error> {
    let value: Value = serde_json::from_str(json)?;
    transactions_from_value(value)
}

/// Build transactions from an already parsed JSON value.
///
/// See [parse_transactions] for the coercion rules.
///
/// # Errors
/// Returns an [Error::InvalidInput] if `value` is not an array of objects.
pub fn transactions_from_value(value: Value) -> Result<Vec<Transaction>, Error> {
    let records = match value {
        Value::Array(records) => records,
        other => {
            return Err(Error::InvalidInput(format!(
                "expected an array of transactions, got {}",
                json_type_name(&other)
            )));
        }
    };

    let mut coerced_count = 0;
    let transactions = records
        .iter()
        .enumerate()
        .map(|(index, record)| match record {
            Value::Object(fields) => {
                let (transaction, coerced) = transaction_from_fields(fields);
                if coerced {
                    coerced_count += 1;
                }
                Ok(transaction)
            }
            other => Err(Error::InvalidInput(format!(
                "transaction {index} should be an object, got {}",
                json_type_name(other)
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if coerced_count > 0 {
        tracing::debug!(
            "coerced malformed fields in {coerced_count} of {} transactions",
            transactions.len()
        );
    }

    Ok(transactions)
}

/// Returns the transaction and whether any field had to be coerced.
fn transaction_from_fields(fields: &Map<String, Value>) -> (Transaction, bool) {
    let id = match fields.get("id").or_else(|| fields.get("_id")) {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => String::new(),
    };

    let kind = match fields.get("type").and_then(Value::as_str) {
        Some(kind) if kind.trim().eq_ignore_ascii_case("income") => TransactionType::Income,
        _ => TransactionType::Expense,
    };

    let category = fields.get("category").and_then(Value::as_str);
    let amount = fields.get("amount").and_then(coerce_amount);
    let date = fields.get("date").and_then(coerce_date);

    let coerced = category.is_none() || amount.is_none() || date.is_none();

    let transaction = Transaction {
        id,
        kind,
        category: category.unwrap_or_default().to_owned(),
        amount: amount.unwrap_or(0.0),
        description: fields
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_owned),
        date,
        owner: fields.get("owner").and_then(Value::as_str).map(str::to_owned),
    };

    (transaction, coerced)
}

fn coerce_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    amount.is_finite().then_some(amount)
}

fn coerce_date(value: &Value) -> Option<OffsetDateTime> {
    match value {
        Value::String(text) => parse_date_string(text.trim()),
        Value::Number(millis) => {
            let millis = millis.as_i64()?;
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
        }
        _ => None,
    }
}

fn parse_date_string(text: &str) -> Option<OffsetDateTime> {
    if let Ok(date_time) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(date_time);
    }

    // ISO date-only strings are midnight UTC.
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::{Transaction, TransactionType, parse_transactions};
    use crate::Error;

    #[test]
    fn parsed_record_matches_built_transaction() {
        let json = r#"[{
            "id": "t1",
            "type": "expense",
            "category": "Food",
            "amount": 12.5,
            "description": "Lunch",
            "date": "2024-01-15T12:00:00Z"
        }]"#;

        let parsed = parse_transactions(json).unwrap();

        let want = Transaction::new(
            TransactionType::Expense,
            12.5,
            datetime!(2024-01-15 12:00 UTC),
        )
        .id("t1")
        .category("Food")
        .description("Lunch");
        assert_eq!(parsed, vec![want]);
        assert!(!parsed[0].is_income());
    }

    #[test]
    fn parses_well_formed_records() {
        let json = r#"[
            {
                "_id": "65a1",
                "type": "income",
                "category": "Salary",
                "amount": 1000,
                "description": "January pay",
                "date": "2024-01-15T09:30:00.000Z",
                "owner": "user-1"
            }
        ]"#;

        let transactions = parse_transactions(json).unwrap();

        assert_eq!(transactions.len(), 1);
        let transaction = &transactions[0];
        assert_eq!(transaction.id, "65a1");
        assert_eq!(transaction.kind, TransactionType::Income);
        assert_eq!(transaction.category, "Salary");
        assert_eq!(transaction.amount, 1000.0);
        assert_eq!(transaction.description.as_deref(), Some("January pay"));
        assert_eq!(transaction.date, Some(datetime!(2024-01-15 09:30 UTC)));
        assert_eq!(transaction.owner.as_deref(), Some("user-1"));
    }

    #[test]
    fn coerces_numeric_string_amounts() {
        let json = r#"[{"type": "expense", "amount": " 12.50 ", "date": "2024-01-15"}]"#;

        let transactions = parse_transactions(json).unwrap();

        assert_eq!(transactions[0].amount, 12.5);
    }

    #[test]
    fn malformed_amounts_become_zero() {
        let json = r#"[
            {"type": "expense", "amount": "twelve", "date": "2024-01-15"},
            {"type": "expense", "amount": null, "date": "2024-01-15"},
            {"type": "expense", "date": "2024-01-15"},
            {"type": "expense", "amount": [1], "date": "2024-01-15"}
        ]"#;

        let transactions = parse_transactions(json).unwrap();

        assert_eq!(transactions.len(), 4);
        assert!(transactions.iter().all(|t| t.amount == 0.0));
    }

    #[test]
    fn date_only_strings_are_midnight_utc() {
        let json = r#"[{"type": "income", "amount": 1, "date": "2024-02-29"}]"#;

        let transactions = parse_transactions(json).unwrap();

        assert_eq!(transactions[0].date, Some(datetime!(2024-02-29 00:00 UTC)));
    }

    #[test]
    fn parses_offset_dates_and_epoch_millis() {
        let json = r#"[
            {"type": "income", "amount": 1, "date": "2024-01-15T10:00:00+13:00"},
            {"type": "income", "amount": 1, "date": 1705312800000}
        ]"#;

        let transactions = parse_transactions(json).unwrap();

        assert_eq!(transactions[0].date, Some(datetime!(2024-01-14 21:00 UTC)));
        assert_eq!(transactions[1].date, Some(datetime!(2024-01-15 10:00 UTC)));
    }

    #[test]
    fn unparseable_dates_are_left_empty() {
        let json = r#"[
            {"type": "income", "amount": 1, "date": "next tuesday"},
            {"type": "income", "amount": 1}
        ]"#;

        let transactions = parse_transactions(json).unwrap();

        assert_eq!(transactions[0].date, None);
        assert_eq!(transactions[1].date, None);
    }

    #[test]
    fn missing_category_becomes_empty_string() {
        let json = r#"[
            {"type": "income", "amount": 1, "date": "2024-01-15"},
            {"type": "income", "amount": 1, "date": "2024-01-15", "category": 42}
        ]"#;

        let transactions = parse_transactions(json).unwrap();

        assert_eq!(transactions[0].category, "");
        assert_eq!(transactions[1].category, "");
    }

    #[test]
    fn unknown_types_are_expenses() {
        let json = r#"[
            {"type": "INCOME", "amount": 1, "date": "2024-01-15"},
            {"type": "refund", "amount": 1, "date": "2024-01-15"},
            {"amount": 1, "date": "2024-01-15"}
        ]"#;

        let transactions = parse_transactions(json).unwrap();

        assert_eq!(transactions[0].kind, TransactionType::Income);
        assert_eq!(transactions[1].kind, TransactionType::Expense);
        assert_eq!(transactions[2].kind, TransactionType::Expense);
    }

    #[test]
    fn numeric_ids_are_stringified() {
        let json = r#"[{"id": 7, "type": "income", "amount": 1, "date": "2024-01-15"}]"#;

        let transactions = parse_transactions(json).unwrap();

        assert_eq!(transactions[0].id, "7");
    }

    #[test]
    fn empty_array_gives_no_transactions() {
        assert!(parse_transactions("[]").unwrap().is_empty());
    }

    #[test]
    fn non_array_payload_is_invalid_input() {
        let result = parse_transactions(r#"{"transactions": []}"#);

        assert!(
            matches!(result, Err(Error::InvalidInput(_))),
            "want InvalidInput, got {result:?}"
        );
    }

    #[test]
    fn non_object_record_is_invalid_input() {
        let result = parse_transactions(r#"[{"type": "income", "amount": 1}, 5]"#);

        assert!(
            matches!(result, Err(Error::InvalidInput(ref message)) if message.contains("transaction 1")),
            "want InvalidInput for record 1, got {result:?}"
        );
    }

    #[test]
    fn invalid_json_is_reported() {
        let result = parse_transactions("[{");

        assert!(
            matches!(result, Err(Error::InvalidJson(_))),
            "want InvalidJson, got {result:?}"
        );
    }
}
