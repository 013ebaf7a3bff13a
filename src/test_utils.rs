//! Transaction fixtures shared by the unit tests.

use time::OffsetDateTime;

use crate::transaction::{Transaction, TransactionType};

pub fn income(amount: f64, date: OffsetDateTime) -> Transaction {
    Transaction::new(TransactionType::Income, amount, date)
}

pub fn expense(amount: f64, date: OffsetDateTime) -> Transaction {
    Transaction::new(TransactionType::Expense, amount, date)
}

/// A transaction whose stored date could not be parsed.
pub fn undated(kind: TransactionType, amount: f64) -> Transaction {
    Transaction {
        date: None,
        ..Transaction::new(kind, amount, OffsetDateTime::UNIX_EPOCH)
    }
}
