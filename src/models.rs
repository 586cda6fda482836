//! Core data models for the bank assistant

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Account =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccountType {
    Savings,
    Current,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountProfile {
    pub name: String,
    pub number: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub balance: Decimal,
}

/// One line of the account statement. Amount is signed: debits are negative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    #[serde(rename = "desc")]
    pub description: String,
    pub amount: Decimal,
}

/// Statement line with the running balance derived at read time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatementLine {
    #[serde(flatten)]
    pub record: TransactionRecord,
    pub balance: Decimal,
}

//
// ================= Catalog =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CardStatus {
    Active,
    Blocked,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Card {
    pub status: CardStatus,
    pub last4: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cards {
    pub debit: Card,
    pub credit: Card,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoanOffer {
    #[serde(rename = "type")]
    pub loan_type: String,
    pub rate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Branch {
    pub city: String,
    pub name: String,
    pub address: String,
    pub ifsc: String,
}

//
// ================= Conversation =================
//

/// A recognized entity: the matched text and its label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entity {
    pub value: String,
    pub label: String,
}

impl Entity {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// The outcome of one chat turn
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub reply: String,
    pub intent: String,
}

impl Turn {
    pub fn new(reply: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            intent: intent.into(),
        }
    }
}

/// A persisted interaction log row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionEntry {
    pub id: i64,
    pub user_message: String,
    pub intent: String,
    /// Entities serialized as a JSON array of `{value, label}` objects
    pub entities: String,
    pub bot_response: String,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccountType::Savings => "Savings",
            AccountType::Current => "Current",
        };
        write!(f, "{}", s)
    }
}
