//! Error types for the bank assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, BankError>;

#[derive(Error, Debug)]
pub enum BankError {

    // =============================
    // Core Errors
    // =============================

    #[error("Classifier error: {0}")]
    ClassifierError(String),

    #[error("Training data error: {0}")]
    TrainingDataError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Rule violations raised by the ledger when a debit cannot be applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("insufficient balance: {available} available")]
    InsufficientFunds { available: rust_decimal::Decimal },
}
