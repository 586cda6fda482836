//! Environment configuration

use crate::dialogue::CONFIDENCE_THRESHOLD;
use crate::error::BankError;
use crate::Result;
use std::env;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_TRAINING_CSV: &str = "training_and_responses.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    pub training_csv: PathBuf,
    pub nlu_url: Option<String>,
    pub database_url: Option<String>,
    pub confidence_threshold: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            training_csv: PathBuf::from(DEFAULT_TRAINING_CSV),
            nlu_url: None,
            database_url: None,
            confidence_threshold: CONFIDENCE_THRESHOLD,
        }
    }
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Read configuration from the process environment (call `dotenv` first)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(non_empty)
    }

    /// Build from any variable lookup; unset variables take their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let port = match lookup("PORT").or_else(|| lookup("API_PORT")) {
            Some(p) => p
                .trim()
                .parse()
                .map_err(|_| BankError::ConfigError(format!("invalid PORT: {}", p)))?,
            None => defaults.port,
        };

        let confidence_threshold = match lookup("CONFIDENCE_THRESHOLD") {
            Some(t) => {
                let value: f32 = t.trim().parse().map_err(|_| {
                    BankError::ConfigError(format!("invalid CONFIDENCE_THRESHOLD: {}", t))
                })?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(BankError::ConfigError(format!(
                        "CONFIDENCE_THRESHOLD must be within 0..=1, got {}",
                        value
                    )));
                }
                value
            }
            None => defaults.confidence_threshold,
        };

        Ok(Self {
            port,
            training_csv: lookup("TRAINING_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.training_csv),
            nlu_url: lookup("NLU_URL"),
            database_url: lookup("DATABASE_URL").or_else(|| lookup("POSTGRES_URL")),
            confidence_threshold,
        })
    }
}
