//! HTTP client for an external NLU service
//!
//! Request: `POST {url}` with `{"text": "..."}`.
//! Response: `{"cats": {"intent": score, ...}, "ents": [{"text": "...", "label": "..."}]}`.

use super::{Classification, IntentClassifier, Prediction};
use crate::error::BankError;
use crate::models::Entity;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{error, info};

/// Long-lived, connection-pooled NLU client
pub struct RemoteClassifier {
    client: Client,
    url: String,
}

impl RemoteClassifier {
    pub const NAME: &'static str = "remote";

    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct NluRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct NluResponse {
    #[serde(default)]
    cats: BTreeMap<String, f32>,
    #[serde(default)]
    ents: Vec<NluEntity>,
}

#[derive(Debug, Deserialize)]
struct NluEntity {
    text: String,
    label: String,
}

impl From<NluResponse> for Prediction {
    fn from(response: NluResponse) -> Self {
        Prediction {
            cats: response.cats,
            entities: response
                .ents
                .into_iter()
                .map(|e| Entity::new(e.text, e.label))
                .collect(),
        }
    }
}

#[async_trait]
impl IntentClassifier for RemoteClassifier {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn classify(&self, text: &str) -> Result<Classification> {
        info!(url = %self.url, "Calling NLU service");

        let response = self
            .client
            .post(&self.url)
            .json(&NluRequest { text })
            .send()
            .await
            .map_err(|e| {
                error!("NLU request failed: {}", e);
                BankError::ClassifierError(format!("NLU request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "NLU service error response: {}", body);
            return Err(BankError::ClassifierError(format!(
                "NLU service returned {}: {}",
                status, body
            )));
        }

        let parsed: NluResponse = response.json().await.map_err(|e| {
            error!("Failed to parse NLU response: {}", e);
            BankError::ClassifierError(format!("NLU parse error: {}", e))
        })?;

        Ok(Classification::Scored(parsed.into()))
    }
}
