//! Intent classification
//!
//! Maps free text to a confidence score per intent plus recognized entities.
//! Three implementations sit behind [`IntentClassifier`]:
//! - [`ExampleClassifier`]: built from the training rows, runs in-process
//! - [`RemoteClassifier`]: calls an external NLU service over HTTP
//! - [`UnavailableClassifier`]: no model loaded; always answers `Unavailable`

use crate::models::Entity;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub mod examples;
pub mod remote;

pub use examples::ExampleClassifier;
pub use remote::RemoteClassifier;

/// Scores and entities for a single message
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub cats: BTreeMap<String, f32>,
    pub entities: Vec<Entity>,
}

impl Prediction {
    /// Intent with the highest score. `None` when no categories were scored.
    /// On a tie the alphabetically first intent wins.
    pub fn top(&self) -> Option<(&str, f32)> {
        self.cats.iter().fold(None, |best, (intent, &score)| match best {
            Some((_, top)) if score.total_cmp(&top) != Ordering::Greater => best,
            _ => Some((intent.as_str(), score)),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// No model is loaded
    Unavailable,
    Scored(Prediction),
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether a model is loaded. Checked before every turn, including mid-flow turns.
    fn is_ready(&self) -> bool {
        true
    }

    async fn classify(&self, text: &str) -> Result<Classification>;
}

/// Stand-in used when no model could be loaded
pub struct UnavailableClassifier;

#[async_trait]
impl IntentClassifier for UnavailableClassifier {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn is_ready(&self) -> bool {
        false
    }

    async fn classify(&self, _text: &str) -> Result<Classification> {
        Ok(Classification::Unavailable)
    }
}

/// Shared slot holding the active classifier. Retraining swaps the contents.
pub struct ClassifierHandle {
    inner: RwLock<Arc<dyn IntentClassifier>>,
}

impl ClassifierHandle {
    pub fn new(classifier: Arc<dyn IntentClassifier>) -> Self {
        Self {
            inner: RwLock::new(classifier),
        }
    }

    pub async fn current(&self) -> Arc<dyn IntentClassifier> {
        self.inner.read().await.clone()
    }

    pub async fn replace(&self, classifier: Arc<dyn IntentClassifier>) {
        info!(classifier = classifier.name(), "Classifier swapped in");
        *self.inner.write().await = classifier;
    }
}

/// Pick the classifier for this process: the remote service when a URL is
/// configured, otherwise a model trained from the examples at `training_path`.
/// Falls back to [`UnavailableClassifier`] when neither can be built.
pub fn load_classifier(nlu_url: Option<&str>, training_path: &Path) -> Arc<dyn IntentClassifier> {
    if let Some(url) = nlu_url {
        match RemoteClassifier::new(url) {
            Ok(remote) => {
                info!(%url, "Intent classifier: remote");
                return Arc::new(remote);
            }
            Err(e) => warn!("Failed to build NLU client, trying local examples: {}", e),
        }
    }

    match ExampleClassifier::train(training_path) {
        Ok(local) if !local.intents().is_empty() => {
            info!("Intent classifier: examples");
            Arc::new(local)
        }
        Ok(_) => {
            warn!("No training examples found. Add rows to the training source and retrain.");
            Arc::new(UnavailableClassifier)
        }
        Err(e) => {
            warn!("Failed to train example classifier: {}", e);
            Arc::new(UnavailableClassifier)
        }
    }
}
