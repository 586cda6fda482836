//! Dialogue state machine for the chat assistant
//!
//! Each session carries one [`DialogueState`]. A message arriving while a
//! flow is active goes straight to that flow's step; only an idle session
//! consults the intent classifier.
//!
//! ```text
//! Idle ──check_balance──▶ AwaitingAccountNumber ──any──▶ Idle
//! Idle ──transfer_money─▶ AwaitingRecipient ──name──▶ AwaitingAmount
//!   AwaitingAmount ──invalid / too large──▶ AwaitingAmount
//!   AwaitingAmount ──valid──▶ AwaitingConfirmation ──yes / other──▶ Idle
//! ```
//!
//! Every turn handled here writes exactly one interaction log entry. Log
//! failures are reported and swallowed; the computed reply is still returned.

use crate::audit::InteractionLog;
use crate::classifier::examples::{LABEL_ACCOUNT_NUMBER, LABEL_MONEY};
use crate::classifier::{Classification, ClassifierHandle, IntentClassifier};
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::models::{Entity, Turn};
use crate::responses::ResponseStore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub mod amount;

pub use amount::{parse_amount, AmountError};

/// Minimum top-intent score needed to act on a prediction
pub const CONFIDENCE_THRESHOLD: f32 = 0.65;

pub const INTENT_CHECK_BALANCE: &str = "check_balance";
pub const INTENT_TRANSFER_MONEY: &str = "transfer_money";
pub const INTENT_OUT_OF_SCOPE: &str = "out_of_scope";
pub const INTENT_UNKNOWN: &str = "n/a";
pub const INTENT_ERROR: &str = "error";

pub const LABEL_RECIPIENT: &str = "RECIPIENT";

pub const REPLY_MODEL_UNAVAILABLE: &str = "AI model not available.";
const REPLY_NOT_UNDERSTOOD: &str = "I'm sorry, I'm not sure how to help with that.";
const REPLY_NO_RESPONSE_YET: &str = "I don't have a response yet.";
const REPLY_OUT_OF_SCOPE: &str = "I can only assist with banking questions.";

/// Where a session is in its conversation. Transfer slots live inside the
/// variants that need them, so a draft cannot outlive its flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DialogueState {
    #[default]
    Idle,
    AwaitingAccountNumber,
    AwaitingRecipient,
    AwaitingAmount {
        recipient: String,
    },
    AwaitingConfirmation {
        recipient: String,
        amount: Decimal,
    },
}

/// Slots collected so far in a transfer flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDraft {
    pub recipient: Option<String>,
    pub amount: Option<Decimal>,
}

impl DialogueState {
    pub fn name(&self) -> &'static str {
        match self {
            DialogueState::Idle => "idle",
            DialogueState::AwaitingAccountNumber => "awaiting_account_number",
            DialogueState::AwaitingRecipient => "awaiting_recipient",
            DialogueState::AwaitingAmount { .. } => "awaiting_amount",
            DialogueState::AwaitingConfirmation { .. } => "awaiting_confirmation",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, DialogueState::Idle)
    }

    /// The transfer draft, present only while a transfer flow is active
    pub fn draft(&self) -> Option<TransferDraft> {
        match self {
            DialogueState::AwaitingRecipient => Some(TransferDraft::default()),
            DialogueState::AwaitingAmount { recipient } => Some(TransferDraft {
                recipient: Some(recipient.clone()),
                amount: None,
            }),
            DialogueState::AwaitingConfirmation { recipient, amount } => Some(TransferDraft {
                recipient: Some(recipient.clone()),
                amount: Some(*amount),
            }),
            DialogueState::Idle | DialogueState::AwaitingAccountNumber => None,
        }
    }
}

/// Drives one session's dialogue against the shared stores
pub struct Assistant {
    classifier: Arc<ClassifierHandle>,
    responses: Arc<ResponseStore>,
    ledger: Arc<Ledger>,
    log: Arc<dyn InteractionLog>,
    threshold: f32,
}

impl Assistant {
    pub fn new(
        classifier: Arc<ClassifierHandle>,
        responses: Arc<ResponseStore>,
        ledger: Arc<Ledger>,
        log: Arc<dyn InteractionLog>,
    ) -> Self {
        Self {
            classifier,
            responses,
            ledger,
            log,
            threshold: CONFIDENCE_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn classifier(&self) -> &Arc<ClassifierHandle> {
        &self.classifier
    }

    pub fn responses(&self) -> &Arc<ResponseStore> {
        &self.responses
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn log(&self) -> &Arc<dyn InteractionLog> {
        &self.log
    }

    /// Handle one user message, updating `state` in place
    pub async fn handle(&self, state: &mut DialogueState, message: &str) -> Turn {
        let message = message.trim();

        let classifier = self.classifier.current().await;
        if !classifier.is_ready() {
            warn!("Chat turn rejected: no classifier loaded");
            return Turn::new(REPLY_MODEL_UNAVAILABLE, INTENT_ERROR);
        }

        debug!(state = state.name(), "Handling chat turn");

        match std::mem::take(state) {
            DialogueState::Idle => self.handle_idle(classifier.as_ref(), state, message).await,
            DialogueState::AwaitingAccountNumber => self.handle_account_number(message).await,
            DialogueState::AwaitingRecipient => self.handle_recipient(state, message).await,
            DialogueState::AwaitingAmount { recipient } => {
                self.handle_amount(state, recipient, message).await
            }
            DialogueState::AwaitingConfirmation { recipient, amount } => {
                self.handle_confirmation(recipient, amount, message).await
            }
        }
    }

    async fn handle_idle(
        &self,
        classifier: &dyn IntentClassifier,
        state: &mut DialogueState,
        message: &str,
    ) -> Turn {
        let prediction = match classifier.classify(message).await {
            Ok(Classification::Scored(prediction)) => prediction,
            Ok(Classification::Unavailable) => {
                return Turn::new(REPLY_MODEL_UNAVAILABLE, INTENT_ERROR);
            }
            Err(e) => {
                warn!(classifier = classifier.name(), "Classification failed: {}", e);
                return Turn::new(REPLY_MODEL_UNAVAILABLE, INTENT_ERROR);
            }
        };

        let Some((top_intent, confidence)) = prediction.top() else {
            self.record(message, INTENT_UNKNOWN, &[], REPLY_NOT_UNDERSTOOD)
                .await;
            return Turn::new(REPLY_NOT_UNDERSTOOD, INTENT_UNKNOWN);
        };

        info!(intent = %top_intent, confidence, "Message classified");

        let (intent, reply) = if confidence > self.threshold {
            let reply = match top_intent {
                INTENT_CHECK_BALANCE => {
                    *state = DialogueState::AwaitingAccountNumber;
                    "💰 Please provide your account number.".to_string()
                }
                INTENT_TRANSFER_MONEY => {
                    *state = DialogueState::AwaitingRecipient;
                    "💸 Who should I send money to?".to_string()
                }
                other => self.responses.get_random(other, REPLY_NO_RESPONSE_YET).await,
            };
            (top_intent.to_string(), reply)
        } else {
            let reply = self
                .responses
                .get_random(INTENT_OUT_OF_SCOPE, REPLY_OUT_OF_SCOPE)
                .await;
            (INTENT_OUT_OF_SCOPE.to_string(), reply)
        };

        self.record(message, &intent, &prediction.entities, &reply)
            .await;
        Turn::new(reply, intent)
    }

    async fn handle_account_number(&self, message: &str) -> Turn {
        let account_number: String = message.chars().filter(|c| !c.is_whitespace()).collect();
        let profile = self.ledger.profile().await;

        let reply = if account_number == profile.number {
            format!("💰 Your account balance is ₹{:.2}.", profile.balance)
        } else {
            "⚠️ Account number not recognized. Please try again.".to_string()
        };

        let entities = [Entity::new(account_number, LABEL_ACCOUNT_NUMBER)];
        self.record(message, INTENT_CHECK_BALANCE, &entities, &reply)
            .await;
        Turn::new(reply, INTENT_CHECK_BALANCE)
    }

    async fn handle_recipient(&self, state: &mut DialogueState, message: &str) -> Turn {
        let reply = format!("💸 How much would you like to send to {}?", message);
        *state = DialogueState::AwaitingAmount {
            recipient: message.to_string(),
        };

        let entities = [Entity::new(message, LABEL_RECIPIENT)];
        self.record(message, INTENT_TRANSFER_MONEY, &entities, &reply)
            .await;
        Turn::new(reply, INTENT_TRANSFER_MONEY)
    }

    async fn handle_amount(
        &self,
        state: &mut DialogueState,
        recipient: String,
        message: &str,
    ) -> Turn {
        let balance = self.ledger.balance().await;

        let (reply, entities) = match parse_amount(message) {
            Err(AmountError::NotANumber) => (
                "⚠️ Please enter a valid numeric amount.".to_string(),
                vec![],
            ),
            Err(AmountError::NotPositive) => (
                "⚠️ Please enter a valid amount greater than 0.".to_string(),
                vec![Entity::new(recipient.as_str(), LABEL_RECIPIENT)],
            ),
            Ok(amount) if amount > balance => (
                format!(
                    "⚠️ Insufficient balance! Your current balance is ₹{:.2}.",
                    balance
                ),
                vec![
                    Entity::new(recipient.as_str(), LABEL_RECIPIENT),
                    Entity::new(amount.to_string(), LABEL_MONEY),
                ],
            ),
            Ok(amount) => {
                let reply = format!(
                    "💡 Please confirm: Send ₹{:.2} to {}? (yes/no)",
                    amount, recipient
                );
                let entities = vec![
                    Entity::new(recipient.as_str(), LABEL_RECIPIENT),
                    Entity::new(amount.to_string(), LABEL_MONEY),
                ];
                *state = DialogueState::AwaitingConfirmation { recipient, amount };

                self.record(message, INTENT_TRANSFER_MONEY, &entities, &reply)
                    .await;
                return Turn::new(reply, INTENT_TRANSFER_MONEY);
            }
        };

        // Invalid input: ask again without leaving the step
        *state = DialogueState::AwaitingAmount { recipient };

        self.record(message, INTENT_TRANSFER_MONEY, &entities, &reply)
            .await;
        Turn::new(reply, INTENT_TRANSFER_MONEY)
    }

    async fn handle_confirmation(&self, recipient: String, amount: Decimal, message: &str) -> Turn {
        let confirmed = matches!(message.to_lowercase().as_str(), "yes" | "y");

        let reply = if confirmed {
            let today = chrono::Local::now().date_naive();
            match self.ledger.transfer(&recipient, amount, today).await {
                Ok(new_balance) => format!(
                    "✅ Successfully sent ₹{:.2} to {}. Your new balance is ₹{:.2}.",
                    amount, recipient, new_balance
                ),
                Err(LedgerError::InsufficientFunds { available }) => format!(
                    "⚠️ Insufficient balance! Your current balance is ₹{:.2}. Transfer to {} canceled.",
                    available, recipient
                ),
                Err(LedgerError::NonPositiveAmount) => {
                    "⚠️ Please enter a valid amount greater than 0.".to_string()
                }
            }
        } else {
            format!("❌ Transfer of ₹{:.2} to {} canceled.", amount, recipient)
        };

        let entities = [
            Entity::new(recipient.as_str(), LABEL_RECIPIENT),
            Entity::new(amount.to_string(), LABEL_MONEY),
        ];
        self.record(message, INTENT_TRANSFER_MONEY, &entities, &reply)
            .await;
        Turn::new(reply, INTENT_TRANSFER_MONEY)
    }

    async fn record(&self, message: &str, intent: &str, entities: &[Entity], reply: &str) {
        if let Err(e) = self.log.append(message, intent, entities, reply).await {
            warn!(%intent, "Interaction log write failed, reply still returned: {}", e);
        }
    }
}
