//! In-process intent classifier trained from the example rows
//!
//! Scoring: each intent gets the best score among its examples, where an
//! example scores `0.75 * (share of example tokens found in the message)
//! + 0.25 * (share of message tokens found in the example)`. An exact token
//! match scores 1.0. Messages with no word tokens get no scores at all.
//!
//! Entities come from a small pattern recognizer (money, account numbers,
//! capitalised names after "to") plus the values annotated on training rows.
//! The fourth training column may carry `LABEL:value|LABEL:value`; each value
//! that occurs in its example text is then recognized case-insensitively in
//! incoming messages. Parts without a `:` (such as `seed` or `admin_added`)
//! are ignored.

use super::{Classification, IntentClassifier, Prediction};
use crate::models::Entity;
use crate::responses::{read_training_rows, TrainingRow};
use crate::Result;
use async_trait::async_trait;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

const EXAMPLE_WEIGHT: f32 = 0.75;
const MESSAGE_WEIGHT: f32 = 0.25;

pub const LABEL_MONEY: &str = "MONEY";
pub const LABEL_ACCOUNT_NUMBER: &str = "ACCOUNT_NUMBER";
pub const LABEL_PERSON: &str = "PERSON";

type TokenSet = BTreeSet<String>;

fn tokenize(text: &str) -> TokenSet {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn similarity(message: &TokenSet, example: &TokenSet) -> f32 {
    if message.is_empty() || example.is_empty() {
        return 0.0;
    }
    let shared = message.intersection(example).count() as f32;
    EXAMPLE_WEIGHT * shared / example.len() as f32 + MESSAGE_WEIGHT * shared / message.len() as f32
}

struct EntityPatterns {
    money: Regex,
    account_number: Regex,
    person: Regex,
}

fn patterns() -> &'static EntityPatterns {
    static PATTERNS: OnceLock<EntityPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| EntityPatterns {
        money: Regex::new(
            r"(?i)(?:₹|\brs\.?|\binr)\s*\d[\d,]*(?:\.\d+)?|\b\d[\d,]*(?:\.\d+)?\s*(?:rupees|rs|inr)\b",
        )
        .expect("money pattern"),
        account_number: Regex::new(r"\b\d{8,18}\b").expect("account number pattern"),
        person: Regex::new(r"\bto\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)").expect("person pattern"),
    })
}

/// Parse `LABEL:value|LABEL:value` annotations, skipping parts without a `:`
pub fn parse_annotations(annotations: &str) -> Vec<Entity> {
    annotations
        .split('|')
        .filter_map(|part| part.split_once(':'))
        .map(|(label, value)| (label.trim(), value.trim()))
        .filter(|(label, value)| !label.is_empty() && !value.is_empty())
        .map(|(label, value)| Entity::new(value, label))
        .collect()
}

/// A value learned from an annotated training row
struct KnownEntity {
    pattern: Regex,
    label: String,
}

impl KnownEntity {
    fn new(entity: &Entity) -> Option<Self> {
        let escaped = regex::escape(&entity.value);
        let word_start = entity.value.starts_with(|c: char| c.is_alphanumeric());
        let word_end = entity.value.ends_with(|c: char| c.is_alphanumeric());
        let pattern = format!(
            "(?i){}{}{}",
            if word_start { r"\b" } else { "" },
            escaped,
            if word_end { r"\b" } else { "" }
        );

        Regex::new(&pattern).ok().map(|pattern| Self {
            pattern,
            label: entity.label.clone(),
        })
    }
}

fn pattern_matches(text: &str) -> Vec<(usize, Entity)> {
    let p = patterns();
    let mut found: Vec<(usize, Entity)> = Vec::new();

    for m in p.money.find_iter(text) {
        found.push((m.start(), Entity::new(m.as_str().trim(), LABEL_MONEY)));
    }
    for m in p.account_number.find_iter(text) {
        let inside_money = found.iter().any(|(start, e)| {
            e.label == LABEL_MONEY && m.start() >= *start && m.start() < start + e.value.len()
        });
        if !inside_money {
            found.push((m.start(), Entity::new(m.as_str(), LABEL_ACCOUNT_NUMBER)));
        }
    }
    for caps in p.person.captures_iter(text) {
        if let Some(name) = caps.get(1) {
            found.push((name.start(), Entity::new(name.as_str(), LABEL_PERSON)));
        }
    }

    found
}

fn by_position(mut found: Vec<(usize, Entity)>) -> Vec<Entity> {
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, e)| e).collect()
}

/// Recognize entities in `text` with the built-in patterns, ordered by position
pub fn extract_entities(text: &str) -> Vec<Entity> {
    by_position(pattern_matches(text))
}

pub struct ExampleClassifier {
    examples: Vec<(TokenSet, String)>,
    known: Vec<KnownEntity>,
}

impl ExampleClassifier {
    pub fn from_examples<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: Into<String>,
    {
        let examples = pairs
            .into_iter()
            .map(|(text, intent)| (tokenize(text.as_ref()), intent.into()))
            .filter(|(tokens, _)| !tokens.is_empty())
            .collect();

        Self {
            examples,
            known: Vec::new(),
        }
    }

    /// Build from training rows, learning annotated entity values from the
    /// fourth column. An annotation only counts when its value occurs in the
    /// row's example text.
    pub fn from_rows(rows: &[TrainingRow]) -> Self {
        let mut classifier =
            Self::from_examples(rows.iter().map(|r| (r.example.as_str(), r.intent.clone())));

        let mut seen = BTreeSet::new();
        for row in rows {
            let example = row.example.to_lowercase();
            for entity in parse_annotations(&row.source) {
                let value = entity.value.to_lowercase();
                if !example.contains(&value) || !seen.insert((entity.label.clone(), value)) {
                    continue;
                }
                if let Some(known) = KnownEntity::new(&entity) {
                    classifier.known.push(known);
                }
            }
        }
        classifier
    }

    /// Number of annotated entity values learned from the training rows
    pub fn known_entities(&self) -> usize {
        self.known.len()
    }

    /// Pattern entities plus annotated values found in `text`, ordered by position
    pub fn entities(&self, text: &str) -> Vec<Entity> {
        let mut found = pattern_matches(text);
        for known in &self.known {
            for m in known.pattern.find_iter(text) {
                let duplicate = found
                    .iter()
                    .any(|(start, e)| *start == m.start() && e.label == known.label);
                if !duplicate {
                    found.push((m.start(), Entity::new(m.as_str(), known.label.as_str())));
                }
            }
        }
        by_position(found)
    }

    /// Build from the training source at `path`
    pub fn train(path: &Path) -> Result<Self> {
        let rows = read_training_rows(path)?;
        let classifier = Self::from_rows(&rows);
        info!(
            examples = classifier.examples.len(),
            intents = classifier.intents().len(),
            known_entities = classifier.known.len(),
            "Example classifier trained"
        );
        Ok(classifier)
    }

    pub fn intents(&self) -> BTreeSet<&str> {
        self.examples.iter().map(|(_, i)| i.as_str()).collect()
    }

    pub fn score(&self, text: &str) -> BTreeMap<String, f32> {
        let message = tokenize(text);
        let mut cats = BTreeMap::new();
        if message.is_empty() {
            return cats;
        }

        for (tokens, intent) in &self.examples {
            let score = similarity(&message, tokens);
            let best = cats.entry(intent.clone()).or_insert(0.0_f32);
            if score > *best {
                *best = score;
            }
        }
        cats
    }
}

#[async_trait]
impl IntentClassifier for ExampleClassifier {
    fn name(&self) -> &'static str {
        "examples"
    }

    async fn classify(&self, text: &str) -> Result<Classification> {
        let prediction = Prediction {
            cats: self.score(text),
            entities: self.entities(text),
        };
        debug!(top = ?prediction.top(), "Classified message");
        Ok(Classification::Scored(prediction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ExampleClassifier {
        ExampleClassifier::from_examples([
            ("what's my balance", "check_balance"),
            ("check my account balance", "check_balance"),
            ("transfer money", "transfer_money"),
            ("send money to a friend", "transfer_money"),
            ("hi", "greet"),
            ("hello there", "greet"),
        ])
    }

    #[test]
    fn test_exact_example_scores_one() {
        let cats = classifier().score("Transfer money");
        assert_eq!(cats["transfer_money"], 1.0);
        assert!(cats["check_balance"] < 0.65);
    }

    #[test]
    fn test_paraphrase_clears_threshold() {
        let scores = classifier().score("I want to transfer money");
        let top = scores
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i.as_str());
        assert_eq!(top, Some("transfer_money"));
        assert!(scores["transfer_money"] > 0.65);
    }

    #[test]
    fn test_unrelated_message_scores_low() {
        let scores = classifier().score("tell me a joke about cricket");
        assert!(scores.values().all(|s| *s <= 0.65));
    }

    #[test]
    fn test_no_tokens_no_scores() {
        assert!(classifier().score("?!").is_empty());
        assert!(ExampleClassifier::from_examples(Vec::<(&str, &str)>::new())
            .score("hello")
            .is_empty());
    }

    #[test]
    fn test_extract_entities() {
        let entities = extract_entities("Send ₹1,500 to Asha from 96182240");
        assert_eq!(
            entities,
            vec![
                Entity::new("₹1,500", LABEL_MONEY),
                Entity::new("Asha", LABEL_PERSON),
                Entity::new("96182240", LABEL_ACCOUNT_NUMBER),
            ]
        );

        assert!(extract_entities("hello").is_empty());
    }

    fn row(example: &str, intent: &str, source: &str) -> TrainingRow {
        TrainingRow {
            example: example.to_string(),
            intent: intent.to_string(),
            response: "ok".to_string(),
            source: source.to_string(),
        }
    }

    #[test]
    fn test_parse_annotations_skips_parts_without_label() {
        assert_eq!(
            parse_annotations("PERSON:Asha|seed| MONEY : 500 rupees |:x|LABEL:"),
            vec![
                Entity::new("Asha", LABEL_PERSON),
                Entity::new("500 rupees", LABEL_MONEY),
            ]
        );
        assert!(parse_annotations("admin_added").is_empty());
        assert!(parse_annotations("").is_empty());
    }

    #[test]
    fn test_annotated_values_are_recognized() {
        let classifier = ExampleClassifier::from_rows(&[
            row("send money to ravi kumar", "transfer_money", "PERSON:Ravi Kumar"),
            row("balance for 96182240", "check_balance", "ACCOUNT_NUMBER:96182240"),
            row("pay the landlord", "transfer_money", "PERSON:Asha"),
            row("hello", "greet", "admin_added"),
        ]);

        // Annotation whose value is absent from its example is not learned
        assert_eq!(classifier.known_entities(), 2);

        assert_eq!(
            classifier.entities("please pay RAVI KUMAR now"),
            vec![Entity::new("RAVI KUMAR", LABEL_PERSON)]
        );
        assert_eq!(
            classifier.entities("is 96182240 mine"),
            vec![Entity::new("96182240", LABEL_ACCOUNT_NUMBER)]
        );
        assert!(classifier.entities("Asha").is_empty());
    }

    #[tokio::test]
    async fn test_classify_returns_scored() {
        let result = classifier().classify("hello there").await.unwrap();
        let Classification::Scored(prediction) = result else {
            panic!("expected scored classification");
        };
        assert_eq!(prediction.top(), Some(("greet", 1.0)));
    }
}
