//! Interaction analytics
//!
//! Intent distribution and most frequent user messages over the interaction log.

use crate::models::InteractionEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const TOP_QUERIES: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentShare {
    pub intent: String,
    pub count: usize,
    /// Share of all entries, 0-100
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryCount {
    pub message: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsReport {
    pub total: usize,
    pub intent_distribution: Vec<IntentShare>,
    pub top_queries: Vec<QueryCount>,
}

/// Count occurrences, most frequent first, ties by key
fn ranked<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, c)| (k.to_string(), c))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

pub fn summarize(entries: &[InteractionEntry], top_queries: usize) -> AnalyticsReport {
    let total = entries.len();
    if total == 0 {
        return AnalyticsReport::default();
    }

    let intent_distribution = ranked(entries.iter().map(|e| e.intent.as_str()))
        .into_iter()
        .map(|(intent, count)| IntentShare {
            intent,
            count,
            percent: count as f64 * 100.0 / total as f64,
        })
        .collect();

    let top_queries = ranked(entries.iter().map(|e| e.user_message.as_str()))
        .into_iter()
        .take(top_queries)
        .map(|(message, count)| QueryCount { message, count })
        .collect();

    AnalyticsReport {
        total,
        intent_distribution,
        top_queries,
    }
}
