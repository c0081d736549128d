//! Classification tallies and report statistics.
//!
//! This module aggregates the classifier properties of a set of documents
//! into category counts and confidence buckets. Aggregation never fails:
//! missing or malformed properties contribute no categories and a
//! confidence of zero.

use crate::models::{ConfidenceLevel, DocumentRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Occurrences of each category label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally(HashMap<String, usize>);

impl CategoryTally {
    /// Counts one occurrence of `label`.
    pub fn record(&mut self, label: &str) {
        *self.0.entry(label.to_string()).or_insert(0) += 1;
    }

    /// Count for a label (0 if never seen).
    #[allow(dead_code)] // Lookup utility
    pub fn get(&self, label: &str) -> usize {
        self.0.get(label).copied().unwrap_or(0)
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Labels ordered by descending count, ties broken alphabetically.
    pub fn sorted(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<_> = self.0.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

/// Documents per confidence bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceTally {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl ConfidenceTally {
    /// Counts one document in `level`.
    pub fn record(&mut self, level: ConfidenceLevel) {
        match level {
            ConfidenceLevel::High => self.high += 1,
            ConfidenceLevel::Medium => self.medium += 1,
            ConfidenceLevel::Low => self.low += 1,
        }
    }

    pub fn get(&self, level: ConfidenceLevel) -> usize {
        match level {
            ConfidenceLevel::High => self.high,
            ConfidenceLevel::Medium => self.medium,
            ConfidenceLevel::Low => self.low,
        }
    }

    #[allow(dead_code)] // Utility for statistics
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Aggregated statistics behind a classification report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub generated_at: DateTime<Utc>,
    pub total_documents: usize,
    pub categories: CategoryTally,
    pub confidence: ConfidenceTally,
}

/// Count category labels across all records. Duplicates within one record
/// are counted each time they appear.
pub fn tally_categories(records: &[DocumentRecord]) -> CategoryTally {
    let mut tally = CategoryTally::default();

    for record in records {
        for label in record.categories() {
            tally.record(label);
        }
    }

    tally
}

/// Bucket every record by its overall confidence.
pub fn tally_confidence(records: &[DocumentRecord]) -> ConfidenceTally {
    let mut tally = ConfidenceTally::default();

    for record in records {
        tally.record(ConfidenceLevel::from_score(record.confidence()));
    }

    tally
}

/// Build the full report summary for a set of records.
pub fn summarize(records: &[DocumentRecord], generated_at: DateTime<Utc>) -> ReportSummary {
    ReportSummary {
        generated_at,
        total_documents: records.len(),
        categories: tally_categories(records),
        confidence: tally_confidence(records),
    }
}
