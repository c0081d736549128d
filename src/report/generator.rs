//! Report rendering.
//!
//! Markdown reports summarize the aggregated tallies. JSON reports are the
//! classified record list as fetched, without any tallies.

use crate::analysis::{CategoryTally, ConfidenceTally, ReportSummary};
use crate::models::{ConfidenceLevel, DocumentRecord};
use anyhow::Result;
use chrono::SecondsFormat;

/// Generate the markdown classification report.
pub fn generate_markdown_report(summary: &ReportSummary) -> String {
    let mut lines = vec![
        "# Document Classification Report".to_string(),
        format!(
            "\nGenerated: {}",
            summary
                .generated_at
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        ),
        format!("\nTotal Documents: {}", summary.total_documents),
        "\n## Summary".to_string(),
    ];

    lines.extend(generate_categories_section(&summary.categories));
    lines.extend(generate_confidence_section(&summary.confidence));

    lines.join("\n")
}

fn generate_categories_section(categories: &CategoryTally) -> Vec<String> {
    let mut section = vec!["\n### Categories".to_string()];

    for (category, count) in categories.sorted() {
        section.push(format!("- {}: {}", category, count));
    }

    section
}

/// Every level is listed, including empty ones.
fn generate_confidence_section(confidence: &ConfidenceTally) -> Vec<String> {
    let mut section = vec!["\n### Confidence Levels".to_string()];

    for level in ConfidenceLevel::ALL {
        section.push(format!("- {}: {}", level, confidence.get(level)));
    }

    section
}

/// Generate the JSON report: the record list, pretty-printed.
///
/// The tallies are deliberately absent here; consumers of the structured
/// format have always received the raw records only.
pub fn generate_json_report(records: &[DocumentRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).map_err(Into::into)
}
