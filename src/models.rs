//! Data models for the document classification API.
//!
//! This module contains the document records returned by the file store,
//! the typed accessor over their free-form properties, and the response
//! envelopes served by the HTTP API.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Property key set to `"true"` by the classifier once a document is processed.
pub const CLASSIFIED_KEY: &str = "classified";

/// Property key holding the comma-separated category labels.
pub const CATEGORIES_KEY: &str = "categories";

/// Property key holding the integer confidence score (0-100).
pub const CONFIDENCE_KEY: &str = "overall_confidence";

/// Free-form properties attached to a document by the classifier.
///
/// Values are expected to be strings, but any JSON value is accepted so a
/// single odd property never fails decoding of a whole page of results. The
/// raw value is kept as sent, including `null` or a non-object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag(Value);

impl Default for PropertyBag {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl PropertyBag {
    /// Returns the property as a string slice, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Reads an integer score, falling back to `default` when the key is
    /// absent or the value is not a whole number. Whole numbers outside the
    /// `i64` range saturate instead of being rejected.
    pub fn score_or(&self, key: &str, default: i64) -> i64 {
        let raw = match self.0.get(key) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return default,
        };
        parse_score(&raw).unwrap_or(default)
    }

    /// Whether the classifier has marked the document as processed.
    pub fn is_classified(&self) -> bool {
        self.get_str(CLASSIFIED_KEY) == Some("true")
    }

    /// Sets a string property, replacing any previous value.
    #[allow(dead_code)] // Builder utility, used by tests
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }
        if let Value::Object(ref mut map) = self.0 {
            map.insert(key.into(), Value::String(value.into()));
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(Value::Object(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        ))
    }
}

/// Optional sign followed by ASCII digits. Out-of-range values saturate.
fn parse_score(raw: &str) -> Option<i64> {
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }

    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };

    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Some(if negative { i64::MIN } else { i64::MAX })
    } else {
        None
    }
}

/// Present-but-null properties stay `Some` so they serialize back as `null`.
fn deserialize_properties<'de, D>(deserializer: D) -> Result<Option<PropertyBag>, D::Error>
where
    D: Deserializer<'de>,
{
    PropertyBag::deserialize(deserializer).map(Some)
}

/// A document as returned by the file store search.
///
/// Only the fields requested from the store are present. Anything not
/// modelled here (owners, size, ...) is kept in `extra` so structured
/// output reproduces the record unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Store identifier of the document.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// MIME type reported by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Creation time, RFC 3339 text as sent by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    /// Last modification time, RFC 3339 text as sent by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
    /// Classifier properties.
    #[serde(
        default,
        deserialize_with = "deserialize_properties",
        skip_serializing_if = "Option::is_none"
    )]
    pub properties: Option<PropertyBag>,
    /// Remaining fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DocumentRecord {
    /// Creates a bare record with only an identifier.
    #[allow(dead_code)] // Builder utility, used by tests
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Attaches a property bag.
    #[allow(dead_code)] // Builder utility, used by tests
    pub fn with_properties(mut self, properties: PropertyBag) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Category labels from the `categories` property. Empty labels are skipped.
    pub fn categories(&self) -> impl Iterator<Item = &str> + '_ {
        self.properties
            .as_ref()
            .and_then(|p| p.get_str(CATEGORIES_KEY))
            .unwrap_or("")
            .split(',')
            .filter(|c| !c.is_empty())
    }

    /// Overall confidence score; 0 when missing or not an integer.
    pub fn confidence(&self) -> i64 {
        self.properties
            .as_ref()
            .map(|p| p.score_or(CONFIDENCE_KEY, 0))
            .unwrap_or(0)
    }

    /// Whether the document carries `classified = "true"`.
    #[allow(dead_code)] // Utility for filtering
    pub fn is_classified(&self) -> bool {
        self.properties
            .as_ref()
            .is_some_and(PropertyBag::is_classified)
    }
}

/// Confidence bucket of a classified document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLevel {
    /// Score of 90 or more
    High,
    /// Score from 70 up to 89
    Medium,
    /// Anything below 70, including missing scores
    Low,
}

impl ConfidenceLevel {
    /// All levels in report order.
    pub const ALL: [ConfidenceLevel; 3] = [
        ConfidenceLevel::High,
        ConfidenceLevel::Medium,
        ConfidenceLevel::Low,
    ];

    /// Buckets a confidence score.
    pub fn from_score(score: i64) -> Self {
        if score >= 90 {
            ConfidenceLevel::High
        } else if score >= 70 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "HIGH"),
            ConfidenceLevel::Medium => write!(f, "MEDIUM"),
            ConfidenceLevel::Low => write!(f, "LOW"),
        }
    }
}

/// Output format for `/report`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown narrative (default)
    #[default]
    Markdown,
    /// The raw record list as JSON
    Json,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Markdown => write!(f, "markdown"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

/// One page of documents from `/documents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList {
    pub documents: Vec<DocumentRecord>,
    pub next_page_token: Option<String>,
    /// Number of documents on this page.
    pub total_count: usize,
}

/// Classification progress from `/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub total_documents: usize,
    pub classified_count: usize,
    pub pending_count: usize,
    #[serde(with = "millis_timestamp")]
    pub last_update: DateTime<Utc>,
}

/// Rendered report from `/report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub report_content: String,
    #[serde(with = "millis_timestamp")]
    pub generated_at: DateTime<Utc>,
    pub format: ReportFormat,
}

/// RFC 3339 in UTC with exactly three fractional digits, the same text the
/// markdown report prints.
mod millis_timestamp {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_confidence_level_thresholds() {
        assert_eq!(ConfidenceLevel::from_score(100), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(90), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(89), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(70), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(69), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(-5), ConfidenceLevel::Low);
    }

    #[test]
    fn test_envelope_timestamps_use_millis() {
        use chrono::TimeZone;

        let at = Utc.with_ymd_and_hms(2025, 3, 18, 12, 0, 0).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);

        let report = ReportResponse {
            report_content: String::new(),
            generated_at: at,
            format: ReportFormat::Markdown,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["generated_at"], "2025-03-18T12:00:00.123Z");

        let status = StatusResponse {
            total_documents: 0,
            classified_count: 0,
            pending_count: 0,
            last_update: Utc.with_ymd_and_hms(2025, 3, 18, 12, 0, 0).unwrap(),
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["last_update"], "2025-03-18T12:00:00.000Z");

        let back: StatusResponse = serde_json::from_value(value).unwrap();
        assert_eq!(back.last_update, status.last_update);
    }

    #[test]
    fn test_confidence_level_display() {
        let labels: Vec<String> = ConfidenceLevel::ALL.iter().map(|l| l.to_string()).collect();
        assert_eq!(labels, vec!["HIGH", "MEDIUM", "LOW"]);
    }

    #[test]
    fn test_property_score_or() {
        let props: PropertyBag = [("overall_confidence", " 85 "), ("bad", "8x"), ("dec", "87.5")]
            .into_iter()
            .collect();
        assert_eq!(props.score_or("overall_confidence", 0), 85);
        assert_eq!(props.score_or("bad", 0), 0);
        assert_eq!(props.score_or("dec", 0), 0);
        assert_eq!(props.score_or("missing", 7), 7);
    }

    #[test]
    fn test_property_numeric_value() {
        let props: PropertyBag = serde_json::from_value(json!({"overall_confidence": 92})).unwrap();
        assert_eq!(props.score_or("overall_confidence", 0), 92);
        assert_eq!(props.get_str("overall_confidence"), None);
    }

    #[test]
    fn test_oversized_score_saturates() {
        let props: PropertyBag = [
            ("huge", "99999999999999999999"),
            ("tiny", "-99999999999999999999"),
            ("signed", "+99999999999999999999"),
            ("junk", "9999999999999999999x"),
        ]
        .into_iter()
        .collect();
        assert_eq!(props.score_or("huge", 0), i64::MAX);
        assert_eq!(props.score_or("tiny", 0), i64::MIN);
        assert_eq!(props.score_or("signed", 0), i64::MAX);
        assert_eq!(props.score_or("junk", 0), 0);

        let numeric: PropertyBag =
            serde_json::from_value(json!({"overall_confidence": 18446744073709551615u64})).unwrap();
        assert_eq!(numeric.score_or("overall_confidence", 0), i64::MAX);

        let record = DocumentRecord::new("doc1").with_properties(
            [("overall_confidence", "99999999999999999999")].into_iter().collect(),
        );
        assert_eq!(ConfidenceLevel::from_score(record.confidence()), ConfidenceLevel::High);
    }

    #[test]
    fn test_record_round_trip_keeps_null_and_missing_fields() {
        let raw = json!({"name": "No id", "properties": null});

        let record: DocumentRecord = serde_json::from_value(raw.clone()).unwrap();
        assert!(record.id.is_empty());
        assert_eq!(record.confidence(), 0);
        assert_eq!(record.categories().count(), 0);
        assert!(!record.is_classified());

        assert_eq!(serde_json::to_value(&record).unwrap(), raw);

        let absent: DocumentRecord = serde_json::from_value(json!({"id": "doc1"})).unwrap();
        assert!(absent.properties.is_none());
        assert_eq!(serde_json::to_value(&absent).unwrap(), json!({"id": "doc1"}));
    }

    #[test]
    fn test_record_categories() {
        let record = DocumentRecord::new("doc1").with_properties(
            [("categories", "a,,b,")].into_iter().collect(),
        );
        let cats: Vec<&str> = record.categories().collect();
        assert_eq!(cats, vec!["a", "b"]);

        let bare = DocumentRecord::new("doc2");
        assert_eq!(bare.categories().count(), 0);
        assert_eq!(bare.confidence(), 0);
        assert!(!bare.is_classified());
    }

    #[test]
    fn test_record_passthrough_fields() {
        let raw = json!({
            "id": "doc1",
            "name": "Test Document 1",
            "mimeType": "text/plain",
            "createdTime": "2025-03-18T00:00:00.000Z",
            "size": "1024",
            "owners": [{"displayName": "Ada"}],
            "properties": {"classified": "true"}
        });

        let record: DocumentRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.mime_type.as_deref(), Some("text/plain"));
        assert!(record.is_classified());
        assert!(record.extra.contains_key("owners"));

        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_report_format_wire_names() {
        assert_eq!(serde_json::to_value(ReportFormat::Json).unwrap(), json!("json"));
        assert_eq!(
            serde_json::from_value::<ReportFormat>(json!("markdown")).unwrap(),
            ReportFormat::Markdown
        );
        assert_eq!(ReportFormat::default(), ReportFormat::Markdown);
    }
}
