//! Core types for WasteWatch
//!
//! Defines the fundamental types shared by the workflow and the dashboard:
//! - Ledger-backed reports and their identifiers
//! - The report form snapshot a citizen fills in
//! - Verification results and the qualification rule
//! - Transaction handles returned by the ledger

use crate::location::{parse_coordinates, GeoPoint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum confidence (0-100) for an image to qualify as evidence
pub const QUALIFYING_THRESHOLD: f64 = 50.0;

/// Whether a verification confidence qualifies an image as evidence
#[inline]
#[must_use]
pub fn is_qualifying(confidence: f64) -> bool {
    confidence >= QUALIFYING_THRESHOLD
}

/// Ledger-assigned report identifier (sequential, starting at 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub u64);

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReportId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A dumping-incident record as held by the ledger
///
/// Reports are never constructed client-side except as a projection of a
/// ledger read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Ledger-assigned identifier
    pub id: ReportId,
    /// Hosted evidence image (stored by the contract as `imageHash`)
    pub image_url: String,
    /// Free text, optionally a `"lat, lng"` pair
    pub location: String,
    /// Free text, possibly carrying a verification annotation
    pub description: String,
    /// Set once by `completeReport`
    pub completed: bool,
    /// Ledger block time in seconds
    pub timestamp: u64,
}

impl Report {
    /// Creation time, when the timestamp fits a calendar date
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Coordinates parsed from the location text, if it is a `"lat, lng"` pair
    #[inline]
    #[must_use]
    pub fn coordinates(&self) -> Option<GeoPoint> {
        parse_coordinates(&self.location)
    }
}

/// Raw evidence image selected by the reporter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Original file name
    pub file_name: String,
    /// Media type, e.g. `image/jpeg`
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Create new upload
    #[inline]
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Guess the media type from the file extension
    #[must_use]
    pub fn content_type_for(file_name: &str) -> &'static str {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "heic" => "image/heic",
            _ => "image/jpeg",
        }
    }
}

/// Immutable snapshot of the report form
///
/// Each submission produces the next snapshot through [`ReportForm::after`]:
/// cleared on success, retained on failure so the reporter can retry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportForm {
    /// Evidence image
    pub image: Option<ImageUpload>,
    /// Location text
    pub location: String,
    /// What the reporter observed
    pub description: String,
}

impl ReportForm {
    /// Create empty form
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With image
    #[inline]
    #[must_use]
    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }

    /// With location text
    #[inline]
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Names of the fields that are missing or blank
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.image.as_ref().map_or(true, |i| i.bytes.is_empty()) {
            missing.push("image");
        }
        if self.location.trim().is_empty() {
            missing.push("location");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        missing
    }

    /// Next form snapshot after a submission attempt
    #[must_use]
    pub fn after<T, E>(&self, result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::default(),
            Err(_) => self.clone(),
        }
    }
}

/// Outcome of screening an evidence image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Whether the image qualifies as evidence of illegal dumping
    pub is_illegal_dumping: bool,
    /// Model confidence, 0-100
    pub confidence: f64,
    /// Model explanation
    pub explanation: String,
}

impl VerificationResult {
    /// Classify a confidence/explanation pair
    #[must_use]
    pub fn from_assessment(confidence: f64, explanation: impl Into<String>) -> Self {
        Self {
            is_illegal_dumping: is_qualifying(confidence),
            confidence,
            explanation: explanation.into(),
        }
    }

    /// Fail-closed result for a verification that could not complete
    #[must_use]
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            is_illegal_dumping: false,
            confidence: 0.0,
            explanation: format!("Failed to verify image: {reason}"),
        }
    }

    /// Synthesized result when verification is skipped
    #[must_use]
    pub fn bypassed() -> Self {
        Self {
            is_illegal_dumping: true,
            confidence: 100.0,
            explanation: "Verification bypassed in development mode".to_string(),
        }
    }
}

/// Aggregate dashboard counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    /// Ledger report count
    pub total: u64,
    /// Reports marked completed
    pub completed: u64,
    /// `total - completed`
    pub pending: u64,
}

impl ReportStats {
    /// Derive counters from the ledger count and the loaded reports
    #[must_use]
    pub fn from_reports(total: u64, reports: &[Report]) -> Self {
        let completed = reports.iter().filter(|r| r.completed).count() as u64;
        Self {
            total,
            completed,
            pending: total.saturating_sub(completed),
        }
    }
}

/// Hash of a submitted ledger transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Finalized transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Block the transaction was included in
    pub block_number: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn report(id: u64, completed: bool) -> Report {
        Report {
            id: ReportId(id),
            image_url: format!("https://img.example/{id}.jpg"),
            location: "13.05, 80.20".to_string(),
            description: "tyres by the canal".to_string(),
            completed,
            timestamp: 1_700_000_000 + id,
        }
    }

    #[test]
    fn qualification_boundary_is_exact() {
        assert!(!is_qualifying(49.0));
        assert!(!is_qualifying(49.999));
        assert!(is_qualifying(50.0));
        assert!(is_qualifying(100.0));
    }

    proptest! {
        #[test]
        fn prop_qualifying_matches_threshold(c in 0.0f64..=100.0) {
            prop_assert_eq!(is_qualifying(c), c >= 50.0);
            prop_assert_eq!(VerificationResult::from_assessment(c, "x").is_illegal_dumping, c >= 50.0);
        }

        #[test]
        fn prop_pending_is_total_minus_completed(flags in proptest::collection::vec(any::<bool>(), 0..40)) {
            let reports: Vec<Report> = flags
                .iter()
                .enumerate()
                .map(|(i, done)| report(i as u64 + 1, *done))
                .collect();
            let stats = ReportStats::from_reports(reports.len() as u64, &reports);
            prop_assert_eq!(stats.pending, stats.total - stats.completed);
        }
    }

    #[test]
    fn stats_example() {
        let reports = vec![
            report(1, true),
            report(2, false),
            report(3, true),
            report(4, false),
            report(5, false),
        ];
        let stats = ReportStats::from_reports(5, &reports);
        assert_eq!(
            stats,
            ReportStats {
                total: 5,
                completed: 2,
                pending: 3
            }
        );
    }

    #[test]
    fn failed_result_is_closed() {
        let result = VerificationResult::failed("no JSON object in response");
        assert!(!result.is_illegal_dumping);
        assert_eq!(result.confidence, 0.0);
        assert!(result.explanation.starts_with("Failed to verify image"));
    }

    #[test]
    fn form_missing_fields() {
        let form = ReportForm::new().with_location("  ");
        assert_eq!(form.missing_fields(), vec!["image", "location", "description"]);

        let empty_image = ReportForm::new()
            .with_image(ImageUpload::new("a.jpg", "image/jpeg", Vec::new()))
            .with_location("here")
            .with_description("bags");
        assert_eq!(empty_image.missing_fields(), vec!["image"]);
    }

    #[test]
    fn form_cleared_only_on_success() {
        let form = ReportForm::new()
            .with_image(ImageUpload::new("a.jpg", "image/jpeg", vec![1, 2, 3]))
            .with_location("here")
            .with_description("bags");

        let ok: Result<(), ()> = Ok(());
        let err: Result<(), ()> = Err(());
        assert_eq!(form.after(&ok), ReportForm::default());
        assert_eq!(form.after(&err), form);
    }

    #[test]
    fn report_derived_fields() {
        let r = report(7, false);
        assert_eq!(r.created_at().map(|t| t.timestamp()), Some(1_700_000_007));
        assert_eq!(r.coordinates(), Some(GeoPoint::new(13.05, 80.20)));
    }

    #[test]
    fn content_type_guess() {
        assert_eq!(ImageUpload::content_type_for("dump.PNG"), "image/png");
        assert_eq!(ImageUpload::content_type_for("dump"), "image/jpeg");
    }

    #[test]
    fn report_id_parses() {
        assert_eq!(" 12 ".parse::<ReportId>().ok(), Some(ReportId(12)));
        assert!("x".parse::<ReportId>().is_err());
    }
}
