// src/models/records.rs
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::scoring::efficiency::EfficiencyFeatures;
use crate::scoring::financial::FinancialLoss;
use crate::scoring::risk::RiskProfile;

/// A single raw service visit as fetched from the `service_data` table.
///
/// One record per physical visit; duplicate VIN + date pairs are treated as
/// separate visits (no natural key is enforced upstream). Immutable once read.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceRecord {
    pub vin: String,
    /// Parsed service date. `None` when the stored value was missing or
    /// unparseable; such records are excluded from time-gap math.
    pub service_date: Option<NaiveDate>,
    pub invoice_total: f64,
    pub labor_hours_billed: f64,
    pub odometer_reading: f64,
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    /// Free-text complaint. Missing values are coerced to the empty string.
    pub complaint: String,
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
    pub diagnosis: Option<String>,
    pub recommended: Option<String>,
    pub parts_used: Option<String>,
    pub technician: String,
    pub shop_id: String,
}

impl ServiceRecord {
    pub fn has_complaint(&self) -> bool {
        !self.complaint.trim().is_empty()
    }

    /// Parse a raw date string as stored upstream. Accepts plain ISO dates
    /// and ISO timestamps; anything else yields `None`.
    pub fn parse_service_date(raw: Option<&str>) -> Option<NaiveDate> {
        let raw = raw?.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(d);
        }
        // Timestamp forms like "2024-01-15T09:30:00" or "2024-01-15 09:30:00".
        let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }
}

/// Categorical confidence bucket for the misdiagnosis probability.
/// Serialized names match `as_str()` so JSON output and the DB column
/// carry the same labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl ConfidenceLevel {
    /// Bins a probability into {Low: [0,0.3), Medium: [0.3,0.5),
    /// High: [0.5,0.7), VeryHigh: [0.7,1.0]}.
    pub fn from_probability(probability: f64) -> Self {
        if probability < 0.3 {
            ConfidenceLevel::Low
        } else if probability < 0.5 {
            ConfidenceLevel::Medium
        } else if probability < 0.7 {
            ConfidenceLevel::High
        } else {
            ConfidenceLevel::VeryHigh
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "Low",
            ConfidenceLevel::Medium => "Medium",
            ConfidenceLevel::High => "High",
            ConfidenceLevel::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fully annotated output record: the source visit plus every derived
/// signal. Owned by the pipeline run that produced it; replaced wholesale on
/// the next run, never mutated in place.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredServiceRecord {
    pub record: ServiceRecord,
    pub efficiency: EfficiencyFeatures,
    /// 1 when this visit followed another visit for the same VIN within the
    /// configured window.
    pub repeat_45d: i32,
    /// Mean pairwise TF-IDF cosine similarity of this complaint to the batch.
    pub complaint_similarity: f64,
    /// K-means cluster over [efficiency_loss, complaint_similarity]; 0 on
    /// clustering fallback.
    pub cluster_id: i32,
    pub risk: RiskProfile,
    pub financial: FinancialLoss,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_level_bins() {
        assert_eq!(ConfidenceLevel::from_probability(0.0), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_probability(0.29), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_probability(0.3), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_probability(0.49), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_probability(0.5), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_probability(0.69), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_probability(0.7), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_probability(1.0), ConfidenceLevel::VeryHigh);
    }

    #[test]
    fn test_confidence_level_serializes_display_name() {
        for level in [
            ConfidenceLevel::Low,
            ConfidenceLevel::Medium,
            ConfidenceLevel::High,
            ConfidenceLevel::VeryHigh,
        ] {
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(json, format!("\"{}\"", level.as_str()));
        }
    }

    #[test]
    fn test_parse_service_date_variants() {
        assert_eq!(
            ServiceRecord::parse_service_date(Some("2024-03-05")),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(
            ServiceRecord::parse_service_date(Some("2024-03-05T14:00:00")),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(
            ServiceRecord::parse_service_date(Some("2024-03-05 14:00:00")),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(ServiceRecord::parse_service_date(Some("not a date")), None);
        assert_eq!(ServiceRecord::parse_service_date(Some("  ")), None);
        assert_eq!(ServiceRecord::parse_service_date(None), None);
    }
}
