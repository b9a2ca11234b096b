//! Browser signals reported for anonymous sessions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub country: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrowsingPattern {
    pub url: Option<String>,
    pub category: Option<String>,
}

/// Signals collected by the publisher widget. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSignals {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub geo_location: Option<GeoLocation>,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub browsing_patterns: Vec<BrowsingPattern>,
}

/// Fields changed on a session by a signal batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalOutcome {
    pub session_id: String,
    pub updated_fields: Vec<String>,
    pub inferred_areas: Vec<String>,
    /// Area ids newly attached to the linked profile
    pub linked_area_ids: Vec<String>,
}

/// Result of heuristic language detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageDetection {
    pub detected_language: String,
    pub confidence: f64,
    pub language_scores: Vec<(String, usize)>,
}
