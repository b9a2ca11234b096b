//! Session profiling from browser signals.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{BrowsingPattern, LanguageDetection, SignalOutcome, UserSignals};
use crate::domain::ports::{ExpertiseAreaRepository, ProfileRepository, SessionRepository};

/// Browsing category to expertise-area name.
const CATEGORY_AREAS: &[(&str, &str)] = &[
    ("technology", "Technology"),
    ("programming", "Programming"),
    ("science", "Science"),
    ("medicine", "Healthcare"),
    ("finance", "Finance"),
    ("business", "Business"),
    ("arts", "Arts"),
    ("education", "Education"),
    ("gaming", "Gaming"),
];

/// Share of browsing patterns a category needs before it counts.
const CATEGORY_SHARE: f64 = 0.1;

const STOP_WORDS: &[(&str, &[&str])] = &[
    ("en", &["the", "is", "and", "to", "of", "in", "that", "this"]),
    ("es", &["el", "la", "es", "y", "de", "en", "que", "para"]),
    ("fr", &["le", "la", "est", "et", "de", "en", "que", "pour"]),
    ("de", &["der", "die", "das", "ist", "und", "zu", "in", "mit"]),
];

const FALLBACK_LANGUAGE: &str = "en";
const BASE_LANGUAGE_CONFIDENCE: f64 = 0.5;

pub struct ProfilerService {
    sessions: Arc<dyn SessionRepository>,
    profiles: Arc<dyn ProfileRepository>,
    areas: Arc<dyn ExpertiseAreaRepository>,
}

impl ProfilerService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        profiles: Arc<dyn ProfileRepository>,
        areas: Arc<dyn ExpertiseAreaRepository>,
    ) -> Self {
        Self {
            sessions,
            profiles,
            areas,
        }
    }

    /// Apply a batch of browser signals to a session.
    ///
    /// Present fields overwrite the session's values. Expertise areas inferred
    /// from browsing categories are merged into the linked profile, if any.
    #[instrument(skip(self, signals), fields(patterns = signals.browsing_patterns.len()))]
    pub async fn process_signals(
        &self,
        session_id: &str,
        signals: &UserSignals,
    ) -> DomainResult<SignalOutcome> {
        let mut session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))?;

        let mut updated_fields = Vec::new();
        let country = signals
            .geo_location
            .as_ref()
            .and_then(|geo| geo.country.clone());
        for (field, target, value) in [
            ("language", &mut session.language, &signals.language),
            ("timezone", &mut session.timezone, &signals.timezone),
            ("device_type", &mut session.device_type, &signals.device_type),
            ("platform", &mut session.platform, &signals.platform),
            ("country", &mut session.country, &country),
            ("referrer", &mut session.referrer, &signals.referrer),
        ] {
            if value.is_some() && target != value {
                *target = value.clone();
                updated_fields.push(field.to_string());
            }
        }

        if !updated_fields.is_empty() {
            session.touch();
            self.sessions.update(&session).await?;
        }

        let inferred_areas = infer_expertise_areas(&signals.browsing_patterns);
        let linked_area_ids = match &session.profile_id {
            Some(profile_id) if !inferred_areas.is_empty() => {
                self.link_profile_areas(profile_id, &inferred_areas).await?
            }
            _ => Vec::new(),
        };

        info!(
            session_id,
            updated = updated_fields.len(),
            inferred = inferred_areas.len(),
            linked = linked_area_ids.len(),
            "processed session signals"
        );

        Ok(SignalOutcome {
            session_id: session.id,
            updated_fields,
            inferred_areas,
            linked_area_ids,
        })
    }

    /// Resolve area names and add the new ones to a profile.
    async fn link_profile_areas(&self, profile_id: &str, area_names: &[String]) -> DomainResult<Vec<String>> {
        let Some(mut profile) = self.profiles.get(profile_id).await? else {
            warn!(profile_id, "session links to a missing profile");
            return Ok(Vec::new());
        };

        let mut area_ids = Vec::new();
        for name in area_names {
            match self.areas.get_by_name(name).await? {
                Some(area) => area_ids.push(area.id),
                None => debug!(area = %name, "inferred area is not in the taxonomy"),
            }
        }

        let before = profile.expertise_area_ids.len();
        if profile.merge_expertise_areas(&area_ids) == 0 {
            return Ok(Vec::new());
        }
        self.profiles.update(&profile).await?;
        Ok(profile.expertise_area_ids.split_off(before))
    }

    pub fn detect_language(&self, text: &str) -> LanguageDetection {
        detect_language(text)
    }
}

/// Area names for the browsing categories seen often enough.
///
/// A category qualifies when it appears in at least `max(1, 10%)` of the
/// patterns. Names come back in order of first appearance.
pub fn infer_expertise_areas(patterns: &[BrowsingPattern]) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for category in patterns.iter().filter_map(|p| p.category.as_deref()) {
        let category = category.trim().to_lowercase();
        match counts.iter_mut().find(|(c, _)| *c == category) {
            Some((_, count)) => *count += 1,
            None => counts.push((category, 1)),
        }
    }

    let threshold = (patterns.len() as f64 * CATEGORY_SHARE).max(1.0);
    counts
        .into_iter()
        .filter(|(_, count)| *count as f64 >= threshold)
        .filter_map(|(category, _)| {
            CATEGORY_AREAS
                .iter()
                .find(|(c, _)| *c == category)
                .map(|(_, area)| area.to_string())
        })
        .collect()
}

/// Stop-word language guess over en, es, fr and de.
///
/// Confidence is `0.5 + 0.5 * hits / stop_words`; with no hits at all the
/// guess is English at 0.5. Ties go to the earlier language in the list.
pub fn detect_language(text: &str) -> LanguageDetection {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .collect();

    let language_scores: Vec<(String, usize)> = STOP_WORDS
        .iter()
        .map(|(lang, stop_words)| {
            let hits = stop_words.iter().filter(|w| words.contains(*w)).count();
            (lang.to_string(), hits)
        })
        .collect();

    let mut best: Option<(usize, usize)> = None;
    for (index, (_, hits)) in language_scores.iter().enumerate() {
        if *hits > 0 && best.map_or(true, |(_, best_hits)| *hits > best_hits) {
            best = Some((index, *hits));
        }
    }

    let (detected_language, confidence) = match best {
        Some((index, hits)) => {
            let (lang, stop_words) = STOP_WORDS[index];
            let share = hits as f64 / stop_words.len() as f64;
            (lang.to_string(), BASE_LANGUAGE_CONFIDENCE + 0.5 * share)
        }
        None => (FALLBACK_LANGUAGE.to_string(), BASE_LANGUAGE_CONFIDENCE),
    };

    LanguageDetection {
        detected_language,
        confidence,
        language_scores,
    }
}
