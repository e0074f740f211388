//! Preference reconciliation
//!
//! Free text from a member goes to the extraction collaborator together with
//! what is already known about that member. Every extracted fact either
//! strengthens a matching stored preference or becomes a new one. Wishes for
//! the current week are handed back to the caller and never stored here.

use anyhow::Result;
use chrono::Utc;
use sdk::collaborators::{Assistant, ExtractedPreference};
use sdk::types::{FamilyMember, Preference};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::db::Database;

/// Longest excerpt of the source message kept with a new preference
const EXCERPT_CHARS: usize = 200;

/// What one extraction changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionOutcome {
    pub inserted: Vec<Preference>,
    /// (preference id, new confidence)
    pub escalated: Vec<(i64, f64)>,
    pub wishes: Vec<String>,
}

/// Confidence after a fact is seen again
pub fn escalated_confidence(existing: f64, incoming: f64) -> f64 {
    (existing.max(incoming) + 0.1).min(1.0)
}

/// First stored preference of the same category whose detail contains the
/// new detail or is contained by it, ignoring case
pub fn find_matching<'a>(
    existing: &'a [Preference],
    category: &str,
    detail: &str,
) -> Option<&'a Preference> {
    let detail = detail.to_lowercase();
    existing.iter().find(|pref| {
        let stored = pref.detail.to_lowercase();
        pref.category == category && (stored.contains(&detail) || detail.contains(&stored))
    })
}

fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_CHARS).collect()
}

pub struct PreferenceEngine {
    db: Database,
    assistant: Arc<dyn Assistant>,
}

impl PreferenceEngine {
    pub fn new(db: Database, assistant: Arc<dyn Assistant>) -> Self {
        Self { db, assistant }
    }

    /// Extract facts and wishes from `text` and reconcile them with storage
    pub async fn extract_and_store(
        &self,
        member: &FamilyMember,
        text: &str,
    ) -> Result<ExtractionOutcome> {
        let repo = self.db.preferences();
        let mut existing = repo.for_member(&member.id).await?;

        let parsed = self
            .assistant
            .extract_preferences(member, text, &existing)
            .await;
        if let sdk::Parsed::Fallback { reason, .. } = &parsed {
            warn!(member = %member.name, "Preference extraction fell back: {}", reason);
        }
        let extraction = parsed.into_value();

        if !extraction.has_food_content {
            debug!(member = %member.name, "Message has no food content");
            return Ok(ExtractionOutcome::default());
        }

        let mut outcome = ExtractionOutcome {
            wishes: extraction.wishes,
            ..Default::default()
        };

        for fact in &extraction.preferences {
            self.reconcile(member, text, fact, &mut existing, &mut outcome)
                .await?;
        }

        if !outcome.inserted.is_empty() || !outcome.wishes.is_empty() {
            info!(
                member = %member.name,
                "Extracted {} new preference(s), {} update(s), {} wish(es)",
                outcome.inserted.len(),
                outcome.escalated.len(),
                outcome.wishes.len()
            );
        }

        Ok(outcome)
    }

    async fn reconcile(
        &self,
        member: &FamilyMember,
        text: &str,
        fact: &ExtractedPreference,
        existing: &mut Vec<Preference>,
        outcome: &mut ExtractionOutcome,
    ) -> Result<()> {
        // An empty detail would be a substring of every stored preference
        if fact.detail.trim().is_empty() {
            return Ok(());
        }

        let repo = self.db.preferences();

        let matched = find_matching(existing, &fact.category, &fact.detail)
            .and_then(|pref| pref.id.map(|id| (id, pref.confidence)));

        if let Some((id, current)) = matched {
            let confidence = escalated_confidence(current, fact.confidence);
            repo.update_confidence(id, confidence).await?;
            if let Some(pref) = existing.iter_mut().find(|p| p.id == Some(id)) {
                pref.confidence = confidence;
            }
            outcome.escalated.push((id, confidence));
            return Ok(());
        }

        let mut preference = Preference {
            id: None,
            member_id: member.id.clone(),
            category: fact.category.clone(),
            detail: fact.detail.clone(),
            confidence: fact.confidence.clamp(0.0, 1.0),
            source: "conversation".to_string(),
            extracted_from: Some(excerpt(text)),
            created_at: Utc::now(),
            updated_at: None,
        };
        preference.id = Some(repo.insert(&preference).await?);

        existing.push(preference.clone());
        outcome.inserted.push(preference);
        Ok(())
    }
}
