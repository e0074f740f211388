//! Collaborator contracts
//!
//! The session orchestrator and the reconciliation engines only talk to the
//! outside world through these traits. Production adapters live in the
//! engine crate (LLM assistant, Telegram, Picnic, markdown export); tests
//! provide in-memory fakes.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::EngineError;
use crate::types::{
    FamilyMember, IncomingMessage, Ingredient, MealHistoryEntry, MealPlan, MemberRole,
    Preference, Recipe, Session, SessionState,
};

/// Result of asking a collaborator for structured output
///
/// Malformed or unavailable output never becomes an error at the call site:
/// the adapter returns a neutral value together with the reason.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Structured(T),
    Fallback { value: T, reason: String },
}

impl<T> Parsed<T> {
    pub fn fallback(value: T, reason: impl Into<String>) -> Self {
        Self::Fallback {
            value,
            reason: reason.into(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Structured(value) | Self::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Structured(value) | Self::Fallback { value, .. } => value,
        }
    }
}

/// Intent of an inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Trigger,
    Preference,
    Approval,
    Rejection,
    ChangeRequest,
    PantryResponse,
    Cancel,
    Greeting,
    Other,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::Preference => "preference",
            Self::Approval => "approval",
            Self::Rejection => "rejection",
            Self::ChangeRequest => "change_request",
            Self::PantryResponse => "pantry_response",
            Self::Cancel => "cancel",
            Self::Greeting => "greeting",
            Self::Other => "other",
        }
    }

    /// Maps a classifier label onto an intent; unknown labels become `Other`
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "trigger" => Self::Trigger,
            "preference" => Self::Preference,
            "approval" => Self::Approval,
            "rejection" => Self::Rejection,
            "change_request" => Self::ChangeRequest,
            "pantry_response" => Self::PantryResponse,
            "cancel" => Self::Cancel,
            "greeting" => Self::Greeting,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    pub confidence: f64,
    pub summary: String,
}

impl Classification {
    /// Neutral classification used when the classifier output is unusable
    pub fn neutral() -> Self {
        Self {
            intent: Intent::Other,
            confidence: 0.0,
            summary: "Could not classify".to_string(),
        }
    }
}

fn default_fact_confidence() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPreference {
    pub category: String,
    pub detail: String,
    #[serde(default = "default_fact_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub is_update: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceExtraction {
    #[serde(default)]
    pub preferences: Vec<ExtractedPreference>,
    #[serde(default, alias = "specific_wishes")]
    pub wishes: Vec<String>,
    #[serde(default = "default_true")]
    pub has_food_content: bool,
}

impl PreferenceExtraction {
    pub fn empty() -> Self {
        Self {
            preferences: Vec::new(),
            wishes: Vec::new(),
            has_food_content: false,
        }
    }
}

/// Inputs for plan generation
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub members: Vec<FamilyMember>,
    pub preferences: Vec<Preference>,
    /// Wishes for this run keyed by member id
    pub wishes: BTreeMap<String, Vec<String>>,
    pub recent_history: Vec<MealHistoryEntry>,
    pub num_days: u32,
    pub start_date: NaiveDate,
}

/// A product returned by catalog search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub unit_quantity: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
}

fn default_count() -> u32 {
    1
}

/// The selection collaborator's verdict for one ingredient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSelection {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub note: Option<String>,
}

impl ProductSelection {
    pub fn no_match(note: impl Into<String>) -> Self {
        Self {
            product_id: None,
            product_name: None,
            count: 0,
            confidence: 0.0,
            note: Some(note.into()),
        }
    }
}

/// Natural-language judgments used by the orchestrator
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn classify(
        &self,
        text: &str,
        state: SessionState,
        role: MemberRole,
    ) -> Parsed<Classification>;

    async fn generate_plan(&self, request: &PlanRequest) -> Result<MealPlan, EngineError>;

    /// An empty recipe list means no change was produced
    async fn revise_plan(&self, current: &[Recipe], feedback: &str)
        -> Result<MealPlan, EngineError>;

    async fn extract_preferences(
        &self,
        member: &FamilyMember,
        text: &str,
        existing: &[Preference],
    ) -> Parsed<PreferenceExtraction>;

    /// Returns the subset of `ingredient_names` the text says is at home
    async fn match_pantry_text(&self, text: &str, ingredient_names: &[String])
        -> Parsed<Vec<String>>;
}

/// Search-term generation and product choice for cart filling
#[async_trait]
pub trait ProductAdvisor: Send + Sync {
    async fn generate_search_terms(&self, ingredient: &Ingredient) -> Parsed<Vec<String>>;

    async fn select_best_product(
        &self,
        ingredient: &Ingredient,
        candidates: &[CatalogProduct],
    ) -> Parsed<ProductSelection>;
}

/// Grocery catalog
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn search(&self, term: &str) -> Result<Vec<CatalogProduct>, EngineError>;

    async fn add_product(&self, product_id: &str, count: u32) -> Result<(), EngineError>;
}

/// Text messaging transport
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Messages with an id greater than `cursor`, oldest first
    async fn poll_new(&self, cursor: Option<i64>) -> Result<Vec<IncomingMessage>, EngineError>;

    /// Returns whether the transport accepted the message
    async fn send(&self, recipient: &str, text: &str) -> bool;
}

/// Writes an approved plan somewhere people can read it
pub trait PlanExporter: Send + Sync {
    fn export(&self, session: &Session, recipes: &[Recipe]) -> Result<(), EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_intent_label_is_other() {
        assert_eq!(Intent::from_label("CHANGE_REQUEST"), Intent::ChangeRequest);
        assert_eq!(Intent::from_label("shopping"), Intent::Other);
    }

    #[test]
    fn test_parsed_fallback_keeps_value() {
        let parsed = Parsed::fallback(Classification::neutral(), "not json");
        assert!(parsed.is_fallback());
        assert_eq!(parsed.into_value().intent, Intent::Other);
    }

    #[test]
    fn test_extraction_defaults() {
        let extraction: PreferenceExtraction = serde_json::from_str(
            r#"{"preferences":[{"category":"likes","detail":"pasta"}],"specific_wishes":["tacos"]}"#,
        )
        .unwrap();
        assert!(extraction.has_food_content);
        assert_eq!(extraction.wishes, vec!["tacos".to_string()]);
        assert_eq!(extraction.preferences[0].confidence, 0.5);
    }

    #[test]
    fn test_selection_defaults() {
        let selection: ProductSelection =
            serde_json::from_str(r#"{"product_id":"s100","confidence":0.8}"#).unwrap();
        assert_eq!(selection.count, 1);
        assert_eq!(selection.product_id.as_deref(), Some("s100"));
    }
}
