//! Household planning domain types
//!
//! These types are shared between the engine, its persistence layer and the
//! collaborator adapters. They carry no behaviour beyond small helpers that
//! every caller would otherwise repeat.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Ingredient categories eligible for the "already have it" pantry check
pub const PANTRY_STAPLE_CATEGORIES: &[&str] = &["pantry", "spice"];

/// Role of a household member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Parent,
    Child,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Child => "child",
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "parent" => Ok(Self::Parent),
            "child" => Ok(Self::Child),
            other => Err(format!("unknown member role '{}'", other)),
        }
    }
}

/// A household participant reachable over the messaging channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: String,
    pub name: String,
    /// Channel address (for Telegram: the numeric user id)
    pub address: String,
    pub role: MemberRole,
}

impl FamilyMember {
    pub fn is_parent(&self) -> bool {
        self.role == MemberRole::Parent
    }
}

/// Workflow state of a planning session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    CollectingPreferences,
    GeneratingPlan,
    AwaitingApproval,
    CompilingIngredients,
    CheckingPantry,
    FillingCart,
    Completed,
}

impl SessionState {
    pub const ALL: [SessionState; 8] = [
        Self::Idle,
        Self::CollectingPreferences,
        Self::GeneratingPlan,
        Self::AwaitingApproval,
        Self::CompilingIngredients,
        Self::CheckingPantry,
        Self::FillingCart,
        Self::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CollectingPreferences => "collecting_preferences",
            Self::GeneratingPlan => "generating_plan",
            Self::AwaitingApproval => "awaiting_approval",
            Self::CompilingIngredients => "compiling_ingredients",
            Self::CheckingPantry => "checking_pantry",
            Self::FillingCart => "filling_cart",
            Self::Completed => "completed",
        }
    }

    /// A session in an active state blocks new sessions from starting
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Completed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("unknown session state '{}'", s))
    }
}

/// One run of the planning workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub state: SessionState,
    /// Member id of whoever started the session, `None` for scheduled runs
    pub triggered_by: Option<String>,
    pub plan_start_date: Option<NaiveDate>,
    pub plan_end_date: Option<NaiveDate>,
    pub state_entered_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Wishes for this run keyed by member id
    pub collected_wishes: BTreeMap<String, Vec<String>>,
    pub members_responded: BTreeSet<String>,
    pub approval_feedback: Vec<String>,
}

impl Session {
    pub fn new(id: impl Into<String>, triggered_by: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            state: SessionState::Idle,
            triggered_by,
            plan_start_date: None,
            plan_end_date: None,
            state_entered_at: now,
            created_at: now,
            updated_at: now,
            collected_wishes: BTreeMap::new(),
            members_responded: BTreeSet::new(),
            approval_feedback: Vec::new(),
        }
    }

    /// Clears everything gathered during preference collection
    pub fn reset_collection(&mut self) {
        self.collected_wishes.clear();
        self.members_responded.clear();
        self.approval_feedback.clear();
    }
}

/// Resolution status of an ingredient against the grocery catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    #[default]
    Pending,
    Found,
    NotFound,
    Skipped,
}

impl SearchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::Skipped => "skipped",
        }
    }
}

impl FromStr for SearchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "found" => Ok(Self::Found),
            "not_found" => Ok(Self::NotFound),
            "skipped" => Ok(Self::Skipped),
            other => Err(format!("unknown search status '{}'", other)),
        }
    }
}

/// A single line of a recipe's ingredient list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Option<i64>,
    pub recipe_id: Option<String>,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: String,
    pub optional: bool,
    pub already_available: bool,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub added_to_cart: bool,
    pub search_status: SearchStatus,
}

impl Ingredient {
    pub fn new(
        name: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            recipe_id: None,
            name: name.into(),
            quantity,
            unit: unit.into(),
            category: category.into(),
            optional: false,
            already_available: false,
            product_id: None,
            product_name: None,
            added_to_cart: false,
            search_status: SearchStatus::Pending,
        }
    }

    /// Case-insensitive, trimmed name used as the merge and cache key
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn is_pantry_staple(&self) -> bool {
        PANTRY_STAPLE_CATEGORIES.contains(&self.category.as_str())
    }
}

/// Canonical form of an ingredient name
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A planned dinner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub session_id: Option<String>,
    pub planned_date: NaiveDate,
    pub name: String,
    pub description: String,
    pub servings: u32,
    pub prep_time_minutes: u32,
    pub cook_time_minutes: u32,
    pub cuisine: String,
    pub tags: Vec<String>,
    pub instructions: String,
    pub approved: bool,
    pub ingredients: Vec<Ingredient>,
}

impl Recipe {
    pub fn total_minutes(&self) -> u32 {
        self.prep_time_minutes + self.cook_time_minutes
    }
}

/// Recipes produced by one plan generation or revision
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub recipes: Vec<Recipe>,
    pub reasoning: String,
}

/// A durable, confidence-scored food fact about a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    pub id: Option<i64>,
    pub member_id: String,
    /// likes, dislikes, allergy, diet, ...
    pub category: String,
    pub detail: String,
    pub confidence: f64,
    pub source: String,
    pub extracted_from: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Direction of a logged message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub id: Option<i64>,
    pub session_id: Option<String>,
    pub member_id: String,
    pub direction: Direction,
    pub text: String,
    pub transport_message_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

/// A cooked dinner, kept for variety lookback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealHistoryEntry {
    pub id: Option<i64>,
    pub recipe_name: String,
    pub cuisine: String,
    pub main_protein: Option<String>,
    pub tags: Vec<String>,
    pub cooked_date: NaiveDate,
    pub rating: Option<u8>,
    pub session_id: Option<String>,
}

/// A message received from the messaging channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Monotonic transport id, used as the polling cursor
    pub id: i64,
    /// Sender's channel address
    pub sender: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}
