//! Potluck SDK
//!
//! Shared library providing the household planning domain types, the
//! collaborator traits the engine consumes, and the common error type.

/// Collaborator traits and their request/response types
pub mod collaborators;

/// Error types and handling
pub mod errors;

/// Domain types
pub mod types;

// Re-export commonly used types
pub use collaborators::{
    Assistant, Catalog, CatalogProduct, Classification, ExtractedPreference, Intent,
    MessageChannel, Parsed, PlanExporter, PlanRequest, PreferenceExtraction, ProductAdvisor,
    ProductSelection,
};
pub use errors::{EngineError, PlannerErrorExt};
pub use types::{
    normalize_name, ConversationEntry, Direction, FamilyMember, IncomingMessage, Ingredient,
    MealHistoryEntry, MealPlan, MemberRole, Preference, Recipe, SearchStatus, Session,
    SessionState, PANTRY_STAPLE_CATEGORIES,
};
