//! Session transition table
//!
//! Every state change of a planning session goes through [`next_state`].
//! A pair that is not in the table is an [`EngineError::IllegalTransition`].

use sdk::errors::EngineError;
use sdk::types::SessionState;
use std::fmt;

/// Something that moves a session forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    Start,
    /// Everyone answered, or a parent said to go ahead
    PreferencesComplete,
    PreferenceTimeout,
    /// A parent re-triggered a plan generation that failed earlier
    RetryGeneration,
    PlanGenerated,
    Approved,
    Rejected,
    /// A change request produced a replacement plan
    Revised,
    /// A change request produced nothing usable; the plan is shown again
    RevisionUnchanged,
    IngredientsCompiled,
    /// Nothing to ask about, straight to the cart
    PantrySkipped,
    PantryAnswered,
    PantryTimeout,
    CartFilled,
    Cancelled,
}

impl SessionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::PreferencesComplete => "preferences_complete",
            Self::PreferenceTimeout => "preference_timeout",
            Self::RetryGeneration => "retry_generation",
            Self::PlanGenerated => "plan_generated",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Revised => "revised",
            Self::RevisionUnchanged => "revision_unchanged",
            Self::IngredientsCompiled => "ingredients_compiled",
            Self::PantrySkipped => "pantry_skipped",
            Self::PantryAnswered => "pantry_answered",
            Self::PantryTimeout => "pantry_timeout",
            Self::CartFilled => "cart_filled",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The state reached by applying `event` in `state`
pub fn next_state(state: SessionState, event: SessionEvent) -> Result<SessionState, EngineError> {
    use self::SessionEvent as E;
    use sdk::types::SessionState as S;

    let next = match (state, event) {
        (S::Idle, E::Start) => S::CollectingPreferences,

        (S::CollectingPreferences, E::PreferencesComplete | E::PreferenceTimeout) => {
            S::GeneratingPlan
        }

        (S::GeneratingPlan, E::PlanGenerated) => S::AwaitingApproval,
        (S::GeneratingPlan, E::RetryGeneration) => S::GeneratingPlan,

        (S::AwaitingApproval, E::Approved) => S::CompilingIngredients,
        (S::AwaitingApproval, E::Rejected) => S::GeneratingPlan,
        (S::AwaitingApproval, E::Revised | E::RevisionUnchanged) => S::AwaitingApproval,

        (S::CompilingIngredients, E::IngredientsCompiled) => S::CheckingPantry,

        (S::CheckingPantry, E::PantrySkipped | E::PantryAnswered | E::PantryTimeout) => {
            S::FillingCart
        }

        (S::FillingCart, E::CartFilled) => S::Completed,

        (s, E::Cancelled) if s.is_active() => S::Completed,

        (state, event) => {
            return Err(EngineError::IllegalTransition {
                state: state.to_string(),
                event: event.to_string(),
            })
        }
    };

    Ok(next)
}
