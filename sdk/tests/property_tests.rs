use proptest::prelude::*;
use sdk::collaborators::Intent;
use sdk::errors::{EngineError, PlannerErrorExt};
use sdk::types::{normalize_name, SessionState};

// User hints are static text and never echo the underlying detail.
proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "[a-z0-9_-]{12,40}") {
        let errs = vec![
            EngineError::Config(error_str.clone()),
            EngineError::Database(error_str.clone()),
            EngineError::LlmProvider(error_str.clone()),
            EngineError::Transport(error_str.clone()),
            EngineError::Catalog(error_str.clone()),
            EngineError::CatalogAuth(error_str.clone()),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            prop_assert!(!hint.contains(&error_str));
        }
    }
}

// Classifier labels never fail to map onto an intent.
proptest! {
    #[test]
    fn test_intent_label_total(label in "\\PC*") {
        let intent = Intent::from_label(&label);
        prop_assert_eq!(Intent::from_label(intent.as_str()), intent);
    }
}

proptest! {
    #[test]
    fn test_normalize_name_idempotent(name in "[A-Za-z ]{0,30}") {
        let once = normalize_name(&name);
        prop_assert_eq!(normalize_name(&once), once.clone());
    }
}

#[test]
fn test_state_labels_are_unique() {
    let mut labels: Vec<&str> = SessionState::ALL.iter().map(|s| s.as_str()).collect();
    labels.sort();
    labels.dedup();
    assert_eq!(labels.len(), SessionState::ALL.len());
}
