//! Error types and handling
//!
//! This module provides the error type shared by the planner engine and its
//! collaborator adapters. Every error implements [`PlannerErrorExt`], which
//! gives a household-friendly hint and says whether the operation can be
//! retried on a later polling tick.
//!
//! # Privacy
//!
//! Messages never carry API keys, catalog credentials or bot tokens. Raw
//! collaborator output is truncated before it is embedded in an error.

use thiserror::Error;

/// Extensions for planner errors
pub trait PlannerErrorExt {
    /// Returns a short hint that is safe to show to family members or the
    /// operator.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors are expected to clear up on a later tick (network
    /// blips, a busy LLM provider). Non-recoverable errors need the operator
    /// to fix configuration or credentials.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: invalid or missing configuration
/// - **Database**: SQLite operation failures
/// - **LLM Provider**: completion service failures and malformed replies
/// - **Transport**: messaging channel failures
/// - **Catalog**: grocery catalog search, login and cart failures
/// - **Session**: workflow rule violations
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, PlannerErrorExt};
///
/// let error = EngineError::Transport("connection reset".to_string());
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::CatalogAuth("bad credentials".to_string());
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LlmProvider(String),

    #[error("Malformed collaborator response: {0}")]
    MalformedResponse(String),

    // Messaging errors
    #[error("Transport error: {0}")]
    Transport(String),

    // Catalog errors
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Catalog authentication failed: {0}")]
    CatalogAuth(String),

    // Session workflow errors
    #[error("A planning session is already active ({0})")]
    SessionActive(String),

    #[error("Illegal transition: {event} is not allowed in state {state}")]
    IllegalTransition { state: String, event: String },

    // Daemon errors
    #[error("Daemon already running")]
    DaemonAlreadyRunning,

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlannerErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Database(_) => "Database operation failed. Try restarting the daemon",
            Self::LlmProvider(_) => "The assistant is unavailable. Check your API key and network",
            Self::MalformedResponse(_) => "The assistant gave an unexpected answer. Try again",
            Self::Transport(_) => "Messaging failed. Check the bot token and your connection",
            Self::Catalog(_) => "The grocery service is unavailable right now",
            Self::CatalogAuth(_) => "Grocery login failed. Check PICNIC_USERNAME and PICNIC_PASSWORD",
            Self::SessionActive(_) => "Finish or cancel the current plan first",
            Self::IllegalTransition { .. } => "That step is not possible right now",
            Self::DaemonAlreadyRunning => "Stop the existing daemon first with 'potluck stop'",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) | Self::CatalogAuth(_) | Self::DaemonAlreadyRunning => false,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints_do_not_leak_details() {
        let error = EngineError::LlmProvider("sk-ant-secret rejected".to_string());
        assert!(!error.user_hint().contains("sk-ant"));
    }

    #[test]
    fn test_illegal_transition_display() {
        let error = EngineError::IllegalTransition {
            state: "idle".to_string(),
            event: "approved".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Illegal transition: approved is not allowed in state idle"
        );
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_config_is_fatal() {
        assert!(!EngineError::Config("missing".to_string()).is_recoverable());
        assert!(EngineError::Catalog("timeout".to_string()).is_recoverable());
    }
}
