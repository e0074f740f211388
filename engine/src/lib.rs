//! Potluck Engine Library
//!
//! The household dinner-planning agent: session workflow, preference
//! learning, ingredient merging, cart filling and the adapters around them.
//! Used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Database persistence module
pub mod db;

/// LLM provider abstraction layer
pub mod llm;

/// LLM-backed planning assistant
pub mod planner;

/// Telegram messaging channel
pub mod bot;

/// Grocery catalog adapters
pub mod catalog;

/// Markdown export of recipes and plans
pub mod exporter;

/// Weekly planning schedule
pub mod scheduler;

/// Session workflow and orchestration
pub mod session;

/// Ingredient normalization and merging
pub mod merge;

/// Preference reconciliation
pub mod preferences;

/// Cart reconciliation
pub mod cart;

/// Message catalog
pub mod i18n;

/// Chat message rendering
pub mod formatter;

/// Telemetry and Observability
pub mod telemetry;

/// Daemon lifecycle and polling loop
pub mod daemon;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
