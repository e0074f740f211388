//! Planning sessions
//!
//! [`transitions`] holds the state table, [`orchestrator`] the driver that
//! runs entry actions and routes inbound messages.

pub mod orchestrator;
pub mod transitions;

pub use orchestrator::{guess_protein, Orchestrator, OrchestratorSettings, StartOutcome};
pub use transitions::{next_state, SessionEvent};
