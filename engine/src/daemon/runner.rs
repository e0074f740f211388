//! Cooperative polling loop
//!
//! One tick: fetch messages after the stored cursor, handle them in order,
//! evaluate timeouts, check the weekly schedule, then store the new cursor.
//! The cursor is only written after every fetched message was handled, so a
//! crash mid-tick replays those messages on the next start.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use sdk::collaborators::{Assistant, Catalog, MessageChannel, ProductAdvisor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::bot::TelegramChannel;
use crate::cart::CartEngine;
use crate::catalog::PicnicClient;
use crate::config::{Config, Secrets};
use crate::db::state::START_REQUEST_KEY;
use crate::db::Database;
use crate::exporter::MarkdownExporter;
use crate::llm::anthropic::AnthropicProvider;
use crate::llm::ollama::OllamaProvider;
use crate::llm::LLMProvider;
use crate::planner::LlmAssistant;
use crate::scheduler::ScheduleTracker;
use crate::session::{Orchestrator, OrchestratorSettings, SessionEvent, StartOutcome};

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub messages: usize,
    pub failed: usize,
    pub timeout: Option<SessionEvent>,
    pub scheduled: Option<StartOutcome>,
}

pub struct PlanningLoop {
    db: Database,
    channel: Arc<dyn MessageChannel>,
    orchestrator: Orchestrator,
    schedule: Option<ScheduleTracker>,
    poll_interval: Duration,
}

impl PlanningLoop {
    pub fn new(
        db: Database,
        channel: Arc<dyn MessageChannel>,
        orchestrator: Orchestrator,
        poll_interval: Duration,
    ) -> Self {
        Self {
            db,
            channel,
            orchestrator,
            schedule: None,
            poll_interval,
        }
    }

    pub fn with_schedule(mut self, schedule: ScheduleTracker) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub async fn tick(&mut self, now: DateTime<Utc>, local_now: NaiveDateTime) -> Result<TickReport> {
        let mut report = TickReport::default();
        let cursor = self.db.state().cursor().await?;

        let messages = match self.channel.poll_new(cursor).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Failed to poll messages: {}", e);
                Vec::new()
            }
        };

        let mut newest = cursor;
        for message in &messages {
            report.messages += 1;
            if let Err(e) = self.orchestrator.handle_message(message).await {
                report.failed += 1;
                error!(message_id = message.id, "Failed to handle message: {:#}", e);
            }
            newest = newest.max(Some(message.id));
        }

        report.timeout = self.orchestrator.check_timeouts(now).await?;

        let requested = self.db.state().take(START_REQUEST_KEY).await?.is_some();
        let scheduled = match &mut self.schedule {
            Some(schedule) => schedule.due(local_now),
            None => false,
        };
        if requested || scheduled {
            info!(requested, scheduled, "Starting planning session");
            report.scheduled = Some(self.orchestrator.start_session(None).await?);
        }

        if newest != cursor {
            if let Some(newest) = newest {
                self.db.state().set_cursor(newest).await?;
            }
        }

        Ok(report)
    }

    /// Tick until the shutdown flag is set; the running tick always finishes
    pub async fn run(&mut self, shutdown: Arc<AtomicBool>) -> Result<()> {
        if let Some(state) = self.orchestrator.resume().await? {
            info!(state = %state, "Continuing session from previous run");
        }
        if let Some(next) = self.schedule.as_ref().and_then(|s| s.next_fire()) {
            info!(next = %next, "Next scheduled planning");
        }

        while !shutdown.load(Ordering::Relaxed) {
            if let Err(e) = self.tick(Utc::now(), Local::now().naive_local()).await {
                error!("Tick failed: {:#}", e);
            }

            let mut waited = Duration::ZERO;
            while waited < self.poll_interval && !shutdown.load(Ordering::Relaxed) {
                let step = Duration::from_millis(250).min(self.poll_interval - waited);
                tokio::time::sleep(step).await;
                waited += step;
            }
        }

        info!("Polling loop stopped");
        Ok(())
    }
}

pub fn build_provider(config: &Config, secrets: &Secrets) -> Arc<dyn LLMProvider> {
    match config.llm.provider.as_str() {
        "ollama" => Arc::new(OllamaProvider::new(&config.llm.ollama.base_url)),
        _ => Arc::new(AnthropicProvider::new(
            &config.llm.anthropic.base_url,
            secrets.anthropic_api_key.clone().unwrap_or_default(),
        )),
    }
}

/// Wire the production collaborators from configuration
pub fn build_orchestrator(
    config: &Config,
    secrets: &Secrets,
    db: Database,
) -> Result<(Orchestrator, Arc<dyn MessageChannel>)> {
    let locale = config.locale();
    let channel: Arc<dyn MessageChannel> = Arc::new(TelegramChannel::new(
        &config.telegram.api_base,
        secrets.require_telegram_token()?,
    ));

    let assistant = Arc::new(LlmAssistant::new(
        build_provider(config, secrets),
        &config.llm.planning_model,
        &config.llm.extraction_model,
        locale,
    ));

    let (username, password) = secrets.require_picnic()?;
    let catalog: Arc<dyn Catalog> = Arc::new(PicnicClient::new(
        config.picnic.storefront_url(),
        username,
        password,
    ));
    let advisor: Arc<dyn ProductAdvisor> = assistant.clone();
    let cart = CartEngine::new(catalog, advisor);

    let settings = OrchestratorSettings {
        locale,
        plan_days: config.agent.plan_days,
        history_weeks: config.agent.history_weeks,
        preference_timeout: chrono::Duration::hours(config.agent.preference_timeout_hours as i64),
        pantry_timeout: chrono::Duration::hours(config.agent.pantry_timeout_hours as i64),
    };

    let assistant: Arc<dyn Assistant> = assistant;
    let mut orchestrator = Orchestrator::new(db, Arc::clone(&channel), assistant, cart, settings);
    if config.export.enabled {
        orchestrator = orchestrator.with_exporter(Arc::new(MarkdownExporter::new(
            &config.export.path,
            locale,
        )));
    }

    Ok((orchestrator, channel))
}

/// Open the database and bring the member table in line with the config
pub async fn open_database(config: &Config) -> Result<Database> {
    let db = Database::new(&config.database_path()).await?;
    let members = db
        .members()
        .sync_from_config(&config.family.members)
        .await
        .context("Failed to sync family members")?;
    if members.iter().all(|member| !member.is_parent()) {
        warn!("No parent configured; plans and questions will not be delivered");
    }
    Ok(db)
}
