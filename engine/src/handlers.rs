//! Command handlers for CLI operations
//!
//! Every read-only command opens the database directly; `start` hands the
//! request to a running daemon through the agent state table instead of
//! racing it for the active session.

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use serde_json::json;
use std::time::Duration;

use crate::config::{Config, Secrets};
use crate::daemon::runner::open_database;
use crate::daemon::{build_orchestrator, DaemonManager, PlanningLoop};
use crate::db::state::START_REQUEST_KEY;
use crate::db::Database;
use crate::formatter::format_recipe_detail;
use crate::scheduler::ScheduleTracker;
use crate::session::StartOutcome;
use sdk::types::{Recipe, Session};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Run the polling loop in the foreground until SIGTERM or Ctrl-C
pub async fn handle_run(config: &Config) -> Result<()> {
    let secrets = Secrets::from_env();
    let mut manager = DaemonManager::new(config);
    manager.start()?;

    let db = open_database(config).await?;
    manager.set_database(db.clone());

    let (orchestrator, channel) = build_orchestrator(config, &secrets, db.clone())?;
    let mut planning = PlanningLoop::new(
        db,
        channel,
        orchestrator,
        Duration::from_secs(config.agent.poll_interval_secs),
    );
    if let Some(schedule) = config.weekly_schedule() {
        planning = planning.with_schedule(ScheduleTracker::new(schedule, Local::now().naive_local()));
    }

    tracing::info!(pid = std::process::id(), "Potluck is running");
    let result = planning.run(manager.shutdown_flag()).await;
    manager.graceful_shutdown().await;
    result
}

/// Trigger a planning session, through the daemon when one is running
pub async fn handle_start(config: &Config, format: OutputFormat) -> Result<()> {
    let db = open_database(config).await?;

    if DaemonManager::status(config).is_running {
        db.state()
            .set(START_REQUEST_KEY, &Utc::now().to_rfc3339())
            .await?;
        match format {
            OutputFormat::Text => println!("Start requested; the daemon picks it up on its next tick."),
            OutputFormat::Json => println!("{}", json!({ "requested": true })),
        }
        return Ok(());
    }

    let (mut orchestrator, _channel) = build_orchestrator(config, &Secrets::from_env(), db.clone())?;
    orchestrator.resume().await?;
    let outcome = orchestrator.start_session(None).await?;
    db.close().await?;

    match (format, outcome) {
        (OutputFormat::Text, StartOutcome::Started { session_id }) => {
            println!("Started session {}", session_id);
            println!("Run `potluck run` to keep collecting answers.");
        }
        (OutputFormat::Text, StartOutcome::AlreadyActive { state }) => {
            println!("A session is already active ({})", state);
        }
        (OutputFormat::Json, StartOutcome::Started { session_id }) => {
            println!("{}", json!({ "started": true, "session_id": session_id }));
        }
        (OutputFormat::Json, StartOutcome::AlreadyActive { state }) => {
            println!("{}", json!({ "started": false, "active_state": state }));
        }
    }

    Ok(())
}

pub async fn handle_status(config: &Config, format: OutputFormat) -> Result<()> {
    let status = DaemonManager::status(config);
    let db = open_database(config).await?;
    let active = db.sessions().get_active().await?;
    let cursor = db.state().cursor().await?;
    let next_run = config
        .weekly_schedule()
        .and_then(|schedule| schedule.next_after(Local::now().naive_local()));
    db.close().await?;

    match format {
        OutputFormat::Text => {
            if status.is_running {
                println!("Potluck daemon is running (PID {})", status.pid.unwrap_or(0));
            } else {
                println!("Potluck daemon is not running.");
            }
            match &active {
                Some(session) => println!(
                    "Active session: {} ({}, since {})",
                    session.id,
                    session.state,
                    session.state_entered_at.format("%Y-%m-%d %H:%M")
                ),
                None => println!("No active session."),
            }
            match next_run {
                Some(next) => println!("Next scheduled planning: {}", next.format("%a %Y-%m-%d %H:%M")),
                None => println!("Weekly schedule disabled."),
            }
            if let Some(cursor) = cursor {
                println!("Last processed message: {}", cursor);
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "running": status.is_running,
                "pid": status.pid,
                "session": active,
                "next_run": next_run.map(|next| next.to_string()),
                "cursor": cursor,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub async fn handle_history(weeks: u32, config: &Config, format: OutputFormat) -> Result<()> {
    let db = open_database(config).await?;
    let entries = db
        .history()
        .recent_weeks(Local::now().date_naive(), weeks)
        .await
        .context("Failed to fetch meal history")?;
    db.close().await?;

    match format {
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No dinners in the last {} week(s)", weeks);
                return Ok(());
            }

            println!("Dinners of the last {} week(s):", weeks);
            println!();
            for entry in &entries {
                let protein = entry.main_protein.as_deref().unwrap_or("-");
                println!(
                    "  {}  {:<40} {:<12} {}",
                    entry.cooked_date, entry.recipe_name, entry.cuisine, protein
                );
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "weeks": weeks,
                "count": entries.len(),
                "entries": entries,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// The running session, or the most recent one, with its recipes
pub async fn latest_menu(db: &Database) -> Result<Option<(Session, Vec<Recipe>)>> {
    let session = match db.sessions().get_active().await? {
        Some(session) => Some(session),
        None => db.sessions().list_recent(1).await?.into_iter().next(),
    };
    let Some(session) = session else {
        return Ok(None);
    };

    let recipes = db
        .recipes()
        .for_session(&session.id)
        .await
        .context("Failed to fetch recipes")?;
    Ok(Some((session, recipes)))
}

pub async fn handle_menu(config: &Config, format: OutputFormat) -> Result<()> {
    let db = open_database(config).await?;
    let menu = latest_menu(&db).await?;
    db.close().await?;

    match format {
        OutputFormat::Text => {
            let Some((session, recipes)) = menu.filter(|(_, recipes)| !recipes.is_empty()) else {
                println!("No menu planned yet");
                return Ok(());
            };

            println!("Menu of session {} ({}):", session.id, session.state);
            for recipe in &recipes {
                println!();
                println!("{}", recipe.planned_date);
                println!("{}", format_recipe_detail(recipe, config.locale()));
            }
        }
        OutputFormat::Json => {
            let output = match menu {
                Some((session, recipes)) => json!({
                    "session_id": session.id,
                    "state": session.state.as_str(),
                    "recipes": recipes,
                }),
                None => json!({ "session_id": null, "recipes": [] }),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub async fn handle_preferences(
    member: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let db = open_database(config).await?;
    let members = db.members().list().await?;

    let selected: Vec<_> = match &member {
        Some(wanted) => members
            .iter()
            .filter(|m| m.name.eq_ignore_ascii_case(wanted) || m.address == *wanted)
            .collect(),
        None => members.iter().collect(),
    };
    if selected.is_empty() {
        db.close().await?;
        anyhow::bail!("No family member named '{}'", member.unwrap_or_default());
    }

    let mut grouped = Vec::new();
    for m in selected {
        let mut preferences = db.preferences().for_member(&m.id).await?;
        preferences.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        grouped.push((m, preferences));
    }
    db.close().await?;

    match format {
        OutputFormat::Text => {
            for (m, preferences) in &grouped {
                println!("{} ({})", m.name, m.role);
                if preferences.is_empty() {
                    println!("  nothing learned yet");
                }
                for preference in preferences {
                    println!(
                        "  {:<10} {:<30} {:.2}  {}",
                        preference.category, preference.detail, preference.confidence, preference.source
                    );
                }
                println!();
            }
        }
        OutputFormat::Json => {
            let output: Vec<_> = grouped
                .iter()
                .map(|(m, preferences)| json!({ "member": m, "preferences": preferences }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub async fn handle_members(config: &Config, format: OutputFormat) -> Result<()> {
    let db = open_database(config).await?;
    let members = db.members().list().await?;
    db.close().await?;

    match format {
        OutputFormat::Text => {
            if members.is_empty() {
                println!("No family members configured. Add [[family.members]] to the config.");
                return Ok(());
            }
            for member in &members {
                println!("  {:<20} {:<8} {}", member.name, member.role, member.address);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&members)?);
        }
    }

    Ok(())
}

pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let text = toml::to_string_pretty(config).context("Failed to render configuration")?;
            println!("{}", text);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
    }

    let secrets = Secrets::from_env();
    let present = |value: &Option<String>| if value.is_some() { "set" } else { "missing" };
    if matches!(format, OutputFormat::Text) {
        println!("# secrets (environment)");
        println!("# ANTHROPIC_API_KEY: {}", present(&secrets.anthropic_api_key));
        println!("# POTLUCK_TELEGRAM_TOKEN: {}", present(&secrets.telegram_token));
        println!("# PICNIC_USERNAME: {}", present(&secrets.picnic_username));
        println!("# PICNIC_PASSWORD: {}", present(&secrets.picnic_password));
    }

    Ok(())
}
