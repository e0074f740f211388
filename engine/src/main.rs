// Potluck household dinner planner
// Main entry point for the potluck binary

use clap::Parser;
use potluck_engine::cli::{Cli, Command, ConfigAction};
use potluck_engine::config::Config;
use potluck_engine::daemon::DaemonManager;
use potluck_engine::handlers::{
    handle_config_show, handle_history, handle_members, handle_menu, handle_preferences,
    handle_run, handle_start, handle_status, OutputFormat,
};
use potluck_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // RUST_LOG still wins over both
    init_telemetry_with_level(cli.log.as_deref().unwrap_or(&config.core.log_level));

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");
    tracing::debug!("Potluck v{} ({} - {})", version, commit, timestamp);

    match cli.command {
        Command::Run => handle_run(&config).await,

        Command::Start => handle_start(&config, format).await,

        Command::Stop => {
            tracing::info!("Stopping daemon...");
            DaemonManager::stop(&config).await?;
            println!("Potluck daemon stopped.");
            Ok(())
        }

        Command::Status => handle_status(&config, format).await,

        Command::History { weeks } => handle_history(weeks, &config, format).await,

        Command::Menu => handle_menu(&config, format).await,

        Command::Preferences { member } => handle_preferences(member, &config, format).await,

        Command::Members => handle_members(&config, format).await,

        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
        },
    }
}
