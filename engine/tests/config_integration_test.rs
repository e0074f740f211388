//! Integration tests for configuration management
//!
//! These tests go through the file system: creating a default config on
//! first run, loading a hand-written one and rejecting broken files.

use chrono::{NaiveDate, NaiveTime, Weekday};
use potluck_engine::config::Config;
use potluck_engine::i18n::Locale;
use sdk::MemberRole;
use std::fs;
use tempfile::TempDir;

const FULL_CONFIG: &str = r#"
[core]
data_dir = "/var/lib/potluck"
log_level = "debug"
language = "en"

[agent]
poll_interval_secs = 2
preference_timeout_hours = 6
pantry_timeout_hours = 1
plan_days = 5
history_weeks = 4

[[family.members]]
name = " Anna "
address = "100"
role = "parent"

[[family.members]]
name = "Tim"
address = "200"
role = "child"

[llm]
provider = "ollama"
planning_model = "llama3.1:8b"
extraction_model = "llama3.1:8b"

[llm.ollama]
base_url = "http://localhost:11434"

[picnic]
country_code = "DE"
api_version = "17"

[schedule]
enabled = true
day = "sat"
hour = 9
minute = 30

[export]
enabled = false
path = "/tmp/plans"
"#;

#[test]
fn test_load_or_create_writes_default_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let config = Config::load_or_create_at(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config.core.log_level, "info");
    assert_eq!(config.agent.plan_days, 4);
    assert!(config.family.members.is_empty());

    // A second call reads the file that was just written
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("[schedule]"));
    let reloaded = Config::load_or_create_at(&path).unwrap();
    assert_eq!(reloaded.core.data_dir, config.core.data_dir);
}

#[test]
fn test_full_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, FULL_CONFIG).unwrap();

    let config = Config::load_from_path(&path).unwrap();

    assert_eq!(config.locale(), Locale::En);
    assert_eq!(config.agent.poll_interval_secs, 2);
    assert_eq!(config.agent.preference_timeout_hours, 6);
    assert_eq!(config.family.members.len(), 2);
    assert_eq!(config.family.members[0].name, "Anna");
    assert_eq!(config.family.members[0].role, MemberRole::Parent);
    assert_eq!(config.llm.provider, "ollama");
    assert!(config.picnic.storefront_url().contains("storefront-prod.de"));
    assert!(config.picnic.storefront_url().contains("/api/17"));
    assert!(!config.export.enabled);

    let schedule = config.weekly_schedule().unwrap();
    assert_eq!(schedule.weekday, Weekday::Sat);
    assert_eq!(schedule.time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());

    assert_eq!(
        config.database_path(),
        std::path::PathBuf::from("/var/lib/potluck/potluck.db")
    );
}

#[test]
fn test_disabled_schedule_never_fires() {
    let config = Config::from_toml("[schedule]\nenabled = false").unwrap();
    let schedule = config.weekly_schedule().unwrap();
    let now = NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    assert!(schedule.next_after(now).is_none());
}

#[test]
fn test_broken_files_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");

    fs::write(&path, "[core\nlog_level = ").unwrap();
    assert!(Config::load_from_path(&path).is_err());

    fs::write(&path, "[schedule]\nday = \"someday\"").unwrap();
    let err = Config::load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("someday"));

    assert!(Config::load_from_path(&temp_dir.path().join("missing.toml")).is_err());
}
