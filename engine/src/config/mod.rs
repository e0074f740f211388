//! Configuration management
//!
//! This module handles loading, validation, and management of the Potluck
//! configuration. Configuration is stored in TOML format at
//! ~/.potluck/config.toml and created with defaults on first run.
//!
//! # Configuration Sections
//!
//! - **core**: Data directory, log level, message language
//! - **agent**: Polling interval, timeouts, plan length
//! - **family**: Household members and their chat addresses
//! - **llm**: Provider and model selection
//! - **telegram**: Bot API endpoint
//! - **picnic**: Storefront country and API version
//! - **schedule**: Weekly automatic planning slot
//! - **export**: Markdown notes folder
//!
//! Credentials never live in the file. They are read from the environment
//! by [`Secrets::from_env`].
//!
//! # Examples
//!
//! ```no_run
//! use potluck_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Data dir: {:?}", config.core.data_dir);
//! println!("Members: {}", config.family.members.len());
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use sdk::types::MemberRole;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::i18n::Locale;
use crate::scheduler::{parse_weekday, WeeklySchedule};

pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_TELEGRAM_TOKEN: &str = "POTLUCK_TELEGRAM_TOKEN";
pub const ENV_PICNIC_USERNAME: &str = "PICNIC_USERNAME";
pub const ENV_PICNIC_PASSWORD: &str = "PICNIC_PASSWORD";

/// Longest meal history lookback accepted from config
pub const MAX_HISTORY_WEEKS: u32 = 520;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub core: CoreConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub family: FamilyConfig,

    #[serde(default)]
    pub llm: LLMConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub picnic: PicnicConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Language of outgoing messages (nl, en)
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_preference_timeout")]
    pub preference_timeout_hours: u32,

    #[serde(default = "default_pantry_timeout")]
    pub pantry_timeout_hours: u32,

    #[serde(default = "default_plan_days")]
    pub plan_days: u32,

    #[serde(default = "default_history_weeks")]
    pub history_weeks: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FamilyConfig {
    #[serde(default)]
    pub members: Vec<MemberConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberConfig {
    pub name: String,
    /// Chat address; for Telegram the numeric user id
    pub address: String,
    pub role: MemberRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// anthropic or ollama
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model used for generating and revising plans
    #[serde(default = "default_planning_model")]
    pub planning_model: String,

    /// Model used for classification, extraction and product advice
    #[serde(default = "default_extraction_model")]
    pub extraction_model: String,

    #[serde(default)]
    pub anthropic: AnthropicConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PicnicConfig {
    #[serde(default = "default_country_code")]
    pub country_code: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Overrides the storefront URL derived from country and version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// mon..sun or 0..6 (0 = Monday)
    #[serde(default = "default_schedule_day")]
    pub day: String,

    #[serde(default = "default_schedule_hour")]
    pub hour: u32,

    #[serde(default)]
    pub minute: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_export_path")]
    pub path: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.potluck")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_language() -> String {
    "nl".to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_preference_timeout() -> u32 {
    4
}

fn default_pantry_timeout() -> u32 {
    2
}

fn default_plan_days() -> u32 {
    4
}

fn default_history_weeks() -> u32 {
    3
}

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_planning_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_extraction_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

fn default_anthropic_base_url() -> String {
    crate::llm::anthropic::DEFAULT_BASE_URL.to_string()
}

fn default_ollama_base_url() -> String {
    crate::llm::ollama::DEFAULT_BASE_URL.to_string()
}

fn default_telegram_api_base() -> String {
    crate::bot::telegram::DEFAULT_API_BASE.to_string()
}

fn default_country_code() -> String {
    "NL".to_string()
}

fn default_api_version() -> String {
    "15".to_string()
}

fn default_true() -> bool {
    true
}

fn default_schedule_day() -> String {
    "sun".to_string()
}

fn default_schedule_hour() -> u32 {
    10
}

fn default_export_path() -> PathBuf {
    PathBuf::from("~/Potluck")
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            language: default_language(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            preference_timeout_hours: default_preference_timeout(),
            pantry_timeout_hours: default_pantry_timeout(),
            plan_days: default_plan_days(),
            history_weeks: default_history_weeks(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            planning_model: default_planning_model(),
            extraction_model: default_extraction_model(),
            anthropic: AnthropicConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: default_anthropic_base_url(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_telegram_api_base(),
        }
    }
}

impl Default for PicnicConfig {
    fn default() -> Self {
        Self {
            country_code: default_country_code(),
            api_version: default_api_version(),
            base_url: None,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            day: default_schedule_day(),
            hour: default_schedule_hour(),
            minute: 0,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_export_path(),
        }
    }
}

impl PicnicConfig {
    pub fn storefront_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            crate::catalog::picnic::storefront_url(&self.country_code, &self.api_version)
        })
    }
}

impl Config {
    /// Load configuration from the default location (~/.potluck/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;
        Self::load_or_create_at(&config_path)
    }

    /// Same as [`Config::load_or_create`] for an explicit path
    pub fn load_or_create_at(path: &Path) -> Result<Self, EngineError> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            Self::create_default(path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, TOML parsing fails or
    /// validation fails.
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(&Self::default_config())
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, &toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        Self::from_toml(&toml_string)
    }

    /// Get the default configuration file path (~/.potluck/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".potluck").join("config.toml"))
    }

    pub fn default_config() -> Self {
        Self {
            core: CoreConfig::default(),
            agent: AgentConfig::default(),
            family: FamilyConfig::default(),
            llm: LLMConfig::default(),
            telegram: TelegramConfig::default(),
            picnic: PicnicConfig::default(),
            schedule: ScheduleConfig::default(),
            export: ExportConfig::default(),
        }
    }

    pub fn locale(&self) -> Locale {
        self.core.language.parse().unwrap_or(Locale::FALLBACK)
    }

    pub fn weekly_schedule(&self) -> Option<WeeklySchedule> {
        WeeklySchedule::new(
            self.schedule.enabled,
            parse_weekday(&self.schedule.day)?,
            self.schedule.hour,
            self.schedule.minute,
        )
    }

    pub fn database_path(&self) -> PathBuf {
        self.core.data_dir.join("potluck.db")
    }

    pub fn pid_file_path(&self) -> PathBuf {
        self.core.data_dir.join("potluck.pid")
    }

    /// Validate values and expand `~` in paths
    ///
    /// Does not touch the file system; directories are created when the
    /// daemon starts.
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.core.language.parse::<Locale>().is_err() {
            return Err(EngineError::Config(format!(
                "Invalid language '{}'. Must be one of: nl, en",
                self.core.language
            )));
        }

        let valid_providers = ["anthropic", "ollama"];
        if !valid_providers.contains(&self.llm.provider.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid provider '{}'. Must be one of: {}",
                self.llm.provider,
                valid_providers.join(", ")
            )));
        }

        if self.agent.poll_interval_secs == 0 {
            return Err(EngineError::Config(
                "poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.agent.plan_days == 0 {
            return Err(EngineError::Config(
                "plan_days must be greater than 0".to_string(),
            ));
        }
        if self.agent.history_weeks > MAX_HISTORY_WEEKS {
            return Err(EngineError::Config(format!(
                "history_weeks must be at most {}",
                MAX_HISTORY_WEEKS
            )));
        }

        if parse_weekday(&self.schedule.day).is_none() {
            return Err(EngineError::Config(format!(
                "Invalid schedule day '{}'. Use mon..sun or 0..6",
                self.schedule.day
            )));
        }
        if self.schedule.hour > 23 || self.schedule.minute > 59 {
            return Err(EngineError::Config(format!(
                "Invalid schedule time {:02}:{:02}",
                self.schedule.hour, self.schedule.minute
            )));
        }

        let mut addresses = HashSet::new();
        for member in &mut self.family.members {
            member.name = member.name.trim().to_string();
            member.address = member.address.trim().to_string();
            if member.name.is_empty() || member.address.is_empty() {
                return Err(EngineError::Config(
                    "Family members need a name and an address".to_string(),
                ));
            }
            if !addresses.insert(member.address.clone()) {
                return Err(EngineError::Config(format!(
                    "Duplicate member address '{}'",
                    member.address
                )));
            }
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        self.export.path = expand_path(&self.export.path)?;

        Ok(())
    }
}

/// Credentials read from the environment
#[derive(Clone, Default)]
pub struct Secrets {
    pub anthropic_api_key: Option<String>,
    pub telegram_token: Option<String>,
    pub picnic_username: Option<String>,
    pub picnic_password: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |value: &Option<String>| value.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Secrets")
            .field("anthropic_api_key", &mask(&self.anthropic_api_key))
            .field("telegram_token", &mask(&self.telegram_token))
            .field("picnic_username", &self.picnic_username)
            .field("picnic_password", &mask(&self.picnic_password))
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Empty values count as missing
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            anthropic_api_key: read(ENV_ANTHROPIC_API_KEY),
            telegram_token: read(ENV_TELEGRAM_TOKEN),
            picnic_username: read(ENV_PICNIC_USERNAME),
            picnic_password: read(ENV_PICNIC_PASSWORD),
        }
    }

    pub fn require_telegram_token(&self) -> Result<&str, EngineError> {
        self.telegram_token.as_deref().ok_or_else(|| {
            EngineError::Config(format!("{} is not set", ENV_TELEGRAM_TOKEN))
        })
    }

    pub fn require_picnic(&self) -> Result<(&str, &str), EngineError> {
        match (&self.picnic_username, &self.picnic_password) {
            (Some(user), Some(password)) => Ok((user, password)),
            _ => Err(EngineError::Config(format!(
                "{} and {} must be set",
                ENV_PICNIC_USERNAME, ENV_PICNIC_PASSWORD
            ))),
        }
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
