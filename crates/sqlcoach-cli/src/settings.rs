use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlcoach_db::DbOptions;
use sqlcoach_judge::JudgeOptions;
use sqlcoach_llm::LlmConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
}

pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub llm: LlmSettings,
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub pool_size: u32,
    pub pool_timeout_secs: u64,
    pub sql_execution_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_url: String,
    pub model_name: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub temperature: f32,
    pub max_tokens: u32,
    pub api_key: Option<String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: DbOptions::default().url,
            pool_size: 10,
            pool_timeout_secs: 30,
            sql_execution_timeout_secs: 5,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        let config = LlmConfig::default();
        Self {
            api_url: config.api_url,
            model_name: config.model,
            timeout_secs: config.timeout.as_secs(),
            max_retries: config.max_retries,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            api_key: None,
        }
    }
}

impl Settings {
    /// Defaults, then the optional TOML file, then the process environment.
    pub fn load(path: Option<&Path>) -> SettingsResult<Self> {
        let mut settings = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                toml::from_str(&content)?
            }
            None => Settings::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    pub fn apply_env<F>(&mut self, lookup: F) -> SettingsResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        override_parsed(&lookup, "DB_POOL_SIZE", &mut self.database.pool_size)?;
        override_parsed(&lookup, "DB_POOL_TIMEOUT", &mut self.database.pool_timeout_secs)?;
        override_parsed(
            &lookup,
            "SQL_EXECUTION_TIMEOUT",
            &mut self.database.sql_execution_timeout_secs,
        )?;

        if let Some(url) = lookup("LLM_API_URL") {
            self.llm.api_url = url;
        }
        if let Some(model) = lookup("LLM_MODEL_NAME") {
            self.llm.model_name = model;
        }
        override_parsed(&lookup, "LLM_TIMEOUT", &mut self.llm.timeout_secs)?;
        override_parsed(&lookup, "LLM_MAX_RETRIES", &mut self.llm.max_retries)?;
        override_parsed(&lookup, "LLM_TEMPERATURE", &mut self.llm.temperature)?;
        override_parsed(&lookup, "LLM_MAX_TOKENS", &mut self.llm.max_tokens)?;
        if let Some(key) = lookup("LLM_API_KEY").filter(|key| !key.is_empty()) {
            self.llm.api_key = Some(key);
        }

        if let Some(value) = lookup("DEBUG") {
            self.debug = parse_flag(&value).ok_or(SettingsError::InvalidEnv {
                key: "DEBUG",
                value,
            })?;
        }
        Ok(())
    }

    pub fn db_options(&self) -> DbOptions {
        let defaults = DbOptions::default();
        DbOptions {
            url: self.database.url.clone(),
            max_connections: self.database.pool_size.max(1),
            min_connections: defaults.min_connections.min(self.database.pool_size),
            acquire_timeout: Duration::from_secs(self.database.pool_timeout_secs),
            ..defaults
        }
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            api_url: self.llm.api_url.clone(),
            model: self.llm.model_name.clone(),
            timeout: Duration::from_secs(self.llm.timeout_secs),
            max_retries: self.llm.max_retries,
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
            api_key: self.llm.api_key.clone(),
            ..LlmConfig::default()
        }
    }

    pub fn judge_options(&self) -> JudgeOptions {
        JudgeOptions {
            answer_timeout: Duration::from_secs(self.database.sql_execution_timeout_secs),
            ..JudgeOptions::default()
        }
    }
}

fn override_parsed<F, T>(lookup: &F, key: &'static str, target: &mut T) -> SettingsResult<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(value) = lookup(key) {
        *target = value
            .trim()
            .parse()
            .map_err(|_| SettingsError::InvalidEnv { key, value })?;
    }
    Ok(())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
