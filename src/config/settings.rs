use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::ResourceType;
use crate::source::SUPPORTED_PROVIDERS;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DATABASE_ENV: &str = "CLOUDOPT_DATABASE";
pub const LOG_ENV: &str = "CLOUDOPT_LOG";

const TIME_RANGES: &[&str] = &["last_30_days", "last_7_days"];
const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub source: SourceConfig,
    pub storage: StorageConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub endpoint: String,
    pub models: Vec<String>, // tried in order
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub provider: String,
    pub time_range: String,
    pub rules: Vec<ResourceType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub colored: bool,
    pub list_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            models: vec![
                "gemini-1.5-flash".to_string(),
                "gemini-1.5-pro".to_string(),
                "gemini-pro".to_string(),
            ],
            timeout_secs: 30,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            provider: "gcp".to_string(),
            time_range: "last_30_days".to_string(),
            rules: ResourceType::ALL.to_vec(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "~/.config/cloudopt/cloudopt.db".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            colored: false,
            list_limit: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            source: SourceConfig::default(),
            storage: StorageConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load from `config_path`, writing commented defaults on first run
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = self.to_commented_toml()?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Overlay environment variables on top of the file values
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = non_blank(API_KEY_ENV) {
            self.model.api_key = Some(key);
        }
        if let Some(path) = non_blank(DATABASE_ENV) {
            self.storage.database_path = path;
        }
        if let Some(level) = non_blank(LOG_ENV) {
            self.logging.level = level;
        }
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        expand_tilde(&self.storage.database_path)
    }

    /// Generate TOML with comments explaining every option
    pub fn to_commented_toml(&self) -> Result<String> {
        let mut output = String::new();

        output.push_str("# cloudopt configuration\n");
        output.push_str("# Command-line flags and environment variables override these values.\n");
        output.push_str("\n");

        output.push_str("[model]\n");
        output.push_str(&format!("# API key for the model endpoint. Prefer setting {} instead.\n", API_KEY_ENV));
        match &self.model.api_key {
            Some(key) => output.push_str(&format!("api_key = {}\n", quoted(key))),
            None => output.push_str("# api_key = \"\"\n"),
        }
        output.push_str("# Base URL of the Gemini REST API\n");
        output.push_str(&format!("endpoint = {}\n", quoted(&self.model.endpoint)));
        output.push_str("# Model names tried in order; a missing model falls through to the next\n");
        output.push_str(&format!("models = {}\n", quoted_list(self.model.models.iter().map(String::as_str))));
        output.push_str("# Request timeout in seconds. On timeout the run degrades instead of falling back.\n");
        output.push_str(&format!("timeout_secs = {}\n", self.model.timeout_secs));
        output.push_str("\n");

        output.push_str("[source]\n");
        output.push_str(&format!("# Cloud provider: {}\n", SUPPORTED_PROVIDERS.join(", ")));
        output.push_str(&format!("provider = {}\n", quoted(&self.source.provider)));
        output.push_str(&format!("# Usage window: {}\n", TIME_RANGES.join(", ")));
        output.push_str(&format!("time_range = {}\n", quoted(&self.source.time_range)));
        output.push_str("# Resource types whose optimization rules are sent to the model\n");
        output.push_str(&format!("rules = {}\n", quoted_list(self.source.rules.iter().map(|r| r.as_str()))));
        output.push_str("\n");

        output.push_str("[storage]\n");
        output.push_str(&format!("# SQLite database for recommendations. Overridden by {}.\n", DATABASE_ENV));
        output.push_str(&format!("database_path = {}\n", quoted(&self.storage.database_path)));
        output.push_str("\n");

        output.push_str("[output]\n");
        output.push_str("# Colored table output (also --colored)\n");
        output.push_str(&format!("colored = {}\n", self.output.colored));
        output.push_str("# Default number of rows for list commands\n");
        output.push_str(&format!("list_limit = {}\n", self.output.list_limit));
        output.push_str("\n");

        output.push_str("[logging]\n");
        output.push_str(&format!(
            "# Log level ({}). Overridden by {} and -v.\n",
            LOG_LEVELS.join(", "),
            LOG_ENV
        ));
        output.push_str(&format!("level = {}\n", quoted(&self.logging.level)));

        Ok(output)
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home.join(".config").join("cloudopt").join("config.toml"))
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "model.api_key" => {
                self.model.api_key = Some(value.to_string()).filter(|v| !v.trim().is_empty());
            }
            "model.endpoint" => {
                if !value.starts_with("http://") && !value.starts_with("https://") {
                    anyhow::bail!("Invalid endpoint: {}. Must start with http:// or https://", value);
                }
                self.model.endpoint = value.to_string();
            }
            "model.models" => {
                let models = split_list(value);
                if models.is_empty() {
                    anyhow::bail!("At least one model name is required");
                }
                self.model.models = models;
            }
            "model.timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid timeout value: {}", value))?;
                if secs == 0 {
                    anyhow::bail!("Timeout must be at least 1 second");
                }
                self.model.timeout_secs = secs;
            }
            "source.provider" => {
                if !SUPPORTED_PROVIDERS.contains(&value) {
                    anyhow::bail!(
                        "Invalid provider: {}. Must be one of: {}",
                        value,
                        SUPPORTED_PROVIDERS.join(", ")
                    );
                }
                self.source.provider = value.to_string();
            }
            "source.time_range" => {
                if !TIME_RANGES.contains(&value) {
                    anyhow::bail!("Invalid time_range: {}. Must be one of: {}", value, TIME_RANGES.join(", "));
                }
                self.source.time_range = value.to_string();
            }
            "source.rules" => {
                self.source.rules = split_list(value)
                    .iter()
                    .map(|item| item.parse::<ResourceType>().map_err(anyhow::Error::msg))
                    .collect::<Result<_>>()?;
            }
            "storage.database_path" => self.storage.database_path = value.to_string(),
            "output.colored" => {
                self.output.colored = value
                    .parse()
                    .with_context(|| format!("Invalid boolean value: {}", value))?;
            }
            "output.list_limit" => {
                let limit: usize = value
                    .parse()
                    .with_context(|| format!("Invalid limit value: {}", value))?;
                if limit == 0 {
                    anyhow::bail!("List limit must be at least 1");
                }
                self.output.list_limit = limit;
            }
            "logging.level" => {
                if !LOG_LEVELS.contains(&value) {
                    anyhow::bail!("Invalid log level: {}. Must be one of: {}", value, LOG_LEVELS.join(", "));
                }
                self.logging.level = value.to_string();
            }
            _ => anyhow::bail!("Unknown configuration key: {}", key),
        }
        Ok(())
    }
}

fn quoted(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

fn quoted_list<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let items: Vec<String> = values.map(quoted).collect();
    format!("[{}]", items.join(", "))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expand a leading `~/` to the home directory
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir().context("Failed to determine home directory")?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}
