use crate::error::{ConfigError, CoreError};
use crate::types::ActivePrompt;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "MariaDB/MySQL Mention Tracker v1.0";
/// Longest accepted search window, ten years.
pub const MAX_HOURS: i64 = 24 * 366 * 10;

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct AnthropicCredentials {
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub reddit: RedditCredentials,
    pub anthropic: AnthropicCredentials,
}

impl Credentials {
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves credentials through `lookup`. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                    var_name: name.to_string(),
                })
        };

        let reddit = RedditCredentials {
            client_id: required("REDDIT_CLIENT_ID")?,
            client_secret: required("REDDIT_CLIENT_SECRET")?,
            user_agent: lookup("REDDIT_USER_AGENT")
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };
        let anthropic = AnthropicCredentials {
            api_key: required("ANTHROPIC_API_KEY")?,
        };

        Ok(Self { reddit, anthropic })
    }
}

#[derive(Debug, Deserialize)]
struct PromptFile {
    prompts: Vec<PromptEntry>,
}

#[derive(Debug, Deserialize)]
struct PromptEntry {
    name: Option<String>,
    prompt: String,
    #[serde(rename = "use", default)]
    active: bool,
}

/// Loads the first prompt marked `"use": true` from a prompts file.
pub fn load_active_prompt(path: &Path) -> Result<ActivePrompt, CoreError> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(ConfigError::FileNotFound { path: display }.into());
    }

    let raw = std::fs::read_to_string(path)?;
    let file: PromptFile =
        serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidFormat {
            path: display.clone(),
            details: e.to_string(),
        })?;

    let entry = file
        .prompts
        .into_iter()
        .find(|entry| entry.active)
        .ok_or(ConfigError::NoActivePrompt { path: display })?;

    let prompt = ActivePrompt {
        name: entry.name.unwrap_or_else(|| "unnamed".to_string()),
        text: entry.prompt,
    };
    debug!("Loaded active prompt '{}'", prompt.name);
    Ok(prompt)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    pub keywords: Vec<String>,
    pub hours: i64,
    pub include_comments: bool,
    pub comment_limit: u32,
    pub max_body_chars: usize,
    pub model: String,
    pub max_tokens: u32,
    pub completion_timeout_secs: u64,
    pub output_dir: PathBuf,
    pub prompts_path: PathBuf,
    pub report_title: String,
    pub display_names: BTreeMap<String, String>,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            keywords: vec!["mariadb".to_string(), "mysql".to_string()],
            hours: 24,
            include_comments: false,
            comment_limit: 1000,
            max_body_chars: crate::truncate::DEFAULT_MAX_CHARS,
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            completion_timeout_secs: 60,
            output_dir: PathBuf::from("output"),
            prompts_path: PathBuf::from("prompts.json"),
            report_title: "Reddit Database Mentions".to_string(),
            display_names: [("mariadb", "MariaDB"), ("mysql", "MySQL")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl TrackerSettings {
    pub fn from_toml_str(raw: &str) -> Result<Self, CoreError> {
        let settings: Self = toml::from_str(raw).map_err(ConfigError::Parse)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    /// Start of the search window ending at `now`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, CoreError> {
        TimeDelta::try_hours(self.hours)
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                ConfigError::InvalidValue {
                    field: "hours".to_string(),
                    value: self.hours.to_string(),
                }
                .into()
            })
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let invalid = |field: &str, value: String| -> CoreError {
            ConfigError::InvalidValue {
                field: field.to_string(),
                value,
            }
            .into()
        };

        if self.keywords.is_empty() || self.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(invalid("keywords", format!("{:?}", self.keywords)));
        }
        if self.hours <= 0 || self.hours > MAX_HOURS {
            return Err(invalid("hours", self.hours.to_string()));
        }
        if self.max_body_chars == 0 {
            return Err(invalid("max_body_chars", "0".to_string()));
        }
        if self.completion_timeout_secs == 0 {
            return Err(invalid("completion_timeout_secs", "0".to_string()));
        }
        Ok(())
    }
}
