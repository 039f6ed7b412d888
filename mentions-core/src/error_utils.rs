use crate::error::*;
use tracing::{error, info, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    /// Fatal errors abort the run; everything else is recovered where it happens.
    fn is_fatal(&self) -> bool;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::RedditApi(e) => {
                error!("Reddit API error details: {:?}", e);
            }
            CoreError::Llm(e) => {
                error!("LLM error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_fatal(&self) -> bool {
        match self {
            CoreError::Config(_) => true,
            CoreError::RedditApi(e) => e.is_fatal(),
            CoreError::Llm(e) => e.is_fatal(),
            CoreError::Cancelled { .. } => true,
            _ => false,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Llm(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::Cancelled { .. } => {
                "The run was cancelled before the report was written.".to_string()
            }
            CoreError::Io(e) => format!("File system error: {}", e),
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::RedditApi(_) => "REDDIT_API".to_string(),
            CoreError::Llm(_) => "LLM".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::Cancelled { .. } => "CANCELLED".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for RedditApiError {
    fn log_error(&self) -> &Self {
        error!("RedditApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("RedditApiError (warning): {}", self);
        self
    }

    // Bad credentials cannot be recovered by skipping a keyword.
    fn is_fatal(&self) -> bool {
        matches!(self, RedditApiError::AuthenticationFailed { .. })
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => {
                "Reddit authentication failed. Please check REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET."
                    .to_string()
            }
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Reddit asked to wait {} seconds.",
                retry_after
            ),
            RedditApiError::Forbidden { resource } => format!(
                "Access denied to {}. You may not have permission to view this content.",
                resource
            ),
            RedditApiError::PostNotFound { .. } => {
                "The requested post could not be found.".to_string()
            }
            RedditApiError::InvalidToken => {
                "Reddit authentication token is invalid. Please re-authenticate.".to_string()
            }
            RedditApiError::RequestTimeout => "Request to Reddit timed out.".to_string(),
            _ => "Reddit API error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => "REDDIT_AUTH_FAILED".to_string(),
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT".to_string(),
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN".to_string(),
            RedditApiError::PostNotFound { .. } => "REDDIT_POST_NOT_FOUND".to_string(),
            RedditApiError::InvalidToken => "REDDIT_INVALID_TOKEN".to_string(),
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT".to_string(),
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE".to_string(),
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for LlmError {
    fn log_error(&self) -> &Self {
        error!("LlmError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("LlmError (warning): {}", self);
        self
    }

    fn is_fatal(&self) -> bool {
        matches!(self, LlmError::InvalidApiKey { .. })
    }

    fn user_friendly_message(&self) -> String {
        match self {
            LlmError::InvalidApiKey { provider } => format!(
                "Invalid API key for {}. Please update ANTHROPIC_API_KEY.",
                provider
            ),
            LlmError::RateLimitExceeded { provider } => {
                format!("Rate limit exceeded for {}.", provider)
            }
            LlmError::ModelNotAvailable { model } => format!(
                "Model '{}' is not available. Please try a different model.",
                model
            ),
            LlmError::ServiceUnavailable { provider, .. } => format!(
                "{} service is temporarily unavailable. Please try again later.",
                provider
            ),
            LlmError::RequestTimeout { provider, seconds } => format!(
                "{} did not answer within {} seconds.",
                provider, seconds
            ),
            _ => "AI service error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            LlmError::InvalidApiKey { .. } => "LLM_INVALID_API_KEY".to_string(),
            LlmError::RateLimitExceeded { .. } => "LLM_RATE_LIMIT".to_string(),
            LlmError::ModelNotAvailable { .. } => "LLM_MODEL_NOT_AVAILABLE".to_string(),
            LlmError::ServiceUnavailable { .. } => "LLM_SERVICE_UNAVAILABLE".to_string(),
            LlmError::RequestRejected { .. } => "LLM_REQUEST_REJECTED".to_string(),
            LlmError::RequestTimeout { .. } => "LLM_TIMEOUT".to_string(),
            LlmError::InvalidResponseFormat { .. } => "LLM_INVALID_RESPONSE".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_fatal(&self) -> bool {
        true
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => format!(
                "{} not found. Please create it with your prompts or settings.",
                path
            ),
            ConfigError::InvalidFormat { path, details } => {
                format!("{} is not valid: {}", path, details)
            }
            ConfigError::NoActivePrompt { path } => format!(
                "No prompt in {} is marked with \"use\": true. Mark exactly one prompt as active.",
                path
            ),
            ConfigError::InvalidValue { field, value } => {
                format!("Invalid value '{}' for setting '{}'.", value, field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => {
                missing_variable_help(var_name)
            }
            ConfigError::Parse(e) => format!("Settings file could not be parsed: {}", e),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::InvalidFormat { .. } => "CONFIG_INVALID_FORMAT".to_string(),
            ConfigError::NoActivePrompt { .. } => "CONFIG_NO_ACTIVE_PROMPT".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

fn missing_variable_help(var_name: &str) -> String {
    match var_name {
        "REDDIT_CLIENT_ID" | "REDDIT_CLIENT_SECRET" => format!(
            "Reddit API credentials not found ({var_name} is not set).\n\
             Please set the following environment variables:\n  \
             REDDIT_CLIENT_ID - Your Reddit app client ID\n  \
             REDDIT_CLIENT_SECRET - Your Reddit app client secret\n\n\
             To create credentials:\n\
             1. Go to https://www.reddit.com/prefs/apps\n\
             2. Click 'Create App' or 'Create Another App'\n\
             3. Select 'script' as the app type\n\
             4. Fill in name and redirect URI (can be http://localhost)\n\
             5. Copy the client ID (under app name) and secret"
        ),
        "ANTHROPIC_API_KEY" => "Anthropic API key not found.\n\
             Please set the ANTHROPIC_API_KEY environment variable."
            .to_string(),
        other => format!("Environment variable '{}' is required but not set.", other),
    }
}

pub struct ErrorReporter {
    report_errors: bool,
    report_warnings: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            report_errors: true,
            report_warnings: true,
        }
    }

    pub fn with_error_reporting(mut self, enabled: bool) -> Self {
        self.report_errors = enabled;
        self
    }

    pub fn with_warning_reporting(mut self, enabled: bool) -> Self {
        self.report_warnings = enabled;
        self
    }

    pub fn report_error(&self, error: &CoreError) {
        if self.report_errors {
            error.log_error();
            info!("Error code: {}", error.error_code());
            info!("User message: {}", error.user_friendly_message());
        }
    }

    pub fn report_warning(&self, error: &CoreError) {
        if self.report_warnings {
            error.log_warn();
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
