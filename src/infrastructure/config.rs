use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::application::services::{
    Backoff, CitationConfig, PollerConfig, RetryPolicies, RetryPolicy,
};
use crate::application::use_cases::UploadLimits;
use crate::application::workers::ChatConfig;

#[derive(Debug)]
pub enum ConfigError {
    Missing(String),
    Invalid { key: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} not set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "Invalid value for {}: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub pool_size: u32,
    pub backend: StorageBackend,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 10,
            backend: StorageBackend::Postgres,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoteStoreConfig {
    pub api_base: String,
    pub upload_base: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub chat_model: String,
}

impl Default for RemoteStoreConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            upload_base: "https://generativelanguage.googleapis.com/upload/v1beta".to_string(),
            api_key: String::new(),
            timeout_secs: 60,
            chat_model: "gemini-2.5-flash".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub upload_dir: String,
    pub worker_count: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            upload_dir: "./uploads".to_string(),
            worker_count: 3,
        }
    }
}

/// Every tunable of the service, read once at startup and handed to components.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub remote: RemoteStoreConfig,
    pub poller: PollerConfig,
    pub retries: RetryPolicies,
    pub citations: CitationConfig,
    pub chat: ChatConfig,
    pub limits: UploadLimits,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup, falling back to
    /// defaults for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(&lookup);
        let defaults = AppConfig::default();

        let backend = match env.string("STORAGE_BACKEND").as_deref() {
            None | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE_BACKEND".to_string(),
                    value: other.to_string(),
                });
            }
        };
        let database = DatabaseConfig {
            url: env.string("DATABASE_URL"),
            pool_size: env.parse("DATABASE_POOL_SIZE", defaults.database.pool_size)?,
            backend,
        };
        if database.backend == StorageBackend::Postgres && database.url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL".to_string()));
        }

        let remote = RemoteStoreConfig {
            api_base: env.base_url("GEMINI_API_BASE", defaults.remote.api_base)?,
            upload_base: env.base_url("GEMINI_UPLOAD_BASE", defaults.remote.upload_base)?,
            api_key: env.string("GEMINI_API_KEY").unwrap_or_default(),
            timeout_secs: env.parse("GEMINI_TIMEOUT_SECS", defaults.remote.timeout_secs)?,
            chat_model: env
                .string("GEMINI_CHAT_MODEL")
                .unwrap_or(defaults.remote.chat_model),
        };

        let poller = PollerConfig {
            max_attempts: env.parse("OPERATION_POLL_MAX_ATTEMPTS", defaults.poller.max_attempts)?,
            interval: env.millis("OPERATION_POLL_INTERVAL_MS", defaults.poller.interval)?,
        };

        let retries = RetryPolicies {
            store_lifecycle: RetryPolicy::fixed(
                env.parse(
                    "STORE_JOB_MAX_ATTEMPTS",
                    defaults.retries.store_lifecycle.max_attempts,
                )?,
                env.millis("STORE_JOB_RETRY_DELAY_MS", Duration::from_secs(2))?,
            ),
            document_upload: env.exponential(
                "UPLOAD_JOB_MAX_ATTEMPTS",
                "UPLOAD_JOB_BACKOFF_MS",
                defaults.retries.document_upload,
            )?,
            document_deletion: env.exponential(
                "DELETE_JOB_MAX_ATTEMPTS",
                "DELETE_JOB_BACKOFF_MS",
                defaults.retries.document_deletion,
            )?,
            chat_turn: env.exponential(
                "CHAT_JOB_MAX_ATTEMPTS",
                "CHAT_JOB_BACKOFF_MS",
                defaults.retries.chat_turn,
            )?,
        };

        let citations = CitationConfig {
            min_confidence: env
                .parse("CITATION_MIN_CONFIDENCE", defaults.citations.min_confidence)?,
            high_confidence: env
                .parse("CHAT_HIGH_CONFIDENCE", defaults.citations.high_confidence)?,
            snippet_max_chars: env
                .parse("CITATION_SNIPPET_CHARS", defaults.citations.snippet_max_chars)?,
        };

        let chat = ChatConfig {
            history_window: env.parse("CHAT_HISTORY_WINDOW", defaults.chat.history_window)?,
            temperature: env.parse("CHAT_TEMPERATURE", defaults.chat.temperature)?,
            max_output_tokens: env
                .parse("CHAT_MAX_OUTPUT_TOKENS", defaults.chat.max_output_tokens)?,
            system_instruction: env
                .string("CHAT_SYSTEM_INSTRUCTION")
                .unwrap_or(defaults.chat.system_instruction),
        };

        let limits = UploadLimits {
            store_capacity_bytes: env
                .parse("STORE_CAPACITY_BYTES", defaults.limits.store_capacity_bytes)?,
            max_document_bytes: env
                .parse("MAX_DOCUMENT_BYTES", defaults.limits.max_document_bytes)?,
        };

        let server = ServerConfig {
            port: env.parse("PORT", defaults.server.port)?,
            upload_dir: env
                .string("UPLOAD_DIR")
                .unwrap_or(defaults.server.upload_dir),
            worker_count: env
                .parse("WORKER_COUNT", defaults.server.worker_count)?
                .max(1),
        };

        Ok(Self {
            database,
            remote,
            poller,
            retries,
            citations,
            chat,
            limits,
            server,
        })
    }
}

struct Lookup<'a, F>(&'a F);

impl<F> Lookup<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.string(key) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value,
            }),
        }
    }

    /// An absolute http(s) URL, returned without a trailing slash.
    fn base_url(&self, key: &str, default: String) -> Result<String, ConfigError> {
        let Some(value) = self.string(key) else {
            return Ok(default);
        };
        match url::Url::parse(&value) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                Ok(value.trim_end_matches('/').to_string())
            }
            _ => Err(ConfigError::Invalid {
                key: key.to_string(),
                value,
            }),
        }
    }

    fn millis(&self, key: &str, default: Duration) -> Result<Duration, ConfigError> {
        match self.string(key) {
            None => Ok(default),
            Some(_) => Ok(Duration::from_millis(self.parse(key, 0u64)?)),
        }
    }

    /// Exponential policy whose base delay is overridden, keeping the default cap.
    fn exponential(
        &self,
        attempts_key: &str,
        base_key: &str,
        default: RetryPolicy,
    ) -> Result<RetryPolicy, ConfigError> {
        let (base, max) = match default.backoff {
            Backoff::Exponential { base, max } => (base, max),
            Backoff::Fixed(delay) => (delay, delay),
        };
        let base = self.millis(base_key, base)?;
        Ok(RetryPolicy::exponential(
            self.parse(attempts_key, default.max_attempts)?,
            base,
            max.max(base),
        ))
    }
}
