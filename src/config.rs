use crate::languages::LanguageRegistry;
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::time::Duration;

/// Engine configuration.
///
/// Every recognized option is an explicit field with a default; construction
/// validates the whole set once so the rest of the engine never has to
/// second-guess its parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // Ephemeral cache
    pub cache_capacity: usize,
    pub cache_ttl: Duration,

    // Rate limiting
    pub rate_limit_max_requests: usize,
    pub rate_limit_window: Duration,
    pub min_call_interval: Duration,

    // Retry
    pub max_retries: u32,
    pub retry_base_delay: Duration,

    // Remote calls
    pub call_timeout: Duration,

    // Request validation
    pub max_text_length: usize,
    pub supported_languages: HashSet<String>,

    // Batch dispatch
    pub batch_workers: usize,

    // Durable translation memory (sqlite file path)
    pub memory_path: String,

    // Provider endpoint (HTTP implementations only)
    pub provider_url: String,
    pub provider_api_key: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 1000,
            cache_ttl: Duration::from_secs(3600),
            rate_limit_max_requests: 10,
            rate_limit_window: Duration::from_secs(60),
            min_call_interval: Duration::from_millis(500),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            call_timeout: Duration::from_secs(10),
            max_text_length: 5000,
            supported_languages: LanguageRegistry::get()
                .codes()
                .into_iter()
                .map(String::from)
                .collect(),
            batch_workers: 5,
            memory_path: "translation_memory.db".to_string(),
            provider_url: "http://localhost:5000".to_string(),
            provider_api_key: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            cache_capacity: env_parse("CACHE_CAPACITY", defaults.cache_capacity)?,
            cache_ttl: env_secs("CACHE_TTL_SECONDS", defaults.cache_ttl)?,
            rate_limit_max_requests: env_parse(
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit_max_requests,
            )?,
            rate_limit_window: env_secs("RATE_LIMIT_WINDOW_SECONDS", defaults.rate_limit_window)?,
            min_call_interval: env_millis("MIN_CALL_INTERVAL_MS", defaults.min_call_interval)?,
            max_retries: env_parse("MAX_RETRIES", defaults.max_retries)?,
            retry_base_delay: env_millis("RETRY_BASE_DELAY_MS", defaults.retry_base_delay)?,
            call_timeout: env_secs("CALL_TIMEOUT_SECONDS", defaults.call_timeout)?,
            max_text_length: env_parse("MAX_TEXT_LENGTH", defaults.max_text_length)?,
            supported_languages: match std::env::var("SUPPORTED_LANGUAGES") {
                Ok(list) => list
                    .split(',')
                    .map(|code| code.trim().to_string())
                    .filter(|code| !code.is_empty())
                    .collect(),
                Err(_) => defaults.supported_languages,
            },
            batch_workers: env_parse("BATCH_WORKERS", defaults.batch_workers)?,
            memory_path: std::env::var("TRANSLATION_MEMORY_PATH").unwrap_or(defaults.memory_path),
            provider_url: std::env::var("PROVIDER_URL").unwrap_or(defaults.provider_url),
            provider_api_key: std::env::var("PROVIDER_API_KEY").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            bail!("cache_capacity must be at least 1");
        }
        if self.rate_limit_max_requests == 0 {
            bail!("rate_limit_max_requests must be at least 1");
        }
        if self.rate_limit_window.is_zero() {
            bail!("rate_limit_window must be non-zero");
        }
        if self.max_retries == 0 {
            bail!("max_retries must be at least 1 (it counts total attempts)");
        }
        if self.max_text_length == 0 {
            bail!("max_text_length must be at least 1");
        }
        if self.batch_workers == 0 {
            bail!("batch_workers must be at least 1");
        }
        if self.supported_languages.is_empty() {
            bail!("supported_languages must not be empty");
        }
        Ok(())
    }

    /// Whether a language code is accepted as a translation target or a
    /// pinned source.
    pub fn is_language_supported(&self, code: &str) -> bool {
        self.supported_languages.contains(code)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{} is not a valid value", name)),
        Err(_) => Ok(default),
    }
}

fn env_secs(name: &str, default: Duration) -> Result<Duration> {
    match std::env::var(name) {
        Ok(value) => {
            let secs: f64 = value
                .parse()
                .with_context(|| format!("{} is not a valid number of seconds", name))?;
            // Duration::from_secs_f64 panics on negative or non-finite input
            if !secs.is_finite() || secs < 0.0 {
                bail!("{} must be a finite, non-negative number of seconds", name);
            }
            Ok(Duration::from_secs_f64(secs))
        }
        Err(_) => Ok(default),
    }
}

fn env_millis(name: &str, default: Duration) -> Result<Duration> {
    Ok(match std::env::var(name) {
        Ok(value) => Duration::from_millis(
            value
                .parse()
                .with_context(|| format!("{} is not a valid number of milliseconds", name))?,
        ),
        Err(_) => default,
    })
}
