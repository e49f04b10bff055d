//! Translation orchestration engine.
//!
//! Wraps an unreliable remote translation provider with the machinery a
//! production deployment needs: request validation, a two-tier store
//! (a durable sqlite translation memory backed by a bounded in-process LRU),
//! sliding-window rate limiting, bounded exponential-backoff retries,
//! deterministic quality assessment and in-process analytics. Batches run
//! with bounded concurrency and order-preserving, failure-isolated results.
//!
//! The typical entry point is [`TranslationEngine`]:
//!
//! ```no_run
//! use std::sync::Arc;
//! use translation_engine::{EngineConfig, HttpTranslator, TranslationEngine, TranslationRequest};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = EngineConfig::from_env()?;
//! let provider = Arc::new(HttpTranslator::new(
//!     config.provider_url.clone(),
//!     config.provider_api_key.clone(),
//! ));
//! let engine = TranslationEngine::new(config, provider)?;
//!
//! let result = engine
//!     .translate(TranslationRequest::new("Hello, how are you?", "es").with_source("en"))
//!     .await;
//! println!("{} (score {:.2})", result.translated_text, result.quality.score);
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod languages;
pub mod memory;
pub mod provider;
pub mod quality;
pub mod rate_limit;
pub mod retry;

pub use analytics::{AnalyticsAggregator, MetricsSnapshot, TranslationEvent};
pub use cache::{CacheKey, CachedTranslation, TranslationCache};
pub use config::EngineConfig;
pub use engine::{ServedFrom, TranslationEngine, TranslationRequest, TranslationResult};
pub use error::{ErrorKind, ProviderError, ValidationError};
pub use languages::LanguageRegistry;
pub use memory::{MemoryEntry, MemoryStatistics, TranslationMemory};
pub use provider::{HttpTranslator, Translator};
pub use quality::{QualityAssessor, QualityReport, QUALITY_VERSION};
pub use rate_limit::RateLimiter;
pub use retry::{retry_with_backoff, RetryConfig, RetryFailure};
