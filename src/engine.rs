//! Translation orchestration.
//!
//! [`TranslationEngine`] ties the pieces together: request validation, the
//! two lookup tiers (durable memory, then ephemeral cache), rate-limited and
//! retried provider calls, quality assessment, write-through storage and
//! analytics. `translate` never returns `Err`; every outcome, including
//! terminal failures, is folded into a [`TranslationResult`] so batch callers
//! can process partial results without unwinding.

use crate::analytics::{AnalyticsAggregator, MetricsSnapshot, TranslationEvent};
use crate::cache::{CacheKey, CachedTranslation, TranslationCache};
use crate::config::EngineConfig;
use crate::error::{ErrorKind, ProviderError, ValidationError};
use crate::memory::{MemoryStatistics, TranslationMemory};
use crate::provider::Translator;
use crate::quality::{QualityAssessor, QualityReport, QUALITY_VERSION};
use crate::rate_limit::RateLimiter;
use crate::retry::{retry_with_backoff, RetryConfig, RetryFailure};
use anyhow::Result;
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// One translation request.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub text: String,
    pub target_lang: String,
    /// None requests source-language auto-detection
    pub source_lang: Option<String>,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_lang: target_lang.into(),
            source_lang: None,
        }
    }

    pub fn with_source(mut self, source_lang: impl Into<String>) -> Self {
        self.source_lang = Some(source_lang.into());
        self
    }
}

/// Where a successful translation was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServedFrom {
    Provider,
    Cache,
    Memory,
}

impl ServedFrom {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServedFrom::Provider => "provider",
            ServedFrom::Cache => "cache",
            ServedFrom::Memory => "memory",
        }
    }
}

/// Terminal outcome of one translation request.
///
/// On failure, `translated_text` echoes the original text so downstream
/// consumers always have something displayable.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationResult {
    pub text: String,
    pub translated_text: String,
    /// Resolved source language; None when the request failed before the
    /// source could be detected
    pub source_lang: Option<String>,
    pub target_lang: String,
    pub success: bool,
    pub served_from: Option<ServedFrom>,
    pub quality: QualityReport,
    /// Failed provider attempts consumed by this request
    pub retries: u32,
    pub latency: Duration,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

/// The translation orchestration engine.
///
/// Cheap to share: callers typically wrap it in an `Arc` and clone handles
/// across tasks. All internal state is already synchronized.
pub struct TranslationEngine {
    config: EngineConfig,
    provider: Arc<dyn Translator>,
    cache: TranslationCache,
    memory: TranslationMemory,
    assessor: QualityAssessor,
    rate_limiter: RateLimiter,
    analytics: AnalyticsAggregator,
    retry_config: RetryConfig,
    batch_permits: Arc<Semaphore>,
}

impl TranslationEngine {
    /// Build an engine, opening the translation memory at the configured path.
    pub fn new(config: EngineConfig, provider: Arc<dyn Translator>) -> Result<Self> {
        config.validate()?;
        let memory = TranslationMemory::open(&config.memory_path)?;
        Self::with_memory(config, provider, memory)
    }

    /// Build an engine around an already-open translation memory.
    pub fn with_memory(
        config: EngineConfig,
        provider: Arc<dyn Translator>,
        memory: TranslationMemory,
    ) -> Result<Self> {
        config.validate()?;

        let cache = TranslationCache::new(config.cache_capacity, config.cache_ttl);
        let rate_limiter = RateLimiter::new(
            config.rate_limit_max_requests,
            config.rate_limit_window,
            config.min_call_interval,
        );
        let retry_config = RetryConfig::new(config.max_retries, config.retry_base_delay);
        let batch_permits = Arc::new(Semaphore::new(config.batch_workers));

        Ok(Self {
            config,
            provider,
            cache,
            memory,
            assessor: QualityAssessor::new(),
            rate_limiter,
            analytics: AnalyticsAggregator::new(),
            retry_config,
            batch_permits,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Translate one request end to end.
    pub async fn translate(&self, request: TranslationRequest) -> TranslationResult {
        let started = Instant::now();

        if let Err(e) = self.validate(&request) {
            debug!(target_lang = %request.target_lang, "request rejected: {}", e);
            return self.fail(request, started, 0, ErrorKind::Validation, e.to_string());
        }

        // Normalize whitespace so trivially different spellings of the same
        // text share one cache/memory entry and one provider call
        let text = normalize_whitespace(&request.text);

        let cache_key = CacheKey {
            text: text.clone(),
            target_lang: request.target_lang.clone(),
            source_lang: request.source_lang.clone(),
        };

        // Tier 1: durable translation memory. Consulted before the in-process
        // cache so an entry updated from another process wins over whatever
        // this process last saw.
        match self.memory.lookup(&text, &request.target_lang) {
            Ok(Some(entry)) => {
                let quality = if entry.quality_version == QUALITY_VERSION {
                    QualityReport::from_stored(entry.quality_score)
                } else {
                    // Score was computed under an older formula; re-assess
                    // locally and persist the fresh score without counting a
                    // new usage
                    let report = self.assessor.assess(
                        &text,
                        &entry.translated_text,
                        &entry.source_language,
                        &request.target_lang,
                    );
                    if let Err(e) = self.memory.update_quality(
                        &text,
                        &request.target_lang,
                        report.score,
                        QUALITY_VERSION,
                    ) {
                        warn!("failed to refresh stale quality score: {}", e);
                    }
                    report
                };

                // Keep the ephemeral tier warm so it can still serve this
                // entry if the durable store later misses or errors
                self.cache.put(
                    cache_key,
                    CachedTranslation {
                        translated_text: entry.translated_text.clone(),
                        source_lang: entry.source_language.clone(),
                        quality_score: quality.score,
                    },
                );

                debug!(target_lang = %request.target_lang, "served from translation memory");
                return self.succeed(
                    request,
                    started,
                    0,
                    entry.translated_text,
                    entry.source_language,
                    ServedFrom::Memory,
                    quality,
                );
            }
            Ok(None) => {}
            Err(e) => warn!("translation memory lookup failed, treating as miss: {}", e),
        }

        // Tier 2: ephemeral cache, reached only when the durable tier has no
        // answer
        if let Some(hit) = self.cache.get(&cache_key) {
            debug!(target_lang = %request.target_lang, "served from cache");
            return self.succeed(
                request,
                started,
                0,
                hit.translated_text,
                hit.source_lang,
                ServedFrom::Cache,
                QualityReport::from_stored(hit.quality_score),
            );
        }

        // Resolve the source language before the translate call so the
        // quality assessor and storage tiers see a concrete code
        let mut retries = 0;
        let source_lang = match &request.source_lang {
            Some(code) => code.clone(),
            None => match self.retried_detect(&text).await {
                Ok((code, failed_attempts)) => {
                    retries += failed_attempts;
                    if !self.config.is_language_supported(&code) {
                        return self.fail(
                            request,
                            started,
                            retries,
                            ErrorKind::Provider,
                            format!("detected unsupported source language: '{}'", code),
                        );
                    }
                    code
                }
                Err(failure) => {
                    let retries = failure.attempts();
                    let kind = match &failure {
                        RetryFailure::Exhausted { .. } => ErrorKind::RetriesExhausted,
                        RetryFailure::Aborted { .. } => ErrorKind::Provider,
                    };
                    return self.fail(
                        request,
                        started,
                        retries,
                        kind,
                        failure.into_error().to_string(),
                    );
                }
            },
        };

        let outcome = retry_with_backoff(
            &self.retry_config,
            "translate",
            || async {
                self.rate_limiter.acquire().await;
                match timeout(
                    self.config.call_timeout,
                    self.provider
                        .translate(&text, Some(&source_lang), &request.target_lang),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout(self.config.call_timeout)),
                }
            },
            ProviderError::is_retryable,
        )
        .await;

        match outcome {
            Ok(retried) => {
                retries += retried.failed_attempts;
                let translated_text = retried.value;
                let quality = self.assessor.assess(
                    &text,
                    &translated_text,
                    &source_lang,
                    &request.target_lang,
                );

                // Write-through to both tiers before reporting the outcome
                if let Err(e) = self.memory.store(
                    &text,
                    &translated_text,
                    &source_lang,
                    &request.target_lang,
                    quality.score,
                    QUALITY_VERSION,
                ) {
                    warn!("failed to persist translation to memory: {}", e);
                }
                self.cache.put(
                    cache_key,
                    CachedTranslation {
                        translated_text: translated_text.clone(),
                        source_lang: source_lang.clone(),
                        quality_score: quality.score,
                    },
                );

                info!(
                    source_lang = %source_lang,
                    target_lang = %request.target_lang,
                    score = quality.score,
                    retries,
                    "translation completed"
                );
                self.succeed(
                    request,
                    started,
                    retries,
                    translated_text,
                    source_lang,
                    ServedFrom::Provider,
                    quality,
                )
            }
            Err(failure) => {
                retries += failure.attempts();
                let kind = match &failure {
                    RetryFailure::Exhausted { .. } => ErrorKind::RetriesExhausted,
                    RetryFailure::Aborted { .. } => ErrorKind::Provider,
                };
                self.fail(
                    request,
                    started,
                    retries,
                    kind,
                    failure.into_error().to_string(),
                )
            }
        }
    }

    /// Translate a batch with bounded concurrency.
    ///
    /// Results come back in request order regardless of completion order, and
    /// one failing request never affects its neighbors.
    pub async fn batch_translate(
        &self,
        requests: Vec<TranslationRequest>,
    ) -> Vec<TranslationResult> {
        let total = requests.len();
        debug!(total, workers = self.config.batch_workers, "dispatching batch");

        let futures = requests.into_iter().map(|request| {
            let permits = self.batch_permits.clone();
            async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .expect("batch semaphore is never closed");
                self.translate(request).await
            }
        });

        let results = join_all(futures).await;
        let failed = results.iter().filter(|r| !r.success).count();
        if failed > 0 {
            warn!(total, failed, "batch completed with failures");
        }
        results
    }

    /// Detect the language of a text via the provider, rate-limited and
    /// retried like any other remote call.
    pub async fn detect_language(&self, text: &str) -> Result<String, ProviderError> {
        self.retried_detect(text)
            .await
            .map(|(code, _)| code)
            .map_err(RetryFailure::into_error)
    }

    /// Assess an existing (source, translated) pair without any remote call.
    pub fn quality_report(
        &self,
        original: &str,
        translated: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> QualityReport {
        self.assessor
            .assess(original, translated, source_lang, target_lang)
    }

    /// Snapshot of every outcome recorded since startup (or the last prune).
    pub fn statistics(&self) -> MetricsSnapshot {
        self.analytics.report()
    }

    /// Aggregate view over the durable translation memory.
    pub fn memory_statistics(&self) -> Result<MemoryStatistics> {
        self.memory.statistics()
    }

    /// Drop analytics events older than the cutoff; returns how many were
    /// removed.
    pub fn prune_analytics(&self, cutoff: chrono::DateTime<chrono::Utc>) -> usize {
        self.analytics.prune_older_than(cutoff)
    }

    /// Empty the ephemeral cache. The durable memory is unaffected.
    pub fn flush_cache(&self) {
        self.cache.flush();
    }

    fn validate(&self, request: &TranslationRequest) -> Result<(), ValidationError> {
        if request.text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }

        let length = request.text.chars().count();
        if length > self.config.max_text_length {
            return Err(ValidationError::TextTooLong {
                length,
                max: self.config.max_text_length,
            });
        }

        if !self.config.is_language_supported(&request.target_lang) {
            return Err(ValidationError::UnsupportedLanguage(
                request.target_lang.clone(),
            ));
        }
        if let Some(source) = &request.source_lang {
            if !self.config.is_language_supported(source) {
                return Err(ValidationError::UnsupportedLanguage(source.clone()));
            }
        }

        Ok(())
    }

    async fn retried_detect(
        &self,
        text: &str,
    ) -> Result<(String, u32), RetryFailure<ProviderError>> {
        let retried = retry_with_backoff(
            &self.retry_config,
            "detect_language",
            || async {
                self.rate_limiter.acquire().await;
                match timeout(self.config.call_timeout, self.provider.detect(text)).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout(self.config.call_timeout)),
                }
            },
            ProviderError::is_retryable,
        )
        .await?;

        Ok((retried.value, retried.failed_attempts))
    }

    #[allow(clippy::too_many_arguments)]
    fn succeed(
        &self,
        request: TranslationRequest,
        started: Instant,
        retries: u32,
        translated_text: String,
        source_lang: String,
        served_from: ServedFrom,
        quality: QualityReport,
    ) -> TranslationResult {
        let latency = started.elapsed();

        // A degraded assessment still yields a usable translation; surface it
        // on the result without flipping the outcome to failure
        let assessment_failed = quality.confidence == 0.0
            && quality.issues.iter().any(|i| i.contains("assessment failed"));
        let (error, error_kind) = if assessment_failed {
            (quality.issues.first().cloned(), Some(ErrorKind::Assessment))
        } else {
            (None, None)
        };

        self.analytics.record(TranslationEvent::success(
            format!("{}->{}", source_lang, request.target_lang),
            latency,
            quality.score,
            served_from.as_str(),
        ));

        TranslationResult {
            text: request.text,
            translated_text,
            source_lang: Some(source_lang),
            target_lang: request.target_lang,
            success: true,
            served_from: Some(served_from),
            quality,
            retries,
            latency,
            error,
            error_kind,
        }
    }

    fn fail(
        &self,
        request: TranslationRequest,
        started: Instant,
        retries: u32,
        kind: ErrorKind,
        message: String,
    ) -> TranslationResult {
        let latency = started.elapsed();
        warn!(
            target_lang = %request.target_lang,
            kind = %kind,
            retries,
            "translation failed: {}",
            message
        );

        let source_display = request.source_lang.as_deref().unwrap_or("auto");
        self.analytics.record(TranslationEvent::failure(
            format!("{}->{}", source_display, request.target_lang),
            latency,
            kind,
        ));

        TranslationResult {
            translated_text: request.text.clone(),
            text: request.text,
            source_lang: request.source_lang,
            target_lang: request.target_lang,
            success: false,
            served_from: None,
            quality: QualityReport {
                score: 0.0,
                confidence: 0.0,
                issues: Vec::new(),
                metrics: BTreeMap::new(),
            },
            retries,
            latency,
            error: Some(message),
            error_kind: Some(kind),
        }
    }
}

/// Collapse runs of whitespace to single spaces and trim the ends.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
