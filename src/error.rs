//! Error taxonomy for the translation engine.
//!
//! The engine distinguishes three failure classes with different handling:
//! validation errors fail immediately (no retry, no rate-limit slot),
//! provider errors are retryable up to the configured budget, and exhausted
//! retries are terminal. The engine itself never returns an `Err` to callers;
//! terminal failures are folded into a `TranslationResult` tagged with an
//! [`ErrorKind`] so callers can branch without parsing messages.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// A request that was rejected before any remote call was attempted.
///
/// These are caller bugs, not transient provider faults; they must never
/// consume a retry or a rate-limit slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("text is empty")]
    EmptyText,

    #[error("text too long ({length} code points, max {max})")]
    TextTooLong { length: usize, max: usize },

    #[error("unsupported language code: '{0}'")]
    UnsupportedLanguage(String),
}

/// A failure at the remote provider boundary.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not detect source language")]
    DetectionFailed,
}

impl ProviderError {
    /// Whether another attempt might succeed.
    ///
    /// 429 and 5xx statuses, timeouts, network and parse failures are treated
    /// as transient; other 4xx statuses are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => true,
        }
    }
}

/// Flat failure tag carried on a `TranslationResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid request; failed before any remote call
    Validation,
    /// Provider failed with a non-retryable error
    Provider,
    /// Every attempt in the retry budget failed
    RetriesExhausted,
    /// Quality scoring failed (the translation itself still succeeded)
    Assessment,
}

impl ErrorKind {
    /// Stable string form used as an analytics rollup key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Provider => "provider",
            ErrorKind::RetriesExhausted => "retries_exhausted",
            ErrorKind::Assessment => "assessment",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
