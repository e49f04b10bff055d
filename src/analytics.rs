//! In-process translation analytics.
//!
//! Every terminal outcome (success, cache hit, failure) is recorded as one
//! event; reports are computed on demand from the event log rather than
//! maintained incrementally, so a report is always internally consistent.
//! The log is unbounded by default; long-running deployments call
//! [`AnalyticsAggregator::prune_older_than`] periodically.

use crate::error::ErrorKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

/// One recorded translation outcome.
#[derive(Debug, Clone)]
pub struct TranslationEvent {
    pub timestamp: DateTime<Utc>,
    /// "source->target" rollup key
    pub language_pair: String,
    pub latency: Duration,
    pub success: bool,
    /// Present on successful outcomes
    pub quality_score: Option<f64>,
    /// "provider", "cache" or "memory" on successful outcomes
    pub served_from: Option<&'static str>,
    /// Present on failed outcomes
    pub error_kind: Option<ErrorKind>,
}

impl TranslationEvent {
    pub fn success(
        language_pair: String,
        latency: Duration,
        quality_score: f64,
        served_from: &'static str,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            language_pair,
            latency,
            success: true,
            quality_score: Some(quality_score),
            served_from: Some(served_from),
            error_kind: None,
        }
    }

    pub fn failure(language_pair: String, latency: Duration, error_kind: ErrorKind) -> Self {
        Self {
            timestamp: Utc::now(),
            language_pair,
            latency,
            success: false,
            quality_score: None,
            served_from: None,
            error_kind: Some(error_kind),
        }
    }
}

/// Per-language-pair rollup.
#[derive(Debug, Clone, Serialize)]
pub struct PairStats {
    pub count: u64,
    pub success_count: u64,
    /// Mean quality over successful events, 0.0 when there are none
    pub average_quality: f64,
}

/// Point-in-time report over all recorded events.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_count: u64,
    pub success_count: u64,
    /// success_count / total_count, 0.0 when no events were recorded
    pub success_rate: f64,
    /// Mean latency over all events
    pub average_latency: Duration,
    /// Mean quality over successful events
    pub average_quality: f64,
    pub per_language_pair: BTreeMap<String, PairStats>,
    /// Successful events keyed by where they were served from
    pub served_from_counts: BTreeMap<&'static str, u64>,
    /// Failed events keyed by [`ErrorKind`] string form
    pub error_count_by_kind: BTreeMap<&'static str, u64>,
}

/// Thread-safe event log with on-demand aggregation.
#[derive(Debug, Default)]
pub struct AnalyticsAggregator {
    events: Mutex<Vec<TranslationEvent>>,
}

impl AnalyticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: TranslationEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Drop events older than the cutoff; returns how many were removed.
    pub fn prune_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|event| event.timestamp >= cutoff);
        before - events.len()
    }

    /// Aggregate every recorded event into a consistent snapshot.
    pub fn report(&self) -> MetricsSnapshot {
        let events = self.events.lock().unwrap();

        let total_count = events.len() as u64;
        let success_count = events.iter().filter(|e| e.success).count() as u64;

        let total_latency: Duration = events.iter().map(|e| e.latency).sum();
        let average_latency = if total_count > 0 {
            total_latency / total_count as u32
        } else {
            Duration::ZERO
        };

        let quality_scores: Vec<f64> = events.iter().filter_map(|e| e.quality_score).collect();
        let average_quality = if quality_scores.is_empty() {
            0.0
        } else {
            quality_scores.iter().sum::<f64>() / quality_scores.len() as f64
        };

        let mut per_language_pair: BTreeMap<String, PairStats> = BTreeMap::new();
        for event in events.iter() {
            let stats = per_language_pair
                .entry(event.language_pair.clone())
                .or_insert(PairStats {
                    count: 0,
                    success_count: 0,
                    average_quality: 0.0,
                });
            stats.count += 1;
            if event.success {
                stats.success_count += 1;
                // Running mean over successful events only
                if let Some(score) = event.quality_score {
                    let n = stats.success_count as f64;
                    stats.average_quality += (score - stats.average_quality) / n;
                }
            }
        }

        let mut served_from_counts: BTreeMap<&'static str, u64> = BTreeMap::new();
        let mut error_count_by_kind: BTreeMap<&'static str, u64> = BTreeMap::new();
        for event in events.iter() {
            if let Some(source) = event.served_from {
                *served_from_counts.entry(source).or_insert(0) += 1;
            }
            if let Some(kind) = event.error_kind {
                *error_count_by_kind.entry(kind.as_str()).or_insert(0) += 1;
            }
        }

        MetricsSnapshot {
            total_count,
            success_count,
            success_rate: if total_count > 0 {
                success_count as f64 / total_count as f64
            } else {
                0.0
            },
            average_latency,
            average_quality,
            per_language_pair,
            served_from_counts,
            error_count_by_kind,
        }
    }
}
