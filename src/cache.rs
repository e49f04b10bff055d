//! Ephemeral in-process translation cache.
//!
//! Bounded LRU with per-entry TTL. Expiry is lazy: an entry past its TTL is
//! treated as absent and removed on the lookup that finds it, so the cache
//! never needs a background sweeper. The cache is keyed on the exact source
//! text plus the language pair; a request pinned to a source language and the
//! same request with auto-detection are distinct entries.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Key for one cached translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub text: String,
    pub target_lang: String,
    /// None when the source language was auto-detected
    pub source_lang: Option<String>,
}

/// Value stored per key.
#[derive(Debug, Clone)]
pub struct CachedTranslation {
    pub translated_text: String,
    /// Resolved source language (detected or pinned)
    pub source_lang: String,
    pub quality_score: f64,
}

#[derive(Debug)]
struct Entry {
    value: CachedTranslation,
    inserted_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, Entry>,
    /// Keys in recency order, least recent first. May hold stale duplicates;
    /// eviction skips keys no longer present in `entries`.
    recency: VecDeque<CacheKey>,
}

/// Bounded LRU cache with TTL expiry.
#[derive(Debug)]
pub struct TranslationCache {
    state: Mutex<CacheState>,
    capacity: usize,
    ttl: Duration,
}

impl TranslationCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        assert!(capacity > 0, "cache capacity must be at least 1");
        Self {
            state: Mutex::new(CacheState::default()),
            capacity,
            ttl,
        }
    }

    /// Look up a translation, refreshing its recency on a hit.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<CachedTranslation> {
        let mut state = self.state.lock().unwrap();

        let expired = match state.entries.get(key) {
            None => return None,
            Some(entry) => entry.inserted_at.elapsed() >= self.ttl,
        };

        if expired {
            debug!(target_lang = %key.target_lang, "cache entry expired");
            state.entries.remove(key);
            return None;
        }

        state.recency.push_back(key.clone());
        self.bound_recency(&mut state);
        state.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Insert or overwrite a translation, evicting the least recently used
    /// entry when at capacity.
    pub fn put(&self, key: CacheKey, value: CachedTranslation) {
        let mut state = self.state.lock().unwrap();

        let is_new = !state.entries.contains_key(&key);
        if is_new && state.entries.len() >= self.capacity {
            Self::evict_lru(&mut state);
        }

        state.entries.insert(
            key.clone(),
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
        state.recency.push_back(key);
        self.bound_recency(&mut state);
    }

    /// Drop every entry.
    pub fn flush(&self) {
        let mut state = self.state.lock().unwrap();
        let dropped = state.entries.len();
        state.entries.clear();
        state.recency.clear();
        debug!(dropped, "cache flushed");
    }

    /// Number of live (possibly expired but not yet collected) entries.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_lru(state: &mut CacheState) {
        while let Some(candidate) = state.recency.pop_front() {
            // A key still queued later is more recent than this occurrence
            if state.recency.contains(&candidate) {
                continue;
            }
            if state.entries.remove(&candidate).is_some() {
                debug!(target_lang = %candidate.target_lang, "evicted least recently used entry");
                return;
            }
        }
        // Recency queue drained without finding a live key; fall back to any
        if let Some(key) = state.entries.keys().next().cloned() {
            state.entries.remove(&key);
        }
    }

    /// Compact the recency queue once the duplicates from hits and
    /// overwrites push it past a fixed multiple of the capacity. Called on
    /// every path that appends, so the queue stays bounded even under a
    /// hit-only workload.
    fn bound_recency(&self, state: &mut CacheState) {
        if state.recency.len() <= self.capacity * 4 {
            return;
        }
        let mut seen = std::collections::HashSet::new();
        let mut compacted = VecDeque::with_capacity(state.entries.len());
        // Walk newest-first so the last occurrence of each key wins
        for key in state.recency.iter().rev() {
            if state.entries.contains_key(key) && seen.insert(key.clone()) {
                compacted.push_front(key.clone());
            }
        }
        state.recency = compacted;
    }

    #[cfg(test)]
    fn recency_len(&self) -> usize {
        self.state.lock().unwrap().recency.len()
    }
}
