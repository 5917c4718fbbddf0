//! Bounded result cache keyed by a content fingerprint
//!
//! Re-uploads of the same photo are common during a grading session, so scan
//! results are kept behind a SHA-256 fingerprint of the pixel bytes plus the
//! scan parameters. The cache is bounded two ways: a hard entry cap with
//! least-recently-accessed eviction, and a per-entry TTL checked passively on
//! read. All state sits behind one `Mutex`; the pipeline itself never blocks
//! on it because hashing and scanning happen outside the lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::CacheConfig;
use crate::models::ScanResult;

/// SHA-256 digest identifying one (pixels, dimensions, question count) input
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Hash the raw pixel bytes together with the parameters that shape the
    /// result. Two images with identical bytes but different declared
    /// question counts must not share a cache slot.
    pub fn compute(rgb: &[u8], width: usize, height: usize, num_questions: usize) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((width as u64).to_le_bytes());
        hasher.update((height as u64).to_le_bytes());
        hasher.update((num_questions as u64).to_le_bytes());
        hasher.update(rgb);
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

struct CacheEntry {
    result: Arc<ScanResult>,
    created: Instant,
    last_access: Instant,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<Fingerprint, CacheEntry>,
    hits: u64,
    misses: u64,
}

/// Counters and occupancy reported by [`ResultCache::stats`]
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Entries currently stored, expired ones included
    pub total_items: usize,
    /// Entries younger than the TTL
    pub active_items: usize,
    /// Configured entry cap
    pub max_entries: usize,
    /// Configured entry lifetime in seconds
    pub ttl_seconds: u64,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that fell through to the pipeline
    pub misses: u64,
    /// hits / (hits + misses), 0 when no lookups happened
    pub hit_rate: f64,
}

/// Thread-safe TTL + LRU cache of scan results
pub struct ResultCache {
    inner: Mutex<CacheInner>,
    max_entries: usize,
    ttl: Duration,
}

impl ResultCache {
    /// Create an empty cache with the given bounds
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            max_entries: config.max_entries.max(1),
            ttl: config.ttl,
        }
    }

    /// Look up a result; entries older than the TTL read as misses and are
    /// dropped
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<ScanResult>> {
        self.get_at(fingerprint, Instant::now())
    }

    /// Store a result, evicting the least recently accessed entry when full
    pub fn put(&self, fingerprint: Fingerprint, result: Arc<ScanResult>) {
        self.put_at(fingerprint, result, Instant::now());
    }

    /// Current counters and occupancy
    pub fn stats(&self) -> CacheStats {
        self.stats_at(Instant::now())
    }

    /// Drop every entry; counters are kept
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // A panic while holding the lock leaves only stale cache state,
        // which is safe to keep serving
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn get_at(&self, fingerprint: &Fingerprint, now: Instant) -> Option<Arc<ScanResult>> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        match inner.entries.get_mut(fingerprint) {
            Some(entry) if now.duration_since(entry.created) <= self.ttl => {
                entry.last_access = now;
                let result = Arc::clone(&entry.result);
                inner.hits += 1;
                Some(result)
            }
            Some(_) => {
                debug!(%fingerprint, "cache entry expired");
                inner.entries.remove(fingerprint);
                inner.misses += 1;
                None
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    fn put_at(&self, fingerprint: Fingerprint, result: Arc<ScanResult>, now: Instant) {
        let mut inner = self.lock();
        let ttl = self.ttl;
        inner
            .entries
            .retain(|_, entry| now.duration_since(entry.created) <= ttl);

        if !inner.entries.contains_key(&fingerprint) && inner.entries.len() >= self.max_entries {
            // Oldest access goes first; ties break on the fingerprint so
            // eviction is deterministic
            let victim = inner
                .entries
                .iter()
                .min_by_key(|(fp, entry)| (entry.last_access, **fp))
                .map(|(fp, _)| *fp);
            if let Some(victim) = victim {
                debug!(fingerprint = %victim, "evicting least recently used entry");
                inner.entries.remove(&victim);
            }
        }

        inner.entries.insert(
            fingerprint,
            CacheEntry {
                result,
                created: now,
                last_access: now,
            },
        );
    }

    fn stats_at(&self, now: Instant) -> CacheStats {
        let inner = self.lock();
        let active_items = inner
            .entries
            .values()
            .filter(|entry| now.duration_since(entry.created) <= self.ttl)
            .count();
        let lookups = inner.hits + inner.misses;
        CacheStats {
            total_items: inner.entries.len(),
            active_items,
            max_entries: self.max_entries,
            ttl_seconds: self.ttl.as_secs(),
            hits: inner.hits,
            misses: inner.misses,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                inner.hits as f64 / lookups as f64
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnnotatedImage, AnswerMap, Choice, Verdict};

    fn result(answer: Choice) -> Arc<ScanResult> {
        Arc::new(ScanResult {
            answers: AnswerMap::from_verdicts(vec![Verdict::Marked(answer)]),
            total_questions: 1,
            annotated: AnnotatedImage {
                rgb: vec![255; 12],
                width: 2,
                height: 2,
            },
        })
    }

    fn fp(tag: u8) -> Fingerprint {
        Fingerprint::compute(&[tag], 1, 1, 1)
    }

    fn cache(max_entries: usize, ttl_secs: u64) -> ResultCache {
        ResultCache::new(CacheConfig {
            max_entries,
            ttl: Duration::from_secs(ttl_secs),
        })
    }

    #[test]
    fn test_round_trip_and_counters() {
        let cache = cache(10, 60);
        let key = fp(1);

        assert!(cache.get(&key).is_none());
        let stored = result(Choice::A);
        cache.put(key, Arc::clone(&stored));
        let fetched = cache.get(&key).unwrap();
        assert!(Arc::ptr_eq(&stored, &fetched));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < 1e-9);
        assert_eq!(stats.total_items, 1);
        assert_eq!(stats.active_items, 1);
    }

    #[test]
    fn test_fingerprint_depends_on_question_count() {
        let rgb = vec![7u8; 27];
        let a = Fingerprint::compute(&rgb, 3, 3, 10);
        let b = Fingerprint::compute(&rgb, 3, 3, 20);
        assert_ne!(a, b);
        assert_eq!(a, Fingerprint::compute(&rgb, 3, 3, 10));
        assert_eq!(a.to_string().len(), 64);
    }

    #[test]
    fn test_eviction_follows_last_access() {
        let cache = cache(2, 60);
        let t0 = Instant::now();
        cache.put_at(fp(1), result(Choice::A), t0);
        cache.put_at(fp(2), result(Choice::B), t0 + Duration::from_secs(1));

        // Touch the older entry so the newer one becomes the LRU victim
        assert!(cache.get_at(&fp(1), t0 + Duration::from_secs(2)).is_some());
        cache.put_at(fp(3), result(Choice::C), t0 + Duration::from_secs(3));

        let now = t0 + Duration::from_secs(4);
        assert!(cache.get_at(&fp(1), now).is_some());
        assert!(cache.get_at(&fp(2), now).is_none());
        assert!(cache.get_at(&fp(3), now).is_some());
    }

    #[test]
    fn test_ttl_boundary() {
        let cache = cache(10, 30);
        let t0 = Instant::now();
        cache.put_at(fp(1), result(Choice::A), t0);

        assert!(cache.get_at(&fp(1), t0 + Duration::from_secs(29)).is_some());
        assert!(cache.get_at(&fp(1), t0 + Duration::from_secs(31)).is_none());
        // The expired entry was dropped on read
        assert_eq!(cache.stats().total_items, 0);
    }

    #[test]
    fn test_put_sweeps_expired_before_evicting() {
        let cache = cache(2, 10);
        let t0 = Instant::now();
        cache.put_at(fp(1), result(Choice::A), t0);
        cache.put_at(fp(2), result(Choice::B), t0 + Duration::from_secs(1));

        // fp(1) is past its TTL by now; inserting must reclaim its slot
        // instead of evicting the still-live fp(2)
        let later = t0 + Duration::from_secs(11);
        cache.put_at(fp(3), result(Choice::C), later);
        assert!(cache.get_at(&fp(2), later).is_some());
        assert!(cache.get_at(&fp(3), later).is_some());
    }

    #[test]
    fn test_replacing_a_key_does_not_evict() {
        let cache = cache(2, 60);
        let t0 = Instant::now();
        cache.put_at(fp(1), result(Choice::A), t0);
        cache.put_at(fp(2), result(Choice::B), t0);
        cache.put_at(fp(1), result(Choice::D), t0 + Duration::from_secs(1));

        let now = t0 + Duration::from_secs(2);
        let refreshed = cache.get_at(&fp(1), now).unwrap();
        assert_eq!(refreshed.answers.get(1), Some(Verdict::Marked(Choice::D)));
        assert!(cache.get_at(&fp(2), now).is_some());
    }

    #[test]
    fn test_clear_keeps_counters() {
        let cache = cache(10, 60);
        cache.put(fp(1), result(Choice::A));
        assert!(cache.get(&fp(1)).is_some());
        cache.clear();
        assert!(cache.get(&fp(1)).is_none());

        let stats = cache.stats();
        assert_eq!(stats.total_items, 0);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(cache(50, 60));
        let mut handles = Vec::new();
        for t in 0..4u8 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for i in 0..20u8 {
                    let key = fp(t * 20 + i);
                    cache.put(key, result(Choice::A));
                    assert!(cache.get(&key).is_some());
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        let stats = cache.stats();
        assert_eq!(stats.hits, 80);
        assert!(stats.total_items <= 50);
    }
}
